use clap::Parser;
use coursework::authz::Role;
use coursework::settings::{Settings, StaffAccount};
use coursework::storage::{self, NewUser};
use coursework::{jobs, web};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "coursework",
    version,
    about = "Course, lection and homework management backend"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // init storage (database + migrations)
    let db = storage::init(&settings.database).await?;

    if let Some(staff) = &settings.staff {
        ensure_staff_user(&db, staff).await?;
    }

    // keep the scheduler alive for the lifetime of the server
    let _scheduler = jobs::init_scheduler(db.clone()).await?;

    // start web server
    web::serve(settings, db).await?;
    Ok(())
}

async fn ensure_staff_user(db: &sea_orm::DatabaseConnection, staff: &StaffAccount) -> Result<()> {
    match storage::get_user_by_username(db, &staff.username)
        .await
        .into_diagnostic()?
    {
        Some(user) if user.role == Role::Staff => {}
        Some(user) => {
            return Err(miette::miette!(
                "configured staff username `{}` belongs to a {} account",
                staff.username,
                user.role
            ));
        }
        None => {
            let input = NewUser {
                username: staff.username.clone(),
                email: staff.email.clone(),
                password: staff.password.clone(),
            };
            storage::create_user(db, &input, Role::Staff)
                .await
                .into_diagnostic()?;
            tracing::info!(username = %staff.username, "Created staff account");
        }
    }
    Ok(())
}
