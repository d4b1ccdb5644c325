use crate::errors::AppError;
use crate::storage;
use sea_orm::DatabaseConnection;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Start the background scheduler. Currently one job: purge expired login
/// sessions at the top of every hour.
pub async fn init_scheduler(db: DatabaseConnection) -> Result<JobScheduler, AppError> {
    let sched = JobScheduler::new()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create job scheduler: {e}")))?;

    let cleanup_sessions_job = Job::new_async("0 0 * * * *", move |_uuid, _l| {
        let db = db.clone();
        Box::pin(async move {
            match storage::cleanup_expired_sessions(&db).await {
                Ok(count) => info!(count, "Cleaned up expired sessions"),
                Err(e) => error!(error = %e, "Failed to clean up expired sessions"),
            }
        })
    })
    .map_err(|e| AppError::Internal(format!("Failed to create cleanup sessions job: {e}")))?;

    sched
        .add(cleanup_sessions_job)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to add cleanup sessions job: {e}")))?;

    sched
        .start()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to start job scheduler: {e}")))?;

    info!("Job scheduler started");
    Ok(sched)
}
