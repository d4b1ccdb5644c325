use crate::settings::Settings;
use axum::http::HeaderMap;

pub const SESSION_COOKIE_NAME: &str = "coursework_session";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCookie {
    pub session_id: String,
}

impl SessionCookie {
    pub fn new(session_id: String) -> Self {
        Self { session_id }
    }

    /// Reads the session id from our cookie, falling back to
    /// `Authorization: Bearer <id>` for non-browser clients.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        Self::from_cookie(headers).or_else(|| Self::from_bearer(headers))
    }

    fn from_cookie(headers: &HeaderMap) -> Option<Self> {
        let cookie_header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;

        for cookie in cookie_header.split(';') {
            let cookie = cookie.trim();
            if let Some(value) = cookie
                .strip_prefix(SESSION_COOKIE_NAME)
                .and_then(|s| s.strip_prefix('='))
            {
                if !value.is_empty() {
                    return Some(Self::new(value.to_string()));
                }
            }
        }
        None
    }

    fn from_bearer(headers: &HeaderMap) -> Option<Self> {
        let value = headers
            .get(axum::http::header::AUTHORIZATION)?
            .to_str()
            .ok()?;
        let token = value.strip_prefix("Bearer ")?.trim();
        (!token.is_empty()).then(|| Self::new(token.to_string()))
    }

    pub fn to_cookie_header(&self, settings: &Settings) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            SESSION_COOKIE_NAME, self.session_id, settings.server.session_ttl_secs
        )
    }

    pub fn delete_cookie_header() -> String {
        format!(
            "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
            SESSION_COOKIE_NAME
        )
    }
}
