use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use rusqlite::{params, OptionalExtension};

use crate::auth::session;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub image_url: Option<String>,
}

/// Who is making this request, resolved once from the session cookie and
/// handed to the handler. Anonymous requests carry `user: None`.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<CurrentUser>,
    pub session_token: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The signed-in user, or `AppError::Unauthorized` (a redirect to the
    /// landing page).
    pub fn require_user(&self) -> AppResult<&CurrentUser> {
        self.user.as_ref().ok_or(AppError::Unauthorized)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = cookie_value(parts, &state.config.auth.cookie_name) else {
            return Ok(RequestContext::anonymous());
        };

        let conn = state.db.get()?;
        let Some(user_id) = session::lookup_session(&conn, token)? else {
            return Ok(RequestContext::anonymous());
        };

        let user = conn
            .query_row(
                "SELECT id, username, image_url FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(CurrentUser {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        image_url: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(RequestContext {
            user,
            session_token: Some(token.to_string()),
        })
    }
}

pub(crate) fn cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}
