use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use rusqlite::Connection;
use serde::Deserialize;

use crate::auth::{identity, session};
use crate::db::{StoreError, StoreResult};
use crate::error::{AppError, AppResult};
use crate::extractors::RequestContext;
use crate::routes::home::Html;
use crate::routes::Nav;
use crate::state::AppState;

/// Shortest password accepted at signup.
pub const MIN_PASSWORD_LEN: usize = 6;

// -- Templates --

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub nav: Nav,
    pub error: String,
    pub username: String,
    pub email: String,
    pub image_url: String,
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub error: String,
    pub username: String,
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// First problem with a signup form, if any.
pub fn validate_signup(form: &SignupForm) -> Option<String> {
    if form.username.trim().is_empty() {
        return Some("Username is required.".to_string());
    }
    let email = form.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Some("Invalid email address.".to_string()),
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Some(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        ));
    }
    None
}

fn signup_form(nav: Nav, form: &SignupForm, error: &str) -> Response {
    Html(SignupTemplate {
        nav,
        error: error.to_string(),
        username: form.username.clone(),
        email: form.email.clone(),
        image_url: form.image_url.clone().unwrap_or_default(),
    })
    .into_response()
}

/// Start a session for `user_id`, ending the one this request arrived with.
fn replace_session(
    conn: &Connection,
    state: &AppState,
    ctx: &RequestContext,
    user_id: i64,
) -> StoreResult<String> {
    if let Some(previous) = &ctx.session_token {
        session::delete_session(conn, previous)?;
    }
    session::create_session(conn, user_id, state.config.auth.session_hours)
}

/// `302` to `location` while setting the session cookie.
fn signed_in_redirect(state: &AppState, token: &str, location: &str) -> Response {
    let auth = &state.config.auth;
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, location.to_string()),
            (
                header::SET_COOKIE,
                session::session_cookie(&auth.cookie_name, token, auth.session_hours),
            ),
        ],
    )
        .into_response()
}

// -- Signup handlers --

/// GET /signup
pub async fn signup_page(ctx: RequestContext) -> Html<SignupTemplate> {
    Html(SignupTemplate {
        nav: Nav::from_context(&ctx),
        error: String::new(),
        username: String::new(),
        email: String::new(),
        image_url: String::new(),
    })
}

/// POST /signup: create the account and sign it in. A taken username or
/// email re-renders the form.
pub async fn signup(
    State(state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let nav = Nav::from_context(&ctx);
    if let Some(error) = validate_signup(&form) {
        return Ok(signup_form(nav, &form, &error));
    }

    let new_user = identity::signup(
        form.username.trim(),
        form.email.trim(),
        &form.password,
        form.image_url.as_deref(),
        state.config.auth.password_cost,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;
    let user = match new_user.insert(&tx) {
        Ok(user) => user,
        Err(StoreError::Integrity(msg)) => {
            tracing::info!("Signup rejected: {}", msg);
            return Ok(signup_form(nav, &form, "Username already taken"));
        }
        Err(e) => return Err(e.into()),
    };
    let token = replace_session(&tx, &state, &ctx, user.id)?;
    tx.commit()?;

    Ok(signed_in_redirect(&state, &token, "/"))
}

// -- Login handlers --

/// GET /login
pub async fn login_page(ctx: RequestContext) -> Html<LoginTemplate> {
    Html(LoginTemplate {
        nav: Nav::from_context(&ctx),
        error: String::new(),
        username: String::new(),
    })
}

/// POST /login: check credentials; success starts a session and redirects
/// home, failure re-renders the form.
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    match identity::authenticate(&conn, &form.username, &form.password)? {
        Some(user) => {
            let token = replace_session(&conn, &state, &ctx, user.id)?;
            tracing::info!(user_id = user.id, "Login succeeded");
            Ok(signed_in_redirect(&state, &token, "/"))
        }
        None => {
            tracing::warn!(username = %form.username, "Login rejected");
            Ok(Html(LoginTemplate {
                nav: Nav::from_context(&ctx),
                error: "Invalid credentials.".to_string(),
                username: form.username,
            })
            .into_response())
        }
    }
}

// -- Logout handler --

/// GET /logout: delete session and redirect to the login page
pub async fn logout(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Response> {
    if let Some(token) = &ctx.session_token {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
    }

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, "/login".to_string()),
            (
                header::SET_COOKIE,
                session::clear_session_cookie(&state.config.auth.cookie_name),
            ),
        ],
    )
        .into_response())
}
