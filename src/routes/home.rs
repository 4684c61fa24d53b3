use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::AppResult;
use crate::extractors::RequestContext;
use crate::routes::{message_cards, MessageCard, Nav, ProfileHeader};
use crate::social::{engagement, users};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/landing.html")]
pub struct LandingTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub nav: Nav,
    pub me: ProfileHeader,
    pub messages: Vec<MessageCard>,
}

#[derive(Template)]
#[template(path = "pages/not_found.html")]
pub struct NotFoundTemplate {
    pub nav: Nav,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// GET /: timeline for signed-in users, signup call-to-action otherwise.
pub async fn index(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Response> {
    let nav = Nav::from_context(&ctx);
    let Some(user_id) = ctx.user_id() else {
        return Ok(Html(LandingTemplate { nav }).into_response());
    };

    let conn = state.db.get()?;
    let user = users::get_user(&conn, user_id)?;
    let stats = users::profile_stats(&conn, user_id)?;
    let liked = engagement::liked_message_ids(&conn, user_id)?;
    let feed = engagement::timeline(&conn, user_id)?;

    Ok(Html(HomeTemplate {
        nav,
        me: ProfileHeader::new(user, stats, &ctx, false, false),
        messages: message_cards(feed, &ctx, &liked),
    })
    .into_response())
}

pub async fn not_found(ctx: RequestContext) -> Response {
    let mut response = Html(NotFoundTemplate {
        nav: Nav::from_context(&ctx),
    })
    .into_response();
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}
