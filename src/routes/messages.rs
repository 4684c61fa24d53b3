use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extractors::RequestContext;
use crate::routes::home::Html;
use crate::routes::{found, message_cards, MessageCard, Nav};
use crate::social::engagement::{self, MessageTextError};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "messages/new.html")]
pub struct NewMessageTemplate {
    pub nav: Nav,
    pub error: String,
    pub text: String,
}

#[derive(Template)]
#[template(path = "messages/show.html")]
pub struct MessageShowTemplate {
    pub nav: Nav,
    pub message: MessageCard,
    pub can_delete: bool,
}

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    pub text: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages/new", get(new_page).post(create))
        .route("/messages/{id}", get(show))
        .route("/messages/{id}/delete", post(delete))
}

/// GET /messages/new
async fn new_page(ctx: RequestContext) -> AppResult<Response> {
    ctx.require_user()?;
    Ok(Html(NewMessageTemplate {
        nav: Nav::from_context(&ctx),
        error: String::new(),
        text: String::new(),
    })
    .into_response())
}

/// POST /messages/new: post a warble, then show it on the author's profile
async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<MessageForm>,
) -> AppResult<Response> {
    let me = ctx.require_user()?;

    let text = match engagement::validate_text(&form.text) {
        Ok(text) => text,
        Err(e) => {
            let error = match e {
                MessageTextError::Empty => "Say something first.",
                MessageTextError::TooLong => "Messages are limited to 140 characters.",
            };
            return Ok(Html(NewMessageTemplate {
                nav: Nav::from_context(&ctx),
                error: error.to_string(),
                text: form.text.clone(),
            })
            .into_response());
        }
    };

    let conn = state.db.get()?;
    let message = engagement::create_message(&conn, me.id, text)?;
    Ok(found(&format!("/users/{}", message.user_id)))
}

/// GET /messages/{id}
async fn show(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let entry = engagement::get_feed_entry(&conn, id)?;
    let can_delete = ctx.user_id() == Some(entry.message.user_id);
    let liked = match ctx.user_id() {
        Some(me) => engagement::liked_message_ids(&conn, me)?,
        None => Default::default(),
    };

    let message = message_cards(vec![entry], &ctx, &liked)
        .pop()
        .ok_or(AppError::NotFound)?;

    Ok(Html(MessageShowTemplate {
        nav: Nav::from_context(&ctx),
        message,
        can_delete,
    })
    .into_response())
}

/// POST /messages/{id}/delete: only the author may delete
async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let me = ctx.require_user()?;
    let conn = state.db.get()?;
    let message = engagement::get_message(&conn, id)?;
    if message.user_id != me.id {
        tracing::warn!(user_id = me.id, message_id = id, "Refused to delete another user's message");
        return Err(AppError::Unauthorized);
    }
    engagement::delete_message(&conn, id)?;
    Ok(found(&format!("/users/{}", me.id)))
}
