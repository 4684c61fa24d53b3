use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use rusqlite::Connection;
use serde::Deserialize;

use crate::auth::{identity, session};
use crate::db::StoreError;
use crate::error::AppResult;
use crate::extractors::RequestContext;
use crate::routes::home::Html;
use crate::routes::{
    found, message_cards, user_cards, MessageCard, Nav, ProfileHeader, UserCard,
};
use crate::social::users::ProfileUpdate;
use crate::social::{engagement, graph, users};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub nav: Nav,
    pub query: String,
    pub users: Vec<UserCard>,
}

#[derive(Template)]
#[template(path = "users/show.html")]
pub struct UserShowTemplate {
    pub nav: Nav,
    pub profile: ProfileHeader,
    pub messages: Vec<MessageCard>,
}

#[derive(Template)]
#[template(path = "users/follow_list.html")]
pub struct FollowListTemplate {
    pub nav: Nav,
    pub profile: ProfileHeader,
    pub heading: &'static str,
    pub users: Vec<UserCard>,
}

#[derive(Template)]
#[template(path = "users/likes.html")]
pub struct UserLikesTemplate {
    pub nav: Nav,
    pub profile: ProfileHeader,
    pub messages: Vec<MessageCard>,
}

#[derive(Template)]
#[template(path = "users/edit.html")]
pub struct EditProfileTemplate {
    pub nav: Nav,
    pub error: String,
    pub username: String,
    pub email: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditProfileForm {
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list))
        .route("/users/profile", get(edit_profile_page).post(edit_profile))
        .route("/users/delete", post(delete_account))
        .route("/users/follow/{id}", post(follow))
        .route("/users/stop-following/{id}", post(stop_following))
        .route("/users/add_like/{message_id}", post(add_like))
        .route("/users/{id}", get(show))
        .route("/users/{id}/followers", get(followers))
        .route("/users/{id}/following", get(following))
        .route("/users/{id}/likes", get(likes))
}

fn profile_header(conn: &Connection, user_id: i64, ctx: &RequestContext) -> AppResult<ProfileHeader> {
    let user = users::get_user(conn, user_id)?;
    let stats = users::profile_stats(conn, user_id)?;
    let (following, follows_you) = match ctx.user_id() {
        Some(me) if me != user_id => (
            graph::is_following(conn, me, user_id)?,
            graph::is_followed_by(conn, me, user_id)?,
        ),
        _ => (false, false),
    };
    Ok(ProfileHeader::new(user, stats, ctx, following, follows_you))
}

fn viewer_following(conn: &Connection, ctx: &RequestContext) -> AppResult<Vec<i64>> {
    match ctx.user_id() {
        Some(me) => Ok(graph::following_ids(conn, me)?),
        None => Ok(Vec::new()),
    }
}

fn viewer_likes(
    conn: &Connection,
    ctx: &RequestContext,
) -> AppResult<std::collections::HashSet<i64>> {
    match ctx.user_id() {
        Some(me) => Ok(engagement::liked_message_ids(conn, me)?),
        None => Ok(Default::default()),
    }
}

/// GET /users: everyone, or usernames containing `q`
async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<SearchQuery>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let found_users = users::list_users(&conn, query.q.as_deref())?;
    let following = viewer_following(&conn, &ctx)?;

    Ok(Html(UsersIndexTemplate {
        nav: Nav::from_context(&ctx),
        query: query.q.unwrap_or_default(),
        users: user_cards(found_users, &ctx, &following),
    })
    .into_response())
}

/// GET /users/{id}: profile and the user's messages
async fn show(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let profile = profile_header(&conn, id, &ctx)?;
    let liked = viewer_likes(&conn, &ctx)?;
    let messages = engagement::messages_by(&conn, id)?;

    Ok(Html(UserShowTemplate {
        nav: Nav::from_context(&ctx),
        profile,
        messages: message_cards(messages, &ctx, &liked),
    })
    .into_response())
}

/// GET /users/{id}/followers
async fn followers(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    ctx.require_user()?;
    let conn = state.db.get()?;
    let profile = profile_header(&conn, id, &ctx)?;
    let following = viewer_following(&conn, &ctx)?;
    let people = graph::followers(&conn, id)?;

    Ok(Html(FollowListTemplate {
        nav: Nav::from_context(&ctx),
        profile,
        heading: "Followers",
        users: user_cards(people, &ctx, &following),
    })
    .into_response())
}

/// GET /users/{id}/following
async fn following(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    ctx.require_user()?;
    let conn = state.db.get()?;
    let profile = profile_header(&conn, id, &ctx)?;
    let viewer_follows = viewer_following(&conn, &ctx)?;
    let people = graph::following(&conn, id)?;

    Ok(Html(FollowListTemplate {
        nav: Nav::from_context(&ctx),
        profile,
        heading: "Following",
        users: user_cards(people, &ctx, &viewer_follows),
    })
    .into_response())
}

/// GET /users/{id}/likes
async fn likes(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    ctx.require_user()?;
    let conn = state.db.get()?;
    let profile = profile_header(&conn, id, &ctx)?;
    let liked = viewer_likes(&conn, &ctx)?;
    let messages = engagement::liked_messages(&conn, id)?;

    Ok(Html(UserLikesTemplate {
        nav: Nav::from_context(&ctx),
        profile,
        messages: message_cards(messages, &ctx, &liked),
    })
    .into_response())
}

/// POST /users/follow/{id}
async fn follow(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let me = ctx.require_user()?;
    let conn = state.db.get()?;
    users::get_user(&conn, id)?;
    graph::follow(&conn, me.id, id)?;
    Ok(found(&format!("/users/{}/following", me.id)))
}

/// POST /users/stop-following/{id}
async fn stop_following(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let me = ctx.require_user()?;
    let conn = state.db.get()?;
    graph::unfollow(&conn, me.id, id)?;
    Ok(found(&format!("/users/{}/following", me.id)))
}

/// POST /users/add_like/{message_id}: like the message, or unlike it if
/// already liked
async fn add_like(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(message_id): Path<i64>,
) -> AppResult<Response> {
    let me = ctx.require_user()?;
    let mut conn = state.db.get()?;
    engagement::toggle_like(&mut conn, me.id, message_id)?;
    Ok(found("/"))
}

fn edit_form(nav: Nav, form: &EditProfileForm, error: &str) -> Response {
    Html(EditProfileTemplate {
        nav,
        error: error.to_string(),
        username: form.username.clone(),
        email: form.email.clone(),
        image_url: form.image_url.clone().unwrap_or_default(),
        header_image_url: form.header_image_url.clone().unwrap_or_default(),
        bio: form.bio.clone().unwrap_or_default(),
        location: form.location.clone().unwrap_or_default(),
    })
    .into_response()
}

/// GET /users/profile: edit form for the signed-in user
async fn edit_profile_page(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Response> {
    let me = ctx.require_user()?;
    let conn = state.db.get()?;
    let user = users::get_user(&conn, me.id)?;

    Ok(Html(EditProfileTemplate {
        nav: Nav::from_context(&ctx),
        error: String::new(),
        username: user.username,
        email: user.email,
        image_url: user.image_url.unwrap_or_default(),
        header_image_url: user.header_image_url.unwrap_or_default(),
        bio: user.bio.unwrap_or_default(),
        location: user.location.unwrap_or_default(),
    })
    .into_response())
}

/// POST /users/profile: apply the edit if the current password checks out
async fn edit_profile(
    State(state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<EditProfileForm>,
) -> AppResult<Response> {
    let me = ctx.require_user()?;
    let nav = Nav::from_context(&ctx);
    let conn = state.db.get()?;

    if identity::authenticate(&conn, &me.username, &form.password)?.is_none() {
        tracing::warn!(user_id = me.id, "Profile edit with wrong password");
        return Ok(edit_form(nav, &form, "Wrong password, please try again."));
    }
    if form.username.trim().is_empty() || form.email.trim().is_empty() {
        return Ok(edit_form(nav, &form, "Username and email are required."));
    }

    let update = ProfileUpdate {
        username: form.username.clone(),
        email: form.email.clone(),
        image_url: form.image_url.clone(),
        header_image_url: form.header_image_url.clone(),
        bio: form.bio.clone(),
        location: form.location.clone(),
    };
    match users::update_profile(&conn, me.id, &update) {
        Ok(user) => Ok(found(&format!("/users/{}", user.id))),
        Err(StoreError::Integrity(_)) => Ok(edit_form(
            nav,
            &form,
            "Username or email already taken",
        )),
        Err(e) => Err(e.into()),
    }
}

/// POST /users/delete: remove the account and everything it owns
async fn delete_account(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Response> {
    let me = ctx.require_user()?;
    let conn = state.db.get()?;
    users::delete_user(&conn, me.id)?;

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, "/signup".to_string()),
            (
                header::SET_COOKIE,
                session::clear_session_cookie(&state.config.auth.cookie_name),
            ),
        ],
    )
        .into_response())
}
