pub mod assets;
pub mod auth;
pub mod home;
pub mod messages;
pub mod users;

use std::collections::HashSet;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::db::models::{FeedEntry, User};
use crate::extractors::RequestContext;
use crate::social::users::ProfileStats;
use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .merge(auth::router())
        .merge(users::router())
        .merge(messages::router())
        .fallback(home::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Navbar state shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub signed_in: bool,
    pub user_id: i64,
    pub avatar: String,
}

impl Nav {
    pub fn from_context(ctx: &RequestContext) -> Self {
        match &ctx.user {
            Some(user) => Nav {
                signed_in: true,
                user_id: user.id,
                avatar: user
                    .image_url
                    .clone()
                    .unwrap_or_else(|| crate::db::models::DEFAULT_IMAGE_URL.to_string()),
            },
            None => Nav::default(),
        }
    }
}

/// A message as rendered in a list.
#[derive(Debug, Clone)]
pub struct MessageCard {
    pub id: i64,
    pub text: String,
    pub posted_on: String,
    pub user_id: i64,
    pub username: String,
    pub avatar: String,
    pub liked: bool,
    pub can_like: bool,
}

pub fn message_cards(
    entries: Vec<FeedEntry>,
    ctx: &RequestContext,
    liked: &HashSet<i64>,
) -> Vec<MessageCard> {
    let viewer = ctx.user_id();
    entries
        .into_iter()
        .map(|entry| MessageCard {
            id: entry.message.id,
            posted_on: entry.message.posted_on(),
            user_id: entry.message.user_id,
            avatar: entry.avatar().to_string(),
            liked: liked.contains(&entry.message.id),
            can_like: viewer.is_some_and(|id| id != entry.message.user_id),
            text: entry.message.text,
            username: entry.username,
        })
        .collect()
}

/// A user as rendered in a grid of cards.
#[derive(Debug, Clone)]
pub struct UserCard {
    pub id: i64,
    pub username: String,
    pub avatar: String,
    pub header_image: String,
    pub bio: String,
    pub is_me: bool,
    /// Whether the viewer is signed in and so can follow or unfollow.
    pub signed_in: bool,
    pub following: bool,
}

pub fn user_cards(users: Vec<User>, ctx: &RequestContext, following: &[i64]) -> Vec<UserCard> {
    let viewer = ctx.user_id();
    users
        .into_iter()
        .map(|user| UserCard {
            id: user.id,
            avatar: user.avatar().to_string(),
            header_image: user.header_image().to_string(),
            is_me: viewer == Some(user.id),
            signed_in: viewer.is_some(),
            following: following.contains(&user.id),
            bio: user.bio.unwrap_or_default(),
            username: user.username,
        })
        .collect()
}

/// The header at the top of every profile page.
#[derive(Debug, Clone)]
pub struct ProfileHeader {
    pub id: i64,
    pub username: String,
    pub avatar: String,
    pub header_image: String,
    pub bio: String,
    pub location: String,
    pub stats: ProfileStats,
    pub is_me: bool,
    pub signed_in: bool,
    pub following: bool,
    pub follows_you: bool,
}

impl ProfileHeader {
    pub fn new(
        user: User,
        stats: ProfileStats,
        ctx: &RequestContext,
        following: bool,
        follows_you: bool,
    ) -> Self {
        ProfileHeader {
            id: user.id,
            avatar: user.avatar().to_string(),
            header_image: user.header_image().to_string(),
            bio: user.bio.unwrap_or_default(),
            location: user.location.unwrap_or_default(),
            stats,
            is_me: ctx.user_id() == Some(user.id),
            signed_in: ctx.is_authenticated(),
            following,
            follows_you,
            username: user.username,
        }
    }
}
