use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

use crate::extractors::RequestContext;
use crate::routes::home;

/// Stylesheet and default avatar/header images, compiled into the binary.
#[derive(Embed)]
#[folder = "assets/"]
struct WarblerAssets;

/// Browsers may cache assets for a day; they only change with a new build.
const CACHE_CONTROL: &str = "public, max-age=86400";

/// GET /assets/{*path}. Unknown paths get the regular 404 page.
pub async fn serve(ctx: RequestContext, Path(path): Path<String>) -> Response {
    let Some(file) = WarblerAssets::get(&path) else {
        tracing::debug!(%path, "Asset not found");
        return home::not_found(ctx).await;
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.essence_str().to_string()),
            (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
        ],
        file.data.into_owned(),
    )
        .into_response()
}
