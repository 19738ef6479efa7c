use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use utoipa::OpenApi;

use super::{
    handlers::{
        classify_image::{__path_classify_image, classify_image},
        get_homepage::{__path_get_homepage, get_homepage},
    },
    validators::MAX_IMAGE_SIZE,
};
use crate::application::http::server::app_state::AppState;

/// Room for the other form fields and multipart framing.
const FORM_OVERHEAD: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(paths(classify_image, get_homepage))]
pub struct ClassifyApiDoc;

pub fn classify_routes(state: AppState) -> Router<AppState> {
    let root_path = &state.args.server.root_path;
    let homepage = if root_path.is_empty() {
        "/".to_string()
    } else {
        root_path.clone()
    };

    Router::new()
        .route(&homepage, get(get_homepage))
        .route(
            &format!("{}/classify", root_path),
            post(classify_image).layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + FORM_OVERHEAD)),
        )
}
