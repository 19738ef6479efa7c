use crate::application::http::{classify::router::ClassifyApiDoc, health::HealthApiDoc};
use utoipa::OpenApi;

// utoipa-gen rejects an empty string literal for `nest(path = ...)`; an expression with the same value is accepted.
const ROOT_PATH: &str = "";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FoodLens API"
    ),
    nest(
        (path = ROOT_PATH, api = ClassifyApiDoc),
        (path = ROOT_PATH, api = HealthApiDoc),
    )
)]
pub struct ApiDoc;
