use axum::extract::{Multipart, State};
use foodlens_core::domain::{
    classification::{
        entities::ClassifyOutput,
        ports::ClassificationService,
        value_objects::{ClassificationMode, ClassifyImageInput, OutputLanguage},
    },
    common::generate_uuid_v7,
};
use tracing::{info, warn};
use validator::Validate;

use crate::application::http::{
    classify::{
        summary::summarize,
        validators::{ClassifyImageForm, ClassifyImageRequest, ClassifyImageResponse},
    },
    server::{
        api_entities::{
            api_error::{ApiError, ApiErrorResponse},
            response::Response,
        },
        app_state::AppState,
    },
};

async fn read_form(multipart: &mut Multipart) -> Result<ClassifyImageForm, ApiError> {
    let mut form = ClassifyImageForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "image" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read image: {}", e)))?;
                form.image = data.to_vec();
            }
            "mode" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read mode: {}", e)))?;
                form.mode = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            "lang" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read lang: {}", e)))?;
                form.lang = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            _ => {}
        }
    }

    Ok(form)
}

#[utoipa::path(
    post,
    path = "/classify",
    tag = "classify",
    summary = "Classify a food image",
    description = "Identifies the food in an uploaded image and estimates its calories",
    request_body(content = ClassifyImageRequest, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = ClassifyImageResponse),
        (status = 400, body = ApiErrorResponse),
        (status = 500, body = ApiErrorResponse),
    ),
)]
pub async fn classify_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response<ClassifyImageResponse>, ApiError> {
    let form = read_form(&mut multipart).await?;
    form.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let requested = form
        .mode
        .as_deref()
        .map(str::parse::<ClassificationMode>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let mode = state.args.classifier.effective_mode(requested);

    let requested_language = form.lang.as_deref().map(OutputLanguage::from_code);
    let language = requested_language.unwrap_or(state.service.settings().output_language);

    let request_id = generate_uuid_v7();
    info!(%request_id, ?mode, %language, bytes = form.image.len(), "classify request");

    let output = state
        .service
        .classify_image(ClassifyImageInput {
            image_data: form.image,
            mode,
            output_language: requested_language,
        })
        .await
        .map_err(|e| {
            warn!(%request_id, error = %e, "classify request failed");
            ApiError::from(e)
        })?;

    let response = match output {
        ClassifyOutput::Structured(data) => ClassifyImageResponse::Classified {
            text: summarize(&data, language),
            data,
        },
        ClassifyOutput::Raw { raw } => ClassifyImageResponse::Raw { raw },
        ClassifyOutput::Local(local) => ClassifyImageResponse::Local(local),
    };

    Ok(Response::OK(response))
}
