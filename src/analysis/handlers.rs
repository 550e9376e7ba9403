use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    analysis::{screen::AnalyzeRejection, upload::ImageUpload},
    error::AppError,
    router::{Navigator, Page, View},
    state::AppState,
};

pub const IMAGE_FIELD: &str = "image";

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/food-analysis/preview/:id", get(get_preview))
}

pub fn write_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/food-analysis/image", post(upload_image))
        .route("/food-analysis/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// The screen only accepts input while it is displayed to a logged-in user.
fn ensure_screen_open(nav: &Navigator) -> Result<(), AppError> {
    if !nav.is_authenticated() {
        let msg = Page::FoodAnalysis.login_prompt().unwrap_or_default();
        return Err(AppError::Unauthorized(msg.into()));
    }
    if nav.page() != Page::FoodAnalysis {
        return Err(AppError::Conflict("food analysis screen is not open".into()));
    }
    Ok(())
}

/// POST /food-analysis/image (multipart, field `image`)
#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<Json<View>, AppError> {
    let mut upload = None;
    while let Some(field) = mp.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            let content_type = field.content_type().map(|s| s.to_string());
            let data = field.bytes().await?;
            upload = Some(ImageUpload::new(content_type.as_deref(), data));
            break;
        }
    }
    let Some(upload) = upload else {
        return Err(AppError::BadRequest(format!("{IMAGE_FIELD} is required")));
    };

    let mut nav = state.shell.lock().await;
    ensure_screen_open(&nav)?;
    info!(
        preview_id = %upload.preview.id,
        content_type = %upload.preview.content_type,
        bytes = upload.preview.body.len(),
        "image selected"
    );
    nav.analysis_mut().select_image(upload);
    Ok(Json(nav.render()))
}

/// POST /food-analysis/analyze
#[instrument(skip(state))]
pub async fn analyze(State(state): State<AppState>) -> Result<Json<View>, AppError> {
    let ticket = {
        let mut nav = state.shell.lock().await;
        ensure_screen_open(&nav)?;
        match nav.analysis_mut().begin() {
            Ok(ticket) => ticket,
            Err(AnalyzeRejection::NoImage) => return Ok(Json(nav.render())),
            Err(AnalyzeRejection::Busy) => {
                return Err(AppError::Conflict("analysis already in progress".into()))
            }
        }
    };

    let outcome = state.analyzer.analyze(&ticket.image, &ticket.cancel).await;

    let mut nav = state.shell.lock().await;
    if !nav.analysis_mut().finish(ticket.generation, outcome) {
        info!("analysis outcome discarded; screen was closed");
    }
    Ok(Json(nav.render()))
}

/// GET /food-analysis/preview/:id
#[instrument(skip(state))]
pub async fn get_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let nav = state.shell.lock().await;
    ensure_screen_open(&nav)?;
    let preview = nav
        .analysis()
        .preview(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("preview released".into()))?;
    Ok(([(header::CONTENT_TYPE, preview.content_type)], preview.body))
}
