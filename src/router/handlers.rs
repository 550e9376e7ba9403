use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, instrument};

use crate::{
    error::AppError,
    router::{Page, View},
    state::AppState,
};

pub fn view_routes() -> Router<AppState> {
    Router::new()
        .route("/view", get(current_view))
        .route("/navigate/:page", post(navigate))
}

#[instrument(skip(state))]
pub async fn current_view(State(state): State<AppState>) -> Json<View> {
    Json(state.shell.lock().await.render())
}

#[instrument(skip(state))]
pub async fn navigate(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> Result<Json<View>, AppError> {
    let page: Page = page
        .parse()
        .map_err(|e: crate::router::UnknownPage| AppError::NotFound(e.to_string()))?;
    let mut nav = state.shell.lock().await;
    debug!(from = %nav.page(), to = %page, "navigate");
    nav.navigate(page);
    Ok(Json(nav.render()))
}
