//! Food photo analysis: image selection, the outbound request and the
//! screen state tying them together.

pub mod client;
pub mod handlers;
pub mod screen;
pub mod upload;

use crate::state::AppState;
use axum::Router;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes(max_upload_bytes))
}
