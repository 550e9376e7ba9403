use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

use crate::auth::repo_types::User;
use crate::error::AppError;
use crate::state::AppState;

/// The user behind the current session pointer.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let nav = state.shell.lock().await;
        nav.current_user()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("not logged in".into()))
    }
}
