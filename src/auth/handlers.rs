use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, PublicUser, SignupForm},
        extractors::AuthUser,
        services,
    },
    error::AppError,
    router::View,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, form))]
pub async fn signup(
    State(state): State<AppState>,
    Json(form): Json<SignupForm>,
) -> Result<Json<View>, AppError> {
    let mut nav = state.shell.lock().await;
    services::signup(&state.users, &state.sessions, &mut nav, form).await?;
    Ok(Json(nav.render()))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> Result<Json<View>, AppError> {
    let mut nav = state.shell.lock().await;
    services::login(&state.users, &state.sessions, &mut nav, form).await?;
    Ok(Json(nav.render()))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<Json<View>, AppError> {
    let mut nav = state.shell.lock().await;
    let user_id = nav.current_user().map(|u| u.id);
    if let Err(e) = nav.logout(&state.sessions).await {
        error!(error = %e, "clear session failed");
        return Err(AppError::Internal(e));
    }
    info!(?user_id, "user logged out");
    Ok(Json(nav.render()))
}

#[instrument(skip(state, session_user))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(session_user): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state.users.get(session_user.id).await?.ok_or_else(|| {
        warn!(user_id = session_user.id, "session user not found");
        AppError::Unauthorized("User not found".into())
    })?;
    Ok(Json(PublicUser::from(&user)))
}
