use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{is_unique_violation, User},
    },
    error::ApiError,
    extract::Json,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let (username, password) = payload.validate()?;

    if User::find_by_username(&state.db, &username).await?.is_some() {
        warn!(%username, "username already taken");
        return Err(ApiError::DuplicateUsername);
    }

    let hash = hash_password(&password)?;
    let user = match User::create(&state.db, &username, &hash).await {
        Ok(u) => u,
        // Lost the check-then-insert race; same outcome as the check above.
        Err(e) if is_unique_violation(&e) => return Err(ApiError::DuplicateUsername),
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, %username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(PublicUser {
            id: user.id,
            username: user.username,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = payload.username.unwrap_or_default().trim().to_string();
    let password = payload.password.unwrap_or_default();

    // Unknown username and wrong password must be indistinguishable to the
    // client, so both paths end in InvalidCredentials.
    let user = match User::find_by_username(&state.db, &username).await? {
        Some(u) => u,
        None => {
            warn!(%username, "login unknown username");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(LoginResponse {
        token,
        expires_in: keys.ttl_seconds(),
        user: PublicUser {
            id: user.id,
            username: user.username,
        },
    }))
}
