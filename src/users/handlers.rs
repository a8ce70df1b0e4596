use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    state::AppState,
    users::{
        dto::{DataEnvelope, MessageEnvelope, RegisterRequest, UpdateRequest},
        entity::{NewUser, UserPatch, UserResponse},
        error::{ApiError, ApiResult},
        password::hash_password,
        repo::RepoError,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(find_all_users).post(register_user))
        .route(
            "/users/:id",
            get(find_user_by_id).put(update_user).delete(delete_user),
        )
        .route("/users/username/:username", get(find_user_by_username))
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>().map_err(|e| {
        warn!(id = %raw, "non-numeric user id");
        ApiError::BadRequest(format!("invalid user id {raw:?}: {e}"))
    })
}

fn path_param(param: Result<Path<String>, PathRejection>) -> ApiResult<String> {
    match param {
        Ok(Path(value)) => Ok(value),
        Err(rejection) => {
            let message = rejection.body_text();
            warn!(error = %message, "bad path parameter");
            Err(ApiError::BadRequest(message))
        }
    }
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            let message = rejection.body_text();
            warn!(error = %message, "malformed request body");
            Err(ApiError::BadRequest(message))
        }
    }
}

/// NotFound -> 404, anything else -> 500.
fn lookup_error(e: RepoError) -> ApiError {
    match e {
        RepoError::NotFound => ApiError::NotFound("user not found".into()),
        RepoError::Storage(e) => {
            error!(error = ?e, "storage failure");
            ApiError::internal(e)
        }
    }
}

fn hash_error(e: anyhow::Error) -> ApiError {
    error!(error = %e, "hash_password failed");
    ApiError::internal(e)
}

// Best-effort pre-checks for a friendlier 409. They race with concurrent
// writers; the unique constraints on the table are what actually hold.

async fn ensure_username_free(
    state: &AppState,
    username: &str,
    owner: Option<i64>,
) -> ApiResult<()> {
    match state.users.find_user_by_username(username).await {
        Ok(existing) if Some(existing.id) != owner => {
            warn!(%username, "username already exists");
            Err(ApiError::Conflict("username already exists".into()))
        }
        Ok(_) | Err(RepoError::NotFound) => Ok(()),
        Err(e) => {
            warn!(error = ?e, "username pre-check failed; leaving it to the insert");
            Ok(())
        }
    }
}

async fn ensure_email_free(
    state: &AppState,
    email: &str,
    owner: Option<i64>,
) -> ApiResult<()> {
    match state.users.find_user_by_email(email).await {
        Ok(existing) if Some(existing.id) != owner => {
            warn!(%email, "email already exists");
            Err(ApiError::Conflict("email already exists".into()))
        }
        Ok(_) | Err(RepoError::NotFound) => Ok(()),
        Err(e) => {
            warn!(error = ?e, "email pre-check failed; leaving it to the insert");
            Ok(())
        }
    }
}

/// Anything outside the route table.
pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("route not found".into())
}

/// POST /users
#[instrument(skip(state, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<DataEnvelope<UserResponse>>> {
    let mut user = NewUser::from(parse_body(payload)?);

    if let Err(e) = user.validate() {
        warn!(error = %e, "invalid registration");
        return Err(e.into());
    }

    ensure_username_free(&state, &user.username, None).await?;
    ensure_email_free(&state, &user.email, None).await?;

    user.password = hash_password(&user.password).map_err(hash_error)?;

    let created = match state.users.register_user(user).await {
        Ok(u) => u,
        Err(e) => {
            error!(error = ?e, "create user failed");
            return Err(ApiError::internal(e));
        }
    };

    info!(user_id = created.id, username = %created.username, "user registered");
    Ok(Json(DataEnvelope::success(created)))
}

/// GET /users
#[instrument(skip(state))]
pub async fn find_all_users(
    State(state): State<AppState>,
) -> ApiResult<Json<DataEnvelope<Vec<UserResponse>>>> {
    let users = state.users.find_all_users().await.map_err(|e| {
        error!(error = ?e, "list users failed");
        ApiError::internal(e)
    })?;
    Ok(Json(DataEnvelope::success(users)))
}

/// GET /users/:id
#[instrument(skip(state))]
pub async fn find_user_by_id(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<DataEnvelope<UserResponse>>> {
    let id = parse_id(&path_param(id)?)?;
    let user = state.users.find_user_by_id(id).await.map_err(lookup_error)?;
    Ok(Json(DataEnvelope::success(user)))
}

/// GET /users/username/:username
#[instrument(skip(state))]
pub async fn find_user_by_username(
    State(state): State<AppState>,
    username: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<DataEnvelope<UserResponse>>> {
    let username = path_param(username)?;
    let user = state
        .users
        .find_user_by_username(&username)
        .await
        .map_err(lookup_error)?;
    Ok(Json(DataEnvelope::success(user)))
}

/// PUT /users/:id
///
/// Partial update: absent or empty fields keep their stored value, and the
/// password is re-hashed only when a new one is supplied.
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<Json<DataEnvelope<UserResponse>>> {
    let id = parse_id(&path_param(id)?)?;
    let mut patch = UserPatch::from(parse_body(payload)?);

    if let Err(e) = patch.validate() {
        warn!(error = %e, user_id = id, "invalid update");
        return Err(e.into());
    }

    state.users.find_user_by_id(id).await.map_err(lookup_error)?;

    if let Some(username) = &patch.username {
        ensure_username_free(&state, username, Some(id)).await?;
    }
    if let Some(email) = &patch.email {
        ensure_email_free(&state, email, Some(id)).await?;
    }

    if let Some(plain) = patch.password.take() {
        patch.password = Some(hash_password(&plain).map_err(hash_error)?);
    }

    let updated = state.users.update_user(id, patch).await.map_err(lookup_error)?;

    info!(user_id = updated.id, "user updated");
    Ok(Json(DataEnvelope::success(updated)))
}

/// DELETE /users/:id
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<MessageEnvelope>> {
    let id = parse_id(&path_param(id)?)?;
    state.users.delete_user(id).await.map_err(lookup_error)?;

    info!(user_id = id, "user deleted");
    Ok(Json(MessageEnvelope::success("user deleted")))
}
