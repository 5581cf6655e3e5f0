use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    access,
    auth::{
        extractors::{CurrentSuperuser, CurrentUser},
        password::{hash_password, verify_password},
    },
    error::{ApiError, ApiResult},
    state::AppState,
    users::{
        dto::{
            CreateUserRequest, Message, Pagination, PublicUser, UpdateMeRequest,
            UpdatePasswordRequest, UserStatusPatch, UsersResponse,
        },
        repo::User,
    },
    validate,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/me",
            get(get_me).patch(update_me).delete(delete_me),
        )
        .route("/users/me/password", patch(update_password_me))
        .route(
            "/users/:id",
            get(get_user).patch(update_user_status).delete(delete_user),
        )
}

fn validate_pagination(p: &Pagination) -> Result<(), ApiError> {
    if p.skip < 0 || !(1..=500).contains(&p.limit) {
        return Err(ApiError::Validation(
            "skip must be non-negative and limit between 1 and 500".into(),
        ));
    }
    Ok(())
}

#[instrument(skip(state, _actor))]
async fn list_users(
    State(state): State<AppState>,
    CurrentSuperuser(_actor): CurrentSuperuser,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<UsersResponse>> {
    validate_pagination(&pagination)?;
    let (users, count) = User::list(&state.db, pagination.skip, pagination.limit).await?;
    Ok(Json(UsersResponse {
        data: users.into_iter().map(PublicUser::from).collect(),
        count,
    }))
}

#[instrument(skip(state, actor, payload))]
async fn create_user(
    State(state): State<AppState>,
    CurrentSuperuser(actor): CurrentSuperuser,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<Json<PublicUser>> {
    access::ensure_can_create_user(&actor, payload.is_root)?;

    let email = validate::normalize_email(&payload.email);
    validate::validate_email(&email)?;
    validate::validate_password(&payload.password)?;

    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::EmailTaken);
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        &email,
        &hash,
        payload.is_active,
        payload.is_superuser,
        payload.is_root,
    )
    .await?;

    info!(user_id = %user.id, actor_id = %actor.id, "user created by admin");
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(actor))]
async fn get_me(CurrentUser(actor): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(actor))
}

#[instrument(skip(state, actor, payload))]
async fn update_me(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(payload): Json<UpdateMeRequest>,
) -> ApiResult<Json<PublicUser>> {
    let Some(email) = payload.email else {
        return Ok(Json(PublicUser::from(actor)));
    };

    let email = validate::normalize_email(&email);
    validate::validate_email(&email)?;

    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::EmailTaken);
    }

    let updated = User::update_email(&state.db, actor.id, &email).await?;
    info!(user_id = %updated.id, "email updated");
    Ok(Json(PublicUser::from(updated)))
}

#[instrument(skip(state, actor, payload))]
async fn update_password_me(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> ApiResult<Json<Message>> {
    if !verify_password(&payload.current_password, &actor.password_hash)? {
        warn!(user_id = %actor.id, "password update with wrong current password");
        return Err(ApiError::Validation("incorrect password".into()));
    }
    // Compared before hashing, per the password-reuse rule.
    if payload.current_password == payload.new_password {
        return Err(ApiError::Validation(
            "new password must differ from the current one".into(),
        ));
    }
    validate::validate_password(&payload.new_password)?;

    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, actor.id, &hash).await?;

    info!(user_id = %actor.id, "password updated");
    Ok(Json(Message {
        message: "password updated successfully",
    }))
}

#[instrument(skip(state, actor))]
async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Message>> {
    access::ensure_can_delete_self(&actor)?;
    User::delete(&state.db, actor.id).await?;
    info!(user_id = %actor.id, "user deleted own account");
    Ok(Json(Message {
        message: "user deleted successfully",
    }))
}

#[instrument(skip(state, _actor))]
async fn get_user(
    State(state): State<AppState>,
    CurrentSuperuser(_actor): CurrentSuperuser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, actor, payload))]
async fn update_user_status(
    State(state): State<AppState>,
    CurrentSuperuser(actor): CurrentSuperuser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UserStatusPatch>,
) -> ApiResult<Json<PublicUser>> {
    let target = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    access::ensure_can_update_status(&actor, &target)?;

    let (is_active, is_superuser, is_root) = payload.apply(&target);
    let updated = User::update_status(&state.db, target.id, is_active, is_superuser, is_root).await?;

    info!(user_id = %updated.id, actor_id = %actor.id, "user status updated");
    Ok(Json(PublicUser::from(updated)))
}

#[instrument(skip(state, actor))]
async fn delete_user(
    State(state): State<AppState>,
    CurrentSuperuser(actor): CurrentSuperuser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Message>> {
    let target = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    access::ensure_can_delete_user(&actor, &target)?;

    User::delete(&state.db, target.id).await?;
    info!(user_id = %target.id, actor_id = %actor.id, "user deleted by admin");
    Ok(Json(Message {
        message: "user deleted successfully",
    }))
}
