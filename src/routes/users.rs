use crate::{
    auth::{AuthenticatedUser, UpdateProfileRequest},
    error::AppError,
    models::{UserChanges, UserProfile},
    routes::auth::hash_blocking,
    state::AppState,
};
use actix_web::{get, put, web, HttpResponse, Responder};
use validator::Validate;

/// Returns the profile of the user owning the bearer token.
#[get("/profile")]
pub async fn get_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    match state.users.find_by_id(user.0).await? {
        Some(found) => Ok(HttpResponse::Ok().json(UserProfile::from(found))),
        None => Err(AppError::NotFound("User not found".into())),
    }
}

/// Changes username, email and/or password of the authenticated user.
///
/// ## Responses:
/// - `200 OK`: the updated profile.
/// - `400 Bad Request`: the new email belongs to another account.
/// - `401 Unauthorized`: missing or invalid token.
/// - `404 Not Found`: the account behind the token no longer exists.
/// - `422 Unprocessable Entity`: a present field fails validation.
#[put("/profile")]
pub async fn update_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    update: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, AppError> {
    update.validate()?;
    let UpdateProfileRequest {
        username,
        email,
        password,
    } = update.into_inner();

    let password_hash = match password {
        Some(password) => Some(hash_blocking(password, state.bcrypt_cost).await?),
        None => None,
    };
    let changes = UserChanges {
        username,
        email,
        password_hash,
    };

    let updated = if changes.is_empty() {
        state.users.find_by_id(user.0).await?
    } else {
        state.users.update(user.0, changes).await?
    };

    match updated {
        Some(found) => {
            log::info!("user {} updated their profile", found.id);
            Ok(HttpResponse::Ok().json(UserProfile::from(found)))
        }
        None => Err(AppError::NotFound("User not found".into())),
    }
}
