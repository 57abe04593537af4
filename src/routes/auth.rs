use crate::{
    auth::{hash_password, verify_password, AuthResponse, LoginRequest, RegisterRequest},
    error::AppError,
    models::NewUser,
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Hashes on the blocking pool so bcrypt does not stall the worker.
pub(crate) async fn hash_blocking(password: String, cost: u32) -> Result<String, AppError> {
    web::block(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, AppError> {
    web::block(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Verification task failed: {}", e)))?
}

/// Register a new user
///
/// Creates a new user account and returns an authentication token.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let RegisterRequest {
        username,
        email,
        password,
    } = register_data.into_inner();

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    let password_hash = hash_blocking(password, state.bcrypt_cost).await?;

    let user = state
        .users
        .insert(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;
    log::info!("registered user {}", user.id);

    let token = state.tokens.generate(user.id)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user_id: user.id,
    }))
}

/// Login user
///
/// Authenticates a user and returns an authentication token.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let LoginRequest { email, password } = login_data.into_inner();

    let Some(user) = state.users.find_by_email(&email).await? else {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_blocking(password, user.password_hash).await? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = state.tokens.generate(user.id)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user_id: user.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenService;
    use actix_web::{http::StatusCode, test, App};
    use chrono::Duration;
    use serde_json::json;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::in_memory(
            TokenService::new("secret", Duration::hours(1)),
            4,
        ))
    }

    #[actix_web::test]
    async fn test_register_validation() {
        let app = test::init_service(App::new().app_data(state()).service(register)).await;

        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "username": "test",
                "email": "invalid-email",
                "password": "password123"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "username": "test",
                "email": "test@example.com",
                "password": "short"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_login_unknown_user() {
        let app = test::init_service(App::new().app_data(state()).service(login)).await;

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({
                "email": "nobody@example.com",
                "password": "password123"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
