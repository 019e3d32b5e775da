use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{AuthResponse, Claims, LoginRequest, SignupRequest},
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn signup(state: &AppState, payload: SignupRequest) -> AppResult<ApiResponse<AuthResponse>> {
    validate_signup(&payload)?;
    let SignupRequest {
        name,
        email,
        password,
        phone,
        address,
    } = payload;

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;

    if exist.is_some() {
        return Err(AppError::Conflict("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;
    let id = Uuid::new_v4();

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, phone, address, password_hash, role)
        VALUES ($1, $2, $3, $4, $5, $6, 'customer')
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name.as_str())
    .bind(email.as_str())
    .bind(phone.as_str())
    .bind(address)
    .bind(password_hash)
    .fetch_one(&state.pool)
    .await?;

    let token = issue_token(&state.jwt_secret, &user)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_signup",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "User created",
        AuthResponse { token, user },
        None,
    ))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<AuthResponse>> {
    let LoginRequest { email, password } = payload;
    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;

    // Same message for unknown email and wrong password.
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let token = issue_token(&state.jwt_secret, &user)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Logged in",
        AuthResponse { token, user },
        Some(Meta::empty()),
    ))
}

/// Tokens are stateless JWTs, so there is nothing to revoke server side;
/// the event is recorded and the client discards the token.
pub async fn logout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<serde_json::Value>> {
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "user_logout",
        Some("users"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Logged out",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;

    match row {
        Some(u) => Ok(ApiResponse::success("OK", u, Some(Meta::empty()))),
        None => Err(AppError::NotFound),
    }
}

fn validate_signup(payload: &SignupRequest) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if payload.name.trim().is_empty() {
        errors.push("name", "name is required");
    }
    if !payload.email.contains('@') {
        errors.push("email", "email must be a valid email address");
    }
    if payload.password.len() < 6 {
        errors.push("password", "password must be at least 6 characters");
    }
    if payload.phone.trim().is_empty() {
        errors.push("phone", "phone is required");
    }
    errors.into_result()
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn issue_token(secret: &str, user: &User) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_signup() -> SignupRequest {
        SignupRequest {
            name: "Maria".into(),
            email: "maria@example.com".into(),
            password: "secret1".into(),
            phone: "11999990000".into(),
            address: None,
        }
    }

    #[test]
    fn signup_validation_accepts_complete_payload() {
        assert!(validate_signup(&valid_signup()).is_ok());
    }

    #[test]
    fn signup_validation_collects_all_field_errors() {
        let payload = SignupRequest {
            name: " ".into(),
            email: "not-an-email".into(),
            password: "abc".into(),
            phone: "".into(),
            address: None,
        };
        match validate_signup(&payload) {
            Err(AppError::Validation(fields)) => {
                assert_eq!(fields.0.len(), 4);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
