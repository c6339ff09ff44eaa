use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;

use crate::{
    audit,
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserInfo},
    error::{AppError, AppResult},
    models::{User, UserId},
    services::token_service::issue_token,
    state::AppState,
};

struct NewUser {
    full_name: String,
    country: String,
    city: String,
    email: String,
    phone: String,
    password: String,
    age: i32,
}

impl TryFrom<RegisterRequest> for NewUser {
    type Error = AppError;

    fn try_from(payload: RegisterRequest) -> Result<Self, Self::Error> {
        let all_fields = || AppError::Validation("all fields are required".into());
        let age = payload.age.filter(|age| *age > 0).ok_or_else(all_fields)?;

        Ok(NewUser {
            full_name: required(payload.full_name).ok_or_else(all_fields)?,
            country: required(payload.country).ok_or_else(all_fields)?,
            city: required(payload.city).ok_or_else(all_fields)?,
            email: required(payload.email)
                .map(|e| e.to_lowercase())
                .ok_or_else(all_fields)?,
            phone: required(payload.phone).ok_or_else(all_fields)?,
            // Passwords are taken verbatim, whitespace included.
            password: payload
                .password
                .filter(|p| !p.is_empty())
                .ok_or_else(all_fields)?,
            age,
        })
    }
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<RegisterResponse> {
    let user = NewUser::try_from(payload)?;

    let exist: Option<(UserId,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(user.email.as_str())
        .fetch_optional(&state.pool)
        .await?;

    if exist.is_some() {
        return Err(AppError::Validation("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&user.password)?;

    // A concurrent registration can still hit the unique index.
    let inserted: Option<(UserId,)> = sqlx::query_as(
        r#"
        INSERT INTO users (full_name, country, city, email, phone, password_hash, age)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&user.full_name)
    .bind(&user.country)
    .bind(&user.city)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(password_hash)
    .bind(user.age)
    .fetch_optional(&state.pool)
    .await?;

    let (user_id,) =
        inserted.ok_or_else(|| AppError::Validation("Email is already taken".to_string()))?;

    let token = issue_token(&state.config.jwt_secret, user_id, state.config.token_ttl)?;
    tracing::info!(user_id, "user registered");

    audit::record(
        &state.pool,
        Some(user_id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;

    Ok(RegisterResponse { token, user_id })
}

pub async fn login_user(state: &AppState, payload: LoginRequest) -> AppResult<LoginResponse> {
    let (email, password) = match (required(payload.email), payload.password) {
        (Some(email), Some(password)) if !password.is_empty() => (email.to_lowercase(), password),
        _ => return Err(AppError::Validation("all fields are required".into())),
    };

    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Validation("Incorrect password".into()));
    }

    let token = issue_token(&state.config.jwt_secret, user.id, state.config.token_ttl)?;
    tracing::info!(user_id = user.id, "user logged in");

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(LoginResponse {
        token,
        user: UserInfo {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
        },
    })
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
