//! Authentication service for dealer portal accounts

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};

use shared::models::User;
use shared::validation::{validate_email, validate_mobile_number, validate_password};

use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
}

/// Input for registering a dealer account
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub companyname: String,
    pub licencenumber: Option<String>,
    pub address: String,
    pub district: String,
    pub state: String,
    pub mobile_number: String,
    pub email: String,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Input for updating an account; absent fields are unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateUserInput {
    pub companyname: Option<String>,
    pub licencenumber: Option<String>,
    pub address: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub mobile_number: Option<String>,
    pub email: Option<String>,
}

/// User row from the database, password hash included.
#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    username: String,
    password_hash: String,
    companyname: String,
    licencenumber: Option<String>,
    address: String,
    district: String,
    state: String,
    mobile_number: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            companyname: self.companyname,
            licencenumber: self.licencenumber,
            address: self.address,
            district: self.district,
            state: self.state,
            mobile_number: self.mobile_number,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

const SELECT_USER: &str = "SELECT id, username, password_hash, companyname, licencenumber, \
     address, district, state, mobile_number, email, created_at FROM users";

impl AuthService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a dealer account. Username, mobile number, and email
    /// must each be unused.
    pub async fn register(&self, input: RegisterInput) -> AppResult<User> {
        if input.username.trim().len() < 3 {
            return Err(AppError::Validation {
                field: "username".to_string(),
                message: "Username must be at least 3 characters".to_string(),
            });
        }
        validate_password(&input.password).map_err(|e| AppError::Validation {
            field: "password".to_string(),
            message: e.to_string(),
        })?;
        validate_mobile_number(&input.mobile_number).map_err(|e| AppError::Validation {
            field: "mobile_number".to_string(),
            message: e.to_string(),
        })?;
        validate_email(&input.email).map_err(|e| AppError::Validation {
            field: "email".to_string(),
            message: e.to_string(),
        })?;

        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users \
             WHERE username = $1 OR mobile_number = $2 OR email = $3",
        )
        .bind(input.username.trim())
        .bind(&input.mobile_number)
        .bind(&input.email)
        .fetch_one(&self.db)
        .await?;
        if taken > 0 {
            return Err(AppError::DuplicateEntry("account".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users
                (username, password_hash, companyname, licencenumber,
                 address, district, state, mobile_number, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, username, password_hash, companyname, licencenumber,
                      address, district, state, mobile_number, email, created_at
            "#,
        )
        .bind(input.username.trim())
        .bind(&password_hash)
        .bind(input.companyname.trim())
        .bind(&input.licencenumber)
        .bind(&input.address)
        .bind(&input.district)
        .bind(&input.state)
        .bind(&input.mobile_number)
        .bind(&input.email)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Registered dealer account {}", row.username);

        Ok(row.into_user())
    }

    /// Verify credentials and return the account.
    pub async fn login(&self, input: LoginInput) -> AppResult<User> {
        let row =
            sqlx::query_as::<_, UserRow>(&format!("{} WHERE username = $1", SELECT_USER))
                .bind(input.username.trim())
                .fetch_optional(&self.db)
                .await?
                .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(&input.password, &row.password_hash)
            .map_err(|e| AppError::Internal(format!("password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        Ok(row.into_user())
    }

    pub async fn get_user(&self, user_id: i32) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = $1", SELECT_USER))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        Ok(row.into_user())
    }

    /// Update profile fields; the mobile number must stay unique across
    /// other accounts.
    pub async fn update_user(&self, user_id: i32, input: UpdateUserInput) -> AppResult<User> {
        if let Some(mobile) = &input.mobile_number {
            validate_mobile_number(mobile).map_err(|e| AppError::Validation {
                field: "mobile_number".to_string(),
                message: e.to_string(),
            })?;
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM users WHERE mobile_number = $1 AND id <> $2",
            )
            .bind(mobile)
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
            if taken > 0 {
                return Err(AppError::DuplicateEntry("mobile_number".to_string()));
            }
        }
        if let Some(email) = &input.email {
            validate_email(email).map_err(|e| AppError::Validation {
                field: "email".to_string(),
                message: e.to_string(),
            })?;
        }

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                companyname = COALESCE($2, companyname),
                licencenumber = COALESCE($3, licencenumber),
                address = COALESCE($4, address),
                district = COALESCE($5, district),
                state = COALESCE($6, state),
                mobile_number = COALESCE($7, mobile_number),
                email = COALESCE($8, email)
            WHERE id = $1
            RETURNING id, username, password_hash, companyname, licencenumber,
                      address, district, state, mobile_number, email, created_at
            "#,
        )
        .bind(user_id)
        .bind(&input.companyname)
        .bind(&input.licencenumber)
        .bind(&input.address)
        .bind(&input.district)
        .bind(&input.state)
        .bind(&input.mobile_number)
        .bind(&input.email)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(row.into_user())
    }
}
