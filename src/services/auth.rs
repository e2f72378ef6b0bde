// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, Role, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    jwt_ttl_hours: i64,
    otp_ttl_minutes: i64,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        jwt_secret: String,
        jwt_ttl_hours: i64,
        otp_ttl_minutes: i64,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, jwt_secret, jwt_ttl_hours, otp_ttl_minutes, pool }
    }

    /// The first account ever created becomes the administrator; everyone
    /// after that starts as staff.
    pub async fn register_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(String, User), AppError> {
        // Hashing stays outside the transaction, it never touches the database.
        let hashed_password = hash_password(password).await?;

        let mut tx = self.pool.begin().await?;

        self.user_repo.lock_registrations(&mut *tx).await?;
        let existing = self.user_repo.count_users(&mut *tx).await?;
        let role = if existing == 0 { Role::Admin } else { Role::Staff };

        let new_user = self
            .user_repo
            .create_user(&mut *tx, name.trim(), email.trim(), &hashed_password, role)
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = %new_user.id, role = ?new_user.role, "👤 User registered");

        let token = self.create_token(&new_user)?;
        Ok((token, new_user))
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<(String, User), AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? || !user.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&user)?;
        Ok((token, user))
    }

    /// Resolves a bearer token to a live, active user. The role from the
    /// database wins over the one in the token, so demotions apply at once.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(&self.jwt_secret, token)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.is_active {
            return Err(AppError::InvalidToken);
        }
        Ok(user)
    }

    /// Always succeeds from the caller's point of view, so the endpoint
    /// cannot be used to probe which emails are registered.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.user_repo.find_by_email(email.trim()).await? else {
            tracing::info!("Password reset requested for an unknown email");
            return Ok(());
        };

        let otp = generate_otp();
        let otp_hash = hash_password(&otp).await?;
        let expires_at = Utc::now() + Duration::minutes(self.otp_ttl_minutes);

        self.user_repo.store_reset_otp(user.id, &otp_hash, expires_at).await?;

        // Delivery (email/SMS) is not wired; the code goes to the server log.
        tracing::info!(user_id = %user.id, %otp, %expires_at, "🔑 Password reset code issued");
        Ok(())
    }

    pub async fn reset_password(&self, email: &str, otp: &str, new_password: &str) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidOtp)?;

        let (Some(otp_hash), Some(expires_at)) = (&user.reset_otp_hash, user.reset_otp_expires_at) else {
            return Err(AppError::InvalidOtp);
        };

        if otp_expired(expires_at, Utc::now()) || !verify_password(otp, otp_hash).await? {
            return Err(AppError::InvalidOtp);
        }

        let hashed_password = hash_password(new_password).await?;
        self.user_repo.reset_password(user.id, &hashed_password).await?;

        tracing::info!(user_id = %user.id, "🔑 Password reset completed");
        Ok(())
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        issue_token(&self.jwt_secret, user.id, user.role, self.jwt_ttl_hours)
    }
}

pub fn issue_token(secret: &str, user_id: Uuid, role: Role, ttl_hours: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(ttl_hours);

    let claims = Claims {
        sub: user_id,
        role,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;
    Ok(token_data.claims)
}

// bcrypt is CPU-bound; keep it off the async workers.
async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("hashing task failed: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let is_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??;
    Ok(is_valid)
}

fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", code)
}

fn otp_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= expires_at
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-with-enough-length";

    #[test]
    fn token_round_trip_keeps_subject_and_role() {
        let user_id = Uuid::new_v4();
        let token = issue_token(SECRET, user_id, Role::InventoryManager, 1).unwrap();

        let claims = decode_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::InventoryManager);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token("another-secret-entirely", Uuid::new_v4(), Role::Admin, 1).unwrap();
        assert!(matches!(decode_token(SECRET, &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(SECRET, Uuid::new_v4(), Role::Staff, -2).unwrap();
        assert!(matches!(decode_token(SECRET, &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode_token(SECRET, "not.a.jwt"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn otp_has_six_digits() {
        for _ in 0..50 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn otp_expiry_is_inclusive() {
        let now = Utc::now();
        assert!(otp_expired(now, now));
        assert!(!otp_expired(now + Duration::minutes(1), now));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hashed = hash_password("correct horse").await.unwrap();
        assert!(verify_password("correct horse", &hashed).await.unwrap());
        assert!(!verify_password("battery staple", &hashed).await.unwrap());
    }
}
