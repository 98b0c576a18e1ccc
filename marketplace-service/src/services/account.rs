//! Credential and verification core: signup, login, one-time codes,
//! password reset/change and profile maintenance.
//!
//! Every operation runs its store calls strictly in sequence. There is no
//! cross-store transaction, so a failure part way through leaves the steps
//! already taken in place and surfaces as a store error.

use chrono::{Duration, Utc};
use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::models::{User, UserProfile};
use crate::services::email::EmailProvider;
use crate::services::error::AccountError;
use crate::services::stores::{CredentialStore, SessionStore, VerificationCodeStore};
use crate::utils::{generate_otp, hash_password, verify_password, Password};

#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub session_id: String,
    pub name: String,
    pub email: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    Verified { user_id: i64 },
    AlreadyVerified,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PasswordChanged {
    pub session_id: String,
    pub user_id: i64,
}

static PHONE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\+?[0-9]{10}$").ok());

/// Optional leading `+`, then exactly ten digits.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.as_ref().is_some_and(|re| re.is_match(phone))
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// "3 minutes" for whole minutes, "90 seconds" otherwise.
pub fn ttl_label(ttl: Duration) -> String {
    let secs = ttl.num_seconds();
    match secs {
        60 => "1 minute".to_string(),
        s if s > 0 && s % 60 == 0 => format!("{} minutes", s / 60),
        s => format!("{} seconds", s),
    }
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn CredentialStore>,
    codes: Arc<dyn VerificationCodeStore>,
    sessions: Arc<dyn SessionStore>,
    email: Arc<dyn EmailProvider>,
    code_ttl: Duration,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        codes: Arc<dyn VerificationCodeStore>,
        sessions: Arc<dyn SessionStore>,
        email: Arc<dyn EmailProvider>,
        code_ttl: Duration,
    ) -> Self {
        Self {
            users,
            codes,
            sessions,
            email,
            code_ttl,
        }
    }

    pub fn code_ttl(&self) -> Duration {
        self.code_ttl
    }

    async fn user_by_email(&self, email: &str) -> Result<User, AccountError> {
        self.users
            .find_user_by_email(email)
            .await
            .map_err(AccountError::Store)?
            .ok_or(AccountError::UserNotFound)
    }

    /// Best-effort cleanup; the caller's outcome does not depend on it.
    async fn discard_code(&self, user_id: i64) {
        if let Err(e) = self.codes.delete_code(user_id).await {
            tracing::warn!(user_id, error = %e, "Failed to delete verification code");
        }
    }

    /// Checks `candidate` against the stored code. An expired row is removed
    /// (best effort) before reporting; a mismatch leaves it for retries.
    async fn check_code(&self, user_id: i64, candidate: &str) -> Result<(), AccountError> {
        let stored = self
            .codes
            .get_code(user_id)
            .await
            .map_err(AccountError::Store)?
            .ok_or(AccountError::NoActiveCode)?;

        if stored.is_expired_at(Utc::now()) {
            tracing::info!(user_id, "Verification code expired");
            self.discard_code(user_id).await;
            return Err(AccountError::CodeExpired);
        }

        if !stored.matches(candidate) {
            tracing::info!(user_id, "Verification code mismatch");
            return Err(AccountError::InvalidCode);
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, fields(email = %email))]
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &Password,
    ) -> Result<i64, AccountError> {
        if blank(name) || blank(email) || password.is_blank() {
            return Err(AccountError::MissingFields("Email, Name, and Password required"));
        }

        if self
            .users
            .email_exists(email)
            .await
            .map_err(AccountError::Store)?
        {
            return Err(AccountError::EmailAlreadyRegistered);
        }

        let hash = hash_password(password).map_err(AccountError::Internal)?;
        let user_id = self
            .users
            .create_user(name, email, &hash)
            .await
            .map_err(AccountError::Store)?
            .ok_or(AccountError::EmailAlreadyRegistered)?;

        tracing::info!(user_id, "User registered");
        Ok(user_id)
    }

    #[tracing::instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &Password) -> Result<LoginOutcome, AccountError> {
        if blank(email) || password.is_blank() {
            return Err(AccountError::MissingFields("Email and password required"));
        }

        let candidate = self
            .users
            .find_user_by_email(email)
            .await
            .map_err(AccountError::Store)?
            .ok_or(AccountError::InvalidCredentials)?;

        if !verify_password(password, &candidate.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }

        let user = self
            .users
            .find_user_by_id(candidate.id)
            .await
            .map_err(AccountError::Store)?
            .ok_or_else(|| {
                AccountError::Store(anyhow::anyhow!("user {} vanished during login", candidate.id))
            })?;

        if !user.verified {
            return Err(AccountError::EmailNotVerified);
        }

        let session_id = self
            .sessions
            .create_session(user.id)
            .await
            .map_err(AccountError::Store)?;

        tracing::info!(user_id = user.id, "Login succeeded");
        Ok(LoginOutcome {
            session_id,
            name: user.name,
            email: user.email,
            user_id: user.id,
        })
    }

    /// Issues a fresh code, replacing any previous one, and mails it.
    /// If the mail fails the stored code stays valid.
    #[tracing::instrument(skip_all, fields(email = %email))]
    pub async fn send_verification_code(&self, email: &str) -> Result<(), AccountError> {
        if blank(email) {
            return Err(AccountError::MissingFields("Email is required for verification"));
        }

        let user = self.user_by_email(email).await?;
        let code = generate_otp();
        let expires_at = Utc::now() + self.code_ttl;

        self.codes
            .store_code(user.id, &user.email, &code, expires_at)
            .await
            .map_err(AccountError::Store)?;

        self.email
            .send_verification_code(&user.email, &code, &ttl_label(self.code_ttl))
            .await
            .map_err(AccountError::Email)?;

        tracing::info!(user_id = user.id, "Verification code issued");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(email = %email))]
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<VerifyOutcome, AccountError> {
        if blank(email) || blank(code) {
            return Err(AccountError::MissingFields("Missing required fields: email and code"));
        }

        let user = self.user_by_email(email).await?;
        if user.verified {
            return Ok(VerifyOutcome::AlreadyVerified);
        }

        self.check_code(user.id, code).await?;

        self.users
            .mark_verified(user.id)
            .await
            .map_err(AccountError::Store)?;
        self.discard_code(user.id).await;

        tracing::info!(user_id = user.id, "Email verified");
        Ok(VerifyOutcome::Verified { user_id: user.id })
    }

    #[tracing::instrument(skip_all, fields(email = %email))]
    pub async fn reset_forgotten_password(
        &self,
        email: &str,
        code: &str,
        password: &Password,
    ) -> Result<(), AccountError> {
        if blank(email) || blank(code) || password.is_blank() {
            return Err(AccountError::MissingFields(
                "Email, OTP, and new password are required",
            ));
        }

        let user = self.user_by_email(email).await?;
        self.check_code(user.id, code).await?;

        let hash = hash_password(password).map_err(AccountError::Internal)?;
        self.users
            .update_password(user.id, &hash)
            .await
            .map_err(AccountError::Store)?;
        self.sessions
            .delete_all_sessions(user.id)
            .await
            .map_err(AccountError::Store)?;
        self.discard_code(user.id).await;

        tracing::info!(user_id = user.id, "Password reset, sessions revoked");
        Ok(())
    }

    /// Replaces the password of an authenticated user, revokes every session
    /// and hands back exactly one new one.
    #[tracing::instrument(skip_all, fields(user_id = user_id))]
    pub async fn change_password(
        &self,
        user_id: i64,
        password: &Password,
    ) -> Result<PasswordChanged, AccountError> {
        if password.is_blank() {
            return Err(AccountError::MissingFields("UserId and new password are required"));
        }

        let hash = hash_password(password).map_err(AccountError::Internal)?;
        self.users
            .update_password(user_id, &hash)
            .await
            .map_err(AccountError::Store)?;
        self.discard_code(user_id).await;
        self.sessions
            .delete_all_sessions(user_id)
            .await
            .map_err(AccountError::Store)?;
        let session_id = self
            .sessions
            .create_session(user_id)
            .await
            .map_err(AccountError::Store)?;

        tracing::info!(user_id, "Password changed, sessions rotated");
        Ok(PasswordChanged {
            session_id,
            user_id,
        })
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<UserProfile, AccountError> {
        self.users
            .find_user_by_id(user_id)
            .await
            .map_err(AccountError::Store)?
            .map(|u| u.profile())
            .ok_or(AccountError::UserNotFound)
    }

    #[tracing::instrument(skip_all, fields(user_id = user_id))]
    pub async fn update_profile(
        &self,
        user_id: i64,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<UserProfile, AccountError> {
        if phone.is_none() && address.is_none() {
            return Err(AccountError::MissingFields(
                "At least one of phone or address must be provided",
            ));
        }

        if let Some(phone) = phone.filter(|p| !p.is_empty()) {
            if !is_valid_phone(phone) {
                return Err(AccountError::InvalidPhone);
            }
        }

        self.users
            .update_contact(user_id, phone, address)
            .await
            .map_err(AccountError::Store)?;

        self.get_profile(user_id).await
    }

    #[tracing::instrument(skip_all, fields(user_id = user_id))]
    pub async fn delete_account(&self, user_id: i64) -> Result<(), AccountError> {
        if !self
            .users
            .delete_user(user_id)
            .await
            .map_err(AccountError::Store)?
        {
            return Err(AccountError::UserNotFound);
        }
        tracing::info!(user_id, "User deleted");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.users.health_check().await
    }
}
