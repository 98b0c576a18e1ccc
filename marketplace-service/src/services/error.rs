use service_core::error::AppError;
use thiserror::Error;

/// Failures of the account core. Client-facing messages live in the
/// `#[error]` strings.
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("{0}")]
    MissingFields(&'static str),

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email is not verified")]
    EmailNotVerified,

    #[error("User does not exist")]
    UserNotFound,

    #[error("No active verification code found. Resend the verification code and try again.")]
    NoActiveCode,

    #[error("Verification code has expired")]
    CodeExpired,

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("Invalid phone format")]
    InvalidPhone,

    #[error("Store error: {0}")]
    Store(#[source] anyhow::Error),

    #[error("Email dispatch failed: {0}")]
    Email(#[source] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::MissingFields(_)
            | AccountError::EmailAlreadyRegistered
            | AccountError::NoActiveCode
            | AccountError::InvalidPhone => AppError::BadRequest(anyhow::anyhow!(err.to_string())),
            AccountError::InvalidCredentials
            | AccountError::EmailNotVerified
            | AccountError::InvalidCode => AppError::AuthError(anyhow::anyhow!(err.to_string())),
            AccountError::UserNotFound => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            AccountError::CodeExpired => AppError::Gone(anyhow::anyhow!(err.to_string())),
            AccountError::Store(e) => AppError::DatabaseError(e),
            AccountError::Email(e) => AppError::EmailError(e.to_string()),
            AccountError::Internal(e) => AppError::InternalError(e),
        }
    }
}

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Listing not found")]
    NotFound,

    #[error("Unauthorized")]
    NotOwner,

    #[error("Invalid price")]
    InvalidPrice,

    #[error("Product name is required")]
    MissingName,

    #[error("Store error: {0}")]
    Store(#[source] anyhow::Error),
}

impl From<ListingError> for AppError {
    fn from(err: ListingError) -> Self {
        match err {
            ListingError::NotFound => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            ListingError::NotOwner => AppError::Unauthorized(anyhow::anyhow!(err.to_string())),
            ListingError::InvalidPrice | ListingError::MissingName => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            ListingError::Store(e) => AppError::DatabaseError(e),
        }
    }
}
