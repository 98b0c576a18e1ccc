//! Business logic and storage for the marketplace backend.

pub mod account;
mod database;
mod email;
pub mod error;
pub mod listing;
mod memory;
pub mod metrics;
pub mod stores;

pub use account::{AccountService, LoginOutcome, PasswordChanged, VerifyOutcome};
pub use database::Database;
pub use email::{EmailProvider, EmailService, MockEmailService};
pub use error::{AccountError, ListingError};
pub use listing::ListingService;
pub use memory::InMemoryStore;
pub use stores::{CredentialStore, ListingStore, SessionStore, VerificationCodeStore};
