pub mod json;
pub mod password;
pub mod token;

pub use json::JsonBody;
pub use password::{hash_password, verify_password, Password};
pub use token::{generate_otp, generate_session_token};
