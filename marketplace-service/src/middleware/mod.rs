pub mod metrics;
pub mod session;

pub use metrics::metrics_middleware;
pub use session::{session_validation_middleware, SessionUser, SESSION_HEADER, USER_ID_HEADER};
