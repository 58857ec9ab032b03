use chrono::{DateTime, Utc};

pub mod authenticator;
pub mod error;
pub mod permissions;
pub mod token;

pub use authenticator::Authenticator;
pub use error::AuthError;
pub use permissions::PermissionAuthorizer;
pub use token::{IssuedToken, TokenCodec, TokenRecord, TokenScope, TokenSecret};

/// Source of "now" for expiry decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
