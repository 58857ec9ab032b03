use thiserror::Error;

use crate::database::DatabaseError;

/// Failures while resolving or authorizing the caller. Each credential
/// failure stays distinct so the HTTP layer can report it precisely.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no authentication credential supplied")]
    Unauthenticated,

    #[error("authentication credential is malformed")]
    MalformedCredential,

    #[error("authentication credential not recognised")]
    CredentialNotFound,

    #[error("authentication credential has expired")]
    CredentialExpired,

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
