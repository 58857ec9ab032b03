use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::{rng, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of the plaintext bearer token.
pub const TOKEN_LENGTH: usize = 26;

/// Declared purpose of a token. A token issued for one scope is never
/// accepted for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    Authentication,
    Activation,
}

impl TokenScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Authentication => "authentication",
            TokenScope::Activation => "activation",
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown token scope: {0}")]
pub struct UnknownScope(pub String);

impl FromStr for TokenScope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authentication" => Ok(TokenScope::Authentication),
            "activation" => Ok(TokenScope::Activation),
            other => Err(UnknownScope(other.to_string())),
        }
    }
}

/// Plaintext token handed to the caller exactly once. `Debug` is redacted so
/// it cannot leak through log lines or error chains.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TokenSecret(String);

impl TokenSecret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSecret(**redacted**)")
    }
}

/// What the token store persists. The plaintext is not part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub hash: String,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    pub scope: TokenScope,
}

impl TokenRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }
}

/// Token issued at login: the one-time plaintext plus the stored row.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub plaintext: TokenSecret,
    pub record: TokenRecord,
}

pub struct TokenCodec;

impl TokenCodec {
    /// Random alphanumeric secret of `TOKEN_LENGTH` chars (~154 bits).
    pub fn generate() -> TokenSecret {
        let secret: String = rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        TokenSecret(secret)
    }

    /// SHA-256 hash of the plaintext, hex encoded, as stored server-side.
    pub fn hash(plaintext: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(plaintext.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Checks the presented string has the shape of an issued token.
    pub fn is_well_formed(presented: &str) -> bool {
        presented.len() == TOKEN_LENGTH && presented.bytes().all(|b| b.is_ascii_alphanumeric())
    }

    pub fn issue(user_id: i64, scope: TokenScope, expiry: DateTime<Utc>) -> IssuedToken {
        let plaintext = Self::generate();
        let record = TokenRecord {
            hash: Self::hash(plaintext.expose()),
            user_id,
            expiry,
            scope,
        };
        IssuedToken { plaintext, record }
    }
}
