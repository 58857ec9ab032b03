pub mod auth;
pub mod permissions;
pub mod response;

pub use auth::{require_auth, AuthUser};
pub use permissions::{require_permission, PermissionGate};
pub use response::{ApiResponse, ApiResult, JsonBody, QueryParams, ResourceId};
