use serde::Serialize;

/// Permission codes granted to one user, e.g. `books:read`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Permissions(Vec<String>);

impl Permissions {
    pub fn new(codes: Vec<String>) -> Self {
        Self(codes)
    }

    pub fn includes(&self, code: &str) -> bool {
        self.0.iter().any(|c| c == code)
    }
}
