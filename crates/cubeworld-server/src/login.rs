//! Pluggable login credentials.

/// Decides whether a username and password may bind a cube.
pub trait LoginPolicy: Send + Sync {
    /// Whether the credentials are accepted.
    fn accept(&self, username: &str, password: &str) -> bool;
}

/// Accepts every user.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl LoginPolicy for AcceptAll {
    fn accept(&self, _username: &str, _password: &str) -> bool {
        true
    }
}
