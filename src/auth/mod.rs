// Authentication module
// Resolves endpoint credentials and holds the session bearer token

mod credentials;
mod manager;
mod types;

pub use credentials::{basic_auth_header, resolve_endpoint};
pub use manager::CredentialManager;
pub use types::{AuthResult, LoginForm, ResolvedEndpoint, SignupRequest};
