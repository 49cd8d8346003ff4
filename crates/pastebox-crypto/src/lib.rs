/// Pastebox Crypto Library
///
/// Password hashing (Argon2id) for paste passwords and user accounts, and
/// HS256-signed identity tokens used to attribute pastes to their owners.
pub mod credentials;
pub mod tokens;

pub use credentials::{CredentialError, CredentialGuard};
pub use tokens::{DEFAULT_TOKEN_TTL_HOURS, IssuedToken, TokenError, TokenService};
