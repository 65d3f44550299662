//! Password login and stateless bearer-token authentication.
//!
//! Dual-token system: short-lived access tokens (15 min) authorize requests,
//! long-lived refresh tokens (7 days) mint new pairs. Neither is stored
//! server-side; verification needs only the signing secrets and a clock.

mod errors;
mod extractors;
mod flow;
mod header;
mod state;

pub use errors::{ApiAuthError, AuthErrorKind};
pub use extractors::{BearerAuth, OptionalAuth};
pub use flow::{AuthError, Authenticator, BEARER, TokenPair};
pub use header::get_bearer_token;
pub use state::HasAuthenticator;
