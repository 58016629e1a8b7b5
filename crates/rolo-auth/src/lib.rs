//! Authentication for Rolo: signed tokens, password hashing, login
//! throttling, and the session flow that ties them to a credential store.
//!
//! Everything here returns [`rolo_core::Error`] so that callers see one error
//! taxonomy. Token verification alone has its own two-way [`TokenError`].

pub mod admin;
pub mod error;
pub mod password;
pub mod session;
pub mod throttle;
pub mod token;

pub use admin::IdentityAdmin;
pub use error::{ConfigError, TokenError};
pub use password::{Argon2Scheme, PasswordScheme};
pub use session::{Session, SessionFlow};
pub use throttle::{LoginThrottle, ThrottlePolicy};
pub use token::{AccessClaim, TokenConfig, TokenPair, TokenService};
