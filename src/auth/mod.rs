pub mod middleware;
pub mod provider;
pub mod token;

pub use middleware::{AuthenticatedUser, Credential, SESSION_COOKIE};
pub use provider::{IdentityProvider, SignedTokenProvider};
pub use token::{generate_identity_token, verify_identity_token, Profile};
