//! Request middleware shared by the HTTP surface.
pub mod auth;

pub use auth::{
    bearer_token, AuthConfig, AuthError, AuthLayer, AuthService, Authenticator, Claims,
    ClaimsBuilder, IdentityResolver, RolesClaim,
};
