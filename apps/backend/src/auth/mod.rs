pub mod api_key;
pub mod claims;
pub mod identity;
pub mod optional;
pub mod role_authorizer;
pub mod token_validator;

pub use api_key::{ApiKeyAuthentication, ApiKeyVerifier, ApplicationCaller, StaticApiKeyVerifier};
pub use claims::{AccessTokenClaims, IdentityClaims, RoleSet};
pub use identity::{IdentityError, IdentityProvider, Introspection, KeycloakProvider};
pub use optional::OptionalAuthentication;
pub use role_authorizer::RoleAuthorizer;
pub use token_validator::TokenValidator;
