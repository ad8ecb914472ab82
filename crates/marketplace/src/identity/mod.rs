//! Identity store: user accounts, credentials, and bearer tokens.

pub mod credentials;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod tokens;

pub use credentials::{BcryptHasher, PasswordHasher};
pub use domain::{AccountStatus, Credentials, Registration, Role, Session, User, UserId, UserProfile};
pub use repository::UserRepository;
pub use router::identity_router;
pub use service::IdentityService;
pub use tokens::{JwtTokenService, TokenClaims, TokenService};
