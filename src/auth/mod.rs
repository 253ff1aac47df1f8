//! Authentication, sessions and rate limiting

pub mod clock;
pub mod gate;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rate_limit;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use gate::{AccessGate, GatePolicy, RoleRequirement, SessionScope};
pub use jwt::{Claims, IssuedToken, SessionIdentity, SigningKeySource, TokenCodec};
pub use middleware::{candidate_tokens, extract_token, require_admin, require_user};
pub use models::{User, UserRole};
pub use password::{BcryptHasher, CredentialHasher};
pub use rate_limit::{rate_limit_key, AdmitResult, RateLimiter};
pub use store::{InMemoryUserStore, UserStore};
