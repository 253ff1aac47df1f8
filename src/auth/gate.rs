//! Access gate: login, registration and token checks.
//!
//! Every credential endpoint is rate limited before the user store or the
//! password hasher is touched. Tokens are checked by signature and expiry only;
//! admin routes additionally re-read the user record so a revoked admin loses
//! access before the token expires.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::auth::jwt::{Claims, IssuedToken, SessionIdentity, TokenCodec};
use crate::auth::models::{RegisterRequest, User, UserRole};
use crate::auth::password::CredentialHasher;
use crate::auth::rate_limit::{rate_limit_key, AdmitResult, RateLimiter};
use crate::auth::store::UserStore;
use crate::config::{Config, RateLimitRule};
use crate::error::{Error, Result};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Which kind of session a login is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionScope {
    User,
    Admin,
}

impl SessionScope {
    /// Rate-limit scope for the login route of this session kind
    pub fn login_route(&self) -> &'static str {
        match self {
            SessionScope::User => "login",
            SessionScope::Admin => "admin-login",
        }
    }
}

/// Role a route demands from the presented token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    Any,
    Admin,
}

impl RoleRequirement {
    pub fn permits(&self, role: UserRole) -> bool {
        match self {
            RoleRequirement::Any => true,
            RoleRequirement::Admin => role == UserRole::Admin,
        }
    }
}

/// Session lifetimes and limits the gate enforces
#[derive(Debug, Clone)]
pub struct GatePolicy {
    pub user_session: Duration,
    pub admin_session: Duration,
    pub login: RateLimitRule,
    pub register: RateLimitRule,
    /// Answer `Forbidden` rather than `InvalidCredentials` when an admin login
    /// has the right password for a non-admin account
    pub reveal_admin_role_mismatch: bool,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for GatePolicy {
    fn from(config: &Config) -> Self {
        Self {
            user_session: config.auth.user_session(),
            admin_session: config.auth.admin_session(),
            login: config.rate_limit.login,
            register: config.rate_limit.register,
            reveal_admin_role_mismatch: config.auth.reveal_admin_role_mismatch,
        }
    }
}

/// Composes hasher, token codec, rate limiter and user store
#[derive(Clone)]
pub struct AccessGate {
    hasher: Arc<dyn CredentialHasher>,
    codec: Arc<TokenCodec>,
    store: Arc<dyn UserStore>,
    limiter: RateLimiter,
    policy: GatePolicy,
    /// Hash of a random password, verified against when the email is unknown
    decoy_hash: Arc<OnceCell<String>>,
}

impl AccessGate {
    pub fn new(
        hasher: Arc<dyn CredentialHasher>,
        codec: Arc<TokenCodec>,
        store: Arc<dyn UserStore>,
        limiter: RateLimiter,
        policy: GatePolicy,
    ) -> Self {
        Self {
            hasher,
            codec,
            store,
            limiter,
            policy,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn session_validity(&self, scope: SessionScope) -> Duration {
        match scope {
            SessionScope::User => self.policy.user_session,
            SessionScope::Admin => self.policy.admin_session,
        }
    }

    /// Count a request against an arbitrary key
    pub fn rate_limit_admit(&self, key: &str, limit: u32, window: Duration) -> AdmitResult {
        self.limiter.admit(key, limit, window)
    }

    fn check_rate(&self, route: &str, client: &str, rule: RateLimitRule) -> Result<AdmitResult> {
        let admit = self
            .limiter
            .admit(&rate_limit_key(route, client), rule.limit, rule.window());
        if !admit.allowed {
            let now = self.limiter.now();
            return Err(Error::RateLimited {
                retry_after_secs: admit.retry_after_secs(now),
                headers: admit.headers(now),
            });
        }
        Ok(admit)
    }

    /// Exchange email and password for a signed session token
    pub async fn login(
        &self,
        scope: SessionScope,
        client: &str,
        email: &str,
        password: &str,
    ) -> Result<IssuedToken> {
        self.check_rate(scope.login_route(), client, self.policy.login)?;

        let user = match self.store.find_by_email(email.trim()).await? {
            Some(user) => user,
            None => {
                self.verify_decoy(password).await?;
                info!(scope = scope.login_route(), client, "Login failed: unknown account");
                return Err(Error::InvalidCredentials);
            }
        };

        if !self.verify_password(password, &user.password_hash).await? {
            info!(scope = scope.login_route(), client, user_id = %user.id, "Login failed: wrong password");
            return Err(Error::InvalidCredentials);
        }

        if scope == SessionScope::Admin && !user.is_admin() {
            warn!(client, user_id = %user.id, "Admin login attempted by non-admin account");
            return Err(if self.policy.reveal_admin_role_mismatch {
                Error::Forbidden
            } else {
                Error::InvalidCredentials
            });
        }

        let issued = self
            .codec
            .issue(&SessionIdentity::from(&user), self.session_validity(scope))?;
        info!(scope = scope.login_route(), user_id = %user.id, role = %user.role, "Login succeeded");
        Ok(issued)
    }

    /// Create a shopper account and sign it in
    pub async fn register(&self, client: &str, request: RegisterRequest) -> Result<IssuedToken> {
        self.check_rate("register", client, self.policy.register)?;

        let name = request.name.trim();
        let email = request.email.trim();
        if name.is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }
        if !is_plausible_email(email) {
            return Err(Error::Validation("email address is not valid".to_string()));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.store.find_by_email(email).await?.is_some() {
            return Err(Error::EmailTaken);
        }

        let hasher = Arc::clone(&self.hasher);
        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::Other(format!("password hashing task failed: {}", e)))??;

        let mut user = User::new(
            name.to_string(),
            email.to_string(),
            password_hash,
            UserRole::User,
        );
        user.phone = request.phone;
        user.avatar = request.avatar;
        self.store.insert(user.clone()).await?;

        info!(user_id = %user.id, "Registered new account");
        self.codec
            .issue(&SessionIdentity::from(&user), self.policy.user_session)
    }

    /// Verify a token and check its embedded role
    pub fn authenticate(&self, token: &str, requirement: RoleRequirement) -> Result<Claims> {
        let claims = self.codec.verify(token).ok_or(Error::TokenInvalid)?;
        if !requirement.permits(claims.role) {
            warn!(user_id = %claims.sub, role = %claims.role, "Token role insufficient for route");
            return Err(Error::Forbidden);
        }
        Ok(claims)
    }

    /// Verify an admin token and confirm the account is still an admin
    pub async fn authenticate_admin(&self, token: &str) -> Result<User> {
        let claims = self.authenticate(token, RoleRequirement::Admin)?;
        let user = self
            .store
            .find_by_id(&claims.sub)
            .await?
            .ok_or(Error::TokenInvalid)?;
        if !user.is_admin() {
            warn!(user_id = %user.id, "Admin token presented by account no longer admin");
            return Err(Error::Forbidden);
        }
        Ok(user)
    }

    /// Spend the same bcrypt work as a real password check
    async fn verify_decoy(&self, password: &str) -> Result<()> {
        let hash = self
            .decoy_hash
            .get_or_try_init(|| async {
                let hasher = Arc::clone(&self.hasher);
                let decoy = uuid::Uuid::new_v4().to_string();
                tokio::task::spawn_blocking(move || hasher.hash(&decoy))
                    .await
                    .map_err(|e| Error::Other(format!("password hashing task failed: {}", e)))?
            })
            .await?;
        self.verify_password(password, hash).await?;
        Ok(())
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| Error::Other(format!("password check task failed: {}", e)))
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_requirement() {
        assert!(RoleRequirement::Any.permits(UserRole::User));
        assert!(RoleRequirement::Any.permits(UserRole::Admin));
        assert!(RoleRequirement::Admin.permits(UserRole::Admin));
        assert!(!RoleRequirement::Admin.permits(UserRole::User));
    }

    #[test]
    fn test_default_policy() {
        let policy = GatePolicy::default();
        assert_eq!(policy.user_session, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(policy.admin_session, Duration::from_secs(24 * 3600));
        assert_eq!(policy.login.limit, 5);
        assert!(!policy.reveal_admin_role_mismatch);
    }

    #[test]
    fn test_email_check() {
        assert!(is_plausible_email("a@b.co"));
        assert!(!is_plausible_email("ab.co"));
        assert!(!is_plausible_email("@b.co"));
        assert!(!is_plausible_email("a b@c.co"));
    }

    #[test]
    fn test_login_routes_are_distinct() {
        assert_ne!(
            SessionScope::User.login_route(),
            SessionScope::Admin.login_route()
        );
    }
}
