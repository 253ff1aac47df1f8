//! User store interface and the in-memory implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::models::{User, UserRole};
use crate::config::SeedUser;
use crate::error::{Error, Result};

/// Lookup of credential records. Emails are matched case-insensitively.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Add a new record. Fails with `EmailTaken` if the email is in use.
    async fn insert(&self, user: User) -> Result<()>;
}

#[derive(Default)]
struct Users {
    by_id: HashMap<String, User>,
    /// lowercased email -> id
    by_email: HashMap<String, String>,
}

/// User store held in process memory
pub struct InMemoryUserStore {
    users: Arc<RwLock<Users>>,
}

impl InMemoryUserStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(Users::default())),
        }
    }

    /// Build a store from the `[[users]]` config entries
    pub fn from_seed(seed: &[SeedUser]) -> Result<Self> {
        let mut users = Users::default();
        for entry in seed {
            let key = entry.email.to_lowercase();
            if users.by_email.contains_key(&key) {
                return Err(Error::Config(format!(
                    "duplicate seeded user email: {}",
                    entry.email
                )));
            }
            let mut user = User::new(
                entry.name.clone(),
                entry.email.clone(),
                entry.password_hash.clone(),
                entry.role,
            );
            user.phone = entry.phone.clone();
            user.avatar = entry.avatar.clone();
            users.by_email.insert(key, user.id.clone());
            users.by_id.insert(user.id.clone(), user);
        }

        Ok(Self {
            users: Arc::new(RwLock::new(users)),
        })
    }

    /// Get user count
    pub async fn user_count(&self) -> usize {
        self.users.read().await.by_id.len()
    }

    /// Change a user's role, e.g. to revoke admin access
    pub async fn set_role(&self, id: &str, role: UserRole) -> bool {
        match self.users.write().await.by_id.get_mut(id) {
            Some(user) => {
                user.role = role;
                true
            }
            None => false,
        }
    }

    /// Remove a user
    pub async fn remove(&self, id: &str) -> Option<User> {
        let mut users = self.users.write().await;
        let user = users.by_id.remove(id)?;
        users.by_email.remove(&user.email.to_lowercase());
        Some(user)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .by_email
            .get(&email.trim().to_lowercase())
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.by_id.get(id).cloned())
    }

    async fn insert(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        let key = user.email.to_lowercase();
        if users.by_email.contains_key(&key) {
            return Err(Error::EmailTaken);
        }
        users.by_email.insert(key, user.id.clone());
        users.by_id.insert(user.id.clone(), user);
        Ok(())
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryUserStore {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
        }
    }
}
