//! Authentication models

use serde::{Deserialize, Serialize};
use std::fmt;

/// User roles for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Shopper account
    User,
    /// Storefront administrator - dashboard access
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// Credential record as kept by the user store.
///
/// `Debug` redacts the password hash so records can be logged safely.
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Login email, unique per store
    pub email: String,
    /// bcrypt hash of the password
    pub password_hash: String,
    /// User's role
    pub role: UserRole,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    /// When the account was created
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// Create a new user
    pub fn new(name: String, email: String, password_hash: String, role: UserRole) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email,
            password_hash,
            role,
            phone: None,
            avatar: None,
            created_at: chrono::Utc::now(),
        }
    }

    /// Check if user is admin
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[redacted]")
            .field("role", &self.role)
            .field("phone", &self.phone)
            .field("avatar", &self.avatar)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Login credentials
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration form
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Login response; the token itself travels in the cookie
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserInfo,
    pub expires_at: i64,
}

/// User information in responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role.to_string(),
            phone: user.phone,
            avatar: user.avatar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_hash() {
        let user = User::new(
            "Ada".to_string(),
            "ada@example.com".to_string(),
            "$2b$12$secrethashvalue".to_string(),
            UserRole::User,
        );
        let out = format!("{:?}", user);
        assert!(out.contains("[redacted]"));
        assert!(!out.contains("secrethashvalue"));
    }

    #[test]
    fn test_role_serde() {
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);
        assert_eq!(serde_json::to_string(&UserRole::User).unwrap(), "\"user\"");
        assert!(serde_json::from_str::<UserRole>("\"viewer\"").is_err());
    }

    #[test]
    fn test_user_info_has_no_hash() {
        let user = User::new(
            "Ada".to_string(),
            "ada@example.com".to_string(),
            "$2b$12$secrethashvalue".to_string(),
            UserRole::Admin,
        );
        let json = serde_json::to_string(&UserInfo::from(user)).unwrap();
        assert!(!json.contains("secrethashvalue"));
        assert!(json.contains("\"role\":\"admin\""));
    }
}
