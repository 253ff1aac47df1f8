//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use crate::auth::UserRole;
use crate::config::SeedUser;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Seeded user as shown to operators; never includes the hash
#[derive(Debug, Serialize)]
pub struct UserRow {
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub phone: Option<String>,
}

impl From<&SeedUser> for UserRow {
    fn from(user: &SeedUser) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            phone: user.phone.clone(),
        }
    }
}

/// Print a table of seeded users
pub fn print_user_table(users: &[UserRow]) {
    if users.is_empty() {
        info("No users configured. Add [[users]] entries to storefront-auth.toml");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Email").fg(Color::Cyan),
            Cell::new("Name").fg(Color::Cyan),
            Cell::new("Role").fg(Color::Cyan),
            Cell::new("Phone").fg(Color::Cyan),
        ]);

    for user in users {
        let role_color = match user.role {
            UserRole::Admin => Color::Yellow,
            UserRole::User => Color::Reset,
        };
        table.add_row(vec![
            Cell::new(&user.email),
            Cell::new(&user.name),
            Cell::new(user.role.to_string()).fg(role_color),
            Cell::new(user.phone.as_deref().unwrap_or("-")),
        ]);
    }

    println!("{table}");
}
