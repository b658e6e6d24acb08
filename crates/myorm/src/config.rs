//! Connection configuration for database collaborators.
//!
//! An explicit value handed to whatever constructs the concrete collaborator;
//! the core holds no process-wide configuration singleton.

use std::fmt;

/// Connection parameters for a MySQL-family collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: String::new(),
        }
    }
}

impl DbConfig {
    /// Read configuration from `MYSQL_HOST`, `MYSQL_PORT`, `MYSQL_USER`,
    /// `MYSQL_PASSWORD` and `MYSQL_DATABASE`, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("MYSQL_HOST").unwrap_or(defaults.host),
            port: std::env::var("MYSQL_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            user: std::env::var("MYSQL_USER").unwrap_or(defaults.user),
            password: std::env::var("MYSQL_PASSWORD").unwrap_or(defaults.password),
            database: std::env::var("MYSQL_DATABASE").unwrap_or(defaults.database),
        }
    }

    /// Set the target database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the credentials.
    pub fn with_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3306);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = DbConfig::default().with_credentials("app", "hunter2");
        let text = format!("{config:?}");
        assert!(text.contains("<redacted>"));
        assert!(!text.contains("hunter2"));
    }
}
