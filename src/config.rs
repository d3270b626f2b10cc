//! Configuration loaded from the environment (and `.env`)

use crate::error::{PinnError, Result};
use crate::llm::{DEFAULT_LLM_URL, DEFAULT_MODEL};
use std::collections::HashMap;
use tracing::warn;

pub const DEFAULT_DB_SERVER: &str = r"localhost\SQLEXPRESS";
pub const DEFAULT_DB_NAME: &str = "master";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    /// ADO.NET-style SQL Server connection string
    Mssql { connection_string: String },
    /// `postgres://` URL
    Postgres { url: String },
}

impl DatabaseConfig {
    /// Pick the backend from a URL or connection string.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            DatabaseConfig::Postgres { url: url.to_string() }
        } else {
            DatabaseConfig::Mssql {
                connection_string: url.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub llm_url: String,
    pub model: String,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let llm_url = get("PINNAI_LLM_URL").unwrap_or(DEFAULT_LLM_URL).to_string();
        if !llm_url.starts_with("http://") && !llm_url.starts_with("https://") {
            return Err(PinnError::Config(format!(
                "PINNAI_LLM_URL must be an http(s) URL, got '{}'",
                llm_url
            )));
        }
        let model = get("PINNAI_MODEL").unwrap_or(DEFAULT_MODEL).to_string();

        let database = if let Some(url) = get("DATABASE_URL") {
            DatabaseConfig::from_url(url)
        } else if let Some(conn) = get("PINNAI_DB_CONNECTION") {
            DatabaseConfig::Mssql {
                connection_string: conn.to_string(),
            }
        } else {
            let user = get("PINNAI_DB_USER");
            if let Some(message) = integrated_security_warning(user) {
                warn!("⚠️  {}", message);
            }
            DatabaseConfig::Mssql {
                connection_string: mssql_connection_string(
                    get("PINNAI_DB_SERVER").unwrap_or(DEFAULT_DB_SERVER),
                    get("PINNAI_DB_NAME").unwrap_or(DEFAULT_DB_NAME),
                    user,
                    get("PINNAI_DB_PASSWORD"),
                ),
            }
        };

        Ok(Self {
            llm_url,
            model,
            database,
        })
    }
}

/// Windows authentication is only available to Windows builds; elsewhere the
/// login goes out without credentials.
fn integrated_security_warning(user: Option<&str>) -> Option<&'static str> {
    if user.is_none() && !cfg!(windows) {
        Some(
            "No PINNAI_DB_USER set: integrated security is not supported on this platform, \
             set PINNAI_DB_USER and PINNAI_DB_PASSWORD for SQL Server login",
        )
    } else {
        None
    }
}

/// Integrated security unless a user is given.
pub fn mssql_connection_string(
    server: &str,
    database: &str,
    user: Option<&str>,
    password: Option<&str>,
) -> String {
    let auth = match user {
        Some(user) => format!("user={};password={}", user, password.unwrap_or("")),
        None => "IntegratedSecurity=true".to_string(),
    };
    format!(
        "server={};database={};{};TrustServerCertificate=true",
        server, database, auth
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config.llm_url, DEFAULT_LLM_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(
            config.database,
            DatabaseConfig::Mssql {
                connection_string: r"server=localhost\SQLEXPRESS;database=master;IntegratedSecurity=true;TrustServerCertificate=true"
                    .to_string()
            }
        );
    }

    #[test]
    fn test_integrated_security_warning() {
        assert_eq!(integrated_security_warning(Some("analyst")), None);
        assert_eq!(integrated_security_warning(None).is_some(), !cfg!(windows));
    }

    #[test]
    fn test_sql_login_from_user_and_password() {
        let config = AppConfig::from_vars(&vars(&[
            ("PINNAI_DB_SERVER", "db.local"),
            ("PINNAI_DB_NAME", "AKENEO"),
            ("PINNAI_DB_USER", "analyst"),
            ("PINNAI_DB_PASSWORD", "pw"),
        ]))
        .unwrap();
        assert_eq!(
            config.database,
            DatabaseConfig::Mssql {
                connection_string: "server=db.local;database=AKENEO;user=analyst;password=pw;TrustServerCertificate=true"
                    .to_string()
            }
        );
    }

    #[test]
    fn test_database_url_selects_postgres() {
        let config = AppConfig::from_vars(&vars(&[
            ("DATABASE_URL", "postgres://u:p@localhost/shop"),
            ("PINNAI_DB_CONNECTION", "server=ignored"),
        ]))
        .unwrap();
        assert_eq!(
            config.database,
            DatabaseConfig::Postgres {
                url: "postgres://u:p@localhost/shop".to_string()
            }
        );
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_vars(&vars(&[("PINNAI_MODEL", "  ")])).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_rejects_non_http_llm_url() {
        let err = AppConfig::from_vars(&vars(&[("PINNAI_LLM_URL", "localhost:11434")])).unwrap_err();
        assert!(matches!(err, PinnError::Config(_)));
    }
}
