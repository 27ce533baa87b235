use std::{env, fmt};

use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use sqlx::{mysql::MySqlConnectOptions, ConnectOptions};

const SETTINGS_FILENAME: &str = "settings";

/// Environment variable → settings key. Empty variables count as unset.
const ENV_OVERRIDES: [(&str, &str); 10] = [
    ("APP_BINDING", "tcp_socket_binding"),
    ("APP_PORT", "tcp_socket_port"),
    ("APP_MOUNT_PATH", "mount_path"),
    ("DB_HOST", "database.host"),
    ("DB_PORT", "database.port"),
    ("DB_NAME", "database.name"),
    ("DB_USER", "database.user"),
    ("DB_PASS", "database.password"),
    ("DATABASE_URL", "database.url"),
    ("DB_BOOTSTRAP", "database.bootstrap_schema"),
];

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid settings: {0}")]
    Config(#[from] ConfigError),
}

/// Process configuration. Built once in `main` and handed to whoever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tcp_socket_binding: String,
    pub tcp_socket_port: u16,
    /// URL prefix the service is mounted under, e.g. `/api`. Empty for root.
    pub mount_path: String,
    pub database: DatabaseSettings,
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    /// Full connection URL; wins over the discrete fields when set.
    pub url: Option<String>,
    /// Create the `tasks` table on first connection if it is missing.
    pub bootstrap_schema: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tcp_socket_binding: "0.0.0.0".to_string(),
            tcp_socket_port: 8000,
            mount_path: String::new(),
            database: DatabaseSettings::default(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            name: "task_manager".to_string(),
            user: "root".to_string(),
            password: String::new(),
            url: None,
            bootstrap_schema: true,
        }
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("bootstrap_schema", &self.bootstrap_schema)
            .finish()
    }
}

impl Settings {
    /// Field defaults, then `settings.json` if present, then the process environment.
    pub fn load() -> Result<Settings, SettingsError> {
        let builder = Config::builder()
            .add_source(File::with_name(SETTINGS_FILENAME).required(false));
        Self::build(builder, |key| env::var(key).ok())
    }

    /// Same layering as [`Settings::load`], with the JSON file content and the
    /// environment supplied by the caller.
    pub fn from_sources(
        file_content: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Settings, SettingsError> {
        let mut builder = Config::builder();
        if let Some(content) = file_content {
            builder = builder.add_source(File::from_str(content, FileFormat::Json));
        }
        Self::build(builder, env)
    }

    fn build(
        mut builder: ConfigBuilder<DefaultState>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Settings, SettingsError> {
        for (variable, key) in ENV_OVERRIDES {
            let value = env(variable).filter(|value| !value.is_empty());
            builder = builder.set_override_option(key, value)?;
        }

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.mount_path = normalize_mount_path(&settings.mount_path);
        Ok(settings)
    }

    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.tcp_socket_binding, self.tcp_socket_port)
    }
}

impl DatabaseSettings {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Connection URL handed to the driver. Falls back to a MySQL URL assembled
    /// from host, port, name, user and password.
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.name);
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        options.to_url_lossy().to_string()
    }
}

/// `""`, `/` → `""`; `api/` → `/api`.
fn normalize_mount_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let settings = Settings::from_sources(None, env_of(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.database.host, "127.0.0.1");
        assert_eq!(settings.database.port, 3306);
        assert_eq!(settings.database.name, "task_manager");
        assert_eq!(settings.database.user, "root");
        assert_eq!(settings.database.password, "");
        assert_eq!(settings.socket_address(), "0.0.0.0:8000");
    }

    #[test]
    fn file_values_fill_in_and_keep_defaults_for_missing_keys() {
        let file = r#"{ "tcp_socket_port": 9090, "database": { "name": "todo" } }"#;
        let settings = Settings::from_sources(Some(file), env_of(&[])).unwrap();
        assert_eq!(settings.tcp_socket_port, 9090);
        assert_eq!(settings.database.name, "todo");
        assert_eq!(settings.database.host, "127.0.0.1");
    }

    #[test]
    fn environment_overrides_file() {
        let file = r#"{ "database": { "host": "db.internal", "port": 3307 } }"#;
        let env = env_of(&[("DB_HOST", "10.0.0.5"), ("DB_PASS", "s3cret"), ("DB_PORT", "")]);
        let settings = Settings::from_sources(Some(file), env).unwrap();
        assert_eq!(settings.database.host, "10.0.0.5");
        assert_eq!(settings.database.port, 3307);
        assert_eq!(settings.database.password, "s3cret");
    }

    #[test]
    fn environment_values_are_converted_to_field_types() {
        let env = env_of(&[("APP_PORT", "9000"), ("DB_BOOTSTRAP", "false")]);
        let settings = Settings::from_sources(None, env).unwrap();
        assert_eq!(settings.tcp_socket_port, 9000);
        assert!(!settings.database.bootstrap_schema);
    }

    #[test]
    fn malformed_port_is_reported() {
        let err = Settings::from_sources(None, env_of(&[("DB_PORT", "33o6")])).unwrap_err();
        assert!(matches!(err, SettingsError::Config(_)));
    }

    #[test]
    fn malformed_file_is_reported() {
        let err = Settings::from_sources(Some("{ nope"), env_of(&[])).unwrap_err();
        assert!(matches!(err, SettingsError::Config(_)));
    }

    #[test]
    fn mount_path_is_normalized() {
        for (raw, expected) in [("", ""), ("/", ""), ("api", "/api"), ("/api/", "/api"), ("/a/b/", "/a/b")] {
            let settings =
                Settings::from_sources(None, env_of(&[("APP_MOUNT_PATH", raw)])).unwrap();
            assert_eq!(settings.mount_path, expected, "raw = {raw:?}");
        }
    }

    #[test]
    fn explicit_url_wins() {
        let env = env_of(&[("DATABASE_URL", "sqlite::memory:"), ("DB_HOST", "ignored")]);
        let settings = Settings::from_sources(None, env).unwrap();
        assert_eq!(settings.database.connection_url(), "sqlite::memory:");
    }

    #[test]
    fn mysql_url_built_from_fields() {
        let url = DatabaseSettings::default().connection_url();
        assert!(url.starts_with("mysql://"), "{url}");
        assert!(url.contains("127.0.0.1"), "{url}");
        assert!(url.contains("task_manager"), "{url}");
    }

    #[test]
    fn debug_output_hides_password() {
        let mut database = DatabaseSettings::default();
        database.password = "hunter2".into();
        assert!(!format!("{database:?}").contains("hunter2"));
    }
}
