//! Settings loading
//!
//! Settings are read once at startup from the process environment, after
//! an optional `.env` file has been merged in. Variables already present
//! in the environment always win over the file (dotenvy never overwrites).
//!
//! Keys are case-sensitive. Required keys have no default:
//! `DATABASE_PASSWORD`, `SECRET_KEY`, `OCI_COMPARTMENT_ID`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;

pub const DATABASE_HOST: &str = "DATABASE_HOST";
pub const DATABASE_PORT: &str = "DATABASE_PORT";
pub const DATABASE_SERVICE: &str = "DATABASE_SERVICE";
pub const DATABASE_USER: &str = "DATABASE_USER";
pub const DATABASE_PASSWORD: &str = "DATABASE_PASSWORD";
pub const SECRET_KEY: &str = "SECRET_KEY";
pub const ALGORITHM: &str = "ALGORITHM";
pub const ACCESS_TOKEN_EXPIRE_MINUTES: &str = "ACCESS_TOKEN_EXPIRE_MINUTES";
pub const OCI_COMPARTMENT_ID: &str = "OCI_COMPARTMENT_ID";
pub const OCI_REGION: &str = "OCI_REGION";
pub const OCI_CONFIG_FILE: &str = "OCI_CONFIG_FILE";
pub const APP_NAME: &str = "APP_NAME";
pub const DEBUG: &str = "DEBUG";
pub const CORS_ORIGINS: &str = "CORS_ORIGINS";

/// Keys that must be set; startup fails without them.
pub const REQUIRED_KEYS: [&str; 3] = [DATABASE_PASSWORD, SECRET_KEY, OCI_COMPARTMENT_ID];

const DEFAULT_DATABASE_HOST: &str = "oracle-db";
const DEFAULT_DATABASE_PORT: u16 = 1521;
const DEFAULT_DATABASE_SERVICE: &str = "FREEPDB1";
const DEFAULT_DATABASE_USER: &str = "therapist_app";
const DEFAULT_ALGORITHM: &str = "HS256";
const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: u32 = 30;
const DEFAULT_OCI_REGION: &str = "us-ashburn-1";
const DEFAULT_OCI_CONFIG_FILE: &str = "/app/.oci/config";
const DEFAULT_APP_NAME: &str = "Therapist Office App";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";

/// Env file read when no explicit path is given
pub const DEFAULT_ENV_FILE: &str = ".env";

/// A string that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret. Keep it out of logs.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

/// Relational database connection target
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    /// Service / catalog name (the database to connect to)
    pub service: String,
    pub user: String,
    pub password: Secret,
}

impl DatabaseSettings {
    /// `user@host:port/service`, safe to log.
    pub fn target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.service)
    }
}

/// Token signing parameters for the auth collaborator
#[derive(Debug, Clone)]
pub struct SecuritySettings {
    pub secret_key: Secret,
    pub algorithm: String,
    pub access_token_expire_minutes: u32,
}

/// Generative AI service identifiers
#[derive(Debug, Clone)]
pub struct OciSettings {
    pub compartment_id: String,
    pub region: String,
    pub config_file: Option<PathBuf>,
}

/// Application-level switches
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub debug: bool,
    pub cors_origins: Vec<String>,
}

/// Validated process configuration. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub security: SecuritySettings,
    pub oci: OciSettings,
    pub app: AppSettings,
}

impl Settings {
    /// Merge an env file into the process environment, then read it.
    ///
    /// With `env_file = None`, `./.env` is used if it exists.
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        load_dotenv(env_file)?;
        Self::from_env()
    }

    /// Read settings from the process environment only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for an absent or blank required key
    /// and [`ConfigError::Invalid`] for a value that does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let src = Source(lookup);

        let database = DatabaseSettings {
            host: src.string_or(DATABASE_HOST, DEFAULT_DATABASE_HOST),
            port: src.parse_or(DATABASE_PORT, DEFAULT_DATABASE_PORT)?,
            service: src.string_or(DATABASE_SERVICE, DEFAULT_DATABASE_SERVICE),
            user: src.string_or(DATABASE_USER, DEFAULT_DATABASE_USER),
            password: Secret::new(src.required(DATABASE_PASSWORD)?),
        };

        let security = SecuritySettings {
            secret_key: Secret::new(src.required(SECRET_KEY)?),
            algorithm: src.string_or(ALGORITHM, DEFAULT_ALGORITHM),
            access_token_expire_minutes: src.parse_or(
                ACCESS_TOKEN_EXPIRE_MINUTES,
                DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
            )?,
        };

        let config_file = match src.get(OCI_CONFIG_FILE) {
            None => Some(PathBuf::from(DEFAULT_OCI_CONFIG_FILE)),
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(PathBuf::from(raw)),
        };
        let oci = OciSettings {
            compartment_id: src.required(OCI_COMPARTMENT_ID)?,
            region: src.string_or(OCI_REGION, DEFAULT_OCI_REGION),
            config_file,
        };

        let app = AppSettings {
            name: src.string_or(APP_NAME, DEFAULT_APP_NAME),
            debug: src.bool_or(DEBUG, false)?,
            cors_origins: split_origins(&src.string_or(CORS_ORIGINS, DEFAULT_CORS_ORIGINS)),
        };

        Ok(Self {
            database,
            security,
            oci,
            app,
        })
    }

    /// Password-free description of the database target
    pub fn database_target(&self) -> String {
        self.database.target()
    }

    /// Lifetime of issued access tokens
    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.security.access_token_expire_minutes) * 60)
    }
}

/// Merge an env file into the process environment.
///
/// Returns the path that was loaded, if any. A missing default `.env` is
/// not an error; a missing or malformed explicit file is.
pub fn load_dotenv(env_file: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    let path = match env_file {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_ENV_FILE);
            if !default.exists() {
                debug!("No {} file found, using environment variables only", DEFAULT_ENV_FILE);
                return Ok(None);
            }
            default
        }
    };

    dotenvy::from_path(&path)?;
    debug!("Loaded env file: {}", path.display());
    Ok(Some(path))
}

/// Split a comma-separated origin list, dropping blank entries.
pub fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "t" | "y" => Some(true),
        "0" | "false" | "no" | "off" | "f" | "n" => Some(false),
        _ => None,
    }
}

/// Typed accessors over a key lookup
struct Source<F>(F);

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        match self.get(key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::missing(key)),
        }
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::invalid(key, raw.as_str(), e.to_string())),
        }
    }

    fn bool_or(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| ConfigError::invalid(key, raw.as_str(), "expected a boolean")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn required_env() -> HashMap<String, String> {
        HashMap::from([
            (DATABASE_PASSWORD.to_string(), "db-pass".to_string()),
            (SECRET_KEY.to_string(), "jwt-secret".to_string()),
            (OCI_COMPARTMENT_ID.to_string(), "ocid1.compartment.oc1..test".to_string()),
        ])
    }

    fn settings_from(env: &HashMap<String, String>) -> Result<Settings, ConfigError> {
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_keys_are_unset() {
        let settings = settings_from(&required_env()).unwrap();

        assert_eq!(settings.database.host, "oracle-db");
        assert_eq!(settings.database.port, 1521);
        assert_eq!(settings.database.service, "FREEPDB1");
        assert_eq!(settings.database.user, "therapist_app");
        assert_eq!(settings.security.algorithm, "HS256");
        assert_eq!(settings.security.access_token_expire_minutes, 30);
        assert_eq!(settings.oci.region, "us-ashburn-1");
        assert_eq!(settings.oci.config_file, Some(PathBuf::from("/app/.oci/config")));
        assert_eq!(settings.app.name, "Therapist Office App");
        assert!(!settings.app.debug);
        assert_eq!(settings.app.cors_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn required_values_are_kept() {
        let settings = settings_from(&required_env()).unwrap();
        assert_eq!(settings.database.password.expose(), "db-pass");
        assert_eq!(settings.security.secret_key.expose(), "jwt-secret");
        assert_eq!(settings.oci.compartment_id, "ocid1.compartment.oc1..test");
    }

    #[test]
    fn each_missing_required_key_is_reported() {
        for key in REQUIRED_KEYS {
            let mut env = required_env();
            env.remove(key);

            let err = settings_from(&env).unwrap_err();
            assert!(
                matches!(err, ConfigError::Missing { key: k } if k == key),
                "expected Missing for {key}, got {err:?}"
            );
        }
    }

    #[test]
    fn blank_required_key_counts_as_missing() {
        let mut env = required_env();
        env.insert(SECRET_KEY.to_string(), "   ".to_string());

        let err = settings_from(&env).unwrap_err();
        assert_eq!(err.key(), Some(SECRET_KEY));
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut env = required_env();
        env.insert(DATABASE_HOST.to_string(), "db.internal".to_string());
        env.insert(DATABASE_PORT.to_string(), "5432".to_string());
        env.insert(DATABASE_SERVICE.to_string(), "therapy".to_string());
        env.insert(DATABASE_USER.to_string(), "svc".to_string());
        env.insert(ALGORITHM.to_string(), "HS512".to_string());
        env.insert(ACCESS_TOKEN_EXPIRE_MINUTES.to_string(), "90".to_string());
        env.insert(OCI_REGION.to_string(), "eu-frankfurt-1".to_string());
        env.insert(OCI_CONFIG_FILE.to_string(), "/etc/oci/config".to_string());
        env.insert(APP_NAME.to_string(), "Clinic".to_string());
        env.insert(DEBUG.to_string(), "true".to_string());

        let settings = settings_from(&env).unwrap();
        assert_eq!(settings.database_target(), "svc@db.internal:5432/therapy");
        assert_eq!(settings.security.algorithm, "HS512");
        assert_eq!(settings.access_token_ttl(), Duration::from_secs(90 * 60));
        assert_eq!(settings.oci.region, "eu-frankfurt-1");
        assert_eq!(settings.oci.config_file, Some(PathBuf::from("/etc/oci/config")));
        assert_eq!(settings.app.name, "Clinic");
        assert!(settings.app.debug);
    }

    #[test]
    fn non_numeric_port_is_invalid() {
        let mut env = required_env();
        env.insert(DATABASE_PORT.to_string(), "oracle".to_string());

        let err = settings_from(&env).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: DATABASE_PORT, .. }));
    }

    #[test]
    fn out_of_range_port_is_invalid() {
        let mut env = required_env();
        env.insert(DATABASE_PORT.to_string(), "70000".to_string());

        let err = settings_from(&env).unwrap_err();
        assert_eq!(err.key(), Some(DATABASE_PORT));
    }

    #[test]
    fn negative_token_ttl_is_invalid() {
        let mut env = required_env();
        env.insert(ACCESS_TOKEN_EXPIRE_MINUTES.to_string(), "-5".to_string());

        let err = settings_from(&env).unwrap_err();
        assert_eq!(err.key(), Some(ACCESS_TOKEN_EXPIRE_MINUTES));
    }

    #[test]
    fn debug_accepts_common_boolean_spellings() {
        for (raw, expected) in [
            ("true", true),
            ("True", true),
            ("1", true),
            ("yes", true),
            ("on", true),
            ("false", false),
            ("0", false),
            ("NO", false),
            ("off", false),
        ] {
            let mut env = required_env();
            env.insert(DEBUG.to_string(), raw.to_string());
            let settings = settings_from(&env).unwrap();
            assert_eq!(settings.app.debug, expected, "DEBUG={raw}");
        }
    }

    #[test]
    fn debug_rejects_garbage() {
        let mut env = required_env();
        env.insert(DEBUG.to_string(), "maybe".to_string());

        let err = settings_from(&env).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: DEBUG, .. }));
    }

    #[test]
    fn blank_oci_config_file_means_none() {
        let mut env = required_env();
        env.insert(OCI_CONFIG_FILE.to_string(), String::new());

        let settings = settings_from(&env).unwrap();
        assert_eq!(settings.oci.config_file, None);
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let mut env = required_env();
        env.insert(
            CORS_ORIGINS.to_string(),
            "http://localhost:3000, https://app.example.com,,".to_string(),
        );

        let settings = settings_from(&env).unwrap();
        assert_eq!(
            settings.app.cors_origins,
            vec!["http://localhost:3000", "https://app.example.com"]
        );
    }

    #[test]
    fn keys_are_case_sensitive() {
        let mut env = required_env();
        env.insert("debug".to_string(), "true".to_string());

        let settings = settings_from(&env).unwrap();
        assert!(!settings.app.debug);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let settings = settings_from(&required_env()).unwrap();
        let rendered = format!("{settings:?}");

        assert!(!rendered.contains("db-pass"));
        assert!(!rendered.contains("jwt-secret"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn explicit_missing_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_dotenv(Some(&dir.path().join("absent.env")));
        assert!(matches!(result, Err(ConfigError::EnvFile { .. })));
    }

    #[test]
    fn load_reads_explicit_env_file() {
        // Unique key names so the process environment of other tests is untouched
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "THERAPIST_CORE_TEST_MARKER=from-file").unwrap();
        drop(file);

        let loaded = load_dotenv(Some(&path)).unwrap();
        assert_eq!(loaded.as_deref(), Some(path.as_path()));
        assert_eq!(
            std::env::var("THERAPIST_CORE_TEST_MARKER").as_deref(),
            Ok("from-file")
        );
    }
}
