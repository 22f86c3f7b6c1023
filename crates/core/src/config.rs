use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::OutOfWindowPolicy;
use crate::domain::statistics::{
    DataSource, DEFAULT_DAYS_COUNT, DEFAULT_MONTHS_COUNT, MAX_MONTHS_COUNT,
};
use crate::similarity::{DEFAULT_SPLIT_PATTERN, DEFAULT_TOP_THRESHOLD};

const ENV_PREFIX: &str = "DOCKET";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub estimation: EstimationConfig,
    pub statistics: StatisticsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub token_secret: SecretString,
}

#[derive(Clone, Debug)]
pub struct EstimationConfig {
    /// Fraction of ranked documents kept, in `(0, 1]`.
    pub top_threshold: f64,
    pub token_split_pattern: String,
}

#[derive(Clone, Debug)]
pub struct StatisticsConfig {
    pub default_days_count: u32,
    pub default_months_count: u32,
    pub default_data_source: DataSource,
    pub out_of_window: OutOfWindowPolicy,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
    pub token_secret: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://docket.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3000,
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            auth: AuthConfig { token_secret: String::new().into() },
            estimation: EstimationConfig {
                top_threshold: DEFAULT_TOP_THRESHOLD,
                token_split_pattern: DEFAULT_SPLIT_PATTERN.to_string(),
            },
            statistics: StatisticsConfig {
                default_days_count: DEFAULT_DAYS_COUNT,
                default_months_count: DEFAULT_MONTHS_COUNT,
                default_data_source: DataSource::Both,
                out_of_window: OutOfWindowPolicy::Drop,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("docket.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(auth) = patch.auth {
            if let Some(token_secret) = auth.token_secret {
                self.auth.token_secret = token_secret.into();
            }
        }

        if let Some(estimation) = patch.estimation {
            if let Some(top_threshold) = estimation.top_threshold {
                self.estimation.top_threshold = top_threshold;
            }
            if let Some(token_split_pattern) = estimation.token_split_pattern {
                self.estimation.token_split_pattern = token_split_pattern;
            }
        }

        if let Some(statistics) = patch.statistics {
            if let Some(days) = statistics.default_days_count {
                self.statistics.default_days_count = days;
            }
            if let Some(months) = statistics.default_months_count {
                self.statistics.default_months_count = months;
            }
            if let Some(data_source) = statistics.default_data_source {
                self.statistics.default_data_source = data_source;
            }
            if let Some(out_of_window) = statistics.out_of_window {
                self.statistics.out_of_window = out_of_window;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_env("DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SERVER_PORT") {
            self.server.port = parse_env("SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_env("SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_env("SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("AUTH_TOKEN_SECRET") {
            self.auth.token_secret = value.into();
        }

        if let Some(value) = read_env("ESTIMATION_TOP_THRESHOLD") {
            self.estimation.top_threshold = parse_env("ESTIMATION_TOP_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("ESTIMATION_TOKEN_SPLIT_PATTERN") {
            self.estimation.token_split_pattern = value;
        }

        if let Some(value) = read_env("STATISTICS_DEFAULT_DAYS_COUNT") {
            self.statistics.default_days_count =
                parse_env("STATISTICS_DEFAULT_DAYS_COUNT", &value)?;
        }
        if let Some(value) = read_env("STATISTICS_DEFAULT_MONTHS_COUNT") {
            self.statistics.default_months_count =
                parse_env("STATISTICS_DEFAULT_MONTHS_COUNT", &value)?;
        }
        if let Some(value) = read_env("STATISTICS_DEFAULT_DATA_SOURCE") {
            self.statistics.default_data_source = DataSource::from(value);
        }
        if let Some(value) = read_env("STATISTICS_OUT_OF_WINDOW") {
            self.statistics.out_of_window = value.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: env_key("STATISTICS_OUT_OF_WINDOW"),
                    value: value.clone(),
                }
            })?;
        }

        let log_level = read_env("LOGGING_LEVEL").or_else(|| read_env("LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("LOGGING_FORMAT").or_else(|| read_env("LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(token_secret) = overrides.token_secret {
            self.auth.token_secret = token_secret.into();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_auth(&self.auth)?;
        validate_estimation(&self.estimation)?;
        validate_statistics(&self.statistics)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("docket.toml"), PathBuf::from("config/docket.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 || server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.port and server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.port == server.health_check_port {
        return Err(ConfigError::Validation(
            "server.port and server.health_check_port must differ".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_auth(auth: &AuthConfig) -> Result<(), ConfigError> {
    if auth.token_secret.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "auth.token_secret is required. Set it in docket.toml or via {ENV_PREFIX}_AUTH_TOKEN_SECRET"
        )));
    }
    Ok(())
}

fn validate_estimation(estimation: &EstimationConfig) -> Result<(), ConfigError> {
    let threshold = estimation.top_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(ConfigError::Validation(
            "estimation.top_threshold must be in range (0, 1]".to_string(),
        ));
    }

    regex::Regex::new(&estimation.token_split_pattern).map_err(|error| {
        ConfigError::Validation(format!(
            "estimation.token_split_pattern is not a valid regex: {error}"
        ))
    })?;

    Ok(())
}

fn validate_statistics(statistics: &StatisticsConfig) -> Result<(), ConfigError> {
    if statistics.default_days_count == 0 {
        return Err(ConfigError::Validation(
            "statistics.default_days_count must be greater than zero".to_string(),
        ));
    }

    if !(1..=MAX_MONTHS_COUNT).contains(&statistics.default_months_count) {
        return Err(ConfigError::Validation(format!(
            "statistics.default_months_count must be in range 1..={MAX_MONTHS_COUNT}"
        )));
    }

    if !statistics.default_data_source.is_recognized() {
        return Err(ConfigError::Validation(format!(
            "statistics.default_data_source `{}` is not one of e_data|own_data|use_both",
            statistics.default_data_source.as_str()
        )));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}_{suffix}")
}

fn read_env(suffix: &str) -> Option<String> {
    env::var(env_key(suffix)).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(suffix: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: env_key(suffix),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    auth: Option<AuthPatch>,
    estimation: Option<EstimationPatch>,
    statistics: Option<StatisticsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthPatch {
    token_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EstimationPatch {
    top_threshold: Option<f64>,
    token_split_pattern: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatisticsPatch {
    default_days_count: Option<u32>,
    default_months_count: Option<u32>,
    default_data_source: Option<DataSource>,
    out_of_window: Option<OutOfWindowPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::calendar::OutOfWindowPolicy;
    use crate::domain::statistics::DataSource;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn write_config(dir: &TempDir, body: &str) -> Result<std::path::PathBuf, String> {
        let path = dir.path().join("docket.toml");
        fs::write(&path, body).map_err(|err| err.to_string())?;
        Ok(path)
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_DOCKET_SECRET", "from-env-interpolation");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[auth]
token_secret = "${TEST_DOCKET_SECRET}"

[statistics]
default_months_count = 3
default_data_source = "own_data"
out_of_window = "reject"
"#,
            )?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.auth.token_secret.expose_secret() == "from-env-interpolation",
                "token secret should be interpolated from the environment",
            )?;
            ensure(config.statistics.default_months_count == 3, "months count from file")?;
            ensure(
                config.statistics.default_data_source == DataSource::Own,
                "data source from file",
            )?;
            ensure(
                config.statistics.out_of_window == OutOfWindowPolicy::Reject,
                "out-of-window policy from file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_DOCKET_SECRET"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("DOCKET_AUTH_TOKEN_SECRET", "secret");
        env::set_var("DOCKET_LOG_LEVEL", "warn");
        env::set_var("DOCKET_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["DOCKET_AUTH_TOKEN_SECRET", "DOCKET_LOG_LEVEL", "DOCKET_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("DOCKET_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("DOCKET_ESTIMATION_TOP_THRESHOLD", "0.25");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[database]
url = "sqlite://from-file.db"

[auth]
token_secret = "from-file"

[estimation]
top_threshold = 0.5

[logging]
level = "warn"
"#,
            )?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    token_secret: Some("from-override".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.estimation.top_threshold == 0.25,
                "env threshold should win over file and defaults",
            )?;
            ensure(
                config.auth.token_secret.expose_secret() == "from-override",
                "override token secret should win",
            )?;
            Ok(())
        })();

        clear_vars(&["DOCKET_DATABASE_URL", "DOCKET_ESTIMATION_TOP_THRESHOLD"]);
        result
    }

    #[test]
    fn missing_token_secret_fails_fast() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => return Err("expected validation failure but config load succeeded".into()),
            Err(error) => error,
        };
        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("auth.token_secret")
        );
        ensure(has_message, "validation failure should mention auth.token_secret")
    }

    #[test]
    fn invalid_estimation_settings_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let mut config = AppConfig::default();
        config.auth.token_secret = "secret".to_string().into();
        ensure(config.validate().is_ok(), "defaults plus a secret should validate")?;

        config.estimation.top_threshold = 0.0;
        ensure(config.validate().is_err(), "zero threshold should be rejected")?;

        config.estimation.top_threshold = 0.05;
        config.estimation.token_split_pattern = "[unclosed".to_string();
        ensure(config.validate().is_err(), "invalid regex should be rejected")?;

        config.estimation.token_split_pattern = r"\s+".to_string();
        config.statistics.default_months_count = 13;
        ensure(config.validate().is_err(), "months above 12 should be rejected")?;

        config.statistics.default_months_count = 6;
        config.statistics.default_data_source = DataSource::from("everything");
        ensure(config.validate().is_err(), "unknown data source should be rejected")
    }

    #[test]
    fn invalid_env_override_names_the_variable() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("DOCKET_AUTH_TOKEN_SECRET", "secret");
        env::set_var("DOCKET_SERVER_PORT", "not-a-port");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "DOCKET_SERVER_PORT", "error should name DOCKET_SERVER_PORT")
            }
            _ => Err("expected an invalid env override error".to_string()),
        };

        clear_vars(&["DOCKET_AUTH_TOKEN_SECRET", "DOCKET_SERVER_PORT"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("DOCKET_AUTH_TOKEN_SECRET", "super-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("super-secret-value"),
                "debug output should not contain the token secret",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["DOCKET_AUTH_TOKEN_SECRET"]);
        result
    }
}
