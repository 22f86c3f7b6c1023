use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use docket_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

/// Renders the effective configuration with the layer each value came from.
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let sources = SourceLookup { doc: config_file_doc.as_ref(), path: config_file_path.as_deref() };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value) in effective_values(&config) {
        lines.push(render_line(key_path, &value, sources.source_of(key_path)));
    }
    lines.join("\n")
}

fn effective_values(config: &AppConfig) -> Vec<(&'static str, String)> {
    vec![
        ("database.url", config.database.url.clone()),
        ("database.max_connections", config.database.max_connections.to_string()),
        ("database.timeout_secs", config.database.timeout_secs.to_string()),
        ("server.bind_address", config.server.bind_address.clone()),
        ("server.port", config.server.port.to_string()),
        ("server.health_check_port", config.server.health_check_port.to_string()),
        ("server.graceful_shutdown_secs", config.server.graceful_shutdown_secs.to_string()),
        ("auth.token_secret", redact_secret(config.auth.token_secret.expose_secret())),
        ("estimation.top_threshold", config.estimation.top_threshold.to_string()),
        ("estimation.token_split_pattern", config.estimation.token_split_pattern.clone()),
        ("statistics.default_days_count", config.statistics.default_days_count.to_string()),
        ("statistics.default_months_count", config.statistics.default_months_count.to_string()),
        (
            "statistics.default_data_source",
            config.statistics.default_data_source.as_str().to_string(),
        ),
        ("statistics.out_of_window", format!("{:?}", config.statistics.out_of_window)),
        ("logging.level", config.logging.level.clone()),
        ("logging.format", format!("{:?}", config.logging.format)),
    ]
}

/// `database.url` -> `DOCKET_DATABASE_URL`.
fn env_key(key_path: &str) -> String {
    format!("DOCKET_{}", key_path.replace('.', "_").to_ascii_uppercase())
}

fn detect_config_path() -> Option<PathBuf> {
    ["docket.toml", "config/docket.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

struct SourceLookup<'a> {
    doc: Option<&'a Value>,
    path: Option<&'a Path>,
}

impl SourceLookup<'_> {
    fn source_of(&self, key_path: &str) -> String {
        let env_key = env_key(key_path);
        if env::var_os(&env_key).is_some() {
            return format!("env ({env_key})");
        }

        if let Some(doc) = self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &str) -> String {
    if secret.trim().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{contains_path, env_key, redact_secret, SourceLookup};

    #[test]
    fn env_keys_follow_section_and_field_names() {
        assert_eq!(env_key("database.url"), "DOCKET_DATABASE_URL");
        assert_eq!(
            env_key("statistics.default_data_source"),
            "DOCKET_STATISTICS_DEFAULT_DATA_SOURCE"
        );
    }

    #[test]
    fn file_values_are_attributed_to_the_file() {
        let doc: toml::Value =
            "[estimation]\ntop_threshold = 0.1\n".parse().expect("valid toml document");
        let lookup = SourceLookup { doc: Some(&doc), path: None };

        assert!(contains_path(&doc, "estimation.top_threshold"));
        assert!(!contains_path(&doc, "estimation.token_split_pattern"));
        assert_eq!(lookup.source_of("estimation.token_split_pattern"), "default");
        assert_eq!(lookup.source_of("estimation.top_threshold"), "file (config file)");
    }

    #[test]
    fn secrets_never_render() {
        assert_eq!(redact_secret("hunter2"), "<redacted>");
        assert_eq!(redact_secret("  "), "<empty>");
    }
}
