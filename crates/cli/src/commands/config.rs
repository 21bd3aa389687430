use std::env;
use std::fs;
use std::path::Path;

use plumbline_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    render(&config, resolve_config_path(None).as_deref())
}

pub fn render(config: &AppConfig, config_file_path: Option<&Path>) -> String {
    let config_file_doc = load_config_file_doc(config_file_path);
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path)
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "endpoint.url",
        &config.endpoint.url,
        source("endpoint.url", &["PLUMBLINE_ENDPOINT_URL"]),
    ));
    lines.push(render_line(
        "endpoint.timeout_secs",
        &config.endpoint.timeout_secs.to_string(),
        source("endpoint.timeout_secs", &["PLUMBLINE_ENDPOINT_TIMEOUT_SECS"]),
    ));
    let api_key = if config.endpoint.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "endpoint.api_key",
        api_key,
        source("endpoint.api_key", &["PLUMBLINE_ENDPOINT_API_KEY"]),
    ));

    lines.push(render_line(
        "wizard.max_attachments",
        &config.wizard.max_attachments.to_string(),
        source("wizard.max_attachments", &["PLUMBLINE_WIZARD_MAX_ATTACHMENTS"]),
    ));
    lines.push(render_line(
        "wizard.max_attachment_bytes",
        &config.wizard.max_attachment_bytes.to_string(),
        source("wizard.max_attachment_bytes", &["PLUMBLINE_WIZARD_MAX_ATTACHMENT_BYTES"]),
    ));
    lines.push(render_line(
        "wizard.min_description_chars",
        &config.wizard.min_description_chars.to_string(),
        source("wizard.min_description_chars", &["PLUMBLINE_WIZARD_MIN_DESCRIPTION_CHARS"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["PLUMBLINE_LOGGING_LEVEL", "PLUMBLINE_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["PLUMBLINE_LOGGING_FORMAT", "PLUMBLINE_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(Path::display)
                .map(|display| display.to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
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

#[cfg(test)]
mod tests {
    use std::fs;

    use plumbline_core::config::{AppConfig, LoadOptions};
    use tempfile::TempDir;

    use super::render;

    #[test]
    fn file_values_are_attributed_and_api_key_is_redacted() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("plumbline.toml");
        fs::write(
            &path,
            "[endpoint]\nurl = \"https://leads.example.com/api\"\napi_key = \"secret-key-123\"\n",
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            ..LoadOptions::default()
        })
        .expect("config loads");
        let output = render(&config, Some(&path));

        assert!(output.contains("- endpoint.url = https://leads.example.com/api (source: file ("));
        assert!(output.contains("- endpoint.api_key = <redacted>"));
        assert!(!output.contains("secret-key-123"));
        assert!(output.contains("- wizard.max_attachments = 5 (source: default)"));
    }
}
