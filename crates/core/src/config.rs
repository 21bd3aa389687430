use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::attachment::{DEFAULT_MAX_ATTACHMENTS, DEFAULT_MAX_ATTACHMENT_BYTES};
use crate::wizard::validation::DEFAULT_MIN_DESCRIPTION_CHARS;

pub const CONFIG_FILE_NAME: &str = "plumbline.toml";

const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=120;
const ATTACHMENT_CAP_RANGE: std::ops::RangeInclusive<usize> = 1..=20;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub endpoint: EndpointConfig,
    pub wizard: WizardConfig,
    pub logging: LoggingConfig,
}

/// Where finished leads are posted.
#[derive(Clone, Debug)]
pub struct EndpointConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub api_key: Option<SecretString>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WizardConfig {
    pub max_attachments: usize,
    pub max_attachment_bytes: u64,
    pub min_description_chars: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Programmatic values that win over every other layer.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub endpoint_url: Option<String>,
    pub endpoint_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
    pub max_attachments: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("`{path}` is not valid TOML: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` is required but does not exist")]
    MissingFile(PathBuf),
    #[error("config file references `${{{name}}}` but it is not set")]
    UndefinedVariable { name: String },
    #[error("config file has a `${{` placeholder without a closing brace")]
    UnclosedPlaceholder,
    #[error("environment variable `{key}` has an unusable value `{value}`")]
    InvalidEnv { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self { url: "http://127.0.0.1:8787/api/leads".to_string(), timeout_secs: 15, api_key: None }
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            max_attachments: DEFAULT_MAX_ATTACHMENTS,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            min_description_chars: DEFAULT_MIN_DESCRIPTION_CHARS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::default() }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "logging.format `{other}` is not one of compact|pretty|json"
            ))),
        }
    }
}

impl AppConfig {
    /// Layers, lowest first: defaults, config file, `PLUMBLINE_*` env vars,
    /// `options.overrides`. The merged result is validated before returning.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match resolve_config_path(options.config_path.as_deref()) {
            Some(path) => config.merge_file(FileLayer::read(&path)?),
            None if options.require_file => {
                let wanted = options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
                return Err(ConfigError::MissingFile(wanted));
            }
            None => {}
        }

        config.merge_env()?;
        config.merge_overrides(options.overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.endpoint.url.trim();
        check(
            url.starts_with("http://") || url.starts_with("https://"),
            "endpoint.url must start with http:// or https://",
        )?;
        check(
            TIMEOUT_RANGE_SECS.contains(&self.endpoint.timeout_secs),
            "endpoint.timeout_secs must be in range 1..=120",
        )?;
        check(
            ATTACHMENT_CAP_RANGE.contains(&self.wizard.max_attachments),
            "wizard.max_attachments must be in range 1..=20",
        )?;
        check(
            self.wizard.max_attachment_bytes > 0,
            "wizard.max_attachment_bytes must be greater than zero",
        )?;
        check(
            LOG_LEVELS.contains(&self.logging.level.trim().to_ascii_lowercase().as_str()),
            "logging.level must be one of trace|debug|info|warn|error",
        )
    }

    fn merge_file(&mut self, file: FileLayer) {
        let FileLayer { endpoint, wizard, logging } = file;

        set(&mut self.endpoint.url, endpoint.url);
        set(&mut self.endpoint.timeout_secs, endpoint.timeout_secs);
        if let Some(api_key) = endpoint.api_key {
            self.endpoint.api_key = Some(api_key.into());
        }

        set(&mut self.wizard.max_attachments, wizard.max_attachments);
        set(&mut self.wizard.max_attachment_bytes, wizard.max_attachment_bytes);
        set(&mut self.wizard.min_description_chars, wizard.min_description_chars);

        set(&mut self.logging.level, logging.level);
        set(&mut self.logging.format, logging.format);
    }

    fn merge_env(&mut self) -> Result<(), ConfigError> {
        set(&mut self.endpoint.url, env_parse(&["PLUMBLINE_ENDPOINT_URL"])?);
        set(&mut self.endpoint.timeout_secs, env_parse(&["PLUMBLINE_ENDPOINT_TIMEOUT_SECS"])?);
        if let Some(api_key) = env_parse::<String>(&["PLUMBLINE_ENDPOINT_API_KEY"])? {
            self.endpoint.api_key = Some(api_key.into());
        }

        set(&mut self.wizard.max_attachments, env_parse(&["PLUMBLINE_WIZARD_MAX_ATTACHMENTS"])?);
        set(
            &mut self.wizard.max_attachment_bytes,
            env_parse(&["PLUMBLINE_WIZARD_MAX_ATTACHMENT_BYTES"])?,
        );
        set(
            &mut self.wizard.min_description_chars,
            env_parse(&["PLUMBLINE_WIZARD_MIN_DESCRIPTION_CHARS"])?,
        );

        set(
            &mut self.logging.level,
            env_parse(&["PLUMBLINE_LOGGING_LEVEL", "PLUMBLINE_LOG_LEVEL"])?,
        );
        set(
            &mut self.logging.format,
            env_parse(&["PLUMBLINE_LOGGING_FORMAT", "PLUMBLINE_LOG_FORMAT"])?,
        );
        Ok(())
    }

    fn merge_overrides(&mut self, overrides: ConfigOverrides) {
        set(&mut self.endpoint.url, overrides.endpoint_url);
        set(&mut self.endpoint.timeout_secs, overrides.endpoint_timeout_secs);
        set(&mut self.logging.level, overrides.log_level);
        set(&mut self.wizard.max_attachments, overrides.max_attachments);
    }
}

/// Returns the explicit path when it exists, otherwise the first of
/// `plumbline.toml` and `config/plumbline.toml` found in the working directory.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    match explicit_path {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => [PathBuf::from(CONFIG_FILE_NAME), Path::new("config").join(CONFIG_FILE_NAME)]
            .into_iter()
            .find(|candidate| candidate.exists()),
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn check(condition: bool, message: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Validation(message.to_string()))
    }
}

/// First non-blank value among `keys`, parsed. Later keys are aliases.
fn env_parse<T: FromStr>(keys: &[&str]) -> Result<Option<T>, ConfigError> {
    let found = keys.iter().find_map(|key| {
        env::var(key).ok().filter(|value| !value.trim().is_empty()).map(|value| (*key, value))
    });
    let Some((key, raw)) = found else {
        return Ok(None);
    };

    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnv { key: key.to_string(), value: raw.clone() })
}

fn expand_placeholders(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnclosedPlaceholder)?;
        let name = &after[..end];
        let value = env::var(name)
            .map_err(|_| ConfigError::UndefinedVariable { name: name.to_string() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileLayer {
    endpoint: EndpointLayer,
    wizard: WizardLayer,
    logging: LoggingLayer,
}

impl FileLayer {
    fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&expand_placeholders(&raw)?)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EndpointLayer {
    url: Option<String>,
    timeout_secs: Option<u64>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WizardLayer {
    max_attachments: Option<usize>,
    max_attachment_bytes: Option<u64>,
    min_description_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoggingLayer {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{
        expand_placeholders, AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat,
    };

    /// Serializes tests that touch process env, sets `vars` for the duration of
    /// `body` and removes them afterwards.
    fn with_env<T>(
        vars: &[(&str, &str)],
        body: impl FnOnce() -> Result<T, String>,
    ) -> Result<T, String> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        let _guard = LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|e| e.into_inner());

        for (key, value) in vars {
            env::set_var(key, value);
        }
        let result = body();
        for (key, _) in vars {
            env::remove_var(key);
        }
        result
    }

    fn write_config(dir: &TempDir, contents: &str) -> Result<PathBuf, String> {
        let path = dir.path().join("plumbline.toml");
        fs::write(&path, contents).map_err(|err| err.to_string())?;
        Ok(path)
    }

    fn load_from(path: PathBuf) -> Result<AppConfig, ConfigError> {
        AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_load_cleanly() -> Result<(), String> {
        with_env(&[], || {
            let config = AppConfig::load(LoadOptions::default()).map_err(|err| err.to_string())?;

            ensure(config.wizard.max_attachments == 5, "default attachment cap is five")?;
            ensure(config.wizard.min_description_chars == 10, "default description minimum")?;
            ensure(config.endpoint.timeout_secs == 15, "default endpoint timeout")?;
            ensure(config.endpoint.api_key.is_none(), "no api key by default")?;
            ensure(config.logging.format == LogFormat::Compact, "compact logging by default")
        })
    }

    #[test]
    fn file_values_expand_env_placeholders() -> Result<(), String> {
        with_env(&[("TEST_PLUMBLINE_LEAD_KEY", "lead-key-from-env")], || {
            let dir = TempDir::new().map_err(|err| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[endpoint]
url = "https://leads.example.com/api/quote"
api_key = "${TEST_PLUMBLINE_LEAD_KEY}"

[wizard]
max_attachments = 3
"#,
            )?;

            let config = load_from(path).map_err(|err| err.to_string())?;
            let api_key = config.endpoint.api_key.as_ref().map(|key| key.expose_secret());

            ensure(api_key == Some("lead-key-from-env"), "api key from env placeholder")?;
            ensure(config.wizard.max_attachments == 3, "file sets the attachment cap")?;
            ensure(
                config.endpoint.url == "https://leads.example.com/api/quote",
                "file sets the endpoint url",
            )
        })
    }

    #[test]
    fn env_beats_file_and_overrides_beat_env() -> Result<(), String> {
        let vars = [
            ("PLUMBLINE_ENDPOINT_URL", "https://env.example.com/leads"),
            ("PLUMBLINE_LOGGING_LEVEL", "error"),
            ("PLUMBLINE_LOG_FORMAT", "json"),
        ];
        with_env(&vars, || {
            let dir = TempDir::new().map_err(|err| err.to_string())?;
            let path = write_config(
                &dir,
                "[endpoint]\nurl = \"https://file.example.com/leads\"\ntimeout_secs = 30\n\n\
                 [logging]\nlevel = \"warn\"\n",
            )?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| err.to_string())?;

            ensure(config.endpoint.url == "https://env.example.com/leads", "env url wins")?;
            ensure(config.endpoint.timeout_secs == 30, "file timeout beats default")?;
            ensure(config.logging.level == "debug", "override log level wins")?;
            ensure(config.logging.format == LogFormat::Json, "short env alias is honoured")
        })
    }

    #[test]
    fn non_http_endpoint_fails_validation() -> Result<(), String> {
        with_env(&[("PLUMBLINE_ENDPOINT_URL", "ftp://leads.example.com")], || {
            match AppConfig::load(LoadOptions::default()) {
                Err(ConfigError::Validation(message)) => {
                    ensure(message.contains("endpoint.url"), "message names endpoint.url")
                }
                Err(other) => Err(format!("unexpected error: {other}")),
                Ok(_) => Err("ftp endpoint should be rejected".to_string()),
            }
        })
    }

    #[test]
    fn attachment_cap_outside_range_fails_validation() -> Result<(), String> {
        with_env(&[("PLUMBLINE_WIZARD_MAX_ATTACHMENTS", "21")], || {
            let result = AppConfig::load(LoadOptions::default());
            ensure(
                matches!(result, Err(ConfigError::Validation(ref message))
                    if message.contains("wizard.max_attachments")),
                "cap above twenty should be rejected",
            )
        })
    }

    #[test]
    fn unparseable_env_value_names_the_variable() -> Result<(), String> {
        with_env(&[("PLUMBLINE_ENDPOINT_TIMEOUT_SECS", "soon")], || {
            match AppConfig::load(LoadOptions::default()) {
                Err(ConfigError::InvalidEnv { key, value }) => {
                    ensure(key == "PLUMBLINE_ENDPOINT_TIMEOUT_SECS", "error names the variable")?;
                    ensure(value == "soon", "error carries the raw value")
                }
                Err(other) => Err(format!("unexpected error: {other}")),
                Ok(_) => Err("non-numeric timeout should fail".to_string()),
            }
        })
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        with_env(&[], || {
            let dir = TempDir::new().map_err(|err| err.to_string())?;
            let result = AppConfig::load(LoadOptions {
                config_path: Some(dir.path().join("absent.toml")),
                require_file: true,
                ..LoadOptions::default()
            });
            ensure(matches!(result, Err(ConfigError::MissingFile(_))), "missing file is an error")
        })
    }

    #[test]
    fn placeholder_errors_are_reported() -> Result<(), String> {
        with_env(&[], || {
            let unset = expand_placeholders("key = \"${PLUMBLINE_TEST_UNSET_VAR}\"");
            ensure(
                matches!(unset, Err(ConfigError::UndefinedVariable { ref name })
                    if name == "PLUMBLINE_TEST_UNSET_VAR"),
                "unset variable is reported by name",
            )?;
            let unclosed = expand_placeholders("key = \"${OPEN");
            ensure(
                matches!(unclosed, Err(ConfigError::UnclosedPlaceholder)),
                "unclosed placeholder is reported",
            )?;
            ensure(
                expand_placeholders("price = \"$5\"").ok().as_deref() == Some("price = \"$5\""),
                "a bare dollar sign is left alone",
            )
        })
    }

    #[test]
    fn debug_output_redacts_api_key() -> Result<(), String> {
        with_env(&[("PLUMBLINE_ENDPOINT_API_KEY", "very-secret-lead-key")], || {
            let config = AppConfig::load(LoadOptions::default()).map_err(|err| err.to_string())?;
            let rendered = format!("{config:?}");
            ensure(!rendered.contains("very-secret-lead-key"), "api key must not appear in Debug")
        })
    }
}
