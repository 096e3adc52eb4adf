use std::collections::HashMap;
use std::{env, fs};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use log::{info, warn, LevelFilter};
use serde::Deserialize;
use crate::errors::ConfigError;
use crate::logging::setup_logger;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Deserialize, Debug)]
pub struct General {
    #[serde(default)]
    pub log_path: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub log_to_stdout: bool,
}

#[derive(Deserialize, Debug)]
pub struct WebServer {
    pub bind_address: String,
    pub bind_port: u16,
}

#[derive(Deserialize, Debug)]
pub struct Weather {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_env_file")]
    pub env_file: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Weather {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            env_file: default_env_file(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Events {
    #[serde(default = "default_store_path")]
    pub store_path: String,
    #[serde(default = "default_list_name")]
    pub list_name: String,
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
}

impl Default for Events {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            list_name: default_list_name(),
            create_if_missing: true,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub general: General,
    pub web_server: WebServer,
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub events: Events,
}

/// Returns the configuration and sets up logging according to it
///
/// The config file is given as `--config=<path>`, `config.toml` is used if omitted.
pub fn config() -> Result<Config, ConfigError> {
    let args: Vec<String> = env::args().collect();
    let config_path = args
        .iter()
        .find_map(|a| a.strip_prefix("--config="))
        .unwrap_or(DEFAULT_CONFIG_PATH);

    let config = load_config(config_path)?;

    let level = LevelFilter::from_str(&config.general.log_level)
        .map_err(|_| ConfigError(format!("invalid log level: {}", config.general.log_level)))?;
    setup_logger(config.general.log_path.as_deref(), level, config.general.log_to_stdout)?;
    info!("configuration loaded from {}", config_path);

    Ok(config)
}

/// Loads the toml configuration file
///
/// # Arguments
///
/// * 'config_path' - path to the config file
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&toml)?;

    Ok(config)
}

/// Looks up the weather provider api key, first in the process environment then in the
/// optional env file. A variable already set in the environment is never overridden by the file.
/// Returns None if it is set in neither.
///
/// # Arguments
///
/// * 'weather' - weather section of the configuration
pub fn api_key(weather: &Weather) -> Option<String> {
    let non_blank = |k: &String| !k.trim().is_empty();

    env::var(&weather.api_key_env)
        .ok()
        .filter(non_blank)
        .or_else(|| {
            let content = fs::read_to_string(&weather.env_file).ok()?;
            parse_env_file(&content).remove(&weather.api_key_env)
        })
        .filter(non_blank)
}

/// Parses `KEY=VALUE` lines, skipping blank lines and `#` comments.
/// Lines that aren't an assignment are logged and skipped.
///
/// # Arguments
///
/// * 'content' - env file content
pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value)) = trimmed.split_once('=') else {
            warn!("skipping invalid env line {}: {}", idx + 1, line);
            continue;
        };
        let mut value = value.trim();
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        values.insert(key.trim().to_string(), value.to_string());
    }

    values
}

fn default_log_level() -> String { "info".to_string() }
fn default_true() -> bool { true }
fn default_base_url() -> String { "http://api.weatherstack.com".to_string() }
fn default_api_key_env() -> String { "WEATHER_API_KEY".to_string() }
fn default_env_file() -> String { ".env".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_store_path() -> String { "json_files/planned_events.json".to_string() }
fn default_list_name() -> String { "planned_events".to_string() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[general]\n\n[web_server]\nbind_address = \"127.0.0.1\"\nbind_port = 8080\n").unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.general.log_level, "info");
        assert!(config.general.log_path.is_none());
        assert_eq!(config.web_server.bind_port, 8080);
        assert_eq!(config.weather.base_url, "http://api.weatherstack.com");
        assert_eq!(config.weather.timeout(), Duration::from_secs(30));
        assert_eq!(config.events.store_path, "json_files/planned_events.json");
        assert_eq!(config.events.list_name, "planned_events");
        assert!(config.events.create_if_missing);
    }

    #[test]
    fn broken_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[web_server]\nbind_port = \"eighty\"\n").unwrap();

        assert!(load_config(&path).is_err());
        assert!(load_config(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn env_file_lines() {
        let values = parse_env_file("# weather\nexport WEATHER_API_KEY=\"abc123\"\n\nOTHER = 'x'\n");
        assert_eq!(values["WEATHER_API_KEY"], "abc123");
        assert_eq!(values["OTHER"], "x");
    }

    #[test]
    fn invalid_env_line_keeps_the_rest() {
        let values = parse_env_file("FIRST=1\nJUST_A_KEY\nWEATHER_API_KEY=abc123\n");
        assert_eq!(values.len(), 2);
        assert_eq!(values["FIRST"], "1");
        assert_eq!(values["WEATHER_API_KEY"], "abc123");
    }

    fn weather_with(key_env: &str, env_file: &std::path::Path) -> Weather {
        Weather {
            api_key_env: key_env.to_string(),
            env_file: env_file.to_string_lossy().to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn api_key_falls_back_to_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        fs::write(&env_file, "broken line\nEVENTPLANNER_TEST_KEY_A=from-file\n").unwrap();

        let weather = weather_with("EVENTPLANNER_TEST_KEY_A", &env_file);
        assert_eq!(api_key(&weather).as_deref(), Some("from-file"));

        let weather = weather_with("EVENTPLANNER_TEST_KEY_UNSET", &dir.path().join("none"));
        assert_eq!(api_key(&weather), None);
    }

    #[test]
    fn process_environment_wins_over_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        fs::write(&env_file, "EVENTPLANNER_TEST_KEY_B=from-file\n").unwrap();
        env::set_var("EVENTPLANNER_TEST_KEY_B", "from-process");

        let weather = weather_with("EVENTPLANNER_TEST_KEY_B", &env_file);
        assert_eq!(api_key(&weather).as_deref(), Some("from-process"));

        env::set_var("EVENTPLANNER_TEST_KEY_B", "  ");
        assert_eq!(api_key(&weather).as_deref(), Some("from-file"));
        env::remove_var("EVENTPLANNER_TEST_KEY_B");
    }
}
