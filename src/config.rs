use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::capabilities::LookupEndpoints;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OMDB_BASE_URL: &str = "http://www.omdbapi.com";
pub const DEFAULT_EXCHANGE_RATE_BASE_URL: &str = "https://api.exchangerate-api.com";
pub const DEFAULT_JOKE_BASE_URL: &str = "https://v2.jokeapi.dev";
pub const DEFAULT_SALES_DATA_PATH: &str = "data/sales_data.csv";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";

const CONFIG_DIR_NAME: &str = "simple-chatbot";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub omdb_api_key: Option<String>,
    pub omdb_base_url: String,
    pub exchange_rate_base_url: String,
    pub joke_base_url: String,
    pub sales_data_path: PathBuf,
    pub bind_address: SocketAddr,
    pub http_debug: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    openai_api_key: Option<String>,
    openai_model: Option<String>,
    openai_base_url: Option<String>,
    omdb_api_key: Option<String>,
    omdb_base_url: Option<String>,
    exchange_rate_base_url: Option<String>,
    joke_base_url: Option<String>,
    sales_data_path: Option<PathBuf>,
    bind_address: Option<String>,
    http_debug: Option<bool>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    pub fn load_with_path(explicit_path: Option<&Path>) -> Result<Self> {
        let config_path = match explicit_path {
            Some(path) => {
                if !path.is_file() {
                    bail!("Failed to load config {}: file not found", path.display());
                }
                path.to_path_buf()
            }
            None => discover_config_path()?,
        };
        let file_config = load_file_config(&config_path)?.unwrap_or_default();

        dotenvy::dotenv().ok();

        let file_value = |value: Option<&String>| {
            value.and_then(|value| non_empty(value).map(ToOwned::to_owned))
        };

        let bind_address = env_non_empty("BIND_ADDRESS")
            .or_else(|| file_value(file_config.bind_address.as_ref()))
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let bind_address = parse_bind_address(&bind_address).map_err(|reason| {
            config_error(&config_path, "bind_address", &reason)
        })?;

        let sales_data_path = file_config
            .sales_data_path
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SALES_DATA_PATH));

        Ok(Self {
            openai_api_key: env_non_empty("OPENAI_API_KEY")
                .or_else(|| file_value(file_config.openai_api_key.as_ref())),
            openai_model: env_non_empty("OPENAI_MODEL")
                .or_else(|| file_value(file_config.openai_model.as_ref()))
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: env_non_empty("OPENAI_BASE_URL")
                .or_else(|| file_value(file_config.openai_base_url.as_ref()))
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            omdb_api_key: env_non_empty("OMDB_API_KEY")
                .or_else(|| file_value(file_config.omdb_api_key.as_ref())),
            omdb_base_url: file_value(file_config.omdb_base_url.as_ref())
                .unwrap_or_else(|| DEFAULT_OMDB_BASE_URL.to_string()),
            exchange_rate_base_url: file_value(file_config.exchange_rate_base_url.as_ref())
                .unwrap_or_else(|| DEFAULT_EXCHANGE_RATE_BASE_URL.to_string()),
            joke_base_url: file_value(file_config.joke_base_url.as_ref())
                .unwrap_or_else(|| DEFAULT_JOKE_BASE_URL.to_string()),
            sales_data_path,
            bind_address,
            http_debug: file_config.http_debug.unwrap_or(false),
            config_path,
        })
    }

    pub fn lookup_endpoints(&self) -> LookupEndpoints {
        LookupEndpoints {
            joke_base_url: self.joke_base_url.clone(),
            omdb_base_url: self.omdb_base_url.clone(),
            omdb_api_key: self.omdb_api_key.clone(),
            exchange_rate_base_url: self.exchange_rate_base_url.clone(),
            sales_data_path: self.sales_data_path.clone(),
        }
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir().ok_or_else(|| {
        anyhow!("Failed to resolve config path: HOME directory is unavailable")
    })?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        return Ok(None);
    }

    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text).map(Some).map_err(|err| {
        anyhow!(
            "Failed to load config {}: {err}",
            config_path.display()
        )
    })
}

pub(crate) fn parse_bind_address(value: &str) -> std::result::Result<SocketAddr, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("invalid socket address '{value}', expected HOST:PORT"))
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn config_error(config_path: &Path, key_path: &str, reason: &str) -> anyhow::Error {
    anyhow!(
        "Failed to load config {}: {key_path}: {reason}",
        config_path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::{
        AppConfig, DEFAULT_BIND_ADDRESS, DEFAULT_JOKE_BASE_URL, DEFAULT_OPENAI_BASE_URL,
        DEFAULT_OPENAI_MODEL, DEFAULT_SALES_DATA_PATH,
    };
    use serial_test::serial;
    use std::env;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn reset_vars() {
        unsafe {
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("OPENAI_MODEL");
            env::remove_var("OPENAI_BASE_URL");
            env::remove_var("OMDB_API_KEY");
            env::remove_var("BIND_ADDRESS");
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    fn with_cwd<T>(path: &Path, f: impl FnOnce() -> T) -> T {
        let cwd = env::current_dir().expect("current dir");
        env::set_current_dir(path).expect("set current dir");
        let result = f();
        env::set_current_dir(cwd).expect("restore current dir");
        result
    }

    fn write_config(root: &Path, contents: &str) -> PathBuf {
        let config_dir = root.join("simple-chatbot");
        fs::create_dir_all(&config_dir).expect("create config dir");
        let path = config_dir.join("config.toml");
        fs::write(&path, contents).expect("write config");
        path
    }

    #[test]
    #[serial]
    fn load_uses_defaults_when_unset() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load config"));
        assert_eq!(cfg.openai_api_key, None);
        assert_eq!(cfg.openai_model, DEFAULT_OPENAI_MODEL);
        assert_eq!(cfg.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(cfg.omdb_api_key, None);
        assert_eq!(cfg.joke_base_url, DEFAULT_JOKE_BASE_URL);
        assert_eq!(cfg.sales_data_path, PathBuf::from(DEFAULT_SALES_DATA_PATH));
        assert_eq!(cfg.bind_address.to_string(), DEFAULT_BIND_ADDRESS);
        assert!(!cfg.http_debug);
        assert_eq!(
            cfg.config_path,
            tmp.path().join("simple-chatbot").join("config.toml")
        );
    }

    #[test]
    #[serial]
    fn load_env_overrides_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_config(
            tmp.path(),
            r#"
openai_api_key = "file_key"
openai_model = "file_model"
openai_base_url = "https://example.com"
omdb_api_key = "file_omdb"
bind_address = "0.0.0.0:8080"
"#,
        );

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
            env::set_var("OPENAI_API_KEY", "os_key");
            env::set_var("OPENAI_MODEL", "os_model");
            env::set_var("BIND_ADDRESS", "127.0.0.1:9000");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load config"));
        assert_eq!(cfg.openai_api_key.as_deref(), Some("os_key"));
        assert_eq!(cfg.openai_model, "os_model");
        assert_eq!(cfg.openai_base_url, "https://example.com");
        assert_eq!(cfg.omdb_api_key.as_deref(), Some("file_omdb"));
        assert_eq!(cfg.bind_address.to_string(), "127.0.0.1:9000");
    }

    #[test]
    #[serial]
    fn load_does_not_override_existing_os_env_with_dotenv() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(
            tmp.path().join(".env"),
            "OPENAI_API_KEY=file_key\nOPENAI_MODEL=file_model\n",
        )
        .expect("write env file");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
            env::set_var("OPENAI_API_KEY", "os_key");
            env::set_var("OPENAI_MODEL", "os_model");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load config"));

        assert_eq!(cfg.openai_api_key.as_deref(), Some("os_key"));
        assert_eq!(cfg.openai_model, "os_model");
    }

    #[test]
    #[serial]
    fn load_reads_lookup_settings_from_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_config(
            tmp.path(),
            r#"
omdb_base_url = "http://omdb.test"
exchange_rate_base_url = "http://rates.test"
joke_base_url = "http://jokes.test"
sales_data_path = "/srv/sales.csv"
http_debug = true
"#,
        );

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load config"));
        let endpoints = cfg.lookup_endpoints();
        assert_eq!(endpoints.omdb_base_url, "http://omdb.test");
        assert_eq!(endpoints.exchange_rate_base_url, "http://rates.test");
        assert_eq!(endpoints.joke_base_url, "http://jokes.test");
        assert_eq!(endpoints.sales_data_path, PathBuf::from("/srv/sales.csv"));
        assert!(cfg.http_debug);
    }

    #[test]
    #[serial]
    fn load_with_explicit_path_skips_discovery() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let explicit = tmp.path().join("custom.toml");
        fs::write(&explicit, r#"openai_model = "from_explicit""#).expect("write config");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", "   ");
        }

        let cfg = with_cwd(tmp.path(), || {
            AppConfig::load_with_path(Some(&explicit)).expect("load config")
        });
        assert_eq!(cfg.openai_model, "from_explicit");
        assert_eq!(cfg.config_path, explicit);
    }

    #[test]
    #[serial]
    fn load_with_missing_explicit_path_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();

        let err = AppConfig::load_with_path(Some(&tmp.path().join("nope.toml")))
            .expect_err("load should fail");
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    #[serial]
    fn load_fails_when_xdg_config_home_is_empty() {
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", "   ");
        }

        let err = AppConfig::load().expect_err("load should fail");
        assert!(
            err.to_string()
                .contains("Failed to resolve config path: XDG_CONFIG_HOME is set but empty")
        );
    }

    #[test]
    #[serial]
    fn load_fails_on_unknown_root_key() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_config(tmp.path(), "gemini_api_key = \"nope\"");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let err = with_cwd(tmp.path(), || AppConfig::load().expect_err("load should fail"));
        assert!(err.to_string().contains("Failed to load config"));
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    #[serial]
    fn load_fails_on_invalid_bind_address() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_config(tmp.path(), r#"bind_address = "localhost""#);

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let err = with_cwd(tmp.path(), || AppConfig::load().expect_err("load should fail"));
        assert!(
            err.to_string()
                .contains("bind_address: invalid socket address 'localhost', expected HOST:PORT")
        );
    }
}
