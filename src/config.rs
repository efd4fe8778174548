use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://myltt.ly/api";
const DATA_DIR_NAME: &str = "pyltt";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub http_timeout: Duration,
    pub dump_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let api_base_url = env_value("LTT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let data_dir = env_value("LTT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let http_timeout = env_value("LTT_HTTP_TIMEOUT_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        let dump_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            data_dir,
            http_timeout: Duration::from_secs(http_timeout),
            dump_dir,
        }
    }

    #[cfg(test)]
    pub fn for_dir(root: &std::path::Path) -> Self {
        Self {
            api_base_url: "http://127.0.0.1:9".to_string(),
            data_dir: root.join("data"),
            http_timeout: Duration::from_secs(1),
            dump_dir: root.join("dump"),
        }
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join("credentials.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn lock_dir(&self) -> PathBuf {
        self.data_dir.join("locks")
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}
