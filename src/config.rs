use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL for the primary library backend and response cache.
    /// When unset the library lives in the local file only.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Redis hash holding the library records
    #[serde(default = "default_library_key")]
    pub library_key: String,

    /// JSON file used as the fallback library backend
    #[serde(default = "default_library_file")]
    pub library_file: String,

    /// Game catalog (RAWG) API key
    #[serde(default)]
    pub rawg_api_key: Option<String>,

    /// Game catalog API base URL
    #[serde(default = "default_rawg_api_url")]
    pub rawg_api_url: String,

    /// YouTube Data API key for trailer lookup
    #[serde(default)]
    pub youtube_api_key: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_library_key() -> String {
    "games:hash:v2".to_string()
}

fn default_library_file() -> String {
    ".games.json".to_string()
}

fn default_rawg_api_url() -> String {
    "https://api.rawg.io/api".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_iter(std::env::vars())
    }

    /// Load configuration from an explicit set of key/value pairs
    pub fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
