use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Movies table (movieId, title, genres, description)
    #[serde(default = "default_movies_path")]
    pub movies_path: String,

    /// Ratings table (userId, movieId, rating)
    #[serde(default = "default_ratings_path")]
    pub ratings_path: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Weight of the collaborative score in the hybrid blend
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Vocabulary cap for the content model
    #[serde(default = "default_max_features")]
    pub max_features: usize,
}

fn default_movies_path() -> String {
    "data/raw/movies.csv".to_string()
}

fn default_ratings_path() -> String {
    "data/raw/ratings.csv".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_alpha() -> f64 {
    crate::services::hybrid::DEFAULT_ALPHA
}

fn default_max_features() -> usize {
    crate::services::tfidf::DEFAULT_MAX_FEATURES
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
