use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub scraping: ScrapingConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapingConfig {
    /// Bounds for the randomized delay before each extraction step.
    pub pacing_min_ms: u64,
    pub pacing_max_ms: u64,

    /// How many times a throttled item is retried before being skipped.
    pub max_item_retries: u32,

    pub request_timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub pretty_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scraping: ScrapingConfig {
                pacing_min_ms: 500,
                pacing_max_ms: 2000,
                max_item_retries: 2,
                request_timeout_seconds: 30,
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            output: OutputConfig { pretty_json: true },
        }
    }
}

pub async fn load_config(
    path: &str,
) -> std::result::Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_pacing_range_ordered() {
        let config = Config::default();
        assert!(config.scraping.pacing_min_ms <= config.scraping.pacing_max_ms);
        assert!(config.scraping.max_item_retries > 0);
    }

    #[test]
    fn parses_yaml_config() {
        let yaml = r#"
scraping:
  pacing_min_ms: 250
  pacing_max_ms: 900
  max_item_retries: 3
  request_timeout_seconds: 15
  user_agent: "test-agent"
logging:
  level: debug
output:
  pretty_json: false
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.scraping.pacing_min_ms, 250);
        assert_eq!(config.scraping.max_item_retries, 3);
        assert_eq!(config.logging.level, "debug");
        assert!(!config.output.pretty_json);
    }
}
