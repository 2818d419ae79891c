//! Configuration loading and management

use anyhow::{Context, Result, bail};
use feedbrief_domain::usecases::{AggregateConfig, SummaryConfig};
use feedbrief_domain::{Channel, FilterRule};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_keyword_length")]
    pub keyword_length: usize,

    #[serde(default = "default_summary_length")]
    pub summary_length: usize,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    #[serde(default)]
    pub deployment_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub openai_compat: OpenAiCompatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiCompatConfig {
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_proxy_env")]
    pub proxy_env: String,
}

/// One `[[channels]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,

    /// Comma-separated source URLs
    pub url: String,

    #[serde(default)]
    pub filter_apply: Option<String>,

    #[serde(default)]
    pub filter_type: Option<String>,

    #[serde(default)]
    pub filter_rule: Option<String>,

    /// Summarization quota per run
    #[serde(default)]
    pub max_items: usize,

    #[serde(default)]
    pub max_total_items: Option<usize>,
}

// Default value functions
fn default_base_dir() -> PathBuf {
    PathBuf::from("./docs")
}

fn default_language() -> String {
    "en".to_string()
}

fn default_keyword_length() -> usize {
    5
}

fn default_summary_length() -> usize {
    200
}

fn default_max_entries() -> usize {
    1000
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_provider() -> String {
    "openai_compat".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_temperature() -> f64 {
    0.5
}

fn default_timeout() -> u64 {
    60
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_proxy_env() -> String {
    "OPENAI_PROXY".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            language: default_language(),
            keyword_length: default_keyword_length(),
            summary_length: default_summary_length(),
            max_entries: default_max_entries(),
            fetch_timeout_secs: default_fetch_timeout(),
            deployment_url: String::new(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            openai_compat: OpenAiCompatConfig::default(),
        }
    }
}

impl Default for OpenAiCompatConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            proxy_env: default_proxy_env(),
        }
    }
}

impl ChannelConfig {
    /// Source URLs, split on commas, blanks removed
    pub fn sources(&self) -> Vec<String> {
        self.url
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    fn to_channel(&self, default_cap: usize) -> Result<Channel> {
        let name = self.name.trim();
        if name.is_empty() {
            bail!("Channel name must not be empty");
        }

        let sources = self.sources();
        if sources.is_empty() {
            bail!("Channel '{}' has no source URLs", name);
        }

        let filter = FilterRule::from_parts(
            self.filter_apply.as_deref(),
            self.filter_type.as_deref(),
            self.filter_rule.as_deref(),
        )
        .with_context(|| format!("Invalid filter for channel '{}'", name))?;

        Ok(Channel {
            name: name.to_string(),
            sources,
            filter,
            max_new_items_per_run: self.max_items,
            max_total_items: self.max_total_items.unwrap_or(default_cap),
        })
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("FEEDBRIEF")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Convert channel tables into validated domain channels
    pub fn channels(&self) -> Result<Vec<Channel>> {
        let mut seen = HashSet::new();
        let mut channels = Vec::with_capacity(self.channels.len());

        for config in &self.channels {
            let channel = config.to_channel(self.general.max_entries)?;
            if !seen.insert(channel.name.clone()) {
                bail!("Duplicate channel name: {}", channel.name);
            }
            channels.push(channel);
        }

        Ok(channels)
    }

    pub fn aggregate_config(&self) -> AggregateConfig {
        AggregateConfig {
            summary: SummaryConfig {
                language: self.general.language.clone(),
                keyword_count: self.general.keyword_length,
                max_words: self.general.summary_length,
                ..SummaryConfig::default()
            },
        }
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# feedbrief configuration

[general]
# Output directory for <channel>.xml, <channel>.log and index.html
base_dir = "./docs"
language = "en"
keyword_length = 5
summary_length = 200
# Default retention cap per channel
max_entries = 1000
fetch_timeout_secs = 30
# Public base URL used for links in index.html
deployment_url = ""

[llm]
provider = "openai_compat"  # openai_compat, stub, none
model = "deepseek-chat"
temperature = 0.5
timeout_secs = 60

[llm.openai_compat]
api_key_env = "OPENAI_API_KEY"
base_url = "https://api.deepseek.com/v1"
# Env var holding an optional proxy URL
proxy_env = "OPENAI_PROXY"

[[channels]]
name = "rust"
url = "https://blog.rust-lang.org/feed.xml,https://this-week-in-rust.org/rss.xml"
# Summaries requested per run
max_items = 5
max_total_items = 500

[[channels]]
name = "hn-rust"
url = "https://hnrss.org/frontpage"
filter_apply = "title"      # title, article, link
filter_type = "include"     # include, exclude, regex match, regex not match
filter_rule = "rust|cargo"
max_items = 3
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedbrief_domain::{FilterField, FilterMode};
    use tempfile::TempDir;

    fn channel_config(name: &str) -> ChannelConfig {
        ChannelConfig {
            name: name.to_string(),
            url: "https://a.example/rss, ,https://b.example/atom".to_string(),
            filter_apply: None,
            filter_type: None,
            filter_rule: None,
            max_items: 2,
            max_total_items: None,
        }
    }

    #[test]
    fn example_config_parses_and_validates() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();

        let channels = config.channels().unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].sources.len(), 2);
        assert_eq!(channels[0].max_total_items, 500);
        assert_eq!(channels[1].max_total_items, 1000);

        let filter = channels[1].filter.as_ref().unwrap();
        assert_eq!(filter.field(), FilterField::Title);
        assert_eq!(filter.mode(), FilterMode::Include);
    }

    #[test]
    fn sources_are_split_and_trimmed() {
        assert_eq!(
            channel_config("news").sources(),
            vec!["https://a.example/rss", "https://b.example/atom"]
        );
    }

    #[test]
    fn partial_filter_is_rejected() {
        let mut config = AppConfig::default();
        let mut channel = channel_config("news");
        channel.filter_apply = Some("title".to_string());
        config.channels.push(channel);

        let error = config.channels().unwrap_err();
        assert!(format!("{:#}", error).contains("news"));
    }

    #[test]
    fn invalid_regex_is_rejected_at_startup() {
        let mut config = AppConfig::default();
        let mut channel = channel_config("news");
        channel.filter_apply = Some("title".to_string());
        channel.filter_type = Some("regex match".to_string());
        channel.filter_rule = Some("([unclosed".to_string());
        config.channels.push(channel);

        assert!(config.channels().is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut config = AppConfig::default();
        config.channels.push(channel_config("news"));
        config.channels.push(channel_config("news"));

        assert!(config.channels().is_err());
    }

    #[test]
    fn load_reads_file_and_fills_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[general]\nlanguage = \"zh\"\n\n[[channels]]\nname = \"x\"\nurl = \"https://x.example/rss\"\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.general.language, "zh");
        assert_eq!(config.general.summary_length, 200);
        assert_eq!(config.llm.openai_compat.base_url, "https://api.deepseek.com/v1");
        assert_eq!(config.channels.len(), 1);
        assert_eq!(config.aggregate_config().summary.language, "zh");
    }

    #[test]
    fn load_fails_for_missing_explicit_path() {
        let dir = TempDir::new().expect("temp dir");
        assert!(AppConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
