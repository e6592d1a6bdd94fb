use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use crawl_logging::LogDestination;
use log::LevelFilter;
use recipe_core::ParserVersion;
use recipe_engine::{FetchSettings, SchedulerSettings};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILENAME: &str = "crawler.ron";

/// Where log output goes. Mirrors [`LogDestination`] so it can be read from RON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogOutput {
    File,
    #[default]
    Terminal,
    Both,
}

impl From<LogOutput> for LogDestination {
    fn from(output: LogOutput) -> Self {
        match output {
            LogOutput::File => LogDestination::File,
            LogOutput::Terminal => LogDestination::Terminal,
            LogOutput::Both => LogDestination::Both,
        }
    }
}

/// Crawler configuration. Every field may be omitted from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub snapshot_path: PathBuf,
    /// Seconds between periodic snapshot saves; `0` saves only on shutdown.
    pub snapshot_interval_secs: u64,
    pub parser_version: u32,
    pub log_destination: LogOutput,
    pub log_level: String,
    pub log_file: PathBuf,
    pub seed_urls: Vec<String>,
    pub fetch: FetchConfig,
    pub scheduler: SchedulerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("crawler_state.json"),
            snapshot_interval_secs: 300,
            parser_version: 1,
            log_destination: LogOutput::default(),
            log_level: "info".to_string(),
            log_file: PathBuf::from("crawler.log"),
            seed_urls: Vec::new(),
            fetch: FetchConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    /// Returns whether the file was found alongside the config.
    pub fn load(path: &Path) -> Result<(Self, bool)> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok((Self::default(), false));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()))
            }
        };
        let config = Self::parse(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok((config, true))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(self.log_level.trim())
            .with_context(|| format!("unknown log level {:?}", self.log_level))
    }

    pub fn parser_version(&self) -> ParserVersion {
        ParserVersion(self.parser_version)
    }

    pub fn snapshot_interval(&self) -> Option<Duration> {
        (self.snapshot_interval_secs > 0).then(|| Duration::from_secs(self.snapshot_interval_secs))
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        self.fetch.apply(FetchSettings::default())
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        self.scheduler.apply(SchedulerSettings::default())
    }
}

/// Overrides for [`FetchSettings`]; unset fields keep the engine defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub redirect_limit: Option<usize>,
    pub max_bytes: Option<u64>,
    pub allowed_content_types: Option<Vec<String>>,
}

impl FetchConfig {
    fn apply(&self, mut settings: FetchSettings) -> FetchSettings {
        if let Some(user_agent) = &self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(secs) = self.connect_timeout_secs {
            settings.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.request_timeout_secs {
            settings.request_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = self.redirect_limit {
            settings.redirect_limit = limit;
        }
        if let Some(max_bytes) = self.max_bytes {
            settings.max_bytes = max_bytes;
        }
        if let Some(types) = &self.allowed_content_types {
            settings.allowed_content_types = types.clone();
        }
        settings
    }
}

/// Overrides for [`SchedulerSettings`], in seconds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub discovery_interval_secs: Option<u64>,
    pub idle_poll_delay_secs: Option<u64>,
    pub success_delay_min_secs: Option<u64>,
    pub success_delay_max_secs: Option<u64>,
    pub failure_delay_secs: Option<u64>,
}

impl SchedulerConfig {
    fn apply(&self, mut settings: SchedulerSettings) -> SchedulerSettings {
        let overrides = [
            (self.discovery_interval_secs, &mut settings.discovery_interval),
            (self.idle_poll_delay_secs, &mut settings.idle_poll_delay),
            (self.success_delay_min_secs, &mut settings.success_delay_min),
            (self.success_delay_max_secs, &mut settings.success_delay_max),
            (self.failure_delay_secs, &mut settings.failure_delay),
        ];
        for (secs, slot) in overrides {
            if let Some(secs) = secs {
                *slot = Duration::from_secs(secs);
            }
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(AppConfig::parse("()").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_overrides_keep_engine_defaults() {
        let config = AppConfig::parse(
            r#"(
                parser_version: 3,
                log_destination: Both,
                log_level: "debug",
                seed_urls: ["https://www.budgetbytes.com/"],
                fetch: (request_timeout_secs: Some(5)),
                scheduler: (failure_delay_secs: Some(60)),
            )"#,
        )
        .unwrap();

        assert_eq!(config.parser_version(), ParserVersion(3));
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);
        assert_eq!(
            LogDestination::from(config.log_destination),
            LogDestination::Both
        );
        assert_eq!(config.seed_urls, vec!["https://www.budgetbytes.com/"]);

        let fetch = config.fetch_settings();
        assert_eq!(fetch.request_timeout, Duration::from_secs(5));
        assert_eq!(fetch.connect_timeout, FetchSettings::default().connect_timeout);

        let scheduler = config.scheduler_settings();
        assert_eq!(scheduler.failure_delay, Duration::from_secs(60));
        assert_eq!(
            scheduler.discovery_interval,
            SchedulerSettings::default().discovery_interval
        );
    }

    #[test]
    fn zero_snapshot_interval_disables_periodic_saves() {
        let config = AppConfig::parse("(snapshot_interval_secs: 0)").unwrap();
        assert_eq!(config.snapshot_interval(), None);
        assert_eq!(
            AppConfig::default().snapshot_interval(),
            Some(Duration::from_secs(300))
        );
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let config = AppConfig::parse(r#"(log_level: "chatty")"#).unwrap();
        assert!(config.level_filter().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, found) = AppConfig::load(&dir.path().join("absent.ron")).unwrap();
        assert!(!found);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawler.ron");
        fs::write(&path, "(parser_version: \"two\")").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("crawler.ron"));
    }
}
