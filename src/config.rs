use crate::error::ConfigError;
use crate::model::EntryKind;
use directories::{BaseDirs, ProjectDirs};
use log::warn;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub web_search: WebSearchConfig,
    #[serde(default)]
    pub url: UrlConfig,
    #[serde(default)]
    pub applications: ApplicationsConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default)]
    pub terminal: Option<String>,
    #[serde(default = "default_opener")]
    pub opener: String,
}

fn default_history_size() -> usize { 50 }
fn default_opener() -> String { "xdg-open".to_string() }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            terminal: None,
            opener: default_opener(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SearchConfig {
    /// Replaces the process PATH when set.
    #[serde(default)]
    pub path: Option<Vec<PathBuf>>,
    #[serde(default)]
    pub application_dirs: Option<Vec<PathBuf>>,
    #[serde(default = "default_file_results")]
    pub file_results: usize,
}

fn default_file_results() -> usize { 20 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            path: None,
            application_dirs: None,
            file_results: default_file_results(),
        }
    }
}

impl SearchConfig {
    pub fn search_path(&self) -> SearchPath {
        match &self.path {
            Some(dirs) => SearchPath::new(dirs.clone()),
            None => SearchPath::from_env(),
        }
    }

    pub fn application_dirs(&self) -> Vec<PathBuf> {
        if let Some(dirs) = &self.application_dirs {
            return dirs.clone();
        }
        let mut dirs = Vec::new();
        if let Some(base_dirs) = BaseDirs::new() {
            dirs.push(base_dirs.data_dir().join("applications"));
        }
        dirs.push(PathBuf::from("/usr/local/share/applications"));
        dirs.push(PathBuf::from("/usr/share/applications"));
        dirs
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct WebSearchConfig {
    /// URL template, `{query}` is replaced by the encoded query.
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_web_icon")]
    pub icon: String,
}

fn default_engine() -> String { "https://duckduckgo.com/?q={query}".to_string() }
fn default_web_icon() -> String { "web-browser".to_string() }

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            icon: default_web_icon(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct UrlConfig {
    #[serde(default = "default_web_icon")]
    pub icon: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self { icon: default_web_icon() }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ApplicationsConfig {
    /// Regexes matched against application names and desktop file ids.
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingConfig {
    #[serde(default = "default_history_tier")]
    pub history: u32,
    #[serde(default = "default_command_tier")]
    pub command: u32,
    #[serde(default = "default_calculation_tier")]
    pub calculation: u32,
    #[serde(default = "default_url_tier")]
    pub url: u32,
    #[serde(default = "default_file_tier")]
    pub file: u32,
    #[serde(default = "default_application_tier")]
    pub application: u32,
    #[serde(default = "default_web_search_tier")]
    pub web_search: u32,
}

fn default_history_tier() -> u32 { 0 }
fn default_command_tier() -> u32 { 1 }
fn default_calculation_tier() -> u32 { 2 }
fn default_url_tier() -> u32 { 2 }
fn default_file_tier() -> u32 { 3 }
fn default_application_tier() -> u32 { 4 }
fn default_web_search_tier() -> u32 { 9 }

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            history: default_history_tier(),
            command: default_command_tier(),
            calculation: default_calculation_tier(),
            url: default_url_tier(),
            file: default_file_tier(),
            application: default_application_tier(),
            web_search: default_web_search_tier(),
        }
    }
}

impl RankingConfig {
    pub fn tier(&self, kind: EntryKind) -> u32 {
        match kind {
            EntryKind::History => self.history,
            EntryKind::CommandLine => self.command,
            EntryKind::Calculation => self.calculation,
            EntryKind::Url => self.url,
            EntryKind::File => self.file,
            EntryKind::Application => self.application,
            EntryKind::WebSearch => self.web_search,
        }
    }

    /// The web search fallback has to sort after everything else.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let others = [
            self.history,
            self.command,
            self.calculation,
            self.url,
            self.file,
            self.application,
        ];
        match others.iter().max() {
            Some(&max) if max >= self.web_search => Err(ConfigError::InvalidRanking(format!(
                "web_search tier {} must be greater than every other tier (max {max})",
                self.web_search
            ))),
            _ => Ok(()),
        }
    }
}

/// Ordered directories searched for executables, fixed for the lifetime of a
/// dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath(Vec<PathBuf>);

impl SearchPath {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self(dirs)
    }

    /// Reads `PATH`; a missing variable yields an empty list.
    pub fn from_env() -> Self {
        match env::var_os("PATH") {
            Some(path) => Self(env::split_paths(&path).filter(|p| !p.as_os_str().is_empty()).collect()),
            None => {
                warn!("PATH is not set, command lookup limited to explicit paths");
                Self::default()
            }
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.0
    }
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "projektor", "projektor")
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = if let Some(dirs) = project_dirs() {
        dirs.config_dir().join("config.toml")
    } else {
        PathBuf::from("config.toml")
    };

    if !config_path.exists() {
        return Ok(Config::default());
    }
    load_config_from(&config_path)
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.ranking.validate()?;
    for pattern in &config.applications.exclude {
        regex::Regex::new(pattern)?;
    }
    Ok(config)
}
