use crate::collection::CollectionKind;
use clap::Parser;
use reqwest::Url;
use serde::Deserialize;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

pub const USERNAME_VAR: &str = "ss_username";
pub const API_KEY_VAR: &str = "ss_api_key";

/// Walk a SyncSketch account and print what is under test at each level.
#[derive(Parser, Debug, Clone)]
#[command(name = "syncsketch-dump", version)]
pub struct Args {
    /// YAML file holding base_url and the *UnderTest keywords
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Stop once this collection's catalogue has been printed
    #[arg(long, value_name = "KIND")]
    pub stop_after: Option<CollectionKind>,

    /// Fail when a keyword matches nothing instead of leaving the levels below it empty
    #[arg(long)]
    pub strict: bool,

    /// Log requests and selections to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("\nPlease export your Syncsketch {what} as an environment variable called \"{var}\"\n")]
    MissingCredential { var: &'static str, what: &'static str },
    #[error("could not read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration in {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("base_url {0:?} is not a valid URL")]
    InvalidBaseUrl(String),
    #[error("unknown collection kind {0:?}, expected one of projects, reviews, items, comments")]
    UnknownCollection(String),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    #[serde(rename = "ProjectUnderTest")]
    pub project_under_test: String,
    #[serde(rename = "ReviewUnderTest")]
    pub review_under_test: String,
    #[serde(rename = "ItemUnderTest")]
    pub item_under_test: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_pages() -> usize {
    20
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Root every endpoint path is joined onto, always ending in `/api/`.
    /// Must be able to carry relative paths, so `mailto:`-style URLs are refused.
    pub fn api_root(&self) -> Result<Url, ConfigError> {
        let base = self.base_url.trim_end_matches('/');
        Url::parse(&format!("{}/api/", base))
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ConfigError::InvalidBaseUrl(self.base_url.clone()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Keyword used to pick the record under test out of a collection.
    /// Comments are the leaf level and have none.
    pub fn keyword_for(&self, kind: CollectionKind) -> Option<&str> {
        match kind {
            CollectionKind::Projects => Some(&self.project_under_test),
            CollectionKind::Reviews => Some(&self.review_under_test),
            CollectionKind::Items => Some(&self.item_under_test),
            CollectionKind::Comments => None,
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    api_key: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
        }
    }

    /// Username is checked before the key, so only the first missing one is reported.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup(USERNAME_VAR).ok_or(ConfigError::MissingCredential {
            var: USERNAME_VAR,
            what: "username",
        })?;
        let api_key = lookup(API_KEY_VAR).ok_or(ConfigError::MissingCredential {
            var: API_KEY_VAR,
            what: "API key",
        })?;

        Ok(Self::new(username, api_key))
    }

    pub fn authorization(&self) -> String {
        format!("apikey {}:{}", self.username, self.api_key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"<hidden>")
            .finish()
    }
}
