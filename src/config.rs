use std::{path::PathBuf, time::Duration};

use hiscores_scraping_utils::fs_json_util::{read_toml, read_toml_if_exists};
use log::info;
use serde::Deserialize;
use url::Url;

use crate::{
    batch::{BatchOptions, FailurePolicy},
    boss_catalog::BossCatalog,
    schema::{AccountType, Username},
};

pub const DEFAULT_CONFIG_PATH: &str = "ignore/hiscores-config.toml";

#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub usernames: Vec<Username>,
    pub account_type: AccountType,
    pub output_dir: PathBuf,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub base_url: Option<Url>,
    pub failure_policy: FailurePolicy,
    pub strict_layout: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            usernames: vec![],
            account_type: AccountType::default(),
            output_dir: "hiscores".into(),
            timeout_secs: 30,
            user_agent: concat!("hiscores-scraping/", env!("CARGO_PKG_VERSION")).to_owned(),
            base_url: None,
            failure_policy: FailurePolicy::default(),
            strict_layout: false,
        }
    }
}

impl Config {
    /// Loads the config at `path`, which must exist.
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        info!("Loading config from {path:?}");
        read_toml(path)
    }

    /// Loads [`DEFAULT_CONFIG_PATH`], falling back to the defaults if there is no such file.
    pub fn load_default() -> anyhow::Result<Self> {
        Ok(match read_toml_if_exists(DEFAULT_CONFIG_PATH)? {
            Some(config) => {
                info!("Loaded config from {DEFAULT_CONFIG_PATH:?}");
                config
            }
            None => {
                info!("{DEFAULT_CONFIG_PATH:?} was not found.  Using the default config.");
                Self::default()
            }
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions::builder()
            .account_type(self.account_type)
            .failure_policy(self.failure_policy)
            .strict_layout(self.strict_layout)
            .catalog(BossCatalog::current())
            .build()
    }
}
