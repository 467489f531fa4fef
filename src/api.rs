use std::time::Duration;

use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, info};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{
    experience::next_level_exp,
    schema::{AccountType, Username},
};

pub const DEFAULT_BASE_URL: &str = "https://secure.runescape.com/";

/// Skill rows of the lite hiscore feed, in feed order.
pub const SKILL_NAMES: [&str; 24] = [
    "total",
    "attack",
    "defence",
    "strength",
    "hitpoints",
    "ranged",
    "prayer",
    "magic",
    "cooking",
    "woodcutting",
    "fletching",
    "fishing",
    "firemaking",
    "crafting",
    "smithing",
    "mining",
    "herblore",
    "agility",
    "thieving",
    "slayer",
    "farming",
    "runecrafting",
    "hunter",
    "construction",
];

/// A skill record as handed over by a [`RankingSource`], before any numeric validation.
#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RawSkill {
    pub rank: Option<String>,
    pub level: Option<String>,
    pub experience: Option<String>,
    pub next_level_exp: Option<String>,
    pub exp_to_next_level: Option<String>,
}

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct RawHiscore {
    pub skills: IndexMap<String, RawSkill>,
    /// Every value of the response in order, skills and activities alike.
    pub feed: Vec<String>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Player {0} was not found on the hiscores")]
    PlayerNotFound(Username),
    #[error("The hiscores returned {status} for {username}")]
    Status {
        username: Username,
        status: StatusCode,
    },
    #[error("Request for {username} failed: {source}")]
    Request {
        username: Username,
        #[source]
        source: reqwest::Error,
    },
    #[error("Could not build the hiscores URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("The response has {actual} rows, but {expected} skill rows are needed")]
    Truncated { expected: usize, actual: usize },
}

/// Anything that can look a player up on the hiscores.
#[allow(async_fn_in_trait)]
pub trait RankingSource {
    async fn fetch(
        &self,
        username: &Username,
        account_type: AccountType,
    ) -> Result<RawHiscore, FetchError>;
}

pub struct HiscoresClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HiscoresClient {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: Url::parse(DEFAULT_BASE_URL)?,
        })
    }

    pub fn with_base_url(self, base_url: Url) -> Self {
        Self { base_url, ..self }
    }

    pub fn lite_url(
        &self,
        username: &Username,
        account_type: AccountType,
    ) -> Result<Url, url::ParseError> {
        let mut url = self
            .base_url
            .join(&format!("m={}/index_lite.ws", account_type.hiscore_table()))?;
        url.query_pairs_mut().append_pair("player", username.as_str());
        Ok(url)
    }
}

impl RankingSource for HiscoresClient {
    async fn fetch(
        &self,
        username: &Username,
        account_type: AccountType,
    ) -> Result<RawHiscore, FetchError> {
        let url = self.lite_url(username, account_type)?;
        info!("Fetching {username} ({account_type})");
        let request_error = |source| FetchError::Request {
            username: username.clone(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(request_error)?;
        match response.status() {
            StatusCode::NOT_FOUND => return Err(FetchError::PlayerNotFound(username.clone())),
            status if !status.is_success() => {
                return Err(FetchError::Status {
                    username: username.clone(),
                    status,
                })
            }
            _ => {}
        }
        let text = response.text().await.map_err(request_error)?;
        let hiscore = parse_lite(&text)?;
        debug!("Received {} values for {username}", hiscore.feed.len());
        Ok(hiscore)
    }
}

/// Parses the body of `index_lite.ws`.
///
/// Each line is `rank,level,experience` for a skill or `rank,score` for an activity.
/// Unranked rows report `-1`; unranked skills are given an experience of `0`.
pub fn parse_lite(text: &str) -> Result<RawHiscore, FetchError> {
    let text = text.trim();
    let rows = text.lines().map(str::trim).collect_vec();
    if rows.len() < SKILL_NAMES.len() {
        return Err(FetchError::Truncated {
            expected: SKILL_NAMES.len(),
            actual: rows.len(),
        });
    }
    let skills = SKILL_NAMES
        .iter()
        .zip(&rows)
        .map(|(&name, row)| (name.to_owned(), parse_skill_row(name, row)))
        .collect();
    let feed = rows
        .iter()
        .flat_map(|row| row.split(','))
        .map(|value| value.trim().to_owned())
        .collect();
    Ok(RawHiscore { skills, feed })
}

fn parse_skill_row(name: &str, row: &str) -> RawSkill {
    let mut values = row.split(',').map(|x| x.trim().to_owned());
    let rank = values.next();
    let level = values.next();
    let mut experience = values.next();
    if rank.as_deref() == Some("-1") && experience.as_deref() == Some("-1") {
        experience = Some("0".to_owned());
    }

    let next_level = (name != "total")
        .then(|| {
            let level = level.as_deref()?.parse().ok()?;
            let experience: i64 = experience.as_deref()?.parse().ok()?;
            let next = next_level_exp(level)?;
            Some((next, next - experience))
        })
        .flatten();

    RawSkill {
        rank,
        level,
        experience,
        next_level_exp: next_level.map(|x| x.0.to_string()),
        exp_to_next_level: next_level.map(|x| x.1.to_string()),
    }
}
