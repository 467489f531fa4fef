use std::{collections::BTreeMap, str::FromStr};

use getset::{CopyGetters, Getters};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use typed_builder::TypedBuilder;

/// Stats of a single skill, as reported on the hiscores.
///
/// `next_level_exp` and `exp_to_next_level` are either both present or both absent;
/// they are absent only at the maximum level.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct StatInfo {
    pub rank: i64,
    pub level: i64,
    pub experience: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_level_exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_to_next_level: Option<i64>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BossInfo {
    pub rank: i64,
    pub kills: i64,
}

#[derive(Clone, PartialEq, Eq, Debug, TypedBuilder, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct UserSnapshot {
    username: Username,
    skills: IndexMap<String, StatInfo>,
    /// Only the bosses the player is ranked in.
    bosses: BTreeMap<String, BossInfo>,
}

/// The exported unit: every requested user, captured at a single instant.
#[derive(Clone, PartialEq, Debug, TypedBuilder, Getters, CopyGetters, Serialize, Deserialize)]
pub struct CaptureBatch {
    /// Seconds since the Unix epoch.
    #[getset(get_copy = "pub")]
    timestamp: f64,
    #[getset(get = "pub")]
    users: Vec<UserSnapshot>,
}

/// A player name, kept exactly as supplied.
///
/// Only blank and overlong names are rejected here;
/// anything else is left for the hiscores to answer with "not found".
#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    derive_more::Display,
    derive_more::Into,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

pub const MAX_USERNAME_LEN: usize = 12;

#[derive(PartialEq, Eq, Debug, Error)]
pub enum UsernameParseError {
    #[error("Username is blank")]
    Blank,
    #[error("Username is longer than {MAX_USERNAME_LEN} characters: {0:?}")]
    TooLong(String),
}

impl Username {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl FromStr for Username {
    type Err = UsernameParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(UsernameParseError::Blank);
        }
        if trimmed.chars().count() > MAX_USERNAME_LEN {
            return Err(UsernameParseError::TooLong(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }
}
impl TryFrom<String> for Username {
    type Error = UsernameParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The hiscore table a player is looked up in.
#[derive(
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Debug,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    #[strum(to_string = "normal", serialize = "N")]
    #[serde(alias = "N")]
    Normal,
    #[strum(to_string = "ironman", serialize = "IM")]
    #[serde(alias = "IM")]
    Ironman,
    #[strum(to_string = "ultimate_ironman", serialize = "UIM")]
    #[serde(alias = "UIM")]
    UltimateIronman,
    #[strum(to_string = "hardcore_ironman", serialize = "HIM")]
    #[serde(alias = "HIM")]
    HardcoreIronman,
}

impl AccountType {
    pub fn hiscore_table(self) -> &'static str {
        use AccountType::*;
        match self {
            Normal => "hiscore_oldschool",
            Ironman => "hiscore_oldschool_ironman",
            UltimateIronman => "hiscore_oldschool_ultimate",
            HardcoreIronman => "hiscore_oldschool_hardcore_ironman",
        }
    }
}
