use std::{collections::BTreeMap, num::ParseIntError};

use indexmap::IndexMap;
use log::{debug, warn};
use thiserror::Error;

use crate::{
    api::RawSkill,
    boss_catalog::{BossCatalog, LayoutMismatch},
    schema::{BossInfo, StatInfo, UserSnapshot, Username},
};

/// Rank reported for a boss the player has not been ranked in.
pub const UNRANKED: &str = "-1";

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Skill {skill:?} is missing the required field `{field}`")]
    MissingField { skill: String, field: &'static str },
    #[error("Field `{field}` of skill {skill:?} is not an integer: {value:?}")]
    NotNumeric {
        skill: String,
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("Skill {skill:?} has only one of `next_level_exp` and `exp_to_next_level`")]
    InconsistentNextLevel { skill: String },
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("The feed has {actual} values, but the boss section needs at least {required}")]
    MalformedFeed { required: usize, actual: usize },
    #[error("Value {value:?} for boss {boss:?} is not an integer")]
    Parse {
        boss: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error(transparent)]
    LayoutMismatch(#[from] LayoutMismatch),
}

/// Builds a [`UserSnapshot`] out of keyed skill data and the unkeyed flat feed.
///
/// The boss pairs are read from the last `2 * catalog.len()` values of `feed`,
/// so a feed shorter than [`BossCatalog::required_tail_len`] is rejected.
/// When `strict_layout` is set, a feed whose total length disagrees with the catalog
/// is rejected as well; otherwise the mismatch is only logged.
pub fn extract(
    username: Username,
    skill_data: &IndexMap<String, RawSkill>,
    feed: &[String],
    catalog: &BossCatalog,
    strict_layout: bool,
) -> Result<UserSnapshot, ExtractError> {
    let required = catalog.required_tail_len();
    if feed.len() < required {
        return Err(ExtractError::MalformedFeed {
            required,
            actual: feed.len(),
        });
    }
    if let Err(mismatch) = catalog.check_feed_len(skill_data.len(), feed.len()) {
        if strict_layout {
            return Err(mismatch.into());
        }
        warn!("{mismatch}; boss entries of {username} may be misattributed");
    }

    let skills = skill_data
        .iter()
        .map(|(name, raw)| Ok((name.clone(), to_stat_info(name, raw)?)))
        .collect::<Result<IndexMap<_, _>, ValidationError>>()?;
    let bosses = extract_bosses(&feed[feed.len() - 2 * catalog.len()..], catalog)?;
    debug!(
        "{username}: {} skills, ranked in {} of {} bosses",
        skills.len(),
        bosses.len(),
        catalog.len()
    );

    Ok(UserSnapshot::builder()
        .username(username)
        .skills(skills)
        .bosses(bosses)
        .build())
}

fn extract_bosses(
    boss_data: &[String],
    catalog: &BossCatalog,
) -> Result<BTreeMap<String, BossInfo>, ExtractError> {
    let mut bosses = BTreeMap::new();
    for (&boss, pair) in catalog.names().iter().zip(boss_data.chunks_exact(2)) {
        let (rank, kills) = (&pair[0], &pair[1]);
        if rank == UNRANKED {
            continue;
        }
        let parse = |value: &String| {
            value
                .trim()
                .parse::<i64>()
                .map_err(|source| ExtractError::Parse {
                    boss,
                    value: value.clone(),
                    source,
                })
        };
        let info = BossInfo {
            rank: parse(rank)?,
            kills: parse(kills)?,
        };
        bosses.insert(boss.to_owned(), info);
    }
    Ok(bosses)
}

fn to_stat_info(skill: &str, raw: &RawSkill) -> Result<StatInfo, ValidationError> {
    let parse = |field: &'static str, value: &Option<String>| {
        value
            .as_deref()
            .map(|value| {
                value
                    .trim()
                    .parse::<i64>()
                    .map_err(|source| ValidationError::NotNumeric {
                        skill: skill.to_owned(),
                        field,
                        value: value.to_owned(),
                        source,
                    })
            })
            .transpose()
    };
    let required = |field: &'static str, value: &Option<String>| {
        parse(field, value)?.ok_or_else(|| ValidationError::MissingField {
            skill: skill.to_owned(),
            field,
        })
    };

    let next_level_exp = parse("next_level_exp", &raw.next_level_exp)?;
    let exp_to_next_level = parse("exp_to_next_level", &raw.exp_to_next_level)?;
    if next_level_exp.is_some() != exp_to_next_level.is_some() {
        return Err(ValidationError::InconsistentNextLevel {
            skill: skill.to_owned(),
        });
    }
    Ok(StatInfo {
        rank: required("rank", &raw.rank)?,
        level: required("level", &raw.level)?,
        experience: required("experience", &raw.experience)?,
        next_level_exp,
        exp_to_next_level,
    })
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use itertools::Itertools;
    use maplit::btreemap;

    use super::{extract, ExtractError, ValidationError};
    use crate::{api::RawSkill, boss_catalog::BossCatalog, schema::BossInfo};

    const CATALOG: BossCatalog = BossCatalog::new("test", &["Zulrah", "Vorkath"], 0);

    fn feed(values: &[&str]) -> Vec<String> {
        values.iter().map(|&x| x.to_owned()).collect()
    }

    fn skill(rank: &str, level: &str, experience: &str, next: Option<(&str, &str)>) -> RawSkill {
        RawSkill {
            rank: Some(rank.into()),
            level: Some(level.into()),
            experience: Some(experience.into()),
            next_level_exp: next.map(|x| x.0.into()),
            exp_to_next_level: next.map(|x| x.1.into()),
        }
    }

    fn skills() -> IndexMap<String, RawSkill> {
        IndexMap::from([
            ("attack".to_owned(), skill("1200", "99", "13034431", None)),
            (
                "cooking".to_owned(),
                skill("5000", "50", "110000", Some(("111945", "1945"))),
            ),
        ])
    }

    #[test]
    fn test_unranked_bosses_are_omitted() {
        let snapshot = extract(
            "Zezima".parse().unwrap(),
            &skills(),
            &feed(&["99", "-1", "0", "12", "37"]),
            &CATALOG,
            false,
        )
        .unwrap();
        assert_eq!(
            snapshot.bosses(),
            &btreemap! {"Vorkath".to_owned() => BossInfo { rank: 12, kills: 37 }}
        );
    }

    #[test]
    fn test_only_trailing_values_are_used() {
        let values = feed(&["1", "2", "3", "x", "5", "6", "7", "8"]);
        let snapshot = extract(
            "Zezima".parse().unwrap(),
            &IndexMap::new(),
            &values,
            &CATALOG,
            false,
        )
        .unwrap();
        assert_eq!(
            snapshot.bosses(),
            &btreemap! {
                "Zulrah".to_owned() => BossInfo { rank: 5, kills: 6 },
                "Vorkath".to_owned() => BossInfo { rank: 7, kills: 8 },
            }
        );
    }

    #[test]
    fn test_skills_are_passed_through() {
        let snapshot = extract(
            "Zezima".parse().unwrap(),
            &skills(),
            &feed(&["0", "1", "1", "-1", "-1"]),
            &CATALOG,
            false,
        )
        .unwrap();
        assert_eq!(
            snapshot.skills().keys().collect_vec(),
            ["attack", "cooking"]
        );
        let attack = snapshot.skills()["attack"];
        assert_eq!((attack.rank, attack.level, attack.experience), (1200, 99, 13034431));
        assert_eq!(attack.next_level_exp, None);
        assert_eq!(attack.exp_to_next_level, None);
        let cooking = snapshot.skills()["cooking"];
        assert_eq!(cooking.next_level_exp, Some(111945));
        assert_eq!(cooking.exp_to_next_level, Some(1945));
        assert_eq!(snapshot.bosses().len(), 1);
    }

    #[test]
    fn test_short_feed() {
        let err = extract(
            "Zezima".parse().unwrap(),
            &skills(),
            &feed(&["-1", "0", "12", "37"]),
            &CATALOG,
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::MalformedFeed {
                required: 5,
                actual: 4
            }
        ));
    }

    #[test]
    fn test_unparsable_boss_value() {
        let err = extract(
            "Zezima".parse().unwrap(),
            &skills(),
            &feed(&["0", "3", "many", "-1", "x"]),
            &CATALOG,
            false,
        )
        .unwrap_err();
        match err {
            ExtractError::Parse { boss, value, .. } => {
                assert_eq!(boss, "Zulrah");
                assert_eq!(value, "many");
            }
            e => panic!("Unexpected error: {e:?}"),
        }
    }

    #[test]
    fn test_skill_validation() {
        let extract_with = |raw: RawSkill| {
            extract(
                "Zezima".parse().unwrap(),
                &IndexMap::from([("magic".to_owned(), raw)]),
                &feed(&["0", "-1", "0", "-1", "0"]),
                &CATALOG,
                false,
            )
        };

        let mut missing = skill("1", "99", "200000000", None);
        missing.level = None;
        assert!(matches!(
            extract_with(missing),
            Err(ExtractError::Validation(ValidationError::MissingField {
                field: "level",
                ..
            }))
        ));

        assert!(matches!(
            extract_with(skill("1", "ninety", "200000000", None)),
            Err(ExtractError::Validation(ValidationError::NotNumeric {
                field: "level",
                ..
            }))
        ));

        let mut inconsistent = skill("1", "50", "101333", Some(("111945", "10612")));
        inconsistent.exp_to_next_level = None;
        assert!(matches!(
            extract_with(inconsistent),
            Err(ExtractError::Validation(
                ValidationError::InconsistentNextLevel { .. }
            ))
        ));
    }

    #[test]
    fn test_strict_layout() {
        let catalog = BossCatalog::new("test", &["Zulrah", "Vorkath"], 1);
        // 2 skills * 3 + (1 activity + 2 bosses) * 2 = 12
        let values = feed(&["0"; 13]);
        assert!(extract(
            "Zezima".parse().unwrap(),
            &skills(),
            &values,
            &catalog,
            false
        )
        .is_ok());
        assert!(matches!(
            extract(
                "Zezima".parse().unwrap(),
                &skills(),
                &values,
                &catalog,
                true
            ),
            Err(ExtractError::LayoutMismatch(_))
        ));
        assert!(extract(
            "Zezima".parse().unwrap(),
            &skills(),
            &values[1..],
            &catalog,
            true
        )
        .is_ok());
    }
}
