use std::{
    io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, TimeZone};
use hiscores_scraping_utils::fs_json_util::{create_json_pretty, read_json};
use log::{info, warn};

use crate::schema::CaptureBatch;

pub const FILE_NAME_FORMAT: &str = "%Y-%m-%d-%H-%M";

/// `<base_dir>/YYYY-MM-DD-HH-MM.json`, named after the capture instant.
///
/// A nonzero `attempt` appends `-<attempt>` to the file stem,
/// for runs captured within the same minute.
pub fn output_path<Tz: TimeZone>(
    base_dir: &Path,
    captured_at: &DateTime<Tz>,
    attempt: usize,
) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let stem = captured_at.format(FILE_NAME_FORMAT);
    match attempt {
        0 => base_dir.join(format!("{stem}.json")),
        n => base_dir.join(format!("{stem}-{n}.json")),
    }
}

/// Writes `batch` as indented JSON to a new file under `base_dir`, returning its path.
///
/// Existing files are never overwritten;
/// an earlier run from the same minute keeps its file and this one gets a suffixed name.
pub fn save_batch<Tz: TimeZone>(
    base_dir: &Path,
    batch: &CaptureBatch,
    captured_at: &DateTime<Tz>,
) -> anyhow::Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    fs_err::create_dir_all(base_dir)?;
    let mut attempt = 0;
    let path = loop {
        let path = output_path(base_dir, captured_at, attempt);
        match create_json_pretty(&path, batch) {
            Ok(()) => break path,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!("{path:?} already exists.  Trying another name.");
                attempt += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("While saving {path:?}")),
        }
    };
    set_permissions(&path)?;
    info!("Saved {} users to {path:?}.", batch.users().len());
    Ok(path)
}

pub fn load_batch(path: impl AsRef<Path>) -> anyhow::Result<CaptureBatch> {
    read_json(path.as_ref())
}

#[cfg(unix)]
fn set_permissions(path: &Path) -> anyhow::Result<()> {
    use std::{fs::Permissions, os::unix::fs::PermissionsExt};
    fs_err::set_permissions(path, Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{FixedOffset, TimeZone};
    use indexmap::IndexMap;
    use maplit::btreemap;

    use super::{load_batch, output_path, save_batch};
    use crate::schema::{BossInfo, CaptureBatch, StatInfo, UserSnapshot};

    fn sample_batch() -> CaptureBatch {
        let skills = IndexMap::from([
            (
                "attack".to_owned(),
                StatInfo {
                    rank: 1200,
                    level: 99,
                    experience: 13_034_431,
                    next_level_exp: None,
                    exp_to_next_level: None,
                },
            ),
            (
                "cooking".to_owned(),
                StatInfo {
                    rank: -1,
                    level: 1,
                    experience: 0,
                    next_level_exp: Some(83),
                    exp_to_next_level: Some(83),
                },
            ),
        ]);
        let users = vec![
            UserSnapshot::builder()
                .username("Zezima".parse().unwrap())
                .skills(skills.clone())
                .bosses(btreemap! {"Vorkath".to_owned() => BossInfo { rank: 12, kills: 37 }})
                .build(),
            UserSnapshot::builder()
                .username("Lynx Titan".parse().unwrap())
                .skills(skills)
                .bosses(BTreeMap::new())
                .build(),
        ];
        CaptureBatch::builder()
            .timestamp(1_700_000_000.25)
            .users(users)
            .build()
    }

    #[test]
    fn test_output_path() {
        let jst = FixedOffset::east_opt(9 * 60 * 60).unwrap();
        let captured_at = jst.with_ymd_and_hms(2024, 3, 7, 8, 5, 59).unwrap();
        assert_eq!(
            output_path("data".as_ref(), &captured_at, 0),
            std::path::Path::new("data/2024-03-07-08-05.json")
        );
        assert_eq!(
            output_path("data".as_ref(), &captured_at, 2),
            std::path::Path::new("data/2024-03-07-08-05-2.json")
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let base_dir = dir.path().join("hiscores");
        let captured_at = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 12, 31, 23, 59, 0)
            .unwrap();
        let batch = sample_batch();

        let path = save_batch(&base_dir, &batch, &captured_at).unwrap();
        assert_eq!(path, base_dir.join("2024-12-31-23-59.json"));
        assert_eq!(load_batch(&path).unwrap(), batch);

        let json: serde_json::Value =
            serde_json::from_str(&fs_err::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000.25);
        assert_eq!(json["users"][0]["username"], "Zezima");
        assert_eq!(json["users"][0]["bosses"]["Vorkath"]["kills"], 37);
        assert!(json["users"][0]["skills"]["attack"]
            .get("next_level_exp")
            .is_none());
        assert_eq!(json["users"][1]["bosses"], serde_json::json!({}));
    }

    #[test]
    fn test_same_minute_keeps_earlier_file() {
        let dir = tempfile::tempdir().unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let first_at = utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap();
        let second_at = utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 59).unwrap();
        let first = CaptureBatch::builder().timestamp(1.0).users(vec![]).build();
        let second = CaptureBatch::builder().timestamp(2.0).users(vec![]).build();

        let first_path = save_batch(dir.path(), &first, &first_at).unwrap();
        let second_path = save_batch(dir.path(), &second, &second_at).unwrap();
        let third_path = save_batch(dir.path(), &second, &second_at).unwrap();

        assert_eq!(first_path, dir.path().join("2024-01-01-00-00.json"));
        assert_eq!(second_path, dir.path().join("2024-01-01-00-00-1.json"));
        assert_eq!(third_path, dir.path().join("2024-01-01-00-00-2.json"));
        assert_eq!(load_batch(&first_path).unwrap(), first);
        assert_eq!(load_batch(&second_path).unwrap(), second);
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let captured_at = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap();
        let path = save_batch(dir.path(), &sample_batch(), &captured_at).unwrap();
        let mode = fs_err::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
