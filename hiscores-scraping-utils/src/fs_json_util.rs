use std::{
    fmt::Debug,
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use fs_err::{File, OpenOptions};
use serde::{Deserialize, Serialize};

pub fn read_json<P: Into<PathBuf> + Debug, T: for<'de> Deserialize<'de>>(
    path: P,
) -> anyhow::Result<T> {
    let path = path.into();
    (|| serde_json::from_reader(BufReader::new(File::open(&path)?)).map_err(anyhow::Error::new))()
        .with_context(|| {
            format!(
                "While trying to parse {path:?} as {}",
                std::any::type_name::<T>()
            )
        })
}

/// Creates `path` holding `value` as indented JSON.
///
/// Never replaces an existing file: if `path` is already there,
/// this fails with [`io::ErrorKind::AlreadyExists`] and leaves it untouched.
/// The document is rendered in memory and written with a single `write_all`.
pub fn create_json_pretty<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    let path = path.as_ref();
    let bytes = serde_json::to_vec_pretty(value)?;
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    if let Err(e) = file.write_all(&bytes).and_then(|_| file.flush()) {
        drop(file);
        let _ = fs_err::remove_file(path);
        return Err(e);
    }
    Ok(())
}

/// Like [`read_toml`], but yields `None` when the file does not exist.
pub fn read_toml_if_exists<P: Into<PathBuf> + Debug, T: for<'de> Deserialize<'de>>(
    path: P,
) -> anyhow::Result<Option<T>> {
    let path = path.into();
    match fs_err::read_to_string(&path) {
        Ok(text) => toml::from_str(&text).map(Some).with_context(|| {
            format!(
                "While trying to parse {path:?} as {}",
                std::any::type_name::<T>()
            )
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn read_toml<P: Into<PathBuf> + Debug, T: for<'de> Deserialize<'de>>(
    path: P,
) -> anyhow::Result<T> {
    let path = path.into();
    (|| toml::from_str(&fs_err::read_to_string(&path)?).map_err(anyhow::Error::new))().with_context(
        || {
            format!(
                "While trying to parse {path:?} as {}",
                std::any::type_name::<T>()
            )
        },
    )
}
