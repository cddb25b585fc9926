// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in every search directory.
pub const CONFIG_FILE_NAME: &str = "lnk-rs.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),
}

/// Candidate locations, most specific first: working directory, the XDG
/// config directory, then `/etc`.
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("lnk-rs").join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from("/etc/lnk-rs").join(CONFIG_FILE_NAME));
    paths
}

/// Pick `key` out of a parsed document and deserialize it on its own so
/// serde defaults apply to missing fields.
fn section_from_str<T: DeserializeOwned>(
    origin: &Path,
    content: &str,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let mut table: toml::Table =
        toml::from_str(content).map_err(|e| parse_error(origin, e))?;
    let Some(section) = table.remove(key) else {
        return Ok(None);
    };
    section
        .try_into::<T>()
        .map(Some)
        .map_err(|e| parse_error(origin, e))
}

fn parse_error(origin: &Path, err: impl fmt::Display) -> ConfigError {
    ConfigError::ParseError(origin.to_path_buf(), err.to_string())
}

fn section_from_file<T: DeserializeOwned>(
    path: &Path,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;
    section_from_str(path, &content, key)
}

/// A configuration stored as one `[<section>]` of `lnk-rs.toml`.
pub trait ConfigFile: Sized + Default + DeserializeOwned {
    /// Section key, e.g. `"lnk-agent"`.
    fn section_key() -> &'static str;

    /// Load the section from `path`. A file without the section is an
    /// error here, unlike during the default-path search.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        section_from_file::<Self>(path, Self::section_key())?.ok_or_else(|| {
            ConfigError::ParseError(
                path.to_path_buf(),
                format!("missing [{}] section", Self::section_key()),
            )
        })
    }

    /// Parse the section from an in-memory document.
    fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        let origin = Path::new("<inline>");
        section_from_str::<Self>(origin, content, Self::section_key())
            .map(Option::unwrap_or_default)
    }

    /// First file among the search paths that carries the section.
    ///
    /// Returns `(Default::default(), None)` when none does.
    fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        Self::load_from_paths(&config_search_paths())
    }

    /// Same as [`load_from_default_paths`](Self::load_from_default_paths)
    /// over an explicit candidate list.
    fn load_from_paths(paths: &[PathBuf]) -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in paths.iter().filter(|p| p.exists()) {
            if let Some(cfg) = section_from_file::<Self>(path, Self::section_key())? {
                return Ok((cfg, Some(path.clone())));
            }
        }
        Ok((Self::default(), None))
    }

    /// Explicit path when given, otherwise the default search.
    fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match explicit {
            Some(path) => {
                Self::load_from_file(path).map(|cfg| (cfg, Some(path.to_path_buf())))
            }
            None => Self::load_from_default_paths(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Sample {
        name: String,
        retries: u32,
    }

    impl ConfigFile for Sample {
        fn section_key() -> &'static str {
            "sample"
        }
    }

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_section_with_defaults() {
        let file = write_config("[sample]\nname = \"wifi\"\n");
        let cfg = Sample::load_from_file(file.path()).unwrap();
        assert_eq!(
            cfg,
            Sample {
                name: "wifi".to_string(),
                retries: 0
            }
        );
    }

    #[test]
    fn test_missing_section_is_error_for_explicit_file() {
        let file = write_config("[other]\nname = \"x\"\n");
        let err = Sample::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("missing [sample] section"));
    }

    #[test]
    fn test_unreadable_file() {
        let err = Sample::load_from_file(Path::new("/nonexistent/lnk-rs.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(..)));
    }

    #[test]
    fn test_invalid_toml() {
        let file = write_config("[sample\nname = ");
        let err = Sample::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(..)));
    }

    #[test]
    fn test_wrong_field_type() {
        let err = Sample::load_from_str("[sample]\nretries = \"many\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(..)));
    }

    #[test]
    fn test_search_skips_files_without_section() {
        let without = write_config("[other]\n");
        let with = write_config("[sample]\nretries = 3\n");
        let paths = vec![
            PathBuf::from("/nonexistent/lnk-rs.toml"),
            without.path().to_path_buf(),
            with.path().to_path_buf(),
        ];

        let (cfg, found) = Sample::load_from_paths(&paths).unwrap();
        assert_eq!(cfg.retries, 3);
        assert_eq!(found.as_deref(), Some(with.path()));
    }

    #[test]
    fn test_search_falls_back_to_default() {
        let (cfg, found) = Sample::load_from_paths(&[]).unwrap();
        assert_eq!(cfg, Sample::default());
        assert!(found.is_none());
    }

    #[test]
    fn test_search_paths_order() {
        let paths = config_search_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("lnk-rs.toml")));
        assert_eq!(
            paths.last(),
            Some(&PathBuf::from("/etc/lnk-rs/lnk-rs.toml"))
        );
    }
}
