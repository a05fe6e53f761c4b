//! Run configuration loaded from TOML and layout files.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use maze_chase_core::Rules;
use serde::Deserialize;
use thiserror::Error;

/// Default number of frames simulated when neither flags nor the file say otherwise.
pub(crate) const DEFAULT_TICKS: u64 = 3_600;

/// Default number of frames between printed snapshots.
pub(crate) const DEFAULT_RENDER_EVERY: u64 = 240;

/// Failures while reading configuration inputs.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}")]
    Read {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid TOML for the expected shape.
    #[error("failed to parse {path}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying TOML failure.
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of a configuration file. Every table is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    /// Match rules.
    pub(crate) rules: Rules,
    /// Runner settings.
    pub(crate) run: RunConfig,
}

/// Settings for the headless runner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RunConfig {
    /// Frames to simulate before stopping.
    pub(crate) ticks: Option<u64>,
    /// Frames between printed snapshots.
    pub(crate) render_every: Option<u64>,
}

impl FileConfig {
    /// Parses configuration text.
    pub(crate) fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the configuration file, or the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = read(path)?;
        Self::from_toml(&text, path)
    }
}

/// Reads a maze layout, one row per line. Trailing blank lines are ignored.
pub(crate) fn load_layout(path: &Path) -> Result<Vec<String>, ConfigError> {
    let text = read(path)?;
    Ok(layout_rows(&text))
}

fn layout_rows(text: &str) -> Vec<String> {
    let mut rows: Vec<String> = text
        .lines()
        .map(|line| line.trim_end_matches('\r').to_owned())
        .collect();
    while rows.last().is_some_and(|row| row.trim().is_empty()) {
        let _ = rows.pop();
    }
    rows
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = FileConfig::from_toml("", Path::new("empty.toml")).expect("parses");

        assert_eq!(config, FileConfig::default());
        assert_eq!(config.rules, Rules::default());
    }

    #[test]
    fn tables_override_selected_fields() {
        let text = "[rules]\nlives = 5\nrng_seed = 9\n\n[run]\nticks = 100\n";
        let config = FileConfig::from_toml(text, Path::new("run.toml")).expect("parses");

        assert_eq!(config.rules.lives, 5);
        assert_eq!(config.rules.rng_seed, 9);
        assert_eq!(config.rules.pursuer_points, 400);
        assert_eq!(config.run.ticks, Some(100));
        assert_eq!(config.run.render_every, None);
    }

    #[test]
    fn unknown_tables_are_rejected() {
        let error = FileConfig::from_toml("[render]\nscale = 2\n", Path::new("bad.toml"))
            .expect_err("unknown table must fail");

        assert!(matches!(error, ConfigError::Parse { .. }));
        assert_eq!(error.to_string(), "failed to parse bad.toml");
    }

    #[test]
    fn missing_files_report_their_path() {
        let error = FileConfig::load(Some(Path::new("/nonexistent/maze-chase.toml")))
            .expect_err("missing file must fail");

        assert!(error.to_string().contains("/nonexistent/maze-chase.toml"));
    }

    #[test]
    fn layout_rows_drop_trailing_blank_lines() {
        let rows = layout_rows("XXXX\r\nXP X\nXXXX\n\n");

        assert_eq!(rows, vec!["XXXX", "XP X", "XXXX"]);
    }
}
