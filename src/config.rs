//! Converter configuration (`smtododo.toml`)
//!
//! ```toml
//! [Paths]
//! SongsPath = "C:/Games/DodoReMi/songs"
//!
//! [Instruments]
//! InstNormalName = "piano"
//! InstEditName = "synth"
//! InstNormalDuration = 100
//! InstNormalNote = "C4"
//! InstEditDuration = 100
//! InstEditNote = "C5"
//!
//! [Annotation]
//! AuthorAnno = "(smToDodo)"
//! HasHitsoundsAnno = "[HS]"
//! NoHitsoundsAnno = ""
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name next to the working directory
pub const DEFAULT_CONFIG: &str = "smtododo.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(rename = "Paths")]
    pub paths: Paths,
    #[serde(rename = "Instruments")]
    pub instruments: Instruments,
    #[serde(rename = "Annotation", default)]
    pub annotation: Annotation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Paths {
    /// Root of the game's custom songs folder
    pub songs_path: PathBuf,
}

/// Instrument ids and hitsound descriptors for normal and Edit charts
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instruments {
    pub inst_normal_name: String,
    pub inst_edit_name: String,
    pub inst_normal_duration: u32,
    pub inst_normal_note: String,
    pub inst_edit_duration: u32,
    pub inst_edit_note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Annotation {
    pub author_anno: String,
    pub has_hitsounds_anno: String,
    pub no_hitsounds_anno: String,
}

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let config = Self::parse(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config text without touching the filesystem
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Check that the songs folder is set and exists
    pub fn validate(&self) -> Result<()> {
        let songs = &self.paths.songs_path;
        if songs.as_os_str().is_empty() {
            return Err(Error::SongsPathUnset);
        }
        if !songs.is_dir() {
            return Err(Error::InvalidSongsPath(songs.clone()));
        }
        Ok(())
    }
}
