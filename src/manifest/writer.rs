//! Song folder output and `songs.json` registration

use super::{Manifest, TitleFile, LOCALES};
use crate::audio::AudioTrack;
use crate::error::Result;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Registry of song slugs shown in song selection
pub const SONGS_REGISTRY: &str = "songs.json";

/// Backing track file name inside a song folder
pub const BACKING_TRACK: &str = "backing.wav";

/// Serialize with 4-space indentation, keeping non-ASCII text as is
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    fs::write(path, to_json(value)?)?;
    Ok(())
}

/// Writes converted songs under the game's songs folder
pub struct SongWriter {
    songs_path: PathBuf,
}

impl SongWriter {
    pub fn new(songs_path: &Path) -> Self {
        Self {
            songs_path: songs_path.to_path_buf(),
        }
    }

    /// Replace `{songs}/{slug}/` with the manifest, audio and title files
    pub fn write(&self, manifest: &Manifest, title: &TitleFile, audio: &AudioTrack) -> Result<PathBuf> {
        let folder = self.songs_path.join(&manifest.slug);
        if folder.exists() {
            debug!(folder = %folder.display(), "removing previous output");
            fs::remove_dir_all(&folder)?;
        }
        fs::create_dir(&folder)?;

        audio.export(&folder.join(BACKING_TRACK))?;
        write_json(&folder.join("config.json"), manifest)?;
        for lang in LOCALES {
            write_json(&folder.join(format!("{}.json", lang)), title)?;
        }

        info!(slug = %manifest.slug, "song folder generated");
        Ok(folder)
    }

    /// Add `slug` to `songs.json`, creating it if needed
    ///
    /// Returns false when the slug was already registered.
    pub fn register(&self, slug: &str) -> Result<bool> {
        let path = self.songs_path.join(SONGS_REGISTRY);
        let mut songs: Vec<String> = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            Vec::new()
        };

        if songs.iter().any(|s| s == slug) {
            return Ok(false);
        }
        songs.push(slug.to_string());
        write_json(&path, &songs)?;
        Ok(true)
    }
}
