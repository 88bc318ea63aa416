//! Simfile to Dodo Re Mi song conversion
//!
//! Stages run in order: guide, per-chart mapping, timeline reconciliation.
//! A `ManifestBuilder` is passed through each of them and finished once.

pub mod extract;
pub mod guide;
pub mod mapper;
pub mod reconcile;

use crate::audio::{AudioTrack, Track};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::manifest::writer::SongWriter;
use crate::manifest::{Manifest, ManifestBuilder, TitleFile};
use crate::simfile::timing::TimingEngine;
use crate::simfile::Simfile;
use mapper::{strip, MapOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Converter state shared by every song of a run
pub struct Converter {
    config: Config,
    /// Attach hitsounds to every input
    pub hitsounds: bool,
    /// Register the song in `songs.json`
    pub auto_add: bool,
}

impl Converter {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            hitsounds: false,
            auto_add: true,
        }
    }

    /// `{title}-{artist}` slug, with `-hitsounded` when hitsounding
    pub fn song_slug(&self, simfile: &Simfile) -> String {
        let mut slug = format!(
            "{}-{}",
            strip(simfile.display_title()),
            strip(simfile.display_artist())
        )
        .to_lowercase();
        if self.hitsounds {
            slug.push_str("-hitsounded");
        }
        slug
    }

    /// Artist with the configured author annotation
    pub fn composer(&self, simfile: &Simfile) -> String {
        let artist = simfile.display_artist();
        let anno = &self.config.annotation.author_anno;
        if anno.is_empty() {
            artist.to_string()
        } else {
            format!("{} {}", artist, anno)
        }
    }

    /// Title file contents for every locale
    pub fn title(&self, simfile: &Simfile) -> TitleFile {
        let anno = if self.hitsounds {
            &self.config.annotation.has_hitsounds_anno
        } else {
            &self.config.annotation.no_hitsounds_anno
        };
        TitleFile::new(simfile.display_title(), anno)
    }

    /// Build the manifest and reconcile `audio` against it
    pub fn convert<A: Track + ?Sized>(&self, simfile: &Simfile, audio: &mut A) -> Result<Manifest> {
        let mut builder = ManifestBuilder::new(
            self.song_slug(simfile),
            self.composer(simfile),
            audio.duration_ms(),
        );

        let song_timing = TimingEngine::new(&simfile.timing);
        builder.set_guide(guide::build(&song_timing, builder.duration()));
        debug!(windows = builder.guide().len(), "built guide");

        let options = MapOptions {
            instruments: &self.config.instruments,
            hitsounds: self.hitsounds,
        };
        mapper::map_charts(&simfile.charts, &mut builder, &options, |chart| {
            TimingEngine::new(&simfile.timing_for(chart))
        })?;

        reconcile::reconcile(&mut builder, audio);
        Ok(builder.finish())
    }

    /// Convert the simfile at `path` (a file or a song folder) into the songs folder
    ///
    /// Nothing is written until the simfile, audio and every chart have
    /// been processed successfully.
    pub fn convert_path(&self, path: &Path) -> Result<PathBuf> {
        let simfile_path = Simfile::locate(path)?;
        info!(simfile = %simfile_path.display(), "converting");
        let simfile = Simfile::load(&simfile_path)?;

        if simfile.music.is_empty() {
            return Err(Error::Audio(format!(
                "'{}' does not name a #MUSIC file",
                simfile_path.display()
            )));
        }
        let base = simfile_path.parent().unwrap_or_else(|| Path::new("."));
        let mut audio = AudioTrack::load(&base.join(&simfile.music))?;

        let manifest = self.convert(&simfile, &mut audio)?;

        let writer = SongWriter::new(&self.config.paths.songs_path);
        let folder = writer.write(&manifest, &self.title(&simfile), &audio)?;

        if self.auto_add {
            if writer.register(&manifest.slug)? {
                info!(slug = %manifest.slug, "added to songs.json");
            } else {
                info!(slug = %manifest.slug, "already listed in songs.json");
            }
        } else {
            info!(
                slug = %manifest.slug,
                "add this id to the game's songs.json to make the song selectable"
            );
        }

        Ok(folder)
    }
}
