//! Song manifest (`config.json`) and title file types

pub mod writer;

use serde::{Deserialize, Serialize};

/// Locale codes the game looks up title files for
pub const LOCALES: [&str; 6] = ["de", "en", "es", "es-XL", "fr", "it"];

/// Hitsound attached to an input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitsoundNote {
    pub start: i64,
    pub duration: u32,
    pub note: String,
}

/// One playable input of a beatmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// Milliseconds from the start of the backing track
    pub start: i64,
    pub lanes: [usize; 1],
    pub notes: Vec<HitsoundNote>,
    /// Hold length in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

impl Input {
    /// Time at which the input is fully played out
    pub fn end(&self) -> i64 {
        self.start + self.duration.unwrap_or(0)
    }
}

/// A chart converted to the game's format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beatmap {
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub difficulty: u8,
    pub instruments: Vec<String>,
    pub instrument_requirements: Vec<String>,
    pub events: Vec<serde_json::Value>,
    pub inputs: Vec<Input>,
    pub lane_count: usize,
}

impl Beatmap {
    pub fn new(slug: String, category: &str, difficulty: u8, instrument: String) -> Self {
        Self {
            slug,
            kind: "Discrete".to_string(),
            category: category.to_string(),
            difficulty,
            instruments: vec![instrument],
            instrument_requirements: Vec::new(),
            events: Vec::new(),
            inputs: Vec::new(),
            lane_count: 1,
        }
    }
}

/// The song's `config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub slug: String,
    pub composer: String,
    /// Backing track length in milliseconds
    pub duration: i64,
    pub bucket: String,
    pub scale_key: String,
    pub scale_type: String,
    pub guide_start_offset: i64,
    pub guide: Vec<[i64; 4]>,
    pub beatmaps: Vec<Beatmap>,
    /// `[beatmap slug, instrument]` pairs
    pub preferred_assignments: Vec<(String, String)>,
}

/// `{lang}.json` title file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleFile {
    #[serde(rename = "TITLE")]
    pub title: String,
}

impl TitleFile {
    /// Title with an optional annotation appended
    pub fn new(title: &str, annotation: &str) -> Self {
        let title = if annotation.is_empty() {
            title.to_string()
        } else {
            format!("{} {}", title, annotation)
        };
        Self { title }
    }
}

/// Accumulates the manifest across the conversion stages
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    manifest: Manifest,
}

impl ManifestBuilder {
    pub fn new(slug: String, composer: String, duration: i64) -> Self {
        Self {
            manifest: Manifest {
                slug,
                composer,
                duration,
                bucket: "Custom".to_string(),
                scale_key: "a".to_string(),
                scale_type: "minor".to_string(),
                guide_start_offset: 0,
                guide: Vec::new(),
                beatmaps: Vec::new(),
                preferred_assignments: Vec::new(),
            },
        }
    }

    pub fn duration(&self) -> i64 {
        self.manifest.duration
    }

    pub fn set_duration(&mut self, duration: i64) {
        self.manifest.duration = duration;
    }

    pub fn set_guide(&mut self, guide: Vec<[i64; 4]>) {
        self.manifest.guide = guide;
    }

    pub fn guide(&self) -> &[[i64; 4]] {
        &self.manifest.guide
    }

    /// Add a beatmap and its preferred instrument assignment
    pub fn push_beatmap(&mut self, beatmap: Beatmap) {
        let instrument = beatmap.instruments.first().cloned().unwrap_or_default();
        self.manifest
            .preferred_assignments
            .push((beatmap.slug.clone(), instrument));
        self.manifest.beatmaps.push(beatmap);
    }

    pub fn beatmaps(&self) -> &[Beatmap] {
        &self.manifest.beatmaps
    }

    /// Move every input and guide time later by `offset` ms
    pub fn shift(&mut self, offset: i64) {
        for beatmap in &mut self.manifest.beatmaps {
            for input in &mut beatmap.inputs {
                input.start += offset;
            }
        }
        for window in &mut self.manifest.guide {
            for time in window.iter_mut() {
                *time += offset;
            }
        }
    }

    pub fn finish(self) -> Manifest {
        self.manifest
    }
}
