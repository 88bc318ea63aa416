//! StepMania simfile reader (`.sm` and `.ssc`)

pub mod msd;
pub mod notes;
pub mod timing;

use crate::error::{Error, Result};
use msd::Param;
use notes::GroupedNote;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use timing::{parse_offset, parse_segments, Segment, TimingData};
use tracing::{debug, warn};

/// Source format of a simfile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Format {
    Sm,
    Ssc,
}

impl Format {
    /// Guess the format from a file extension (defaults to SM)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ssc") => Self::Ssc,
            _ => Self::Sm,
        }
    }
}

/// Chart difficulty slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    Beginner,
    Easy,
    Medium,
    Hard,
    Challenge,
    Edit,
}

impl Difficulty {
    /// Parse a difficulty label, accepting the legacy aliases
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "beginner" | "novice" => Some(Self::Beginner),
            "easy" | "basic" | "light" => Some(Self::Easy),
            "medium" | "another" | "trick" | "standard" | "difficult" => Some(Self::Medium),
            "hard" | "ssr" | "maniac" | "heavy" => Some(Self::Hard),
            "challenge" | "smaniac" | "expert" | "oni" => Some(Self::Challenge),
            "edit" => Some(Self::Edit),
            _ => None,
        }
    }

    /// Canonical label as written by StepMania
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Challenge => "Challenge",
            Self::Edit => "Edit",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-chart timing fields (`.ssc` only); `None` falls back to the song
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingOverrides {
    pub offset: Option<f64>,
    pub bpms: Option<Vec<Segment>>,
    pub stops: Option<Vec<Segment>>,
    pub delays: Option<Vec<Segment>>,
    pub warps: Option<Vec<Segment>>,
    pub fakes: Option<Vec<Segment>>,
}

/// One difficulty's step data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub steps_type: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub meter: u32,
    /// Raw measure grid
    #[serde(skip)]
    pub notes: String,
    #[serde(skip_serializing_if = "is_default")]
    pub timing: TimingOverrides,
}

fn is_default(t: &TimingOverrides) -> bool {
    *t == TimingOverrides::default()
}

impl Chart {
    fn new() -> Self {
        Self {
            steps_type: String::new(),
            description: String::new(),
            difficulty: Difficulty::Edit,
            meter: 1,
            notes: String::new(),
            timing: TimingOverrides::default(),
        }
    }

    /// Decode the note grid and join holds to their tails
    pub fn grouped_notes(&self) -> std::result::Result<Vec<GroupedNote>, notes::Unpaired> {
        notes::group(&notes::decode(&self.notes))
    }
}

/// A parsed simfile
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Simfile {
    pub title: String,
    pub subtitle: String,
    pub artist: String,
    pub title_translit: String,
    pub subtitle_translit: String,
    pub artist_translit: String,
    pub music: String,
    pub timing: TimingData,
    pub charts: Vec<Chart>,
}

impl Simfile {
    /// Parse simfile text
    pub fn parse(text: &str, format: Format) -> Result<Self> {
        let mut simfile = Simfile::default();
        let mut current: Option<Chart> = None;

        for param in msd::parse(text) {
            let tag = param.tag();

            if tag == "NOTEDATA" {
                if let Some(chart) = current.take() {
                    simfile.charts.push(chart);
                }
                current = Some(Chart::new());
                continue;
            }

            if let Some(chart) = current.as_mut() {
                if Self::apply_chart_tag(chart, &tag, &param) {
                    continue;
                }
            }

            match tag.as_str() {
                "TITLE" => simfile.title = param.value(),
                "SUBTITLE" => simfile.subtitle = param.value(),
                "ARTIST" => simfile.artist = param.value(),
                "TITLETRANSLIT" => simfile.title_translit = param.value(),
                "SUBTITLETRANSLIT" => simfile.subtitle_translit = param.value(),
                "ARTISTTRANSLIT" => simfile.artist_translit = param.value(),
                "MUSIC" => simfile.music = param.value(),
                "OFFSET" => simfile.timing.offset = parse_offset(&param.value()),
                "BPMS" => simfile.timing.bpms = parse_segments(&param.value()),
                "STOPS" | "FREEZES" => simfile.timing.stops = parse_segments(&param.value()),
                "DELAYS" => simfile.timing.delays = parse_segments(&param.value()),
                "WARPS" => simfile.timing.warps = parse_segments(&param.value()),
                "FAKES" => simfile.timing.fakes = parse_segments(&param.value()),
                "NOTES" | "NOTES2" if format == Format::Sm => {
                    simfile.charts.push(Self::parse_sm_chart(&param)?);
                }
                _ => {}
            }
        }

        if let Some(chart) = current.take() {
            simfile.charts.push(chart);
        }

        debug!(charts = simfile.charts.len(), "parsed simfile");
        Ok(simfile)
    }

    /// Read and parse a simfile from disk
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open '{}': {}", path.display(), e),
            ))
        })?;
        let text = String::from_utf8_lossy(&bytes);
        Self::parse(&text, Format::from_path(path))
    }

    /// Resolve a simfile from a file path or a song folder
    ///
    /// A folder is searched for `*.ssc` first, then `*.sm`.
    pub fn locate(path: &Path) -> Result<PathBuf> {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        if !path.is_dir() {
            return Err(Error::NoSimfile(path.to_path_buf()));
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(path)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        entries.sort();

        for ext in ["ssc", "sm"] {
            let found = entries.iter().find(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(ext))
            });
            if let Some(found) = found {
                return Ok(found.clone());
            }
        }

        Err(Error::NoSimfile(path.to_path_buf()))
    }

    /// Title, preferring the transliteration
    pub fn display_title(&self) -> &str {
        if self.title_translit.is_empty() {
            &self.title
        } else {
            &self.title_translit
        }
    }

    /// Artist, preferring the transliteration
    pub fn display_artist(&self) -> &str {
        if self.artist_translit.is_empty() {
            &self.artist
        } else {
            &self.artist_translit
        }
    }

    /// Timing for a chart, each field falling back to the song's
    pub fn timing_for(&self, chart: &Chart) -> TimingData {
        let song = &self.timing;
        let o = &chart.timing;
        TimingData {
            offset: o.offset.unwrap_or(song.offset),
            bpms: o.bpms.clone().unwrap_or_else(|| song.bpms.clone()),
            stops: o.stops.clone().unwrap_or_else(|| song.stops.clone()),
            delays: o.delays.clone().unwrap_or_else(|| song.delays.clone()),
            warps: o.warps.clone().unwrap_or_else(|| song.warps.clone()),
            fakes: o.fakes.clone().unwrap_or_else(|| song.fakes.clone()),
        }
    }

    /// `#NOTES:type:description:difficulty:meter:radar:grid;`
    fn parse_sm_chart(param: &Param) -> Result<Chart> {
        if param.components.len() < 7 {
            return Err(Error::Parse {
                line: param.line,
                message: format!(
                    "#NOTES needs 6 fields, found {}",
                    param.components.len() - 1
                ),
            });
        }

        let mut chart = Chart::new();
        chart.steps_type = param.get(1).to_string();
        chart.description = param.get(2).to_string();
        chart.difficulty = parse_difficulty(param.get(3), param.line);
        chart.meter = parse_meter(param.get(4), param.line);
        chart.notes = param.get(6).to_string();
        Ok(chart)
    }

    /// Apply an `.ssc` chart tag; returns false for song-level tags
    fn apply_chart_tag(chart: &mut Chart, tag: &str, param: &Param) -> bool {
        let value = param.value();
        match tag {
            "STEPSTYPE" => chart.steps_type = value,
            "DESCRIPTION" => chart.description = value,
            "DIFFICULTY" => chart.difficulty = parse_difficulty(&value, param.line),
            "METER" => chart.meter = parse_meter(&value, param.line),
            "NOTES" | "NOTES2" => chart.notes = value,
            "OFFSET" => chart.timing.offset = Some(parse_offset(&value)),
            "BPMS" => chart.timing.bpms = Some(parse_segments(&value)),
            "STOPS" => chart.timing.stops = Some(parse_segments(&value)),
            "DELAYS" => chart.timing.delays = Some(parse_segments(&value)),
            "WARPS" => chart.timing.warps = Some(parse_segments(&value)),
            "FAKES" => chart.timing.fakes = Some(parse_segments(&value)),
            "CHARTNAME" | "CREDIT" | "RADARVALUES" | "CHARTSTYLE" | "DISPLAYBPM"
            | "TIMESIGNATURES" | "TICKCOUNTS" | "COMBOS" | "SPEEDS" | "SCROLLS" | "LABELS"
            | "ATTACKS" => {}
            _ => return false,
        }
        true
    }
}

fn parse_difficulty(label: &str, line: usize) -> Difficulty {
    Difficulty::parse(label).unwrap_or_else(|| {
        warn!(line, label, "unknown difficulty, treating as Edit");
        Difficulty::Edit
    })
}

fn parse_meter(value: &str, line: usize) -> u32 {
    value.trim().parse().unwrap_or_else(|_| {
        warn!(line, meter = value, "malformed meter, using 1");
        1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SM: &str = r#"
#TITLE:Song;
#TITLETRANSLIT:;
#ARTIST:Band;
#MUSIC:song.wav;
#OFFSET:-0.050;
#BPMS:0.000=150.000;
#STOPS:;
#NOTES:
     dance-single:
     Blank:
     Hard:
     9:
     0.5,0.5,0.5,0.5,0.5:
1000
0100
0010
0001
;
#NOTES:
     dance-single:
     :
     Challenge:
     12:
     :
2000
3000
0000
0000
;
"#;

    const SSC: &str = r#"
#VERSION:0.83;
#TITLE:Other;
#ARTIST:Artist;
#ARTISTTRANSLIT:Artist T;
#MUSIC:other.wav;
#OFFSET:0.000;
#BPMS:0.000=120.000;
#NOTEDATA:;
#STEPSTYPE:dance-single;
#DESCRIPTION:mine;
#DIFFICULTY:Edit;
#METER:7;
#BPMS:0.000=240.000;
#NOTES:
1000
0000
0000
0000
;
#NOTEDATA:;
#STEPSTYPE:dance-single;
#DIFFICULTY:Easy;
#METER:3;
#NOTES:
0001
0000
0000
0000
;
"#;

    #[test]
    fn test_parse_sm() {
        let sm = Simfile::parse(SM, Format::Sm).unwrap();
        assert_eq!(sm.title, "Song");
        assert_eq!(sm.display_title(), "Song");
        assert_eq!(sm.music, "song.wav");
        assert_eq!(sm.timing.offset, -0.05);
        assert_eq!(sm.timing.bpms.len(), 1);
        assert_eq!(sm.charts.len(), 2);

        let hard = &sm.charts[0];
        assert_eq!(hard.steps_type, "dance-single");
        assert_eq!(hard.description, "Blank");
        assert_eq!(hard.difficulty, Difficulty::Hard);
        assert_eq!(hard.meter, 9);
        assert_eq!(hard.grouped_notes().unwrap().len(), 4);

        let challenge = &sm.charts[1];
        assert_eq!(challenge.difficulty, Difficulty::Challenge);
        assert_eq!(challenge.description, "");
        let notes = challenge.grouped_notes().unwrap();
        assert_eq!(notes[0].tail_beat, Some(1.0));
    }

    #[test]
    fn test_parse_ssc_with_chart_timing() {
        let ssc = Simfile::parse(SSC, Format::Ssc).unwrap();
        assert_eq!(ssc.display_artist(), "Artist T");
        assert_eq!(ssc.charts.len(), 2);

        let edit = &ssc.charts[0];
        assert_eq!(edit.difficulty, Difficulty::Edit);
        assert_eq!(edit.description, "mine");
        assert_eq!(edit.meter, 7);
        assert_eq!(ssc.timing_for(edit).bpms[0].value, 240.0);

        let easy = &ssc.charts[1];
        assert_eq!(easy.difficulty, Difficulty::Easy);
        assert_eq!(ssc.timing_for(easy).bpms[0].value, 120.0);
        assert_eq!(easy.grouped_notes().unwrap()[0].column, 3);

        // Song-level BPMS stays untouched by the chart override
        assert_eq!(ssc.timing.bpms[0].value, 120.0);
    }

    #[test]
    fn test_short_notes_is_error() {
        let err = Simfile::parse("#NOTES:dance-single:x:Hard;", Format::Sm).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_difficulty_aliases() {
        assert_eq!(Difficulty::parse("Heavy"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("oni"), Some(Difficulty::Challenge));
        assert_eq!(Difficulty::parse("Basic"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("???"), None);
    }

    #[test]
    fn test_locate_prefers_ssc() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.sm"), "").unwrap();
        std::fs::write(dir.path().join("b.ssc"), "").unwrap();
        let found = Simfile::locate(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "b.ssc");
    }

    #[test]
    fn test_locate_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Simfile::locate(dir.path()),
            Err(Error::NoSimfile(_))
        ));
    }
}
