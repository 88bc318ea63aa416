//! Chart to beatmap mapping

use super::extract::{self, MAX_LANES};
use crate::config::Instruments;
use crate::error::{Error, Result};
use crate::manifest::{Beatmap, HitsoundNote, Input, ManifestBuilder};
use crate::simfile::timing::Timing;
use crate::simfile::{Chart, Difficulty};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Beatmap categories, assigned to charts in slot order
pub const CATEGORIES: [&str; 7] = [
    "AuxPercussion",
    "Bass",
    "CounterMelody",
    "Drums",
    "Harmony",
    "Melody",
    "Signature",
];

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Strip everything but ASCII letters and digits
pub fn strip(s: &str) -> String {
    NON_ALNUM.replace_all(s, "").into_owned()
}

/// `{steps type}-{difficulty}{meter}-{description}`, lower-cased
pub fn chart_slug(chart: &Chart) -> String {
    format!(
        "{}-{}{}-{}",
        strip(&chart.steps_type),
        chart.difficulty,
        chart.meter,
        strip(&chart.description)
    )
    .to_lowercase()
}

/// Game difficulty rank; Edit ranks with Challenge
pub fn difficulty_rank(difficulty: Difficulty) -> u8 {
    match difficulty {
        Difficulty::Beginner => 1,
        Difficulty::Easy => 2,
        Difficulty::Medium => 3,
        Difficulty::Hard => 4,
        Difficulty::Challenge | Difficulty::Edit => 5,
    }
}

/// Per-run mapping settings
#[derive(Debug, Clone, Copy)]
pub struct MapOptions<'a> {
    pub instruments: &'a Instruments,
    pub hitsounds: bool,
}

impl MapOptions<'_> {
    fn instrument(&self, difficulty: Difficulty) -> &str {
        if difficulty == Difficulty::Edit {
            &self.instruments.inst_edit_name
        } else {
            &self.instruments.inst_normal_name
        }
    }

    fn hitsound(&self, difficulty: Difficulty) -> Vec<HitsoundNote> {
        if !self.hitsounds {
            return Vec::new();
        }
        let (duration, note) = if difficulty == Difficulty::Edit {
            (self.instruments.inst_edit_duration, &self.instruments.inst_edit_note)
        } else {
            (self.instruments.inst_normal_duration, &self.instruments.inst_normal_note)
        };
        vec![HitsoundNote {
            start: 0,
            duration,
            note: note.clone(),
        }]
    }
}

/// Build one beatmap from a chart
///
/// `slot` picks the category and must be below `CATEGORIES.len()`.
pub fn map_chart<T: Timing + ?Sized>(
    chart: &Chart,
    slug: String,
    slot: usize,
    timing: &T,
    options: &MapOptions<'_>,
) -> Result<Beatmap> {
    let grouped = chart.grouped_notes().map_err(|u| Error::MalformedChart {
        chart: slug.clone(),
        column: u.column,
        beat: u.beat,
    })?;
    let extraction = extract::extract(&grouped, timing);

    let mut beatmap = Beatmap::new(
        slug,
        CATEGORIES[slot],
        difficulty_rank(chart.difficulty),
        options.instrument(chart.difficulty).to_string(),
    );

    for note in &extraction.notes {
        let start = timing.time_at(note.beat);
        let duration = note
            .tail_beat
            .map(|tail| timing.time_at(tail) - start)
            .filter(|d| *d > 0);
        beatmap.inputs.push(Input {
            start,
            lanes: [note.column],
            notes: options.hitsound(chart.difficulty),
            duration,
        });
    }
    // Stable, so simultaneous inputs keep grid order
    beatmap.inputs.sort_by_key(|i| i.start);

    if extraction.lanes_dropped {
        warn!(
            slug = %beatmap.slug,
            "chart has more than {} lanes; notes above lane {} were dropped",
            MAX_LANES,
            MAX_LANES
        );
    }
    beatmap.lane_count = extraction.lane_count();

    debug!(
        slug = %beatmap.slug,
        category = %beatmap.category,
        inputs = beatmap.inputs.len(),
        lanes = beatmap.lane_count,
        "mapped chart"
    );
    Ok(beatmap)
}

/// Map charts in order into the builder
///
/// Charts past the seventh slot and charts whose slug repeats an earlier
/// one are skipped with a warning.
pub fn map_charts<T, F>(
    charts: &[Chart],
    builder: &mut ManifestBuilder,
    options: &MapOptions<'_>,
    timing_for: F,
) -> Result<()>
where
    T: Timing,
    F: Fn(&Chart) -> T,
{
    let mut slugs: Vec<String> = Vec::new();
    let mut duplicates = 0;

    for (index, chart) in charts.iter().enumerate() {
        let slot = index - duplicates;
        if slot >= CATEGORIES.len() {
            warn!(
                converted = ?slugs,
                "simfile has more than {} charts; the rest are not converted",
                CATEGORIES.len()
            );
            break;
        }

        let slug = chart_slug(chart);
        if slugs.contains(&slug) {
            warn!(
                slug = %slug,
                "two charts share steps type, difficulty, meter and description; skipping the duplicate"
            );
            duplicates += 1;
            continue;
        }
        slugs.push(slug.clone());

        let timing = timing_for(chart);
        let beatmap = map_chart(chart, slug, slot, &timing, options)?;
        builder.push_beatmap(beatmap);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 beat = 1000 ms
    struct Seconds;

    impl Timing for Seconds {
        fn time_at(&self, beat: f64) -> i64 {
            (beat * 1000.0) as i64
        }

        fn is_hittable(&self, _beat: f64) -> bool {
            true
        }
    }

    fn instruments() -> Instruments {
        Instruments {
            inst_normal_name: "piano".into(),
            inst_edit_name: "synth".into(),
            inst_normal_duration: 100,
            inst_normal_note: "C4".into(),
            inst_edit_duration: 200,
            inst_edit_note: "C5".into(),
        }
    }

    fn chart(difficulty: Difficulty, meter: u32, description: &str, notes: &str) -> Chart {
        Chart {
            steps_type: "dance-single".into(),
            description: description.into(),
            difficulty,
            meter,
            notes: notes.into(),
            timing: Default::default(),
        }
    }

    const TAPS: &str = "1000\n0100\n0010\n0001\n";

    #[test]
    fn test_slug() {
        let c = chart(Difficulty::Hard, 9, "K. Ward (Expert!)", TAPS);
        assert_eq!(chart_slug(&c), "dancesingle-hard9-kwardexpert");
        let c = chart(Difficulty::Edit, 12, "", TAPS);
        assert_eq!(chart_slug(&c), "dancesingle-edit12-");
        assert_eq!(chart_slug(&c), chart_slug(&c.clone()));
    }

    #[test]
    fn test_slug_charset() {
        let c = chart(Difficulty::Medium, 5, "ÄÖ ü_~ x", TAPS);
        let slug = chart_slug(&c);
        assert!(slug
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-'));
        assert_eq!(slug, "dancesingle-medium5-x");
    }

    #[test]
    fn test_difficulty_rank() {
        assert_eq!(difficulty_rank(Difficulty::Beginner), 1);
        assert_eq!(difficulty_rank(Difficulty::Medium), 3);
        assert_eq!(difficulty_rank(Difficulty::Challenge), 5);
        assert_eq!(difficulty_rank(Difficulty::Edit), 5);
    }

    #[test]
    fn test_map_chart_inputs_and_holds() {
        let c = chart(Difficulty::Hard, 9, "", "2001\n0000\n3000\n0000\n");
        let instruments = instruments();
        let options = MapOptions {
            instruments: &instruments,
            hitsounds: false,
        };
        let map = map_chart(&c, chart_slug(&c), 1, &Seconds, &options).unwrap();

        assert_eq!(map.category, "Bass");
        assert_eq!(map.difficulty, 4);
        assert_eq!(map.instruments, vec!["piano"]);
        assert_eq!(map.lane_count, 4);
        assert_eq!(map.inputs.len(), 2);
        // Same start: grid order (column 0 before column 3) is kept
        assert_eq!(map.inputs[0].lanes, [0]);
        assert_eq!(map.inputs[0].duration, Some(2000));
        assert_eq!(map.inputs[1].lanes, [3]);
        assert_eq!(map.inputs[1].duration, None);
        assert!(map.inputs[0].notes.is_empty());
    }

    #[test]
    fn test_hitsounds_follow_edit_flag() {
        let instruments = instruments();
        let options = MapOptions {
            instruments: &instruments,
            hitsounds: true,
        };

        let edit = chart(Difficulty::Edit, 3, "", TAPS);
        let map = map_chart(&edit, chart_slug(&edit), 0, &Seconds, &options).unwrap();
        assert_eq!(map.instruments, vec!["synth"]);
        assert_eq!(map.inputs[0].notes[0].note, "C5");
        assert_eq!(map.inputs[0].notes[0].duration, 200);

        let easy = chart(Difficulty::Easy, 3, "", TAPS);
        let map = map_chart(&easy, chart_slug(&easy), 0, &Seconds, &options).unwrap();
        assert_eq!(map.inputs[0].notes[0].note, "C4");
        assert_eq!(map.inputs[0].notes[0].start, 0);
    }

    #[test]
    fn test_unmatched_hold_fails() {
        let c = chart(Difficulty::Hard, 9, "", "0200\n0000\n0000\n0000\n");
        let instruments = instruments();
        let options = MapOptions {
            instruments: &instruments,
            hitsounds: false,
        };
        let err = map_chart(&c, chart_slug(&c), 0, &Seconds, &options).unwrap_err();
        assert!(matches!(err, Error::MalformedChart { column: 1, .. }));
    }

    #[test]
    fn test_map_charts_skips_duplicates() {
        let charts = vec![
            chart(Difficulty::Hard, 9, "a", TAPS),
            chart(Difficulty::Hard, 9, "a", TAPS),
            chart(Difficulty::Easy, 2, "a", TAPS),
        ];
        let instruments = instruments();
        let options = MapOptions {
            instruments: &instruments,
            hitsounds: false,
        };
        let mut builder = ManifestBuilder::new("s".into(), "c".into(), 0);
        map_charts(&charts, &mut builder, &options, |_| Seconds).unwrap();

        let maps = builder.beatmaps();
        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0].category, "AuxPercussion");
        // The duplicate doesn't consume a slot
        assert_eq!(maps[1].category, "Bass");

        let manifest = builder.finish();
        assert_eq!(manifest.preferred_assignments.len(), 2);
        assert_eq!(manifest.preferred_assignments[1].0, "dancesingle-easy2-a");
    }

    #[test]
    fn test_map_charts_stops_after_seven() {
        let charts: Vec<Chart> = (1..=8)
            .map(|meter| chart(Difficulty::Edit, meter, "", TAPS))
            .collect();
        let instruments = instruments();
        let options = MapOptions {
            instruments: &instruments,
            hitsounds: false,
        };
        let mut builder = ManifestBuilder::new("s".into(), "c".into(), 0);
        map_charts(&charts, &mut builder, &options, |_| Seconds).unwrap();

        let categories: Vec<&str> = builder.beatmaps().iter().map(|b| b.category.as_str()).collect();
        assert_eq!(categories, CATEGORIES.to_vec());
    }
}
