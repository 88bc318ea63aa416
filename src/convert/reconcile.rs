//! Final timeline pass against the backing track
//!
//! The game only shows inputs scheduled after roughly three seconds, and it
//! stops the song when the audio ends regardless of the declared duration.
//! Early charts are pushed back by padding silence in front of the audio;
//! charts running past the audio get silence appended.

use crate::audio::Track;
use crate::manifest::ManifestBuilder;
use tracing::{info, warn};

/// Inputs at or before this time (ms) are not displayed by the game
pub const MIN_VISIBLE_MS: i64 = 3000;

/// What the reconciliation pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Silence prepended, also added to every input and guide time
    pub offset: i64,
    /// Silence appended
    pub padding: i64,
}

/// Shift the timeline and pad the audio so every input is playable
pub fn reconcile<A: Track + ?Sized>(builder: &mut ManifestBuilder, audio: &mut A) -> Reconciliation {
    let mut result = Reconciliation::default();

    let mut earliest: Option<i64> = None;
    let mut latest: Option<i64> = None;
    for beatmap in builder.beatmaps() {
        if beatmap.inputs.is_empty() {
            warn!(slug = %beatmap.slug, "beatmap has no playable inputs");
            continue;
        }
        for input in &beatmap.inputs {
            earliest = Some(earliest.map_or(input.start, |e| e.min(input.start)));
            latest = Some(latest.map_or(input.end(), |l| l.max(input.end())));
        }
    }

    if let (Some(earliest), Some(latest)) = (earliest, latest) {
        let duration = audio.duration_ms();
        if latest >= duration {
            result.padding = latest - duration + 1;
            audio.pad_end(result.padding);
            info!(padding_ms = result.padding, "extended backing track to cover the last input");
        }

        if earliest <= MIN_VISIBLE_MS {
            result.offset = MIN_VISIBLE_MS + 1 - earliest;
            audio.pad_start(result.offset);
            builder.shift(result.offset);
            info!(offset_ms = result.offset, "moved timeline so the first input is visible");
        }
    }

    builder.set_duration(audio.duration_ms());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Beatmap, Input};

    /// Millisecond-exact track
    struct FakeTrack {
        ms: i64,
    }

    impl Track for FakeTrack {
        fn duration_ms(&self) -> i64 {
            self.ms
        }

        fn pad_start(&mut self, ms: i64) {
            self.ms += ms;
        }

        fn pad_end(&mut self, ms: i64) {
            self.ms += ms;
        }
    }

    fn input(start: i64, duration: Option<i64>) -> Input {
        Input {
            start,
            lanes: [0],
            notes: Vec::new(),
            duration,
        }
    }

    fn builder(duration: i64, maps: Vec<Vec<Input>>) -> ManifestBuilder {
        let mut builder = ManifestBuilder::new("s".into(), "c".into(), duration);
        builder.set_guide(vec![[0, 500, 1000, 1500]]);
        for (i, inputs) in maps.into_iter().enumerate() {
            let mut map = Beatmap::new(format!("m{}", i), "Bass", 1, "i".into());
            map.inputs = inputs;
            builder.push_beatmap(map);
        }
        builder
    }

    #[test]
    fn test_single_tap_at_zero() {
        let mut track = FakeTrack { ms: 10_000 };
        let mut b = builder(10_000, vec![vec![input(0, None)]]);
        let r = reconcile(&mut b, &mut track);

        assert_eq!(r, Reconciliation { offset: 3001, padding: 0 });
        assert_eq!(b.beatmaps()[0].inputs[0].start, 3001);
        assert_eq!(b.guide()[0], [3001, 3501, 4001, 4501]);
        assert_eq!(b.duration(), 13_001);
    }

    #[test]
    fn test_late_start_is_untouched() {
        let mut track = FakeTrack { ms: 10_000 };
        let mut b = builder(10_000, vec![vec![input(3001, None), input(3500, None)]]);
        let r = reconcile(&mut b, &mut track);

        assert_eq!(r.offset, 0);
        let starts: Vec<i64> = b.beatmaps()[0].inputs.iter().map(|i| i.start).collect();
        assert_eq!(starts, vec![3001, 3500]);
        assert_eq!(b.guide()[0], [0, 500, 1000, 1500]);
    }

    #[test]
    fn test_boundary_3000_is_shifted() {
        let mut track = FakeTrack { ms: 10_000 };
        let mut b = builder(10_000, vec![vec![input(3000, None)]]);
        assert_eq!(reconcile(&mut b, &mut track).offset, 1);
        assert_eq!(b.beatmaps()[0].inputs[0].start, 3001);
    }

    #[test]
    fn test_negative_start_becomes_3001() {
        let mut track = FakeTrack { ms: 10_000 };
        let mut b = builder(10_000, vec![vec![input(-250, None)], vec![input(4000, None)]]);
        reconcile(&mut b, &mut track);
        assert_eq!(b.beatmaps()[0].inputs[0].start, 3001);
        assert_eq!(b.beatmaps()[1].inputs[0].start, 7251);
    }

    #[test]
    fn test_audio_extended_past_last_input() {
        let mut track = FakeTrack { ms: 5000 };
        let mut b = builder(5000, vec![vec![input(4000, None), input(4800, Some(700))]]);
        let r = reconcile(&mut b, &mut track);

        assert_eq!(r.padding, 501);
        assert_eq!(r.offset, 0);
        assert_eq!(b.duration(), 5501);
        let last = b.beatmaps()[0].inputs.last().unwrap();
        assert!(b.duration() >= last.end());
    }

    #[test]
    fn test_latest_equal_to_duration_is_padded() {
        let mut track = FakeTrack { ms: 5000 };
        let mut b = builder(5000, vec![vec![input(5000, None)]]);
        assert_eq!(reconcile(&mut b, &mut track).padding, 1);
    }

    #[test]
    fn test_empty_beatmaps_are_ignored() {
        let mut track = FakeTrack { ms: 10_000 };
        let mut b = builder(10_000, vec![Vec::new(), vec![input(5000, None)]]);
        let r = reconcile(&mut b, &mut track);
        assert_eq!(r, Reconciliation::default());
        assert_eq!(b.duration(), 10_000);
    }

    #[test]
    fn test_no_inputs_only_refreshes_duration() {
        let mut track = FakeTrack { ms: 7777 };
        let mut b = builder(1, vec![Vec::new()]);
        let r = reconcile(&mut b, &mut track);
        assert_eq!(r, Reconciliation::default());
        assert_eq!(b.duration(), 7777);
        assert_eq!(b.guide()[0][0], 0);
    }
}
