//! Beat to time conversion

use super::notes::beat_to_row;
use serde::Serialize;
use tracing::warn;

/// Tempo used when a simfile declares no BPMs
pub const DEFAULT_BPM: f64 = 120.0;

/// Resolves chart beats to absolute song time
pub trait Timing {
    /// Milliseconds since the start of the audio at which `beat` is hit
    fn time_at(&self, beat: f64) -> i64;

    /// Whether a note placed on `beat` can be judged
    fn is_hittable(&self, beat: f64) -> bool;
}

/// A `beat=value` timing entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub beat: f64,
    pub value: f64,
}

/// Raw timing fields of a simfile or chart
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingData {
    /// Seconds; beat 0 sits at `-offset`
    pub offset: f64,
    pub bpms: Vec<Segment>,
    pub stops: Vec<Segment>,
    pub delays: Vec<Segment>,
    pub warps: Vec<Segment>,
    pub fakes: Vec<Segment>,
}

/// Parse a `beat=value,beat=value` list
///
/// Entries that don't parse are dropped with a warning.
pub fn parse_segments(s: &str) -> Vec<Segment> {
    let mut segments = Vec::new();

    for entry in s.split(',') {
        let entry: String = entry.chars().filter(|c| !c.is_whitespace()).collect();
        if entry.is_empty() {
            continue;
        }

        let mut parts = entry.split('=');
        let beat = parts.next().and_then(|b| b.parse::<f64>().ok());
        let value = parts.next().and_then(|v| v.parse::<f64>().ok());
        match (beat, value) {
            (Some(beat), Some(value)) if beat.is_finite() && value.is_finite() => {
                segments.push(Segment { beat, value })
            }
            _ => warn!(entry = %entry, "skipping malformed timing entry"),
        }
    }

    segments
}

/// Parse an `#OFFSET` value, treating garbage as 0
pub fn parse_offset(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    s.parse::<f64>().unwrap_or_else(|_| {
        warn!(offset = %s, "malformed offset, using 0");
        0.0
    })
}

/// Precomputed timing for one chart
#[derive(Debug, Clone)]
pub struct TimingEngine {
    offset: f64,
    /// Sorted, first entry at beat 0, all tempos positive
    bpms: Vec<Segment>,
    stops: Vec<Segment>,
    delays: Vec<Segment>,
    /// Merged, non-overlapping (start beat, end beat)
    warps: Vec<(f64, f64)>,
    fakes: Vec<Segment>,
}

impl TimingEngine {
    pub fn new(data: &TimingData) -> Self {
        let mut raw: Vec<Segment> = data
            .bpms
            .iter()
            .copied()
            .filter(|s| {
                if s.value != 0.0 {
                    true
                } else {
                    warn!(beat = s.beat, "ignoring zero BPM");
                    false
                }
            })
            .collect();
        raw.sort_by(|a, b| a.beat.total_cmp(&b.beat));

        // A negative tempo rewinds time; the beats it covers are warped over
        let mut intervals: Vec<(f64, f64)> = (0..raw.len())
            .filter(|&i| raw[i].value < 0.0)
            .map(|i| negative_bpm_warp(&raw, i))
            .collect();

        let mut bpms: Vec<Segment> = raw.into_iter().filter(|s| s.value > 0.0).collect();
        if bpms.is_empty() {
            bpms.push(Segment {
                beat: 0.0,
                value: DEFAULT_BPM,
            });
        }
        if bpms[0].beat > 0.0 {
            let first = bpms[0].value;
            bpms.insert(0, Segment { beat: 0.0, value: first });
        }

        let mut stops = Vec::new();
        for stop in &data.stops {
            if stop.value > 0.0 {
                stops.push(*stop);
            } else if stop.value < 0.0 {
                // Skips the beats that would take |value| seconds to play
                let bpm = bpm_at(&bpms, stop.beat);
                intervals.push((stop.beat, stop.beat + -stop.value * bpm / 60.0));
            }
        }
        for warp in &data.warps {
            if warp.value > 0.0 {
                intervals.push((warp.beat, warp.beat + warp.value));
            }
        }

        let delays = data.delays.iter().copied().filter(|d| d.value > 0.0).collect();
        let fakes = data.fakes.iter().copied().filter(|f| f.value > 0.0).collect();

        Self {
            offset: data.offset,
            bpms,
            stops,
            delays,
            warps: merge_intervals(intervals),
            fakes,
        }
    }

    /// Seconds since audio start at which `beat` is hit
    pub fn seconds_at(&self, beat: f64) -> f64 {
        let mut time = -self.offset;

        if beat < 0.0 {
            return time + beat * 60.0 / self.bpms[0].value;
        }

        for (i, seg) in self.bpms.iter().enumerate() {
            let end = self.bpms.get(i + 1).map_or(beat, |next| next.beat.min(beat));
            if end <= seg.beat {
                break;
            }
            let span = (end - seg.beat) - self.warped_beats(seg.beat, end);
            time += span * 60.0 / seg.value;
        }

        let row = beat_to_row(beat);
        time += self
            .stops
            .iter()
            .filter(|s| beat_to_row(s.beat) < row)
            .map(|s| s.value)
            .sum::<f64>();
        time += self
            .delays
            .iter()
            .filter(|d| beat_to_row(d.beat) <= row)
            .map(|d| d.value)
            .sum::<f64>();

        time
    }

    fn warped_beats(&self, start: f64, end: f64) -> f64 {
        self.warps
            .iter()
            .map(|&(ws, we)| (we.min(end) - ws.max(start)).max(0.0))
            .sum()
    }

    fn in_warp(&self, row: i64) -> bool {
        let covered = self
            .warps
            .iter()
            .any(|&(ws, we)| beat_to_row(ws) <= row && row < beat_to_row(we));
        if !covered {
            return false;
        }
        let mut pauses = self.stops.iter().chain(self.delays.iter());
        !pauses.any(|p| beat_to_row(p.beat) == row)
    }

    fn in_fake(&self, row: i64) -> bool {
        self.fakes
            .iter()
            .any(|f| beat_to_row(f.beat) <= row && row < beat_to_row(f.beat + f.value))
    }
}

impl Timing for TimingEngine {
    fn time_at(&self, beat: f64) -> i64 {
        (self.seconds_at(beat) * 1000.0).round() as i64
    }

    fn is_hittable(&self, beat: f64) -> bool {
        let row = beat_to_row(beat);
        !self.in_warp(row) && !self.in_fake(row)
    }
}

fn bpm_at(bpms: &[Segment], beat: f64) -> f64 {
    bpms.iter()
        .take_while(|s| s.beat <= beat)
        .last()
        .map_or(bpms[0].value, |s| s.value)
}

/// Warp covering a negative tempo at `raw[index]`
///
/// Runs from the segment start to the beat where the following tempos have
/// played back the time it rewound. A rewind never repaid warps to the end.
fn negative_bpm_warp(raw: &[Segment], index: usize) -> (f64, f64) {
    let start = raw[index].beat;
    let mut rewound = 0.0;
    for (k, seg) in raw.iter().enumerate().skip(index) {
        let next = raw.get(k + 1).map(|s| s.beat);
        if seg.value < 0.0 {
            match next {
                Some(next) => rewound += (next - seg.beat) * 60.0 / -seg.value,
                None => break,
            }
        } else {
            let needed = rewound * seg.value / 60.0;
            match next {
                Some(next) if seg.beat + needed > next => {
                    rewound -= (next - seg.beat) * 60.0 / seg.value;
                }
                _ => return (start, seg.beat + needed),
            }
        }
    }
    (start, f64::INFINITY)
}

fn merge_intervals(mut intervals: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}
