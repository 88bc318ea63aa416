//! Playable note selection

use crate::simfile::notes::{GroupedNote, NoteKind};
use crate::simfile::timing::Timing;

/// Lanes the game can display
pub const MAX_LANES: usize = 6;

/// Notes of a chart that become inputs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub notes: Vec<GroupedNote>,
    /// Highest lane among kept notes
    pub max_lane: usize,
    /// A note sat in a lane beyond `MAX_LANES`
    pub lanes_dropped: bool,
}

impl Extraction {
    /// Lane count, clamped to what the game supports
    pub fn lane_count(&self) -> usize {
        let max = if self.lanes_dropped {
            MAX_LANES - 1
        } else {
            self.max_lane.min(MAX_LANES - 1)
        };
        max + 1
    }
}

/// Keep taps, holds and rolls that are on a supported lane and hittable
pub fn extract<T: Timing + ?Sized>(notes: &[GroupedNote], timing: &T) -> Extraction {
    let mut extraction = Extraction::default();

    for note in notes {
        if !matches!(note.kind, NoteKind::Tap | NoteKind::HoldHead | NoteKind::RollHead) {
            continue;
        }
        if note.column >= MAX_LANES {
            extraction.lanes_dropped = true;
            continue;
        }
        if !timing.is_hittable(note.beat) {
            continue;
        }

        extraction.max_lane = extraction.max_lane.max(note.column);
        extraction.notes.push(*note);
    }

    extraction
}
