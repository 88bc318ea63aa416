//! Note grid decoding and head/tail grouping

use serde::Serialize;

/// Note rows per beat on the StepMania grid
pub const ROWS_PER_BEAT: f64 = 48.0;

/// Convert a beat to a row on the 48-rows-per-beat grid
pub fn beat_to_row(beat: f64) -> i64 {
    (beat * ROWS_PER_BEAT).round() as i64
}

/// Kind of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoteKind {
    Tap,
    HoldHead,
    RollHead,
    Tail,
    Mine,
    Lift,
    Fake,
    Keysound,
}

impl NoteKind {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::Tap),
            '2' => Some(Self::HoldHead),
            '3' => Some(Self::Tail),
            '4' => Some(Self::RollHead),
            'M' | 'm' => Some(Self::Mine),
            'L' | 'l' => Some(Self::Lift),
            'F' | 'f' => Some(Self::Fake),
            'K' | 'k' => Some(Self::Keysound),
            _ => None,
        }
    }

    /// Whether this kind opens a hold that needs a tail
    pub fn is_head(self) -> bool {
        matches!(self, Self::HoldHead | Self::RollHead)
    }
}

/// A raw note on the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub beat: f64,
    pub column: usize,
    pub kind: NoteKind,
}

/// A note with its tail joined on, if it had one
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupedNote {
    pub beat: f64,
    pub column: usize,
    pub kind: NoteKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail_beat: Option<f64>,
}

/// Head/tail pairing failure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unpaired {
    pub column: usize,
    pub beat: f64,
}

/// Decode a measure grid into notes ordered by (beat, column)
pub fn decode(grid: &str) -> Vec<Note> {
    let mut notes = Vec::new();

    for (measure, text) in grid.split(',').enumerate() {
        let rows: Vec<&str> = text
            .lines()
            .map(|l| l.split("//").next().unwrap_or("").trim())
            .filter(|l| !l.is_empty())
            .collect();
        let count = rows.len();

        for (r, row) in rows.iter().enumerate() {
            let beat = 4.0 * measure as f64 + 4.0 * r as f64 / count as f64;
            for (column, c) in row.chars().enumerate() {
                if let Some(kind) = NoteKind::from_char(c) {
                    notes.push(Note { beat, column, kind });
                }
            }
        }
    }

    notes
}

/// Join hold/roll heads to their tails
///
/// Every head must be closed by a tail in the same column before another
/// head opens there, and every tail must close an open head.
pub fn group(notes: &[Note]) -> Result<Vec<GroupedNote>, Unpaired> {
    let mut grouped: Vec<GroupedNote> = Vec::with_capacity(notes.len());
    // column -> index into `grouped` of the open head
    let mut open: Vec<Option<usize>> = Vec::new();

    for note in notes {
        if open.len() <= note.column {
            open.resize(note.column + 1, None);
        }

        match note.kind {
            NoteKind::Tail => {
                let idx = open[note.column].take().ok_or(Unpaired {
                    column: note.column,
                    beat: note.beat,
                })?;
                grouped[idx].tail_beat = Some(note.beat);
            }
            kind => {
                if kind.is_head() {
                    if let Some(idx) = open[note.column] {
                        return Err(Unpaired {
                            column: note.column,
                            beat: grouped[idx].beat,
                        });
                    }
                    open[note.column] = Some(grouped.len());
                }
                grouped.push(GroupedNote {
                    beat: note.beat,
                    column: note.column,
                    kind,
                    tail_beat: None,
                });
            }
        }
    }

    if let Some(idx) = open.iter().flatten().min() {
        let head = &grouped[*idx];
        return Err(Unpaired {
            column: head.column,
            beat: head.beat,
        });
    }

    Ok(grouped)
}
