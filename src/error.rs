use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("SongsPath is not set in the config")]
    SongsPathUnset,

    #[error("Songs path '{}' is not a valid folder", .0.display())]
    InvalidSongsPath(PathBuf),

    #[error("No simfile (.ssc or .sm) found at '{}'", .0.display())]
    NoSimfile(PathBuf),

    #[error("Simfile parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Malformed chart '{chart}': unmatched hold in column {column} at beat {beat}")]
    MalformedChart {
        chart: String,
        column: usize,
        beat: f64,
    },

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
