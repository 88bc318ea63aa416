pub mod audio;
pub mod config;
pub mod convert;
pub mod error;
pub mod manifest;
pub mod simfile;

pub use config::Config;
pub use convert::Converter;
pub use error::Error;
pub use simfile::Simfile;
