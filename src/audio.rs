//! Backing track handling: decoding, duration, silence padding and WAV export

use crate::error::{Error, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as DecodeError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Audio that the timeline can be reconciled against
pub trait Track {
    /// Length in whole milliseconds
    fn duration_ms(&self) -> i64;

    /// Prepend at least `ms` milliseconds of silence
    fn pad_start(&mut self, ms: i64);

    /// Append at least `ms` milliseconds of silence
    fn pad_end(&mut self, ms: i64);
}

#[derive(Debug, Clone, PartialEq)]
enum Samples {
    Int(Vec<i32>),
    Float(Vec<f32>),
}

/// A decoded PCM track kept in memory
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    spec: WavSpec,
    /// Interleaved samples
    samples: Samples,
}

impl AudioTrack {
    /// Load a backing track
    ///
    /// `.wav` files are read as-is; anything else (OGG Vorbis, MP3, FLAC)
    /// is decoded to 32-bit float PCM.
    pub fn load(path: &Path) -> Result<Self> {
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));

        let track = if is_wav {
            let reader = WavReader::open(path).map_err(|e| {
                Error::Audio(format!(
                    "Failed to read '{}' as WAV: {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_wav(reader)?
        } else {
            Self::decode(path)?
        };
        debug!(path = %path.display(), duration_ms = track.duration_ms(), "loaded backing track");
        Ok(track)
    }

    /// Decode a compressed track with symphonia
    fn decode(path: &Path) -> Result<Self> {
        let failed = |e: DecodeError| {
            Error::Audio(format!("Failed to decode '{}': {}", path.display(), e))
        };

        let file = File::open(path).map_err(|e| {
            Error::Audio(format!("Failed to open '{}': {}", path.display(), e))
        })?;
        let stream = MediaSourceStream::new(Box::new(file), Default::default());
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(failed)?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Audio(format!("'{}' has no audio track", path.display())))?;
        let track_id = track.id;
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(failed)?;

        let mut spec: Option<WavSpec> = None;
        let mut samples: Vec<f32> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(DecodeError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(failed(e)),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(DecodeError::DecodeError(reason)) => {
                    warn!(path = %path.display(), reason, "skipping corrupt audio packet");
                    continue;
                }
                Err(e) => return Err(failed(e)),
            };

            let signal = *decoded.spec();
            spec.get_or_insert(WavSpec {
                channels: signal.channels.count() as u16,
                sample_rate: signal.rate,
                bits_per_sample: 32,
                sample_format: SampleFormat::Float,
            });
            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, signal);
            buffer.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buffer.samples());
        }

        let spec =
            spec.ok_or_else(|| Error::Audio(format!("'{}' contains no audio", path.display())))?;
        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(Error::Audio(format!(
                "Unsupported audio layout in '{}': {} channels at {} Hz",
                path.display(),
                spec.channels,
                spec.sample_rate
            )));
        }

        Ok(Self {
            spec,
            samples: Samples::Float(samples),
        })
    }

    /// Decode WAV data from any reader
    pub fn from_reader<R: Read>(input: R) -> Result<Self> {
        Self::from_wav(WavReader::new(input)?)
    }

    fn from_wav<R: Read>(reader: WavReader<R>) -> Result<Self> {
        let spec = reader.spec();
        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(Error::Audio(format!(
                "Unsupported WAV layout: {} channels at {} Hz",
                spec.channels, spec.sample_rate
            )));
        }

        let samples = match spec.sample_format {
            SampleFormat::Int => {
                Samples::Int(reader.into_samples::<i32>().collect::<std::result::Result<_, _>>()?)
            }
            SampleFormat::Float => {
                Samples::Float(reader.into_samples::<f32>().collect::<std::result::Result<_, _>>()?)
            }
        };

        Ok(Self { spec, samples })
    }

    /// A silent track with the given format
    pub fn silent(spec: WavSpec, ms: i64) -> Self {
        let mut track = Self {
            spec,
            samples: match spec.sample_format {
                SampleFormat::Int => Samples::Int(Vec::new()),
                SampleFormat::Float => Samples::Float(Vec::new()),
            },
        };
        track.pad_end(ms);
        track
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Number of sample frames (one sample per channel)
    pub fn frames(&self) -> usize {
        let len = match &self.samples {
            Samples::Int(s) => s.len(),
            Samples::Float(s) => s.len(),
        };
        len / self.spec.channels as usize
    }

    /// Write the track as WAV with its original format
    pub fn export(&self, path: &Path) -> Result<()> {
        let mut writer = WavWriter::create(path, self.spec)?;
        match &self.samples {
            Samples::Int(samples) => {
                for &s in samples {
                    writer.write_sample(s)?;
                }
            }
            Samples::Float(samples) => {
                for &s in samples {
                    writer.write_sample(s)?;
                }
            }
        }
        writer.finalize()?;
        Ok(())
    }

    /// Interleaved silence covering at least `ms` milliseconds
    fn silence_len(&self, ms: i64) -> usize {
        if ms <= 0 {
            return 0;
        }
        let rate = self.spec.sample_rate as u64;
        let frames = (ms as u64 * rate).div_ceil(1000);
        frames as usize * self.spec.channels as usize
    }
}

impl Track for AudioTrack {
    fn duration_ms(&self) -> i64 {
        (self.frames() as u64 * 1000 / self.spec.sample_rate as u64) as i64
    }

    fn pad_start(&mut self, ms: i64) {
        let n = self.silence_len(ms);
        match &mut self.samples {
            Samples::Int(s) => {
                s.splice(0..0, std::iter::repeat(0).take(n));
            }
            Samples::Float(s) => {
                s.splice(0..0, std::iter::repeat(0.0).take(n));
            }
        }
    }

    fn pad_end(&mut self, ms: i64) {
        let n = self.silence_len(ms);
        match &mut self.samples {
            Samples::Int(s) => s.resize(s.len() + n, 0),
            Samples::Float(s) => s.resize(s.len() + n, 0.0),
        }
    }
}
