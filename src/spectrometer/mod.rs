// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
The streaming spectrometer: reads interleaved I/Q samples from a byte
stream (a file or a FIFO), windows and Fourier-transforms blocks of
`num_channels` samples, accumulates power spectra and writes them to disk
as fixed-shape frames.

A short read on the input is the termination signal, not an error: the
subintegration in progress is flushed and the run ends cleanly.
*/
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

pub mod error;


use crate::spectrum::{quantize, SpectrumHeader};
use crate::time::{datetime_to_mjd, format_mjd, format_timestamp};
pub use error::SpectrometerError;

/// Encoding of the interleaved I/Q pairs on the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    /// Signed 16-bit little-endian pairs
    #[default]
    Int16,
    /// Signed 8-bit pairs
    Int8,
    /// IEEE-754 float32 little-endian pairs
    Float32,
}

/// Conversion of one raw block into windowed complex samples.
///
/// Each format gets its own monomorphized copy of the integration loop, so
/// the per-block path never branches on the sample encoding.
pub trait SampleDecoder {
    /// Bytes occupied by one I/Q pair
    const BYTES_PER_PAIR: usize;

    /// Decode `out.len()` pairs from `raw`, applying `window` to both
    /// components.
    fn decode(raw: &[u8], window: &[f32], out: &mut [Complex<f32>]);
}

/// Signed 16-bit I/Q, normalized by 1/32768
pub struct Int16Iq;

/// Signed 8-bit I/Q, normalized by 1/256
pub struct Int8Iq;

/// Float32 I/Q, passed through
pub struct Float32Iq;

impl SampleDecoder for Int16Iq {
    const BYTES_PER_PAIR: usize = 4;

    fn decode(raw: &[u8], window: &[f32], out: &mut [Complex<f32>]) {
        for ((chunk, &w), out) in raw.chunks_exact(4).zip(window).zip(out) {
            let i = i16::from_le_bytes([chunk[0], chunk[1]]) as f32 / 32768.0;
            let q = i16::from_le_bytes([chunk[2], chunk[3]]) as f32 / 32768.0;
            *out = Complex::new(i * w, q * w);
        }
    }
}

impl SampleDecoder for Int8Iq {
    const BYTES_PER_PAIR: usize = 2;

    fn decode(raw: &[u8], window: &[f32], out: &mut [Complex<f32>]) {
        for ((chunk, &w), out) in raw.chunks_exact(2).zip(window).zip(out) {
            let i = (chunk[0] as i8) as f32 / 256.0;
            let q = (chunk[1] as i8) as f32 / 256.0;
            *out = Complex::new(i * w, q * w);
        }
    }
}

impl SampleDecoder for Float32Iq {
    const BYTES_PER_PAIR: usize = 8;

    fn decode(raw: &[u8], window: &[f32], out: &mut [Complex<f32>]) {
        for ((chunk, &w), out) in raw.chunks_exact(8).zip(window).zip(out) {
            let i = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let q = f32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            *out = Complex::new(i * w, q * w);
        }
    }
}

/// User-facing spectrometer parameters.
#[derive(Debug, Clone)]
pub struct SpectrometerSettings {
    /// Input sample stream (regular file or FIFO)
    pub input: PathBuf,
    /// Directory receiving the output files
    pub output_dir: PathBuf,
    /// Output filename prefix; derived from the start time when absent
    pub prefix: Option<String>,
    /// Center frequency (Hz)
    pub center_freq_hz: f64,
    /// Sample rate (Hz)
    pub sample_rate_hz: f64,
    /// Channel size (Hz)
    pub channel_size_hz: f64,
    /// Integration time per subintegration (s)
    pub integration_time_s: f64,
    /// Subintegrations per output file
    pub num_subints_per_file: usize,
    /// Use one of every this many FFT blocks
    pub decimation: usize,
    /// Input sample encoding
    pub sample_format: SampleFormat,
    /// Quantize output payloads to signed bytes
    pub eight_bit: bool,
    /// Suppress per-subintegration status lines
    pub quiet: bool,
    /// Timestamp frames from this start instead of the wall clock
    pub scheduled_start: Option<DateTime<Utc>>,
}

impl Default for SpectrometerSettings {
    fn default() -> Self {
        SpectrometerSettings {
            input: PathBuf::new(),
            output_dir: PathBuf::from("."),
            prefix: None,
            center_freq_hz: 0.0,
            sample_rate_hz: 0.0,
            channel_size_hz: 100.0,
            integration_time_s: 1.0,
            num_subints_per_file: 60,
            decimation: 1,
            sample_format: SampleFormat::Int16,
            eight_bit: false,
            quiet: false,
            scheduled_start: None,
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub files_written: usize,
    pub subints_written: usize,
}

/// A configured spectrometer. The FFT plan, window and buffers are set up
/// once here and reused for every block of the run.
pub struct Spectrometer {
    settings: SpectrometerSettings,
    /// Channels per spectrum, `floor(sample_rate / channel_size)`
    pub num_channels: usize,
    /// FFT blocks averaged per subintegration
    pub num_integrations: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl Spectrometer {
    pub fn new(settings: SpectrometerSettings) -> Result<Self, SpectrometerError> {
        if settings.sample_rate_hz <= 0.0 || settings.channel_size_hz <= 0.0 {
            return Err(SpectrometerError::InvalidSettings(String::from(
                "sample rate and channel size must be positive",
            )));
        }
        if settings.decimation == 0 || settings.num_subints_per_file == 0 {
            return Err(SpectrometerError::InvalidSettings(String::from(
                "decimation and subintegration count must be at least 1",
            )));
        }

        let num_channels = (settings.sample_rate_hz / settings.channel_size_hz) as usize;
        let num_integrations =
            (settings.integration_time_s * settings.sample_rate_hz / num_channels as f64) as usize;
        if num_channels < 2 || num_integrations == 0 {
            return Err(SpectrometerError::InvalidSettings(format!(
                "degenerate geometry: {} channels, {} integrations",
                num_channels, num_integrations
            )));
        }

        // Hamming window, applied to both I and Q before the transform.
        let window = (0..num_channels)
            .map(|i| {
                0.54 - 0.46
                    * (2.0 * std::f32::consts::PI * i as f32 / (num_channels as f32 - 1.0)).cos()
            })
            .collect();

        let fft = FftPlanner::<f32>::new().plan_fft_forward(num_channels);

        Ok(Spectrometer {
            settings,
            num_channels,
            num_integrations,
            window,
            fft,
        })
    }

    pub fn settings(&self) -> &SpectrometerSettings {
        &self.settings
    }

    /// Open the configured input stream and integrate until it runs dry.
    pub fn run(&self) -> Result<RunSummary, SpectrometerError> {
        let input = File::open(&self.settings.input).map_err(|source| {
            SpectrometerError::InputOpen {
                path: self.settings.input.display().to_string(),
                source,
            }
        })?;
        self.run_stream(BufReader::new(input))
    }

    /// Integrate an already-open sample stream until it runs dry.
    pub fn run_stream<R: Read>(&self, reader: R) -> Result<RunSummary, SpectrometerError> {
        match self.settings.sample_format {
            SampleFormat::Int16 => self.integrate::<Int16Iq, R>(reader),
            SampleFormat::Int8 => self.integrate::<Int8Iq, R>(reader),
            SampleFormat::Float32 => self.integrate::<Float32Iq, R>(reader),
        }
    }

    fn integrate<D: SampleDecoder, R: Read>(
        &self,
        mut reader: R,
    ) -> Result<RunSummary, SpectrometerError> {
        let nchan = self.num_channels;
        let nint = self.num_integrations;
        let nsub = self.settings.num_subints_per_file;
        let nuse = self.settings.decimation;
        let tint = self.settings.integration_time_s;

        let start_mjd = self.settings.scheduled_start.as_ref().map(datetime_to_mjd);
        let prefix = match &self.settings.prefix {
            Some(prefix) => prefix.clone(),
            None => {
                let start = self.settings.scheduled_start.unwrap_or_else(Utc::now);
                start.format("%Y-%m-%dT%H:%M:%S").to_string()
            }
        };

        let mut raw = vec![0u8; nchan * D::BYTES_PER_PAIR];
        let mut signal = vec![Complex::new(0.0f32, 0.0); nchan];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];
        let mut power = vec![0.0f32; nchan];

        let mut summary = RunSummary {
            files_written: 0,
            subints_written: 0,
        };
        let mut eof = false;

        'files: for file_index in 0.. {
            let path = self
                .settings
                .output_dir
                .join(format!("{}_{:06}.bin", prefix, file_index));
            // Created lazily so an exhausted stream never leaves an empty file.
            let mut writer: Option<BufWriter<File>> = None;

            for subint in 0..nsub {
                power.fill(0.0);
                let wall_start = Instant::now();
                let utc_start = Utc::now();
                let mut blocks = 0usize;

                for block in 0..nint {
                    let filled = read_full(&mut reader, &mut raw)?;
                    if filled < raw.len() {
                        // Producer closed the stream; a partial block is dropped.
                        eof = true;
                        break;
                    }
                    if block % nuse != 0 {
                        continue;
                    }
                    D::decode(&raw, &self.window, &mut signal);
                    self.fft.process_with_scratch(&mut signal, &mut scratch);

                    // Accumulate power with an FFT shift: DC lands at nchan/2.
                    let half = nchan / 2;
                    for (i, c) in signal.iter().enumerate() {
                        let l = if i < half { i + half } else { i - half };
                        power[l] += c.norm_sqr();
                    }
                    blocks += 1;
                }

                if blocks == 0 {
                    // EOF before any data this subintegration; nothing to flush.
                    break;
                }

                let scale = nuse as f32 / nchan as f32;
                for value in power.iter_mut() {
                    *value *= scale;
                }

                let (stamp, length_s) = match start_mjd {
                    Some(mjd0) => (
                        format_mjd(
                            mjd0 + (file_index * nsub + subint) as f64 * tint / 86400.0,
                        ),
                        tint,
                    ),
                    None => (
                        format_timestamp(&utc_start),
                        wall_start.elapsed().as_secs_f64(),
                    ),
                };

                let quantized = self.settings.eight_bit.then(|| quantize(&power));
                let header = SpectrumHeader {
                    utc_start: stamp.clone(),
                    center_freq_hz: self.settings.center_freq_hz,
                    bandwidth_hz: self.settings.sample_rate_hz,
                    length_s,
                    num_channels: nchan,
                    num_subints: nsub,
                    quantization: quantized.as_ref().map(|q| q.quantization),
                };

                if writer.is_none() {
                    let file = File::create(&path).map_err(|source| {
                        SpectrometerError::OutputCreate {
                            path: path.display().to_string(),
                            source,
                        }
                    })?;
                    writer = Some(BufWriter::new(file));
                }
                let out = writer.as_mut().expect("writer was just created");

                out.write_all(&header.to_bytes()?)
                    .map_err(|source| write_error(&path, source))?;
                match &quantized {
                    Some(q) => out.write_all(bytemuck::cast_slice(&q.samples)),
                    None => out.write_all(bytemuck::cast_slice(&power)),
                }
                .map_err(|source| write_error(&path, source))?;
                summary.subints_written += 1;

                if !self.settings.quiet {
                    println!("{} {} {:.6} {}", path.display(), stamp, length_s, blocks);
                }

                if eof {
                    break;
                }
            }

            if let Some(mut out) = writer.take() {
                out.flush().map_err(|source| write_error(&path, source))?;
                summary.files_written += 1;
            }
            if eof {
                break 'files;
            }
        }

        Ok(summary)
    }
}

fn write_error(path: &std::path::Path, source: std::io::Error) -> SpectrometerError {
    SpectrometerError::Write {
        path: path.display().to_string(),
        source,
    }
}

/// Read until `buf` is full or the stream ends. FIFOs hand out short reads
/// long before EOF, so partial reads keep going.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, SpectrometerError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(SpectrometerError::Read(e)),
        }
    }
    Ok(filled)
}
