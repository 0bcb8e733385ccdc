// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// FFT RF observations: read an I/Q sample stream and write averaged power
/// spectra as fixed-shape frames.
use anyhow::Context;
use clap::{Parser, ValueEnum};
use rfsift::{SampleFormat, Spectrometer, SpectrometerSettings};

#[derive(ValueEnum, Debug, Clone, Copy)]
enum InputFormat {
    /// Signed 8-bit I/Q pairs
    Char,
    /// Signed 16-bit I/Q pairs
    Int,
    /// Float32 I/Q pairs
    Float,
}

impl From<InputFormat> for SampleFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Char => SampleFormat::Int8,
            InputFormat::Int => SampleFormat::Int16,
            InputFormat::Float => SampleFormat::Float32,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "rfsift-fft", author, version, about)]
struct Opt {
    /// Input file (can be a FIFO)
    #[arg(short = 'i', long)]
    input: std::path::PathBuf,

    /// Output directory
    #[arg(short = 'p', long, default_value = ".")]
    path: std::path::PathBuf,

    /// Center frequency (Hz)
    #[arg(short = 'f', long)]
    frequency: f64,

    /// Sample rate (Hz)
    #[arg(short = 's', long)]
    samprate: f64,

    /// Channel size (Hz)
    #[arg(short = 'c', long, default_value_t = 100.0)]
    chansize: f64,

    /// Integration time (s)
    #[arg(short = 't', long, default_value_t = 1.0)]
    tint: f64,

    /// Number of subintegrations per file
    #[arg(short = 'n', long, default_value_t = 60)]
    nsub: usize,

    /// Use every mth FFT block
    #[arg(short = 'm', long, default_value_t = 1)]
    use_every: usize,

    /// Input format
    #[arg(short = 'F', long, value_enum, default_value = "int")]
    format: InputFormat,

    /// Scheduled start time YYYY-MM-DDTHH:MM:SS.sss; timestamps are derived
    /// from it instead of the wall clock
    #[arg(short = 'T', long)]
    start: Option<String>,

    /// Digitize output to signed bytes
    #[arg(short = 'b', long)]
    bytes: bool,

    /// Quiet mode, no per-subintegration output
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Output filename prefix instead of the start time
    #[arg(long)]
    prefix: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::parse();

    let scheduled_start = opt
        .start
        .as_deref()
        .map(rfsift::time::parse_timestamp)
        .transpose()
        .context("could not parse the scheduled start time")?;

    let settings = SpectrometerSettings {
        input: opt.input.clone(),
        output_dir: opt.path,
        prefix: opt.prefix,
        center_freq_hz: opt.frequency,
        sample_rate_hz: opt.samprate,
        channel_size_hz: opt.chansize,
        integration_time_s: opt.tint,
        num_subints_per_file: opt.nsub,
        decimation: opt.use_every,
        sample_format: opt.format.into(),
        eight_bit: opt.bytes,
        quiet: opt.quiet,
        scheduled_start,
    };
    let spectrometer = Spectrometer::new(settings)?;

    if !opt.quiet {
        println!("Filename: {}", opt.input.display());
        println!("Frequency: {} MHz", opt.frequency * 1e-6);
        println!("Bandwidth: {} MHz", opt.samprate * 1e-6);
        println!("Sampling time: {} us", 1e6 / opt.samprate);
        println!("Number of channels: {}", spectrometer.num_channels);
        println!(
            "Channel size: {} Hz",
            opt.samprate / spectrometer.num_channels as f64
        );
        println!("Integration time: {} s", opt.tint);
        println!("Number of averaged spectra: {}", spectrometer.num_integrations);
        println!("Number of subints per file: {}", opt.nsub);
    }

    let summary = spectrometer.run()?;
    if !opt.quiet {
        println!(
            "Wrote {} subintegrations across {} files",
            summary.subints_written, summary.files_written
        );
    }

    Ok(())
}
