// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Identify an observed Doppler trace against a TLE catalog, or predict the
/// traces of every catalogued emitter in a band.
use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;

use rfsift::catalog::{append_frequency, append_log};
use rfsift::time::{format_mjd, modulo, parse_timestamp, datetime_to_mjd};
use rfsift::trace::identify::{identify, Candidate, ObservedTrace};
use rfsift::trace::synthesize;
use rfsift::DataDir;

#[derive(Parser, Debug)]
#[command(name = "rfsift-trace", author, version, about)]
struct Opt {
    /// TLE catalog file
    #[arg(short = 't', long)]
    tle: PathBuf,

    /// Observed trace file with `mjd frequency_hz` per line
    #[arg(short = 'd', long, required_unless_present = "predict")]
    data: Option<PathBuf>,

    /// Observing site id from the site table
    #[arg(short = 's', long)]
    site: u32,

    /// Restrict to this catalog number
    #[arg(short = 'i', long)]
    satno: Option<u32>,

    /// Bistatic geometry against the Graves illuminator
    #[arg(short = 'g', long)]
    graves: bool,

    /// Predict traces for the band instead of identifying an observation
    #[arg(long, requires = "freq", requires = "start")]
    predict: bool,

    /// Band center for prediction (MHz)
    #[arg(short = 'f', long)]
    freq: Option<f64>,

    /// Band width for prediction (MHz)
    #[arg(short = 'w', long, default_value_t = 2.0)]
    bandwidth: f64,

    /// Prediction start time YYYY-MM-DDTHH:MM:SS
    #[arg(short = 'T', long)]
    start: Option<String>,

    /// Prediction window length (s)
    #[arg(short = 'l', long, default_value_t = 900.0)]
    length: f64,

    /// Prediction step (s)
    #[arg(long, default_value_t = 10.0)]
    step: f64,
}

/// `0000-00-00T00:00:00` stands in for an unknown time of closest approach.
fn tca_label(candidate: &Candidate) -> String {
    match candidate.tca_mjd {
        Some(mjd) => {
            let stamp = format_mjd(mjd);
            stamp[..stamp.len().min(19)].to_string()
        }
        None => String::from("0000-00-00T00:00:00"),
    }
}

fn print_candidate(candidate: &Candidate, graves: bool) {
    if graves {
        println!(
            "{:05}: {} {:8.1} Hz ({:.1},{:.1})",
            candidate.satno,
            tca_label(candidate),
            candidate.rms_hz,
            modulo(candidate.azimuth_deg + 180.0, 360.0),
            candidate.altitude_deg,
        );
    } else {
        println!(
            "{:05}: {}  {:8.3} MHz {:8.3} kHz",
            candidate.satno,
            tca_label(candidate),
            candidate.freq0_hz * 1e-6,
            candidate.rms_hz * 1e-3,
        );
    }
}

fn read_observed(path: &PathBuf, site_id: u32) -> anyhow::Result<ObservedTrace> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("could not open observed trace {}", path.display()))?;

    let mut mjd = Vec::new();
    let mut freq = Vec::new();
    for (number, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(m), Some(f)) = (fields.next(), fields.next()) else {
            bail!("line {} of {} is not `mjd freq`", number + 1, path.display());
        };
        mjd.push(m.parse::<f64>().with_context(|| format!("bad MJD on line {}", number + 1))?);
        freq.push(f.parse::<f64>().with_context(|| format!("bad frequency on line {}", number + 1))?);
    }

    Ok(ObservedTrace {
        site_id,
        mjd,
        freq,
    })
}

fn predict(opt: &Opt, data_dir: &DataDir) -> anyhow::Result<()> {
    let start = parse_timestamp(opt.start.as_deref().expect("clap enforces --start"))
        .context("could not parse the prediction start time")?;
    let start_mjd = datetime_to_mjd(&start);
    let steps = (opt.length / opt.step).ceil() as usize;
    let mjds: Vec<f64> = (0..=steps)
        .map(|i| start_mjd + i as f64 * opt.step / 86400.0)
        .collect();

    let traces = synthesize(
        data_dir,
        &opt.tle,
        &mjds,
        opt.site,
        opt.freq.expect("clap enforces --freq"),
        opt.bandwidth,
        opt.graves,
    )?;
    if traces.is_empty() {
        println!("No catalog entries between {:.3} and {:.3} MHz",
            opt.freq.unwrap_or(0.0) - 0.5 * opt.bandwidth,
            opt.freq.unwrap_or(0.0) + 0.5 * opt.bandwidth);
        return Ok(());
    }

    for trace in traces {
        println!("# {:05} {:.3} MHz", trace.satno, trace.freq0_hz * 1e-6);
        for i in 0..trace.len() {
            println!(
                "{:.8} {:.3} {:.2}",
                trace.mjd[i], trace.freq[i], trace.za[i]
            );
        }
    }
    Ok(())
}

fn identify_observation(opt: &Opt, data_dir: &DataDir) -> anyhow::Result<()> {
    let data = opt.data.as_ref().expect("clap enforces --data");
    let observed = read_observed(data, opt.site)?;

    println!("Fitting trace:");
    let identification = identify(data_dir, &opt.tle, &observed, opt.satno, opt.graves)?;
    for candidate in &identification.candidates {
        if !opt.graves || candidate.rms_hz < rfsift::constants::BISTATIC_POINTING_RMS_HZ {
            print_candidate(candidate, opt.graves);
        }
    }

    let Some(best) = identification.best else {
        println!("\nTrace not identified..");
        return Ok(());
    };

    println!("\nBest fitting object:");
    print_candidate(&best, opt.graves);
    println!("Store frequency? [y/n]");

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    if answer.trim_start().starts_with('y') {
        let now = Utc::now();
        append_frequency(data_dir, best.satno, best.freq0_hz * 1e-6, &now, opt.site)?;
        append_log(
            std::path::Path::new("log.txt"),
            best.satno,
            best.freq0_hz * 1e-6,
            best.rms_hz * 1e-3,
            &tca_label(&best),
        )?;
        println!("Frequency stored\n");
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::parse();

    let data_dir = DataDir::from_env()?;
    if opt.predict {
        predict(&opt, &data_dir)
    } else {
        identify_observation(&opt, &data_dir)
    }
}
