// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Spectrum frames: the fixed 256-byte ASCII header and the 8-bit payload
quantization.

A frame on disk is the header followed by `num_channels` float32 power
values, or `num_channels` signed bytes in quantized mode. Channel 0 is the
most negative frequency offset and the DC bin sits at `num_channels / 2`.
*/
use std::fmt::Write as _;

pub mod error;

#[cfg(test)]
mod test;

pub use error::SpectrumError;

/// On-disk size of a frame header, always NUL-padded to this length.
pub const HEADER_LEN: usize = 256;

/// Mean/RMS pair recorded with 8-bit payloads so they can be rescaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantization {
    pub mean: f32,
    pub rms: f32,
}

/// Metadata of one spectrum frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumHeader {
    /// Start of the subintegration, `YYYY-MM-DDTHH:MM:SS.mmm`
    pub utc_start: String,
    /// Center frequency (Hz)
    pub center_freq_hz: f64,
    /// Sample rate (Hz)
    pub bandwidth_hz: f64,
    /// Wall-clock seconds spent integrating
    pub length_s: f64,
    /// Channels per frame
    pub num_channels: usize,
    /// Subintegrations per file
    pub num_subints: usize,
    /// Present for 8-bit payloads
    pub quantization: Option<Quantization>,
}

impl SpectrumHeader {
    /// Serialize to the exact on-disk header block.
    pub fn to_bytes(&self) -> Result<[u8; HEADER_LEN], SpectrumError> {
        let mut text = String::with_capacity(HEADER_LEN);
        text.push_str("HEADER\n");
        let _ = writeln!(text, "UTC_START    {}", self.utc_start);
        let _ = writeln!(text, "FREQ         {:.6} Hz", self.center_freq_hz);
        let _ = writeln!(text, "BW           {:.6} Hz", self.bandwidth_hz);
        let _ = writeln!(text, "LENGTH       {:.6} s", self.length_s);
        let _ = writeln!(text, "NCHAN        {}", self.num_channels);
        let _ = writeln!(text, "NSUB         {}", self.num_subints);
        if let Some(quantization) = &self.quantization {
            text.push_str("NBITS         8\n");
            let _ = writeln!(text, "MEAN         {}", scientific(quantization.mean));
            let _ = writeln!(text, "RMS          {}", scientific(quantization.rms));
        }
        text.push_str("END\n");

        if text.len() > HEADER_LEN {
            return Err(SpectrumError::HeaderOverflow(text.len()));
        }
        let mut block = [0u8; HEADER_LEN];
        block[..text.len()].copy_from_slice(text.as_bytes());
        Ok(block)
    }

    /// Parse a header block read back from disk.
    pub fn parse(block: &[u8]) -> Result<Self, SpectrumError> {
        if block.len() < HEADER_LEN {
            return Err(SpectrumError::HeaderTooShort(block.len()));
        }
        let text = String::from_utf8_lossy(&block[..HEADER_LEN]);
        let text = text.trim_end_matches('\0');
        let mut lines = text.lines();
        if lines.next() != Some("HEADER") {
            return Err(SpectrumError::NotAHeader);
        }

        let mut utc_start = None;
        let mut center_freq_hz = None;
        let mut bandwidth_hz = None;
        let mut length_s = None;
        let mut num_channels = None;
        let mut num_subints = None;
        let mut nbits8 = false;
        let mut mean = None;
        let mut rms = None;

        for line in lines {
            if line == "END" {
                break;
            }
            let mut fields = line.split_whitespace();
            let key = fields.next().unwrap_or("");
            let value = fields.next().unwrap_or("");
            match key {
                "UTC_START" => utc_start = Some(value.to_string()),
                "FREQ" => center_freq_hz = Some(parse_field("FREQ", value)?),
                "BW" => bandwidth_hz = Some(parse_field("BW", value)?),
                "LENGTH" => length_s = Some(parse_field("LENGTH", value)?),
                "NCHAN" => num_channels = Some(parse_field("NCHAN", value)?),
                "NSUB" => num_subints = Some(parse_field("NSUB", value)?),
                "NBITS" => nbits8 = value == "8",
                "MEAN" => mean = Some(parse_field("MEAN", value)?),
                "RMS" => rms = Some(parse_field("RMS", value)?),
                _ => {}
            }
        }

        let quantization = if nbits8 {
            Some(Quantization {
                mean: mean.ok_or(SpectrumError::MissingField("MEAN"))?,
                rms: rms.ok_or(SpectrumError::MissingField("RMS"))?,
            })
        } else {
            None
        };

        Ok(SpectrumHeader {
            utc_start: utc_start.ok_or(SpectrumError::MissingField("UTC_START"))?,
            center_freq_hz: center_freq_hz.ok_or(SpectrumError::MissingField("FREQ"))?,
            bandwidth_hz: bandwidth_hz.ok_or(SpectrumError::MissingField("BW"))?,
            length_s: length_s.ok_or(SpectrumError::MissingField("LENGTH"))?,
            num_channels: num_channels.ok_or(SpectrumError::MissingField("NCHAN"))?,
            num_subints: num_subints.ok_or(SpectrumError::MissingField("NSUB"))?,
            quantization,
        })
    }

    /// Payload size in bytes for this header's channel count and bit depth.
    pub fn payload_len(&self) -> usize {
        match self.quantization {
            Some(_) => self.num_channels,
            None => self.num_channels * std::mem::size_of::<f32>(),
        }
    }
}

fn parse_field<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, SpectrumError> {
    value.parse().map_err(|_| SpectrumError::MalformedField {
        key,
        value: value.to_string(),
    })
}

/// Format like C `%e`: six fractional digits and a signed two-digit exponent.
fn scientific(value: f32) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let formatted = format!("{:.6e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => formatted,
    }
}

/// An 8-bit rendering of a power spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantized {
    pub quantization: Quantization,
    pub samples: Vec<i8>,
}

impl Quantized {
    /// Undo the quantization: `cz · 6/256 · σ + μ` per channel.
    pub fn dequantize(&self) -> Vec<f32> {
        self.samples
            .iter()
            .map(|&cz| f32::from(cz) * 6.0 / 256.0 * self.quantization.rms + self.quantization.mean)
            .collect()
    }
}

/// Quantize a power spectrum to signed bytes. Channels are scaled so that
/// ±3σ around the mean covers the full byte range, then clamped.
pub fn quantize(z: &[f32]) -> Quantized {
    let n = z.len() as f32;
    let mean = z.iter().sum::<f32>() / n;
    let rms = (z.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / n).sqrt();

    let scale = if rms > 0.0 { 256.0 / 6.0 / rms } else { 0.0 };
    let samples = z
        .iter()
        .map(|&v| (scale * (v - mean)).round().clamp(-128.0, 127.0) as i8)
        .collect();

    Quantized {
        quantization: Quantization { mean, rms },
        samples,
    }
}
