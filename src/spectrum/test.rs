// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Unit tests for spectrum headers and quantization.
*/
use super::*;

fn float_header() -> SpectrumHeader {
    SpectrumHeader {
        utc_start: String::from("2024-01-01T00:00:00.000"),
        center_freq_hz: 435_000_000.0,
        bandwidth_hz: 2_048_000.0,
        length_s: 1.0,
        num_channels: 2048,
        num_subints: 60,
        quantization: None,
    }
}

#[test]
fn test_header_is_exactly_256_bytes() {
    let block = float_header().to_bytes().unwrap();
    assert_eq!(block.len(), HEADER_LEN);

    // Text section terminates with END and the remainder is NUL padding.
    let text = std::str::from_utf8(&block).unwrap();
    let end = text.find("END\n").unwrap();
    assert!(block[end + 4..].iter().all(|&b| b == 0));
}

#[test]
fn test_header_layout() {
    let block = float_header().to_bytes().unwrap();
    let text = String::from_utf8_lossy(&block);
    let text = text.trim_end_matches('\0');
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "HEADER",
            "UTC_START    2024-01-01T00:00:00.000",
            "FREQ         435000000.000000 Hz",
            "BW           2048000.000000 Hz",
            "LENGTH       1.000000 s",
            "NCHAN        2048",
            "NSUB         60",
            "END",
        ]
    );
}

#[test]
fn test_header_round_trip() {
    let header = float_header();
    let parsed = SpectrumHeader::parse(&header.to_bytes().unwrap()).unwrap();
    assert_eq!(parsed, header);
    assert_eq!(parsed.payload_len(), 2048 * 4);
}

#[test]
fn test_quantized_header_round_trip() {
    let mut header = float_header();
    header.quantization = Some(Quantization {
        mean: 3.25e-2,
        rms: 1.5e-3,
    });
    let block = header.to_bytes().unwrap();
    let text = String::from_utf8_lossy(&block);
    assert!(text.contains("NBITS         8\n"));
    assert!(text.contains("MEAN         3.250000e-02\n"));
    assert!(text.contains("RMS          1.500000e-03\n"));

    let parsed = SpectrumHeader::parse(&block).unwrap();
    assert_eq!(parsed, header);
    assert_eq!(parsed.payload_len(), 2048);
}

#[test]
fn test_header_overflow_is_rejected() {
    let mut header = float_header();
    header.utc_start = "x".repeat(HEADER_LEN);
    assert!(matches!(
        header.to_bytes(),
        Err(error::SpectrumError::HeaderOverflow(_))
    ));
}

#[test]
fn test_parse_rejects_junk() {
    assert!(matches!(
        SpectrumHeader::parse(&[0u8; 64]),
        Err(error::SpectrumError::HeaderTooShort(64))
    ));
    assert!(matches!(
        SpectrumHeader::parse(&[b'x'; HEADER_LEN]),
        Err(error::SpectrumError::NotAHeader)
    ));
}

#[test]
fn test_scientific_matches_c_formatting() {
    assert_eq!(scientific(0.0), "0.000000e+00");
    assert_eq!(scientific(2.123456e-3), "2.123456e-03");
    assert_eq!(scientific(-1.5), "-1.500000e+00");
    assert_eq!(scientific(6.02e23), "6.020000e+23");
}

#[test]
fn test_quantize_recoverability() {
    // A spread of values across a few sigma; dequantization must land within
    // one quantization step (6σ/256) of the original.
    let z: Vec<f32> = (0..256).map(|i| (i as f32 * 0.37).sin() * 2.0 + 10.0).collect();
    let quantized = quantize(&z);
    let step = quantized.quantization.rms * 6.0 / 256.0;

    let recovered = quantized.dequantize();
    for (&original, recovered) in z.iter().zip(recovered) {
        assert!(
            (original - recovered).abs() <= step,
            "error {} exceeds one step {}",
            (original - recovered).abs(),
            step
        );
    }
}

#[test]
fn test_quantize_clamps_outliers() {
    let mut z = vec![0.0f32; 128];
    z[0] = 1e6;
    z[1] = -1e6;
    let quantized = quantize(&z);
    assert_eq!(quantized.samples[0], 127);
    assert_eq!(quantized.samples[1], -128);
}

#[test]
fn test_quantize_constant_input() {
    let z = vec![4.0f32; 32];
    let quantized = quantize(&z);
    assert_eq!(quantized.quantization.rms, 0.0);
    assert!(quantized.samples.iter().all(|&s| s == 0));
    assert!(quantized.dequantize().iter().all(|&v| v == 4.0));
}
