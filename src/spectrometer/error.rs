// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Errors associated with running the spectrometer.
*/
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpectrometerError {
    #[error("Invalid spectrometer settings: {0}")]
    InvalidSettings(String),

    #[error("Could not open input stream {path}: {source}")]
    InputOpen {
        path: String,
        source: std::io::Error,
    },

    #[error("Read failed on input stream: {0}")]
    Read(std::io::Error),

    #[error("Could not create output file {path}: {source}")]
    OutputCreate {
        path: String,
        source: std::io::Error,
    },

    #[error("Write failed on {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("{0}")]
    Header(#[from] crate::spectrum::error::SpectrumError),
}
