// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Structs and helper methods for Error handling

use thiserror::Error;

/// RfsiftError subtypes
#[derive(Error, Debug)]
pub enum RfsiftError {
    /// An error derived from `CatalogError`.
    #[error("{0}")]
    Catalog(#[from] crate::catalog::error::CatalogError),

    /// An error derived from `TraceError`.
    #[error("{0}")]
    Trace(#[from] crate::trace::error::TraceError),

    /// An error derived from `SpectrumError`.
    #[error("{0}")]
    Spectrum(#[from] crate::spectrum::error::SpectrumError),

    /// An error derived from `SpectrometerError`.
    #[error("{0}")]
    Spectrometer(#[from] crate::spectrometer::error::SpectrometerError),
}
