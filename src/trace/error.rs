// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Errors associated with trace synthesis and identification.
*/
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("{0}")]
    Catalog(#[from] crate::catalog::error::CatalogError),

    #[error("An observed trace needs at least two samples, got {0}")]
    TooFewSamples(usize),

    #[error("Observed trace time and frequency arrays differ in length ({mjd} vs {freq})")]
    MismatchedArrays { mjd: usize, freq: usize },

    #[error("Modified Julian Date {0} cannot be represented as a timestamp")]
    TimeOutOfRange(f64),
}
