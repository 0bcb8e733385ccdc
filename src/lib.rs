// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`rfsift` turns a stream of complex baseband radio samples into a time series
of averaged power spectra on disk, and identifies which catalogued
Earth-orbiting object best explains an observed frequency-versus-time curve,
in either a direct-emitter or a bistatic (illuminator + receiver) geometry.
*/

pub mod catalog;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod spectrometer;
pub mod spectrum;
pub mod time;
pub mod trace;

// Re-exports.
pub use catalog::{load_site, read_frequencies, CatalogError, DataDir, FrequencyEntry, Site};
pub use error::RfsiftError;
pub use geometry::{observer_eci, StateVector, Vec3};
pub use spectrometer::{
    RunSummary, SampleFormat, Spectrometer, SpectrometerError, SpectrometerSettings,
};
pub use spectrum::{SpectrumError, SpectrumHeader};
pub use trace::identify::{identify, Candidate, Identification, ObservedTrace};
pub use trace::{synthesize, Trace, TraceError};
