// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Errors associated with spectrum frame headers.
*/
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpectrumError {
    #[error("Header text is {0} bytes; it must fit in the 256-byte block")]
    HeaderOverflow(usize),

    #[error("Header block is {0} bytes; expected at least 256")]
    HeaderTooShort(usize),

    #[error("Header is missing the {0} field")]
    MissingField(&'static str),

    #[error("Malformed header value for {key}: {value}")]
    MalformedField { key: &'static str, value: String },

    #[error("Block does not start with a HEADER line")]
    NotAHeader,
}
