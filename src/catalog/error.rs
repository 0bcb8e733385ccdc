// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Errors associated with reading the site, frequency and TLE catalogs.
*/
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("ST_DATADIR is not set; pass a data directory or export the variable")]
    DataDirNotSet,

    #[error("Could not open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("Could not append to {path}: {source}")]
    Append {
        path: String,
        source: std::io::Error,
    },

    #[error("Error reading {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Site {0} was not found in the site table")]
    SiteNotFound(u32),

    #[error("Element set ending on line {line} could not be parsed: {message}")]
    Elements { line: usize, message: String },
}
