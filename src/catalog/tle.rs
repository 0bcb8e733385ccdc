// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Single-pass reader for NORAD two-line element files.
*/
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use sgp4::Elements;

use super::error::CatalogError;

/// Forward-only iterator over the element sets in a TLE file, optionally
/// restricted to one catalog number.
///
/// Files may carry an optional name line ("0 ..." or free text) ahead of
/// each `1`/`2` pair; it is attached to the yielded elements. The file is
/// released when the reader is dropped.
pub struct TleReader<R: BufRead> {
    reader: R,
    satno: Option<u32>,
    line_number: usize,
    pending_name: Option<String>,
}

impl TleReader<BufReader<File>> {
    /// Open a TLE file, yielding element sets for `satno` (or all of them
    /// when no filter is given).
    pub fn open<P: AsRef<Path>>(path: P, satno: Option<u32>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CatalogError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file), satno))
    }
}

impl<R: BufRead> TleReader<R> {
    pub fn new(reader: R, satno: Option<u32>) -> Self {
        TleReader {
            reader,
            satno,
            line_number: 0,
            pending_name: None,
        }
    }

    fn next_line(&mut self) -> Option<std::io::Result<String>> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                while line.ends_with('\n') || line.ends_with('\r') {
                    line.pop();
                }
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// Catalog number in columns 3-7 of an element line, if present.
    fn line_satno(line: &str) -> Option<u32> {
        line.get(2..7)?.trim().parse().ok()
    }
}

impl<R: BufRead> Iterator for TleReader<R> {
    type Item = Result<Elements, CatalogError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line1 = match self.next_line()? {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(CatalogError::Read {
                        path: String::from("TLE stream"),
                        source,
                    }))
                }
            };

            if !line1.starts_with("1 ") {
                // A name line; "0 " prefixes from some distributions are stripped.
                let name = line1.strip_prefix("0 ").unwrap_or(&line1).trim();
                self.pending_name = if name.is_empty() {
                    None
                } else {
                    Some(name.to_string())
                };
                continue;
            }

            let line2 = match self.next_line() {
                Some(Ok(line)) => line,
                Some(Err(source)) => {
                    return Some(Err(CatalogError::Read {
                        path: String::from("TLE stream"),
                        source,
                    }))
                }
                None => return None,
            };
            if !line2.starts_with("2 ") {
                self.pending_name = None;
                continue;
            }

            // Cheap pre-filter on the catalog number field, so unrelated
            // element sets are never fully parsed.
            if let Some(want) = self.satno {
                if Self::line_satno(&line1) != Some(want) {
                    self.pending_name = None;
                    continue;
                }
            }

            let name = self.pending_name.take();
            let line_number = self.line_number;
            return Some(
                Elements::from_tle(name, line1.as_bytes(), line2.as_bytes()).map_err(|e| {
                    CatalogError::Elements {
                        line: line_number,
                        message: e.to_string(),
                    }
                }),
            );
        }
    }
}
