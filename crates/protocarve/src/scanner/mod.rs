//! Binary scanning module for finding embedded protobuf descriptors.
//!
//! This module provides functionality to scan binary files for embedded
//! `FileDescriptorProto` data and extract the raw record bytes.
//!
//! ## Algorithm Overview
//!
//! 1. Search for the `.proto` byte sequence in the unscanned part of the input
//! 2. Backtrack to the nearest magic byte `0x0A` (field 1, wire type LEN)
//! 3. Parse forward using protobuf wire format to find the record boundary
//! 4. Record the range and resume scanning right after it
//!
//! A marker that does not lead to a record is reported to the
//! [`ScanObserver`] and skipped; scanning itself never fails.

mod observer;
mod record;
mod wire;

use crate::error::{Error, Result};
use bytes::Bytes;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

pub use observer::{
    CollectingObserver, Diagnostic, DiscardReason, NullObserver, ScanObserver, TracingObserver,
};
pub use record::{consume_record, MalformedRecord};
pub use wire::{
    consume_field, decode_tag, decode_varint, WireError, WireErrorKind, WireType,
    MAX_GROUP_DEPTH,
};

/// Pattern to search for in binaries (filename suffix)
pub const PROTO_SUFFIX: &[u8] = b".proto";

/// Magic byte indicating start of FileDescriptorProto
/// This is field 1 (name) with wire type 2 (LEN): (1 << 3) | 2 = 0x0A
pub const MAGIC_BYTE: u8 = 0x0A;

/// Distance from a backtracked `0x0A` to the marker when that byte is really
/// the length prefix of a 10-byte filename rather than the tag.
///
/// Only valid for this particular suffix and magic byte.
const LENGTH_COINCIDENCE_DISTANCE: usize = MAGIC_BYTE as usize - PROTO_SUFFIX.len() + 1;

/// Result of scanning a binary for a single descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// The raw bytes of the FileDescriptorProto
    pub data: Bytes,
    /// Byte range in the original input where this was found
    pub range: Range<usize>,
}

impl ScanResult {
    /// Creates a new scan result
    pub fn new(data: Bytes, range: Range<usize>) -> Self {
        Self { data, range }
    }

    /// Returns the data as a slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Configuration for the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Maximum number of descriptors to find (0 = unlimited)
    pub max_results: usize,
    /// Minimum length for an accepted record
    pub min_record_len: usize,
    /// Maximum length for an accepted record
    pub max_record_len: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_results: 0,
            min_record_len: 0,
            max_record_len: usize::MAX,
        }
    }
}

impl ScannerConfig {
    /// Creates a new scanner config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of results to return
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Sets the minimum record length filter
    pub fn min_record_len(mut self, len: usize) -> Self {
        self.min_record_len = len;
        self
    }

    /// Sets the maximum record length filter
    pub fn max_record_len(mut self, len: usize) -> Self {
        self.max_record_len = len;
        self
    }

    fn accepts(&self, len: usize) -> bool {
        (self.min_record_len..=self.max_record_len).contains(&len)
    }

    fn is_full(&self, found: usize) -> bool {
        self.max_results > 0 && found >= self.max_results
    }
}

/// Primary scanner for finding embedded protobuf descriptors
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScannerConfig,
}

impl Scanner {
    /// Creates a new scanner with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new scanner with custom configuration
    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scans `data`, copying each record out of the input.
    ///
    /// Diagnostics go to [`TracingObserver`].
    pub fn scan(&self, data: &[u8]) -> Vec<ScanResult> {
        self.locate(data, TracingObserver)
            .into_iter()
            .map(|range| ScanResult::new(Bytes::copy_from_slice(&data[range.clone()]), range))
            .collect()
    }

    /// Scans a shared buffer; each record is a zero-copy slice of `data`.
    pub fn scan_bytes(&self, data: &Bytes) -> Vec<ScanResult> {
        self.locate(data, TracingObserver)
            .into_iter()
            .map(|range| ScanResult::new(data.slice(range.clone()), range))
            .collect()
    }

    /// Finds the byte ranges of every candidate record in `data`.
    ///
    /// Ranges are returned in ascending order and never overlap. Every
    /// abandoned marker is reported to `observer`.
    pub fn locate<O: ScanObserver>(&self, data: &[u8], mut observer: O) -> Vec<Range<usize>> {
        let mut results = Vec::new();
        let mut cursor = 0;

        debug!("Starting scan of {} bytes", data.len());

        while let Some(relative) = find_subsequence(&data[cursor..], PROTO_SUFFIX) {
            let marker = cursor + relative;
            observer.marker_found(marker);

            let Some(start) = find_record_start(data, cursor, marker) else {
                observer.discarded(&Diagnostic {
                    marker,
                    reason: DiscardReason::MissingTag,
                });
                cursor = marker + 1;
                continue;
            };

            let len = match consume_record(data, start) {
                Ok(len) => len,
                Err(e) => {
                    observer.discarded(&Diagnostic {
                        marker,
                        reason: DiscardReason::Malformed(e),
                    });
                    cursor = marker + 1;
                    continue;
                }
            };

            let range = start..start + len;

            if len == 0 || !self.config.accepts(len) {
                observer.discarded(&Diagnostic {
                    marker,
                    reason: DiscardReason::SizeFiltered { range },
                });
                cursor = marker + 1;
                continue;
            }

            observer.record_found(&range);
            cursor = range.end;
            results.push(range);

            if self.config.is_full(results.len()) {
                break;
            }
        }

        debug!("Scan complete: found {} descriptors", results.len());
        results
    }
}

/// Find the start of a FileDescriptorProto by backtracking from a `.proto` match.
///
/// Only bytes in `cursor..marker` are considered.
fn find_record_start(data: &[u8], cursor: usize, marker: usize) -> Option<usize> {
    let start = cursor + data[cursor..marker].iter().rposition(|&b| b == MAGIC_BYTE)?;

    // A 10-byte filename encodes its length as 0x0A too, so the byte found
    // above may be the length with the real tag right before it.
    if marker - start == LENGTH_COINCIDENCE_DISTANCE
        && start > cursor
        && data[start - 1] == MAGIC_BYTE
    {
        return Some(start - 1);
    }

    Some(start)
}

/// Find a subsequence within a byte slice
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Scan a file for embedded protobuf descriptors
///
/// This is a convenience function that reads the file and scans it.
pub fn scan_file(path: impl AsRef<Path>) -> Result<Vec<ScanResult>> {
    scan_file_with_config(path, ScannerConfig::default())
}

/// Scan a file with custom configuration
pub fn scan_file_with_config(
    path: impl AsRef<Path>,
    config: ScannerConfig,
) -> Result<Vec<ScanResult>> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(Scanner::with_config(config).scan_bytes(&Bytes::from(data)))
}
