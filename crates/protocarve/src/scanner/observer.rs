//! Scan diagnostics.
//!
//! The scanner never fails: candidate regions that do not pan out are
//! dropped and scanning moves on. [`ScanObserver`] is the channel through
//! which those decisions are reported.

use super::record::MalformedRecord;
use std::ops::Range;
use tracing::{debug, trace, warn};

/// Why a `.proto` marker did not produce a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// No `0x0A` tag byte precedes the marker in the unscanned window
    MissingTag,
    /// The bytes from the tag onward are not a well-formed field sequence
    Malformed(MalformedRecord),
    /// A record was found but its length is outside the configured bounds
    SizeFiltered {
        /// The rejected byte range
        range: Range<usize>,
    },
}

/// A discarded marker occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Offset of the `.proto` marker
    pub marker: usize,
    /// Why it was discarded
    pub reason: DiscardReason,
}

/// Receives scan events.
///
/// All methods default to doing nothing, so implementors only override the
/// events they care about.
///
/// # Example
///
/// ```
/// use protocarve::{Diagnostic, ScanObserver, Scanner};
///
/// #[derive(Default)]
/// struct CountDiscards(usize);
///
/// impl ScanObserver for CountDiscards {
///     fn discarded(&mut self, _diagnostic: &Diagnostic) {
///         self.0 += 1;
///     }
/// }
///
/// let mut counter = CountDiscards::default();
/// let records = Scanner::new().locate(b"no tag before this.proto", &mut counter);
/// assert!(records.is_empty());
/// assert_eq!(counter.0, 1);
/// ```
pub trait ScanObserver {
    /// A `.proto` marker was found at `marker`
    fn marker_found(&mut self, marker: usize) {
        let _ = marker;
    }

    /// A candidate record was accepted
    fn record_found(&mut self, range: &Range<usize>) {
        let _ = range;
    }

    /// A marker occurrence was abandoned
    fn discarded(&mut self, diagnostic: &Diagnostic) {
        let _ = diagnostic;
    }
}

impl<O: ScanObserver + ?Sized> ScanObserver for &mut O {
    fn marker_found(&mut self, marker: usize) {
        (**self).marker_found(marker)
    }

    fn record_found(&mut self, range: &Range<usize>) {
        (**self).record_found(range)
    }

    fn discarded(&mut self, diagnostic: &Diagnostic) {
        (**self).discarded(diagnostic)
    }
}

/// An observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ScanObserver for NullObserver {}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ScanObserver for TracingObserver {
    fn marker_found(&mut self, marker: usize) {
        trace!(marker, "found .proto marker");
    }

    fn record_found(&mut self, range: &Range<usize>) {
        debug!(
            "Found descriptor at {}..{} ({} bytes)",
            range.start,
            range.end,
            range.len()
        );
    }

    fn discarded(&mut self, diagnostic: &Diagnostic) {
        let marker = diagnostic.marker;
        match &diagnostic.reason {
            DiscardReason::MissingTag => {
                trace!(marker, "no tag byte before marker, skipping");
            }
            DiscardReason::Malformed(err) => {
                warn!(marker, start = err.start, consumed = err.consumed, error = %err.source,
                    "discarding malformed candidate record");
            }
            DiscardReason::SizeFiltered { range } => {
                debug!(marker, start = range.start, len = range.len(),
                    "discarding record outside size bounds");
            }
        }
    }
}

/// Keeps every event for later inspection
#[derive(Debug, Default, Clone)]
pub struct CollectingObserver {
    /// Offsets of every marker seen, in scan order
    pub markers: Vec<usize>,
    /// Accepted record ranges
    pub records: Vec<Range<usize>>,
    /// Discarded marker occurrences
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingObserver {
    /// Creates an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates over the malformed-record diagnostics only
    pub fn malformed(&self) -> impl Iterator<Item = &MalformedRecord> {
        self.diagnostics.iter().filter_map(|d| match &d.reason {
            DiscardReason::Malformed(err) => Some(err),
            _ => None,
        })
    }
}

impl ScanObserver for CollectingObserver {
    fn marker_found(&mut self, marker: usize) {
        self.markers.push(marker);
    }

    fn record_found(&mut self, range: &Range<usize>) {
        self.records.push(range.clone());
    }

    fn discarded(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}
