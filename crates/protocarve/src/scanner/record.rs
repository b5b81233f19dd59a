//! Record boundary detection.
//!
//! Walks protobuf fields forward from a candidate start and decides where the
//! enclosing message ends. There is no framing around embedded descriptors,
//! so the end is inferred from the first field that cannot belong to the
//! same `FileDescriptorProto`.

use super::wire::{consume_field, WireError};
use thiserror::Error;
use tracing::trace;

/// Field number of `FileDescriptorProto.name`
const NAME_FIELD: u32 = 1;

/// A candidate region whose bytes are not a well-formed field sequence
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed record at offset {start} after {consumed} bytes: {source}")]
pub struct MalformedRecord {
    /// Offset the consumer started from
    pub start: usize,
    /// Bytes successfully consumed before the failing field
    pub consumed: usize,
    /// The decode failure, with its offset relative to the failing field
    #[source]
    pub source: WireError,
}

/// Consumes protobuf fields from `start` and returns the length of one record.
///
/// The record ends, successfully, at the first of:
/// - a tag with an out-of-range field number
/// - a second occurrence of field 1, which begins an adjacent record
/// - the end of `data`
///
/// Any other decode failure yields [`MalformedRecord`] with the partial length.
pub fn consume_record(data: &[u8], start: usize) -> Result<usize, MalformedRecord> {
    let available = data.len().saturating_sub(start);
    let mut consumed = 0;
    let mut seen_name = false;

    while consumed < available {
        let position = start + consumed;

        let (field_number, length) = match consume_field(&data[position..]) {
            Ok(field) => field,
            Err(e) if e.is_invalid_field_number() => {
                trace!(position, "record ends at invalid field number");
                return Ok(consumed);
            }
            Err(source) => {
                return Err(MalformedRecord {
                    start,
                    consumed,
                    source,
                })
            }
        };

        if length == 0 {
            return Ok(consumed);
        }

        if field_number == NAME_FIELD {
            if seen_name {
                trace!(position, "adjacent record starts");
                return Ok(consumed);
            }
            seen_name = true;
        }

        consumed += length;
    }

    Ok(consumed)
}
