//! Low-level protobuf wire format skipping.
//!
//! Only the encoded *length* of each field matters when looking for record
//! boundaries, so values are never materialized. Errors are classified by
//! [`WireErrorKind`] so callers can tell a bad field number (usually the end
//! of a message) apart from genuinely malformed input.
//!
//! Wire types:
//! - 0: VARINT (int32, int64, uint32, uint64, sint32, sint64, bool, enum)
//! - 1: I64 (fixed64, sfixed64, double)
//! - 2: LEN (string, bytes, embedded messages, packed repeated fields)
//! - 3/4: SGROUP/EGROUP (deprecated groups)
//! - 5: I32 (fixed32, sfixed32, float)

use crate::MAX_FIELD_NUMBER;
use thiserror::Error;

/// Nesting limit for groups, matching the usual protobuf recursion limit
pub const MAX_GROUP_DEPTH: usize = 100;

/// Protobuf wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// 64-bit fixed-width
    I64 = 1,
    /// Length-delimited (strings, bytes, embedded messages)
    Len = 2,
    /// Start group (deprecated)
    StartGroup = 3,
    /// End group (deprecated)
    EndGroup = 4,
    /// 32-bit fixed-width
    I32 = 5,
}

impl TryFrom<u8> for WireType {
    type Error = WireErrorKind;

    fn try_from(value: u8) -> std::result::Result<Self, WireErrorKind> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::I32),
            _ => Err(WireErrorKind::ReservedWireType(value)),
        }
    }
}

/// What went wrong while decoding a field
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum WireErrorKind {
    /// Field number is zero or larger than [`MAX_FIELD_NUMBER`]
    #[error("invalid field number {0}")]
    InvalidFieldNumber(u64),

    /// Wire type 6 or 7
    #[error("reserved wire type {0}")]
    ReservedWireType(u8),

    /// Ran out of bytes in the middle of a field
    #[error("unexpected end of input")]
    Truncated,

    /// Varint longer than ten bytes or above `u64::MAX`
    #[error("variable length integer overflow")]
    VarintOverflow,

    /// End-group tag without a matching start, or with a different number
    #[error("mismatching end group marker")]
    UnexpectedEndGroup,

    /// Groups nested deeper than [`MAX_GROUP_DEPTH`]
    #[error("exceeded maximum group nesting depth")]
    GroupDepthExceeded,
}

/// A classified decode failure at a byte offset relative to the decoded slice
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} at offset {offset}")]
pub struct WireError {
    /// Offset of the failing tag or value
    pub offset: usize,
    /// Failure classification
    pub kind: WireErrorKind,
}

impl WireError {
    /// Creates a new wire error
    pub fn new(offset: usize, kind: WireErrorKind) -> Self {
        Self { offset, kind }
    }

    /// Returns true if the tag carried an out-of-range field number.
    ///
    /// For record boundary detection this is the usual sign that the bytes
    /// that follow belong to something else.
    pub fn is_invalid_field_number(&self) -> bool {
        matches!(self.kind, WireErrorKind::InvalidFieldNumber(_))
    }

    fn shifted(self, by: usize) -> Self {
        Self::new(self.offset + by, self.kind)
    }
}

/// Decode a varint from the given bytes.
///
/// Returns the decoded value and the number of bytes consumed.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize), WireError> {
    let mut result: u64 = 0;

    for (i, &byte) in data.iter().enumerate().take(10) {
        // The tenth byte only has room for the top bit of a u64
        if i == 9 && byte > 1 {
            return Err(WireError::new(0, WireErrorKind::VarintOverflow));
        }

        result |= ((byte & 0x7F) as u64) << (7 * i);

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    let kind = if data.len() >= 10 {
        WireErrorKind::VarintOverflow
    } else {
        WireErrorKind::Truncated
    };
    Err(WireError::new(0, kind))
}

/// Decode a field tag into its field number and wire type.
///
/// Returns the field number, wire type and tag length.
pub fn decode_tag(data: &[u8]) -> Result<(u32, WireType, usize), WireError> {
    let (tag, tag_len) = decode_varint(data)?;

    let field_number = tag >> 3;
    if field_number == 0 || field_number > MAX_FIELD_NUMBER as u64 {
        return Err(WireError::new(
            0,
            WireErrorKind::InvalidFieldNumber(field_number),
        ));
    }

    let wire_type =
        WireType::try_from((tag & 0x07) as u8).map_err(|kind| WireError::new(0, kind))?;

    Ok((field_number as u32, wire_type, tag_len))
}

/// Consume a single protobuf field from the data.
///
/// Returns the field number and total bytes consumed (including tag and value).
pub fn consume_field(data: &[u8]) -> Result<(u32, usize), WireError> {
    consume_field_at_depth(data, 0)
}

fn consume_field_at_depth(data: &[u8], depth: usize) -> Result<(u32, usize), WireError> {
    let (field_number, wire_type, tag_len) = decode_tag(data)?;
    let value_len = consume_value(field_number, wire_type, &data[tag_len..], depth)
        .map_err(|e| e.shifted(tag_len))?;
    Ok((field_number, tag_len + value_len))
}

/// Length of a field value that follows a tag.
fn consume_value(
    field_number: u32,
    wire_type: WireType,
    data: &[u8],
    depth: usize,
) -> Result<usize, WireError> {
    let fixed = |width: usize| {
        if data.len() < width {
            Err(WireError::new(0, WireErrorKind::Truncated))
        } else {
            Ok(width)
        }
    };

    match wire_type {
        WireType::Varint => decode_varint(data).map(|(_, len)| len),
        WireType::I64 => fixed(8),
        WireType::I32 => fixed(4),
        WireType::Len => {
            let (length, prefix_len) = decode_varint(data)?;
            let available = (data.len() - prefix_len) as u64;
            if length > available {
                return Err(WireError::new(0, WireErrorKind::Truncated));
            }
            Ok(prefix_len + length as usize)
        }
        WireType::StartGroup => consume_group(field_number, data, depth + 1),
        WireType::EndGroup => Err(WireError::new(0, WireErrorKind::UnexpectedEndGroup)),
    }
}

/// Skip the body of a group through its matching end-group tag.
fn consume_group(field_number: u32, data: &[u8], depth: usize) -> Result<usize, WireError> {
    if depth > MAX_GROUP_DEPTH {
        return Err(WireError::new(0, WireErrorKind::GroupDepthExceeded));
    }

    let mut position = 0;
    loop {
        let (number, wire_type, tag_len) =
            decode_tag(&data[position..]).map_err(|e| e.shifted(position))?;

        if wire_type == WireType::EndGroup {
            if number != field_number {
                return Err(WireError::new(position, WireErrorKind::UnexpectedEndGroup));
            }
            return Ok(position + tag_len);
        }

        let value_len = consume_value(number, wire_type, &data[position + tag_len..], depth)
            .map_err(|e| e.shifted(position + tag_len))?;
        position += tag_len + value_len;
    }
}
