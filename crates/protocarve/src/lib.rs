//! # protocarve
//!
//! A library for carving embedded Protocol Buffer file descriptors out of
//! compiled binaries.
//!
//! Programs that link protobuf reflection metadata carry each schema as a
//! serialized `FileDescriptorProto`. This crate finds those records in raw
//! bytes without understanding the container format around them (ELF, PE,
//! Mach-O, archives, memory dumps) and hands back the still-encoded bytes.
//! Decoding them is left to the caller, for instance with `prost-types`.
//!
//! ## Architecture
//!
//! - [`scanner`]: marker search, record boundary detection, wire format
//!   skipping and scan diagnostics
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use protocarve::{CollectingObserver, Scanner};
//! use std::fs;
//!
//! // Read a binary file
//! let data = fs::read("./target/release/my_app")?;
//!
//! // Scan for embedded descriptors
//! let scanner = Scanner::new();
//! for result in scanner.scan(&data) {
//!     println!("{} bytes at {:?}", result.as_bytes().len(), result.range);
//! }
//!
//! // Inspect what was skipped and why
//! let mut observer = CollectingObserver::new();
//! scanner.locate(&data, &mut observer);
//! for diagnostic in &observer.diagnostics {
//!     println!("marker at {}: {:?}", diagnostic.marker, diagnostic.reason);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod error;
pub mod scanner;

// Re-export primary types for convenience
pub use error::{Error, Result};
pub use scanner::{
    scan_file, scan_file_with_config, CollectingObserver, Diagnostic, DiscardReason,
    MalformedRecord, NullObserver, ScanObserver, ScanResult, Scanner, ScannerConfig,
    TracingObserver, WireError, WireErrorKind,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum valid protobuf field number (2^29 - 1)
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;
