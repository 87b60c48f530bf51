//! ISO/IEC 8211 record reader
//!
//! ISO 8211 is the general-purpose record exchange format S-57 charts are
//! carried on. A file is a sequence of variable-length records: a Data
//! Descriptive Record (DDR) at the head, then data records whose fields
//! are located by a per-record directory.
//!
//! The reader trades strictness for coverage: a malformed record is
//! reported through [`enc_diagnostics::WarningCollector`] and skipped,
//! while bytes that cannot belong to any record (a truncated buffer) are
//! a fatal [`ReadError`].

mod directory;
mod field;
mod leader;
mod reader;

pub mod error;

pub use directory::{Directory, DirectoryEntry, FIELD_TERMINATOR, UNIT_TERMINATOR};
pub use error::{ReadError, ReadErrorKind, Result};
pub use field::Field;
pub use leader::{Leader, LEADER_LEN};
pub use reader::{Iso8211Reader, Record};
