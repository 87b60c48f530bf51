//! Stable warning code vocabulary.
//!
//! Codes are part of the public contract: tests and downstream tooling key
//! on them, so existing constants must never be renamed.

/// Record length declared in the leader is unreadable or self-contradictory.
pub const LEADER_LEN_MISMATCH: &str = "LEADER_LEN_MISMATCH";
/// Base address of the field area lies outside the record.
pub const BAD_BASE_ADDR: &str = "BAD_BASE_ADDR";
/// Directory area ended without its field terminator.
pub const DIR_TRUNCATED: &str = "DIR_TRUNCATED";
/// A directory entry addresses bytes beyond the record.
pub const FIELD_BOUNDS: &str = "FIELD_BOUNDS";
/// A subfield could not be decoded from the field data.
pub const SUBFIELD_PARSE: &str = "SUBFIELD_PARSE";
/// Object class code missing from the catalogue.
pub const UNKNOWN_OBJ_CODE: &str = "UNKNOWN_OBJ_CODE";
/// A mandatory attribute is absent from a feature.
pub const MISSING_REQUIRED_ATTR: &str = "MISSING_REQUIRED_ATTR";
/// Depth value outside the plausible [-50, 12000] metre range.
pub const DEPTH_OUT_OF_RANGE: &str = "DEPTH_OUT_OF_RANGE";
/// An area ring arrived open and was closed automatically.
pub const POLYGON_CLOSED_AUTO: &str = "POLYGON_CLOSED_AUTO";

/// A node or edge id was registered twice; the later write won.
pub const DUPLICATE_PRIMITIVE: &str = "DUPLICATE_PRIMITIVE";
/// Spatial pointer referenced a node absent from the store.
pub const MISSING_NODE: &str = "MISSING_NODE";
/// Spatial pointer referenced an edge absent from the store.
pub const MISSING_EDGE: &str = "MISSING_EDGE";
/// Referenced edge has fewer than two nodes.
pub const DEGENERATE_EDGE: &str = "DEGENERATE_EDGE";
/// Feature carried no spatial pointers at all.
pub const EMPTY_POINTERS: &str = "EMPTY_POINTERS";
/// A ring crosses itself.
pub const SELF_INTERSECTION: &str = "SELF_INTERSECTION";

/// Parser substituted the deterministic synthetic dataset.
pub const SYNTHETIC_DATA: &str = "SYNTHETIC_DATA";
/// Update instruction targeted a record the dataset does not hold.
pub const UPDATE_TARGET_MISSING: &str = "UPDATE_TARGET_MISSING";
