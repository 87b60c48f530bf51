//! S-57 object class definitions.

use serde::{Deserialize, Serialize};

/// One object class from the catalogue.
///
/// Keyed by integer code (the OBJL subfield of FRID) and by acronym.
/// Immutable once the catalogue is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectClassDef {
    /// Object class code (e.g., 75 for LIGHTS)
    pub code: u32,
    /// Six-character uppercase acronym (e.g., "LIGHTS")
    pub acronym: String,
    /// Human-readable name (e.g., "Light")
    pub name: String,
}

impl ObjectClassDef {
    /// Stand-in class for a code the catalogue does not know.
    ///
    /// The numeric code is preserved so downstream consumers can still
    /// group and report on it.
    pub fn placeholder(code: u32) -> Self {
        Self {
            code,
            acronym: format!("OBJ{code}"),
            name: format!("Unknown object class {code}"),
        }
    }
}
