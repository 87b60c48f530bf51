//! S-57 object and attribute catalogue
//!
//! The catalogue maps object class codes to acronyms and names, and
//! attribute acronyms to typed definitions used to decode raw ATTF
//! values. Definitions are loaded once from two JSON arrays and are
//! read-only afterwards; per-parse state (duplicate-miss suppression)
//! lives in [`CatalogueSession`].

mod attributes;
mod objects;

pub use attributes::{decode_attribute, AttributeDef, AttributeType, AttributeValue};
pub use objects::ObjectClassDef;

use enc_diagnostics::{codes, ParseWarning, StrictModeViolation, WarningCollector};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Fatal catalogue-load errors.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("malformed catalogue JSON: {0}")]
    Json(
        #[from]
        #[source]
        serde_json::Error,
    ),

    #[error("duplicate object class code {code}")]
    DuplicateCode { code: u32 },

    #[error("duplicate acronym {acronym}")]
    DuplicateAcronym { acronym: String },
}

/// Loaded catalogue with O(1) lookups by code and acronym.
#[derive(Debug, Default)]
pub struct Catalogue {
    classes: Vec<ObjectClassDef>,
    by_code: HashMap<u32, usize>,
    by_acronym: HashMap<String, usize>,
    attributes: HashMap<String, AttributeDef>,
}

impl Catalogue {
    /// Build a catalogue from two JSON arrays: object classes and
    /// attribute definitions. Any malformed record (including an unknown
    /// attribute `type`) fails the whole load.
    pub fn from_json(objects_json: &str, attributes_json: &str) -> Result<Self, CatalogueError> {
        let classes: Vec<ObjectClassDef> = serde_json::from_str(objects_json)?;
        let attributes: Vec<AttributeDef> = serde_json::from_str(attributes_json)?;
        Self::from_defs(classes, attributes)
    }

    /// Build a catalogue from already-deserialized definitions.
    pub fn from_defs(
        classes: Vec<ObjectClassDef>,
        attributes: Vec<AttributeDef>,
    ) -> Result<Self, CatalogueError> {
        let mut by_code = HashMap::with_capacity(classes.len());
        let mut by_acronym = HashMap::with_capacity(classes.len());
        for (index, class) in classes.iter().enumerate() {
            if by_code.insert(class.code, index).is_some() {
                return Err(CatalogueError::DuplicateCode { code: class.code });
            }
            if by_acronym
                .insert(class.acronym.to_uppercase(), index)
                .is_some()
            {
                return Err(CatalogueError::DuplicateAcronym {
                    acronym: class.acronym.clone(),
                });
            }
        }

        let mut attribute_map = HashMap::with_capacity(attributes.len());
        for def in attributes {
            let key = def.acronym.to_uppercase();
            if attribute_map.contains_key(&key) {
                return Err(CatalogueError::DuplicateAcronym {
                    acronym: def.acronym,
                });
            }
            attribute_map.insert(key, def);
        }

        Ok(Self {
            classes,
            by_code,
            by_acronym,
            attributes: attribute_map,
        })
    }

    /// Object class by integer code.
    pub fn object_by_code(&self, code: u32) -> Option<&ObjectClassDef> {
        self.by_code.get(&code).map(|&i| &self.classes[i])
    }

    /// Object class by acronym, case-insensitively.
    pub fn object_by_acronym(&self, acronym: &str) -> Option<&ObjectClassDef> {
        self.by_acronym
            .get(&acronym.to_uppercase())
            .map(|&i| &self.classes[i])
    }

    /// Attribute definition by acronym, case-insensitively.
    pub fn attribute(&self, acronym: &str) -> Option<&AttributeDef> {
        self.attributes.get(&acronym.to_uppercase())
    }

    /// Number of loaded object classes.
    pub fn object_count(&self) -> usize {
        self.classes.len()
    }

    /// Number of loaded attribute definitions.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }
}

/// Per-parse lookup wrapper with duplicate-miss suppression.
///
/// The catalogue itself is shared and read-only; the session owns the
/// "already reported" key set, so repeated lookups of the same unknown
/// key emit `UNKNOWN_OBJ_CODE` only once while the hot path stays O(1).
#[derive(Debug)]
pub struct CatalogueSession<'a> {
    catalogue: &'a Catalogue,
    reported: HashSet<String>,
}

impl<'a> CatalogueSession<'a> {
    /// Start a session over a loaded catalogue.
    pub fn new(catalogue: &'a Catalogue) -> Self {
        Self {
            catalogue,
            reported: HashSet::new(),
        }
    }

    /// The underlying catalogue.
    pub fn catalogue(&self) -> &'a Catalogue {
        self.catalogue
    }

    /// Object class by code, reporting an unknown code once.
    pub fn object_by_code(
        &mut self,
        code: u32,
        warnings: &mut WarningCollector,
    ) -> Result<Option<&'a ObjectClassDef>, StrictModeViolation> {
        let found = self.catalogue.object_by_code(code);
        if found.is_none() && self.reported.insert(format!("obj:{code}")) {
            warnings.warn(ParseWarning::warning(
                codes::UNKNOWN_OBJ_CODE,
                format!("object class code {code} not in catalogue"),
            ))?;
        }
        Ok(found)
    }

    /// Attribute definition by acronym, reporting an unknown acronym once.
    pub fn attribute(
        &mut self,
        acronym: &str,
        warnings: &mut WarningCollector,
    ) -> Result<Option<&'a AttributeDef>, StrictModeViolation> {
        let found = self.catalogue.attribute(acronym);
        if found.is_none() {
            let key = format!("attr:{}", acronym.to_uppercase());
            if self.reported.insert(key) {
                warnings.warn(ParseWarning::warning(
                    codes::UNKNOWN_OBJ_CODE,
                    format!("attribute {acronym} not in catalogue"),
                ))?;
            }
        }
        Ok(found)
    }
}
