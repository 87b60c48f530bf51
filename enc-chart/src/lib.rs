//! S-57 Electronic Navigational Chart (ENC) model
//!
//! Parses S-57 chart cells (carried on ISO 8211) into an immutable
//! in-memory model: dataset metadata, typed features with assembled
//! geometry, a primitive store, and an ordered warning list. Incremental
//! update files derive new datasets from a parsed base.
//!
//! The parse surface is [`parse`] / [`parse_with_options`]; queries go
//! through [`ParsedData::find_features`]; updates through
//! [`UpdateProcessor`].

pub mod error;
pub mod feature;
pub mod fields;
pub mod geometry;
pub mod index;
pub mod metadata;
pub mod primitives;
pub mod update;

mod parser;

pub use error::{ChartError, Result};
pub use feature::{
    validate_required_attributes, Feature, Geometry, GeometryType, Position, SpatialPointer,
};
pub use geometry::{GeometryAssembler, GeometryValidator, ValidationOptions, ValidationResult};
pub use index::{Bounds, FeatureFilter, SpatialIndex};
pub use metadata::{DatasetMetadata, DEFAULT_COMF, DEFAULT_SOMF};
pub use parser::{parse, parse_with_options, ParseOptions, SYNTHETIC_INPUT_MIN};
pub use primitives::{Edge, Node, PrimitiveStore};
pub use update::{
    UpdateError, UpdateFile, UpdateOutcome, UpdateProcessor, UpdateSummary,
};

use enc_diagnostics::ParseWarning;

/// One parsed chart cell.
///
/// Immutable after the parse that produced it. Geometries own their
/// coordinate arrays, so the primitive store may be discarded to reclaim
/// memory without invalidating them.
#[derive(Debug, Clone)]
pub struct ParsedData {
    /// Dataset identification and scaling.
    pub metadata: DatasetMetadata,
    pub(crate) index: SpatialIndex,
    /// Nodes and edges backing assembled geometry.
    pub primitives: PrimitiveStore,
    /// Every defect observed, in emission order.
    pub warnings: Vec<ParseWarning>,
}

impl ParsedData {
    /// A dataset with nothing in it (the result of parsing zero bytes).
    pub fn empty() -> Self {
        Self {
            metadata: DatasetMetadata::default(),
            index: SpatialIndex::new(),
            primitives: PrimitiveStore::new(),
            warnings: Vec::new(),
        }
    }

    /// All features, record-id ascending.
    pub fn features(&self) -> &[Feature] {
        self.index.features()
    }

    /// Number of parsed features.
    pub fn feature_count(&self) -> usize {
        self.index.len()
    }

    /// Features matching the filter, record-id ascending.
    pub fn find_features(&self, filter: &FeatureFilter) -> Vec<&Feature> {
        self.index.find_features(filter)
    }

    /// Features with at least one coordinate inside `bounds`.
    pub fn query_bounds(&self, bounds: &Bounds) -> Vec<&Feature> {
        self.index.query_bounds(bounds)
    }

    /// True when any warning has error severity.
    pub fn has_error_warnings(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w.severity == enc_diagnostics::Severity::Error)
    }
}
