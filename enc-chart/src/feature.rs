//! Feature model: positions, geometry, spatial pointers, features.

use enc_catalogue::{AttributeValue, ObjectClassDef};
use enc_diagnostics::{codes, ParseWarning, StrictModeViolation, WarningCollector};
use std::collections::BTreeMap;

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// The synthetic origin used when geometry cannot be resolved.
    pub fn origin() -> Self {
        Self { lat: 0.0, lon: 0.0 }
    }
}

/// Geometry primitive kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryType {
    Point,
    Line,
    Area,
}

/// Resolved feature geometry.
///
/// A point is a single one-element ring; a line is a single multi-point
/// ring; an area is one outer ring followed by zero or more inner rings
/// (holes), each closed (first == last). Rings own their coordinates:
/// nothing aliases into the primitive store, so the store can be dropped
/// without invalidating geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub geometry_type: GeometryType,
    pub rings: Vec<Vec<Position>>,
}

impl Geometry {
    /// Point geometry at `position`.
    pub fn point(position: Position) -> Self {
        Self {
            geometry_type: GeometryType::Point,
            rings: vec![vec![position]],
        }
    }

    /// Line geometry through `coordinates` (at least two points).
    pub fn line(coordinates: Vec<Position>) -> Self {
        Self {
            geometry_type: GeometryType::Line,
            rings: vec![coordinates],
        }
    }

    /// Area geometry from closed rings (outer first).
    pub fn area(rings: Vec<Vec<Position>>) -> Self {
        Self {
            geometry_type: GeometryType::Area,
            rings,
        }
    }

    /// The outer ring (every geometry has one).
    pub fn outer_ring(&self) -> &[Position] {
        self.rings.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// All coordinates across all rings, in ring order.
    pub fn coordinates(&self) -> Vec<Position> {
        self.rings.iter().flatten().copied().collect()
    }
}

/// Reference from a feature to a primitive, with direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialPointer {
    /// Id of the referenced node or edge.
    pub ref_id: u32,
    /// True when the reference is to an edge, false for a node.
    pub is_edge: bool,
    /// Traverse the edge's node list back to front.
    pub reverse: bool,
}

impl SpatialPointer {
    pub fn node(ref_id: u32) -> Self {
        Self {
            ref_id,
            is_edge: false,
            reverse: false,
        }
    }

    pub fn edge(ref_id: u32, reverse: bool) -> Self {
        Self {
            ref_id,
            is_edge: true,
            reverse,
        }
    }
}

/// One chart feature: a typed object with decoded attributes and
/// resolved geometry.
#[derive(Debug, Clone)]
pub struct Feature {
    /// Record id from FRID (unique within the dataset).
    pub record_id: u32,
    /// Object class, or a placeholder preserving the unknown code.
    pub feature_type: ObjectClassDef,
    /// Decoded attributes keyed by acronym.
    pub attributes: BTreeMap<String, AttributeValue>,
    /// Flattened coordinates, in ring order.
    pub coordinates: Vec<Position>,
    /// Assembled geometry.
    pub geometry: Geometry,
}

impl Feature {
    /// The feature's OBJNAM attribute, when present and textual.
    pub fn object_name(&self) -> Option<&str> {
        self.attributes.get("OBJNAM").and_then(AttributeValue::as_str)
    }
}

/// Report attributes a feature class requires but the feature lacks.
///
/// The parser itself enforces no mandatory attributes; callers that know
/// the requirements for a class run this afterwards.
pub fn validate_required_attributes(
    feature: &Feature,
    required: &[&str],
    warnings: &mut WarningCollector,
) -> Result<(), StrictModeViolation> {
    for acronym in required {
        if !feature.attributes.contains_key(*acronym) {
            warnings.warn(
                ParseWarning::warning(
                    codes::MISSING_REQUIRED_ATTR,
                    format!(
                        "feature {} ({}) lacks required attribute {}",
                        feature.record_id, feature.feature_type.acronym, acronym
                    ),
                )
                .with_feature(feature.record_id),
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_feature() -> Feature {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            "OBJNAM".to_string(),
            AttributeValue::Str("West Point Light".to_string()),
        );
        Feature {
            record_id: 1,
            feature_type: ObjectClassDef {
                code: 75,
                acronym: "LIGHTS".to_string(),
                name: "Light".to_string(),
            },
            attributes,
            coordinates: vec![Position::new(47.62, -122.32)],
            geometry: Geometry::point(Position::new(47.62, -122.32)),
        }
    }

    #[test]
    fn test_point_geometry_shape() {
        let geometry = Geometry::point(Position::new(1.0, 2.0));
        assert_eq!(geometry.geometry_type, GeometryType::Point);
        assert_eq!(geometry.rings.len(), 1);
        assert_eq!(geometry.outer_ring().len(), 1);
    }

    #[test]
    fn test_object_name_lookup() {
        assert_eq!(light_feature().object_name(), Some("West Point Light"));
    }

    #[test]
    fn test_required_attributes_reported() {
        let feature = light_feature();
        let mut warnings = WarningCollector::new();
        validate_required_attributes(&feature, &["OBJNAM", "COLOUR"], &mut warnings).unwrap();
        let missing = warnings.by_code(codes::MISSING_REQUIRED_ATTR);
        assert_eq!(missing.len(), 1);
        assert!(missing[0].message.contains("COLOUR"));
        assert_eq!(missing[0].feature_id, Some(1));
    }
}
