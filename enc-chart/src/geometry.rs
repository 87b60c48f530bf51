//! Geometry assembly and validation.
//!
//! The assembler resolves spatial pointers against the primitive store
//! into point/line/area geometry, tolerating missing and degenerate
//! primitives with warnings and synthetic fallbacks. The validator checks
//! assembled rings for self-intersection.

use crate::feature::{Geometry, GeometryType, Position, SpatialPointer};
use crate::primitives::PrimitiveStore;
use enc_diagnostics::{codes, ParseWarning};
use log::trace;

/// Resolves pointer sequences into geometry.
///
/// Warnings accumulate in the assembler's own buffer so assembly can be
/// tested in isolation; the parser drains them with [`take_warnings`] and
/// merges them into the main collector.
///
/// [`take_warnings`]: GeometryAssembler::take_warnings
#[derive(Debug)]
pub struct GeometryAssembler<'a> {
    store: &'a PrimitiveStore,
    warnings: Vec<ParseWarning>,
}

impl<'a> GeometryAssembler<'a> {
    pub fn new(store: &'a PrimitiveStore) -> Self {
        Self {
            store,
            warnings: Vec::new(),
        }
    }

    /// Resolve `pointers` into a geometry.
    ///
    /// Never fails: unresolvable topology degrades to a synthetic point
    /// with a warning per defect.
    pub fn build_geometry(&mut self, pointers: &[SpatialPointer]) -> Geometry {
        if pointers.is_empty() {
            self.warnings.push(ParseWarning::warning(
                codes::EMPTY_POINTERS,
                "Empty spatial pointer list",
            ));
            return Geometry::point(Position::origin());
        }

        if pointers.len() == 1 && !pointers[0].is_edge {
            let id = pointers[0].ref_id;
            return match self.store.node(id) {
                Some(node) => Geometry::point(node.position()),
                None => {
                    self.warnings.push(ParseWarning::warning(
                        codes::MISSING_NODE,
                        format!("Missing node {id}"),
                    ));
                    Geometry::point(Position::origin())
                }
            };
        }

        let mut coordinates: Vec<Position> = Vec::new();
        for pointer in pointers {
            if pointer.is_edge {
                let edge = match self.store.edge(pointer.ref_id) {
                    Some(edge) => edge,
                    None => {
                        self.warnings.push(ParseWarning::warning(
                            codes::MISSING_EDGE,
                            format!("Missing edge {}", pointer.ref_id),
                        ));
                        continue;
                    }
                };
                if edge.is_degenerate() {
                    self.warnings.push(ParseWarning::warning(
                        codes::DEGENERATE_EDGE,
                        format!(
                            "Degenerate edge {} with {} nodes",
                            edge.id,
                            edge.nodes.len()
                        ),
                    ));
                    continue;
                }
                let mut points: Vec<Position> =
                    edge.nodes.iter().map(|n| n.position()).collect();
                if pointer.reverse {
                    points.reverse();
                }
                append_deduplicated(&mut coordinates, points);
            } else {
                match self.store.node(pointer.ref_id) {
                    Some(node) => {
                        append_deduplicated(&mut coordinates, vec![node.position()])
                    }
                    None => {
                        self.warnings.push(ParseWarning::warning(
                            codes::MISSING_NODE,
                            format!("Missing node {}", pointer.ref_id),
                        ));
                    }
                }
            }
        }

        trace!(
            "assembled {} coordinates from {} pointers",
            coordinates.len(),
            pointers.len()
        );

        match coordinates.len() {
            0 => Geometry::point(self.fallback_point(pointers)),
            1 => Geometry::point(coordinates[0]),
            _ if coordinates.first() == coordinates.last() => Geometry::area(vec![coordinates]),
            _ => Geometry::line(coordinates),
        }
    }

    /// When traversal produced nothing: the first node pointer that still
    /// resolves, else the origin.
    fn fallback_point(&self, pointers: &[SpatialPointer]) -> Position {
        pointers
            .iter()
            .filter(|p| !p.is_edge)
            .find_map(|p| self.store.node(p.ref_id).map(|n| n.position()))
            .unwrap_or_else(Position::origin)
    }

    /// Warnings buffered so far.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Drain the warning buffer.
    pub fn take_warnings(&mut self) -> Vec<ParseWarning> {
        std::mem::take(&mut self.warnings)
    }
}

/// Append `points`, dropping the head when it repeats the current tail
/// (the shared endpoint between consecutive edges).
fn append_deduplicated(coordinates: &mut Vec<Position>, points: Vec<Position>) {
    let mut iter = points.into_iter();
    if let Some(first) = iter.next() {
        if coordinates.last() != Some(&first) {
            coordinates.push(first);
        }
        coordinates.extend(iter);
    }
}

/// Options for geometry validation.
#[derive(Debug, Clone, Copy)]
pub struct ValidationOptions {
    /// Run the O(n²) self-intersection check per ring.
    pub check_self_intersection: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            check_self_intersection: true,
        }
    }
}

/// Outcome of validating one geometry.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub warnings: Vec<ParseWarning>,
}

/// Structural checks over assembled geometry.
#[derive(Debug)]
pub struct GeometryValidator;

impl GeometryValidator {
    /// Validate `geometry`, reporting one warning per self-intersecting
    /// ring when the check is enabled.
    pub fn validate(geometry: &Geometry, options: &ValidationOptions) -> ValidationResult {
        let mut warnings = Vec::new();

        if options.check_self_intersection {
            for (ring_index, ring) in geometry.rings.iter().enumerate() {
                if Self::detect_self_intersection(ring) {
                    warnings.push(
                        ParseWarning::warning(
                            codes::SELF_INTERSECTION,
                            format!("ring {ring_index} intersects itself"),
                        )
                        .with_context("ring", ring_index.to_string()),
                    );
                }
            }
        }

        ValidationResult {
            is_valid: warnings.is_empty(),
            warnings,
        }
    }

    /// Pairwise proper-crossing test over non-adjacent segments.
    ///
    /// Adjacent segments sharing an endpoint are not intersections, and
    /// neither is collinear overlap without a crossing. O(n²); fine for
    /// rings of up to a few hundred vertices.
    pub fn detect_self_intersection(ring: &[Position]) -> bool {
        if ring.len() < 4 {
            return false;
        }
        let closed = ring.first() == ring.last();
        let segment_count = ring.len() - 1;

        for i in 0..segment_count {
            for j in (i + 2)..segment_count {
                // In a closed ring the last segment wraps around to meet
                // the first; they are adjacent, not crossing.
                if closed && i == 0 && j == segment_count - 1 {
                    continue;
                }
                if segments_cross(ring[i], ring[i + 1], ring[j], ring[j + 1]) {
                    return true;
                }
            }
        }
        false
    }
}

/// Signed area of the triangle a-b-c; zero for collinear points.
fn orientation(a: Position, b: Position, c: Position) -> f64 {
    (b.lon - a.lon) * (c.lat - a.lat) - (b.lat - a.lat) * (c.lon - a.lon)
}

/// True only for a proper crossing: each segment's endpoints lie strictly
/// on opposite sides of the other. Touching endpoints and collinear
/// overlap both evaluate false.
fn segments_cross(p1: Position, q1: Position, p2: Position, q2: Position) -> bool {
    let d1 = orientation(p2, q2, p1);
    let d2 = orientation(p2, q2, q1);
    let d3 = orientation(p1, q1, p2);
    let d4 = orientation(p1, q1, q2);

    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Edge, Node};

    fn p(lat: f64, lon: f64) -> Position {
        Position::new(lat, lon)
    }

    fn store_with_line() -> PrimitiveStore {
        let mut store = PrimitiveStore::new();
        store.add_edge(Edge::new(
            1,
            vec![Node::new(0, 0.0, 0.0), Node::new(1, 10.0, 0.0)],
        ));
        store.add_edge(Edge::new(999, vec![]));
        store
    }

    #[test]
    fn test_empty_pointer_list_yields_origin_point() {
        let store = PrimitiveStore::new();
        let mut assembler = GeometryAssembler::new(&store);
        let geometry = assembler.build_geometry(&[]);

        assert_eq!(geometry.geometry_type, GeometryType::Point);
        assert_eq!(geometry.outer_ring(), &[Position::origin()]);
        assert_eq!(assembler.warnings()[0].code, codes::EMPTY_POINTERS);
        assert_eq!(assembler.warnings()[0].message, "Empty spatial pointer list");
    }

    #[test]
    fn test_single_node_pointer() {
        let mut store = PrimitiveStore::new();
        store.add_node(Node::new(5, -122.3, 47.6));
        let mut assembler = GeometryAssembler::new(&store);

        let geometry = assembler.build_geometry(&[SpatialPointer::node(5)]);
        assert_eq!(geometry.geometry_type, GeometryType::Point);
        assert_eq!(geometry.outer_ring()[0], p(47.6, -122.3));
        assert!(assembler.warnings().is_empty());
    }

    #[test]
    fn test_single_missing_node_falls_back_with_warning() {
        let store = PrimitiveStore::new();
        let mut assembler = GeometryAssembler::new(&store);
        let geometry = assembler.build_geometry(&[SpatialPointer::node(17)]);

        assert_eq!(geometry.outer_ring(), &[Position::origin()]);
        assert_eq!(assembler.warnings()[0].code, codes::MISSING_NODE);
        assert!(assembler.warnings()[0].message.contains("Missing node 17"));
    }

    #[test]
    fn test_degenerate_edge_skipped_line_assembled() {
        let store = store_with_line();
        let mut assembler = GeometryAssembler::new(&store);
        let geometry = assembler.build_geometry(&[
            SpatialPointer::edge(999, false),
            SpatialPointer::edge(1, false),
        ]);

        assert_eq!(geometry.geometry_type, GeometryType::Line);
        assert_eq!(geometry.outer_ring(), &[p(0.0, 0.0), p(0.0, 10.0)]);
        let messages: Vec<&str> = assembler
            .warnings()
            .iter()
            .map(|w| w.message.as_str())
            .collect();
        assert!(messages[0].contains("Degenerate edge 999"));
        assert!(messages[0].contains("0 nodes"));
    }

    #[test]
    fn test_missing_edge_skipped_with_warning() {
        let store = store_with_line();
        let mut assembler = GeometryAssembler::new(&store);
        let geometry = assembler.build_geometry(&[
            SpatialPointer::edge(404, false),
            SpatialPointer::edge(1, false),
        ]);

        assert_eq!(geometry.geometry_type, GeometryType::Line);
        assert_eq!(assembler.warnings()[0].code, codes::MISSING_EDGE);
        assert!(assembler.warnings()[0].message.contains("Missing edge 404"));
    }

    #[test]
    fn test_reverse_and_shared_endpoint_deduplication() {
        let mut store = PrimitiveStore::new();
        store.add_edge(Edge::new(
            1,
            vec![Node::new(0, 0.0, 0.0), Node::new(1, 5.0, 0.0)],
        ));
        store.add_edge(Edge::new(
            2,
            vec![Node::new(0, 5.0, 5.0), Node::new(1, 5.0, 0.0)],
        ));
        let mut assembler = GeometryAssembler::new(&store);

        // Edge 2 reversed starts at (0, 5) = edge 1's tail, so the shared
        // endpoint appears once.
        let geometry = assembler.build_geometry(&[
            SpatialPointer::edge(1, false),
            SpatialPointer::edge(2, true),
        ]);

        assert_eq!(geometry.geometry_type, GeometryType::Line);
        assert_eq!(
            geometry.outer_ring(),
            &[p(0.0, 0.0), p(0.0, 5.0), p(5.0, 5.0)]
        );
        assert!(assembler.warnings().is_empty());
    }

    #[test]
    fn test_closed_chain_classified_as_area() {
        let mut store = PrimitiveStore::new();
        store.add_edge(Edge::new(
            1,
            vec![
                Node::new(0, 0.0, 0.0),
                Node::new(1, 1.0, 0.0),
                Node::new(2, 1.0, 1.0),
            ],
        ));
        store.add_edge(Edge::new(
            2,
            vec![
                Node::new(0, 1.0, 1.0),
                Node::new(1, 0.0, 1.0),
                Node::new(2, 0.0, 0.0),
            ],
        ));
        let mut assembler = GeometryAssembler::new(&store);

        let geometry = assembler.build_geometry(&[
            SpatialPointer::edge(1, false),
            SpatialPointer::edge(2, false),
        ]);

        assert_eq!(geometry.geometry_type, GeometryType::Area);
        let ring = geometry.outer_ring();
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring.len(), 5);
    }

    #[test]
    fn test_all_pointers_unresolvable_falls_back_to_origin() {
        let store = PrimitiveStore::new();
        let mut assembler = GeometryAssembler::new(&store);
        let geometry = assembler.build_geometry(&[
            SpatialPointer::edge(1, false),
            SpatialPointer::edge(2, false),
        ]);
        assert_eq!(geometry.geometry_type, GeometryType::Point);
        assert_eq!(geometry.outer_ring(), &[Position::origin()]);
        assert_eq!(assembler.warnings().len(), 2);
    }

    #[test]
    fn test_bow_tie_self_intersects() {
        let ring = vec![
            p(0.0, 0.0),
            p(2.0, 2.0),
            p(2.0, 0.0),
            p(0.0, 2.0),
            p(0.0, 0.0),
        ];
        assert!(GeometryValidator::detect_self_intersection(&ring));
    }

    #[test]
    fn test_simple_square_does_not_self_intersect() {
        let ring = vec![
            p(0.0, 0.0),
            p(0.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 0.0),
            p(0.0, 0.0),
        ];
        assert!(!GeometryValidator::detect_self_intersection(&ring));
    }

    #[test]
    fn test_collinear_vertices_do_not_self_intersect() {
        // Square with an extra vertex in the middle of the bottom edge.
        let ring = vec![
            p(0.0, 0.0),
            p(0.0, 0.5),
            p(0.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 0.0),
            p(0.0, 0.0),
        ];
        assert!(!GeometryValidator::detect_self_intersection(&ring));
    }

    #[test]
    fn test_validate_reports_ring_context() {
        let bow_tie = Geometry::area(vec![vec![
            p(0.0, 0.0),
            p(2.0, 2.0),
            p(0.0, 2.0),
            p(2.0, 0.0),
            p(0.0, 0.0),
        ]]);
        let result =
            GeometryValidator::validate(&bow_tie, &ValidationOptions::default());
        assert!(!result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, codes::SELF_INTERSECTION);
        let context = result.warnings[0].context.as_ref().unwrap();
        assert_eq!(context.get("ring").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let bow_tie = Geometry::area(vec![vec![
            p(0.0, 0.0),
            p(2.0, 2.0),
            p(0.0, 2.0),
            p(2.0, 0.0),
            p(0.0, 0.0),
        ]]);
        let result = GeometryValidator::validate(
            &bow_tie,
            &ValidationOptions {
                check_self_intersection: false,
            },
        );
        assert!(result.is_valid);
    }
}
