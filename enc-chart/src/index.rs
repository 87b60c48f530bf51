//! Bounds-based feature lookup with combined filters.

use crate::feature::{Feature, Position};
use log::trace;

/// Query bounds in decimal degrees. `north >= south`, `east >= west`;
/// no wraparound handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, position: &Position) -> bool {
        position.lat <= self.north
            && position.lat >= self.south
            && position.lon <= self.east
            && position.lon >= self.west
    }
}

/// Combined feature filters. All present filters must match (AND);
/// `limit` applies after filtering.
#[derive(Debug, Clone, Default)]
pub struct FeatureFilter {
    /// Acronyms to match (case-insensitive); empty means no type filter.
    pub types: Vec<String>,
    /// At least one feature coordinate must fall inside.
    pub bounds: Option<Bounds>,
    /// Case-insensitive substring of OBJNAM. Features without OBJNAM fail
    /// this filter (only when it is present).
    pub text_query: Option<String>,
    /// Cap on the result count, applied after all filters.
    pub limit: Option<usize>,
}

impl FeatureFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_text_query(mut self, query: impl Into<String>) -> Self {
        self.text_query = Some(query.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// In-memory feature index.
///
/// Features are held sorted by record id, so identical queries on the
/// same dataset return identical sequences.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    features: Vec<Feature>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add features to the index (re-sorting by record id).
    pub fn add_features(&mut self, features: impl IntoIterator<Item = Feature>) {
        self.features.extend(features);
        self.features.sort_by_key(|f| f.record_id);
    }

    /// All indexed features, record-id ascending.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features with at least one coordinate inside `bounds` (inclusive).
    pub fn query_bounds(&self, bounds: &Bounds) -> Vec<&Feature> {
        self.find_features(&FeatureFilter::new().with_bounds(*bounds))
    }

    /// Features matching every present filter, record-id ascending.
    pub fn find_features(&self, filter: &FeatureFilter) -> Vec<&Feature> {
        let query_lower = filter.text_query.as_ref().map(|q| q.to_lowercase());

        let mut matches: Vec<&Feature> = self
            .features
            .iter()
            .filter(|feature| {
                if !filter.types.is_empty()
                    && !filter
                        .types
                        .iter()
                        .any(|t| t.eq_ignore_ascii_case(&feature.feature_type.acronym))
                {
                    return false;
                }
                if let Some(bounds) = &filter.bounds {
                    if !feature.coordinates.iter().any(|c| bounds.contains(c)) {
                        return false;
                    }
                }
                if let Some(query) = &query_lower {
                    match feature.object_name() {
                        Some(name) => {
                            if !name.to_lowercase().contains(query) {
                                return false;
                            }
                        }
                        None => return false,
                    }
                }
                true
            })
            .collect();

        if let Some(limit) = filter.limit {
            matches.truncate(limit);
        }

        trace!("query matched {} features", matches.len());
        matches
    }
}
