//! Sequential update application.
//!
//! Update cells arrive as `<CELL>.001`, `<CELL>.002`, ... and must be
//! applied in order with no gaps. Application is derived-copy: the base
//! dataset is never mutated, and a fatal error leaves it untouched.

use crate::error::ChartError;
use crate::feature::Feature;
use crate::fields::{parse_dspm, parse_frid, RUIN_DELETE, RUIN_MODIFY};
use crate::index::SpatialIndex;
use crate::parser::{build_feature, decode_vector_record, finalize_feature, VectorPayload};
use crate::primitives::PrimitiveStore;
use crate::ParsedData;
use enc_8211::Iso8211Reader;
use enc_catalogue::{Catalogue, CatalogueSession};
use enc_diagnostics::{codes, ParseWarning, StrictModeViolation, WarningCollector};
use log::{debug, info, warn};
use thiserror::Error;

/// One update file, read by the host and handed over as bytes.
#[derive(Debug, Clone)]
pub struct UpdateFile {
    /// Filename, ending in the zero-padded `.NNN` sequence number.
    pub name: String,
    /// Complete file contents.
    pub data: Vec<u8>,
}

impl UpdateFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Counts of applied update operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpdateSummary {
    /// Update files applied.
    pub applied: usize,
    /// Records inserted.
    pub inserted: usize,
    /// Records modified.
    pub modified: usize,
    /// Records deleted.
    pub deleted: usize,
}

/// The derived dataset plus the operation counts.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub data: ParsedData,
    pub summary: UpdateSummary,
}

/// Fatal update failures.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Gap in update sequence: expected .{expected:03}, found .{found:03}")]
    SequenceGap { expected: u32, found: u32 },

    #[error("update filename {name:?} has no numeric .NNN suffix")]
    BadFilename { name: String },

    #[error(transparent)]
    Parse(#[from] ChartError),

    #[error(transparent)]
    Strict(#[from] StrictModeViolation),
}

/// Applies numbered update files to a parsed base cell.
#[derive(Debug)]
pub struct UpdateProcessor<'a> {
    catalogue: &'a Catalogue,
}

impl<'a> UpdateProcessor<'a> {
    pub fn new(catalogue: &'a Catalogue) -> Self {
        Self { catalogue }
    }

    /// Apply `files` to `base` in sequence-number order.
    ///
    /// Validation happens before any application: a gap in the sorted
    /// sequence or an unparsable filename fails without touching
    /// anything. An empty file list succeeds trivially.
    pub fn apply_sequential_updates(
        &self,
        base: &ParsedData,
        cell_name: &str,
        files: &[UpdateFile],
    ) -> Result<UpdateOutcome, UpdateError> {
        let mut ordered: Vec<(u32, &UpdateFile)> = files
            .iter()
            .map(|file| Ok((update_sequence_number(&file.name)?, file)))
            .collect::<Result<_, UpdateError>>()?;
        ordered.sort_by_key(|(number, _)| *number);

        for pair in ordered.windows(2) {
            let expected = pair[0].0 + 1;
            let found = pair[1].0;
            if found != expected {
                return Err(UpdateError::SequenceGap { expected, found });
            }
        }

        let mut features: Vec<Feature> = base.features().to_vec();
        let mut store = base.primitives.clone();
        let mut metadata = base.metadata.clone();
        let mut warnings = WarningCollector::new();
        let mut summary = UpdateSummary::default();
        let mut session = CatalogueSession::new(self.catalogue);

        for (number, file) in &ordered {
            if !file.name.to_uppercase().starts_with(&cell_name.to_uppercase()) {
                warn!(
                    "update file {} does not match cell {}",
                    file.name, cell_name
                );
            }
            debug!("applying update {} ({})", number, file.name);
            self.apply_file(
                file,
                &mut features,
                &mut store,
                metadata.comf,
                &mut session,
                &mut warnings,
                &mut summary,
            )?;
            metadata.update_number = *number;
            summary.applied += 1;
        }

        info!(
            "applied {} updates to {}: +{} ~{} -{}",
            summary.applied, cell_name, summary.inserted, summary.modified, summary.deleted
        );

        let mut index = SpatialIndex::new();
        index.add_features(features);

        let mut all_warnings = base.warnings.clone();
        all_warnings.extend(warnings.into_warnings());

        Ok(UpdateOutcome {
            data: ParsedData {
                metadata,
                index,
                primitives: store,
                warnings: all_warnings,
            },
            summary,
        })
    }

    /// Apply one update file. Vector records first, so feature geometry
    /// in the same file resolves against the updated store.
    #[allow(clippy::too_many_arguments)]
    fn apply_file(
        &self,
        file: &UpdateFile,
        features: &mut Vec<Feature>,
        store: &mut PrimitiveStore,
        base_comf: f64,
        session: &mut CatalogueSession<'_>,
        warnings: &mut WarningCollector,
        summary: &mut UpdateSummary,
    ) -> Result<(), UpdateError> {
        let mut reader = Iso8211Reader::new(&file.data);
        let records = reader.read_all(warnings).map_err(ChartError::from)?;

        // The update may re-declare scaling; otherwise the base's applies.
        let comf = records
            .iter()
            .filter_map(|r| r.field("DSPM"))
            .filter_map(parse_dspm)
            .map(|dspm| dspm.comf)
            .next_back()
            .unwrap_or(base_comf);

        for record in &records {
            if !record.has_field("VRID") {
                continue;
            }
            let Some((vrid, payload)) = decode_vector_record(record, comf, warnings)? else {
                continue;
            };
            match vrid.update_instruction {
                RUIN_DELETE => {
                    let removed = if vrid.is_edge() {
                        store.remove_edge(vrid.record_id)
                    } else {
                        store.remove_node(vrid.record_id)
                    };
                    if removed {
                        summary.deleted += 1;
                    } else {
                        warnings.warn(
                            ParseWarning::warning(
                                codes::UPDATE_TARGET_MISSING,
                                format!(
                                    "delete of absent vector {} ignored",
                                    vrid.record_id
                                ),
                            )
                            .with_record(record.sequence),
                        )?;
                    }
                }
                RUIN_MODIFY => {
                    let existed = if vrid.is_edge() {
                        store.remove_edge(vrid.record_id)
                    } else {
                        store.remove_node(vrid.record_id)
                    };
                    if !existed {
                        warnings.warn(
                            ParseWarning::warning(
                                codes::UPDATE_TARGET_MISSING,
                                format!(
                                    "modify of absent vector {} ignored",
                                    vrid.record_id
                                ),
                            )
                            .with_record(record.sequence),
                        )?;
                        continue;
                    }
                    if let Some(payload) = payload {
                        apply_vector(store, payload);
                        summary.modified += 1;
                    }
                }
                _ => {
                    if let Some(payload) = payload {
                        apply_vector(store, payload);
                        summary.inserted += 1;
                    }
                }
            }
        }

        for record in &records {
            let Some(field) = record.field("FRID") else {
                continue;
            };
            let Some(frid) = parse_frid(field) else {
                // build_feature would re-report; one warning is enough.
                warnings.warn(
                    ParseWarning::warning(
                        codes::SUBFIELD_PARSE,
                        "FRID field could not be decoded",
                    )
                    .with_record(record.sequence),
                )?;
                continue;
            };

            if frid.update_instruction == RUIN_DELETE {
                let before = features.len();
                features.retain(|f| f.record_id != frid.record_id);
                if features.len() < before {
                    summary.deleted += 1;
                } else {
                    warnings.warn(
                        ParseWarning::warning(
                            codes::UPDATE_TARGET_MISSING,
                            format!("delete of absent feature {} ignored", frid.record_id),
                        )
                        .with_record(record.sequence),
                    )?;
                }
                continue;
            }

            let Some(pending) = build_feature(record, comf, session, warnings)? else {
                continue;
            };
            let feature = finalize_feature(pending, store, warnings)?;
            let existing = features.iter().position(|f| f.record_id == feature.record_id);

            match (frid.update_instruction, existing) {
                (RUIN_MODIFY, Some(position)) => {
                    features[position] = feature;
                    summary.modified += 1;
                }
                (RUIN_MODIFY, None) => {
                    warnings.warn(
                        ParseWarning::warning(
                            codes::UPDATE_TARGET_MISSING,
                            format!("modify of absent feature {} ignored", feature.record_id),
                        )
                        .with_record(record.sequence),
                    )?;
                }
                (_, Some(position)) => {
                    // Insert over an existing record: last write wins.
                    features[position] = feature;
                    summary.inserted += 1;
                }
                (_, None) => {
                    features.push(feature);
                    summary.inserted += 1;
                }
            }
        }

        Ok(())
    }
}

fn apply_vector(store: &mut PrimitiveStore, payload: VectorPayload) {
    match payload {
        VectorPayload::Node(node) => store.add_node(node),
        VectorPayload::Edge(edge) => store.add_edge(edge),
    }
}

/// Numeric suffix of an update filename (`CELL.002` yields 2).
fn update_sequence_number(name: &str) -> Result<u32, UpdateError> {
    name.rsplit_once('.')
        .and_then(|(_, suffix)| suffix.parse::<u32>().ok())
        .ok_or_else(|| UpdateError::BadFilename {
            name: name.to_string(),
        })
}
