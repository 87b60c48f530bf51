//! Streaming ISO 8211 record reader.
//!
//! Records are pulled one at a time over a held byte buffer. Malformed
//! records are reported to the warning collector and skipped; only a
//! truncated buffer (bytes that cannot belong to any record) is fatal.

use crate::directory::Directory;
use crate::error::{ReadError, ReadErrorKind, Result};
use crate::field::Field;
use crate::leader::{parse_decimal, Leader, LEADER_LEN};
use enc_diagnostics::{codes, ParseWarning, WarningCollector};
use log::{debug, trace};

/// ISO 8211 logical record
#[derive(Debug)]
pub struct Record {
    /// Zero-based ordinal of the record within the file.
    pub sequence: u32,
    pub leader: Leader,
    pub directory: Directory,
    pub fields: Vec<Field>,
}

impl Record {
    /// First field with the given tag, if present.
    pub fn field(&self, tag: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.is_tag(tag))
    }

    /// Whether any field carries the given tag.
    pub fn has_field(&self, tag: &str) -> bool {
        self.field(tag).is_some()
    }
}

/// Streaming reader over a complete in-memory ISO 8211 file.
///
/// The reader is a lazy finite sequence: each call to [`next_record`]
/// decodes at most one record. Cancellation by the host is therefore
/// possible between records. Callers needing random access use
/// [`read_all`].
///
/// [`next_record`]: Iso8211Reader::next_record
/// [`read_all`]: Iso8211Reader::read_all
#[derive(Debug)]
pub struct Iso8211Reader<'a> {
    data: &'a [u8],
    offset: usize,
    sequence: u32,
    stopped: bool,
}

impl<'a> Iso8211Reader<'a> {
    /// Create a reader over the full file buffer.
    pub fn new(data: &'a [u8]) -> Self {
        debug!("opening ISO 8211 buffer, {} bytes", data.len());
        Self {
            data,
            offset: 0,
            sequence: 0,
            stopped: false,
        }
    }

    /// Current byte offset into the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Decode the next record.
    ///
    /// Returns `Ok(None)` at end of input. Structural defects inside a
    /// record are reported to `warnings` and the record is skipped; the
    /// next call continues at the following record. A buffer that ends
    /// mid-record is fatal.
    pub fn next_record(
        &mut self,
        warnings: &mut WarningCollector,
    ) -> Result<Option<Record>> {
        loop {
            if self.stopped || self.offset >= self.data.len() {
                return Ok(None);
            }

            let remaining = &self.data[self.offset..];
            if remaining.len() < LEADER_LEN {
                // Bytes that cannot hold even a leader: truncated buffer.
                return Err(ReadError::at(ReadErrorKind::UnexpectedEof, self.offset));
            }

            let sequence = self.sequence;
            self.sequence += 1;

            // Record length first: without it there is no record boundary
            // to resynchronize on, so a bad value ends the scan.
            let record_length = match parse_decimal(&remaining[0..5]) {
                Some(len) if len as usize >= LEADER_LEN => len as usize,
                _ => {
                    warnings.warn(
                        ParseWarning::warning(
                            codes::LEADER_LEN_MISMATCH,
                            format!(
                                "unreadable record length at offset {}; remaining {} bytes ignored",
                                self.offset,
                                remaining.len()
                            ),
                        )
                        .with_record(sequence),
                    )?;
                    self.stopped = true;
                    return Ok(None);
                }
            };

            if record_length > remaining.len() {
                return Err(ReadError::at(
                    ReadErrorKind::RecordTooLarge {
                        record_length,
                        available: remaining.len(),
                    },
                    self.offset,
                ));
            }

            let record_data = &remaining[..record_length];
            let record_offset = self.offset;
            self.offset += record_length;

            trace!("record {} at offset {}", sequence, record_offset);

            let leader = match Leader::parse(&record_data[..LEADER_LEN]) {
                Ok(leader) => leader,
                Err(err) => {
                    let code = match err.kind {
                        ReadErrorKind::InvalidBaseAddress(_) => codes::BAD_BASE_ADDR,
                        _ => codes::LEADER_LEN_MISMATCH,
                    };
                    warnings.warn(
                        ParseWarning::warning(
                            code,
                            format!("record {}: {}", sequence, err),
                        )
                        .with_record(sequence),
                    )?;
                    continue;
                }
            };

            // The leader re-reads the record length; disagreement with the
            // length used to frame the record means a corrupt leader.
            if leader.record_length as usize != record_length {
                warnings.warn(
                    ParseWarning::warning(
                        codes::LEADER_LEN_MISMATCH,
                        format!(
                            "record {}: leader length {} disagrees with framed length {}",
                            sequence, leader.record_length, record_length
                        ),
                    )
                    .with_record(sequence),
                )?;
                continue;
            }

            let base_address = leader.base_address as usize;
            if base_address < LEADER_LEN || base_address > record_length {
                warnings.warn(
                    ParseWarning::warning(
                        codes::BAD_BASE_ADDR,
                        format!(
                            "record {}: base address {} outside record of {} bytes",
                            sequence, base_address, record_length
                        ),
                    )
                    .with_record(sequence),
                )?;
                continue;
            }

            let directory_data = &record_data[LEADER_LEN..base_address];
            let directory =
                match Directory::parse(directory_data, &leader, record_offset + LEADER_LEN) {
                    Ok(directory) => directory,
                    Err(err) => {
                        warnings.warn(
                            ParseWarning::warning(
                                codes::DIR_TRUNCATED,
                                format!("record {}: {}", sequence, err),
                            )
                            .with_record(sequence),
                        )?;
                        continue;
                    }
                };

            let field_area = &record_data[base_address..];
            let mut fields = Vec::with_capacity(directory.entries.len());
            for entry in &directory.entries {
                let start = entry.position as usize;
                let length = entry.length as usize;
                match start.checked_add(length) {
                    Some(end) if end <= field_area.len() => {
                        fields.push(Field::new(
                            entry.tag.clone(),
                            field_area[start..end].to_vec(),
                        ));
                    }
                    _ => {
                        warnings.warn(
                            ParseWarning::warning(
                                codes::FIELD_BOUNDS,
                                format!(
                                    "record {}: field {} at {}+{} overruns {}-byte field area",
                                    sequence,
                                    entry.tag,
                                    start,
                                    length,
                                    field_area.len()
                                ),
                            )
                            .with_record(sequence),
                        )?;
                    }
                }
            }

            debug!(
                "parsed record {}: {} fields, {} bytes",
                sequence,
                fields.len(),
                record_length
            );

            return Ok(Some(Record {
                sequence,
                leader,
                directory,
                fields,
            }));
        }
    }

    /// Materialize every remaining record.
    pub fn read_all(&mut self, warnings: &mut WarningCollector) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record(warnings)? {
            records.push(record);
        }
        Ok(records)
    }
}
