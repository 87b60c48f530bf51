use crate::error::{ReadError, ReadErrorKind, Result};
use crate::leader::{parse_decimal, Leader};
use log::trace;

/// Field terminator byte (ASCII 30, 1/14).
pub const FIELD_TERMINATOR: u8 = 0x1E;
/// Unit (subfield) terminator byte (ASCII 31, 1/15).
pub const UNIT_TERMINATOR: u8 = 0x1F;

/// ISO 8211 directory
///
/// Maps field tags to their positions and lengths in the field area.
/// The directory occupies the bytes between the leader and the base
/// address and ends with a field terminator.
#[derive(Debug, Clone)]
pub struct Directory {
    pub entries: Vec<DirectoryEntry>,
}

/// A single directory entry
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Field tag (4 characters for S-57)
    pub tag: String,
    /// Length of the field in bytes
    pub length: u32,
    /// Position of the field relative to the start of the field area
    pub position: u32,
}

impl Directory {
    /// Parse the directory from the bytes between leader and field area.
    ///
    /// The terminator must appear before the data runs out; entries after
    /// it are never read. A missing terminator or an undecodable entry is
    /// an error; the caller downgrades it to a `DIR_TRUNCATED` warning
    /// and skips the record.
    pub fn parse(data: &[u8], leader: &Leader, base_offset: usize) -> Result<Self> {
        let mut entries = Vec::new();
        let entry_size = leader.directory_entry_size();
        let mut offset = 0;
        let mut terminated = false;

        while offset < data.len() {
            if data[offset] == FIELD_TERMINATOR {
                terminated = true;
                break;
            }

            if offset + entry_size > data.len() {
                return Err(ReadError::at(
                    ReadErrorKind::InvalidDirectory(format!(
                        "not enough data for directory entry at offset {}",
                        offset
                    )),
                    base_offset + offset,
                ));
            }

            let entry_data = &data[offset..offset + entry_size];
            let entry = DirectoryEntry::parse(entry_data, leader, base_offset + offset)?;
            entries.push(entry);

            offset += entry_size;
        }

        if !terminated {
            return Err(ReadError::at(
                ReadErrorKind::InvalidDirectory(
                    "directory ended without field terminator".to_string(),
                ),
                base_offset + offset,
            ));
        }

        trace!("parsed {} directory entries", entries.len());
        Ok(Directory { entries })
    }
}

impl DirectoryEntry {
    /// Parse a single directory entry
    fn parse(data: &[u8], leader: &Leader, base_offset: usize) -> Result<Self> {
        let tag_size = leader.field_tag_size as usize;
        let length_size = leader.field_length_size as usize;

        let tag = std::str::from_utf8(&data[..tag_size])
            .map_err(|e| ReadError::at(ReadErrorKind::from(e), base_offset))?
            .to_string();

        let length_data = &data[tag_size..tag_size + length_size];
        let length = parse_decimal(length_data).ok_or_else(|| {
            ReadError::at(
                ReadErrorKind::InvalidDirectory(format!(
                    "invalid field length: {:?}",
                    length_data
                )),
                base_offset + tag_size,
            )
        })?;

        let position_data = &data[tag_size + length_size..];
        let position = parse_decimal(position_data).ok_or_else(|| {
            ReadError::at(
                ReadErrorKind::InvalidDirectory(format!(
                    "invalid field position: {:?}",
                    position_data
                )),
                base_offset + tag_size + length_size,
            )
        })?;

        trace!(
            "parsed directory entry: tag={}, length={}, position={}",
            tag,
            length,
            position
        );

        Ok(DirectoryEntry {
            tag,
            length,
            position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_leader() -> Leader {
        let data = concat!("01582", "3", "L", "E", "1", " ", "09", "00020", " ! ", "3404").as_bytes();
        Leader::parse(data).unwrap()
    }

    #[test]
    fn test_parse_directory_entry() {
        let leader = test_leader();

        // tag=DSID (4), length=165 (3), position=0170 (4), terminator
        let mut data = b"DSID1650170".to_vec();
        data.push(FIELD_TERMINATOR);

        let directory = Directory::parse(&data, &leader, 24).unwrap();
        assert_eq!(directory.entries.len(), 1);
        assert_eq!(directory.entries[0].tag, "DSID");
        assert_eq!(directory.entries[0].length, 165);
        assert_eq!(directory.entries[0].position, 170);
    }

    #[test]
    fn test_parse_multiple_entries() {
        let leader = test_leader();
        let mut data = b"FRID0150000ATTF0220015".to_vec();
        data.push(FIELD_TERMINATOR);

        let directory = Directory::parse(&data, &leader, 24).unwrap();
        assert_eq!(directory.entries.len(), 2);
        assert_eq!(directory.entries[1].tag, "ATTF");
        assert_eq!(directory.entries[1].position, 15);
    }

    #[test]
    fn test_missing_terminator_is_error() {
        let leader = test_leader();
        let data = b"DSID1650170";
        let err = Directory::parse(data, &leader, 24).unwrap_err();
        assert!(matches!(err.kind, ReadErrorKind::InvalidDirectory(_)));
    }

    #[test]
    fn test_partial_entry_is_error() {
        let leader = test_leader();
        let data = b"DSID165";
        assert!(Directory::parse(data, &leader, 24).is_err());
    }
}
