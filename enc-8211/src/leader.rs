use crate::error::{ReadError, ReadErrorKind, Result};
use log::trace;

/// Fixed size of every ISO 8211 record leader.
pub const LEADER_LEN: usize = 24;

/// ISO 8211 record leader (24 bytes fixed length)
///
/// The leader carries the record length, the base address of the field
/// area, and the entry map that sizes the directory entries.
#[derive(Debug, Clone)]
pub struct Leader {
    /// Total length of the record in bytes (positions 0-4)
    pub record_length: u32,
    /// Interchange level (position 5)
    pub interchange_level: char,
    /// Leader identifier: 'L' for DDR, 'D' for DR (position 6)
    pub leader_identifier: char,
    /// Inline code extension indicator (position 7)
    pub inline_code_extension: char,
    /// Version number (position 8)
    pub version_number: char,
    /// Application indicator (position 9)
    pub application_indicator: char,
    /// Field control length (positions 10-11)
    pub field_control_length: String,
    /// Base address of the field area (positions 12-16)
    pub base_address: u32,
    /// Extended character set indicator (positions 17-19)
    pub extended_character_set: String,
    /// Entry map: size of the field length part (position 20)
    pub field_length_size: u8,
    /// Entry map: size of the field position part (position 21)
    pub field_position_size: u8,
    /// Entry map: reserved (position 22)
    pub reserved: char,
    /// Entry map: size of the field tag (position 23)
    pub field_tag_size: u8,
}

/// Parse a run of ASCII decimal digits (spaces tolerated at either end).
pub(crate) fn parse_decimal(data: &[u8]) -> Option<u32> {
    let text = std::str::from_utf8(data).ok()?;
    text.trim().parse().ok()
}

impl Leader {
    /// Parse a 24-byte leader.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < LEADER_LEN {
            return Err(ReadError::at(
                ReadErrorKind::InvalidLeader(format!(
                    "leader must be {} bytes, got {}",
                    LEADER_LEN,
                    data.len()
                )),
                0,
            ));
        }

        // Record length (bytes 0-4) - ASCII decimal number
        let record_length = parse_decimal(&data[0..5]).ok_or_else(|| {
            ReadError::at(
                ReadErrorKind::InvalidLeader(format!(
                    "unreadable record length: {:?}",
                    &data[0..5]
                )),
                0,
            )
        })?;

        let interchange_level = data[5] as char;
        let leader_identifier = data[6] as char;
        let inline_code_extension = data[7] as char;
        let version_number = data[8] as char;
        let application_indicator = data[9] as char;

        let field_control_length = std::str::from_utf8(&data[10..12])
            .map_err(|e| ReadError::at(ReadErrorKind::from(e), 10))?
            .to_string();

        // Base address of field area (bytes 12-16) - ASCII decimal number
        let base_address = parse_decimal(&data[12..17]).ok_or_else(|| {
            ReadError::at(
                ReadErrorKind::InvalidBaseAddress(format!(
                    "unreadable base address: {:?}",
                    &data[12..17]
                )),
                12,
            )
        })?;

        let extended_character_set = std::str::from_utf8(&data[17..20])
            .map_err(|e| ReadError::at(ReadErrorKind::from(e), 17))?
            .to_string();

        // Entry map (bytes 20-23): four single digits
        let digit = |index: usize| -> Result<u8> {
            (data[index] as char)
                .to_digit(10)
                .map(|d| d as u8)
                .ok_or_else(|| {
                    ReadError::at(
                        ReadErrorKind::InvalidLeader(format!(
                            "entry map position {} is not a digit",
                            index
                        )),
                        index,
                    )
                })
        };
        let field_length_size = digit(20)?;
        let field_position_size = digit(21)?;
        let reserved = data[22] as char;
        let field_tag_size = digit(23)?;

        trace!(
            "parsed leader: length={}, type={}, base_addr={}",
            record_length,
            leader_identifier,
            base_address
        );

        Ok(Leader {
            record_length,
            interchange_level,
            leader_identifier,
            inline_code_extension,
            version_number,
            application_indicator,
            field_control_length,
            base_address,
            extended_character_set,
            field_length_size,
            field_position_size,
            reserved,
            field_tag_size,
        })
    }

    /// Check if this is a Data Descriptive Record (DDR)
    pub fn is_ddr(&self) -> bool {
        self.leader_identifier == 'L'
    }

    /// Check if this is a Data Record (DR)
    pub fn is_dr(&self) -> bool {
        self.leader_identifier == 'D'
    }

    /// Size of one directory entry in bytes, per the entry map.
    pub fn directory_entry_size(&self) -> usize {
        self.field_tag_size as usize
            + self.field_length_size as usize
            + self.field_position_size as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ddr_leader() {
        // Positions: 0-4(5) | 5(1) | 6(1) | 7(1) | 8(1) | 9(1) | 10-11(2) | 12-16(5) | 17-19(3) | 20-23(4)
        let data = concat!(
            "01582", // Record length (5 bytes)
            "3",     // Interchange level (1 byte)
            "L",     // Leader identifier (1 byte)
            "E",     // Inline code extension (1 byte)
            "1",     // Version (1 byte)
            " ",     // Application indicator (1 byte)
            "09",    // Field control length (2 bytes)
            "00020", // Base address of field area (5 bytes)
            " ! ",   // Extended character set (3 bytes)
            "3404"   // Entry map (4 bytes)
        )
        .as_bytes();

        assert_eq!(data.len(), 24, "leader must be exactly 24 bytes");
        let leader = Leader::parse(data).unwrap();

        assert_eq!(leader.record_length, 1582);
        assert_eq!(leader.interchange_level, '3');
        assert!(leader.is_ddr());
        assert_eq!(leader.base_address, 20);
        assert_eq!(leader.field_tag_size, 4);
        assert_eq!(leader.directory_entry_size(), 11);
    }

    #[test]
    fn test_parse_dr_leader() {
        let data = concat!(
            "00321", // Record length
            " ", "D", " ", " ", " ", // level, id, extension, version, app
            "  ",    // Field control length
            "00065", // Base address
            "   ",   // Charset
            "3404"   // Entry map
        )
        .as_bytes();

        assert_eq!(data.len(), 24);
        let leader = Leader::parse(data).unwrap();
        assert_eq!(leader.record_length, 321);
        assert!(leader.is_dr());
    }

    #[test]
    fn test_garbage_record_length_rejected() {
        let mut data = *b"0158 3LE1 0900020 ! 3404";
        data[0..5].copy_from_slice(b"\xff\xff\xff\xff\xff");
        let err = Leader::parse(&data).unwrap_err();
        assert!(matches!(err.kind, ReadErrorKind::InvalidLeader(_)));
    }

    #[test]
    fn test_garbage_base_address_rejected() {
        let data = b"015823LE1 09abcde ! 3404";
        let err = Leader::parse(data).unwrap_err();
        assert!(matches!(err.kind, ReadErrorKind::InvalidBaseAddress(_)));
    }

    #[test]
    fn test_short_leader_rejected() {
        let err = Leader::parse(b"0158").unwrap_err();
        assert!(matches!(err.kind, ReadErrorKind::InvalidLeader(_)));
    }
}
