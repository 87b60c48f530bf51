//! S-57 field decoding.
//!
//! Each S-57 tag has a fixed subfield layout: binary values are
//! little-endian, ASCII values run to the next unit terminator (0x1F),
//! and the field ends at the field terminator (0x1E). Repeating groups
//! repeat the layout until the terminator.

use crate::feature::SpatialPointer;
use enc_8211::{Field, FIELD_TERMINATOR, UNIT_TERMINATOR};

/// RCNM: dataset general information record.
pub const RCNM_DATASET: u8 = 10;
/// RCNM: dataset parameter record.
pub const RCNM_PARAMS: u8 = 20;
/// RCNM: feature record.
pub const RCNM_FEATURE: u8 = 100;
/// RCNM: isolated node.
pub const RCNM_ISOLATED_NODE: u8 = 110;
/// RCNM: connected node.
pub const RCNM_CONNECTED_NODE: u8 = 120;
/// RCNM: edge.
pub const RCNM_EDGE: u8 = 130;

/// PRIM: point primitive.
pub const PRIM_POINT: u8 = 1;
/// PRIM: line primitive.
pub const PRIM_LINE: u8 = 2;
/// PRIM: area primitive.
pub const PRIM_AREA: u8 = 3;
/// PRIM: non-spatial.
pub const PRIM_NONE: u8 = 255;

/// RUIN: insert the record.
pub const RUIN_INSERT: u8 = 1;
/// RUIN: modify the record in place.
pub const RUIN_MODIFY: u8 = 2;
/// RUIN: delete the record.
pub const RUIN_DELETE: u8 = 3;

/// ORNT: traverse the edge reversed.
pub const ORNT_REVERSE: u8 = 2;

/// Sequential reader over a field payload.
///
/// Every accessor returns `None` on underrun so callers can surface one
/// `SUBFIELD_PARSE` warning for the whole field.
struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// True once only the field terminator (or nothing) remains.
    fn at_end(&self) -> bool {
        self.pos >= self.data.len() || self.data[self.pos] == FIELD_TERMINATOR
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        if end > self.data.len() {
            return None;
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Some(slice)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u16_le(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32_le(&mut self) -> Option<u32> {
        self.take(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32_le(&mut self) -> Option<i32> {
        self.take(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// ASCII run up to the next unit or field terminator; consumes a
    /// trailing unit terminator. Trailing spaces are trimmed.
    fn text(&mut self) -> Option<String> {
        let start = self.pos;
        while self.pos < self.data.len()
            && self.data[self.pos] != UNIT_TERMINATOR
            && self.data[self.pos] != FIELD_TERMINATOR
        {
            self.pos += 1;
        }
        let raw = &self.data[start..self.pos];
        if self.pos < self.data.len() && self.data[self.pos] == UNIT_TERMINATOR {
            self.pos += 1;
        }
        std::str::from_utf8(raw).ok().map(|s| s.trim_end().to_string())
    }

    /// Fixed-width ASCII run, trimmed of surrounding spaces.
    fn text_fixed(&mut self, len: usize) -> Option<String> {
        let raw = self.take(len)?;
        std::str::from_utf8(raw).ok().map(|s| s.trim().to_string())
    }
}

/// Decoded DSID: dataset identification.
#[derive(Debug, Clone, PartialEq)]
pub struct DsidField {
    pub record_id: u32,
    pub exchange_purpose: u8,
    pub usage_band: u8,
    pub cell_id: String,
    pub edition: String,
    pub update_number: String,
    pub creation_date: String,
    pub version: String,
    pub producer: String,
}

/// Decode a DSID field:
/// RCNM(b11) RCID(b14) EXPP(b11) INTU(b11) DSNM(A) EDTN(A) UPDN(A)
/// ISDT(A) STED(A) AGEN(A).
pub fn parse_dsid(field: &Field) -> Option<DsidField> {
    let mut cursor = ByteCursor::new(&field.data);
    let _rcnm = cursor.u8()?;
    let record_id = cursor.u32_le()?;
    let exchange_purpose = cursor.u8()?;
    let usage_band = cursor.u8()?;
    let cell_id = cursor.text()?;
    let edition = cursor.text()?;
    let update_number = cursor.text()?;
    let creation_date = cursor.text()?;
    let version = cursor.text()?;
    let producer = cursor.text()?;
    Some(DsidField {
        record_id,
        exchange_purpose,
        usage_band,
        cell_id,
        edition,
        update_number,
        creation_date,
        version,
        producer,
    })
}

/// Decoded DSPM: dataset parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DspmField {
    pub horizontal_datum: u8,
    pub vertical_datum: u8,
    pub sounding_datum: u8,
    pub compilation_scale: u32,
    pub depth_units: u8,
    pub comf: f64,
    pub somf: f64,
}

/// Decode a DSPM field:
/// RCNM(b11) RCID(b14) HDAT(b11) VDAT(b11) SDAT(b11) CSCL(b14)
/// DUNI(b11) COMF(b14) SOMF(b14).
pub fn parse_dspm(field: &Field) -> Option<DspmField> {
    let mut cursor = ByteCursor::new(&field.data);
    let _rcnm = cursor.u8()?;
    let _rcid = cursor.u32_le()?;
    let horizontal_datum = cursor.u8()?;
    let vertical_datum = cursor.u8()?;
    let sounding_datum = cursor.u8()?;
    let compilation_scale = cursor.u32_le()?;
    let depth_units = cursor.u8()?;
    let comf = cursor.u32_le()? as f64;
    let somf = cursor.u32_le()? as f64;
    Some(DspmField {
        horizontal_datum,
        vertical_datum,
        sounding_datum,
        compilation_scale,
        depth_units,
        comf,
        somf,
    })
}

/// Decoded FRID: feature record identifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FridField {
    pub record_id: u32,
    pub primitive: u8,
    pub group: u8,
    pub object_code: u32,
    pub version: u16,
    pub update_instruction: u8,
}

/// Decode a FRID field:
/// RCNM(b11) RCID(b14) PRIM(b11) GRUP(b11) OBJL(b12) RVER(b12) RUIN(b11).
pub fn parse_frid(field: &Field) -> Option<FridField> {
    let mut cursor = ByteCursor::new(&field.data);
    let rcnm = cursor.u8()?;
    if rcnm != RCNM_FEATURE {
        return None;
    }
    let record_id = cursor.u32_le()?;
    let primitive = cursor.u8()?;
    let group = cursor.u8()?;
    let object_code = cursor.u16_le()? as u32;
    let version = cursor.u16_le()?;
    let update_instruction = cursor.u8()?;
    Some(FridField {
        record_id,
        primitive,
        group,
        object_code,
        version,
        update_instruction,
    })
}

/// Decoded FOID: feature object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FoidField {
    pub agency: u16,
    pub id_number: u32,
    pub id_subdivision: u16,
}

/// Decode a FOID field: AGEN(b12) FIDN(b14) FIDS(b12).
pub fn parse_foid(field: &Field) -> Option<FoidField> {
    let mut cursor = ByteCursor::new(&field.data);
    let agency = cursor.u16_le()?;
    let id_number = cursor.u32_le()?;
    let id_subdivision = cursor.u16_le()?;
    Some(FoidField {
        agency,
        id_number,
        id_subdivision,
    })
}

/// Decode an ATTF field: repeating ATTL(A(6) acronym) ATVL(A).
///
/// Returns (acronym, raw value) pairs in field order.
pub fn parse_attf(field: &Field) -> Option<Vec<(String, String)>> {
    let mut cursor = ByteCursor::new(&field.data);
    let mut pairs = Vec::new();
    while !cursor.at_end() {
        let acronym = cursor.text_fixed(6)?;
        let value = cursor.text()?;
        pairs.push((acronym, value));
    }
    Some(pairs)
}

/// Decode an SG2D field: repeating YCOO(b24) XCOO(b24).
///
/// Returns raw (y, x) integer pairs; the caller divides by COMF.
pub fn parse_sg2d(field: &Field) -> Option<Vec<(i32, i32)>> {
    let mut cursor = ByteCursor::new(&field.data);
    let mut pairs = Vec::new();
    while !cursor.at_end() {
        let y = cursor.i32_le()?;
        let x = cursor.i32_le()?;
        pairs.push((y, x));
    }
    Some(pairs)
}

/// Decoded VRID: vector record identifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VridField {
    pub kind: u8,
    pub record_id: u32,
    pub version: u16,
    pub update_instruction: u8,
}

impl VridField {
    /// True for isolated and connected node records.
    pub fn is_node(&self) -> bool {
        self.kind == RCNM_ISOLATED_NODE || self.kind == RCNM_CONNECTED_NODE
    }

    /// True for edge records.
    pub fn is_edge(&self) -> bool {
        self.kind == RCNM_EDGE
    }
}

/// Decode a VRID field: RCNM(b11) RCID(b14) RVER(b12) RUIN(b11).
pub fn parse_vrid(field: &Field) -> Option<VridField> {
    let mut cursor = ByteCursor::new(&field.data);
    let kind = cursor.u8()?;
    let record_id = cursor.u32_le()?;
    let version = cursor.u16_le()?;
    let update_instruction = cursor.u8()?;
    Some(VridField {
        kind,
        record_id,
        version,
        update_instruction,
    })
}

/// One VRPT entry: a directed reference to another vector record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VrptEntry {
    pub target_kind: u8,
    pub target_id: u32,
    pub orientation: u8,
    pub usage: u8,
    pub topology: u8,
    pub mask: u8,
}

impl VrptEntry {
    /// Collapse the entry into the assembler's pointer form.
    pub fn to_pointer(self) -> SpatialPointer {
        SpatialPointer {
            ref_id: self.target_id,
            is_edge: self.target_kind == RCNM_EDGE,
            reverse: self.orientation == ORNT_REVERSE,
        }
    }
}

/// Decode a VRPT field: repeating NAME(B40: RCNM u8 + RCID u32le)
/// ORNT(b11) USAG(b11) TOPI(b11) MASK(b11).
pub fn parse_vrpt(field: &Field) -> Option<Vec<VrptEntry>> {
    let mut cursor = ByteCursor::new(&field.data);
    let mut entries = Vec::new();
    while !cursor.at_end() {
        let target_kind = cursor.u8()?;
        let target_id = cursor.u32_le()?;
        let orientation = cursor.u8()?;
        let usage = cursor.u8()?;
        let topology = cursor.u8()?;
        let mask = cursor.u8()?;
        entries.push(VrptEntry {
            target_kind,
            target_id,
            orientation,
            usage,
            topology,
            mask,
        });
    }
    Some(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(tag: &str, mut data: Vec<u8>) -> Field {
        data.push(FIELD_TERMINATOR);
        Field::new(tag.to_string(), data)
    }

    fn text(value: &str) -> Vec<u8> {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(UNIT_TERMINATOR);
        bytes
    }

    #[test]
    fn test_parse_dsid() {
        let mut data = vec![RCNM_DATASET];
        data.extend(1u32.to_le_bytes());
        data.push(1); // EXPP
        data.push(5); // INTU
        data.extend(text("US5WA22M"));
        data.extend(text("3"));
        data.extend(text("0"));
        data.extend(text("20240115"));
        data.extend(text("03.1"));
        data.extend(text("NOAA"));

        let dsid = parse_dsid(&field("DSID", data)).unwrap();
        assert_eq!(dsid.cell_id, "US5WA22M");
        assert_eq!(dsid.usage_band, 5);
        assert_eq!(dsid.edition, "3");
        assert_eq!(dsid.creation_date, "20240115");
        assert_eq!(dsid.producer, "NOAA");
    }

    #[test]
    fn test_parse_dspm() {
        let mut data = vec![RCNM_PARAMS];
        data.extend(1u32.to_le_bytes());
        data.push(2); // HDAT
        data.push(7); // VDAT
        data.push(7); // SDAT
        data.extend(25000u32.to_le_bytes());
        data.push(1); // DUNI
        data.extend(5_000_000u32.to_le_bytes());
        data.extend(25u32.to_le_bytes());

        let dspm = parse_dspm(&field("DSPM", data)).unwrap();
        assert_eq!(dspm.comf, 5_000_000.0);
        assert_eq!(dspm.somf, 25.0);
        assert_eq!(dspm.compilation_scale, 25000);
    }

    #[test]
    fn test_parse_frid() {
        let mut data = vec![RCNM_FEATURE];
        data.extend(42u32.to_le_bytes());
        data.push(PRIM_POINT);
        data.push(1); // GRUP
        data.extend(75u16.to_le_bytes());
        data.extend(1u16.to_le_bytes());
        data.push(RUIN_INSERT);

        let frid = parse_frid(&field("FRID", data)).unwrap();
        assert_eq!(frid.record_id, 42);
        assert_eq!(frid.object_code, 75);
        assert_eq!(frid.primitive, PRIM_POINT);
        assert_eq!(frid.update_instruction, RUIN_INSERT);
    }

    #[test]
    fn test_parse_frid_rejects_non_feature() {
        let mut data = vec![RCNM_EDGE];
        data.extend(42u32.to_le_bytes());
        assert!(parse_frid(&field("FRID", data)).is_none());
    }

    #[test]
    fn test_parse_attf_pairs() {
        let mut data = Vec::new();
        data.extend(b"OBJNAM");
        data.extend(text("Alki Point Light"));
        data.extend(b"COLOUR");
        data.extend(text("3"));

        let pairs = parse_attf(&field("ATTF", data)).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("OBJNAM".to_string(), "Alki Point Light".to_string()));
        assert_eq!(pairs[1].0, "COLOUR");
    }

    #[test]
    fn test_parse_sg2d_pairs() {
        let mut data = Vec::new();
        data.extend(476_000_000i32.to_le_bytes());
        data.extend((-1_223_000_000i32).to_le_bytes());
        data.extend(476_100_000i32.to_le_bytes());
        data.extend((-1_223_100_000i32).to_le_bytes());

        let pairs = parse_sg2d(&field("SG2D", data)).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], (476_000_000, -1_223_000_000));
    }

    #[test]
    fn test_parse_sg2d_truncated_pair_is_none() {
        let mut data = Vec::new();
        data.extend(476_000_000i32.to_le_bytes());
        data.extend_from_slice(&[1, 2]); // half an XCOO
        assert!(parse_sg2d(&field("SG2D", data)).is_none());
    }

    #[test]
    fn test_parse_vrid_and_kinds() {
        let mut data = vec![RCNM_EDGE];
        data.extend(9u32.to_le_bytes());
        data.extend(1u16.to_le_bytes());
        data.push(RUIN_INSERT);

        let vrid = parse_vrid(&field("VRID", data)).unwrap();
        assert!(vrid.is_edge());
        assert!(!vrid.is_node());
        assert_eq!(vrid.record_id, 9);
    }

    #[test]
    fn test_parse_vrpt_to_pointer() {
        let mut data = Vec::new();
        data.push(RCNM_EDGE);
        data.extend(5u32.to_le_bytes());
        data.push(ORNT_REVERSE);
        data.push(1); // USAG
        data.push(2); // TOPI
        data.push(255); // MASK
        data.push(RCNM_ISOLATED_NODE);
        data.extend(3u32.to_le_bytes());
        data.push(1);
        data.push(1);
        data.push(1);
        data.push(255);

        let entries = parse_vrpt(&field("VRPT", data)).unwrap();
        assert_eq!(entries.len(), 2);

        let edge_ptr = entries[0].to_pointer();
        assert!(edge_ptr.is_edge);
        assert!(edge_ptr.reverse);
        assert_eq!(edge_ptr.ref_id, 5);

        let node_ptr = entries[1].to_pointer();
        assert!(!node_ptr.is_edge);
        assert!(!node_ptr.reverse);
    }
}
