//! Dataset-level metadata from the DSID and DSPM fields.

/// Default coordinate multiplication factor (7 decimal places).
pub const DEFAULT_COMF: f64 = 10_000_000.0;
/// Default sounding multiplication factor.
pub const DEFAULT_SOMF: f64 = 10.0;

/// Identification and scaling parameters of one chart cell.
///
/// Defaults apply wherever the dataset omits a subfield; `comf` and `somf`
/// override from DSPM when present.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetMetadata {
    /// Producing agency
    pub producer: String,
    /// Product specification version (e.g., "03.1")
    pub version: String,
    /// Issue date of the dataset, as encoded (YYYYMMDD)
    pub creation_date: String,
    /// Edition number of the base cell
    pub edition_number: u32,
    /// Last applied update number (0 for a bare base cell)
    pub update_number: u32,
    /// Cell identifier (e.g., "US5WA22M")
    pub cell_id: String,
    /// Intended usage band (1=overview .. 6=berthing)
    pub usage_band: u8,
    /// Coordinate multiplication factor
    pub comf: f64,
    /// Sounding multiplication factor
    pub somf: f64,
}

impl Default for DatasetMetadata {
    fn default() -> Self {
        Self {
            producer: "UNKNOWN".to_string(),
            version: "03.1".to_string(),
            creation_date: String::new(),
            edition_number: 1,
            update_number: 0,
            cell_id: String::new(),
            usage_band: 0,
            comf: DEFAULT_COMF,
            somf: DEFAULT_SOMF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let metadata = DatasetMetadata::default();
        assert_eq!(metadata.comf, 10_000_000.0);
        assert_eq!(metadata.somf, 10.0);
        assert_eq!(metadata.update_number, 0);
    }
}
