//! S-57 attribute definitions and typed value decoding.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

/// Value type of an attribute, from the catalogue JSON.
///
/// An unknown `type` string is rejected at load time (serde fails the
/// whole catalogue), so every loaded definition has one of these.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttributeType {
    Int,
    Float,
    String,
    Enum,
}

/// One attribute definition from the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Six-character uppercase acronym (e.g., "COLOUR")
    pub acronym: String,
    /// Value type
    #[serde(rename = "type")]
    pub kind: AttributeType,
    /// Human-readable name
    pub name: String,
    /// Enum domain: code string to label. `BTreeMap` keeps serialized
    /// output deterministic so round-trips are identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<BTreeMap<String, String>>,
}

/// A decoded attribute value.
///
/// A tagged sum rather than a dynamic map value: decoders produce the
/// tag, consumers match on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    Str(String),
    Enum {
        code: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// Pass-through for values with no catalogue definition.
    Raw(Vec<String>),
}

impl AttributeValue {
    /// Float view of the value, when it carries one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// String view of the value, when it carries one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Decode raw subfield values against an attribute definition.
///
/// Without a definition the values pass through untyped. With one, the
/// first raw value is decoded per the definition's type (extra values are
/// ignored for scalar types) and an unparseable value yields `None`.
pub fn decode_attribute(def: Option<&AttributeDef>, raw: &[String]) -> Option<AttributeValue> {
    let Some(def) = def else {
        return Some(match raw {
            [] => AttributeValue::Raw(Vec::new()),
            [single] => AttributeValue::Str(single.clone()),
            _ => AttributeValue::Raw(raw.to_vec()),
        });
    };

    let first = raw.first()?;
    match def.kind {
        AttributeType::Int => first.trim().parse::<i64>().ok().map(AttributeValue::Int),
        AttributeType::Float => first.trim().parse::<f64>().ok().map(AttributeValue::Float),
        AttributeType::String => Some(AttributeValue::Str(first.trim().to_string())),
        AttributeType::Enum => {
            let code = first.trim().to_string();
            let label = def
                .domain
                .as_ref()
                .and_then(|domain| domain.get(&code))
                .cloned();
            Some(AttributeValue::Enum { code, label })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colour_def() -> AttributeDef {
        let mut domain = BTreeMap::new();
        domain.insert("3".to_string(), "green".to_string());
        domain.insert("4".to_string(), "blue".to_string());
        AttributeDef {
            acronym: "COLOUR".to_string(),
            kind: AttributeType::Enum,
            name: "Colour".to_string(),
            domain: Some(domain),
        }
    }

    fn raw(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_enum_decode_with_label() {
        let value = decode_attribute(Some(&colour_def()), &raw(&["3"])).unwrap();
        assert_eq!(
            value,
            AttributeValue::Enum {
                code: "3".to_string(),
                label: Some("green".to_string()),
            }
        );
    }

    #[test]
    fn test_enum_decode_outside_domain_has_no_label() {
        let value = decode_attribute(Some(&colour_def()), &raw(&["99"])).unwrap();
        assert_eq!(
            value,
            AttributeValue::Enum {
                code: "99".to_string(),
                label: None,
            }
        );
    }

    #[test]
    fn test_enum_decode_trims_code() {
        let value = decode_attribute(Some(&colour_def()), &raw(&["  3  "])).unwrap();
        assert_eq!(
            value,
            AttributeValue::Enum {
                code: "3".to_string(),
                label: Some("green".to_string()),
            }
        );
    }

    #[test]
    fn test_int_decode() {
        let def = AttributeDef {
            acronym: "SCAMIN".to_string(),
            kind: AttributeType::Int,
            name: "Scale minimum".to_string(),
            domain: None,
        };
        assert_eq!(
            decode_attribute(Some(&def), &raw(&["180000"])),
            Some(AttributeValue::Int(180000))
        );
        assert_eq!(decode_attribute(Some(&def), &raw(&["3.5"])), None);
        assert_eq!(decode_attribute(Some(&def), &raw(&["deep"])), None);
        // Extra values beyond the first are ignored.
        assert_eq!(
            decode_attribute(Some(&def), &raw(&["-7", "8"])),
            Some(AttributeValue::Int(-7))
        );
    }

    #[test]
    fn test_float_decode() {
        let def = AttributeDef {
            acronym: "DRVAL1".to_string(),
            kind: AttributeType::Float,
            name: "Depth range value 1".to_string(),
            domain: None,
        };
        assert_eq!(
            decode_attribute(Some(&def), &raw(&["12.5"])),
            Some(AttributeValue::Float(12.5))
        );
        assert_eq!(decode_attribute(Some(&def), &raw(&["n/a"])), None);
    }

    #[test]
    fn test_string_decode_trims() {
        let def = AttributeDef {
            acronym: "OBJNAM".to_string(),
            kind: AttributeType::String,
            name: "Object name".to_string(),
            domain: None,
        };
        assert_eq!(
            decode_attribute(Some(&def), &raw(&["  West Point Light  "])),
            Some(AttributeValue::Str("West Point Light".to_string()))
        );
    }

    #[test]
    fn test_pass_through_without_definition() {
        assert_eq!(
            decode_attribute(None, &raw(&[])),
            Some(AttributeValue::Raw(Vec::new()))
        );
        assert_eq!(
            decode_attribute(None, &raw(&["solo"])),
            Some(AttributeValue::Str("solo".to_string()))
        );
        assert_eq!(
            decode_attribute(None, &raw(&["a", "b"])),
            Some(AttributeValue::Raw(raw(&["a", "b"])))
        );
    }

    #[test]
    fn test_decode_is_idempotent_through_serialization() {
        let value = decode_attribute(Some(&colour_def()), &raw(&["3"])).unwrap();
        let json = serde_json::to_string(&value).unwrap();
        let back: AttributeValue = serde_json::from_str(&json).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn test_unknown_type_string_is_rejected() {
        let json = r#"{"acronym":"X","type":"blob","name":"X"}"#;
        assert!(serde_json::from_str::<AttributeDef>(json).is_err());
    }
}
