//! Service area records (one MLS region each) and their computed coverage.

use geo::MultiPolygon;
use serde::de::{self, Deserializer};
use serde::ser::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coverage::CoverageReport;

/// A service-area entity and the zipcodes it covers.
///
/// Field names follow the MLS metadata files (`mls_id`, `mls_name`,
/// `zipcode_coverage`). Every other attribute is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceArea {
    #[serde(rename = "mls_id", deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(rename = "mls_name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Raw member identifiers; canonicalized by the coverage builder
    #[serde(
        rename = "zipcode_coverage",
        default,
        deserialize_with = "strings_or_numbers"
    )]
    pub zipcodes: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceArea {
    pub fn new(id: impl Into<String>, zipcodes: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            zipcodes,
            extra: Map::new(),
        }
    }

    /// All attributes of the entity as a flat JSON object
    pub fn properties(&self) -> Result<Map<String, Value>, serde_json::Error> {
        into_object(serde_json::to_value(self)?)
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>, serde_json::Error> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(serde_json::Error::custom(format!(
            "service area serialized to {}, expected an object",
            other
        ))),
    }
}

/// A service area with its coverage geometry attached
#[derive(Debug, Clone)]
pub struct CoverageFeature {
    pub area: ServiceArea,
    pub geometry: MultiPolygon<f64>,
    pub report: CoverageReport,
}

fn scalar_to_string<E: de::Error>(value: Value) -> Result<String, E> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(E::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_to_string(Value::deserialize(deserializer)?)
}

// Zipcodes exported as numbers lose their leading zeros; ZipCode::parse pads them back.
fn strings_or_numbers<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    values
        .unwrap_or_default()
        .into_iter()
        .map(scalar_to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_mls_record() {
        let json = r#"{
            "mls_id": "M00000123",
            "mls_name": "First Multiple Listing Service",
            "state": "GA",
            "zipcode_coverage": ["30327", 2138, "30328"]
        }"#;

        let area: ServiceArea = serde_json::from_str(json).unwrap();
        assert_eq!(area.id, "M00000123");
        assert_eq!(area.name.as_deref(), Some("First Multiple Listing Service"));
        assert_eq!(area.zipcodes, vec!["30327", "2138", "30328"]);
        assert_eq!(area.extra.get("state"), Some(&Value::from("GA")));
    }

    #[test]
    fn test_numeric_id_and_missing_coverage() {
        let area: ServiceArea = serde_json::from_str(r#"{"mls_id": 42}"#).unwrap();
        assert_eq!(area.id, "42");
        assert!(area.zipcodes.is_empty());

        let area: ServiceArea =
            serde_json::from_str(r#"{"mls_id": 7, "zipcode_coverage": null}"#).unwrap();
        assert!(area.zipcodes.is_empty());
    }

    #[test]
    fn test_properties_round_trip_extra_fields() {
        let mut area = ServiceArea::new("A1", vec!["30327".to_string()]);
        area.extra
            .insert("website".to_string(), Value::from("https://example.org"));

        let props = area.properties().unwrap();
        assert_eq!(props.get("mls_id"), Some(&Value::from("A1")));
        assert_eq!(props.get("website"), Some(&Value::from("https://example.org")));
        assert!(!props.contains_key("mls_name"));
    }

    #[test]
    fn test_rejects_object_id() {
        let result: Result<ServiceArea, _> = serde_json::from_str(r#"{"mls_id": {"x": 1}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_non_object_properties_are_an_error() {
        let err = into_object(Value::from("A1")).unwrap_err();
        assert!(err.to_string().contains("expected an object"));
        assert!(into_object(serde_json::json!({"mls_id": "A1"})).is_ok());
    }
}
