//! Normalized records and extraction results

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// One row extracted from model output
///
/// Declared schema fields come first, in schema order, and are always strings.
/// Keys the schema does not declare are kept verbatim in `extra`.
/// Serializes as a single flat JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedRecord {
    fields: Vec<(String, String)>,
    extra: Map<String, Value>,
}

impl ExtractedRecord {
    /// Build a record from already-normalized parts
    ///
    /// Entries of `extra` whose key is also a declared field are discarded.
    pub fn from_parts(fields: Vec<(String, String)>, mut extra: Map<String, Value>) -> Self {
        for (name, _) in &fields {
            extra.remove(name);
        }
        Self { fields, extra }
    }

    /// Value of a declared field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Declared fields in schema order
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Fields present in the source JSON but not declared by the schema
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Flatten into a JSON object
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        for (name, value) in &self.fields {
            obj.insert(name.clone(), Value::String(value.clone()));
        }
        for (name, value) in &self.extra {
            obj.insert(name.clone(), value.clone());
        }
        Value::Object(obj)
    }
}

impl Serialize for ExtractedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + self.extra.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        for (name, value) in &self.extra {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Outcome of pulling records out of free-form text
///
/// Always well-formed: a parse failure is an empty `records` list plus a
/// warning, not an error.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ExtractionResult {
    records: Vec<ExtractedRecord>,
    warnings: Vec<String>,
}

impl ExtractionResult {
    /// Create a result from records and warnings
    pub fn new(records: Vec<ExtractedRecord>, warnings: Vec<String>) -> Self {
        Self { records, warnings }
    }

    /// A result with no records and a single warning
    pub fn failed(warning: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            warnings: vec![warning.into()],
        }
    }

    /// Records in source order
    pub fn records(&self) -> &[ExtractedRecord] {
        &self.records
    }

    /// Diagnostics collected during extraction
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// True when nothing had to be dropped or recovered
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Split into `(records, warnings)`
    pub fn into_parts(self) -> (Vec<ExtractedRecord>, Vec<String>) {
        (self.records, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ExtractedRecord {
        let mut extra = Map::new();
        extra.insert("hardware".to_string(), json!({"set": 3}));
        ExtractedRecord::from_parts(
            vec![
                ("mark".to_string(), "D1".to_string()),
                ("notes".to_string(), String::new()),
            ],
            extra,
        )
    }

    #[test]
    fn test_get_declared_field() {
        let record = sample();
        assert_eq!(record.get("mark"), Some("D1"));
        assert_eq!(record.get("notes"), Some(""));
        assert_eq!(record.get("hardware"), None);
    }

    #[test]
    fn test_serializes_flat() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({"mark": "D1", "notes": "", "hardware": {"set": 3}})
        );
        assert_eq!(value, sample().to_json());
    }

    #[test]
    fn test_declared_fields_serialize_first() {
        let text = serde_json::to_string(&sample()).unwrap();
        assert!(text.starts_with(r#"{"mark":"D1","notes":"""#));
    }

    #[test]
    fn test_extra_cannot_shadow_declared_field() {
        let mut extra = Map::new();
        extra.insert("mark".to_string(), json!(99));
        let record = ExtractedRecord::from_parts(vec![("mark".to_string(), "D1".to_string())], extra);
        assert!(record.extra().is_empty());
        assert_eq!(record.get("mark"), Some("D1"));
    }

    #[test]
    fn test_failed_result() {
        let result = ExtractionResult::failed("parse failure: nope");
        assert!(result.records().is_empty());
        assert_eq!(result.warnings().to_vec(), vec!["parse failure: nope".to_string()]);
        assert!(!result.is_clean());
    }

    #[test]
    fn test_result_serializes_records_and_warnings() {
        let result = ExtractionResult::new(vec![sample()], vec![]);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["records"][0]["mark"], "D1");
        assert_eq!(value["warnings"], json!([]));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const DECLARED: [&str; 3] = ["mark", "size", "notes"];

    fn extra_strategy() -> impl Strategy<Value = Map<String, Value>> {
        let key = prop_oneof![
            Just("mark".to_string()),
            Just("notes".to_string()),
            "[a-z]{1,6}",
        ];
        proptest::collection::btree_map(key, any::<i64>().prop_map(Value::from), 0..6)
            .prop_map(|entries| entries.into_iter().collect())
    }

    fn fields_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
        proptest::collection::vec(".{0,12}", DECLARED.len()).prop_map(|values| {
            DECLARED
                .iter()
                .map(|name| name.to_string())
                .zip(values)
                .collect()
        })
    }

    proptest! {
        #[test]
        fn declared_fields_serialize_first(fields in fields_strategy(), extra in extra_strategy()) {
            let record = ExtractedRecord::from_parts(fields.clone(), extra);
            let json = serde_json::to_string(&record).unwrap();

            let prefix = fields
                .iter()
                .map(|(n, v)| format!("{}:{}", Value::String(n.clone()), Value::String(v.clone())))
                .collect::<Vec<_>>()
                .join(",");
            let expected_start = format!("{{{}", prefix);
            prop_assert!(json.starts_with(&expected_start));
        }

        #[test]
        fn extras_never_shadow_declared_fields(fields in fields_strategy(), extra in extra_strategy()) {
            let unshadowed = extra
                .keys()
                .filter(|k| !DECLARED.contains(&k.as_str()))
                .count();
            let record = ExtractedRecord::from_parts(fields.clone(), extra);
            let value: Value = serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
            let obj = value.as_object().unwrap();

            prop_assert_eq!(obj.len(), fields.len() + unshadowed);
            for (name, declared) in &fields {
                prop_assert_eq!(obj[name.as_str()].as_str(), Some(declared.as_str()));
            }
        }
    }
}
