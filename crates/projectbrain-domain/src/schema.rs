//! Field schemas used to normalize extracted rows

use serde::{Deserialize, Serialize};

/// A single declared field and the value used when a row omits it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name as it appears in the model's JSON
    pub name: String,

    /// Value substituted when the field is absent or `null`
    #[serde(default)]
    pub default: String,

    /// Hint shown to the model in the extraction prompt's example row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    /// Create a field with an empty-string default
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: String::new(),
            description: None,
        }
    }

    /// Create a field with an explicit default
    pub fn with_default(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
            description: None,
        }
    }

    /// Attach a prompt hint
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ordered list of expected fields
///
/// Field order is significant: normalized records list their declared fields
/// in schema order. Declaring the same name twice keeps the first declaration.
///
/// # Examples
///
/// ```
/// use projectbrain_domain::FieldSchema;
///
/// let schema = FieldSchema::new()
///     .field("mark")
///     .field_with_default("notes", "n/a");
///
/// assert_eq!(schema.names().collect::<Vec<_>>(), vec!["mark", "notes"]);
/// assert_eq!(schema.get("notes").unwrap().default, "n/a");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
}

impl FieldSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// The door schedule schema: `mark`, `frame_type`, `door_type`, `size`, `notes`
    pub fn door_schedule() -> Self {
        [
            ("mark", "Door Number (e.g. 1, 2, D-101)"),
            ("frame_type", "Material (e.g. Hollow Metal, Aluminum)"),
            ("door_type", "Type (e.g. Single, Double Egress)"),
            ("size", "Height/Width info"),
            ("notes", "Any notes (e.g. AE601 TYP)"),
        ]
        .into_iter()
        .map(|(name, hint)| FieldSpec::new(name).describe(hint))
        .collect()
    }

    /// Append a field with an empty-string default
    pub fn field(self, name: impl Into<String>) -> Self {
        self.push(FieldSpec::new(name))
    }

    /// Append a field with an explicit default
    pub fn field_with_default(self, name: impl Into<String>, default: impl Into<String>) -> Self {
        self.push(FieldSpec::with_default(name, default))
    }

    /// Append a fully specified field
    pub fn spec(self, spec: FieldSpec) -> Self {
        self.push(spec)
    }

    fn push(mut self, spec: FieldSpec) -> Self {
        if !self.contains(&spec.name) {
            self.fields.push(spec);
        }
        self
    }

    /// Look up a declared field by name
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether the schema declares `name`
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Declared field names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Iterate over declared fields in order
    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.fields.iter()
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are declared
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<FieldSpec> for FieldSchema {
    fn from_iter<I: IntoIterator<Item = FieldSpec>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::push)
    }
}

impl<'a> IntoIterator for &'a FieldSchema {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_door_schedule_order() {
        let schema = FieldSchema::door_schedule();
        let names: Vec<_> = schema.names().collect();
        assert_eq!(names, vec!["mark", "frame_type", "door_type", "size", "notes"]);
        assert!(schema.iter().all(|f| f.default.is_empty()));
        assert!(schema.iter().all(|f| f.description.is_some()));
    }

    #[test]
    fn test_duplicate_field_keeps_first() {
        let schema = FieldSchema::new()
            .field_with_default("mark", "first")
            .field_with_default("mark", "second");
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get("mark").unwrap().default, "first");
    }

    #[test]
    fn test_from_iterator() {
        let schema: FieldSchema = vec![FieldSpec::new("a"), FieldSpec::with_default("b", "x")]
            .into_iter()
            .collect();
        assert_eq!(schema.len(), 2);
        assert!(schema.contains("b"));
        assert!(!schema.contains("c"));
    }

    #[test]
    fn test_deserialize_from_list() {
        let json = r#"[{"name": "mark"}, {"name": "notes", "default": "-"}]"#;
        let schema: FieldSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.get("mark").unwrap().default, "");
        assert_eq!(schema.get("notes").unwrap().default, "-");
        assert_eq!(schema.get("notes").unwrap().description, None);
    }

    #[test]
    fn test_description_round_trip() {
        let json = r#"[{"name": "room", "description": "Room number"}]"#;
        let schema: FieldSchema = serde_json::from_str(json).unwrap();
        assert_eq!(
            schema.get("room").unwrap().description.as_deref(),
            Some("Room number")
        );

        let described = FieldSchema::new().spec(FieldSpec::new("finish").describe("Floor finish"));
        let value = serde_json::to_value(&described).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"name": "finish", "default": "", "description": "Floor finish"}])
        );
    }
}
