use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// An extracted record: field identifier to string-or-number value, in insertion order.
pub type Record = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
}

impl FieldKind {
    /// Type name used when the schema is written into a prompt.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::Number => "number",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub description: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn text(id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            kind: FieldKind::Text,
        }
    }

    pub fn number(id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            kind: FieldKind::Number,
        }
    }
}

/// Raw input text and the records an extraction should produce from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamplePair {
    pub input: String,
    pub output: Vec<Record>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub id: String,
    pub description: String,
    pub fields: Vec<FieldDescriptor>,
    pub examples: Vec<ExamplePair>,
}

impl Schema {
    pub fn field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// The real-estate listing schema: six attributes and two worked examples.
pub fn estate_schema() -> Schema {
    Schema {
        id: "estate_schema".to_string(),
        description: "物件の価格、所在地、構造、階数、面積。".to_string(),
        fields: vec![
            FieldDescriptor::text("price", "物件の価格"),
            FieldDescriptor::text("location", "物件の所在地"),
            FieldDescriptor::text("structure", "物件の構造"),
            FieldDescriptor::number("floors", "物件の階建"),
            FieldDescriptor::number("floor_part", "物件の階部分"),
            FieldDescriptor::number("area", "物件の面積"),
        ],
        examples: vec![
            ExamplePair {
                input: " 価格 １，６７０万円 所在地         東京都台東区上野7丁目8-15        構造 鉄筋コンクリート造 9階建 6階部分  専有面積 ２５．５８㎡".to_string(),
                output: vec![record(json!({
                    "price": "１，６７０万円",
                    "location": "東京都台東区上野7丁目8-15",
                    "structure": "鉄筋コンクリート造",
                    "floors": 9,
                    "area": "２５．５８㎡",
                    "floor_part": 6,
                }))],
            },
            ExamplePair {
                input: "価格  ２，５２０万円  所在地       神奈川県川崎市川崎区藤崎１－３－４  鉄骨鉄筋コンクリート造　地上15階建　8階部分 専有面積 19.67㎡".to_string(),
                output: vec![record(json!({
                    "price": "２，５２０万円",
                    "location": "神奈川県川崎市川崎区藤崎１－３－４",
                    "structure": "鉄骨鉄筋コンクリート造",
                    "floors": 15,
                    "area": "19.67㎡",
                    "floor_part": 8,
                }))],
            },
        ],
    }
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_ids_are_unique_and_ordered() {
        let schema = estate_schema();
        let ids: Vec<&str> = schema.fields.iter().map(|f| f.id.as_str()).collect();

        assert_eq!(ids, ["price", "location", "structure", "floors", "floor_part", "area"]);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    }

    #[test]
    fn test_field_kinds() {
        let schema = estate_schema();

        assert_eq!(schema.field("price").unwrap().kind, FieldKind::Text);
        assert_eq!(schema.field("floors").unwrap().kind, FieldKind::Number);
        assert_eq!(schema.field("area").unwrap().kind, FieldKind::Number);
        assert!(schema.field("rent").is_none());
    }

    #[test]
    fn test_examples_cover_every_field() {
        let schema = estate_schema();

        assert_eq!(schema.examples.len(), 2);
        for example in &schema.examples {
            assert_eq!(example.output.len(), 1);
            for field in &schema.fields {
                assert!(example.output[0].contains_key(&field.id), "missing {}", field.id);
            }
        }
    }

    #[test]
    fn test_example_locations_match_their_inputs() {
        for example in estate_schema().examples {
            let location = example.output[0]["location"].as_str().unwrap();
            assert!(example.input.contains(location), "{location} not in input");
        }
    }
}
