use serde_json::Value;

use crate::llm::ChatMessage;
use crate::schema::{Record, Schema};

const INSTRUCTIONS: &str = "Your goal is to extract structured information from the user's input that matches the form described below. \
When extracting information please make sure it matches the type information exactly. \
Do not add any attributes that do not appear in the schema shown below.";

const OUTPUT_FORMAT: &str = "Please output the extracted information in JSON format. \
Do not output anything except for the extracted information. \
Do not add any clarifying information. \
Do not add any fields that are not in the schema. \
If the text contains attributes that do not appear in the schema, please ignore them. \
All output must be in JSON format and follow the schema specified above. \
Wrap the JSON in <json> tags.";

/// Render the schema as a TypeScript-like type block.
///
/// ```text
/// estate_schema: Array<{ // description
///  price: string // 物件の価格
///  floors: number // 物件の階建
/// }>
/// ```
pub fn type_description(schema: &Schema) -> String {
    let mut out = format!("{}: Array<{{ // {}\n", schema.id, schema.description.trim());
    for field in &schema.fields {
        out.push_str(&format!(
            " {}: {} // {}\n",
            field.id,
            field.kind.type_name(),
            field.description.trim()
        ));
    }
    out.push_str("}>");
    out
}

pub fn build_system_prompt(schema: &Schema) -> String {
    format!(
        "{}\n\n```TypeScript\n\n{}\n```\n\n\n{}",
        INSTRUCTIONS,
        type_description(schema),
        OUTPUT_FORMAT
    )
}

/// Encode records the way the model is asked to answer: wrapped JSON keyed by the schema id.
pub fn encode_output(schema: &Schema, records: &[Record]) -> String {
    let records: Vec<Value> = records.iter().cloned().map(Value::Object).collect();
    let mut body = serde_json::Map::new();
    body.insert(schema.id.clone(), Value::Array(records));
    format!("<json>{}</json>", Value::Object(body))
}

/// Build the full chat transcript: instructions, few-shot examples, then the input text.
pub fn build_messages(schema: &Schema, text: &str) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(build_system_prompt(schema))];

    for example in &schema.examples {
        messages.push(ChatMessage::user(example.input.clone()));
        messages.push(ChatMessage::assistant(encode_output(schema, &example.output)));
    }

    messages.push(ChatMessage::user(text.to_string()));
    messages
}
