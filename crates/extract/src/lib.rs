pub mod error;
pub mod llm;
pub mod parse;
pub mod prompt;
pub mod remap;
pub mod schema;
pub mod usage;

pub use error::{ExtractError, Result};
pub use llm::{ChatMessage, ChatModel, ChatRequest, Completion, OpenAiClient, Role};
pub use remap::{change_key, DisplayLabelMap};
pub use schema::{estate_schema, ExamplePair, FieldDescriptor, FieldKind, Record, Schema};
pub use usage::{CostMeter, TokenUsage, UsageReport};

use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 4096,
        }
    }
}

/// One extracted record and what it cost to get it.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: Record,
    pub usage: UsageReport,
}

/// Runs a schema-guided extraction against a chat model.
pub struct Extractor<M> {
    model: M,
    schema: Arc<Schema>,
    settings: GenerationSettings,
}

impl<M: ChatModel + Sync> Extractor<M> {
    pub fn new(model: M, schema: Arc<Schema>, settings: GenerationSettings) -> Self {
        Self {
            model,
            schema,
            settings,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn model_name(&self) -> &str {
        self.model.model()
    }

    /// Extract the first record matching the schema from normalized text.
    pub async fn extract(&self, text: &str) -> Result<Extraction> {
        let request = ChatRequest {
            messages: prompt::build_messages(&self.schema, text),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let (result, usage) = usage::measure(self.model.model(), self.model.complete(&request)).await;

        tracing::info!(
            model = %usage.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            cost_usd = usage.total_cost_usd,
            elapsed_ms = usage.elapsed_ms,
            success = result.is_ok(),
            "Extraction call finished"
        );

        let completion = result?;
        let records = parse::parse_records(&completion.content, &self.schema.id)?;
        let record = parse::first_record(records)?;

        Ok(Extraction { record, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: std::result::Result<String, u16>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedModel {
        fn replying(content: &str) -> Self {
            Self { reply: Ok(content.to_string()), seen: Mutex::new(Vec::new()) }
        }

        fn failing(status: u16) -> Self {
            Self { reply: Err(status), seen: Mutex::new(Vec::new()) }
        }
    }

    impl ChatModel for ScriptedModel {
        fn model(&self) -> &str {
            "gpt-3.5-turbo-16k"
        }

        async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(content) => Ok(Completion {
                    content: content.clone(),
                    usage: Some(TokenUsage { prompt_tokens: 900, completion_tokens: 80, total_tokens: 980 }),
                }),
                Err(status) => Err(ExtractError::Api { status: *status, body: "denied".to_string() }),
            }
        }
    }

    fn extractor(model: ScriptedModel) -> Extractor<ScriptedModel> {
        Extractor::new(model, Arc::new(estate_schema()), GenerationSettings::default())
    }

    #[tokio::test]
    async fn test_extract_first_record() {
        let extractor = extractor(ScriptedModel::replying(
            "<json>{\"estate_schema\": [{\"price\": \"a\"}, {\"price\": \"b\"}]}</json>",
        ));

        let extraction = extractor.extract("価格 a").await.unwrap();

        assert_eq!(extraction.record["price"], "a");
        assert_eq!(extraction.usage.successful_requests, 1);
        assert_eq!(extraction.usage.total_tokens, 980);
    }

    #[tokio::test]
    async fn test_request_is_deterministic() {
        let extractor = extractor(ScriptedModel::replying("<json>{\"estate_schema\": [{}]}</json>"));

        extractor.extract("価格 a").await.unwrap();

        let seen = extractor.model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature, 0.0);
        assert_eq!(seen[0].max_tokens, 4096);
        assert_eq!(seen[0].messages.last().unwrap().content, "価格 a");
    }

    #[tokio::test]
    async fn test_empty_result_is_distinct_failure() {
        let extractor = extractor(ScriptedModel::replying("<json>{\"estate_schema\": []}</json>"));

        let err = extractor.extract("nothing here").await.unwrap_err();

        assert!(matches!(err, ExtractError::NoRecordExtracted));
    }

    #[tokio::test]
    async fn test_api_failure_propagates() {
        let extractor = extractor(ScriptedModel::failing(401));

        let err = extractor.extract("価格 a").await.unwrap_err();

        assert!(matches!(err, ExtractError::Api { status: 401, .. }));
    }
}
