use extract::{Record, UsageReport};
use serde::Serialize;
use std::fmt;

/// What the user sees for one upload: input text, relabeled record, cost.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub input: String,
    pub output: Record,
    pub cost: UsageReport,
}

impl fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let output = serde_json::to_string_pretty(&self.output).map_err(|_| fmt::Error)?;

        writeln!(f, "Input")?;
        writeln!(f, "{}", self.input)?;
        writeln!(f)?;
        writeln!(f, "Output")?;
        writeln!(f, "{}", output)?;
        writeln!(f)?;
        writeln!(f, "Cost")?;
        writeln!(f, "{}", self.cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> ExtractionReport {
        ExtractionReport {
            input: "価格 １，６７０万円".to_string(),
            output: json!({"価格": "１，６７０万円", "階建": 9}).as_object().cloned().unwrap(),
            cost: UsageReport {
                model: "gpt-3.5-turbo-16k".to_string(),
                total_tokens: 10,
                prompt_tokens: 8,
                completion_tokens: 2,
                successful_requests: 1,
                total_cost_usd: 0.000032,
                elapsed_ms: 5,
            },
        }
    }

    #[test]
    fn test_json_block_order() {
        let json = serde_json::to_string(&report()).unwrap();

        let input = json.find("\"input\"").unwrap();
        let output = json.find("\"output\"").unwrap();
        let cost = json.find("\"cost\"").unwrap();
        assert!(input < output && output < cost);
        assert!(json.contains("\"価格\":\"１，６７０万円\""));
    }

    #[test]
    fn test_text_rendering() {
        let text = report().to_string();

        assert!(text.starts_with("Input\n価格 １，６７０万円\n\nOutput\n{"));
        assert!(text.contains("\"階建\": 9"));
        assert!(text.contains("Cost\nTokens Used: 10\n"));
        assert!(text.find("Output").unwrap() < text.find("Cost").unwrap());
    }
}
