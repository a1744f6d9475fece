use serde::{Deserialize, Serialize};

use crate::ids::{PresentationId, SlideId};

/// Metadata attached to a generated text fragment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextMetadata {
    pub word_count: usize,
    pub target_word_count: u32,
    pub variance_percent: f64,
    pub within_tolerance: bool,
    pub html_tags_used: Vec<String>,
    pub generation_time_ms: f64,
    pub model_used: String,
    pub provider: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratedText {
    pub content: String,
    pub metadata: TextMetadata,
}

/// Metadata attached to a generated table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableMetadata {
    pub rows: usize,
    pub columns: usize,
    pub data_points: usize,
    pub has_header: bool,
    pub numeric_columns: usize,
    pub table_classes: Vec<String>,
    pub generation_time_ms: f64,
    pub model_used: String,
    pub provider: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratedTable {
    pub html: String,
    pub metadata: TableMetadata,
}

/// One failed request in a batch, identified by its slide.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchFailure {
    pub slide_id: SlideId,
    pub error: String,
}

/// Aggregate counters for a batch run. `failures` is omitted from the
/// serialized form when empty; callers key off its presence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchMetadata {
    pub total_requested: usize,
    pub successful: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failures: Option<Vec<BatchFailure>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchResponse<T> {
    pub results: Vec<T>,
    pub metadata: BatchMetadata,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionInfoResponse {
    pub presentation_id: PresentationId,
    pub slides_in_context: usize,
    pub context_size_bytes: usize,
    pub last_updated: String,
    pub ttl_remaining_seconds: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionDeleteResponse {
    pub status: String,
    pub message: String,
    pub slides_removed: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
    pub llm_provider: String,
    pub llm_model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_metadata_omits_empty_failures() {
        let meta = BatchMetadata {
            total_requested: 2,
            successful: 2,
            failed: 0,
            failures: None,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("failures").is_none());
    }

    #[test]
    fn batch_metadata_serializes_failures_when_present() {
        let meta = BatchMetadata {
            total_requested: 3,
            successful: 2,
            failed: 1,
            failures: Some(vec![BatchFailure {
                slide_id: SlideId::new("slide_002"),
                error: "provider overloaded".into(),
            }]),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["failures"][0]["slide_id"], "slide_002");
        assert_eq!(json["failed"], 1);
    }
}
