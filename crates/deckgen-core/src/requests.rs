use serde::{Deserialize, Serialize};

use crate::ids::{PresentationId, SlideId};

/// Presentation context shared by text and table requests.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RequestContext {
    pub theme: Option<String>,
    pub audience: Option<String>,
    pub slide_title: Option<String>,
}

/// Constraints for text generation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TextConstraints {
    pub max_characters: Option<u32>,
    pub style: Option<String>,
    pub tone: Option<String>,
}

/// Constraints for table generation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TableConstraints {
    pub max_rows: Option<u32>,
    pub max_columns: Option<u32>,
    pub style: Option<String>,
}

/// Request for one HTML text fragment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextGenerationRequest {
    pub presentation_id: PresentationId,
    pub slide_id: SlideId,
    pub slide_number: i64,
    /// Key points to expand into full content.
    pub topics: Vec<String>,
    /// Overall narrative for this slide.
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub context: RequestContext,
    #[serde(default)]
    pub constraints: TextConstraints,
}

/// Request for one HTML data table. The model structures the table from
/// the description; raw data is optional.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableGenerationRequest {
    pub presentation_id: PresentationId,
    pub slide_id: SlideId,
    pub slide_number: i64,
    pub description: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub context: RequestContext,
    #[serde(default)]
    pub constraints: TableConstraints,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchTextGenerationRequest {
    pub requests: Vec<TextGenerationRequest>,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchTableGenerationRequest {
    pub requests: Vec<TableGenerationRequest>,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_request_minimal_body_deserializes() {
        let json = r#"{
            "presentation_id": "pres_12345",
            "slide_id": "slide_001",
            "slide_number": 1,
            "topics": ["Revenue growth"]
        }"#;
        let req: TextGenerationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.presentation_id.as_str(), "pres_12345");
        assert!(req.narrative.is_empty());
        assert!(req.context.theme.is_none());
        assert!(req.constraints.max_characters.is_none());
    }

    #[test]
    fn text_request_full_body_deserializes() {
        let json = r#"{
            "presentation_id": "pres_12345",
            "slide_id": "slide_001",
            "slide_number": 1,
            "topics": ["Revenue growth", "Market expansion"],
            "narrative": "Strong Q3 performance",
            "context": {"theme": "professional", "audience": "executives", "slide_title": "Q3 Results"},
            "constraints": {"max_characters": 300, "style": "professional", "tone": "data-driven"}
        }"#;
        let req: TextGenerationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.context.theme.as_deref(), Some("professional"));
        assert_eq!(req.constraints.max_characters, Some(300));
    }

    #[test]
    fn table_request_accepts_nested_data() {
        let json = r#"{
            "presentation_id": "pres_12345",
            "slide_id": "slide_003",
            "slide_number": 3,
            "description": "Quarterly revenue by region",
            "data": {"Q2": {"NA": 45.2}, "Q3": {"NA": 58.3}},
            "constraints": {"max_rows": 10, "max_columns": 5}
        }"#;
        let req: TableGenerationRequest = serde_json::from_str(json).unwrap();
        assert!(req.data.is_some());
        assert_eq!(req.constraints.max_rows, Some(10));
    }

    #[test]
    fn batch_parallel_defaults_to_true() {
        let json = r#"{"requests": []}"#;
        let req: BatchTextGenerationRequest = serde_json::from_str(json).unwrap();
        assert!(req.parallel);
    }
}
