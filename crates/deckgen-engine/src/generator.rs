use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use deckgen_core::provider::LlmClient;
use deckgen_core::requests::{TableGenerationRequest, TextGenerationRequest};
use deckgen_core::responses::{GeneratedTable, GeneratedText, TableMetadata, TextMetadata};
use deckgen_store::{ContentType, SessionStore, SlideContext};

use crate::analyzer;
use crate::error::EngineError;
use crate::prompt;

/// Character budget assumed when a text request carries none.
const DEFAULT_MAX_CHARACTERS: u32 = 300;
/// History budget for prompt context. Fixed at the single most recent
/// slide to bound prompt size.
const CONTEXT_SLIDE_BUDGET: usize = 1;
const DEFAULT_MAX_ROWS: u32 = 10;
const DEFAULT_MAX_COLUMNS: u32 = 5;

#[derive(Clone, Copy, Debug)]
pub struct GeneratorConfig {
    /// Acceptable fractional deviation from the target word count.
    pub word_count_tolerance: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self { word_count_tolerance: 0.10 }
    }
}

/// Per-request generation pipeline: resolve session, summarize history,
/// render prompt, invoke the model, analyze output, record the slide.
/// A failure at any step leaves the session untouched.
pub struct ContentGenerator {
    llm: Arc<dyn LlmClient>,
    sessions: Arc<SessionStore>,
    config: GeneratorConfig,
}

impl ContentGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, sessions: Arc<SessionStore>, config: GeneratorConfig) -> Self {
        Self { llm, sessions, config }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    #[instrument(skip_all, fields(presentation_id = %request.presentation_id, slide_id = %request.slide_id))]
    pub async fn generate_text(
        &self,
        request: &TextGenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedText, EngineError> {
        let started = Instant::now();

        let _session = self
            .sessions
            .get_or_create(
                &request.presentation_id,
                request.context.theme.clone(),
                request.context.audience.clone(),
            )
            .await?;

        let previous_context = self
            .sessions
            .get_context_summary(&request.presentation_id, CONTEXT_SLIDE_BUDGET)
            .await;

        let max_chars = request.constraints.max_characters.unwrap_or(DEFAULT_MAX_CHARACTERS);
        let target_words = analyzer::estimate_target_words(max_chars);

        let topics_formatted = request
            .topics
            .iter()
            .map(|topic| format!("- {topic}"))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = prompt::text_generation(&prompt::TextPromptInputs {
            target_words,
            tolerance: self.config.word_count_tolerance,
            previous_context: &previous_context,
            theme: request.context.theme.as_deref().unwrap_or("professional"),
            audience: request.context.audience.as_deref().unwrap_or("general"),
            slide_title: request.context.slide_title.as_deref().unwrap_or(""),
            narrative: &request.narrative,
            topics: &topics_formatted,
        });

        let completion = self.llm.generate(&prompt).await?;

        let content = analyzer::clean_model_output(&completion.content);
        let word_count = analyzer::count_words(&content);
        let variance =
            analyzer::word_count_variance(word_count, target_words, self.config.word_count_tolerance);
        let html_tags_used = analyzer::extract_tags(&content);

        let metadata = TextMetadata {
            word_count,
            target_word_count: target_words,
            variance_percent: round1(variance.percent),
            within_tolerance: variance.within_tolerance,
            html_tags_used,
            generation_time_ms: elapsed_ms(started),
            model_used: completion.model,
            provider: completion.provider,
            prompt_tokens: completion.usage.prompt_tokens,
            completion_tokens: completion.usage.completion_tokens,
            total_tokens: completion.usage.total_tokens(),
        };

        // Late results are dropped, never applied to the session after the
        // caller has abandoned the request.
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let main_theme = request
            .topics
            .first()
            .map(String::as_str)
            .unwrap_or("content");
        let slide = SlideContext::new(
            request.slide_id.clone(),
            request.slide_number,
            request.context.slide_title.clone(),
            format!(
                "{main_theme} - {word_count} words covering {} topics",
                request.topics.len()
            ),
            request.topics.iter().take(3).cloned().collect(),
            ContentType::Text,
        );
        self.sessions.add_slide(&request.presentation_id, slide).await?;

        info!(
            word_count,
            target_words,
            variance_percent = metadata.variance_percent,
            "text generated"
        );

        Ok(GeneratedText { content, metadata })
    }

    #[instrument(skip_all, fields(presentation_id = %request.presentation_id, slide_id = %request.slide_id))]
    pub async fn generate_table(
        &self,
        request: &TableGenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedTable, EngineError> {
        let started = Instant::now();

        let _session = self
            .sessions
            .get_or_create(
                &request.presentation_id,
                request.context.theme.clone(),
                request.context.audience.clone(),
            )
            .await?;

        let previous_context = self
            .sessions
            .get_context_summary(&request.presentation_id, CONTEXT_SLIDE_BUDGET)
            .await;

        let data_formatted = request
            .data
            .as_ref()
            .and_then(|value| serde_json::to_string_pretty(value).ok())
            .unwrap_or_else(|| "No data provided".to_string());

        let prompt = prompt::table_generation(&prompt::TablePromptInputs {
            description: &request.description,
            data: &data_formatted,
            previous_context: &previous_context,
            theme: request.context.theme.as_deref().unwrap_or("professional"),
            audience: request.context.audience.as_deref().unwrap_or("general"),
            slide_title: request.context.slide_title.as_deref().unwrap_or(""),
            max_rows: request.constraints.max_rows.unwrap_or(DEFAULT_MAX_ROWS),
            max_columns: request.constraints.max_columns.unwrap_or(DEFAULT_MAX_COLUMNS),
        });

        let completion = self.llm.generate(&prompt).await?;

        let html = analyzer::clean_model_output(&completion.content);
        let stats = analyzer::analyze_table(&html);

        let metadata = TableMetadata {
            rows: stats.rows,
            columns: stats.columns,
            data_points: stats.data_points,
            has_header: stats.has_header,
            numeric_columns: stats.numeric_column_count,
            table_classes: stats.css_classes,
            generation_time_ms: elapsed_ms(started),
            model_used: completion.model,
            provider: completion.provider,
            prompt_tokens: completion.usage.prompt_tokens,
            completion_tokens: completion.usage.completion_tokens,
            total_tokens: completion.usage.total_tokens(),
        };

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let slide = SlideContext::new(
            request.slide_id.clone(),
            request.slide_number,
            request.context.slide_title.clone(),
            format!(
                "Table: {} ({}x{})",
                request.description, metadata.rows, metadata.columns
            ),
            vec![request.description.clone()],
            ContentType::Table,
        );
        self.sessions.add_slide(&request.presentation_id, slide).await?;

        info!(
            rows = metadata.rows,
            columns = metadata.columns,
            data_points = metadata.data_points,
            "table generated"
        );

        Ok(GeneratedTable { html, metadata })
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn elapsed_ms(started: Instant) -> f64 {
    let ms = started.elapsed().as_secs_f64() * 1000.0;
    (ms * 100.0).round() / 100.0
}
