//! Batch fan-out over the single-request pipeline.
//!
//! Parallel mode runs every pipeline concurrently on the cooperative
//! scheduler; one request's failure never aborts the others. Sequential
//! mode runs in list order and logs-and-continues on failure. Both modes
//! report the same per-item failure detail.

use std::future::Future;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use deckgen_core::ids::SlideId;
use deckgen_core::requests::{TableGenerationRequest, TextGenerationRequest};
use deckgen_core::responses::{
    BatchFailure, BatchMetadata, BatchResponse, GeneratedTable, GeneratedText,
};

use crate::error::EngineError;
use crate::generator::ContentGenerator;

/// Aggregate of one batch run; the wire shape callers receive.
pub type BatchOutcome<T> = BatchResponse<T>;

impl ContentGenerator {
    pub async fn run_text_batch(
        &self,
        requests: &[TextGenerationRequest],
        parallel: bool,
        cancel: &CancellationToken,
    ) -> BatchOutcome<GeneratedText> {
        let batch_id = Uuid::now_v7();
        info!(batch_id = %batch_id, total = requests.len(), parallel, "text batch started");

        let ids = requests.iter().map(|r| r.slide_id.clone()).collect();
        let futures: Vec<_> = requests
            .iter()
            .map(|request| self.generate_text(request, cancel))
            .collect();
        collect(ids, futures, parallel).await
    }

    pub async fn run_table_batch(
        &self,
        requests: &[TableGenerationRequest],
        parallel: bool,
        cancel: &CancellationToken,
    ) -> BatchOutcome<GeneratedTable> {
        let batch_id = Uuid::now_v7();
        info!(batch_id = %batch_id, total = requests.len(), parallel, "table batch started");

        let ids = requests.iter().map(|r| r.slide_id.clone()).collect();
        let futures: Vec<_> = requests
            .iter()
            .map(|request| self.generate_table(request, cancel))
            .collect();
        collect(ids, futures, parallel).await
    }
}

async fn collect<T, F>(ids: Vec<SlideId>, futures: Vec<F>, parallel: bool) -> BatchOutcome<T>
where
    F: Future<Output = Result<T, EngineError>>,
{
    let total_requested = ids.len();

    let outcomes = if parallel {
        join_all(futures).await
    } else {
        let mut outcomes = Vec::with_capacity(total_requested);
        for future in futures {
            outcomes.push(future.await);
        }
        outcomes
    };

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for (slide_id, outcome) in ids.into_iter().zip(outcomes) {
        match outcome {
            Ok(result) => results.push(result),
            Err(error) => {
                warn!(slide_id = %slide_id, error = %error, "batch item failed");
                failures.push(BatchFailure {
                    slide_id,
                    error: error.to_string(),
                });
            }
        }
    }

    let metadata = BatchMetadata {
        total_requested,
        successful: results.len(),
        failed: failures.len(),
        failures: if failures.is_empty() { None } else { Some(failures) },
    };

    BatchOutcome { results, metadata }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use deckgen_core::ids::PresentationId;
    use deckgen_core::requests::{RequestContext, TextConstraints};
    use deckgen_llm::mock::MockClient;
    use deckgen_store::{SessionStore, SessionStoreConfig};

    use crate::generator::GeneratorConfig;

    fn generator(llm: MockClient) -> ContentGenerator {
        ContentGenerator::new(
            Arc::new(llm),
            Arc::new(SessionStore::in_memory(SessionStoreConfig::default())),
            GeneratorConfig::default(),
        )
    }

    fn request(slide: &str, number: i64, topic: &str) -> TextGenerationRequest {
        TextGenerationRequest {
            presentation_id: PresentationId::new("pres_batch"),
            slide_id: SlideId::new(slide),
            slide_number: number,
            topics: vec![topic.to_string()],
            narrative: String::new(),
            context: RequestContext::default(),
            constraints: TextConstraints::default(),
        }
    }

    #[tokio::test]
    async fn parallel_batch_isolates_single_failure() {
        // Request #2 carries the marker topic; only its prompt fails.
        let gen = generator(MockClient::failing_on("POISON", "<p>fine output</p>"));
        let requests = vec![
            request("slide_001", 1, "Revenue growth"),
            request("slide_002", 2, "POISON topic"),
            request("slide_003", 3, "Cost efficiency"),
        ];
        let cancel = CancellationToken::new();

        let outcome = gen.run_text_batch(&requests, true, &cancel).await;

        assert_eq!(outcome.metadata.total_requested, 3);
        assert_eq!(outcome.metadata.successful, 2);
        assert_eq!(outcome.metadata.failed, 1);
        let failures = outcome.metadata.failures.as_ref().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].slide_id.as_str(), "slide_002");
        assert!(failures[0].error.contains("provider"));

        // Both surviving requests recorded their slides.
        let session = gen
            .sessions()
            .get_session_context(&PresentationId::new("pres_batch"))
            .await
            .unwrap()
            .unwrap();
        let mut ids: Vec<&str> = session
            .slide_history
            .iter()
            .map(|s| s.slide_id.as_str())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["slide_001", "slide_003"]);
    }

    #[tokio::test]
    async fn parallel_batch_all_successes_omits_failures() {
        let gen = generator(MockClient::canned("<p>ok</p>"));
        let requests = vec![
            request("slide_001", 1, "A"),
            request("slide_002", 2, "B"),
        ];
        let cancel = CancellationToken::new();

        let outcome = gen.run_text_batch(&requests, true, &cancel).await;

        assert_eq!(outcome.metadata.successful, 2);
        assert_eq!(outcome.metadata.failed, 0);
        assert!(outcome.metadata.failures.is_none());

        let json = serde_json::to_value(&outcome.metadata).unwrap();
        assert!(json.get("failures").is_none());
    }

    #[tokio::test]
    async fn sequential_batch_continues_past_failure() {
        let gen = generator(MockClient::failing_on("POISON", "<p>fine output</p>"));
        let requests = vec![
            request("slide_001", 1, "First"),
            request("slide_002", 2, "POISON"),
            request("slide_003", 3, "Third"),
        ];
        let cancel = CancellationToken::new();

        let outcome = gen.run_text_batch(&requests, false, &cancel).await;

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.metadata.failed, 1);
        // Sequential mode reports the same per-item detail as parallel mode.
        let failures = outcome.metadata.failures.as_ref().unwrap();
        assert_eq!(failures[0].slide_id.as_str(), "slide_002");

        let session = gen
            .sessions()
            .get_session_context(&PresentationId::new("pres_batch"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.slide_history.len(), 2);
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_outcome() {
        let gen = generator(MockClient::canned("<p>ok</p>"));
        let cancel = CancellationToken::new();

        let outcome = gen.run_text_batch(&[], true, &cancel).await;
        assert_eq!(outcome.metadata.total_requested, 0);
        assert_eq!(outcome.metadata.successful, 0);
        assert!(outcome.metadata.failures.is_none());
    }

    #[tokio::test]
    async fn table_batch_runs_in_parallel() {
        use deckgen_core::requests::{TableConstraints, TableGenerationRequest};

        let html = "<table><tr><td>x</td></tr></table>";
        let gen = generator(MockClient::canned(html));
        let requests = vec![
            TableGenerationRequest {
                presentation_id: PresentationId::new("pres_batch"),
                slide_id: SlideId::new("slide_010"),
                slide_number: 10,
                description: "A".into(),
                data: None,
                context: RequestContext::default(),
                constraints: TableConstraints::default(),
            },
            TableGenerationRequest {
                presentation_id: PresentationId::new("pres_batch"),
                slide_id: SlideId::new("slide_011"),
                slide_number: 11,
                description: "B".into(),
                data: None,
                context: RequestContext::default(),
                constraints: TableConstraints::default(),
            },
        ];
        let cancel = CancellationToken::new();

        let outcome = gen.run_table_batch(&requests, true, &cancel).await;
        assert_eq!(outcome.metadata.successful, 2);
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0].metadata.rows, 1);
    }
}
