//! Search unit: the executable wrapper around one source.
//!
//! A performer runs a two-phase state machine: fetch and parse search
//! result pages (streaming batches out as they arrive), then, for crawling
//! sources, promote every preliminary hit via a detail-page fetch.
//! Cancellation is cooperative: `stop()` sets a flag that is checked at the
//! top of the page loop and before every crawl fetch; an in-flight fetch is
//! left to complete or time out on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::fetcher::{FetchError, FetchRequest, PageFetcher};
use crate::metrics;

use super::source::{encode_keywords, SourceExtractor, SourceSpec};
use super::types::{SearchHit, SearchPhase, SearchToken, SessionListener, SourceError};

/// How many detail crawls of one unit may be in flight at once.
const DEFAULT_CRAWL_CONCURRENCY: usize = 4;

/// One source's executable search unit.
///
/// A performer executes at most once and is not restartable. It is shared
/// between the caller (which may call `stop()` from any thread) and the
/// orchestrator worker that polls the stop flag while running `perform()`.
pub struct SearchPerformer {
    token: SearchToken,
    keywords: String,
    encoded_keywords: String,
    spec: SourceSpec,
    extractor: Arc<dyn SourceExtractor>,
    fetcher: Arc<dyn PageFetcher>,
    crawl_concurrency: usize,
    stopped: AtomicBool,
    ddos_active: AtomicBool,
    performed: AtomicBool,
}

impl SearchPerformer {
    pub fn new(
        token: SearchToken,
        keywords: impl Into<String>,
        spec: SourceSpec,
        extractor: Arc<dyn SourceExtractor>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        let keywords = keywords.into();
        let encoded_keywords = encode_keywords(&keywords);
        Self {
            token,
            keywords,
            encoded_keywords,
            spec,
            extractor,
            fetcher,
            crawl_concurrency: DEFAULT_CRAWL_CONCURRENCY,
            stopped: AtomicBool::new(false),
            ddos_active: AtomicBool::new(false),
            performed: AtomicBool::new(false),
        }
    }

    pub fn with_crawl_concurrency(mut self, concurrency: usize) -> Self {
        self.crawl_concurrency = concurrency.max(1);
        self
    }

    pub fn token(&self) -> SearchToken {
        self.token
    }

    pub fn source_name(&self) -> &str {
        &self.spec.name
    }

    pub fn keywords(&self) -> &str {
        &self.keywords
    }

    pub fn is_crawler(&self) -> bool {
        self.spec.crawler
    }

    /// Request cooperative stop. Idempotent, callable from any thread.
    /// Does not block and does not guarantee immediate cessation.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Soft signal that the source served a DDOS challenge or captcha
    /// during this run. Callers may poll this after completion to suppress
    /// retries against the source for a cool-down period.
    pub fn is_ddos_protection_active(&self) -> bool {
        self.ddos_active.load(Ordering::SeqCst)
    }

    /// Run the unit. Callable exactly once; a second call is a no-op.
    ///
    /// Batches are emitted to `listener` as soon as they are extracted;
    /// nothing is buffered to the end. Page and crawl failures are reported
    /// via `on_error` and do not abort the unit unless the extractor
    /// declares them fatal.
    pub async fn perform(&self, listener: Arc<dyn SessionListener>) {
        if self.performed.swap(true, Ordering::SeqCst) {
            warn!(source = %self.spec.name, "perform() called twice, ignoring");
            return;
        }

        metrics::UNITS_STARTED
            .with_label_values(&[&self.spec.name])
            .inc();
        let started = Instant::now();

        let mut crawl_budget = self.spec.max_crawls as usize;

        for page in 0..self.spec.max_pages {
            if self.is_stopped() {
                debug!(source = %self.spec.name, page, "Stop observed, ending pagination");
                break;
            }

            let request = self.extractor.search_request(&self.encoded_keywords, page);
            let body = match self.fetch(&request).await {
                Ok(body) => body,
                Err(e) => {
                    self.report_error(
                        &listener,
                        SourceError::fetch(&self.spec.name, SearchPhase::SearchPage(page), e),
                    );
                    continue;
                }
            };
            metrics::PAGES_FETCHED
                .with_label_values(&[&self.spec.name])
                .inc();

            if self.extractor.is_block_page(&body) {
                self.ddos_active.store(true, Ordering::SeqCst);
                metrics::BLOCK_PAGES
                    .with_label_values(&[&self.spec.name])
                    .inc();
                self.report_error(&listener, SourceError::block_page(&self.spec.name, page));
                break;
            }

            let hits = match self.extractor.parse_search_page(&body) {
                Ok(hits) => hits,
                Err(e) => {
                    let fatal = e.is_fatal();
                    self.report_error(
                        &listener,
                        SourceError::extract(&self.spec.name, SearchPhase::SearchPage(page), e),
                    );
                    if fatal {
                        break;
                    }
                    continue;
                }
            };

            if hits.is_empty() {
                debug!(source = %self.spec.name, page, "Empty page, ending pagination");
                break;
            }

            let (complete, preliminary): (Vec<_>, Vec<_>) =
                hits.into_iter().partition(|h| h.complete);

            if !complete.is_empty() && !self.is_stopped() {
                listener.on_results(self.token, complete);
            }

            if preliminary.is_empty() {
                continue;
            }

            if !self.spec.crawler {
                warn!(
                    source = %self.spec.name,
                    discarded = preliminary.len(),
                    "Non-crawler source produced preliminary hits, discarding"
                );
                continue;
            }

            let batch: Vec<SearchHit> = preliminary
                .into_iter()
                .take(crawl_budget)
                .collect();
            crawl_budget -= batch.len();
            self.crawl_batch(batch, &listener).await;

            if crawl_budget == 0 {
                debug!(source = %self.spec.name, "Crawl budget exhausted, ending pagination");
                break;
            }
        }

        metrics::UNIT_RUN_SECONDS
            .with_label_values(&[&self.spec.name])
            .observe(started.elapsed().as_secs_f64());
    }

    /// Phase two: promote preliminary hits to final hits.
    ///
    /// Crawls of different hits run concurrently; each emits its own batch
    /// on completion, so final hits may arrive out of order relative to
    /// each other. Every crawl re-checks the stop flag before fetching.
    async fn crawl_batch(&self, hits: Vec<SearchHit>, listener: &Arc<dyn SessionListener>) {
        stream::iter(hits)
            .for_each_concurrent(self.crawl_concurrency, |hit| {
                let listener = Arc::clone(listener);
                async move {
                    if self.is_stopped() {
                        return;
                    }
                    self.crawl_one(hit, &listener).await;
                }
            })
            .await;
    }

    async fn crawl_one(&self, hit: SearchHit, listener: &Arc<dyn SessionListener>) {
        let Some(handle) = hit.crawl_handle.clone() else {
            self.report_error(
                listener,
                SourceError::contract(
                    &self.spec.name,
                    format!("preliminary hit without crawl handle: {}", hit.title),
                ),
            );
            return;
        };

        let request = FetchRequest::get(handle);
        let body = match self.fetch(&request).await {
            Ok(body) => body,
            Err(e) => {
                self.report_error(
                    listener,
                    SourceError::fetch(&self.spec.name, SearchPhase::Crawl, e),
                );
                return;
            }
        };
        metrics::CRAWLS_PERFORMED
            .with_label_values(&[&self.spec.name])
            .inc();

        match self.extractor.parse_detail_page(&body, &hit) {
            Ok(finals) => {
                // Invariant: only promoted, complete hits leave the unit.
                let finals: Vec<SearchHit> =
                    finals.into_iter().filter(|h| h.complete).collect();
                if !finals.is_empty() && !self.is_stopped() {
                    listener.on_results(self.token, finals);
                }
            }
            Err(e) => {
                self.report_error(
                    listener,
                    SourceError::extract(&self.spec.name, SearchPhase::Crawl, e),
                );
            }
        }
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, FetchError> {
        match tokio::time::timeout(self.spec.fetch_timeout(), self.fetcher.fetch(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: request.url.clone(),
            }),
        }
    }

    fn report_error(&self, listener: &Arc<dyn SessionListener>, error: SourceError) {
        metrics::SOURCE_ERRORS
            .with_label_values(&[&self.spec.name])
            .inc();
        debug!(source = %self.spec.name, error = %error, "Source error");
        listener.on_error(self.token, error);
    }
}
