// Copyright 2026 Placelens Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end place diagnosis: resolve → candidates → scrape under a shared
//! deadline → extract → score → cache.
//!
//! Candidates are tried strictly sequentially — one browser context at a
//! time per request, and "first success" stays a well-defined, reproducible
//! outcome. The deadline is shared across all candidates, never reset per
//! attempt.

use crate::cache::{self, TtlCache};
use crate::config::Config;
use crate::error::DiagnosisError;
use crate::metrics::{self, KeywordSet};
use crate::resolver::{self, ResolvedTarget, Resolver};
use crate::scoring::{self, Grade, ScoreBreakdownItem};
use crate::scrape::{ScrapeExecutor, ScrapedSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Signal counts surfaced alongside the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisMetrics {
    pub photo_count: u32,
    pub blog_review_count: u32,
    pub receipt_review_count: u32,
    pub menu_count: u32,
    pub menu_with_description_count: u32,
    pub directions_chars: u32,
    pub store_info_chars: u32,
}

/// Final diagnosis for one listing. Immutable once produced; cached by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub place_id: String,
    pub place_name: String,
    pub canonical_url: String,
    pub score: u32,
    pub grade: Grade,
    pub breakdown: Vec<ScoreBreakdownItem>,
    pub recommendations: Vec<String>,
    pub keywords: KeywordSet,
    pub metrics: DiagnosisMetrics,
    pub diagnosed_at: DateTime<Utc>,
}

/// A diagnosis plus the request-scoped context the API layer surfaces as
/// debug data.
#[derive(Debug, Clone)]
pub struct DiagnosisOutcome {
    pub result: DiagnosisResult,
    pub target: ResolvedTarget,
    pub candidates: Vec<String>,
    pub cache_hit: bool,
    pub elapsed_ms: u64,
}

/// The place-diagnosis pipeline with its injected collaborators.
pub struct PlaceDiagnoser {
    resolver: Resolver,
    executor: ScrapeExecutor,
    cache: TtlCache<DiagnosisResult>,
    config: std::sync::Arc<Config>,
}

impl PlaceDiagnoser {
    pub fn new(
        resolver: Resolver,
        executor: ScrapeExecutor,
        config: std::sync::Arc<Config>,
    ) -> Self {
        let cache = TtlCache::new(Duration::from_secs(config.cache_ttl_secs));
        Self {
            resolver,
            executor,
            cache,
            config,
        }
    }

    /// Diagnose one listing URL.
    pub async fn diagnose(&self, input_url: &str) -> Result<DiagnosisOutcome, DiagnosisError> {
        let started = Instant::now();

        let normalized = resolver::normalize_url(input_url);
        if normalized.is_empty() || !resolver::is_supported_host(&normalized) {
            return Err(DiagnosisError::InvalidUrl);
        }

        let target = self.resolver.resolve(input_url).await;
        let Some(place_id) = target.place_id.clone() else {
            return Err(DiagnosisError::PlaceIdNotFound);
        };

        let key = cache::place_key(&place_id);
        if let Some(result) = self.cache.get(&key) {
            info!("cache hit for {key}");
            return Ok(DiagnosisOutcome {
                candidates: Vec::new(),
                cache_hit: true,
                elapsed_ms: started.elapsed().as_millis() as u64,
                result,
                target,
            });
        }

        let candidates = resolver::build_candidates(
            target.place_id.as_deref(),
            target.type_hint.as_deref(),
        );
        let snapshot = self.run_candidates(&candidates).await?;

        let keywords = metrics::extract_keywords(&snapshot.full_text, &self.config.keyword);
        let card = scoring::score(&snapshot, &keywords);
        let result = assemble(&place_id, &target, &snapshot, keywords, card);

        self.cache.set(&key, result.clone());
        info!(
            "diagnosed place {place_id}: score {} ({}) in {}ms",
            result.score,
            result.grade,
            started.elapsed().as_millis()
        );

        Ok(DiagnosisOutcome {
            result,
            target,
            candidates,
            cache_hit: false,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Try candidates in order against the shared deadline. First success
    /// short-circuits; deadline exhaustion is `Timeout` regardless of
    /// remaining untried candidates; candidate exhaustion is `ScrapeFailed`
    /// carrying the *last* attempt's error.
    async fn run_candidates(
        &self,
        candidates: &[String],
    ) -> Result<ScrapedSnapshot, DiagnosisError> {
        let deadline = Duration::from_millis(self.config.overall_deadline_ms);
        let started = Instant::now();
        let mut last_error: Option<anyhow::Error> = None;

        for url in candidates {
            let remaining = deadline.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(DiagnosisError::Timeout);
            }

            match self.executor.scrape(url, remaining).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => {
                    warn!("candidate {url} failed: {e:#}");
                    if started.elapsed() >= deadline {
                        return Err(DiagnosisError::Timeout);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(DiagnosisError::ScrapeFailed {
            detail: last_error
                .map(|e| format!("{e:#}"))
                .unwrap_or_else(|| "no candidates attempted".to_string()),
        })
    }

    pub fn cache(&self) -> &TtlCache<DiagnosisResult> {
        &self.cache
    }
}

fn assemble(
    place_id: &str,
    target: &ResolvedTarget,
    snapshot: &ScrapedSnapshot,
    keywords: KeywordSet,
    card: scoring::ScoreCard,
) -> DiagnosisResult {
    DiagnosisResult {
        place_id: place_id.to_string(),
        place_name: snapshot.place_name.clone(),
        canonical_url: target.canonical_url.clone(),
        score: card.score,
        grade: card.grade,
        breakdown: card.breakdown,
        recommendations: card.recommendations,
        keywords,
        metrics: DiagnosisMetrics {
            photo_count: snapshot.photo_count,
            blog_review_count: snapshot.blog_review_count,
            receipt_review_count: snapshot.receipt_review_count,
            menu_count: snapshot.menu_count,
            menu_with_description_count: snapshot.menu_with_description_count,
            directions_chars: snapshot.directions_text.chars().count() as u32,
            store_info_chars: snapshot.store_info_text.chars().count() as u32,
        },
        diagnosed_at: Utc::now(),
    }
}
