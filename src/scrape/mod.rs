//! Scrape executor — owns one browser context per attempt.
//!
//! Context lifecycle per attempt: open → navigate → content-stable →
//! capture → close. A failure at any stage still reaches close; the context
//! is released on every exit path, including the attempt-budget timeout,
//! which fires inside this module so cancellation cannot leak a tab.

pub mod extract;

use crate::config::Config;
use crate::renderer::{DeviceProfile, RenderContext, Renderer};
use anyhow::{bail, Context as _, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use extract::SnapshotExtractor;

/// Raw capture pulled out of the rendered page in one JS round trip.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageCapture {
    pub title: String,
    pub text: String,
    pub image_count: u32,
}

/// Bounded, extracted representation of a rendered listing page. Created per
/// successful attempt; discarded when the attempt fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapedSnapshot {
    pub place_name: String,
    pub directions_text: String,
    pub store_info_text: String,
    pub photo_count: u32,
    pub blog_review_count: u32,
    pub receipt_review_count: u32,
    pub menu_count: u32,
    pub menu_with_description_count: u32,
    pub full_text: String,
}

/// Reports the rendered page's visible text length.
const TEXT_LENGTH_JS: &str = "document.body ? document.body.innerText.length : 0";

/// Executes one scrape attempt against one candidate URL.
pub struct ScrapeExecutor {
    renderer: Arc<dyn Renderer>,
    extractor: Arc<dyn SnapshotExtractor>,
    profile: DeviceProfile,
    config: Arc<Config>,
}

impl ScrapeExecutor {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        extractor: Arc<dyn SnapshotExtractor>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            renderer,
            extractor,
            profile: DeviceProfile::mobile_listing(),
            config,
        }
    }

    /// Scrape one candidate URL within the given time budget.
    ///
    /// The budget is enforced here rather than by racing the whole call, so
    /// the context close below runs even when the attempt times out.
    pub async fn scrape(&self, url: &str, budget: Duration) -> Result<ScrapedSnapshot> {
        let mut ctx = self
            .renderer
            .new_context(&self.profile)
            .await
            .context("browser context open failed")?;

        let outcome = tokio::time::timeout(budget, self.drive(ctx.as_mut(), url)).await;

        if let Err(e) = ctx.close().await {
            warn!("browser context close failed: {e:#}");
        }

        match outcome {
            Ok(result) => result,
            Err(_) => bail!("scrape attempt exceeded its {}ms budget", budget.as_millis()),
        }
    }

    async fn drive(&self, ctx: &mut dyn RenderContext, url: &str) -> Result<ScrapedSnapshot> {
        ctx.navigate(url, self.config.nav_timeout_ms)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        if let Ok(landed) = ctx.get_url().await {
            debug!("landed on {landed}");
        }

        self.wait_for_content(ctx).await;

        let capture = self.capture(ctx).await.context("page capture failed")?;
        Ok(self.extractor.extract(&capture))
    }

    /// Content-stability heuristic: poll visible text length until it clears
    /// the configured threshold or the bounded wait elapses. Approximates
    /// "the dynamic content has painted" without a fixed sleep. Either way
    /// extraction proceeds with whatever is on screen.
    async fn wait_for_content(&self, ctx: &dyn RenderContext) {
        let deadline = Duration::from_millis(self.config.stability_wait_ms);
        let started = std::time::Instant::now();

        while started.elapsed() < deadline {
            let len = match ctx.execute_js(TEXT_LENGTH_JS).await {
                Ok(v) => v.as_f64().unwrap_or(0.0) as u64,
                Err(e) => {
                    debug!("stability poll failed: {e:#}");
                    0
                }
            };
            if len >= self.config.stability_min_text_len {
                debug!(
                    "content stable after {}ms ({len} chars)",
                    started.elapsed().as_millis()
                );
                return;
            }
            tokio::time::sleep(Duration::from_millis(self.config.stability_poll_ms)).await;
        }
        debug!("content stability wait elapsed without reaching threshold");
    }

    async fn capture(&self, ctx: &dyn RenderContext) -> Result<PageCapture> {
        let script = format!(
            r#"(() => {{
                const body = document.body;
                const text = body ? body.innerText.slice(0, {max_text}) : '';
                const heading = document.querySelector('h1, [role="heading"]');
                const title = (heading && heading.textContent.trim()) || document.title || '';
                const image_count = document.querySelectorAll('img[src]').length;
                return {{ title, text, image_count }};
            }})()"#,
            max_text = self.config.max_text_len,
        );

        let value = ctx.execute_js(&script).await?;
        let capture: PageCapture =
            serde_json::from_value(value).context("capture payload had unexpected shape")?;
        Ok(capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::extract::TextHeuristicExtractor;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Renderer whose contexts serve a canned page and record lifecycle.
    struct CannedRenderer {
        text: String,
        opened: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
        fail_navigation: bool,
    }

    struct CannedContext {
        text: String,
        closed: Arc<AtomicUsize>,
        fail_navigation: bool,
    }

    #[async_trait]
    impl Renderer for CannedRenderer {
        async fn new_context(&self, _profile: &DeviceProfile) -> Result<Box<dyn RenderContext>> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CannedContext {
                text: self.text.clone(),
                closed: Arc::clone(&self.closed),
                fail_navigation: self.fail_navigation,
            }))
        }
        async fn shutdown(&self) -> Result<()> {
            Ok(())
        }
        fn active_contexts(&self) -> usize {
            0
        }
    }

    #[async_trait]
    impl RenderContext for CannedContext {
        async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<()> {
            if self.fail_navigation {
                bail!("navigation to {url} refused");
            }
            Ok(())
        }
        async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
            if script.contains("innerText.length") {
                Ok(serde_json::json!(self.text.chars().count()))
            } else {
                Ok(serde_json::json!({
                    "title": "테스트 식당",
                    "text": self.text,
                    "image_count": 4,
                }))
            }
        }
        async fn get_url(&self) -> Result<String> {
            Ok("about:blank".to_string())
        }
        async fn close(self: Box<Self>) -> Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn executor_over(renderer: CannedRenderer) -> ScrapeExecutor {
        let mut config = Config::default();
        config.stability_min_text_len = 4;
        config.stability_wait_ms = 200;
        config.stability_poll_ms = 10;
        ScrapeExecutor::new(
            Arc::new(renderer),
            Arc::new(TextHeuristicExtractor::new(&config)),
            Arc::new(config),
        )
    }

    #[tokio::test]
    async fn test_scrape_happy_path_closes_context() {
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let executor = executor_over(CannedRenderer {
            text: "방문자 리뷰 80 블로그 리뷰 20 안녕하세요".to_string(),
            opened: Arc::clone(&opened),
            closed: Arc::clone(&closed),
            fail_navigation: false,
        });

        let snapshot = executor
            .scrape("https://m.place.naver.com/place/1/home", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(snapshot.place_name, "테스트 식당");
        assert_eq!(snapshot.receipt_review_count, 80);
        assert_eq!(snapshot.blog_review_count, 20);
        assert_eq!(snapshot.photo_count, 4);
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scrape_failure_still_closes_context() {
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let executor = executor_over(CannedRenderer {
            text: String::new(),
            opened: Arc::clone(&opened),
            closed: Arc::clone(&closed),
            fail_navigation: true,
        });

        let err = executor
            .scrape("https://m.place.naver.com/place/1/home", Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("navigation"));
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scrape_budget_timeout_closes_context() {
        // Text never reaches the stability threshold, so the attempt spends
        // its whole budget polling and must still release the context.
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let renderer = CannedRenderer {
            text: "짧음".to_string(),
            opened: Arc::clone(&opened),
            closed: Arc::clone(&closed),
            fail_navigation: false,
        };
        let mut config = Config::default();
        config.stability_min_text_len = 10_000;
        config.stability_wait_ms = 60_000;
        config.stability_poll_ms = 10;
        let executor = ScrapeExecutor::new(
            Arc::new(renderer),
            Arc::new(TextHeuristicExtractor::new(&config)),
            Arc::new(config),
        );

        let err = executor
            .scrape(
                "https://m.place.naver.com/place/1/home",
                Duration::from_millis(50),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("budget"));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
