//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over the
//! browser engine (currently Chromium via chromiumoxide). A context is one
//! isolated tab configured with a device profile; the scrape executor opens
//! one per attempt and closes it on every exit path.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;

/// Device emulation applied to a context before navigation, matching the
/// page variant being scraped.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub user_agent: String,
    pub accept_language: String,
    pub platform: String,
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
    pub mobile: bool,
}

impl DeviceProfile {
    /// Mobile profile for the listing platform's mobile surface.
    pub fn mobile_listing() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                         AppleWebKit/605.1.15 (KHTML, like Gecko) \
                         Version/17.0 Mobile/15E148 Safari/604.1"
                .to_string(),
            accept_language: "ko-KR,ko;q=0.9".to_string(),
            platform: "iPhone".to_string(),
            width: 390,
            height: 844,
            device_scale_factor: 3.0,
            mobile: true,
        }
    }
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new isolated context (tab) with the given device profile.
    async fn new_context(&self, profile: &DeviceProfile) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL, waiting only for initial DOM construction.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A no-op renderer used when Chromium is unavailable.
///
/// The service still starts (health endpoint, social path), but place
/// diagnoses fail at the first scrape attempt.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self, _profile: &DeviceProfile) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("browser not available"))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
    fn active_contexts(&self) -> usize {
        0
    }
}
