//! Runtime configuration for the diagnosis pipeline.
//!
//! Every tunable has a compiled-in default and an optional `PLACELENS_*`
//! environment override, so operators can adjust deadlines and thresholds
//! without a rebuild. The keyword stopword list is configuration rather than
//! code: it is a locale-specific heuristic, not a correctness-bearing
//! algorithm.

use std::collections::HashSet;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Overall wall-clock budget for one place diagnosis, shared across all
    /// scrape candidates (not reset per candidate).
    pub overall_deadline_ms: u64,
    /// Per-attempt navigation timeout (initial DOM construction only).
    pub nav_timeout_ms: u64,
    /// Visible-text length at which the page counts as painted.
    pub stability_min_text_len: u64,
    /// Maximum time to wait for the content-stability condition.
    pub stability_wait_ms: u64,
    /// Poll interval for the content-stability condition.
    pub stability_poll_ms: u64,
    /// Cap on the captured visible-text snapshot, in characters.
    pub max_text_len: usize,
    /// Cap on extracted section texts (directions, store info), in characters.
    pub max_section_len: usize,
    /// Timeout for the single redirect-resolution HTTP GET.
    pub resolver_timeout_ms: u64,
    /// Result cache time-to-live, in seconds. 12 hours by default.
    pub cache_ttl_secs: u64,
    /// Base URL of the social platform (overridable for tests).
    pub social_base_url: String,
    /// Keyword extraction tunables.
    pub keyword: KeywordConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overall_deadline_ms: 55_000,
            nav_timeout_ms: 15_000,
            stability_min_text_len: 600,
            stability_wait_ms: 8_000,
            stability_poll_ms: 250,
            max_text_len: 20_000,
            max_section_len: 800,
            resolver_timeout_ms: 10_000,
            cache_ttl_secs: 12 * 60 * 60,
            social_base_url: "https://www.instagram.com".to_string(),
            keyword: KeywordConfig::default(),
        }
    }
}

impl Config {
    /// Build a config from defaults plus `PLACELENS_*` environment overrides.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.overall_deadline_ms = env_u64("PLACELENS_DEADLINE_MS", cfg.overall_deadline_ms);
        cfg.nav_timeout_ms = env_u64("PLACELENS_NAV_TIMEOUT_MS", cfg.nav_timeout_ms);
        cfg.stability_min_text_len =
            env_u64("PLACELENS_STABILITY_MIN_TEXT", cfg.stability_min_text_len);
        cfg.stability_wait_ms = env_u64("PLACELENS_STABILITY_WAIT_MS", cfg.stability_wait_ms);
        cfg.cache_ttl_secs = env_u64("PLACELENS_CACHE_TTL_S", cfg.cache_ttl_secs);
        if let Ok(base) = std::env::var("PLACELENS_SOCIAL_BASE_URL") {
            if !base.trim().is_empty() {
                cfg.social_base_url = base.trim().trim_end_matches('/').to_string();
            }
        }
        cfg
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

/// Keyword extraction configuration.
///
/// The stopword list covers Korean particles and the listing platform's own
/// UI chrome (tab labels, button captions) that would otherwise dominate any
/// frequency count of the rendered page.
#[derive(Debug, Clone)]
pub struct KeywordConfig {
    pub stopwords: HashSet<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        let words = [
            // particles and fillers
            "이", "그", "저", "것", "수", "등", "및", "더", "좀", "요", "은", "는", "을", "를",
            "에서", "으로", "까지", "부터", "하는", "있는", "있습니다", "합니다", "입니다",
            "해주세요", "같은", "너무", "정말", "진짜",
            // platform chrome
            "네이버", "지도", "리뷰", "블로그", "방문자", "사진", "메뉴", "홈", "정보", "주변",
            "공유", "저장", "복사", "예약", "문의", "전화", "길찾기", "영업시간", "더보기",
            "접기", "펼쳐보기",
            // latin fillers
            "the", "and", "for", "with", "menu", "home", "review",
        ];
        Self {
            stopwords: words.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.overall_deadline_ms, 55_000);
        assert_eq!(cfg.cache_ttl_secs, 43_200);
        assert!(cfg.stability_min_text_len > 0);
        assert!(cfg.keyword.stopwords.contains("네이버"));
    }

    #[test]
    fn test_env_u64_ignores_garbage() {
        std::env::set_var("PLACELENS_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_u64("PLACELENS_TEST_GARBAGE", 7), 7);
        std::env::remove_var("PLACELENS_TEST_GARBAGE");
    }
}
