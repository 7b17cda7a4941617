//! Social-profile diagnosis path.
//!
//! Much simpler shape than the place pipeline: one HTTP GET, one regex over
//! the profile page's meta description, one scoring formula. No browser, no
//! candidate retries. Shares the TTL cache and the grading scheme with the
//! place path.

use crate::cache::{self, TtlCache};
use crate::config::Config;
use crate::error::DiagnosisError;
use crate::metrics::parse_abbreviated_number;
use crate::scoring::{self, Grade, ScoreBreakdownItem};
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Counts parsed out of a profile page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocialProfile {
    pub followers: u64,
    pub following: u64,
    pub posts: u64,
}

/// Final diagnosis for one profile. Immutable once produced; cached by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialDiagnosis {
    pub handle: String,
    pub followers: u64,
    pub following: u64,
    pub posts: u64,
    pub score: u32,
    pub grade: Grade,
    pub breakdown: Vec<ScoreBreakdownItem>,
    pub recommendations: Vec<String>,
    pub diagnosed_at: DateTime<Utc>,
}

/// Diagnoses social profiles by handle.
pub struct SocialDiagnoser {
    client: reqwest::Client,
    cache: TtlCache<SocialDiagnosis>,
    base_url: String,
}

impl SocialDiagnoser {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.resolver_timeout_ms))
            .user_agent(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                 AppleWebKit/537.36 (KHTML, like Gecko) \
                 Chrome/131.0.0.0 Safari/537.36",
            )
            .build()
            .expect("reqwest client with static configuration");

        Self {
            client,
            cache: TtlCache::new(Duration::from_secs(config.cache_ttl_secs)),
            base_url: config.social_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Diagnose one profile handle.
    pub async fn diagnose(&self, handle: &str) -> Result<SocialDiagnosis, DiagnosisError> {
        let normalized = handle.trim().trim_start_matches('@').to_string();
        if normalized.is_empty() {
            return Err(DiagnosisError::NotFound);
        }

        let key = cache::social_key(&normalized);
        if let Some(result) = self.cache.get(&key) {
            info!("cache hit for {key}");
            return Ok(result);
        }

        let url = format!("{}/{normalized}/", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DiagnosisError::Upstream {
                detail: format!("profile fetch failed: {e}"),
            })?;

        let status = resp.status();
        if status.as_u16() == 404 {
            return Err(DiagnosisError::NotFound);
        }
        if !status.is_success() {
            return Err(DiagnosisError::Upstream {
                detail: format!("profile fetch returned {status}"),
            });
        }

        let body = resp.text().await.map_err(|e| DiagnosisError::Upstream {
            detail: format!("profile body read failed: {e}"),
        })?;

        let profile = parse_profile_html(&body).ok_or(DiagnosisError::ParseFailed)?;
        debug!(
            "parsed profile {normalized}: {} followers, {} posts",
            profile.followers, profile.posts
        );

        let card = scoring::score_social(profile.followers, profile.posts);
        let result = SocialDiagnosis {
            handle: normalized,
            followers: profile.followers,
            following: profile.following,
            posts: profile.posts,
            score: card.score,
            grade: card.grade,
            breakdown: card.breakdown,
            recommendations: card.recommendations,
            diagnosed_at: Utc::now(),
        };

        self.cache.set(&key, result.clone());
        Ok(result)
    }

    pub fn cache(&self) -> &TtlCache<SocialDiagnosis> {
        &self.cache
    }
}

/// Pull follower/following/post counts from the profile page's meta
/// description, e.g. `1.2K Followers, 10 Following, 345 Posts - …`.
pub fn parse_profile_html(html: &str) -> Option<SocialProfile> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[property="og:description"], meta[name="description"]"#)
        .expect("valid meta selector");

    let counts_re = Regex::new(
        r"(?i)([\d.,]+[kmb]?)\s*Followers?,\s*([\d.,]+[kmb]?)\s*Following,\s*([\d.,]+[kmb]?)\s*Posts",
    )
    .expect("valid profile counts pattern");

    for element in doc.select(&selector) {
        let Some(content) = element.value().attr("content") else {
            continue;
        };
        if let Some(caps) = counts_re.captures(content) {
            return Some(SocialProfile {
                followers: parse_abbreviated_number(&caps[1]).round() as u64,
                following: parse_abbreviated_number(&caps[2]).round() as u64,
                posts: parse_abbreviated_number(&caps[3]).round() as u64,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_meta() {
        let html = r#"<html><head>
            <meta property="og:description" content="1.2K Followers, 10 Following, 345 Posts - 연남분식 (@yeonnam_bunsik)" />
        </head><body></body></html>"#;
        let profile = parse_profile_html(html).unwrap();
        assert_eq!(
            profile,
            SocialProfile {
                followers: 1200,
                following: 10,
                posts: 345
            }
        );
    }

    #[test]
    fn test_parse_profile_plain_description_tag() {
        let html = r#"<meta name="description" content="3,421 Followers, 120 Following, 88 Posts">"#;
        let profile = parse_profile_html(html).unwrap();
        assert_eq!(profile.followers, 3421);
        assert_eq!(profile.posts, 88);
    }

    #[test]
    fn test_parse_profile_missing_structure() {
        assert!(parse_profile_html("<html><body>로그인이 필요합니다</body></html>").is_none());
        assert!(parse_profile_html("").is_none());
    }
}
