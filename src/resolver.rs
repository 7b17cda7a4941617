//! URL normalization and listing-identifier resolution.
//!
//! Turns an arbitrary user-supplied link — including shortener links that
//! only reveal the listing after a redirect chain — into a [`ResolvedTarget`]
//! carrying the platform identifier and an optional listing-type hint.
//! Resolution never fails hard: network errors and unrecognized shapes are
//! encoded as `place_id: None` with a best-effort canonical URL, so the
//! caller decides what "unresolved" means.

use regex::Regex;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Listing-type path segments the platform uses for typed listing pages.
const LISTING_TYPES: &str = "restaurant|cafe|hospital|beauty|accommodation|pharmacy|attraction";

/// Fallback listing type when a candidate needs one and no hint was found.
const DEFAULT_LISTING_TYPE: &str = "restaurant";

/// Base of the mobile listing surface all candidates render against.
const MOBILE_PLACE_BASE: &str = "https://m.place.naver.com";

/// Maximum redirect hops to follow when resolving shortener links.
const MAX_REDIRECT_HOPS: usize = 10;

/// Outcome of resolving one input URL. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTarget {
    pub input_url: String,
    pub normalized_url: String,
    pub final_url: String,
    pub place_id: Option<String>,
    pub type_hint: Option<String>,
    /// Always set: identifier-based listing URL when resolved, otherwise the
    /// final (or normalized) URL.
    pub canonical_url: String,
}

struct IdMatch {
    place_id: String,
    type_hint: Option<String>,
}

/// Canonicalize raw input: trim, add a scheme when missing. Empty stays
/// empty — callers reject that before entering the pipeline.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Whether the URL points at the listing platform (shortener included).
pub fn is_supported_host(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    match parsed.host_str() {
        Some(host) => {
            host == "naver.me" || host == "naver.com" || host.ends_with(".naver.com")
        }
        None => false,
    }
}

/// Build the ordered, deduplicated list of renderable listing URLs for an
/// identifier. Empty exactly when the identifier is absent.
pub fn build_candidates(place_id: Option<&str>, type_hint: Option<&str>) -> Vec<String> {
    let Some(id) = place_id else {
        return Vec::new();
    };

    let mut out: Vec<String> = Vec::new();
    let mut push = |url: String| {
        if !out.contains(&url) {
            out.push(url);
        }
    };

    if let Some(hint) = type_hint {
        push(format!("{MOBILE_PLACE_BASE}/{hint}/{id}/home"));
    }
    push(format!("{MOBILE_PLACE_BASE}/place/{id}/home"));
    push(format!("{MOBILE_PLACE_BASE}/{DEFAULT_LISTING_TYPE}/{id}/home"));
    out
}

/// Resolves input URLs to listing identifiers, following redirects when the
/// URL shape alone is not enough.
pub struct Resolver {
    client: reqwest::Client,
    typed_path: Regex,
    generic_path: Regex,
    embedded_id: Regex,
}

impl Resolver {
    pub fn new(timeout_ms: u64) -> Self {
        // Browser-like headers; shorteners and the listing platform both
        // reject obviously non-browser clients with interstitial pages.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECT_HOPS))
            .user_agent(
                "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                 AppleWebKit/605.1.15 (KHTML, like Gecko) \
                 Version/17.0 Mobile/15E148 Safari/604.1",
            )
            .build()
            .expect("reqwest client with static configuration");

        Self {
            client,
            typed_path: Regex::new(&format!(r"/({LISTING_TYPES})/(\d+)"))
                .expect("valid listing-type pattern"),
            generic_path: Regex::new(r"/place/(\d+)").expect("valid place pattern"),
            embedded_id: Regex::new(r#""placeId"\s*:\s*"(\d+)""#).expect("valid placeId pattern"),
        }
    }

    /// Resolve an input URL. Never fails: on any network error the result
    /// carries `place_id: None` and `canonical_url` equal to the normalized
    /// input.
    pub async fn resolve(&self, input_url: &str) -> ResolvedTarget {
        let normalized = normalize_url(input_url);

        // Direct extraction first — a canonical URL resolves without I/O.
        if let Some(m) = self.extract_from_url(&normalized) {
            return self.finish(input_url, &normalized, &normalized, Some(m));
        }

        let (final_url, body) = match self.client.get(&normalized).send().await {
            Ok(resp) => {
                let final_url = resp.url().to_string();
                let textual = resp
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|ct| ct.contains("text") || ct.contains("json"))
                    .unwrap_or(false);
                let body = if textual {
                    resp.text().await.unwrap_or_default()
                } else {
                    String::new()
                };
                (final_url, body)
            }
            Err(e) => {
                // Resolution failure is data, not an exception.
                debug!("redirect resolution failed for {normalized}: {e}");
                return self.finish(input_url, &normalized, &normalized, None);
            }
        };

        if let Some(m) = self.extract_from_url(&final_url) {
            return self.finish(input_url, &normalized, &final_url, Some(m));
        }
        let scanned = self.scan_body(&body);
        self.finish(input_url, &normalized, &final_url, scanned)
    }

    /// Extract identifier + type hint from a URL shape. Order: typed path
    /// segment, generic `/place/<id>`, `placeId` query parameter.
    fn extract_from_url(&self, url: &str) -> Option<IdMatch> {
        if let Some(caps) = self.typed_path.captures(url) {
            return Some(IdMatch {
                place_id: caps[2].to_string(),
                type_hint: Some(caps[1].to_string()),
            });
        }
        if let Some(caps) = self.generic_path.captures(url) {
            return Some(IdMatch {
                place_id: caps[1].to_string(),
                type_hint: None,
            });
        }
        if let Ok(parsed) = Url::parse(url) {
            for (key, value) in parsed.query_pairs() {
                if key == "placeId" && !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
                {
                    return Some(IdMatch {
                        place_id: value.into_owned(),
                        type_hint: None,
                    });
                }
            }
        }
        None
    }

    /// Scan a landed page body for an embedded identifier token. Priority:
    /// JSON-like `"placeId"` field first, then the URL path shapes.
    fn scan_body(&self, body: &str) -> Option<IdMatch> {
        if body.is_empty() {
            return None;
        }
        if let Some(caps) = self.embedded_id.captures(body) {
            return Some(IdMatch {
                place_id: caps[1].to_string(),
                type_hint: None,
            });
        }
        if let Some(caps) = self.typed_path.captures(body) {
            return Some(IdMatch {
                place_id: caps[2].to_string(),
                type_hint: Some(caps[1].to_string()),
            });
        }
        self.generic_path.captures(body).map(|caps| IdMatch {
            place_id: caps[1].to_string(),
            type_hint: None,
        })
    }

    fn finish(
        &self,
        input_url: &str,
        normalized: &str,
        final_url: &str,
        id_match: Option<IdMatch>,
    ) -> ResolvedTarget {
        let (place_id, type_hint) = match id_match {
            Some(m) => (Some(m.place_id), m.type_hint),
            None => (None, None),
        };
        let canonical_url = match &place_id {
            Some(id) => {
                let segment = type_hint.as_deref().unwrap_or("place");
                format!("{MOBILE_PLACE_BASE}/{segment}/{id}/home")
            }
            None => final_url.to_string(),
        };
        ResolvedTarget {
            input_url: input_url.to_string(),
            normalized_url: normalized.to_string(),
            final_url: final_url.to_string(),
            place_id,
            type_hint,
            canonical_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_scheme_and_trims() {
        assert_eq!(normalize_url("  naver.me/xYz  "), "https://naver.me/xYz");
        assert_eq!(
            normalize_url("http://map.naver.com/p/1"),
            "http://map.naver.com/p/1"
        );
        assert_eq!(normalize_url("   "), "");
    }

    #[test]
    fn test_supported_hosts() {
        assert!(is_supported_host("https://naver.me/xYz"));
        assert!(is_supported_host("https://m.place.naver.com/restaurant/1"));
        assert!(is_supported_host("https://map.naver.com/p/entry/place/5"));
        assert!(!is_supported_host("https://example.com/place/5"));
        assert!(!is_supported_host("not a url"));
    }

    #[test]
    fn test_direct_typed_extraction() {
        let r = Resolver::new(1000);
        let m = r
            .extract_from_url("https://m.place.naver.com/restaurant/12345/home")
            .unwrap();
        assert_eq!(m.place_id, "12345");
        assert_eq!(m.type_hint.as_deref(), Some("restaurant"));
    }

    #[test]
    fn test_generic_and_query_extraction() {
        let r = Resolver::new(1000);
        let m = r
            .extract_from_url("https://m.place.naver.com/place/777/home")
            .unwrap();
        assert_eq!(m.place_id, "777");
        assert!(m.type_hint.is_none());

        let m = r
            .extract_from_url("https://map.naver.com/v5/search?placeId=4242")
            .unwrap();
        assert_eq!(m.place_id, "4242");
    }

    #[test]
    fn test_typed_shape_wins_over_query_param() {
        let r = Resolver::new(1000);
        let m = r
            .extract_from_url("https://m.place.naver.com/cafe/100/home?placeId=200")
            .unwrap();
        assert_eq!(m.place_id, "100");
        assert_eq!(m.type_hint.as_deref(), Some("cafe"));
    }

    #[test]
    fn test_body_scan_priority() {
        let r = Resolver::new(1000);
        // Embedded JSON token beats a path shape later in the body.
        let body = r#"<script>{"placeId":"999"}</script> see /restaurant/111"#;
        let m = r.scan_body(body).unwrap();
        assert_eq!(m.place_id, "999");

        let m = r.scan_body("link to /cafe/555/home").unwrap();
        assert_eq!(m.place_id, "555");
        assert_eq!(m.type_hint.as_deref(), Some("cafe"));

        assert!(r.scan_body("").is_none());
    }

    #[test]
    fn test_resolve_is_idempotent_without_network() {
        // A canonical URL already carries a direct match, so resolve must
        // return the same identifier without any outbound call. The resolver
        // is built with a client pointed at nothing; an attempted call would
        // error and produce place_id: None instead.
        let r = Resolver::new(1);
        let target = tokio_test::block_on(
            r.resolve("https://m.place.naver.com/restaurant/12345/home"),
        );
        assert_eq!(target.place_id.as_deref(), Some("12345"));
        assert_eq!(target.type_hint.as_deref(), Some("restaurant"));
        assert_eq!(
            target.canonical_url,
            "https://m.place.naver.com/restaurant/12345/home"
        );

        let again = tokio_test::block_on(r.resolve(&target.canonical_url));
        assert_eq!(again.place_id, target.place_id);
    }

    #[test]
    fn test_candidates_order_and_dedup() {
        let c = build_candidates(Some("12345"), Some("restaurant"));
        assert_eq!(
            c,
            vec![
                "https://m.place.naver.com/restaurant/12345/home",
                "https://m.place.naver.com/place/12345/home",
            ]
        );

        let c = build_candidates(Some("9"), None);
        assert_eq!(
            c,
            vec![
                "https://m.place.naver.com/place/9/home",
                "https://m.place.naver.com/restaurant/9/home",
            ]
        );

        let c = build_candidates(Some("8"), Some("cafe"));
        assert_eq!(c.len(), 3);
        assert_eq!(c[0], "https://m.place.naver.com/cafe/8/home");

        assert!(build_candidates(None, Some("restaurant")).is_empty());
    }
}
