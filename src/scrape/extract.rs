//! Snapshot extraction from a raw page capture.
//!
//! Extraction strategy is pluggable behind [`SnapshotExtractor`]: swapping
//! the heuristics must not change anything downstream, which only ever sees
//! the [`ScrapedSnapshot`] shape. The default implementation works on the
//! captured visible text with regex section/line heuristics tuned for the
//! listing platform's mobile page.

use super::{PageCapture, ScrapedSnapshot};
use crate::config::Config;
use crate::metrics;
use regex::Regex;

/// Cap for the extracted place name.
const MAX_NAME_LEN: usize = 120;
/// A line this long following a menu price line counts as its description.
const MIN_DESCRIPTION_CHARS: usize = 10;

/// Derives structured fields from a raw capture.
pub trait SnapshotExtractor: Send + Sync {
    fn extract(&self, capture: &PageCapture) -> ScrapedSnapshot;
}

/// Default extractor: regex heuristics over the captured visible text.
pub struct TextHeuristicExtractor {
    directions_header: Regex,
    info_header: Regex,
    menu_line: Regex,
    max_section_len: usize,
    max_text_len: usize,
}

impl TextHeuristicExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            directions_header: Regex::new(r"(?:찾아오시는\s*길|오시는\s*길|찾아가는\s*길)")
                .expect("valid directions pattern"),
            info_header: Regex::new(r"(?:(?:매장|업체|가게)\s*소개|상세\s*설명)")
                .expect("valid store-info pattern"),
            menu_line: Regex::new(r"^\s*\S.{0,50}?\s+[\d,]{3,}원\s*$")
                .expect("valid menu-line pattern"),
            max_section_len: config.max_section_len,
            max_text_len: config.max_text_len,
        }
    }

    /// Text between a section header and the next blank line, capped.
    fn section_after(&self, header: &Regex, text: &str) -> String {
        let Some(m) = header.find(text) else {
            return String::new();
        };
        let rest = &text[m.end()..];
        let section = match rest.find("\n\n") {
            Some(end) => &rest[..end],
            None => rest,
        };
        truncate_chars(section.trim(), self.max_section_len)
    }

    /// Count menu price lines and how many carry a following description.
    fn menu_counts(&self, text: &str) -> (u32, u32) {
        let lines: Vec<&str> = text.lines().collect();
        let mut menu_count = 0u32;
        let mut described = 0u32;

        for (i, line) in lines.iter().enumerate() {
            if !self.menu_line.is_match(line) {
                continue;
            }
            menu_count += 1;
            let next = lines[i + 1..].iter().find(|l| !l.trim().is_empty());
            if let Some(next) = next {
                if !self.menu_line.is_match(next)
                    && next.trim().chars().count() >= MIN_DESCRIPTION_CHARS
                {
                    described += 1;
                }
            }
        }
        (menu_count, described)
    }
}

impl SnapshotExtractor for TextHeuristicExtractor {
    fn extract(&self, capture: &PageCapture) -> ScrapedSnapshot {
        let full_text = truncate_chars(&capture.text, self.max_text_len);
        let reviews = metrics::find_review_counts(&full_text);
        let (menu_count, menu_with_description_count) = self.menu_counts(&full_text);

        ScrapedSnapshot {
            place_name: truncate_chars(capture.title.trim(), MAX_NAME_LEN),
            directions_text: self.section_after(&self.directions_header, &full_text),
            store_info_text: self.section_after(&self.info_header, &full_text),
            photo_count: capture.image_count,
            blog_review_count: reviews.blog,
            receipt_review_count: reviews.visit,
            menu_count,
            menu_with_description_count,
            full_text,
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> TextHeuristicExtractor {
        TextHeuristicExtractor::new(&Config::default())
    }

    fn capture(text: &str) -> PageCapture {
        PageCapture {
            title: "연남동 소문난 식당".to_string(),
            text: text.to_string(),
            image_count: 2,
        }
    }

    #[test]
    fn test_sections_are_cut_at_blank_line() {
        let text = "찾아오시는 길\n홍대입구역 3번 출구에서 도보 5분\n연남동 주민센터 맞은편\n\n매장 소개\n직접 담근 김치로 끓이는 김치찌개 전문점입니다\n\n다음 섹션";
        let snap = extractor().extract(&capture(text));
        assert!(snap.directions_text.contains("홍대입구역"));
        assert!(!snap.directions_text.contains("매장 소개"));
        assert!(snap.store_info_text.contains("김치찌개 전문점"));
        assert!(!snap.store_info_text.contains("다음 섹션"));
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let snap = extractor().extract(&capture("안내 문구가 전혀 없는 페이지"));
        assert!(snap.directions_text.is_empty());
        assert!(snap.store_info_text.is_empty());
    }

    #[test]
    fn test_menu_counting_with_descriptions() {
        let text = "메뉴\n김치찌개 9,000원\n묵은지와 돼지고기를 넣고 끓인 대표 메뉴\n된장찌개 8,000원\n계란말이 12,000원\n폭신하게 부쳐내는 계란말이입니다\n";
        let snap = extractor().extract(&capture(text));
        assert_eq!(snap.menu_count, 3);
        assert_eq!(snap.menu_with_description_count, 2);
    }

    #[test]
    fn test_no_menu_lines() {
        let snap = extractor().extract(&capture("가격 정보가 본문에 없습니다"));
        assert_eq!(snap.menu_count, 0);
        assert_eq!(snap.menu_with_description_count, 0);
    }

    #[test]
    fn test_name_and_text_are_capped() {
        let mut cfg = Config::default();
        cfg.max_text_len = 10;
        let ex = TextHeuristicExtractor::new(&cfg);
        let snap = ex.extract(&PageCapture {
            title: "이".repeat(500),
            text: "가".repeat(100),
            image_count: 0,
        });
        assert_eq!(snap.full_text.chars().count(), 10);
        assert_eq!(snap.place_name.chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn test_review_counts_flow_into_snapshot() {
        let snap = extractor().extract(&capture("방문자 리뷰 321 블로그 리뷰 45"));
        assert_eq!(snap.receipt_review_count, 321);
        assert_eq!(snap.blog_review_count, 45);
        assert_eq!(snap.photo_count, 2);
    }
}
