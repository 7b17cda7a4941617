//! Scoring engine — weighted, capped category scores over a snapshot.
//!
//! Pure and deterministic: the same snapshot and keyword set always produce
//! the same card. Each category contributes one breakdown item with a note
//! explaining why points were awarded or withheld; recommendations are
//! advisory text triggered by missed thresholds and carry no points.

use crate::metrics::KeywordSet;
use crate::scrape::ScrapedSnapshot;
use serde::{Deserialize, Serialize};

const DIRECTIONS_MAX: u32 = 15;
const STORE_INFO_MAX: u32 = 25;
const REVIEW_MAX: u32 = 30;
const MENU_MAX: u32 = 20;
const PHOTO_KEYWORD_MAX: u32 = 10;

/// Characters of section text per point for the linear length scales.
const CHARS_PER_POINT: u32 = 20;
/// Visit reviews per point (capped at half the review category).
const VISIT_REVIEWS_PER_POINT: u32 = 5;
/// Blog reviews per point (capped at half the review category).
const BLOG_REVIEWS_PER_POINT: u32 = 2;
/// Fraction of menu items with descriptions that earns the second half of
/// the menu category.
const DESCRIBED_MENU_FRACTION: f64 = 0.5;
/// Main keywords needed for the keyword half of the photo/keyword category.
const MIN_MAIN_KEYWORDS: usize = 3;

/// Recommendation trigger thresholds.
const TARGET_VISIT_REVIEWS: u32 = 50;
const TARGET_BLOG_REVIEWS: u32 = 30;
const TARGET_INFO_CHARS: usize = 300;
const SCORE_FLOOR: u32 = 50;

/// One scoring category's outcome. `0 <= score <= max` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdownItem {
    pub name: String,
    pub score: u32,
    pub max: u32,
    pub notes: String,
}

/// Letter grade over the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        };
        f.write_str(s)
    }
}

/// Complete scoring outcome for one listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreCard {
    pub score: u32,
    pub grade: Grade,
    pub breakdown: Vec<ScoreBreakdownItem>,
    pub recommendations: Vec<String>,
}

/// Grade bands: closed lower bounds, monotonic, no overlap.
pub fn grade_for(score: u32) -> Grade {
    match score {
        90.. => Grade::S,
        70..=89 => Grade::A,
        50..=69 => Grade::B,
        30..=49 => Grade::C,
        _ => Grade::D,
    }
}

/// Score a snapshot plus its keyword set into a card.
pub fn score(snapshot: &ScrapedSnapshot, keywords: &KeywordSet) -> ScoreCard {
    let mut breakdown = Vec::with_capacity(5);
    let mut recommendations = Vec::new();

    // Directions detail: linear in text length.
    let directions_chars = snapshot.directions_text.chars().count() as u32;
    let directions_score = (directions_chars / CHARS_PER_POINT).min(DIRECTIONS_MAX);
    breakdown.push(ScoreBreakdownItem {
        name: "찾아오시는 길".to_string(),
        score: directions_score,
        max: DIRECTIONS_MAX,
        notes: if directions_chars == 0 {
            "길 안내 문구가 없습니다".to_string()
        } else {
            format!("길 안내 {directions_chars}자")
        },
    });
    if directions_chars == 0 {
        recommendations
            .push("찾아오시는 길 안내를 작성하면 방문 전환에 도움이 됩니다.".to_string());
    }

    // Store info: linear in text length.
    let info_chars = snapshot.store_info_text.chars().count() as u32;
    let info_score = (info_chars / CHARS_PER_POINT).min(STORE_INFO_MAX);
    breakdown.push(ScoreBreakdownItem {
        name: "매장 소개".to_string(),
        score: info_score,
        max: STORE_INFO_MAX,
        notes: if info_chars == 0 {
            "매장 소개가 비어 있습니다".to_string()
        } else {
            format!("소개 문구 {info_chars}자")
        },
    });
    if (info_chars as usize) < TARGET_INFO_CHARS {
        recommendations.push(format!(
            "매장 소개가 짧습니다. {TARGET_INFO_CHARS}자 이상으로 메뉴와 분위기를 소개해 보세요."
        ));
    }

    // Review activity: visit + blog scaled independently, then summed.
    let visit = snapshot.receipt_review_count;
    let blog = snapshot.blog_review_count;
    let visit_score = (visit / VISIT_REVIEWS_PER_POINT).min(REVIEW_MAX / 2);
    let blog_score = (blog / BLOG_REVIEWS_PER_POINT).min(REVIEW_MAX / 2);
    breakdown.push(ScoreBreakdownItem {
        name: "리뷰 활동".to_string(),
        score: visit_score + blog_score,
        max: REVIEW_MAX,
        notes: format!("방문자 리뷰 {visit}건, 블로그 리뷰 {blog}건"),
    });
    if visit < TARGET_VISIT_REVIEWS {
        recommendations.push(format!(
            "방문자 리뷰가 {visit}건입니다. 영수증 리뷰 이벤트로 {TARGET_VISIT_REVIEWS}건 이상을 모아 보세요."
        ));
    }
    if blog < TARGET_BLOG_REVIEWS {
        recommendations.push(format!(
            "블로그 리뷰가 {blog}건입니다. 체험단 등으로 {TARGET_BLOG_REVIEWS}건 이상을 확보해 보세요."
        ));
    }

    // Menu completeness: presence + described fraction.
    let menu = snapshot.menu_count;
    let described = snapshot.menu_with_description_count;
    let mut menu_score = 0;
    if menu > 0 {
        menu_score += MENU_MAX / 2;
        if f64::from(described) / f64::from(menu) > DESCRIBED_MENU_FRACTION {
            menu_score += MENU_MAX / 2;
        }
    }
    breakdown.push(ScoreBreakdownItem {
        name: "메뉴 등록".to_string(),
        score: menu_score,
        max: MENU_MAX,
        notes: format!("메뉴 {menu}개, 설명 있는 메뉴 {described}개"),
    });
    if menu == 0 {
        recommendations.push("메뉴가 등록되어 있지 않습니다. 대표 메뉴부터 등록해 주세요.".to_string());
    } else if described == 0 {
        recommendations
            .push("메뉴 설명이 없습니다. 메뉴마다 한 줄 설명을 더해 보세요.".to_string());
    }

    // Photos + keywords: presence checks.
    let mut media_score = 0;
    if snapshot.photo_count > 0 {
        media_score += PHOTO_KEYWORD_MAX / 2;
    }
    if keywords.main.len() >= MIN_MAIN_KEYWORDS {
        media_score += PHOTO_KEYWORD_MAX / 2;
    }
    breakdown.push(ScoreBreakdownItem {
        name: "사진·키워드".to_string(),
        score: media_score,
        max: PHOTO_KEYWORD_MAX,
        notes: format!(
            "사진 {}장, 주요 키워드 {}개",
            snapshot.photo_count,
            keywords.main.len()
        ),
    });
    if snapshot.photo_count == 0 {
        recommendations.push("대표 사진이 없습니다. 매장과 메뉴 사진을 올려 주세요.".to_string());
    }

    let total: u32 = breakdown.iter().map(|item| item.score).sum();
    let total = total.min(100);
    if total < SCORE_FLOOR {
        recommendations.push(
            "전반적인 정보가 부족합니다. 소개·메뉴·사진부터 순서대로 보강해 보세요.".to_string(),
        );
    }

    ScoreCard {
        score: total,
        grade: grade_for(total),
        breakdown,
        recommendations,
    }
}

/// Simplified scoring variant for the social-profile path: audience size and
/// posting volume only.
pub fn score_social(followers: u64, posts: u64) -> ScoreCard {
    let follower_score = ((followers / 100) as u32).min(60);
    let post_score = ((posts / 3) as u32).min(40);
    let total = (follower_score + post_score).min(100);

    let breakdown = vec![
        ScoreBreakdownItem {
            name: "팔로워".to_string(),
            score: follower_score,
            max: 60,
            notes: format!("팔로워 {followers}명"),
        },
        ScoreBreakdownItem {
            name: "게시물".to_string(),
            score: post_score,
            max: 40,
            notes: format!("게시물 {posts}개"),
        },
    ];

    let mut recommendations = Vec::new();
    if followers < 1000 {
        recommendations
            .push("팔로워가 1,000명 미만입니다. 지역 해시태그로 노출을 늘려 보세요.".to_string());
    }
    if posts < 30 {
        recommendations.push("게시물이 적습니다. 주 2~3회 꾸준히 올려 보세요.".to_string());
    }

    ScoreCard {
        score: total,
        grade: grade_for(total),
        breakdown,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ScrapedSnapshot {
        ScrapedSnapshot::default()
    }

    #[test]
    fn test_grade_bands_are_exact() {
        assert_eq!(grade_for(100), Grade::S);
        assert_eq!(grade_for(90), Grade::S);
        assert_eq!(grade_for(89), Grade::A);
        assert_eq!(grade_for(70), Grade::A);
        assert_eq!(grade_for(69), Grade::B);
        assert_eq!(grade_for(50), Grade::B);
        assert_eq!(grade_for(49), Grade::C);
        assert_eq!(grade_for(30), Grade::C);
        assert_eq!(grade_for(29), Grade::D);
        assert_eq!(grade_for(0), Grade::D);
    }

    #[test]
    fn test_reference_scenario_scores_60_b() {
        let mut snap = snapshot();
        snap.store_info_text = "가".repeat(600);
        snap.receipt_review_count = 80;
        snap.blog_review_count = 20;
        snap.menu_count = 0;
        snap.photo_count = 10;
        let keywords = KeywordSet {
            main: vec!["김치찌개", "연남동", "점심", "주차"]
                .into_iter()
                .map(String::from)
                .collect(),
            sub: Vec::new(),
        };

        let card = score(&snap, &keywords);
        assert_eq!(card.score, 60);
        assert_eq!(card.grade, Grade::B);

        let by_name = |name: &str| {
            card.breakdown
                .iter()
                .find(|item| item.name == name)
                .unwrap()
                .score
        };
        assert_eq!(by_name("매장 소개"), 25);
        assert_eq!(by_name("리뷰 활동"), 25);
        assert_eq!(by_name("메뉴 등록"), 0);
        assert_eq!(by_name("사진·키워드"), 10);
        assert_eq!(by_name("찾아오시는 길"), 0);

        assert!(card.recommendations.iter().any(|r| r.contains("메뉴")));
    }

    #[test]
    fn test_score_bounds_and_item_caps() {
        let mut snap = snapshot();
        snap.directions_text = "가".repeat(10_000);
        snap.store_info_text = "나".repeat(10_000);
        snap.receipt_review_count = u32::MAX;
        snap.blog_review_count = u32::MAX;
        snap.menu_count = 500;
        snap.menu_with_description_count = 500;
        snap.photo_count = 999;
        let keywords = KeywordSet {
            main: vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()],
            sub: Vec::new(),
        };

        let card = score(&snap, &keywords);
        assert_eq!(card.score, 100);
        assert_eq!(card.grade, Grade::S);
        for item in &card.breakdown {
            assert!(item.score <= item.max, "{} exceeded its cap", item.name);
        }

        let empty = score(&snapshot(), &KeywordSet::default());
        assert_eq!(empty.score, 0);
        assert_eq!(empty.grade, Grade::D);
    }

    #[test]
    fn test_score_is_monotonic_in_reviews() {
        let keywords = KeywordSet::default();
        let mut prev = 0;
        for visits in [0u32, 5, 25, 60, 120, 500] {
            let mut snap = snapshot();
            snap.receipt_review_count = visits;
            let card = score(&snap, &keywords);
            assert!(card.score >= prev, "score decreased at {visits} visits");
            prev = card.score;
        }
    }

    #[test]
    fn test_menu_description_fraction_gate() {
        let keywords = KeywordSet::default();

        let mut snap = snapshot();
        snap.menu_count = 10;
        snap.menu_with_description_count = 5; // exactly 50% — not over the bar
        assert_eq!(score(&snap, &keywords).breakdown[3].score, 10);

        snap.menu_with_description_count = 6;
        assert_eq!(score(&snap, &keywords).breakdown[3].score, 20);
    }

    #[test]
    fn test_recommendations_trigger_on_thresholds() {
        let card = score(&snapshot(), &KeywordSet::default());
        assert!(card.recommendations.iter().any(|r| r.contains("찾아오시는 길")));
        assert!(card.recommendations.iter().any(|r| r.contains("방문자 리뷰")));
        assert!(card.recommendations.iter().any(|r| r.contains("메뉴")));
        assert!(card.recommendations.iter().any(|r| r.contains("전반적인 정보")));

        let mut snap = snapshot();
        snap.receipt_review_count = 500;
        snap.blog_review_count = 500;
        let card = score(&snap, &KeywordSet::default());
        assert!(!card.recommendations.iter().any(|r| r.contains("방문자 리뷰")));
    }

    #[test]
    fn test_social_scoring() {
        let card = score_social(12_000, 300);
        assert_eq!(card.score, 100);
        assert_eq!(card.grade, Grade::S);

        let card = score_social(0, 0);
        assert_eq!(card.score, 0);
        assert_eq!(card.grade, Grade::D);
        assert_eq!(card.recommendations.len(), 2);

        let card = score_social(500, 9);
        assert_eq!(card.score, 5 + 3);
    }
}
