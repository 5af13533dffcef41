//! Desirability scoring for detected figure regions.
//!
//! Architecture/pipeline diagrams follow strong conventions in papers: they
//! sit early (but rarely on page 1, which usually carries a teaser figure),
//! they are large, and they are wide. The score is a weighted additive
//! heuristic over those signals plus the detector's own confidence. Each
//! term is independently bounded so no single signal can dominate.

/// Score one candidate region.
///
/// Pure and deterministic: identical inputs always produce bit-identical
/// output. The result is an unclamped sum and may be negative.
///
/// Terms:
/// - position: pages 2–3 → 50, page 1 → 30, pages 4–5 → 20, later → 10
/// - area: `min(area / 50_000, 60)`
/// - aspect ratio (width/height, height 0 treated as ratio 1):
///   >2.0 → 30, >1.5 → 20, >1.0 → 10, else → 5
/// - confidence: `confidence * 20`
/// - small-region penalty: area < 30_000 → −30
pub fn score_figure(page: usize, area: u32, width: u32, height: u32, confidence: f32) -> f64 {
    let aspect_ratio = if height > 0 {
        f64::from(width) / f64::from(height)
    } else {
        1.0
    };

    let position_score = match page {
        2 | 3 => 50.0,
        1 => 30.0,
        4 | 5 => 20.0,
        _ => 10.0,
    };

    let area_score = (f64::from(area) / 50_000.0).min(60.0);

    let ratio_score = if aspect_ratio > 2.0 {
        30.0
    } else if aspect_ratio > 1.5 {
        20.0
    } else if aspect_ratio > 1.0 {
        10.0
    } else {
        5.0
    };

    let confidence_score = f64::from(confidence) * 20.0;

    let size_penalty = if area < 30_000 { -30.0 } else { 0.0 };

    position_score + area_score + ratio_score + confidence_score + size_penalty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = score_figure(2, 60_000, 400, 150, 0.9);
        let b = score_figure(2, 60_000, 400, 150, 0.9);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn position_term_prefers_pages_two_and_three() {
        let at = |page| score_figure(page, 60_000, 300, 200, 0.9);
        assert!(at(2) > at(1));
        assert!(at(3) > at(1));
        assert!(at(1) > at(4));
        assert!(at(5) > at(8));
        assert_eq!(at(2), at(3));
    }

    #[test]
    fn confidence_is_monotonic() {
        let mut prev = score_figure(3, 60_000, 400, 200, 0.0);
        for step in 1..=10 {
            let conf = step as f32 / 10.0;
            let s = score_figure(3, 60_000, 400, 200, conf);
            assert!(s >= prev, "score decreased at confidence {conf}");
            prev = s;
        }
    }

    #[test]
    fn crossing_penalty_threshold_jumps_by_at_least_thirty() {
        let below = score_figure(2, 29_999, 200, 150, 0.9);
        let at = score_figure(2, 30_000, 200, 150, 0.9);
        assert!(at - below >= 30.0, "delta was {}", at - below);
    }

    #[test]
    fn area_term_is_capped() {
        // 3M px and 300M px both hit the 60-point cap.
        let big = score_figure(2, 3_000_000, 2000, 1500, 0.9);
        let huge = score_figure(2, 300_000_000u32, 20000, 15000, 0.9);
        assert_eq!(big, huge);
    }

    #[test]
    fn wide_regions_outscore_tall_ones() {
        let wide = score_figure(2, 60_000, 600, 100, 0.9);
        let tall = score_figure(2, 60_000, 100, 600, 0.9);
        assert!(wide > tall);
    }

    #[test]
    fn zero_height_treated_as_square() {
        // ratio 1 → 5-point term; must not panic or produce inf.
        let s = score_figure(2, 60_000, 400, 0, 0.9);
        assert!(s.is_finite());
        assert_eq!(s, score_figure(2, 60_000, 100, 100, 0.9));
    }

    #[test]
    fn score_can_be_negative() {
        // Tiny late-page low-confidence icon: 10 + ~0 + 5 + 0 − 30 < 0.
        assert!(score_figure(9, 100, 10, 10, 0.0) < 0.0);
    }
}
