//! Acceptance gate for rewritten transcripts.
//!
//! A rewrite that shrinks the text too far has almost certainly dropped
//! content (or replied with an apology instead of a rewrite), so the gate
//! compares character counts: the candidate must retain at least the
//! level's minimum fraction of the raw transcript. Rejected candidates are
//! discarded and the raw transcript is used instead.

use crate::level::ProcessingLevel;

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Outcome of gating one candidate rewrite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    pub is_acceptable: bool,
    /// Candidate chars over raw chars, both trimmed.
    pub ratio: f64,
    /// The threshold the ratio was held to.
    pub minimum_ratio: f64,
}

/// Judge a candidate rewrite against the raw transcript it came from.
///
/// Both inputs are trimmed before measuring. An empty candidate is always
/// rejected with ratio 0; an empty raw transcript accepts anything with
/// ratio 1 (there was nothing to lose).
pub fn evaluate(raw: &str, candidate: &str, level: ProcessingLevel) -> GateDecision {
    let minimum_ratio = level.minimum_ratio();
    let raw = raw.trim();
    let candidate = candidate.trim();

    if candidate.is_empty() {
        return GateDecision {
            is_acceptable: false,
            ratio: 0.0,
            minimum_ratio,
        };
    }
    if raw.is_empty() {
        return GateDecision {
            is_acceptable: true,
            ratio: 1.0,
            minimum_ratio,
        };
    }

    let ratio = candidate.chars().count() as f64 / raw.chars().count().max(1) as f64;
    GateDecision {
        is_acceptable: ratio >= minimum_ratio,
        ratio,
        minimum_ratio,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn comparable_length_passes_at_both_levels() {
        let raw = "please send the report by friday";
        let candidate = "Please send the report by Friday.";
        assert!(evaluate(raw, candidate, ProcessingLevel::Clean).is_acceptable);
        assert!(evaluate(raw, candidate, ProcessingLevel::Polish).is_acceptable);
    }

    #[test]
    fn heavy_truncation_fails_clean_but_passes_polish() {
        // 10 chars from 20: ratio 0.5 sits between the 0.3 and 0.6 floors.
        let raw = "aaaaaaaaaaaaaaaaaaaa";
        let candidate = "aaaaaaaaaa";
        let clean = evaluate(raw, candidate, ProcessingLevel::Clean);
        assert!(!clean.is_acceptable);
        assert!((clean.ratio - 0.5).abs() < f64::EPSILON);
        assert!(evaluate(raw, candidate, ProcessingLevel::Polish).is_acceptable);
    }

    #[test]
    fn empty_candidate_is_always_rejected() {
        let decision = evaluate("some transcript", "   \n  ", ProcessingLevel::Polish);
        assert!(!decision.is_acceptable);
        assert_eq!(decision.ratio, 0.0);
    }

    #[test]
    fn empty_raw_accepts_any_candidate() {
        let decision = evaluate("  ", "Hello there.", ProcessingLevel::Clean);
        assert!(decision.is_acceptable);
        assert_eq!(decision.ratio, 1.0);
    }

    #[test]
    fn whitespace_is_trimmed_before_measuring() {
        // Padding must not rescue a too-short candidate.
        let raw = "aaaaaaaaaaaaaaaaaaaa";
        let padded = format!("aaa{}", " ".repeat(40));
        assert!(!evaluate(raw, &padded, ProcessingLevel::Clean).is_acceptable);
    }

    #[test]
    fn ratio_counts_chars_not_bytes() {
        let raw = "héllo wörld padding here";
        let candidate = "héllo wörld padding her";
        assert!(evaluate(raw, candidate, ProcessingLevel::Clean).is_acceptable);
    }

    proptest! {
        #[test]
        fn acceptance_is_monotonic_in_candidate_length(
            raw in "[a-z ]{10,60}",
            len_a in 0usize..60,
            len_b in 0usize..60,
        ) {
            // A longer candidate never flips an accepted shorter one to
            // rejected (for same raw and level).
            let (short, long) = if len_a <= len_b { (len_a, len_b) } else { (len_b, len_a) };
            let shorter: String = "x".repeat(short);
            let longer: String = "x".repeat(long);
            let s = evaluate(&raw, &shorter, ProcessingLevel::Clean);
            let l = evaluate(&raw, &longer, ProcessingLevel::Clean);
            prop_assert!(!s.is_acceptable || l.is_acceptable);
        }

        #[test]
        fn decision_matches_reported_ratio(
            raw in "[a-z]{1,40}",
            candidate in "[a-z]{1,40}",
        ) {
            let decision = evaluate(&raw, &candidate, ProcessingLevel::Polish);
            prop_assert_eq!(
                decision.is_acceptable,
                decision.ratio >= decision.minimum_ratio
            );
        }
    }
}
