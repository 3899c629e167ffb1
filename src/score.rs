// 📏 Similarity Score - partial match of a catalog name against a query
//
// Both inputs must already be normalized (see `normalize`).
// Direction matters: we measure how much of the CANDIDATE the query covers,
// so "puerta delantera" scores well inside a long sentence.

/// Score when the whole candidate appears verbatim in the query
pub const CONTAINMENT_SCORE: f64 = 0.9;

/// Candidate tokens of this length or shorter are noise ("de", "la") and never count as matched
pub const MAX_NOISE_TOKEN_LEN: usize = 2;

/// Similarity of `candidate` to `query`, in [0, 1]
///
/// 1. Candidate is a substring of the query → `CONTAINMENT_SCORE`
/// 2. Otherwise, share of candidate tokens (longer than `MAX_NOISE_TOKEN_LEN`) that
///    contain, or are contained in, some query token
pub fn score(query: &str, candidate: &str) -> f64 {
    if candidate.is_empty() {
        return 0.0;
    }

    if query.contains(candidate) {
        return CONTAINMENT_SCORE;
    }

    let candidate_tokens: Vec<&str> = candidate.split(' ').collect();
    let query_tokens: Vec<&str> = query.split(' ').collect();

    let matched = candidate_tokens
        .iter()
        .filter(|token| token.len() > MAX_NOISE_TOKEN_LEN)
        .filter(|token| {
            query_tokens
                .iter()
                .any(|qt| qt.contains(**token) || token.contains(qt))
        })
        .count();

    matched as f64 / candidate_tokens.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use proptest::prelude::*;

    #[test]
    fn test_containment_scores_fixed_value() {
        let q = normalize("hay un golpe en la puerta delantera");
        let c = normalize("Puerta Delantera");
        assert_eq!(score(&q, &c), 0.9);
    }

    #[test]
    fn test_exact_equality_is_containment() {
        assert_eq!(score("parabrisas", "parabrisas"), CONTAINMENT_SCORE);
    }

    #[test]
    fn test_token_overlap_bidirectional() {
        // "puertas" contains "puerta"
        assert_eq!(score("puertas traseras", "puerta trasera"), 1.0);
        // query token "capo" is contained in candidate token "capot"
        assert_eq!(score("capo", "capot"), 1.0);
    }

    #[test]
    fn test_partial_overlap() {
        // "faro" matched, "trasero" not
        assert_eq!(score("faro roto", "faro trasero"), 0.5);
    }

    #[test]
    fn test_short_tokens_count_but_never_match() {
        // 3 tokens, only "puerta" is eligible to match
        let s = score("puerta", "la puerta de");
        assert!((s - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_noise_token_length_boundary() {
        // "zz" sits in both strings but is noise; "abc" is the shortest counted length
        let s = score("abc zz", "zz abc q");
        assert!((s - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(score("zz", "zz yy"), 0.0);
    }

    #[test]
    fn test_no_overlap() {
        assert_eq!(score("rueda pinchada", "parabrisas"), 0.0);
    }

    #[test]
    fn test_empty_candidate_scores_zero() {
        assert_eq!(score("cualquier texto", ""), 0.0);
        assert_eq!(score("", ""), 0.0);
    }

    #[test]
    fn test_empty_query_token_matches_everything_eligible() {
        // "".contains is vacuous for every candidate token; mirrors the substring rule
        assert_eq!(score("", "parabrisas"), 1.0);
    }

    proptest! {
        #[test]
        fn score_is_bounded(q in "\\PC*", c in "\\PC*") {
            let s = score(&normalize(&q), &normalize(&c));
            prop_assert!((0.0..=1.0).contains(&s));
        }
    }
}
