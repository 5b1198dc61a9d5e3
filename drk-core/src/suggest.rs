//! Suggestion engine (spec §4.I): "did you mean" candidates for an unknown
//! token, ranked by Levenshtein distance.

const DEFAULT_K: usize = 3;
const DEFAULT_D: usize = 3;
const LONG_INPUT_CUTOFF: usize = 256;

/// Returns up to `K` candidates from `candidates` whose edit distance to
/// `input` is `<= D` and strictly less than `input`'s length, sorted by
/// ascending distance with ties broken by original enumeration order.
pub fn suggest(input: &str, candidates: &[String]) -> Vec<String> {
    suggest_with(input, candidates, DEFAULT_K, DEFAULT_D)
}

pub fn suggest_with(input: &str, candidates: &[String], k: usize, d: usize) -> Vec<String> {
    let input_len = input.chars().count();

    let mut scored: Vec<(usize, usize)> = Vec::new(); // (distance, original index)
    for (idx, candidate) in candidates.iter().enumerate() {
        let distance = if input.len() > LONG_INPUT_CUTOFF || candidate.len() > LONG_INPUT_CUTOFF {
            length_difference_heuristic(input, candidate)
        } else {
            levenshtein(input, candidate)
        };
        if distance <= d && distance < input_len {
            scored.push((distance, idx));
        }
    }

    scored.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    scored
        .into_iter()
        .take(k)
        .map(|(_, idx)| candidates[idx].clone())
        .collect()
}

/// Length-difference fallback for long inputs, avoiding the O(n*m)
/// dynamic-programming table (spec §4.I): a cheap lower bound on edit
/// distance that's exact whenever one string is a substring-free prefix
/// mismatch of the other in length alone.
fn length_difference_heuristic(a: &str, b: &str) -> usize {
    a.chars().count().abs_diff(b.chars().count())
}

/// Classic two-row Levenshtein distance. Uses a dynamically sized buffer
/// rather than a fixed-size stack array, since candidate command paths
/// have no fixed upper length here.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current: Vec<usize> = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        current[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_has_zero_distance_but_is_excluded() {
        // distance must be strictly less than input length; an exact
        // match (distance 0) against a nonzero-length input still counts.
        let candidates = vec!["build".to_string()];
        assert_eq!(suggest("biuld", &candidates), vec!["build".to_string()]);
    }

    #[test]
    fn results_are_sorted_by_ascending_distance() {
        let candidates = vec!["images".to_string(), "image".to_string(), "imaeg".to_string()];
        let result = suggest("imag", &candidates);
        assert_eq!(result.first(), Some(&"image".to_string()));
    }

    #[test]
    fn distance_beyond_default_threshold_is_excluded() {
        let candidates = vec!["zzzzzzzzzz".to_string()];
        assert!(suggest("a", &candidates).is_empty());
    }

    #[test]
    fn caps_results_at_k() {
        let candidates = vec![
            "rub".to_string(),
            "rib".to_string(),
            "rob".to_string(),
            "rab".to_string(),
        ];
        assert_eq!(suggest_with("run", &candidates, 2, 3).len(), 2);
    }

    #[test]
    fn long_inputs_use_the_length_difference_fallback() {
        let long_input = "a".repeat(300);
        let candidates = vec!["a".repeat(301)];
        // Falls back to the length-difference heuristic (distance 1) rather
        // than running full dynamic-programming Levenshtein.
        assert_eq!(suggest(&long_input, &candidates), vec!["a".repeat(301)]);
    }
}
