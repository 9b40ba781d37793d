//! Name normalization and edit-distance similarity.

/// Canonical form of a display name for comparison purposes.
///
/// Lowercases, folds every run of non-alphanumeric characters to a single
/// space, trims, and strips one leading definite article.
#[must_use]
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    match out.strip_prefix("the ") {
        Some(rest) => rest.to_string(),
        None => out,
    }
}

/// Levenshtein similarity of two names on their normalized forms.
///
/// Returns `1 − distance / max(len)` in `[0, 1]`. Identical inputs score
/// 1; an empty normalized form against anything non-empty scores 0.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let na = normalize(a);
    let nb = normalize(b);
    if na == nb {
        return 1.0;
    }
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&na, &nb)
}

/// Whether two normalized names share at least one whitespace token.
///
/// Cheap pre-filter that bounds the set of fuzzy comparisons the resolver
/// performs.
#[must_use]
pub fn shares_token(normalized_a: &str, normalized_b: &str) -> bool {
    normalized_a
        .split_whitespace()
        .any(|t| normalized_b.split_whitespace().any(|u| t == u))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_strips_punctuation() {
        assert_eq!(normalize("St. Enoch Centre!"), "st enoch centre");
        assert_eq!(normalize("Meadowhall"), "meadowhall");
    }

    #[test]
    fn normalize_strips_leading_article_once() {
        assert_eq!(normalize("The Trafford Centre"), "trafford centre");
        assert_eq!(normalize("The The"), "the");
    }

    #[test]
    fn normalize_collapses_runs_of_separators() {
        assert_eq!(normalize("  Gunwharf -- Quays  "), "gunwharf quays");
    }

    #[test]
    fn similarity_is_one_for_identical_inputs() {
        assert!((similarity("Westfield London", "Westfield London") - 1.0).abs() < f64::EPSILON);
        // Identical even when only the normalized forms agree.
        assert!((similarity("The Lanes", "lanes") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn similarity_is_zero_against_empty() {
        assert!((similarity("", "Bluewater")).abs() < f64::EPSILON);
        assert!((similarity("!!!", "Bluewater")).abs() < f64::EPSILON);
    }

    #[test]
    fn similarity_stays_in_unit_interval() {
        let samples = [
            ("Clyde Shopping Centre", "Clydebank Shopping Centre"),
            ("Fort Kinnaird", "Fort William Retail Park"),
            ("a", "completely different"),
        ];
        for (a, b) in samples {
            let s = similarity(a, b);
            assert!((0.0..=1.0).contains(&s), "similarity({a}, {b}) = {s}");
        }
    }

    #[test]
    fn similarity_rewards_near_identical_names() {
        let s = similarity("Clyde Shopping Centre", "Clyde Shoping Centre");
        assert!(s > 0.9, "got {s}");
    }

    #[test]
    fn shares_token_matches_any_common_word() {
        assert!(shares_token("trafford centre", "intu trafford park"));
        assert!(!shares_token("bluewater", "lakeside"));
    }
}
