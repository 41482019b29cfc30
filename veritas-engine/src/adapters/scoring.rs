//! Shared response normalization
//!
//! Every adapter uses these tables so scores and artifact labels stay
//! comparable across providers. Matching is case-insensitive substring
//! matching; each table entry counts at most once per response. Score
//! patterns only match at the start of a word, so "natural" does not fire
//! inside "unnatural".

/// Starting point of the keyword rule
pub const BASELINE_SCORE: i32 = 50;

/// Fixed increment applied per matched keyword
pub const KEYWORD_WEIGHT: i32 = 15;

/// Ordered `(pattern, weight)` rules for the keyword fallback
pub const SCORE_RULES: &[(&str, i32)] = &[
    // Manipulation indicators
    ("deepfake", KEYWORD_WEIGHT),
    ("manipulated", KEYWORD_WEIGHT),
    ("synthetic", KEYWORD_WEIGHT),
    ("ai-generated", KEYWORD_WEIGHT),
    ("artificial", KEYWORD_WEIGHT),
    ("tampered", KEYWORD_WEIGHT),
    ("spliced", KEYWORD_WEIGHT),
    ("face swap", KEYWORD_WEIGHT),
    ("inconsistent", KEYWORD_WEIGHT),
    ("unnatural", KEYWORD_WEIGHT),
    ("inauthentic", KEYWORD_WEIGHT),
    // Authenticity indicators
    ("authentic", -KEYWORD_WEIGHT),
    ("genuine", -KEYWORD_WEIGHT),
    ("unaltered", -KEYWORD_WEIGHT),
    ("no signs of", -KEYWORD_WEIGHT),
    ("natural", -KEYWORD_WEIGHT),
    ("human-written", -KEYWORD_WEIGHT),
];

/// Ordered `(pattern, label)` artifact vocabulary
pub const ARTIFACT_VOCABULARY: &[(&str, &str)] = &[
    ("blending", "Facial blending boundaries"),
    ("lighting", "Inconsistent lighting"),
    ("shadow", "Shadow inconsistencies"),
    ("lip sync", "Lip-sync mismatch"),
    ("lip-sync", "Lip-sync mismatch"),
    ("blink", "Unnatural blinking"),
    ("warp", "Geometric warping"),
    ("texture", "Texture irregularities"),
    ("compression", "Compression anomalies"),
    ("frequency", "Frequency-domain anomalies"),
    ("spectral", "Spectral voice artifacts"),
    ("metadata", "Metadata inconsistencies"),
    ("repetitive", "Repetitive phrasing"),
    ("midjourney", "Midjourney generator signature"),
    ("stable diffusion", "Stable Diffusion generator signature"),
    ("stablediffusion", "Stable Diffusion generator signature"),
    ("dalle", "DALL-E generator signature"),
];

/// Emitted when no vocabulary entry matches
pub const NO_ARTIFACTS_PLACEHOLDER: &str = "No specific artifacts detected";

/// Derive a 0-100 risk score from free text
pub fn keyword_score(text: &str) -> u8 {
    let lower = text.to_lowercase();
    let score = SCORE_RULES
        .iter()
        .filter(|(pattern, _)| contains_at_word_start(&lower, pattern))
        .fold(BASELINE_SCORE, |acc, (_, weight)| acc + weight);
    score.clamp(0, 100) as u8
}

/// Substring match anchored where no letter or digit precedes it
fn contains_at_word_start(haystack: &str, pattern: &str) -> bool {
    haystack.match_indices(pattern).any(|(start, _)| {
        haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// Extract artifact labels in vocabulary order, deduplicated
///
/// Returns the placeholder instead of an empty list.
pub fn extract_artifacts(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut artifacts: Vec<String> = Vec::new();
    for (pattern, label) in ARTIFACT_VOCABULARY {
        if lower.contains(pattern) && !artifacts.iter().any(|a| a == label) {
            artifacts.push((*label).to_string());
        }
    }

    if artifacts.is_empty() {
        artifacts.push(NO_ARTIFACTS_PLACEHOLDER.to_string());
    }
    artifacts
}

/// Extract artifact labels from provider class names
///
/// Separators are read as spaces, so `lip_sync` matches "lip sync".
pub fn extract_artifacts_from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let text = labels
        .into_iter()
        .map(|label| label.replace(['_', '-'], " "))
        .collect::<Vec<_>>()
        .join(" ");
    extract_artifacts(&text)
}

/// Convert a provider probability (0.0-1.0) to a 0-100 score
///
/// Returns `None` for non-finite values. Out-of-range values are clamped.
pub fn probability_to_score(probability: f64) -> Option<u8> {
    if !probability.is_finite() {
        return None;
    }
    Some((probability.clamp(0.0, 1.0) * 100.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_text_scores_baseline() {
        assert_eq!(keyword_score("The image shows a dog on a beach."), 50);
    }

    #[test]
    fn test_manipulation_keywords_raise_score() {
        assert_eq!(keyword_score("This looks MANIPULATED."), 65);
        assert_eq!(keyword_score("A synthetic, manipulated deepfake."), 95);
    }

    #[test]
    fn test_authenticity_keywords_lower_score() {
        assert_eq!(keyword_score("Appears authentic and unaltered."), 20);
    }

    #[test]
    fn test_negated_authenticity_words_indicate_manipulation() {
        assert_eq!(keyword_score("The face looks unnatural."), 65);
        assert_eq!(keyword_score("The face looks unnatural and inauthentic."), 80);
    }

    #[test]
    fn test_word_start_still_matches_inflections() {
        assert_eq!(keyword_score("Natural skin texture; authentically captured."), 20);
        assert_eq!(keyword_score("Several deepfakes were spliced together."), 80);
    }

    #[test]
    fn test_keyword_repeated_counts_once() {
        assert_eq!(keyword_score("deepfake deepfake deepfake"), 65);
    }

    #[test]
    fn test_score_clamped() {
        let text = "deepfake manipulated synthetic ai-generated artificial tampered spliced face swap inconsistent unnatural";
        assert_eq!(keyword_score(text), 100);

        let text = "authentic genuine unaltered no signs of natural human-written";
        assert_eq!(keyword_score(text), 0);
    }

    #[test]
    fn test_artifacts_in_vocabulary_order() {
        let artifacts = extract_artifacts("Compression noise and odd LIGHTING around the blending seam");
        assert_eq!(
            artifacts,
            vec![
                "Facial blending boundaries".to_string(),
                "Inconsistent lighting".to_string(),
                "Compression anomalies".to_string(),
            ]
        );
    }

    #[test]
    fn test_artifacts_deduplicated() {
        let artifacts = extract_artifacts("lip sync and lip-sync issues");
        assert_eq!(artifacts, vec!["Lip-sync mismatch".to_string()]);
    }

    #[test]
    fn test_artifacts_placeholder_when_none_match() {
        assert_eq!(
            extract_artifacts("nothing to see"),
            vec![NO_ARTIFACTS_PLACEHOLDER.to_string()]
        );
    }

    #[test]
    fn test_artifacts_from_class_labels() {
        let artifacts = extract_artifacts_from_labels(["ai_generated", "midjourney", "lip_sync"]);
        assert_eq!(
            artifacts,
            vec![
                "Lip-sync mismatch".to_string(),
                "Midjourney generator signature".to_string(),
            ]
        );
        assert_eq!(
            extract_artifacts_from_labels(["deepfake"]),
            vec![NO_ARTIFACTS_PLACEHOLDER.to_string()]
        );
    }

    #[test]
    fn test_probability_to_score() {
        assert_eq!(probability_to_score(0.973), Some(97));
        assert_eq!(probability_to_score(0.0), Some(0));
        assert_eq!(probability_to_score(1.7), Some(100));
        assert_eq!(probability_to_score(f64::NAN), None);
    }
}
