//! Fail-closed extraction of confidence and answer from a model response.
//!
//! A response that does not carry an unambiguous confidence token is a
//! parse failure, never a neutral default: defaulting to 0.5 would feed a
//! fabricated signal into fitness aggregation and quietly corrupt the
//! search.

use std::sync::OnceLock;

use regex::Regex;

use natsel_core::FailureReason;

/// Result of parsing one model response.
#[derive(Debug, Clone, PartialEq)]
pub enum Parse {
    /// Both a confidence and an answer were extracted.
    Parsed {
        /// Confidence normalized to 0.0..=1.0
        confidence: f64,
        /// Extracted answer text
        answer: String,
    },
    /// The response could not be used.
    Failed {
        /// Why extraction failed
        reason: FailureReason,
    },
}

// Values this close together are the same statement of confidence, not a
// conflict (e.g. "75%" restated as "0.75").
const CONFIDENCE_CONFLICT_EPSILON: f64 = 0.015;

fn confidence_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // "Confidence: 75%"
            r"(?i)confidence[:\s]+(\d+(?:\.\d+)?)\s*%",
            // "75% confident"
            r"(?i)(\d+(?:\.\d+)?)\s*%\s*confiden",
            // "Confidence: 0.75"
            r"(?i)confidence[:\s]+(0?\.\d+)",
            // "75 percent confident"
            r"(?i)(\d+(?:\.\d+)?)\s*percent\s*confiden",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("confidence pattern is valid"))
        .collect()
    })
}

fn answer_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // "Answer: xyz"
            r"(?im)^\s*(?:answer|prediction)\s*:\s*(.+)$",
            // "The answer is xyz"
            r"(?i)(?:answer|prediction)\s+is:?\s+([^\n]+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("answer pattern is valid"))
        .collect()
    })
}

fn normalize_confidence(raw: f64) -> f64 {
    let value = if raw > 1.0 { raw / 100.0 } else { raw };
    value.clamp(0.0, 1.0)
}

fn clean_answer(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim_end_matches('.')
        .trim()
        .to_string()
}

/// Extract `(confidence, answer)` from a model response, or fail closed.
pub fn parse_prediction(text: &str) -> Parse {
    // Confidence: gather every explicit statement across all patterns.
    let mut stated: Vec<f64> = Vec::new();
    for pattern in confidence_patterns() {
        for captures in pattern.captures_iter(text) {
            if let Some(value) = captures.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
                stated.push(normalize_confidence(value));
            }
        }
    }

    let Some(&confidence) = stated.first() else {
        return Parse::Failed { reason: FailureReason::MissingConfidence };
    };
    let spread = stated.iter().cloned().fold(f64::MIN, f64::max)
        - stated.iter().cloned().fold(f64::MAX, f64::min);
    if spread > CONFIDENCE_CONFLICT_EPSILON {
        return Parse::Failed { reason: FailureReason::AmbiguousConfidence };
    }

    // Answer: structured patterns first, then the last substantive line.
    let mut answer = String::new();
    for pattern in answer_patterns() {
        if let Some(captures) = pattern.captures(text) {
            if let Some(m) = captures.get(1) {
                answer = clean_answer(m.as_str());
                if !answer.is_empty() {
                    break;
                }
            }
        }
    }

    if answer.is_empty() {
        answer = text
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| {
                !line.is_empty() && !confidence_patterns().iter().any(|p| p.is_match(line))
            })
            .map(clean_answer)
            .unwrap_or_default();
    }

    if answer.is_empty() {
        return Parse::Failed { reason: FailureReason::MissingAnswer };
    }

    Parse::Parsed { confidence, answer }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_format() {
        let parse = parse_prediction("Confidence: 75%\nAnswer: Canberra");
        assert_eq!(parse, Parse::Parsed { confidence: 0.75, answer: "Canberra".to_string() });
    }

    #[test]
    fn test_parse_fraction_confidence() {
        let parse = parse_prediction("Confidence: 0.9\nAnswer: Mercury");
        assert_eq!(parse, Parse::Parsed { confidence: 0.9, answer: "Mercury".to_string() });
    }

    #[test]
    fn test_parse_natural_language_confidence() {
        let parse = parse_prediction("I'm about 85% confident.\nAnswer: Au");
        assert_eq!(parse, Parse::Parsed { confidence: 0.85, answer: "Au".to_string() });
    }

    #[test]
    fn test_missing_confidence_fails_closed() {
        // The old behavior defaulted to confidence 0.5; the parser must
        // refuse instead.
        let parse = parse_prediction("The answer is Paris, I feel good about it.");
        assert_eq!(parse, Parse::Failed { reason: FailureReason::MissingConfidence });
    }

    #[test]
    fn test_conflicting_confidences_fail_closed() {
        let parse = parse_prediction("Confidence: 90%\nActually, confidence: 20%\nAnswer: 42");
        assert_eq!(parse, Parse::Failed { reason: FailureReason::AmbiguousConfidence });
    }

    #[test]
    fn test_restated_confidence_is_not_a_conflict() {
        let parse = parse_prediction("Confidence: 75%\nI am 75% confident.\nAnswer: Sweden");
        assert_eq!(parse, Parse::Parsed { confidence: 0.75, answer: "Sweden".to_string() });
    }

    #[test]
    fn test_missing_answer_fails_closed() {
        let parse = parse_prediction("Confidence: 60%");
        assert_eq!(parse, Parse::Failed { reason: FailureReason::MissingAnswer });
    }

    #[test]
    fn test_answer_cleanup_strips_quotes_and_period() {
        let parse = parse_prediction("Confidence: 70%\nAnswer: \"Seychelles\".");
        assert_eq!(parse, Parse::Parsed { confidence: 0.7, answer: "Seychelles".to_string() });
    }

    #[test]
    fn test_answer_is_pattern() {
        let parse = parse_prediction("Confidence: 55%\nThe answer is 391");
        assert_eq!(parse, Parse::Parsed { confidence: 0.55, answer: "391".to_string() });
    }

    #[test]
    fn test_last_line_fallback_skips_confidence_line() {
        let parse = parse_prediction("Let me think.\nGalileo\nConfidence: 65%");
        assert_eq!(parse, Parse::Parsed { confidence: 0.65, answer: "Galileo".to_string() });
    }

    #[test]
    fn test_confidence_over_100_is_clamped() {
        let parse = parse_prediction("Confidence: 110%\nAnswer: yes");
        assert_eq!(parse, Parse::Parsed { confidence: 1.0, answer: "yes".to_string() });
    }
}
