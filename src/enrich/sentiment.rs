//! Lexicon-based sentiment labelling.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::enrich::text::tokenize;

/// Coarse sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Stored and serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    fn from_score(score: i32) -> Self {
        match score.cmp(&0) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => Err(format!("unknown sentiment label: {other}")),
        }
    }
}

static LEXICON: Lazy<HashMap<&'static str, i32>> = Lazy::new(|| {
    const POSITIVE: &[(&str, i32)] = &[
        ("good", 1),
        ("great", 2),
        ("positive", 1),
        ("win", 1),
        ("wins", 1),
        ("won", 1),
        ("benefit", 1),
        ("benefits", 1),
        ("beneficial", 1),
        ("growth", 1),
        ("grow", 1),
        ("grows", 1),
        ("success", 2),
        ("successful", 2),
        ("gain", 1),
        ("gains", 1),
        ("rise", 1),
        ("rises", 1),
        ("rally", 1),
        ("surge", 1),
        ("surges", 1),
        ("record", 1),
        ("improve", 1),
        ("improved", 1),
        ("improves", 1),
        ("recovery", 1),
        ("recover", 1),
        ("boost", 1),
        ("strong", 1),
        ("stronger", 1),
        ("progress", 1),
        ("breakthrough", 2),
        ("celebrate", 2),
        ("celebrates", 2),
        ("hope", 1),
        ("hopeful", 1),
        ("optimistic", 2),
        ("optimism", 2),
        ("praise", 1),
        ("praised", 1),
        ("excellent", 2),
        ("happy", 1),
        ("safe", 1),
        ("peace", 1),
        ("agreement", 1),
        ("support", 1),
        ("welcome", 1),
        ("welcomed", 1),
    ];
    const NEGATIVE: &[(&str, i32)] = &[
        ("bad", -1),
        ("worse", -1),
        ("worst", -2),
        ("loss", -1),
        ("losses", -1),
        ("lose", -1),
        ("decline", -1),
        ("declines", -1),
        ("negative", -1),
        ("risk", -1),
        ("risks", -1),
        ("crash", -2),
        ("crashes", -2),
        ("drop", -1),
        ("drops", -1),
        ("fall", -1),
        ("falls", -1),
        ("fell", -1),
        ("plunge", -2),
        ("plunges", -2),
        ("slump", -1),
        ("crisis", -2),
        ("fear", -1),
        ("fears", -1),
        ("warn", -1),
        ("warns", -1),
        ("warning", -1),
        ("threat", -1),
        ("threatens", -1),
        ("fail", -1),
        ("fails", -1),
        ("failed", -1),
        ("failure", -2),
        ("weak", -1),
        ("weaker", -1),
        ("recession", -2),
        ("war", -2),
        ("attack", -2),
        ("killed", -2),
        ("dead", -2),
        ("death", -2),
        ("deaths", -2),
        ("injured", -1),
        ("disaster", -2),
        ("scandal", -2),
        ("fraud", -2),
        ("layoffs", -1),
        ("bankrupt", -2),
        ("bankruptcy", -2),
        ("concern", -1),
        ("concerns", -1),
        ("terrible", -2),
        ("sad", -1),
        ("angry", -1),
        ("protest", -1),
        ("protests", -1),
    ];
    POSITIVE.iter().chain(NEGATIVE).copied().collect()
});

fn is_negator(token: &str) -> bool {
    matches!(
        token,
        "not" | "no" | "never" | "cannot" | "without" | "hardly" | "neither" | "nor"
    ) || token.ends_with("n't")
}

/// Lexicon score of `text`.
///
/// A lexicon word preceded by a negator within the previous three tokens
/// counts with the opposite sign.
pub fn score(text: &str) -> i32 {
    let tokens = tokenize(text);
    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            let base = LEXICON.get(token.as_str()).copied().unwrap_or(0);
            if base == 0 {
                return 0;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(&tokens[i - k]));
            if negated {
                -base
            } else {
                base
            }
        })
        .sum()
}

/// Label the sentiment of `text`. Empty text is neutral.
pub fn classify(text: &str) -> Sentiment {
    Sentiment::from_score(score(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_positive_and_negative() {
        assert_eq!(
            classify("The company reported record growth and a great quarter."),
            Sentiment::Positive
        );
        assert_eq!(
            classify("Markets crash as recession fears deepen."),
            Sentiment::Negative
        );
    }

    #[test]
    fn test_classify_neutral() {
        assert_eq!(classify(""), Sentiment::Neutral);
        assert_eq!(classify("   "), Sentiment::Neutral);
        assert_eq!(classify("The council met on Tuesday."), Sentiment::Neutral);
        assert_eq!(classify("A good start, then a bad end."), Sentiment::Neutral);
    }

    #[test]
    fn test_negation_flips_sign() {
        assert_eq!(classify("This is not good."), Sentiment::Negative);
        assert_eq!(classify("The plan didn't fail."), Sentiment::Positive);
        assert_eq!(classify("There was no real crisis."), Sentiment::Positive);
    }

    #[test]
    fn test_negation_window_is_three_tokens() {
        // "not" is four tokens before "good"
        assert_eq!(score("not one two three good"), 1);
        assert_eq!(score("not two three good"), -1);
    }

    #[test]
    fn test_label_round_trip() {
        for label in [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative] {
            assert_eq!(label.as_str().parse::<Sentiment>().unwrap(), label);
        }
        assert!("mixed".parse::<Sentiment>().is_err());
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Sentiment::Negative).unwrap(),
            "\"negative\""
        );
    }
}
