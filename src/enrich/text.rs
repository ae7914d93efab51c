//! Plain-text helpers shared by the parser and the enricher.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static SCRIPT_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->")
        .expect("valid script/style pattern")
});

/// Turn an HTML page or fragment into readable text.
///
/// Script and style blocks and comments are dropped entirely, then tags are
/// stripped as in [`strip_html`].
pub fn html_to_text(html: &str) -> String {
    strip_html(&SCRIPT_STYLE.replace_all(html, " "))
}

/// Strip HTML tags, decode entities and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let mut stripped = String::with_capacity(html.len());
    let mut in_tag = false;

    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                stripped.push(' ');
            }
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }

    html_escape::decode_html_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split text into sentences.
///
/// A sentence ends at `.`, `!` or `?` (plus any closing quotes or brackets)
/// followed by whitespace or the end of the text. Sentences are trimmed and
/// empty ones dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        current.push(ch);
        i += 1;

        if matches!(ch, '.' | '!' | '?') {
            while i < chars.len() && is_sentence_tail(chars[i]) {
                current.push(chars[i]);
                i += 1;
            }
            if i == chars.len() || chars[i].is_whitespace() {
                push_sentence(&mut sentences, &mut current);
            }
        }
    }
    push_sentence(&mut sentences, &mut current);

    sentences
}

fn is_sentence_tail(ch: char) -> bool {
    matches!(
        ch,
        '.' | '!' | '?' | '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}'
    )
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let sentence = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
    current.clear();
}

/// Lower-cased word tokens. Inner apostrophes are kept ("don't").
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|t| t.trim_matches(|c| c == '\'' || c == '\u{2019}'))
        .filter(|t| !t.is_empty())
        .map(|t| t.replace('\u{2019}', "'").to_lowercase())
        .collect()
}

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down",
        "during", "each", "few", "for", "from", "further", "had", "has", "have", "having", "he",
        "her", "here", "hers", "herself", "him", "himself", "his", "how", "i", "if", "in",
        "into", "is", "it", "its", "itself", "just", "me", "more", "most", "my", "myself",
        "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves",
        "out", "over", "own", "said", "same", "says", "she", "should", "so", "some", "such",
        "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
        "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
        "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
        "why", "will", "with", "would", "you", "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

/// Whether a lower-cased token carries no content for scoring.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_tags_and_entities() {
        assert_eq!(
            strip_html("<p>Stocks &amp; bonds</p><p>rose&nbsp;today &#8212; again</p>"),
            "Stocks & bonds rose today \u{2014} again"
        );
        assert_eq!(strip_html("&#x41;&#66;"), "AB");
    }

    #[test]
    fn test_strip_html_keeps_bare_ampersand() {
        assert_eq!(strip_html("AT&T shares fell"), "AT&T shares fell");
        assert_eq!(strip_html("Q&A"), "Q&A");
        assert_eq!(strip_html("fish & chips"), "fish & chips");
    }

    #[test]
    fn test_strip_html_decodes_named_entities() {
        assert_eq!(
            strip_html("Caf&eacute; prices rose &euro;5 &copy; 2024"),
            "Caf\u{e9} prices rose \u{20ac}5 \u{a9} 2024"
        );
        assert_eq!(
            strip_html("Wait&hellip; &ldquo;no&rdquo;"),
            "Wait\u{2026} \u{201c}no\u{201d}"
        );
    }

    #[test]
    fn test_strip_html_escaped_markup_stays_text() {
        assert_eq!(strip_html("<p>1 &lt; 2</p>"), "1 < 2");
    }

    #[test]
    fn test_strip_html_unknown_entity_kept() {
        assert_eq!(strip_html("a &bogus; b"), "a &bogus; b");
    }

    #[test]
    fn test_html_to_text_drops_scripts_and_styles() {
        let html = r#"<html><head><style>p { color: red; }</style>
            <script type="text/javascript">var x = "<p>no</p>";</script></head>
            <body><!-- nav --><h1>Title</h1><p>Body text.</p></body></html>"#;
        assert_eq!(html_to_text(html), "Title Body text.");
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("First one. Second one! Is this third?  Fourth");
        assert_eq!(
            sentences,
            vec!["First one.", "Second one!", "Is this third?", "Fourth"]
        );
    }

    #[test]
    fn test_split_sentences_keeps_decimals_and_quotes() {
        let sentences = split_sentences("Shares rose 2.5 percent. \"It was great.\" Done.");
        assert_eq!(
            sentences,
            vec!["Shares rose 2.5 percent.", "\"It was great.\"", "Done."]
        );
    }

    #[test]
    fn test_split_sentences_empty() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n\t ").is_empty());
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Markets didn\u{2019}t CRASH, 'analysts' said."),
            vec!["markets", "didn't", "crash", "analysts", "said"]
        );
    }

    #[test]
    fn test_is_stop_word() {
        assert!(is_stop_word("the"));
        assert!(!is_stop_word("economy"));
    }
}
