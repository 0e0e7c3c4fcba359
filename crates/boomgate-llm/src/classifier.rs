//! Keyword task classifier.
//!
//! Scans the user message for keyword patterns in English and Russian and
//! maps it to at most one [`TaskTag`]. Patterns are checked in priority
//! order (technical, creative, search); the first match wins. No match
//! leaves the message unclassified.
//!
//! Matching is case-insensitive and anchored at the start of a word:
//! single-word keywords are stems (`алгоритм` matches "алгоритмы" but
//! `server` does not match "observer"), phrases must start on a word
//! boundary, and short ASCII keywords (`api`, `sql`, `c++`) must match a
//! whole token so that "apis" or "capital" do not read as "api".

use boomgate_types::TaskTag;

/// ASCII keywords up to this many characters match whole tokens only.
const SHORT_KEYWORD_LEN: usize = 4;

/// A keyword pattern entry: a list of keywords and the tag they map to.
struct KeywordPattern {
    keywords: &'static [&'static str],
    tag: TaskTag,
}

/// Static keyword patterns checked in priority order (first match wins).
const PATTERNS: &[KeywordPattern] = &[
    KeywordPattern {
        keywords: &[
            "код",
            "программирован",
            "алгоритм",
            "функци",
            "сервер",
            "фронтенд",
            "бэкенд",
            "база данных",
            "javascript",
            "typescript",
            "python",
            "java",
            "c++",
            "c#",
            "rust",
            "golang",
            "coding",
            "programming",
            "code",
            "algorithm",
            "function",
            "api",
            "server",
            "backend",
            "frontend",
            "database",
            "sql",
            "nosql",
            "mongodb",
            "json",
            "html",
            "css",
            "git",
            "github",
            "docker",
            "kubernetes",
            "devops",
            "react",
            "angular",
            "vue",
            "node",
            "npm",
            "yarn",
            "webpack",
            "compile",
            "debug",
            "regex",
        ],
        tag: TaskTag::Technical,
    },
    KeywordPattern {
        keywords: &[
            "придумай",
            "сочини",
            "напиши",
            "стих",
            "поэм",
            "рассказ",
            "сказк",
            "роман",
            "новелл",
            "песн",
            "слоган",
            "лозунг",
            "рифм",
            "метафор",
            "творчеств",
            "креатив",
            "creative",
            "poem",
            "story",
            "tale",
            "fiction",
            "screenplay",
            "lyrics",
            "slogan",
            "rhyme",
            "metaphor",
            "write a",
        ],
        tag: TaskTag::Creative,
    },
    KeywordPattern {
        keywords: &[
            "новост",
            "последние",
            "сегодня",
            "вчера",
            "актуальн",
            "статистик",
            "факт",
            "информаци",
            "определение",
            "news",
            "latest",
            "recent",
            "today",
            "yesterday",
            "breaking",
            "headline",
            "trend",
            "statistics",
            "fact",
            "information",
            "definition",
            "how many",
            "how much",
            "who is",
            "when did",
            "search",
            "look up",
        ],
        tag: TaskTag::Search,
    },
];

/// The result of classifying a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskProfile {
    /// Detected task tag, if any pattern matched.
    pub tag: Option<TaskTag>,

    /// Keywords of the winning pattern found in the message.
    pub keywords: Vec<&'static str>,
}

/// Keyword-based task classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    /// Create a new keyword classifier.
    pub fn new() -> Self {
        Self
    }

    /// Classify a message. Never produces [`TaskTag::Fast`].
    pub fn classify(&self, message: &str) -> TaskProfile {
        let lower = message.to_lowercase();
        let tokens = tokenize(&lower);

        for pattern in PATTERNS {
            let hits: Vec<&'static str> = pattern
                .keywords
                .iter()
                .copied()
                .filter(|kw| keyword_matches(&lower, &tokens, kw))
                .collect();
            if !hits.is_empty() {
                return TaskProfile {
                    tag: Some(pattern.tag),
                    keywords: hits,
                };
            }
        }

        TaskProfile {
            tag: None,
            keywords: Vec::new(),
        }
    }
}

/// Split lowercased text into the tokens short keywords are compared against.
pub(crate) fn tokenize(lower: &str) -> Vec<&str> {
    lower
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whether `keyword` occurs in `lower` at the start of a word.
///
/// `tokens` must come from [`tokenize`] applied to `lower`.
pub(crate) fn keyword_matches(lower: &str, tokens: &[&str], keyword: &str) -> bool {
    if keyword.contains(' ') {
        return phrase_at_word_start(lower, keyword);
    }
    if keyword.is_ascii() && keyword.len() <= SHORT_KEYWORD_LEN {
        tokens.contains(&keyword)
    } else {
        tokens.iter().any(|t| t.starts_with(keyword))
    }
}

fn phrase_at_word_start(lower: &str, phrase: &str) -> bool {
    lower.match_indices(phrase).any(|(i, _)| {
        lower[..i]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
    })
}
