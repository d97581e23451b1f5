//! Local content statistics over the page's visible structure
//! (title, headings, link texts).

use async_trait::async_trait;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;
use url::Url;

use super::Summarizer;
use crate::domain::models::{Analysis, Document, ReadabilityLevel, VisualContent};

const TOP_KEYWORDS: usize = 5;
const MIN_HEADING_TEXT_CHARS: usize = 300;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "his", "how", "its", "may", "new", "now", "see", "who",
    "did", "get", "got", "let", "she", "too", "use", "with", "this", "that", "from", "they",
    "will", "would", "there", "their", "what", "about", "which", "when", "make", "like", "than",
    "then", "them", "these", "those", "some", "into", "your", "yours", "also", "been", "were",
    "more", "most", "other", "such", "only", "over", "just", "here", "where", "while", "each",
    "very", "much", "should", "could", "being", "does", "doing", "because", "until", "after",
    "before", "above", "below", "between", "through", "under", "again", "further", "once",
];

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "awesome", "best", "better", "love", "happy",
    "wonderful", "fantastic", "positive", "success", "successful", "easy", "reliable", "perfect",
    "beautiful", "fast", "secure", "trusted", "innovative", "helpful", "powerful", "free",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "terrible", "awful", "worst", "worse", "hate", "sad", "negative", "fail",
    "failure", "failed", "problem", "difficult", "broken", "error", "slow", "expensive", "risk",
    "wrong", "ugly", "scam", "dangerous", "unreliable", "insecure",
];

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".ogg", ".avi", ".mov"];

const GENERIC_SUGGESTIONS: &[&str] = &[
    "Keep page content up to date and review it regularly.",
    "Link to related pages on your site to help visitors and crawlers.",
    "Make sure every image has descriptive alt text.",
];

fn punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}\p{N}\s]+").unwrap())
}

/// Lowercased, punctuation-free whitespace tokens.
fn tokenize(text: &str) -> Vec<String> {
    punctuation()
        .replace_all(&text.to_lowercase(), "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSummarizer;

impl HeuristicSummarizer {
    pub fn analyze(&self, document: &Document) -> Analysis {
        let segments = document.text_segments();
        let text = segments.join("\n");

        let readability_score = Self::readability_score(&segments);
        let (keyword_density, top_keywords) = Self::keyword_density(&text);
        let sentiment = Self::sentiment_ratio(&text);

        Analysis {
            summary: Self::summary_text(document, &top_keywords),
            readability_score,
            readability_level: ReadabilityLevel::from_score(readability_score),
            top_keywords,
            keyword_density,
            sentiment_score: round2(sentiment),
            sentiment_analysis: sentiment_label(sentiment).to_string(),
            suggestions: Self::suggestions(document),
            visual_content: Self::visual_content(document),
        }
    }

    /// `60 + 2 * avg words per sentence + 0.5 * % words longer than 6 chars`, clamped to 0..=100.
    ///
    /// Every segment is at least one sentence; segments are further split on `.`, `!` and `?`.
    pub fn readability_score(segments: &[&str]) -> f64 {
        let sentences: Vec<Vec<&str>> = segments
            .iter()
            .flat_map(|segment| segment.split(['.', '!', '?']))
            .map(|sentence| sentence.split_whitespace().collect::<Vec<_>>())
            .filter(|words| !words.is_empty())
            .collect();

        let total_words: usize = sentences.iter().map(Vec::len).sum();
        if total_words == 0 {
            return 60.0;
        }

        let long_words = sentences
            .iter()
            .flatten()
            .filter(|word| word.chars().filter(|c| c.is_alphanumeric()).count() > 6)
            .count();

        let avg_words = total_words as f64 / sentences.len() as f64;
        let pct_long = 100.0 * long_words as f64 / total_words as f64;

        round2((60.0 + 2.0 * avg_words + 0.5 * pct_long).clamp(0.0, 100.0))
    }

    /// Percentage share of each kept token plus the top keywords by share,
    /// ties broken by first occurrence.
    pub fn keyword_density(text: &str) -> (BTreeMap<String, f64>, Vec<String>) {
        let tokens: Vec<String> = tokenize(text)
            .into_iter()
            .filter(|t| t.chars().count() > 2 && !STOP_WORDS.contains(&t.as_str()))
            .collect();

        if tokens.is_empty() {
            return (BTreeMap::new(), Vec::new());
        }

        // word -> (count, first index)
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (i, token) in tokens.iter().enumerate() {
            counts.entry(token.as_str()).or_insert((0, i)).0 += 1;
        }

        let total = tokens.len() as f64;
        let density = counts
            .iter()
            .map(|(word, (count, _))| (word.to_string(), round2(100.0 * *count as f64 / total)))
            .collect();

        let mut ranked: Vec<(&str, usize, usize)> = counts
            .into_iter()
            .map(|(word, (count, first))| (word, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let top = ranked
            .into_iter()
            .take(TOP_KEYWORDS)
            .map(|(word, _, _)| word.to_string())
            .collect();

        (density, top)
    }

    /// Sentiment ratio rounded to 2 decimals for display.
    pub fn sentiment_score(text: &str) -> f64 {
        round2(Self::sentiment_ratio(text))
    }

    /// `(positive - negative) / (positive + negative)`, 0 when neither occurs.
    /// Labels are derived from this unrounded value.
    pub fn sentiment_ratio(text: &str) -> f64 {
        let (positive, negative) = tokenize(text).iter().fold((0usize, 0usize), |(p, n), t| {
            if POSITIVE_WORDS.contains(&t.as_str()) {
                (p + 1, n)
            } else if NEGATIVE_WORDS.contains(&t.as_str()) {
                (p, n + 1)
            } else {
                (p, n)
            }
        });

        if positive + negative == 0 {
            return 0.0;
        }
        (positive as f64 - negative as f64) / (positive + negative) as f64
    }

    pub fn suggestions(document: &Document) -> Vec<String> {
        let mut suggestions = Vec::new();

        match document.h1_count() {
            0 => suggestions.push("Add an H1 heading that states the main topic of the page.".to_string()),
            1 => {}
            n => suggestions.push(format!(
                "Use a single H1 heading; this page has {n}. Demote the others to H2."
            )),
        }

        let heading_chars: usize = document
            .headings
            .iter()
            .map(|h| h.text.trim().chars().count())
            .sum();
        if heading_chars < MIN_HEADING_TEXT_CHARS {
            suggestions.push(format!(
                "Expand your headings to describe the page structure ({heading_chars} characters of heading text found)."
            ));
        }

        if document.screenshot.is_none() {
            suggestions.push("Capture a screenshot to review how the page renders.".to_string());
        }

        if suggestions.is_empty() {
            suggestions = GENERIC_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
        }
        suggestions
    }

    /// Counts link targets whose path ends in a known image or video
    /// extension. This approximates media on the page from links only; embedded
    /// `<img>`/`<video>` elements are not inspected.
    pub fn visual_content(document: &Document) -> VisualContent {
        document
            .links
            .iter()
            .filter_map(|link| {
                let path = Url::parse(&link.href)
                    .map(|u| u.path().to_lowercase())
                    .unwrap_or_else(|_| link.href.to_lowercase());
                if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
                    Some((1, 0))
                } else if VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
                    Some((0, 1))
                } else {
                    None
                }
            })
            .fold(VisualContent::default(), |acc, (images, videos)| VisualContent {
                images: acc.images + images,
                videos: acc.videos + videos,
            })
    }

    pub fn summary_text(document: &Document, top_keywords: &[String]) -> String {
        let subject = document
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| format!("\"{t}\""))
            .unwrap_or_else(|| "This page".to_string());

        let topics = if top_keywords.is_empty() {
            "No prominent keywords were found.".to_string()
        } else {
            format!("Main topics: {}.", top_keywords.join(", "))
        };

        format!(
            "{subject} has {} heading{} and {} link{}. {topics}",
            document.headings.len(),
            if document.headings.len() == 1 { "" } else { "s" },
            document.links.len(),
            if document.links.len() == 1 { "" } else { "s" },
        )
    }
}

pub const SENTIMENT_LABELS: [&str; 5] =
    ["Very Positive", "Positive", "Neutral", "Negative", "Very Negative"];

pub fn sentiment_label(score: f64) -> &'static str {
    if score > 0.3 {
        "Very Positive"
    } else if score > 0.1 {
        "Positive"
    } else if score > -0.1 {
        "Neutral"
    } else if score > -0.3 {
        "Negative"
    } else {
        "Very Negative"
    }
}

#[async_trait]
impl Summarizer for HeuristicSummarizer {
    async fn summarize(&self, document: &Document) -> Analysis {
        self.analyze(document)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Heading, Link};

    #[test]
    fn test_keyword_density_cat_cat_dog() {
        let (density, top) = HeuristicSummarizer::keyword_density("cat cat dog");
        assert_eq!(density["cat"], 66.67);
        assert_eq!(density["dog"], 33.33);
        assert_eq!(top, vec!["cat", "dog"]);
    }

    #[test]
    fn test_keyword_density_filters_short_and_stop_words() {
        let (density, top) =
            HeuristicSummarizer::keyword_density("The API is fast, and the API is cheap!");
        assert!(!density.contains_key("the"));
        assert!(!density.contains_key("is"));
        assert_eq!(top[0], "api");
        assert_eq!(density["api"], 50.0);
    }

    #[test]
    fn test_top_keyword_ties_keep_first_occurrence() {
        let (_, top) = HeuristicSummarizer::keyword_density("zeta alpha beta gamma delta omega");
        assert_eq!(top, vec!["zeta", "alpha", "beta", "gamma", "delta"]);
    }

    #[test]
    fn test_sentiment_two_positive_words() {
        let score = HeuristicSummarizer::sentiment_score("A great and reliable tool");
        assert_eq!(score, 1.0);
        assert_eq!(sentiment_label(score), "Very Positive");
    }

    #[test]
    fn test_sentiment_neutral_without_hits() {
        assert_eq!(HeuristicSummarizer::sentiment_score("plain words only"), 0.0);
        assert_eq!(sentiment_label(0.0), "Neutral");
        assert_eq!(sentiment_label(-0.2), "Negative");
        assert_eq!(sentiment_label(-1.0), "Very Negative");
        assert_eq!(sentiment_label(0.2), "Positive");
    }

    #[test]
    fn test_sentiment_label_uses_unrounded_ratio() {
        let doc = |good: usize, bad: usize| Document {
            title: Some(format!("{}{}", "good ".repeat(good), "bad ".repeat(bad))),
            ..Default::default()
        };

        // 3/29 rounds to 0.10 but is above the Positive threshold
        let analysis = HeuristicSummarizer.analyze(&doc(16, 13));
        assert_eq!(analysis.sentiment_score, 0.1);
        assert_eq!(analysis.sentiment_analysis, "Positive");

        // 7/23 rounds to 0.30 but is above the Very Positive threshold
        let analysis = HeuristicSummarizer.analyze(&doc(15, 8));
        assert_eq!(analysis.sentiment_score, 0.3);
        assert_eq!(analysis.sentiment_analysis, "Very Positive");
    }

    #[test]
    fn test_href_fallback_link_text_is_not_counted_as_content() {
        let href = "https://example.com/shop/rake";
        let doc = Document {
            title: Some("Garden tools".into()),
            headings: vec![Heading::new(1, "Garden tools")],
            links: vec![
                Link::new(href, href),
                Link::new(href, href),
                Link::new(href, href),
            ],
            ..Default::default()
        };

        let analysis = HeuristicSummarizer.analyze(&doc);
        assert_eq!(analysis.top_keywords, vec!["garden", "tools"]);
        assert!(!analysis.keyword_density.keys().any(|k| k.contains("http")));
    }

    #[test]
    fn test_readability_score_formula() {
        // 2 sentences, 4 words, 1 long word ("features"): 60 + 2*2 + 0.5*25
        let score = HeuristicSummarizer::readability_score(&["Our features. Big win"]);
        assert_eq!(score, 76.5);
        assert_eq!(ReadabilityLevel::from_score(score), ReadabilityLevel::Hard);
        assert_eq!(HeuristicSummarizer::readability_score(&[]), 60.0);
    }

    #[test]
    fn test_suggestions_are_never_empty() {
        let rich = Document {
            headings: vec![Heading::new(1, "x".repeat(320))],
            screenshot: Some("AAAA".into()),
            ..Default::default()
        };
        let suggestions = HeuristicSummarizer::suggestions(&rich);
        assert_eq!(suggestions.len(), GENERIC_SUGGESTIONS.len());

        let bare = Document::default();
        let suggestions = HeuristicSummarizer::suggestions(&bare);
        assert!(suggestions.iter().any(|s| s.contains("H1")));
        assert!(suggestions.iter().any(|s| s.contains("screenshot")));
    }

    #[test]
    fn test_visual_content_counts_by_extension() {
        let doc = Document {
            links: vec![
                Link::new("https://x.test/a.PNG", "a"),
                Link::new("https://x.test/b.jpg?size=2", "b"),
                Link::new("https://x.test/c.mp4", "c"),
                Link::new("https://x.test/page.html", "d"),
            ],
            ..Default::default()
        };
        assert_eq!(
            HeuristicSummarizer::visual_content(&doc),
            VisualContent { images: 2, videos: 1 }
        );
    }

    #[tokio::test]
    async fn test_summarize_empty_document() {
        let analysis = HeuristicSummarizer.summarize(&Document::default()).await;
        assert!(analysis.top_keywords.is_empty());
        assert!(!analysis.suggestions.is_empty());
        assert!(analysis.summary.starts_with("This page has 0 headings"));
    }
}
