//! Domain entities for a single page analysis.

use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

// ====== Enums ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Issue tags produced by the analyzer rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    #[serde(rename = "Missing Title")]
    MissingTitle,
    #[serde(rename = "Short Title")]
    ShortTitle,
    #[serde(rename = "Long Title")]
    LongTitle,
    #[serde(rename = "No Headings")]
    NoHeadings,
    #[serde(rename = "Missing H1")]
    MissingH1,
    #[serde(rename = "Multiple H1s")]
    MultipleH1s,
    #[serde(rename = "Heading Hierarchy")]
    HeadingHierarchy,
    #[serde(rename = "Empty Headings")]
    EmptyHeadings,
    #[serde(rename = "Empty Links")]
    EmptyLinks,
    #[serde(rename = "Non-descriptive Links")]
    NonDescriptiveLinks,
    #[serde(rename = "Broken Links")]
    BrokenLinks,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::MissingTitle => "Missing Title",
            IssueKind::ShortTitle => "Short Title",
            IssueKind::LongTitle => "Long Title",
            IssueKind::NoHeadings => "No Headings",
            IssueKind::MissingH1 => "Missing H1",
            IssueKind::MultipleH1s => "Multiple H1s",
            IssueKind::HeadingHierarchy => "Heading Hierarchy",
            IssueKind::EmptyHeadings => "Empty Headings",
            IssueKind::EmptyLinks => "Empty Links",
            IssueKind::NonDescriptiveLinks => "Non-descriptive Links",
            IssueKind::BrokenLinks => "Broken Links",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadabilityLevel {
    Easy,
    Medium,
    Hard,
}

impl ReadabilityLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 40.0 {
            ReadabilityLevel::Easy
        } else if score < 70.0 {
            ReadabilityLevel::Medium
        } else {
            ReadabilityLevel::Hard
        }
    }
}

// ====== Page Elements ======

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1..=6, taken from the tag name
    pub level: u8,
    pub text: String,
}

impl Heading {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn tag(&self) -> String {
        format!("h{}", self.level)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Absolute http(s) URL
    pub href: String,
    pub text: String,
    #[serde(default)]
    pub is_broken: bool,
}

impl Link {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
            is_broken: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub description: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl Issue {
    pub fn new(kind: IssueKind, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            severity,
            element: None,
        }
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }
}

// ====== Rich Entity: Document ======

/// Normalized extraction of one fetched page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub title: Option<String>,
    pub headings: Vec<Heading>,
    pub links: Vec<Link>,
    /// Base64-encoded PNG
    pub screenshot: Option<String>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Set when the page could not be fetched; content fields are then empty.
    #[serde(default)]
    pub error: Option<String>,
}

impl Document {
    /// Document for a page that could not be fetched.
    pub fn failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            error: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn h1_count(&self) -> usize {
        self.headings.iter().filter(|h| h.level == 1).count()
    }

    pub fn broken_link_count(&self) -> usize {
        self.links.iter().filter(|l| l.is_broken).count()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Title, headings and link texts, one segment per element.
    ///
    /// Link texts that fell back to the href (image-only or empty anchors)
    /// are skipped.
    pub fn text_segments(&self) -> Vec<&str> {
        self.title
            .as_deref()
            .into_iter()
            .chain(self.headings.iter().map(|h| h.text.as_str()))
            .chain(
                self.links
                    .iter()
                    .filter(|l| l.text.trim() != l.href)
                    .map(|l| l.text.as_str()),
            )
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Raw output of a page fetcher, before structural extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSnapshot {
    /// URL after redirects
    pub final_url: String,
    pub title: Option<String>,
    pub html: String,
    /// Base64-encoded PNG
    pub screenshot: Option<String>,
}

// ====== Content Analysis ======

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualContent {
    pub images: usize,
    pub videos: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub summary: String,
    pub readability_score: f64,
    pub readability_level: ReadabilityLevel,
    pub top_keywords: Vec<String>,
    pub keyword_density: BTreeMap<String, f64>,
    pub sentiment_score: f64,
    pub sentiment_analysis: String,
    pub suggestions: Vec<String>,
    pub visual_content: VisualContent,
}

// ====== Persistence ======

/// A record as handed to the store; id and timestamp are assigned on save.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysisRecord {
    pub document: Document,
    pub analysis: Option<Analysis>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub document: Document,
    pub analysis: Option<Analysis>,
}

impl AnalysisRecord {
    pub fn from_new(record: NewAnalysisRecord) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            // storage keeps microseconds
            created_at: Utc::now().trunc_subsecs(6),
            document: record.document,
            analysis: record.analysis,
        }
    }
}

/// Output of the result assembler. `id`/`created_at` are present only when persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub document: Document,
    pub analysis: Option<Analysis>,
}

impl AnalysisResult {
    pub fn ephemeral(document: Document, analysis: Option<Analysis>) -> Self {
        Self {
            id: None,
            created_at: None,
            document,
            analysis,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl From<AnalysisRecord> for AnalysisResult {
    fn from(record: AnalysisRecord) -> Self {
        Self {
            id: Some(record.id),
            created_at: Some(record.created_at),
            document: record.document,
            analysis: record.analysis,
        }
    }
}
