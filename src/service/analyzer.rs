//! Heuristic issue detection over an extracted [`Document`].
//!
//! Every rule is evaluated independently and contributes at most one issue.
//! The analyzer is pure: the same document always yields the same list.

use crate::domain::models::{Document, Issue, IssueKind, Severity};

const MIN_TITLE_CHARS: usize = 10;
const MAX_TITLE_CHARS: usize = 60;
const ELEMENT_SNIPPET_CHARS: usize = 80;

/// Anchor texts that say nothing about the link target (compared lowercased, trimmed).
pub const NON_DESCRIPTIVE_LINK_TEXTS: &[&str] =
    &["click here", "here", "read more", "more", "link", "learn more"];

pub struct IssueAnalyzer;

impl IssueAnalyzer {
    pub fn analyze(document: &Document) -> Vec<Issue> {
        let mut issues = Vec::new();

        Self::check_title(document, &mut issues);
        Self::check_headings(document, &mut issues);
        Self::check_links(document, &mut issues);

        log::debug!("[ANALYZER] {} issues for {}", issues.len(), document.url);
        issues
    }

    fn check_title(document: &Document, issues: &mut Vec<Issue>) {
        let title = document.title.as_deref().map(str::trim).unwrap_or("");
        let len = title.chars().count();

        if len == 0 {
            issues.push(
                Issue::new(IssueKind::MissingTitle, Severity::High, "Page has no title tag")
                    .with_element("<title>"),
            );
        } else if len < MIN_TITLE_CHARS {
            issues.push(
                Issue::new(
                    IssueKind::ShortTitle,
                    Severity::Medium,
                    format!("Title is only {len} characters (recommended at least {MIN_TITLE_CHARS})"),
                )
                .with_element(snippet(title)),
            );
        } else if len > MAX_TITLE_CHARS {
            issues.push(
                Issue::new(
                    IssueKind::LongTitle,
                    Severity::Medium,
                    format!("Title is {len} characters (recommended at most {MAX_TITLE_CHARS})"),
                )
                .with_element(snippet(title)),
            );
        }
    }

    fn check_headings(document: &Document, issues: &mut Vec<Issue>) {
        let headings = &document.headings;

        if headings.is_empty() {
            issues.push(Issue::new(
                IssueKind::NoHeadings,
                Severity::Medium,
                "Page has no headings (h1-h6)",
            ));
        }

        match document.h1_count() {
            0 => issues.push(
                Issue::new(IssueKind::MissingH1, Severity::High, "Page has no H1 heading")
                    .with_element("<h1>"),
            ),
            1 => {}
            n => issues.push(
                Issue::new(
                    IssueKind::MultipleH1s,
                    Severity::Medium,
                    format!("Page has {n} H1 headings; use a single H1 per page"),
                )
                .with_element("<h1>"),
            ),
        }

        // Only skips going deeper are flagged; returning to a shallower level is allowed.
        if let Some(pair) = headings
            .windows(2)
            .find(|pair| pair[1].level > pair[0].level + 1)
        {
            issues.push(
                Issue::new(
                    IssueKind::HeadingHierarchy,
                    Severity::Medium,
                    format!(
                        "Heading levels skip from H{} to H{}",
                        pair[0].level, pair[1].level
                    ),
                )
                .with_element(format!("<{}> {}", pair[1].tag(), snippet(&pair[1].text))),
            );
        }

        let empty: Vec<_> = headings.iter().filter(|h| h.text.trim().is_empty()).collect();
        if let Some(first) = empty.first() {
            issues.push(
                Issue::new(
                    IssueKind::EmptyHeadings,
                    Severity::Medium,
                    format!("{} heading(s) have no text", empty.len()),
                )
                .with_element(format!("<{}>", first.tag())),
            );
        }
    }

    fn check_links(document: &Document, issues: &mut Vec<Issue>) {
        let links = &document.links;

        let empty: Vec<_> = links.iter().filter(|l| l.text.trim().is_empty()).collect();
        if let Some(first) = empty.first() {
            issues.push(
                Issue::new(
                    IssueKind::EmptyLinks,
                    Severity::Medium,
                    format!("{} link(s) have no anchor text", empty.len()),
                )
                .with_element(snippet(&first.href)),
            );
        }

        let vague: Vec<_> = links
            .iter()
            .filter(|l| is_non_descriptive(&l.text))
            .collect();
        if let Some(first) = vague.first() {
            issues.push(
                Issue::new(
                    IssueKind::NonDescriptiveLinks,
                    Severity::Low,
                    format!("{} link(s) use non-descriptive text such as \"{}\"", vague.len(), first.text.trim()),
                )
                .with_element(snippet(&first.href)),
            );
        }

        let broken = document.broken_link_count();
        if let Some(first) = links.iter().find(|l| l.is_broken) {
            let noun = if broken == 1 { "link" } else { "links" };
            issues.push(
                Issue::new(
                    IssueKind::BrokenLinks,
                    Severity::High,
                    format!("Page contains {broken} broken {noun}"),
                )
                .with_element(snippet(&first.href)),
            );
        }
    }
}

pub fn is_non_descriptive(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    NON_DESCRIPTIVE_LINK_TEXTS.contains(&normalized.as_str())
}

fn snippet(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= ELEMENT_SNIPPET_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(ELEMENT_SNIPPET_CHARS).collect();
        format!("{cut}…")
    }
}
