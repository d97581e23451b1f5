//! Adapter layer for converting domain models to API response types.
//!
//! The wire format uses camelCase keys, `{tag, text}` headings and
//! `isBroken` link flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::{Analysis, AnalysisRecord, AnalysisResult, Heading, Issue, Link};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingElement {
    pub tag: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkElement {
    pub href: String,
    pub text: String,
    pub is_broken: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub url: String,
    pub title: Option<String>,
    pub headings: Vec<HeadingElement>,
    pub links: Vec<LinkElement>,
    pub screenshot: Option<String>,
    pub issues: Vec<Issue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// ELEMENT CONVERSION
// ============================================================================

impl From<&Heading> for HeadingElement {
    fn from(heading: &Heading) -> Self {
        Self {
            tag: heading.tag(),
            text: heading.text.clone(),
        }
    }
}

impl From<&Link> for LinkElement {
    fn from(link: &Link) -> Self {
        Self {
            href: link.href.clone(),
            text: link.text.clone(),
            is_broken: link.is_broken,
        }
    }
}

// ============================================================================
// RESULT CONVERSION
// ============================================================================

impl From<AnalysisResult> for AnalysisResponse {
    fn from(result: AnalysisResult) -> Self {
        let doc = result.document;
        Self {
            headings: doc.headings.iter().map(HeadingElement::from).collect(),
            links: doc.links.iter().map(LinkElement::from).collect(),
            url: doc.url,
            title: doc.title,
            screenshot: doc.screenshot,
            issues: doc.issues,
            analysis: result.analysis,
            error: doc.error,
            id: result.id,
            created_at: result.created_at,
        }
    }
}

impl From<AnalysisRecord> for AnalysisResponse {
    fn from(record: AnalysisRecord) -> Self {
        AnalysisResult::from(record).into()
    }
}
