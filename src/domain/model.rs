use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::utils::validation::parse_web_url;

/// One candidate page returned by a searcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResultItem {
    /// Link to the page where the item or job can be found.
    pub url: String,
    /// Page or listing title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Listed price, when the search snippet shows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Seller or hiring company.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Short summary of why the page matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl SearchResultItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            price: None,
            company: None,
            snippet: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResultSet {
    /// Candidate pages, best match first.
    pub items: Vec<SearchResultItem>,
}

impl SearchResultSet {
    pub fn new(items: Vec<SearchResultItem>) -> Self {
        Self { items }
    }

    /// A set is usable only when it has at least one item and every item
    /// points at an http(s) page.
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.items.is_empty() {
            return Err("search returned no items".to_string());
        }
        for (index, item) in self.items.iter().enumerate() {
            parse_web_url(&item.url)
                .map_err(|reason| format!("item {} has an unusable url '{}': {}", index, item.url, reason))?;
        }
        Ok(())
    }

    /// Best match; the page the extractor reads.
    pub fn first(&self) -> Option<&SearchResultItem> {
        self.items.first()
    }
}

/// Tagged result of a single searcher call.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Valid(SearchResultSet),
    Invalid(String),
}

impl SearchOutcome {
    /// Builds an outcome from a parsed set, demoting sets that fail [`SearchResultSet::check`].
    pub fn from_set(set: SearchResultSet) -> Self {
        match set.check() {
            Ok(()) => SearchOutcome::Valid(set),
            Err(reason) => SearchOutcome::Invalid(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ItemListing {
    /// Name of the item.
    pub name: String,
    /// Price of the item in CAD.
    pub price: String,
    /// Brand name of the item.
    pub brand: String,
    /// Stock availability of the item.
    pub stock: String,
    /// Brief description of the item.
    pub description: String,
    /// Link to the item's page.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobPosting {
    /// Title of the job position.
    pub title: String,
    /// Name of the company the job posting belongs to.
    pub company: String,
    /// Region or location of the job.
    pub location: String,
    /// Seniority: entry level, intermediate, senior and so on.
    pub level: String,
    /// Job description.
    pub description: String,
    /// Remote, hybrid or in person.
    pub work_mode: String,
    /// Salary of the position, if mentioned.
    pub salary: String,
    /// Required years of experience.
    pub years_of_experience: String,
    /// Link to the job posting.
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobPostings {
    /// Job postings found on the page.
    pub items: Vec<JobPosting>,
}

/// What an extractor produced for one page. Unreachable pages and
/// unstructured model answers are `Empty` rather than errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extraction<T> {
    Record { record: T },
    Empty { reason: String },
}

impl<T> Extraction<T> {
    pub fn record(&self) -> Option<&T> {
        match self {
            Extraction::Record { record } => Some(record),
            Extraction::Empty { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEvent {
    WorkflowCompleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome<T> {
    Found {
        source_url: String,
        extraction: Extraction<T>,
    },
    NotFound {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResponse<T> {
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub event: RunEvent,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub outcome: RunOutcome<T>,
}

impl<T> RunResponse<T> {
    pub fn is_found(&self) -> bool {
        matches!(self.outcome, RunOutcome::Found { .. })
    }
}

/// Last run stored for a session id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub pipeline: String,
    pub query: String,
    pub updated_at: DateTime<Utc>,
    pub response: serde_json::Value,
}
