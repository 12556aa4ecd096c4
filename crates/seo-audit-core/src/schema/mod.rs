use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

mod validator;

pub use validator::validate;

/// Category keys every conforming report must carry, in display order.
pub const REQUIRED_CATEGORIES: [&str; 6] =
    ["meta", "content", "structure", "links", "mobile", "technical"];

/// Outcome of a single SEO check. Variants are ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportItemStatus {
    Pass,
    Warn,
    Fail,
}

impl ReportItemStatus {
    pub const ALL: [ReportItemStatus; 3] = [Self::Pass, Self::Warn, Self::Fail];

    /// Exact, case-sensitive match against the wire representation.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pass" => Some(Self::Pass),
            "warn" => Some(Self::Warn),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }
}

/// One check result inside a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportItem {
    /// Identifier, unique within its category.
    pub id: String,
    pub name: String,
    pub status: ReportItemStatus,
    /// Raw finding, e.g. the title text or a link count.
    pub value: String,
    /// Short human summary such as `Found (55 chars)`.
    pub description: String,
    /// Remediation tip.
    pub guidance: String,
}

/// Thematic group of checks with a provider-assigned score (0–100).
///
/// The score is a holistic judgment and is never recomputed from item statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportCategory {
    pub title: String,
    pub score: u8,
    pub items: Vec<ReportItem>,
}

/// Validated analysis result: category key → category, in the order the provider emitted them.
///
/// The only way to obtain one is through [`validate`] (or deserializing, which validates),
/// so every instance carries all of [`REQUIRED_CATEGORIES`]. Top-level keys that are not
/// categories are passed through untouched in [`AnalysisReport::extras`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    categories: Vec<(String, ReportCategory)>,
    extras: Map<String, Value>,
}

impl AnalysisReport {
    pub(crate) fn from_validated(
        categories: Vec<(String, ReportCategory)>,
        extras: Map<String, Value>,
    ) -> Self {
        Self { categories, extras }
    }

    pub fn get(&self, key: &str) -> Option<&ReportCategory> {
        self.categories
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, category)| category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReportCategory)> {
        self.categories
            .iter()
            .map(|(key, category)| (key.as_str(), category))
    }

    pub fn categories(&self) -> impl Iterator<Item = &ReportCategory> {
        self.categories.iter().map(|(_, category)| category)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Non-category top-level entries, e.g. a provider's `generatedAt` stamp.
    /// They take no part in scoring or tallies.
    pub fn extras(&self) -> &Map<String, Value> {
        &self.extras
    }

    /// Mean of category scores; see [`crate::aggregate::overall_score`].
    pub fn overall_score(&self) -> u8 {
        crate::aggregate::overall_score(self)
    }

    /// Status tallies; see [`crate::aggregate::summarize`].
    pub fn summary(&self) -> crate::aggregate::Summary {
        crate::aggregate::summarize(self)
    }
}

impl Serialize for AnalysisReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map =
            serializer.serialize_map(Some(self.categories.len() + self.extras.len()))?;
        for (key, category) in &self.categories {
            map.serialize_entry(key, category)?;
        }
        for (key, value) in &self.extras {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AnalysisReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        validate(&value).map_err(de::Error::custom)
    }
}

impl TryFrom<&Value> for AnalysisReport {
    type Error = SchemaError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        validate(value)
    }
}

/// A single structural problem found while validating a candidate report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Location such as `meta.items[2].status`; `$` denotes the document root.
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found in a candidate report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("report does not match the expected schema ({} violation(s)): {}", .violations.len(), join(.violations))]
pub struct SchemaError {
    violations: Vec<Violation>,
}

impl SchemaError {
    pub(crate) fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// True when any violation is reported at `path`.
    pub fn mentions(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Response-shape constraint handed to the provider, in the OpenAPI subset accepted by
/// structured-output endpoints.
pub fn response_schema() -> Value {
    let item = json!({
        "type": "OBJECT",
        "properties": {
            "id": { "type": "STRING" },
            "name": { "type": "STRING" },
            "status": { "type": "STRING", "enum": ["pass", "warn", "fail"] },
            "value": { "type": "STRING" },
            "description": {
                "type": "STRING",
                "description": "A concise summary of the finding, e.g. 'Found (55 chars)'."
            },
            "guidance": { "type": "STRING", "description": "A helpful tip for improvement." }
        },
        "required": ["id", "name", "status", "value", "description", "guidance"]
    });

    let category = |description: &str| {
        json!({
            "type": "OBJECT",
            "description": description,
            "properties": {
                "title": { "type": "STRING" },
                "score": {
                    "type": "INTEGER",
                    "description": "An SEO score for the category from 0 to 100."
                },
                "items": { "type": "ARRAY", "items": item.clone() }
            },
            "required": ["title", "score", "items"]
        })
    };

    json!({
        "type": "OBJECT",
        "properties": {
            "meta": category("Meta tags: title, description, keywords, canonical URL and favicon."),
            "content": category("Page content: word count and language attribute."),
            "structure": category("Page structure: heading hierarchy plus Open Graph and Twitter tags."),
            "links": category("Internal and external links and image alt attributes."),
            "mobile": category("Mobile-friendliness, such as the viewport meta tag."),
            "technical": category("Technical SEO: HTTPS, robots.txt and sitemap.xml.")
        },
        "required": REQUIRED_CATEGORIES
    })
}
