pub mod aggregate;
pub mod analyzer;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod report;
pub mod schema;

pub use aggregate::{overall_score, summarize, ScoreBand, Summary};
pub use analyzer::{normalize_url, SeoAnalyzer};
pub use error::{AnalysisError, ProviderError};
pub use llm::{AnalysisProvider, AnalyzerSettings, ProviderCall, ProviderKind};
pub use prompt::{build_request, AnalysisRequest};
pub use report::{render_report, OutputFormat, RenderOptions};
pub use schema::{
    response_schema, validate, AnalysisReport, ReportCategory, ReportItem, ReportItemStatus,
    SchemaError, Violation, REQUIRED_CATEGORIES,
};
