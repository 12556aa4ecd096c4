use serde::Serialize;

use crate::schema::{AnalysisReport, ReportItemStatus};

/// Item tallies by status across every category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.passed + self.warnings + self.errors
    }

    fn record(&mut self, status: ReportItemStatus) {
        match status {
            ReportItemStatus::Pass => self.passed += 1,
            ReportItemStatus::Warn => self.warnings += 1,
            ReportItemStatus::Fail => self.errors += 1,
        }
    }
}

/// Mean of all category scores, rounded half up. Zero when there are no categories.
pub fn overall_score(report: &AnalysisReport) -> u8 {
    let count = report.len() as u32;
    if count == 0 {
        return 0;
    }
    let total: u32 = report.categories().map(|c| u32::from(c.score)).sum();
    // (2 * total + count) / (2 * count) == floor(total / count + 0.5)
    let rounded = (2 * total + count) / (2 * count);
    // every score is <= 100, so the mean is too
    rounded.min(100) as u8
}

/// Count items per status in category-then-item order.
pub fn summarize(report: &AnalysisReport) -> Summary {
    report
        .categories()
        .flat_map(|category| category.items.iter())
        .fold(Summary::default(), |mut summary, item| {
            summary.record(item.status);
            summary
        })
}

/// Qualitative band used to colour score bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Poor,
    Fair,
    Good,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            Self::Good
        } else if score >= 50 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}
