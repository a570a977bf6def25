use badea_core::ActivityReport;

#[derive(Debug, Default)]
pub struct RunOutcome {
    pub reports: Vec<ActivityReport>,
    pub aborted: Vec<AbortedActivity>,
}

impl RunOutcome {
    /// Whether any activity stopped or any query failed.
    pub fn has_errors(&self) -> bool {
        !self.aborted.is_empty() || self.reports.iter().any(|report| !report.failures.is_empty())
    }
}

#[derive(Debug)]
pub struct AbortedActivity {
    pub activity: String,
    pub message: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ActivityListing {
    pub name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub queries: usize,
    pub data_actions: Vec<&'static str>,
    pub activity_actions: Vec<&'static str>,
}
