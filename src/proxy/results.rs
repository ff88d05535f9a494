//! Collected outcome of a full proxy check run

use crate::proxy::models::ProbeReport;

/// Every report of a run in completion order, plus the lines that worked
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    reports: Vec<ProbeReport>,
    working: Vec<String>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a completed probe into the run
    pub fn record(&mut self, report: ProbeReport) {
        if report.is_working() {
            self.working.push(report.line.clone());
        }
        self.reports.push(report);
    }

    pub fn reports(&self) -> &[ProbeReport] {
        &self.reports
    }

    /// Raw lines of working proxies, in completion order, duplicates kept
    pub fn working(&self) -> &[String] {
        &self.working
    }

    pub fn into_working(self) -> Vec<String> {
        self.working
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl FromIterator<ProbeReport> for RunResult {
    fn from_iter<I: IntoIterator<Item = ProbeReport>>(iter: I) -> Self {
        let mut run = RunResult::new();
        for report in iter {
            run.record(report);
        }
        run
    }
}
