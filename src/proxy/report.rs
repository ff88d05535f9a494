//! Latency tiers and the colored progress lines shown for each probe

use crate::proxy::models::{FailureReason, ProbeOutcome};
use crate::proxy::results::RunResult;
use colored::{Color, Colorize};
use std::fmt;

/// Default latency threshold in milliseconds
pub const DEFAULT_THRESHOLD_MS: f64 = 1000.0;

/// Classification bucket of a probe outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Fast,
    Normal,
    Slow,
    NotWorking,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Fast => "working, and fast",
            Tier::Normal => "working, normal speed",
            Tier::Slow => "working, but slow",
            Tier::NotWorking => "not working",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Tier::Fast => Color::Green,
            Tier::Normal => Color::Cyan,
            Tier::Slow => Color::Yellow,
            Tier::NotWorking => Color::Red,
        }
    }

    /// Tier of a successful probe: fast below half the threshold, slow at or above it
    pub fn for_latency(latency_ms: f64, threshold_ms: f64) -> Self {
        if latency_ms < threshold_ms / 2.0 {
            Tier::Fast
        } else if latency_ms < threshold_ms {
            Tier::Normal
        } else {
            Tier::Slow
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Tier plus the detail shown next to it
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub tier: Tier,
    pub message: String,
    pub reason: Option<FailureReason>,
}

impl Classification {
    /// `<line>: <colored label> (<message>)`
    pub fn render(&self, line: &str) -> String {
        format!(
            "{}: {} ({})",
            line,
            self.tier.label().color(self.tier.color()),
            self.message
        )
    }
}

pub fn classify(outcome: &ProbeOutcome, threshold_ms: f64) -> Classification {
    match outcome {
        ProbeOutcome::Success { latency_ms } => Classification {
            tier: Tier::for_latency(*latency_ms, threshold_ms),
            message: format!("Speed: {:.2} ms", latency_ms),
            reason: None,
        },
        ProbeOutcome::Failure { reason } => Classification {
            tier: Tier::NotWorking,
            message: reason.to_string(),
            reason: Some(*reason),
        },
    }
}

/// Per-tier counts of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub fast: usize,
    pub normal: usize,
    pub slow: usize,
    pub not_working: usize,
}

impl RunSummary {
    pub fn from_run(run: &RunResult, threshold_ms: f64) -> Self {
        let mut summary = RunSummary::default();
        for report in run.reports() {
            summary.total += 1;
            match classify(&report.outcome, threshold_ms).tier {
                Tier::Fast => summary.fast += 1,
                Tier::Normal => summary.normal += 1,
                Tier::Slow => summary.slow += 1,
                Tier::NotWorking => summary.not_working += 1,
            }
        }
        summary
    }

    pub fn working(&self) -> usize {
        self.fast + self.normal + self.slow
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Results: {} working ({} fast, {} normal, {} slow), {} not working",
            self.working(),
            self.fast,
            self.normal,
            self.slow,
            self.not_working
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::ProbeReport;

    const THRESHOLD: f64 = 1000.0;

    fn tier_of(latency_ms: f64) -> Tier {
        classify(&ProbeOutcome::success(latency_ms), THRESHOLD).tier
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tier_of(0.0), Tier::Fast);
        assert_eq!(tier_of(499.999), Tier::Fast);
        assert_eq!(tier_of(500.0), Tier::Normal);
        assert_eq!(tier_of(999.999), Tier::Normal);
        assert_eq!(tier_of(1000.0), Tier::Slow);
        assert_eq!(tier_of(25_000.0), Tier::Slow);
    }

    #[test]
    fn test_failure_is_not_working() {
        let classification = classify(
            &ProbeOutcome::failure(FailureReason::HttpStatus(403)),
            THRESHOLD,
        );
        assert_eq!(classification.tier, Tier::NotWorking);
        assert_eq!(classification.message, "HTTP 403");
        assert_eq!(classification.reason, Some(FailureReason::HttpStatus(403)));
    }

    #[test]
    fn test_success_message() {
        let classification = classify(&ProbeOutcome::success(123.456), THRESHOLD);
        assert_eq!(classification.message, "Speed: 123.46 ms");
        assert!(classification.reason.is_none());
    }

    #[test]
    fn test_render_line() {
        colored::control::set_override(false);
        let classification = classify(&ProbeOutcome::success(300.0), THRESHOLD);
        assert_eq!(
            classification.render("http://1.2.3.4:8080"),
            "http://1.2.3.4:8080: working, and fast (Speed: 300.00 ms)"
        );

        let classification = classify(&ProbeOutcome::failure(FailureReason::BadFormat), THRESHOLD);
        assert_eq!(
            classification.render("bad-line"),
            "bad-line: not working (Invalid format)"
        );
    }

    #[test]
    fn test_run_summary() {
        let run: RunResult = vec![
            ProbeReport::new("a:1".to_string(), ProbeOutcome::success(100.0)),
            ProbeReport::new("b:1".to_string(), ProbeOutcome::success(700.0)),
            ProbeReport::new("c:1".to_string(), ProbeOutcome::success(1500.0)),
            ProbeReport::new(
                "d:1".to_string(),
                ProbeOutcome::failure(FailureReason::Timeout),
            ),
        ]
        .into_iter()
        .collect();

        let summary = RunSummary::from_run(&run, THRESHOLD);
        assert_eq!(
            summary,
            RunSummary {
                total: 4,
                fast: 1,
                normal: 1,
                slow: 1,
                not_working: 1,
            }
        );
        assert_eq!(
            summary.to_string(),
            "Results: 3 working (1 fast, 1 normal, 1 slow), 1 not working"
        );
    }
}
