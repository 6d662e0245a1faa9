//! Conformance report generation.

use serde::Serialize;
use thiserror::Error;

/// Harness-level failures (distinct from a scenario merely not passing).
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),
}

/// Result of one executed scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub summary: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Aggregated run of the scenario suite.
#[derive(Debug, Clone, Serialize)]
pub struct ConformanceReport {
    pub campaign: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl ConformanceReport {
    /// Aggregate individual outcomes under a campaign name.
    #[must_use]
    pub fn from_outcomes(campaign: impl Into<String>, outcomes: Vec<ScenarioOutcome>) -> Self {
        let passed = outcomes.iter().filter(|o| o.passed).count();
        let failed = outcomes.len() - passed;
        Self {
            campaign: campaign.into(),
            total: outcomes.len(),
            passed,
            failed,
            outcomes,
        }
    }

    /// Whether every scenario passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Machine-readable JSON rendering.
    pub fn to_json(&self) -> Result<String, HarnessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable text rendering.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "campaign {}: {}/{} passed\n",
            self.campaign, self.passed, self.total
        ));
        for outcome in &self.outcomes {
            let mark = if outcome.passed { "PASS" } else { "FAIL" };
            out.push_str(&format!("  [{mark}] {} - {}\n", outcome.name, outcome.summary));
            if let Some(detail) = &outcome.detail {
                out.push_str(&format!("         {detail}\n"));
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
