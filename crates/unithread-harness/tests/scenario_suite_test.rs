//! The full scenario suite must pass on the build host.

use unithread_harness::report::{ConformanceReport, ScenarioOutcome};
use unithread_harness::scenario;

#[test]
fn every_scenario_passes() {
    let outcomes: Vec<ScenarioOutcome> = scenario::all()
        .iter()
        .map(|s| {
            let result = s.run();
            ScenarioOutcome {
                name: s.name.to_owned(),
                summary: s.summary.to_owned(),
                passed: result.is_ok(),
                detail: result.err(),
            }
        })
        .collect();

    let report = ConformanceReport::from_outcomes("self-test", outcomes);
    assert!(
        report.all_passed(),
        "scenario failures:\n{}",
        report.render_text()
    );
}

#[test]
fn report_round_trips_through_json() {
    let suite = scenario::all();
    let first = &suite[0];
    let result = first.run();
    let report = ConformanceReport::from_outcomes(
        "json-check",
        vec![ScenarioOutcome {
            name: first.name.to_owned(),
            summary: first.summary.to_owned(),
            passed: result.is_ok(),
            detail: result.err(),
        }],
    );
    let json = report.to_json().expect("serialize");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
    assert_eq!(parsed["campaign"], "json-check");
    assert_eq!(parsed["total"], 1);
}
