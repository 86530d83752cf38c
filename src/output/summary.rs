//! Run summary rendering
//!
//! Produces the tagged lines printed after every suite has finished.

use crate::models::RunReport;

const RULE: &str = "===========================================================";
const THIN_RULE: &str = "-----------------------------------------------------------";

/// Line printed when a requested suite is not registered
pub fn not_found_line(name: &str) -> String {
    format!("[red]Test suite \"{name}\" not found.[/]")
}

/// Summary block for a finished run
pub fn summary_lines(report: &RunReport) -> Vec<String> {
    let overall = &report.overall;
    let mut lines = vec!["========================= SUMMARY =========================".to_string()];

    if report.incomplete > 0 {
        lines.push(
            "[red]Warning: One or more suites were not completed. Results may be incomplete.[/]"
                .to_string(),
        );
    }
    if report.run_aborted {
        lines.push("[red]Run aborted after a teardown failure.[/]".to_string());
    }

    lines.push(format!("Total checks performed: {}", overall.total_checks));

    let color = if overall.failed_checks == 0 { "green" } else { "red" };
    lines.push(format!(
        "[{color}]Total checks failed: {}[/]",
        overall.failed_checks
    ));

    if overall.aborted_tests > 0 {
        lines.push(format!("[red]Aborted tests: {}[/]", overall.aborted_tests));
    }
    if overall.aborted_suites > 0 {
        lines.push(format!("[red]Aborted suites: {}[/]", overall.aborted_suites));
    }

    for (name, suite) in report.failing_suites() {
        let failed = suite.results.failed_checks;
        lines.push(THIN_RULE.to_string());
        lines.push(format!(
            "[red]{name}: {failed} {}[/]",
            if failed == 1 { "failure" } else { "failures" }
        ));
        for record in &suite.results.failures {
            lines.push(format!("[red]{record}[/]"));
        }
    }

    lines.push(RULE.to_string());
    lines
}
