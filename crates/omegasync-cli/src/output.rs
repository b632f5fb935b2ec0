use colored::Colorize;
use omegasync_core::{BatchReport, ResourceOutcome, ResourceReport};
use tabled::builder::Builder;
use tabled::settings::Style;

/// A resource whose desired state could not be loaded.
pub struct LoadFailure {
    pub path: String,
    pub error: String,
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

fn status_cell(report: &ResourceReport) -> String {
    match &report.outcome {
        ResourceOutcome::Synced(outcome) => {
            let verb = if outcome.created { "created" } else { "updated" };
            if report.is_success() {
                verb.to_string()
            } else {
                format!("{verb}, {} failed", outcome.failed_mutations())
            }
        }
        ResourceOutcome::Failed(_) => "failed".to_string(),
        ResourceOutcome::Skipped => "skipped".to_string(),
    }
}

fn changes_cell(report: &ResourceReport) -> String {
    match &report.outcome {
        ResourceOutcome::Synced(outcome) => outcome.applied_mutations().to_string(),
        _ => "-".to_string(),
    }
}

/// Summary table rows: kind, alias, status, applied relation changes.
pub fn summary_rows(report: &BatchReport) -> Vec<[String; 4]> {
    report
        .resources
        .iter()
        .map(|r| {
            [
                r.kind.to_string(),
                r.alias.to_string(),
                status_cell(r),
                changes_cell(r),
            ]
        })
        .collect()
}

pub fn print_report(report: &BatchReport, load_failures: &[LoadFailure]) {
    for failure in load_failures {
        print_error(&format!("{}: {}", failure.path, failure.error));
    }

    if report.resources.is_empty() {
        println!("No resources synchronized.");
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(["Kind", "Alias", "Status", "Changes"]);
    for row in summary_rows(report) {
        builder.push_record(row);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");

    for resource in report.failed() {
        match &resource.outcome {
            ResourceOutcome::Failed(e) => print_error(&format!("{}: {e}", resource.alias)),
            ResourceOutcome::Synced(outcome) => {
                for failure in outcome.relations.iter().flat_map(|r| &r.failures) {
                    print_error(&format!("{}: {failure}", resource.alias));
                }
            }
            ResourceOutcome::Skipped => {}
        }
    }

    if report.aborted {
        print_warning("Run aborted after an authentication failure");
    }

    let failed = report.failed().count() + load_failures.len();
    if failed == 0 {
        print_success(&format!("{} resource(s) synchronized", report.resources.len()));
    } else {
        print_error(&format!("{failed} resource(s) failed"));
    }
}
