//! Output formatting for run summaries.
//!
//! Supports both a human-readable table and JSON for scripting.

use unionsearch_core::runner::{CompletedSummary, RunSummary, VariantOutcome};

/// Formats a run summary as pretty JSON.
pub fn format_json(summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

/// Formats a run summary for the terminal.
pub fn format_human(summary: &RunSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "=".repeat(72)));
    output.push_str(&format!("UNION SEARCH EVALUATION: {}\n", summary.benchmark));
    output.push_str(&format!("{}\n", "=".repeat(72)));

    if summary.variants.is_empty() {
        output.push_str("No variants configured\n");
        return output;
    }

    for run in &summary.variants {
        output.push_str(&format!("\n{}\n", "-".repeat(72)));
        output.push_str(&format!("{}\n", run.variant));

        match &run.outcome {
            VariantOutcome::Completed {
                report_path,
                summary,
            } => {
                push_completed(&mut output, summary);
                output.push_str(&format!("  Report: {}\n", report_path.display()));
            }
            VariantOutcome::Skipped { reason } => {
                output.push_str(&format!("  Skipped: {}\n", reason));
            }
            VariantOutcome::Failed { error } => {
                output.push_str(&format!("  Failed: {}\n", error));
            }
        }
    }

    output.push_str(&format!("\n{}\n", "=".repeat(72)));
    output.push_str(&format!(
        "{} completed, {} skipped, {} failed\n",
        summary.completed(),
        summary.skipped(),
        summary.failed()
    ));
    output
}

fn push_completed(output: &mut String, summary: &CompletedSummary) {
    match summary {
        CompletedSummary::Ranking {
            num_queries,
            system,
        } => {
            output.push_str(&format!("  Queries: {}\n", num_queries));
            output.push_str(&format!(
                "  {:>4}  {:>9}  {:>9}  {:>9}  {:>9}\n",
                "k", "P@k", "R@k", "MAP@k", "F1@k"
            ));
            for (k, m) in &system.metrics_at_k {
                output.push_str(&format!(
                    "  {:>4}  {:>9.4}  {:>9.4}  {:>9.4}  {:>9.4}\n",
                    k, m.precision, m.recall, m.map, m.f1
                ));
            }
        }
        CompletedSummary::Drift {
            num_tables,
            mean_cosine,
            mean_euclidean,
        } => {
            output.push_str(&format!("  Tables compared: {}\n", num_tables));
            output.push_str(&format!(
                "  Mean cosine similarity: {}\n",
                format_optional(*mean_cosine)
            ));
            output.push_str(&format!(
                "  Mean Euclidean distance: {}\n",
                format_optional(*mean_euclidean)
            ));
        }
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v))
}
