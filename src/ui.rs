use colored::Colorize;
use convergence::{Outcome, Plan, RunResult};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.len()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Render a plan: numbered pending actions, then what is already in shape.
pub fn print_plan(plan: &Plan) {
    if plan.is_empty() {
        success("Nothing to do - host matches the manifest");
        return;
    }

    header(&format!("Plan: {} action(s)", plan.actions.len()));
    for (i, action) in plan.actions.iter().enumerate() {
        println!(
            "{} {} {}",
            format!("[{}/{}]", i + 1, plan.actions.len()).blue().bold(),
            action.id.to_string().cyan(),
            action.describe()
        );
    }

    if !plan.satisfied.is_empty() {
        println!();
        println!(
            "{}",
            format!("{} resource(s) already satisfied", plan.satisfied.len()).dimmed()
        );
    }
}

/// Render per-action outcomes followed by the summary line.
pub fn print_result(result: &RunResult) {
    if result.dry_run {
        header("Dry run - no changes were made");
    }

    for outcome in &result.outcomes {
        match &outcome.outcome {
            Outcome::Applied => {
                println!("{} {}", "✓".green(), outcome.description);
            }
            Outcome::Skipped { reason } => {
                println!(
                    "{} {} {}",
                    "-".dimmed(),
                    outcome.description.dimmed(),
                    format!("({reason})").dimmed()
                );
            }
            Outcome::Failed { error } => {
                println!("{} {}", "✗".red(), outcome.description);
                println!("    {}", error.red());
            }
        }
    }

    println!();
    let summary = format!(
        "{} applied, {} skipped, {} failed in {:.1}s",
        result.applied(),
        result.skipped(),
        result.failed(),
        result.duration.as_secs_f64()
    );
    if result.is_success() {
        success(&summary);
    } else {
        error(&summary);
    }
}
