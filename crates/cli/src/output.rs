//! Operator-facing output

use colored::Colorize;
use schemata_ir::ValidationResult;
use schemata_planner::{ApplyReport, Operation};

/// How a plan is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanFormat {
    /// Label, description, then the SQL
    #[default]
    Pretty,
    /// Bare statements terminated by `;`
    Sql,
    /// The operations as a JSON array
    Json,
}

/// Render a plan
pub fn render_plan(ops: &[Operation], format: PlanFormat) -> anyhow::Result<String> {
    let text = match format {
        PlanFormat::Pretty => render_pretty(ops),
        PlanFormat::Sql => render_sql(ops),
        PlanFormat::Json => serde_json::to_string_pretty(ops)?,
    };
    Ok(text)
}

fn render_pretty(ops: &[Operation]) -> String {
    if ops.is_empty() {
        return format!("{}", "Schema is up to date, nothing to do.".green());
    }

    let mut out = String::new();
    for (i, op) in ops.iter().enumerate() {
        out.push_str(&format!(
            "{} {} {}\n",
            format!("{:>3}.", i + 1).dimmed(),
            op.label.bold().cyan(),
            op.description
        ));
        for statement in op.sql.statements() {
            for line in statement.lines() {
                out.push_str(&format!("       {}\n", line.yellow()));
            }
        }
    }
    out.push_str(&format!("{} operation(s)", ops.len()));
    out
}

fn render_sql(ops: &[Operation]) -> String {
    ops.iter()
        .flat_map(|op| op.sql.executable())
        .map(|statement| format!("{statement};"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line summary of an applied plan
pub fn render_report(report: &ApplyReport, dry_run: bool) -> String {
    let summary = format!(
        "Applied {} operation(s), {} statement(s) in {} ms",
        report.operations,
        report.statements,
        report.elapsed().num_milliseconds()
    );
    if dry_run {
        format!("{} {}", "[dry run]".yellow().bold(), summary)
    } else {
        format!("{}", summary.green())
    }
}

/// Validation errors and warnings, one per line
pub fn render_validation(result: &ValidationResult) -> String {
    let rule = |name: Option<&str>| {
        name.map(|n| format!(" {}", format!("({n})").dimmed()))
            .unwrap_or_default()
    };

    let mut lines = Vec::new();
    for error in &result.errors {
        lines.push(format!("{} {}{}", "error:".red().bold(), error, rule(error.rule)));
    }
    for warning in &result.warnings {
        lines.push(format!(
            "{} {}{}",
            "warning:".yellow().bold(),
            warning,
            rule(warning.rule)
        ));
    }
    if result.valid && !result.has_warnings() {
        lines.push(format!("{}", "Configuration is valid.".green()));
    }
    lines.join("\n")
}

// ============================================================================
// Tests
// ============================================================================
