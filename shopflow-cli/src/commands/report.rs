//! Report display

use anyhow::Result;
use colored::*;
use shopflow_core::domain::step::StepStatus;
use shopflow_core::dto::report::RunReport;
use shopflow_runner::bootstrap;
use shopflow_runner::config::Config;
use shopflow_runner::repository::ReportRepository;

use super::colorize_status;

pub fn handle_report_command(config: &Config) -> Result<()> {
    let reports = bootstrap::reports(config);

    match reports.load()? {
        Some(report) => print_report(&report),
        None => println!(
            "{}",
            format!("No report found at {}.", reports.path().display()).yellow()
        ),
    }

    Ok(())
}

/// Print a run report, steps in execution order
pub fn print_report(report: &RunReport) {
    println!("{}", "Pipeline Run:".bold());
    println!("  ID:        {}", report.pipeline_execution_id.cyan());
    println!("  Status:    {}", colorize_status(report.status));
    println!(
        "  Started:   {}",
        report.start_time.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(end) = report.end_time {
        println!("  Ended:     {}", end.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(duration) = report.total_duration_seconds {
        println!("  Duration:  {:.2}s", duration);
    }

    if !report.steps_executed.is_empty() {
        println!("\n{}", "Steps:".bold());
        println!("{}", "─".repeat(80).dimmed());
        for (name, step) in &report.steps_executed.0 {
            let marker = match step.status {
                StepStatus::Success => "✓".green(),
                StepStatus::Failed => "✗".red(),
            };
            println!(
                "  {} {:<24} {:>8.2}s  {:>10} records  {}",
                marker,
                name,
                step.duration_seconds,
                step.records_processed,
                format!("retries: {}", step.retry_attempts).dimmed()
            );
            if let Some(message) = &step.error_message {
                println!("      {}", message.red());
            }
        }
        println!("{}", "─".repeat(80).dimmed());
    }

    if !report.errors.is_empty() {
        println!("\n{}", "Errors:".bold());
        for error in &report.errors {
            println!("  {}", error.red());
        }
    }

    if !report.warnings.is_empty() {
        println!("\n{}", "Warnings:".bold());
        for warning in &report.warnings {
            println!("  {}", warning.yellow());
        }
    }
}
