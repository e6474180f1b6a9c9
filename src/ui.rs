// Terminal UI utilities
// Headers, result lines and spinners for the human-facing side of a run.
// Everything here goes to the terminal; structured logs go through tracing.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::time::Duration;

pub fn print_header(title: &str) {
    println!();
    println!(
        "{}",
        "╔════════════════════════════════════════════════════════════╗".bright_blue()
    );
    println!("{}", format!("║  {:<58}║", title).bright_blue());
    println!(
        "{}",
        "╚════════════════════════════════════════════════════════════╝".bright_blue()
    );
    println!();
}

pub fn print_success(message: &str) {
    println!("{}", format!("✅ {}", message).bright_green().bold());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("❌ {}", message).bright_red().bold());
}

pub fn print_info(message: &str) {
    println!("{}", format!("ℹ️  {}", message).bright_cyan());
}

pub fn print_warning(message: &str) {
    println!("{}", format!("⚠️  {}", message).bright_yellow());
}

/// Indented `key: value` lines under a result
pub fn print_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) {
    for (key, value) in fields {
        println!("   • {}: {}", key.bright_white(), value);
    }
    println!();
}

pub fn print_labels(labels: &BTreeMap<String, String>) {
    print_fields(labels.iter().map(|(k, v)| (k.as_str(), v.as_str())));
}

/// Spinner for a long blocking stage; clear it with `finish_and_clear`
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
