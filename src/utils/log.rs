// src/utils/log.rs

//! Console presentation helpers with server-style formatting.
//!
//! Diagnostics go through the `log` facade; these helpers print the
//! user-facing output (new posts, summaries) with the same timestamp layout,
//! and respect the active log filter.

use chrono::Local;
use log::Level;

/// Format a line with timestamp and tag
fn format_line(tag: &str, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("[{}] [{}] {}", timestamp, tag, message)
}

fn enabled() -> bool {
    log::log_enabled!(target: "threadwatch", Level::Info)
}

/// Log a header
pub fn header(title: &str) {
    if enabled() {
        let border = "═".repeat(60);
        println!("{}", format_line("INFO", &border));
        println!("{}", format_line("INFO", &format!("  {}", title)));
        println!("{}", format_line("INFO", &border));
    }
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    if enabled() {
        println!("{}", format_line("INFO", &format!("    {}", message)));
    }
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    if enabled() {
        println!("{}", format_line("INFO", &format!("[SUMMARY] {}", title)));
        for (key, value) in items {
            println!("{}", format_line("INFO", &format!("    {}: {}", key, value)));
        }
    }
}

/// Print a newly seen post. Always shown: this is the program's output.
pub fn new_post(source: &str, text: &str) {
    println!("{}", format_line("NEW", source));
    for line in text.lines() {
        println!("    {}", line);
    }
    println!("{}", "─".repeat(60));
}
