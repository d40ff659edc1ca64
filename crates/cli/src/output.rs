//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use aningcall_core::error::Error;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress success, info and header output
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        if !is_quiet() {
            println!("{} {}", "✓".if_supports_color(Stream::Stdout, |t| t.green()), message);
        }
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".if_supports_color(Stream::Stderr, |t| t.red()), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".if_supports_color(Stream::Stderr, |t| t.yellow()), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        if !is_quiet() {
            println!("{} {}", "ℹ".if_supports_color(Stream::Stdout, |t| t.blue()), message);
        }
    }

    /// Print a header
    pub fn header(message: &str) {
        if !is_quiet() {
            println!();
            println!("{}", message.if_supports_color(Stream::Stdout, |t| t.bold()));
            println!("{}", "─".repeat(message.chars().count()));
        }
    }

    /// Print an aligned `key: value` line
    pub fn field(key: &str, value: &str) {
        if !is_quiet() {
            let label = format!("{:<16}", format!("{}:", key));
            println!("  {} {}", label.if_supports_color(Stream::Stdout, |t| t.dimmed()), value);
        }
    }

    /// Print an error with its code, context and suggestion
    pub fn report(err: &Error) {
        eprintln!(
            "{} {} {}",
            "✗".if_supports_color(Stream::Stderr, |t| t.red()),
            err.code.if_supports_color(Stream::Stderr, |t| t.dimmed()),
            err.message
        );
        if let Some(context) = &err.context {
            eprintln!("  {} {}", "context:".if_supports_color(Stream::Stderr, |t| t.dimmed()), context);
        }
        if let Some(suggestion) = &err.suggestion {
            eprintln!("  {} {}", "hint:".if_supports_color(Stream::Stderr, |t| t.cyan()), suggestion);
        }
    }
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> aningcall_core::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
