//! Terminal output formatting with ANSI colors, for the one-shot subcommands.

use colored::Colorize;

use crate::gemini::{ExecutionError, InvocationResult, SessionRecord};

/// Print a session listing, marking the latest entry.
pub fn print_sessions(sessions: &[SessionRecord], latest: Option<&str>) {
    if sessions.is_empty() {
        println!("{}", "No sessions found.".dimmed());
        return;
    }

    for session in sessions {
        let index = format!("{:>3}.", session.index);
        if Some(session.identifier.as_str()) == latest {
            println!(
                "{} {} {}",
                index.cyan(),
                session.identifier.bold(),
                "(latest)".green()
            );
        } else {
            println!("{} {}", index.cyan(), session.identifier);
        }
    }
}

/// Print the outcome of matching a hint against the listing.
pub fn print_match(hint: &str, index: Option<u32>) {
    match index {
        Some(index) => println!(
            "{} {}",
            format!("\"{}\" matches session", hint).green(),
            index
        ),
        None => println!("{}", format!("No session matches \"{}\"", hint).yellow()),
    }
}

/// Print a gemini answer followed by its session ID.
pub fn print_answer(result: &InvocationResult) {
    println!("{}", result.response_text);
    if let Some(session_id) = &result.session_id {
        println!();
        println!("{}", format!("Session: {}", session_id).dimmed());
    }
}

/// Print an execution failure and any stderr gemini produced.
pub fn print_error(error: &ExecutionError) {
    eprintln!("{}", format!("✗ {}", error).red());
    if let Some(stderr) = error.diagnostics() {
        for line in stderr.lines().take(20) {
            eprintln!("  {}", line.dimmed());
        }
    }
}
