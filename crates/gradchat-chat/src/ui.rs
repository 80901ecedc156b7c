//! Terminal rendering and line input

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};

use gradchat_core::Result;

use crate::assistant::{TurnOutcome, EXAMPLE_QUESTIONS};
use crate::session::DebugInfo;

const PROMPT: &str = "msds>";

/// Startup banner sized to the terminal
pub fn display_banner(qa_pairs: usize) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let inner = terminal_width.saturating_sub(4).clamp(40, 64);
    let border = "─".repeat(inner);

    let lines = [
        "USF MSDS Program Assistant".to_string(),
        String::new(),
        "Ask anything about admissions, courses, faculty or careers.".to_string(),
        format!("{} indexed question/answer pairs", qa_pairs),
    ];

    println!();
    println!("{}", format!("┌{}┐", border).blue());
    for line in lines {
        let padding = inner.saturating_sub(line.chars().count() + 2);
        println!(
            "{}  {}{}{}",
            "│".blue(),
            line.bold(),
            " ".repeat(padding),
            "│".blue()
        );
    }
    println!("{}", format!("└{}┘", border).blue());
    println!();
    println!(
        "{}",
        "Tip: type a question, /examples for ideas, or /help for commands".dimmed()
    );
    println!();
}

pub fn print_help() {
    println!("{}", "Available commands:".bold());
    let rows = [
        ("<question>", "Ask about the MSDS program"),
        ("/examples", "List example questions"),
        ("/ask N", "Ask example question N"),
        ("/up N", "Mark answer N as helpful"),
        ("/down N", "Mark answer N as not helpful"),
        (
            "/report N <issue> [text]",
            "Report answer N (incorrect, unclear, missing, other, or the full label)",
        ),
        ("/debug", "Show category and matches for the last answer"),
        ("/new", "Start a new chat session"),
        ("/help", "Show this help message"),
        ("exit/quit", "Leave the assistant"),
    ];
    for (command, purpose) in rows {
        println!("  {:<26} {}", command.green(), purpose);
    }
}

pub fn print_examples() {
    println!("{}", "Example questions:".bold());
    for (i, question) in EXAMPLE_QUESTIONS.iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).cyan(), question);
    }
}

/// Answer with its turn number, timing and any degraded-step notices
pub fn print_outcome(turn_number: Option<usize>, outcome: &TurnOutcome) {
    for notice in &outcome.notices {
        println!("{} {}", "⚠".yellow(), notice.yellow());
    }

    match turn_number {
        Some(n) => println!("{} {}", format!("[{}]", n).cyan().bold(), outcome.response),
        None => println!("{}", outcome.response),
    }

    if outcome.categorization.is_some() {
        let mut footer = format!("Response time: {:.2}s", outcome.response_time.as_secs_f64());
        if outcome.conversation_id.is_none() {
            footer.push_str(" (not saved, feedback unavailable)");
        }
        println!("{}", footer.dimmed());
    }
    println!();
}

pub fn print_debug(debug: &DebugInfo) {
    if debug.category.is_empty() {
        println!("{}", "No turn has been answered yet.".dimmed());
        return;
    }

    println!("{}", "Debug information".bold());
    println!("  {} {}", "Category:".cyan(), debug.category);
    println!("  {} {:.3}", "Best similarity:".cyan(), debug.similarity);
    println!("  {}", "Matched questions:".cyan());
    for line in debug.matched_question.lines() {
        println!("    {}", line);
    }
    println!("  {}", "Matched answers:".cyan());
    for line in debug.matched_answer.lines() {
        println!("    {}", line);
    }
}

pub fn print_error(message: impl std::fmt::Display) {
    println!("{} {}", "✗".red(), message.to_string().red());
}

pub fn print_success(message: impl std::fmt::Display) {
    println!("{} {}", "✓".green(), message);
}

fn redraw(input: &str) -> io::Result<()> {
    print!("\r\x1b[2K{} {}", PROMPT.green().bold(), input);
    io::stdout().flush()
}

/// Read one line, with ↑/↓ recall of earlier lines when attached to a terminal.
/// Returns `None` at end of input.
pub fn read_line(history: &mut Vec<String>) -> Result<Option<String>> {
    if !io::stdin().is_terminal() {
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        return Ok(Some(line.trim().to_string()));
    }

    enable_raw_mode()?;
    let line = read_raw_line(history);
    disable_raw_mode()?;
    println!();

    let line = line?;
    if let Some(line) = &line {
        if !line.is_empty() {
            history.push(line.clone());
        }
    }
    Ok(line)
}

fn read_raw_line(history: &[String]) -> Result<Option<String>> {
    let mut input = String::new();
    let mut recall: Option<usize> = None;
    redraw(&input)?;

    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };

        match key.code {
            KeyCode::Enter => return Ok(Some(input)),
            KeyCode::Char('c') | KeyCode::Char('d')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                return Ok(None);
            }
            KeyCode::Esc => return Ok(Some(String::new())),
            KeyCode::Char(c) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Up if !history.is_empty() => {
                let index = recall.map_or(history.len() - 1, |i| i.saturating_sub(1));
                recall = Some(index);
                input = history[index].clone();
            }
            KeyCode::Down => match recall {
                Some(i) if i + 1 < history.len() => {
                    recall = Some(i + 1);
                    input = history[i + 1].clone();
                }
                Some(_) => {
                    recall = None;
                    input.clear();
                }
                None => {}
            },
            _ => continue,
        }
        redraw(&input)?;
    }
}
