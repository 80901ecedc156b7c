//! Parsing of interactive input lines

use gradchat_core::{Error, FeedbackKind, IssueType, Result};

/// One line of interactive input
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Ask(String),
    ListExamples,
    /// 1-based example number
    AskExample(usize),
    /// 1-based turn number
    Feedback { turn: usize, kind: FeedbackKind },
    Debug,
    NewSession,
    Help,
    Exit,
    Empty,
}

fn parse_number(value: Option<&str>, what: &str) -> Result<usize> {
    let raw = value.ok_or_else(|| Error::InvalidInput(format!("missing {} number", what)))?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidInput(format!("invalid {} number: {}", what, raw))),
    }
}

/// Issue type from the leading words: a full label such as
/// "missing information" or its first word. Returns the words consumed.
fn parse_issue(words: &[&str]) -> Result<(IssueType, usize)> {
    if let [first, second, ..] = words {
        if let Ok(issue) = format!("{} {}", first, second).parse::<IssueType>() {
            return Ok((issue, 2));
        }
    }

    let first = words.first().ok_or_else(|| {
        Error::InvalidInput("missing issue type (incorrect, unclear, missing or other)".to_string())
    })?;
    Ok((first.parse()?, 1))
}

/// Parse one input line. Anything not starting with `/` is a question.
pub fn parse_command(line: &str) -> Result<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplCommand::Empty);
    }

    let lower = line.to_lowercase();
    if lower == "exit" || lower == "quit" {
        return Ok(ReplCommand::Exit);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ReplCommand::Ask(line.to_string()));
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default().to_lowercase();
    let args = parts.next().unwrap_or_default().trim();
    let mut words = args.split_whitespace();

    match name.as_str() {
        "examples" => Ok(ReplCommand::ListExamples),
        "ask" => Ok(ReplCommand::AskExample(parse_number(words.next(), "example")?)),
        "up" => Ok(ReplCommand::Feedback {
            turn: parse_number(words.next(), "turn")?,
            kind: FeedbackKind::ThumbsUp,
        }),
        "down" => Ok(ReplCommand::Feedback {
            turn: parse_number(words.next(), "turn")?,
            kind: FeedbackKind::ThumbsDown,
        }),
        "report" => {
            let turn = parse_number(words.next(), "turn")?;
            let rest: Vec<&str> = words.collect();
            let (issue_type, consumed) = parse_issue(&rest)?;
            let description = rest[consumed..].join(" ");

            Ok(ReplCommand::Feedback {
                turn,
                kind: FeedbackKind::Report {
                    issue_type,
                    description,
                },
            })
        }
        "debug" => Ok(ReplCommand::Debug),
        "new" => Ok(ReplCommand::NewSession),
        "help" => Ok(ReplCommand::Help),
        "exit" | "quit" => Ok(ReplCommand::Exit),
        other => Err(Error::InvalidInput(format!("unknown command: /{}", other))),
    }
}
