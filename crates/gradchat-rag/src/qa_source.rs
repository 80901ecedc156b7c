//! Loader for the labeled QA source (CSV with Category, Question, Answer)

use std::io::Read;
use std::path::Path;
use tracing::warn;

use gradchat_core::{Error, QaRecord, Result};

pub const REQUIRED_COLUMNS: [&str; 3] = ["Category", "Question", "Answer"];

/// Parse QA records from any CSV reader.
///
/// Missing required columns is an error. Rows that cannot be parsed or have
/// an empty question are skipped with a warning.
pub fn read_qa_records<R: Read>(reader: R) -> Result<Vec<QaRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| Error::QaSource(format!("cannot read header row: {}", e)))?
        .clone();

    let position = |name: &str| headers.iter().position(|h| h == name);
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|&name| position(name).is_none())
        .collect();

    if !missing.is_empty() {
        return Err(Error::QaSource(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )));
    }

    let (category_idx, question_idx, answer_idx) = match (
        position("Category"),
        position("Question"),
        position("Answer"),
    ) {
        (Some(c), Some(q), Some(a)) => (c, q, a),
        _ => return Err(Error::QaSource("Missing required columns".to_string())),
    };

    let mut records = Vec::new();
    for (line, row) in csv_reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(row = line + 1, error = %e, "skipping malformed QA row");
                continue;
            }
        };

        let field = |idx: usize| row.get(idx).map(str::trim).unwrap_or_default().to_string();
        let record = QaRecord {
            category: field(category_idx),
            question: field(question_idx),
            answer: field(answer_idx),
        };

        if record.question.is_empty() {
            warn!(row = line + 1, "skipping QA row without a question");
            continue;
        }

        if record.known_category().is_none() {
            warn!(row = line + 1, category = %record.category, "QA row has an unknown category");
        }

        records.push(record);
    }

    Ok(records)
}

/// Load the QA source from disk
pub fn load_qa_records(path: impl AsRef<Path>) -> Result<Vec<QaRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        Error::QaSource(format!("Error reading {}: {}", path.display(), e))
    })?;

    read_qa_records(file).map_err(|e| match e {
        Error::QaSource(msg) => Error::QaSource(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}
