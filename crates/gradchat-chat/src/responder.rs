//! Answer generation and response cleanup

use regex::Regex;
use std::sync::Arc;

use gradchat_core::{LLMProvider, Result};

/// Shown whenever the generation call fails
pub const APOLOGY: &str =
    "I apologize, but I encountered an error while generating the response.";

/// Known artifacts in model output, applied in order.
/// The specific salary phrase must run before the generic `andthe` rule.
const CLEANUP_RULES: [(&str, &str); 6] = [
    (r"</?div>", ""),
    (
        "andthemedianbasesalaryinternationally",
        " and the median base salary internationally ",
    ),
    ("andthe", " and the "),
    ("_", ""),
    (r" {2,}", " "),
    (r"\n{2,}", "\n"),
];

/// Ordered (pattern, replacement) rewrites for generated text
pub struct ResponseCleaner {
    rules: Vec<(Regex, &'static str)>,
}

impl ResponseCleaner {
    pub fn new() -> Result<Self> {
        let rules = CLEANUP_RULES
            .iter()
            .map(|(pattern, replacement)| {
                Regex::new(pattern)
                    .map(|regex| (regex, *replacement))
                    .map_err(|e| gradchat_core::Error::Configuration(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    pub fn clean(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        for (regex, replacement) in &self.rules {
            cleaned = regex.replace_all(&cleaned, *replacement).into_owned();
        }
        cleaned.trim().to_string()
    }
}

/// Sends the composed prompt to the generation model
pub struct ResponseGenerator {
    llm: Arc<dyn LLMProvider>,
    cleaner: ResponseCleaner,
}

impl ResponseGenerator {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Result<Self> {
        Ok(Self {
            llm,
            cleaner: ResponseCleaner::new()?,
        })
    }

    /// Raw model text
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let result = self.llm.generate(prompt).await?;
        Ok(result.text)
    }

    pub fn clean(&self, text: &str) -> String {
        self.cleaner.clean(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_rules() {
        let cleaner = ResponseCleaner::new().unwrap();

        assert_eq!(cleaner.clean("<div>Hello</div>"), "Hello");
        assert_eq!(
            cleaner.clean("Salaries are high andthemedianbasesalaryinternationally is $90k"),
            "Salaries are high and the median base salary internationally is $90k"
        );
        assert_eq!(cleaner.clean("faculty andthe staff"), "faculty and the staff");
        assert_eq!(cleaner.clean("_Note_:  one   space"), "Note: one space");
        assert_eq!(cleaner.clean("para one\n\n\npara two\n"), "para one\npara two");
    }

    #[test]
    fn test_clean_text_is_stable() {
        let cleaner = ResponseCleaner::new().unwrap();
        let once = cleaner.clean("The program is <div>12 months</div> long.");
        assert_eq!(cleaner.clean(&once), once);
    }
}
