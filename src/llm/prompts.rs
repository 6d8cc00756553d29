use chrono::NaiveDate;

/// Describe the source of a retrieved context block inside the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSource {
    /// A single speaker's segments.
    Speaker(String),
    /// Documents resolved to one calendar date.
    Date(NaiveDate),
    /// Documents dated anywhere within a period.
    Period { start: NaiveDate, end: NaiveDate },
    /// Documents whose date could not be determined.
    UnknownDate,
}

impl ContextSource {
    fn describe(&self) -> String {
        match self {
            Self::Speaker(name) => name.clone(),
            Self::Date(date) => format!("documents dated {date}"),
            Self::Period { start, end } => {
                format!("documents dated between {start} and {end}")
            }
            Self::UnknownDate => "documents with an unknown date".to_string(),
        }
    }
}

/// Build the generation prompt from retrieved segments.
///
/// Segments become a double-newline separated context block; the prompt
/// names its source, quotes the context, and ends with an `Answer:` cue.
pub fn build_prompt(source: &ContextSource, segments: &[String], question: &str) -> String {
    let context = segments.join("\n\n");
    format!(
        "Use the following context from {} to answer the question.\n\n\
         Context:\n{}\n\nQuestion: {}\nAnswer:",
        source.describe(),
        context,
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_prompt_shape() {
        let segments = vec!["Pirmas.".to_string(), "Antras.".to_string()];
        let prompt = build_prompt(
            &ContextSource::Speaker("PIRMININKAS".to_string()),
            &segments,
            "Kas vyko?",
        );

        assert!(prompt.starts_with("Use the following context from PIRMININKAS"));
        assert!(prompt.contains("Context:\nPirmas.\n\nAntras."));
        assert!(prompt.ends_with("Question: Kas vyko?\nAnswer:"));
    }

    #[test]
    fn test_period_descriptor() {
        let source = ContextSource::Period {
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
        };
        let prompt = build_prompt(&source, &["tekstas".to_string()], "Kas?");
        assert!(prompt.contains("documents dated between 2023-01-01 and 2023-01-31"));
    }

    #[test]
    fn test_unknown_date_descriptor() {
        let prompt = build_prompt(&ContextSource::UnknownDate, &["tekstas".to_string()], "Kas?");
        assert!(prompt.contains("documents with an unknown date"));
    }
}
