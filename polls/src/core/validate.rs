//! Normalization and validation of poll drafts.

use snafu::ensure;

use crate::error::{Result, ValidationSnafu};
use crate::model::PollDraft;

/// A draft whose fields have been trimmed and checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDraft {
    pub id: String,
    pub title: String,
    pub question: String,
    pub options: Vec<String>,
}

/// Trim every field, drop blank options, and reject drafts that would
/// produce an unusable poll.
///
/// An absent or blank title falls back to the id.
pub fn normalize_draft(draft: &PollDraft) -> Result<NormalizedDraft> {
    let id = draft.id.trim();
    validate_poll_id(id)?;

    let question = draft.question.trim();
    ensure!(
        !question.is_empty(),
        ValidationSnafu {
            reason: "question must be non-empty"
        }
    );

    let options = normalize_options(&draft.options);
    ensure!(
        !options.is_empty(),
        ValidationSnafu {
            reason: "options must contain at least one non-empty entry"
        }
    );

    let title = draft
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or(id);

    Ok(NormalizedDraft {
        id: id.to_string(),
        title: title.to_string(),
        question: question.to_string(),
        options,
    })
}

/// Check that `id` can serve as a store key. Any non-empty text is
/// accepted; share links and file names escape it where they embed it.
pub fn validate_poll_id(id: &str) -> Result<()> {
    ensure!(
        !id.is_empty(),
        ValidationSnafu {
            reason: "id must be non-empty"
        }
    );
    Ok(())
}

/// Trimmed options in input order, blanks removed. Duplicates are kept: the
/// poll author controls the option list verbatim.
pub fn normalize_options(options: &[String]) -> Vec<String> {
    options
        .iter()
        .map(|option| option.trim())
        .filter(|option| !option.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn draft(id: &str, question: &str, options: &[&str]) -> PollDraft {
        PollDraft {
            id: id.to_string(),
            title: None,
            question: question.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    #[test]
    fn trims_fields_and_preserves_option_order() {
        let mut input = draft(" anxiety ", " How nervous? ", &["  C", "A ", "", "B"]);
        input.title = Some("  Statistics Anxiety ".to_string());
        let normalized = normalize_draft(&input).expect("valid");
        assert_eq!(normalized.id, "anxiety");
        assert_eq!(normalized.title, "Statistics Anxiety");
        assert_eq!(normalized.question, "How nervous?");
        assert_eq!(normalized.options, vec!["C", "A", "B"]);
    }

    #[test]
    fn blank_title_falls_back_to_id() {
        let mut input = draft("anxiety", "How nervous?", &["A"]);
        input.title = Some("   ".to_string());
        let normalized = normalize_draft(&input).expect("valid");
        assert_eq!(normalized.title, "anxiety");
    }

    #[test]
    fn rejects_empty_fields() {
        for input in [
            draft("", "Q?", &["A"]),
            draft("id", "  ", &["A"]),
            draft("id", "Q?", &[]),
            draft("id", "Q?", &["  ", ""]),
        ] {
            let err = normalize_draft(&input).expect_err("invalid");
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn accepts_free_text_ids() {
        for id in ["week 3 quiz", "Q&A", "a/b", "anxiety_ph3130_Week 3", "50%"] {
            let normalized = normalize_draft(&draft(id, "Q?", &["A"])).expect("valid");
            assert_eq!(normalized.id, id);
        }
        assert!(validate_poll_id("").is_err());
    }
}
