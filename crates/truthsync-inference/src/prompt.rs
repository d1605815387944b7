//! Prompt construction for article generation.

use truthsync_core::{orientation_hint, OrientationHint};

/// Fixed system instruction for the reporter persona.
pub const SYSTEM_INSTRUCTION: &str =
    "You are a TruthSync news reporter. Write a detailed news article describing what the image shows.";

/// Clause appended when the submessage marks the capture as landscape.
pub const LANDSCAPE_CLAUSE: &str =
    "The photo was captured in landscape orientation; describe the wide scene accordingly.";

/// Clause appended when the submessage marks the capture as portrait.
pub const PORTRAIT_CLAUSE: &str =
    "The photo was captured in portrait orientation; describe the tall scene accordingly.";

/// Structured prompt for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticlePrompt {
    /// System instruction, possibly extended with an orientation clause.
    pub system: String,
    /// User text embedding the caller-supplied free-text context.
    pub user: String,
}

impl ArticlePrompt {
    /// Build the prompt from the caller-supplied submessage.
    pub fn build(submessage: &str) -> Self {
        let mut system = SYSTEM_INSTRUCTION.to_string();
        match orientation_hint(submessage) {
            Some(OrientationHint::Landscape) => {
                system.push(' ');
                system.push_str(LANDSCAPE_CLAUSE);
            }
            Some(OrientationHint::Portrait) => {
                system.push(' ');
                system.push_str(PORTRAIT_CLAUSE);
            }
            None => {}
        }

        let user = if submessage.trim().is_empty() {
            "What is the subject of this image?".to_string()
        } else {
            format!(
                "What is the subject of this image? Additional context: {}",
                submessage
            )
        };

        Self { system, user }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_submessage_keeps_base_instruction() {
        let prompt = ArticlePrompt::build("a quiet street");
        assert_eq!(prompt.system, SYSTEM_INSTRUCTION);
        assert!(prompt.user.contains("a quiet street"));
    }

    #[test]
    fn test_empty_submessage_omits_context() {
        let prompt = ArticlePrompt::build("  ");
        assert_eq!(prompt.user, "What is the subject of this image?");
    }

    #[test]
    fn test_landscape_marker_extends_system() {
        let prompt = ArticlePrompt::build("busy market, 촬영 방향: landscape, more");
        assert!(prompt.system.starts_with(SYSTEM_INSTRUCTION));
        assert!(prompt.system.ends_with(LANDSCAPE_CLAUSE));
    }

    #[test]
    fn test_portrait_marker_extends_system() {
        let prompt = ArticlePrompt::build("촬영 방향: portrait");
        assert!(prompt.system.ends_with(PORTRAIT_CLAUSE));
    }

    #[test]
    fn test_unrecognized_orientation_is_ignored() {
        let prompt = ArticlePrompt::build("촬영 방향: diagonal");
        assert_eq!(prompt.system, SYSTEM_INSTRUCTION);
    }
}
