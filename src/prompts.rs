//! Prompt assembly for the generation collaborator
//!
//! Prompts are built from the lesson's current page text and the FAQ
//! questions attached to the triggering notification. The collaborator is
//! treated as opaque; these functions only shape its input.

use crate::delimiter::PAGE_DELIMITER;

/// System prompt for insight generation
pub const INSIGHTS_SYSTEM_PROMPT: &str = "You review educational lesson content. \
Given the lesson text and the questions students keep asking about it, point \
out which parts of the lesson are unclear or incomplete and why those \
questions keep coming up. Reply with concise HTML.";

/// System prompt for revised-content generation
pub const CONTENT_SYSTEM_PROMPT: &str = "You revise educational lesson content. \
Given the lesson text and the questions students keep asking about it, produce \
an improved version of the lesson that answers those questions in place. \
Preserve all assets, links and embedded media exactly as they appear, keep \
every existing page delimiter comment where it stands, and reply with HTML \
only.";

/// System prompt for delimiter re-insertion
pub const DELIMITER_SYSTEM_PROMPT: &str = "You are given lesson content in HTML \
form and must reply with HTML only.";

/// Build the user prompt for insight generation
pub fn insights_prompt(faq_questions: &[String], lesson_content: &str) -> String {
    format!(
        "Students repeatedly asked the following questions about this lesson:\n\
         {}\n\n\
         Lesson content:\n{}",
        bullet_list(faq_questions),
        lesson_content
    )
}

/// Build the user prompt for revised-content generation
pub fn content_prompt(faq_questions: &[String], lesson_content: &str) -> String {
    format!(
        "Revise the lesson below so that it answers these recurring student \
         questions:\n{}\n\n\
         Keep every `{}` comment exactly where it appears so pagination is \
         unchanged.\n\n\
         Lesson content:\n{}",
        bullet_list(faq_questions),
        PAGE_DELIMITER,
        lesson_content
    )
}

/// Build the user prompt for re-inserting page delimiters into edited content
///
/// The edited content lost its pagination markers during editing; the
/// collaborator places `PAGE_DELIMITER` comments into the edited text at the
/// positions the original content had them, without altering anything else.
pub fn delimiter_prompt(original_content: &str, edited_content: &str) -> String {
    format!(
        "Insert `{marker}` comments into the edited content below, matching \
         where the original content has them. Do not remove existing \
         `{marker}` comments, do not change any other part of the edited \
         content, and retain all assets, links and embedded media. Reply with \
         the updated HTML only.\n\n\
         Original content:\n{original}\n\n\
         Edited content:\n{edited}",
        marker = PAGE_DELIMITER,
        original = original_content,
        edited = edited_content,
    )
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(no recorded questions)".to_string();
    }
    items
        .iter()
        .map(|q| format!("- {}", q))
        .collect::<Vec<_>>()
        .join("\n")
}
