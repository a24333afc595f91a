//! Prompt Builder — composes rules, section instructions, verbatim input and output policy.
//!
//! Each block carries its own header so the sanitizer can find and strip echoed scaffolding.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::enhancement::sections::SectionSpec;
use crate::llm_client::prompts::{
    global_rules_block, ANSWER_MARKER, OUTPUT_POLICY_HEADER, USER_INPUT_HEADER,
};

/// Hard cap on user input sent to the model, in characters.
pub const MAX_INPUT_CHARS: usize = 4000;

/// Builds the full prompt for one section, or `None` when the input is blank
/// (blank input is passed through without calling the model).
pub fn build_prompt(spec: &SectionSpec, user_text: &str) -> Option<String> {
    if user_text.trim().is_empty() {
        return None;
    }
    let input = prepare_input(user_text);

    let mut prompt = String::with_capacity(input.len() + 2048);
    prompt.push_str(&global_rules_block());
    prompt.push_str("\n\n");
    prompt.push_str(spec.instructions);
    prompt.push_str("\n\n");
    prompt.push_str(USER_INPUT_HEADER);
    prompt.push('\n');
    prompt.push_str(&input);
    prompt.push_str("\n\n");
    prompt.push_str(&output_policy(spec));
    prompt.push_str("\n\n");
    prompt.push_str(ANSWER_MARKER);
    Some(prompt)
}

fn output_policy(spec: &SectionSpec) -> String {
    let mut lines = vec![
        format!("- Return ONLY the improved text for the {} section.", spec.id),
        "- Do NOT include headings, labels, steps, notes, or explanations.".to_string(),
        "- Do NOT add entities, tools, dates, metrics, or claims not present above.".to_string(),
        "- Do NOT output placeholders; if something is missing, leave it out.".to_string(),
        "- Avoid repetition and filler. Keep it concise and direct.".to_string(),
    ];
    if let Some(range) = spec.word_range {
        let scope = if range.per_entry { " per entry" } else { "" };
        lines.push(format!(
            "- Stay within {}-{} words{}.",
            range.min, range.max, scope
        ));
    }
    format!("{OUTPUT_POLICY_HEADER}\n{}", lines.join("\n"))
}

/// Collapses runs of horizontal whitespace, squeezes 3+ newlines into one blank line,
/// and truncates to `MAX_INPUT_CHARS`. Line and paragraph structure is kept because
/// multi-entry sections rely on blank-line separation.
pub fn prepare_input(user_text: &str) -> String {
    static HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());
    static BLANKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+\n").unwrap());

    let normalized = user_text.replace("\r\n", "\n");
    let collapsed = HSPACE.replace_all(&normalized, " ");
    let squeezed = BLANKS.replace_all(&collapsed, "\n\n");
    let trimmed = squeezed
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    let trimmed = trimmed.trim();

    if trimmed.chars().count() > MAX_INPUT_CHARS {
        trimmed.chars().take(MAX_INPUT_CHARS).collect()
    } else {
        trimmed.to_string()
    }
}
