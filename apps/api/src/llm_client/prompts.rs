// Shared prompt fragments used by every section prompt.
// Section-specific instructions live in enhancement::sections.

/// Header line of the global rule block. The sanitizer strips an echoed copy of this block.
pub const GLOBAL_RULES_HEADER: &str = "Global Resume Rules:";

/// Itemized editing rules prepended to every section prompt.
pub const GLOBAL_RULES: &[&str] = &[
    "Use a professional, employer-focused tone.",
    "Do not use first-person pronouns.",
    "Be concise, quantifiable, and clear.",
    "Fix grammar, spelling, punctuation and capitalization; avoid redundancy.",
    "Keep the original meaning. Do not invent experiences, education, tools, dates or metrics.",
    "Do not output placeholder tokens such as [Company Name] or <N>; leave missing details out.",
    "Do not output anything other than the content of the section; no commentary of any sort.",
];

/// Header that introduces the user's verbatim text.
pub const USER_INPUT_HEADER: &str = "User Input (verbatim; do not add new facts):";

pub const OUTPUT_POLICY_HEADER: &str = "Output Policy:";

/// Marker the prompt ends with. The sanitizer keeps only text after its last occurrence.
pub const ANSWER_MARKER: &str = "Improved Content:";

/// Renders the numbered global rule block.
pub fn global_rules_block() -> String {
    let mut block = String::from(GLOBAL_RULES_HEADER);
    for (i, rule) in GLOBAL_RULES.iter().enumerate() {
        block.push('\n');
        block.push_str(&format!("{}. {}", i + 1, rule));
    }
    block
}
