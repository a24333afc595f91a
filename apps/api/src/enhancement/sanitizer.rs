//! Response Sanitizer — deterministic cleanup of raw model output.
//!
//! Pipeline (order matters, each step assumes the previous ones ran):
//! strip_prefixes → truncate_at_marker → remove_scaffolding → remove_commentary_lines →
//! scrub_placeholders → cap_words → normalize_shape.
//!
//! INVARIANT: the result is never empty unless the original input was empty. Anything
//! that sanitizes to nothing falls back to the user's original text, verbatim.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::enhancement::sections::{OutputShape, SectionSpec};
use crate::llm_client::prompts::USER_INPUT_HEADER;

/// Generic labels models like to lead with. Exact, case-sensitive prefixes.
const GENERIC_PREFIXES: &[&str] = &[
    "Summary:",
    "Improved Content:",
    "Enhanced:",
    "Here is the improved text:",
    "Here's the enhanced version:",
    "Explanation of changes:",
    "Explanation:",
    "Notes:",
];

/// Lines starting with one of these (trimmed, lower-cased) are model commentary.
const COMMENTARY_MARKERS: &[&str] = &[
    "explanation of changes",
    "explanation:",
    "changes:",
    "what changed:",
    "here's what i changed",
    "notes:",
    "rationale:",
    "step ",
    "step:",
    "steps:",
    "process:",
    "procedure:",
];

/// Skill tokens that are commentary rather than skills.
const SKILL_COMMENTARY: &[&str] = &["explanation", "note", "reason", "changes"];

/// Abbreviations whose trailing period does not end a sentence.
const ABBREVIATIONS: &[&str] = &["e.g.", "i.e.", "etc.", "vs.", "approx.", "incl."];

const BULLET_MARKERS: &[char] = &['-', '•', '*', '–'];

/// Canonical spellings for common technology names, keyed by lower-case form.
const TECH_NAMES: &[(&str, &str)] = &[
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("react", "React"),
    ("node.js", "Node.js"),
    ("nodejs", "Node.js"),
    ("python", "Python"),
    ("java", "Java"),
    ("c++", "C++"),
    ("c#", "C#"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("sql", "SQL"),
    ("mongodb", "MongoDB"),
    ("mysql", "MySQL"),
    ("postgresql", "PostgreSQL"),
    ("aws", "AWS"),
    ("azure", "Azure"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
    ("git", "Git"),
    ("github", "GitHub"),
    ("gitlab", "GitLab"),
    ("jira", "Jira"),
    ("agile", "Agile"),
    ("scrum", "Scrum"),
    ("api", "API"),
    ("rest", "REST"),
    ("graphql", "GraphQL"),
    ("json", "JSON"),
    ("xml", "XML"),
    ("linux", "Linux"),
    ("windows", "Windows"),
    ("macos", "macOS"),
    ("ios", "iOS"),
    ("android", "Android"),
];

/// Sanitized text for one section. `text` is never empty unless the original was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub text: String,
    /// The model output was unusable and `text` is the original, verbatim.
    pub fell_back: bool,
}

/// Runs the full pipeline for one section.
pub fn sanitize(spec: &SectionSpec, raw_model_text: &str, original_user_text: &str) -> Sanitized {
    if original_user_text.trim().is_empty() {
        return Sanitized {
            text: original_user_text.to_string(),
            fell_back: false,
        };
    }
    match run_pipeline(spec, raw_model_text, original_user_text) {
        Some(text) => Sanitized {
            text,
            fell_back: false,
        },
        None => Sanitized {
            text: original_user_text.to_string(),
            fell_back: true,
        },
    }
}

fn run_pipeline(spec: &SectionSpec, raw_model_text: &str, original_user_text: &str) -> Option<String> {
    let text = strip_prefixes(spec, raw_model_text);
    let text = truncate_at_marker(&text);
    let text = remove_scaffolding(&text);
    let text = remove_commentary_lines(&text);
    let text = scrub_placeholders(&text);
    let text = cap_words(&text, spec.word_cap);

    if text.trim().is_empty() {
        return None;
    }

    let text = normalize_shape(spec, &text, original_user_text);
    (!text.trim().is_empty()).then_some(text)
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline steps
// ────────────────────────────────────────────────────────────────────────────

/// Step 1: removes leading labels ("Experience:", "EXPERIENCE:", "Improved Content:", ...).
pub fn strip_prefixes(spec: &SectionSpec, text: &str) -> String {
    let title_label = format!("{}:", spec.title);
    let upper_label = format!("{}:", spec.title.to_uppercase());

    let mut out = text.trim();
    let labels = [title_label.as_str(), upper_label.as_str()]
        .into_iter()
        .chain(GENERIC_PREFIXES.iter().copied());
    for label in labels {
        if let Some(rest) = out.strip_prefix(label) {
            out = rest.trim_start();
        }
    }
    out.trim_end().to_string()
}

/// Step 2: keeps only what follows the last "Improved Content:" marker, if any.
pub fn truncate_at_marker(text: &str) -> String {
    static MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)improved\s*content\s*:").unwrap());

    match MARKER.find_iter(text).last() {
        Some(m) => text[m.end()..].trim().to_string(),
        None => text.to_string(),
    }
}

/// Step 3: strips echoed rule blocks, output-policy blocks and "User Input:" headers.
pub fn remove_scaffolding(text: &str) -> String {
    static RULES_BLOCK: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            &format!(
                r"(?ims)^[ \t]*global\s+(?:editing|resume)\s+rules\b.*?(?:^[ \t]*{}[ \t]*(?:\n|\z)|\z)",
                user_input_header_pattern()
            ),
        )
        .unwrap()
    });
    static POLICY_BLOCK: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?ims)^[ \t]*output[ \t]+policy[ \t]*:.*?(?:\n[ \t]*\n|\z)").unwrap()
    });
    static INPUT_HEADER_LINE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(&format!(r"(?im)^[ \t]*{}[ \t]*\n?", user_input_header_pattern())).unwrap()
    });

    let text = RULES_BLOCK.replace_all(text, "");
    let text = POLICY_BLOCK.replace_all(&text, "");
    let text = INPUT_HEADER_LINE.replace_all(&text, "");
    text.trim().to_string()
}

/// The prompt's verbatim-input header, or a bare "User Input:". Other lines that merely
/// start with "user input" are resume content.
fn user_input_header_pattern() -> String {
    format!(
        r"(?:{}|user[ \t]+input[ \t]*:)",
        regex::escape(USER_INPUT_HEADER)
    )
}

/// Step 4: drops whole lines that open with a commentary marker. Mid-line mentions survive.
pub fn remove_commentary_lines(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let lowered = line.trim().to_lowercase();
            !COMMENTARY_MARKERS.iter().any(|m| lowered.starts_with(m))
        })
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Step 5: removes `[...]`, `<...>` and `{...}` tokens and tidies the gaps they leave.
pub fn scrub_placeholders(text: &str) -> String {
    static SQUARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
    static ANGLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
    static CURLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").unwrap());
    static HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());
    static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r" +([,.;:!?])").unwrap());

    let text = SQUARE.replace_all(text, "");
    let text = ANGLE.replace_all(&text, "");
    let text = CURLY.replace_all(&text, "");
    let text = HSPACE.replace_all(&text, " ");
    let text = SPACE_BEFORE_PUNCT.replace_all(&text, "$1");

    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Step 6: hard cut after `cap` words. Whitespace inside the kept part is untouched.
pub fn cap_words(text: &str, cap: usize) -> String {
    static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").unwrap());

    if cap == 0 {
        return String::new();
    }
    let mut words = WORD.find_iter(text);
    match words.nth(cap - 1) {
        Some(last) if words.next().is_some() => text[..last.end()].to_string(),
        _ => text.to_string(),
    }
}

/// Step 7: shape-specific normalization.
pub fn normalize_shape(spec: &SectionSpec, text: &str, original_user_text: &str) -> String {
    match spec.shape {
        OutputShape::List => normalize_list(text, original_user_text),
        OutputShape::MultiEntry => normalize_entries(text, original_user_text),
        OutputShape::Paragraph => capitalize_sentences(text),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shape normalizers
// ────────────────────────────────────────────────────────────────────────────

/// Closed-world list normalization: output entries are exactly the original entries, in
/// original order. A case-insensitive match in the model output contributes its surface
/// form; otherwise the original token is kept.
fn normalize_list(text: &str, original_user_text: &str) -> String {
    static SKILLS_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^skills\s*:\s*").unwrap());

    let candidates: Vec<String> = split_list_tokens(text)
        .into_iter()
        .map(|token| SKILLS_LABEL.replace(&token, "").trim().to_string())
        .filter(|token| {
            let lowered = token.to_lowercase();
            !token.is_empty() && !SKILL_COMMENTARY.iter().any(|c| lowered.starts_with(c))
        })
        .collect();

    split_list_tokens(original_user_text)
        .into_iter()
        .map(|original| {
            let lowered = original.to_lowercase();
            let surface = candidates
                .iter()
                .find(|c| c.to_lowercase() == lowered)
                .map(String::as_str)
                .unwrap_or(original.as_str());
            // Deliberately also applied to tokens the model did not return: well-known
            // names get canonical casing even when the original is otherwise kept.
            canonical_skill(surface)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Splits on commas, semicolons and newlines, dropping bullet markers and empties.
fn split_list_tokens(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches(BULLET_MARKERS).trim())
        .flat_map(|line| line.split(|c: char| c == ',' || c == ';'))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn canonical_skill(skill: &str) -> String {
    let lowered = skill.to_lowercase();
    if let Some((_, canonical)) = TECH_NAMES.iter().find(|(key, _)| *key == lowered) {
        return canonical.to_string();
    }
    upper_first(skill)
}

/// Blank-line separated entries, each sentence-capitalized.
///
/// When the original has two or more blank-line entries, the output must have the same
/// count; a merged, split or dropped entry yields an empty string so the caller falls
/// back to the original.
fn normalize_entries(text: &str, original_user_text: &str) -> String {
    static REPEATED_PERIODS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").unwrap());

    let entries: Vec<String> = split_entries(text)
        .map(|entry| {
            let entry = REPEATED_PERIODS.replace_all(entry, ".");
            capitalize_sentences(&entry)
        })
        .collect();

    let original_count = split_entries(original_user_text).count();
    if original_count >= 2 && entries.len() != original_count {
        return String::new();
    }
    entries.join("\n\n")
}

fn split_entries(text: &str) -> impl Iterator<Item = &str> {
    static ENTRY_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").unwrap());

    ENTRY_BREAK
        .split(text)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
}

/// Upper-cases the first letter of every sentence. Sentence starts are the start of the
/// text, the start of each line (after any bullet marker), and the first letter after
/// `.`, `!` or `?` followed by whitespace. Every other character is left as is.
pub fn capitalize_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_start = true;
    let mut after_terminator = false;
    let mut word = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if at_start {
            if c.is_alphabetic() {
                // Mixed-case words such as "iOS" or "eBay" keep their casing.
                let mixed_case = c.is_lowercase() && chars.peek().is_some_and(|n| n.is_uppercase());
                if mixed_case {
                    out.push(c);
                } else {
                    out.extend(c.to_uppercase());
                }
                at_start = false;
                word.push(c);
                continue;
            }
            if c.is_whitespace() || BULLET_MARKERS.contains(&c) || matches!(c, '"' | '\'' | '(') {
                out.push(c);
                continue;
            }
            at_start = false;
        }

        out.push(c);

        if c == '\n' {
            at_start = true;
            after_terminator = false;
            word.clear();
        } else if c.is_whitespace() {
            if after_terminator {
                at_start = true;
            }
            after_terminator = false;
            word.clear();
        } else {
            word.push(c);
            if matches!(c, '.' | '!' | '?') {
                let lowered = word.to_lowercase();
                let bare = lowered.trim_start_matches(|ch: char| !ch.is_alphanumeric());
                after_terminator = !ABBREVIATIONS.contains(&bare);
            } else if !matches!(c, '"' | '\'' | ')') {
                after_terminator = false;
            }
        }
    }
    out
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
