use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static REPEATED_BANG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!{2,}").expect("valid regex"));
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static REPEATED_QUESTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?{2,}").expect("valid regex"));

/// Skill terms detected in listing descriptions, grouped by field.
const SKILLS: &[&[&str]] = &[
    // programming
    &[
        "python", "java", "javascript", "c++", "c#", "php", "ruby", "go", "rust", "swift",
        "kotlin", "typescript", "scala", "matlab",
    ],
    // frameworks
    &[
        "react", "angular", "vue", "django", "flask", "spring", "express", "laravel", "rails",
        "node.js", "next.js", ".net", "tensorflow", "pytorch",
    ],
    // databases
    &[
        "mysql", "postgresql", "mongodb", "redis", "elasticsearch", "oracle", "sql server",
        "sqlite", "cassandra", "dynamodb",
    ],
    // cloud
    &[
        "aws", "azure", "google cloud", "gcp", "kubernetes", "docker", "terraform", "jenkins",
        "gitlab", "github actions",
    ],
    // civil engineering
    &[
        "autocad", "revit", "civil 3d", "staad pro", "etabs", "primavera", "ms project", "tekla",
        "structural analysis", "concrete design", "steel design",
    ],
    // marketing
    &[
        "google analytics", "adwords", "facebook ads", "seo", "sem", "content marketing",
        "social media", "email marketing", "ppc", "a/b testing", "google tag manager",
    ],
];

/// Decode HTML entities once, collapse whitespace and squash runs of
/// `!` / `?`.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let decoded = html_escape::decode_html_entities(text);

    let collapsed = WHITESPACE.replace_all(decoded.trim(), " ");
    let collapsed = REPEATED_BANG.replace_all(&collapsed, "!");
    REPEATED_QUESTION.replace_all(&collapsed, "?").into_owned()
}

/// Drop HTML tags, keeping the text between them, then [`clean_text`] it.
pub fn strip_tags(html: &str) -> String {
    clean_text(&TAGS.replace_all(html, " "))
}

/// Uppercase the first letter of every word and lowercase the rest,
/// e.g. `"python developer"` -> `"Python Developer"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// True when `term` occurs in `haystack` (both already lowercased) and is
/// not glued to surrounding alphanumerics.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        let glued = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric());
        !glued(before) && !glued(after)
    })
}

/// Detect known skill terms in a description. Results are title-cased,
/// deduplicated and sorted.
pub fn extract_skills(description: &str) -> Vec<String> {
    let lower = description.to_lowercase();
    let found: BTreeSet<String> = SKILLS
        .iter()
        .flat_map(|group| group.iter())
        .filter(|skill| contains_term(&lower, skill))
        .map(|skill| title_case(skill))
        .collect();
    found.into_iter().collect()
}
