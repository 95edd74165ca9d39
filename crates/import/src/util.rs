/// Words too short or too common to carry matching signal in pt-BR
/// payment descriptions.
const STOPWORDS: &[&str] = &[
    "de", "da", "do", "das", "dos", "em", "por", "para", "com", "ref", "ltda", "sa", "me", "epp",
    "cia",
];

/// Trims and collapses internal whitespace runs to single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased alphanumeric tokens of three or more characters, minus
/// stopwords, deduplicated, first-occurrence order preserved.
pub fn significant_tokens(s: &str) -> Vec<String> {
    let lower = s.to_lowercase();
    let mut tokens: Vec<String> = Vec::new();
    for word in lower.split(|c: char| !c.is_alphanumeric()) {
        if word.chars().count() < 3 || STOPWORDS.contains(&word) {
            continue;
        }
        if !tokens.iter().any(|t| t.as_str() == word) {
            tokens.push(word.to_string());
        }
    }
    tokens
}

/// Compact description fragment for synthetic ids: ASCII alphanumerics
/// only, uppercased, truncated.
pub fn description_slug(s: &str, max_len: usize) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .take(max_len)
        .collect()
}
