use super::tally::Tally;
use serde::Serialize;

/// Source languages CodeQL can analyze, spelled the way the API reports them.
pub const CODEQL_LANGUAGES: [&str; 13] = [
    "C",
    "C++",
    "C#",
    "Go",
    "HTML",
    "Java",
    "Kotlin",
    "JavaScript",
    "Python",
    "Ruby",
    "Swift",
    "TypeScript",
    "Vue",
];

pub fn is_codeql_language(language: &str) -> bool {
    CODEQL_LANGUAGES.contains(&language)
}

/// Drop every language outside the CodeQL allow-list.
pub fn codeql_only(tally: &Tally) -> Tally {
    tally.retain(is_codeql_language)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Report a single language, even when it never appeared.
    Language(String),
    /// The `limit` largest entries, optionally restricted to CodeQL languages first.
    Top { limit: usize, codeql_only: bool },
}

impl Selection {
    pub fn describe(&self) -> String {
        match self {
            Selection::Language(name) => format!("Language filter: {name}"),
            Selection::Top {
                limit,
                codeql_only: true,
            } => format!("CodeQL language filter applied, top languages limit: {limit}"),
            Selection::Top { limit, .. } => format!("Top languages limit: {limit}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageRow {
    pub language: String,
    pub value: u64,
    pub percentage: u64,
}

/// `value / total` as a rounded whole percentage; 0 when `total` is 0.
pub fn percentage(value: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (value as f64 / total as f64 * 100.0).round() as u64
}

/// Turn a tally into the ordered rows to display.
pub fn select(tally: &Tally, selection: &Selection) -> Vec<LanguageRow> {
    match selection {
        Selection::Language(name) => {
            let value = tally.get(name);
            vec![LanguageRow {
                language: name.clone(),
                value,
                percentage: percentage(value, tally.total()),
            }]
        }
        Selection::Top {
            limit,
            codeql_only: restrict,
        } => {
            let restricted;
            let tally = if *restrict {
                restricted = codeql_only(tally);
                &restricted
            } else {
                tally
            };

            let total = tally.total();
            let mut rows: Vec<LanguageRow> = tally
                .iter()
                .map(|(language, value)| LanguageRow {
                    language: language.to_string(),
                    value,
                    percentage: percentage(value, total),
                })
                .collect();
            rows.sort_by(|a, b| b.value.cmp(&a.value));
            rows.truncate(*limit);
            rows
        }
    }
}
