use chrono::{DateTime, Datelike};
use std::collections::BTreeMap;

/// Language name to byte count for a single repository, as reported by the API.
pub type LanguageByteMap = BTreeMap<String, u64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyMode {
    /// Number of repositories that contain the language.
    Count,
    /// Total bytes of the language across repositories.
    Bytes,
}

/// Running per-language totals plus the number of repositories folded in.
///
/// Keys are kept ordered so that equal values always come out in the same
/// order after a stable sort.
#[derive(Debug, Clone)]
pub struct Tally {
    mode: TallyMode,
    values: BTreeMap<String, u64>,
    repositories: usize,
}

impl Tally {
    pub fn new(mode: TallyMode) -> Self {
        Self {
            mode,
            values: BTreeMap::new(),
            repositories: 0,
        }
    }

    /// Fold one repository's languages in. A zero-byte entry still counts as
    /// present.
    pub fn accumulate(&mut self, languages: &LanguageByteMap) {
        self.repositories += 1;
        for (language, bytes) in languages {
            let entry = self.values.entry(language.clone()).or_insert(0);
            match self.mode {
                TallyMode::Count => *entry += 1,
                TallyMode::Bytes => *entry = entry.saturating_add(*bytes),
            }
        }
    }

    pub fn get(&self, language: &str) -> u64 {
        self.values.get(language).copied().unwrap_or(0)
    }

    pub fn repositories(&self) -> usize {
        self.repositories
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Percentage denominator: analyzed repositories in count mode, bytes of
    /// the languages still in the tally in byte mode.
    pub fn total(&self) -> u64 {
        match self.mode {
            TallyMode::Count => self.repositories as u64,
            TallyMode::Bytes => self.values.values().fold(0u64, |acc, v| acc.saturating_add(*v)),
        }
    }

    /// Copy of this tally holding only the languages `keep` accepts. The
    /// repository count is carried over unchanged.
    pub fn retain(&self, keep: impl Fn(&str) -> bool) -> Tally {
        Tally {
            mode: self.mode,
            values: self
                .values
                .iter()
                .filter(|(k, _)| keep(k.as_str()))
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            repositories: self.repositories,
        }
    }
}

/// Extract the creation year from an API timestamp such as `2023-04-01T12:00:00Z`.
pub fn creation_year(created_at: &str) -> Result<i32, chrono::ParseError> {
    DateTime::parse_from_rfc3339(created_at).map(|dt| dt.year())
}

/// One tally per repository creation year.
#[derive(Debug, Clone)]
pub struct YearBuckets {
    mode: TallyMode,
    buckets: BTreeMap<i32, Tally>,
}

impl YearBuckets {
    pub fn new(mode: TallyMode) -> Self {
        Self {
            mode,
            buckets: BTreeMap::new(),
        }
    }

    /// Add a repository to the bucket for its creation year. A timestamp that
    /// does not parse leaves every bucket untouched.
    pub fn add(
        &mut self,
        created_at: &str,
        languages: &LanguageByteMap,
    ) -> Result<i32, chrono::ParseError> {
        let year = creation_year(created_at)?;
        let mode = self.mode;
        self.buckets
            .entry(year)
            .or_insert_with(|| Tally::new(mode))
            .accumulate(languages);
        Ok(year)
    }

    /// Newest year first.
    pub fn iter_desc(&self) -> impl Iterator<Item = (i32, &Tally)> {
        self.buckets.iter().rev().map(|(year, tally)| (*year, tally))
    }
}
