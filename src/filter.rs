/// The active line filter: a level token and a search term, both optional.
///
/// Both parts are case-insensitive substring predicates combined with AND.
/// Empty strings are treated the same as no filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    /// Level token as given by the user (e.g. "ERROR")
    pub level: Option<String>,
    /// Search term as given by the user
    pub search: Option<String>,
    // Lowercased copies used for matching
    level_lower: Option<String>,
    search_lower: Option<String>,
}

impl Filter {
    pub fn new(level: Option<String>, search: Option<String>) -> Self {
        let level = level.filter(|s| !s.is_empty());
        let search = search.filter(|s| !s.is_empty());
        Self {
            level_lower: level.as_deref().map(str::to_lowercase),
            search_lower: search.as_deref().map(str::to_lowercase),
            level,
            search,
        }
    }

    /// Same level token, different search term
    pub fn with_search(&self, search: Option<String>) -> Self {
        Self::new(self.level.clone(), search)
    }

    /// Whether this filter lets every line through
    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.search.is_none()
    }

    /// Check if a line matches this filter
    pub fn matches(&self, line: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        let lower = line.to_lowercase();
        let level_ok = self
            .level_lower
            .as_deref()
            .is_none_or(|level| lower.contains(level));
        level_ok
            && self
                .search_lower
                .as_deref()
                .is_none_or(|term| lower.contains(term))
    }

    /// Short description for the status bar
    pub fn describe(&self) -> String {
        match (&self.level, &self.search) {
            (None, None) => String::new(),
            (Some(level), None) => format!("level: {}", level),
            (None, Some(term)) => format!("search: {}", term),
            (Some(level), Some(term)) => format!("level: {} | search: {}", level, term),
        }
    }
}
