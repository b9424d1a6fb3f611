use regex::bytes::{Regex, RegexBuilder};

use unitscope_types::{FIELD_PRIORITY, MatchSpec, SelectionItem, SeverityThreshold};

/// Literal substring filter applied to reassembled lines
#[derive(Clone)]
pub struct SearchFilter {
    /// Escaped term (None = match everything)
    regex: Option<Regex>,

    /// Original search term
    term: String,

    /// Case sensitivity
    case_insensitive: bool,
}

impl SearchFilter {
    /// Create a case-sensitive filter
    pub fn new(term: &str) -> Result<Self, regex::Error> {
        Self::build(term, false)
    }

    /// Create a case-insensitive filter
    pub fn new_case_insensitive(term: &str) -> Result<Self, regex::Error> {
        Self::build(term, true)
    }

    fn build(term: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = if term.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&regex::escape(term))
                    .case_insensitive(case_insensitive)
                    .build()?,
            )
        };

        Ok(Self {
            regex,
            term: term.to_string(),
            case_insensitive,
        })
    }

    /// Check whether a line contains the term
    pub fn matches(&self, line: &[u8]) -> bool {
        match &self.regex {
            Some(re) => re.is_match(line),
            None => true,
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Check if filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }
}

impl std::fmt::Debug for SearchFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchFilter")
            .field("term", &self.term)
            .field("case_insensitive", &self.case_insensitive)
            .finish()
    }
}

/// Filter settings read once when a pipeline is built.
///
/// Changing these never touches a running pipeline; the next switch picks
/// them up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterContext {
    pub threshold: SeverityThreshold,
    pub search: String,
    pub case_insensitive: bool,
}

impl FilterContext {
    pub fn new(threshold: SeverityThreshold, search: impl Into<String>) -> Self {
        Self {
            threshold,
            search: search.into(),
            case_insensitive: false,
        }
    }

    /// Selection clauses followed by the severity-expanded clauses.
    ///
    /// A selection that is itself a severity bucket (`PRIORITY=0..=n`) is
    /// narrowed to `min(n, threshold)` instead of being widened by it, as
    /// the journal ORs clauses on the same field.
    pub fn match_spec(&self, selection: &SelectionItem) -> MatchSpec {
        let (buckets, rest): (Vec<_>, Vec<_>) = selection
            .matches
            .clauses()
            .iter()
            .cloned()
            .partition(|c| c.field == FIELD_PRIORITY);

        let ceiling = buckets
            .iter()
            .filter_map(|c| c.value.parse::<u8>().ok())
            .max();

        let threshold = match ceiling {
            Some(level) => SeverityThreshold::new(level.min(self.threshold.level())),
            None => self.threshold,
        };

        MatchSpec::new(rest).concat(threshold.expand())
    }

    pub fn search_filter(&self) -> Result<SearchFilter, regex::Error> {
        if self.case_insensitive {
            SearchFilter::new_case_insensitive(&self.search)
        } else {
            SearchFilter::new(&self.search)
        }
    }

    /// Log view title for a selection under this filter
    pub fn title(&self, selection: &SelectionItem) -> String {
        if self.search.is_empty() {
            selection.name.clone()
        } else {
            format!("{} (filtered by {})", selection.name, self.search)
        }
    }
}
