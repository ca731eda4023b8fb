use serde::{Deserialize, Serialize};
use std::fmt;
use url::form_urlencoded;

pub const FILTER_PARAM: &str = "filter";
pub const RANKING_PARAM: &str = "ranking";
pub const LABELS_PARAM: &str = "labels";
pub const IF_LABELS_PARAM: &str = "ifLabels";
pub const FILTER_TAB_PARAM: &str = "filterTab";
pub const PAGE_PARAM: &str = "page";
pub const LIMIT_PARAM: &str = "limit";

// ---------------------------------------------------------------------------
// FilterTab
// ---------------------------------------------------------------------------

/// Mutually exclusive filter modes of the explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterTab {
    #[default]
    Default,
    Ranking,
    Labels,
}

impl FilterTab {
    pub const ALL: [FilterTab; 3] = [FilterTab::Default, FilterTab::Ranking, FilterTab::Labels];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterTab::Default => "default",
            FilterTab::Ranking => "ranking",
            FilterTab::Labels => "labels",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "default" => Some(FilterTab::Default),
            "ranking" => Some(FilterTab::Ranking),
            "labels" => Some(FilterTab::Labels),
            _ => None,
        }
    }

    /// Parameter holding this tab's encoded filter rows, if it has one.
    pub fn filter_param(&self) -> Option<&'static str> {
        match self {
            FilterTab::Default => Some(FILTER_PARAM),
            FilterTab::Ranking => Some(RANKING_PARAM),
            FilterTab::Labels => None,
        }
    }

    /// Every parameter owned by this mode.
    pub fn owned_params(&self) -> &'static [&'static str] {
        match self {
            FilterTab::Default => &[FILTER_PARAM],
            FilterTab::Ranking => &[RANKING_PARAM],
            FilterTab::Labels => &[LABELS_PARAM, IF_LABELS_PARAM],
        }
    }
}

impl fmt::Display for FilterTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// QueryParams
// ---------------------------------------------------------------------------

/// Ordered URL query state. Keys are unique; setting a key to `None`
/// removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string (with or without the leading `?`). Repeated keys
    /// keep their first value.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if params.get(&key).is_none() {
                params.pairs.push((key.into_owned(), value.into_owned()));
            }
        }
        params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Non-empty value of `key`.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replace `key` in place, append it, or remove it when `value` is `None`.
    pub fn set(&mut self, key: &str, value: Option<String>) {
        match value {
            Some(value) => match self.pairs.iter_mut().find(|(k, _)| k == key) {
                Some(pair) => pair.1 = value,
                None => self.pairs.push((key.to_string(), value)),
            },
            None => self.pairs.retain(|(k, _)| k != key),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.set(key, None);
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}
