//! The `heatmap=true` activation marker in the page URL.

use url::Url;

/// Query parameter that switches overlay mode on.
pub const ACTIVATION_PARAM: &str = "heatmap";

/// Browser history access.
pub trait History {
    fn current_url(&self) -> Url;

    /// Replace the current entry without navigating.
    fn replace_url(&mut self, url: Url);
}

/// Whether the URL asks for overlay mode.
pub fn activation_requested(url: &Url) -> bool {
    url.query_pairs()
        .any(|(k, v)| k == ACTIVATION_PARAM && v == "true")
}

/// The URL with every `heatmap` pair removed.
///
/// Other pairs keep their order, the fragment survives, and an emptied
/// query is dropped rather than left as a bare `?`.
pub fn strip_activation_marker(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != ACTIVATION_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}

/// History kept in memory (headless hosts and tests).
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    current: Url,
    replacements: usize,
}

impl MemoryHistory {
    pub fn new(url: Url) -> Self {
        Self {
            current: url,
            replacements: 0,
        }
    }

    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl History for MemoryHistory {
    fn current_url(&self) -> Url {
        self.current.clone()
    }

    fn replace_url(&mut self, url: Url) {
        self.current = url;
        self.replacements += 1;
    }
}
