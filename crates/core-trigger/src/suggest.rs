//! Candidate completions for an active trigger.

/// Supplies the candidates shown for a partial query. Implementations may be
/// backed by anything; the session only calls this on its own thread.
pub trait SuggestionSource {
    fn candidates(&self, partial_query: &str) -> Vec<String>;
}

impl<F> SuggestionSource for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn candidates(&self, partial_query: &str) -> Vec<String> {
        self(partial_query)
    }
}

/// Fixed candidate list, optionally narrowed by case-insensitive prefix.
#[derive(Debug, Clone, Default)]
pub struct StaticSuggestions {
    entries: Vec<String>,
    filter_by_query: bool,
}

impl StaticSuggestions {
    pub fn new(entries: Vec<String>, filter_by_query: bool) -> Self {
        Self {
            entries,
            filter_by_query,
        }
    }

    pub fn from_config(cfg: &core_config::Config) -> Self {
        let completion = &cfg.file.completion;
        Self::new(completion.candidates.clone(), completion.filter_by_query)
    }
}

impl SuggestionSource for StaticSuggestions {
    fn candidates(&self, partial_query: &str) -> Vec<String> {
        if !self.filter_by_query || partial_query.is_empty() {
            return self.entries.clone();
        }
        let query = partial_query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.to_lowercase().starts_with(&query))
            .cloned()
            .collect()
    }
}
