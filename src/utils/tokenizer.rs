use rustc_hash::FxHashMap;

/// Iterate over tokens: maximal runs of alphanumeric characters, lower-cased.
pub fn tokens(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .split(|c: char| !c.is_alphanumeric())
        .filter(|run| !run.is_empty())
        .map(lowercase)
}

/// Per-document token counts
#[derive(Debug, Clone, Default)]
pub struct TokenCounts {
    pub counts: FxHashMap<String, u32>,
    pub total: u32,
}

impl TokenCounts {
    pub fn get(&self, token: &str) -> u32 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.counts.contains_key(token)
    }
}

/// Count every token in `content`
pub fn count_tokens(content: &str) -> TokenCounts {
    // Pre-allocate with reasonable capacity
    let mut counts = FxHashMap::with_capacity_and_hasher(content.len() / 16, Default::default());
    let mut total = 0u32;

    for token in tokens(content) {
        *counts.entry(token).or_insert(0) += 1;
        total = total.saturating_add(1);
    }

    TokenCounts { counts, total }
}

/// Extract query tokens: same rules as documents, deduplicated and sorted
pub fn tokenize_query(query: &str) -> Vec<String> {
    let mut result: Vec<String> = tokens(query).collect();
    result.sort();
    result.dedup();
    result
}

fn lowercase(run: &str) -> String {
    // ASCII fast path, most source text is ASCII
    if run.is_ascii() {
        run.to_ascii_lowercase()
    } else {
        run.to_lowercase()
    }
}
