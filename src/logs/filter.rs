/// Case-insensitive substring filter over lines. An empty query returns the
/// text unchanged; otherwise matching lines are joined with `\n` in order.
pub fn filter(raw: &str, query: &str) -> String {
    if query.is_empty() {
        return raw.to_string();
    }
    let needle = query.to_lowercase();
    raw.split('\n')
        .filter(|line| line.to_lowercase().contains(&needle))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Number of raw lines a query would keep. Shown in the filter bar.
pub fn count_matches(raw: &str, query: &str) -> usize {
    if query.is_empty() {
        return raw.split('\n').count();
    }
    let needle = query.to_lowercase();
    raw.split('\n')
        .filter(|line| line.to_lowercase().contains(&needle))
        .count()
}
