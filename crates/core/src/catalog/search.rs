//! Name search over the index.

use super::types::IndexEntry;

/// Case-insensitive substring match on names, in index order.
///
/// A blank query matches nothing. At most `max_results` entries come back.
pub fn search_entries(entries: &[IndexEntry], query: &str, max_results: usize) -> Vec<IndexEntry> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    entries
        .iter()
        .filter(|entry| entry.name.to_lowercase().contains(&needle))
        .take(max_results)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(names: &[&str]) -> Vec<IndexEntry> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| IndexEntry {
                id: i as u32 + 1,
                name: name.to_string(),
                source_url: format!("https://pokeapi.co/api/v2/pokemon/{}/", i + 1),
            })
            .collect()
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let index = entries(&["pikachu", "raichu"]);
        assert!(search_entries(&index, "", 10).is_empty());
        assert!(search_entries(&index, "   ", 10).is_empty());
    }

    #[test]
    fn test_case_insensitive_substring() {
        let index = entries(&["pikachu", "Raichu", "bulbasaur"]);
        let names: Vec<String> = search_entries(&index, "  CHU ", 10)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["pikachu", "Raichu"]);
    }

    #[test]
    fn test_results_are_capped_in_index_order() {
        let names: Vec<String> = (0..25).map(|i| format!("mon-{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let index = entries(&refs);

        let hits = search_entries(&index, "mon", 10);
        assert_eq!(hits.len(), 10);
        assert_eq!(hits[0].name, "mon-00");
        assert_eq!(hits[9].name, "mon-09");
    }

    #[test]
    fn test_no_match() {
        let index = entries(&["pikachu"]);
        assert!(search_entries(&index, "mew", 10).is_empty());
    }
}
