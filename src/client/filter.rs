//! Mod filter over aggregated results / 模组筛选

use std::collections::HashMap;

use crate::search::schema::UNKNOWN_MOD;
use crate::search::SearchResult;

/// Mod ids from `allMods` entries (`"modId (versions)"`) / 从 allMods 提取模组ID
///
/// Empty ids and the unknown-mod marker are skipped.
pub fn extract_mod_ids(all_mods: &[String]) -> Vec<String> {
    all_mods
        .iter()
        .map(|entry| match entry.rfind(" (") {
            Some(idx) if entry.ends_with(')') => entry[..idx].trim(),
            _ => entry.trim(),
        })
        .filter(|id| !id.is_empty() && *id != UNKNOWN_MOD)
        .map(str::to_string)
        .collect()
}

/// Case-insensitive mod match; an empty filter matches everything / 不区分大小写
pub fn matches_mod_filter(result: &SearchResult, mod_filter: &str) -> bool {
    let wanted = mod_filter.trim();
    if wanted.is_empty() {
        return true;
    }
    let wanted = wanted.to_lowercase();
    extract_mod_ids(&result.all_mods)
        .iter()
        .any(|id| id.to_lowercase() == wanted)
}

pub fn apply_mod_filter(results: &[SearchResult], mod_filter: &str) -> Vec<SearchResult> {
    results
        .iter()
        .filter(|r| matches_mod_filter(r, mod_filter))
        .cloned()
        .collect()
}

/// Mods present in the results, by summed frequency desc then name / 可选模组列表
pub fn available_mods(results: &[SearchResult]) -> Vec<String> {
    let mut freq: HashMap<String, u64> = HashMap::new();
    for result in results {
        for id in extract_mod_ids(&result.all_mods) {
            *freq.entry(id).or_insert(0) += u64::from(result.frequency.max(1));
        }
    }

    let mut mods: Vec<(String, u64)> = freq.into_iter().collect();
    mods.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    mods.into_iter().map(|(id, _)| id).collect()
}
