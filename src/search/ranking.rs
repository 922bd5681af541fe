//! Ranking & aggregation of raw matches / 排序与聚合
//!
//! Raw rows are folded twice: first per `(origin, trans, modid)` so that the
//! versions of one mod collapse, then per `(origin, trans)` across mods.
//! Rows are sorted by row id before folding, so the output does not depend
//! on the order the store returned them in.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::schema::{Column, RawMatch, SearchResult, UNKNOWN_VERSION};

/// Exact match of the whole query / 完全匹配
pub const WEIGHT_EXACT: u8 = 3;
/// Best full-text rank / 最佳相关度
pub const WEIGHT_TOP_RANK: u8 = 2;
pub const WEIGHT_FUZZY: u8 = 1;

const RANK_EPSILON: f64 = 1e-9;

/// Weight of a single row / 单行权重
pub fn match_weight(row: &RawMatch, column: Column, exact_term: &str, best_rank: f64) -> u8 {
    if row.entry.column(column).to_lowercase() == exact_term {
        WEIGHT_EXACT
    } else if row.rank <= best_rank + RANK_EPSILON {
        WEIGHT_TOP_RANK
    } else {
        WEIGHT_FUZZY
    }
}

/// Per-mod fold / 按模组合并
struct ModGroup {
    first_row: i64,
    mod_id: String,
    weight: u8,
    versions: Vec<String>,
    keys: Vec<String>,
    curseforge_ids: Vec<String>,
    rows: u32,
}

/// Per-pair fold / 按词对合并
struct PairGroup {
    origin_name: String,
    trans_name: String,
    mods: Vec<ModGroup>,
}

/// Aggregate and order all matches / 聚合并排序全部匹配
pub fn aggregate(mut rows: Vec<RawMatch>, column: Column, exact_term: &str) -> Vec<SearchResult> {
    if rows.is_empty() {
        return Vec::new();
    }

    rows.sort_by_key(|r| r.row_id);
    let best_rank = rows.iter().map(|r| r.rank).fold(f64::INFINITY, f64::min);

    let mut pairs: Vec<PairGroup> = Vec::new();
    let mut pair_index: HashMap<(String, String), usize> = HashMap::new();

    for row in &rows {
        let weight = match_weight(row, column, exact_term, best_rank);
        let entry = &row.entry;

        let pair_key = (entry.origin_name.clone(), entry.trans_name.clone());
        let pi = *pair_index.entry(pair_key).or_insert_with(|| {
            pairs.push(PairGroup {
                origin_name: entry.origin_name.clone(),
                trans_name: entry.trans_name.clone(),
                mods: Vec::new(),
            });
            pairs.len() - 1
        });

        let pair = &mut pairs[pi];
        let mod_id = entry.mod_id();
        let group = match pair.mods.iter().position(|m| m.mod_id == mod_id) {
            Some(i) => &mut pair.mods[i],
            None => {
                pair.mods.push(ModGroup {
                    first_row: row.row_id,
                    mod_id: mod_id.to_string(),
                    weight,
                    versions: Vec::new(),
                    keys: Vec::new(),
                    curseforge_ids: Vec::new(),
                    rows: 0,
                });
                let last = pair.mods.len() - 1;
                &mut pair.mods[last]
            }
        };

        group.weight = group.weight.max(weight);
        group.rows += 1;
        group.versions.push(
            entry.version.clone().filter(|v| !v.is_empty()).unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        );
        group.keys.push(entry.key.clone().unwrap_or_default());
        group.curseforge_ids.push(entry.curseforge.clone().unwrap_or_default());
    }

    let mut results: Vec<SearchResult> = pairs.into_iter().map(finish_pair).collect();
    results.sort_by(compare_results);
    results
}

fn finish_pair(mut pair: PairGroup) -> SearchResult {
    pair.mods.sort_by_key(|m| m.first_row);

    let mut all_mods = Vec::with_capacity(pair.mods.len());
    let mut all_keys = Vec::new();
    let mut all_curseforge_ids = Vec::new();
    let mut frequency = 0;
    let mut weight = WEIGHT_FUZZY;

    for m in pair.mods {
        all_mods.push(format!("{} ({})", m.mod_id, m.versions.join(", ")));
        all_keys.extend(m.keys);
        all_curseforge_ids.extend(m.curseforge_ids);
        frequency += m.rows;
        weight = weight.max(m.weight);
    }

    SearchResult {
        trans_name: pair.trans_name,
        origin_name: pair.origin_name,
        frequency,
        all_mods,
        all_keys,
        all_curseforge_ids,
        match_weight: weight,
    }
}

/// weight desc, frequency desc, origin asc, trans asc / 排序规则
pub fn compare_results(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.match_weight
        .cmp(&a.match_weight)
        .then_with(|| b.frequency.cmp(&a.frequency))
        .then_with(|| a.origin_name.cmp(&b.origin_name))
        .then_with(|| a.trans_name.cmp(&b.trans_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::schema::DictionaryEntry;

    fn row(id: i64, origin: &str, trans: &str, modid: Option<&str>, version: &str, rank: f64) -> RawMatch {
        RawMatch {
            row_id: id,
            entry: DictionaryEntry {
                origin_name: origin.to_string(),
                trans_name: trans.to_string(),
                modid: modid.map(str::to_string),
                version: Some(version.to_string()),
                key: Some(format!("key.{}", id)),
                curseforge: modid.map(|m| format!("{}-cf", m)),
            },
            rank,
        }
    }

    #[test]
    fn test_three_mods_collapse_into_one_result() {
        let rows = vec![
            row(1, "torch", "火把", Some("minecraft"), "1.20", -2.0),
            row(2, "torch", "火把", Some("tconstruct"), "3.6", -2.0),
            row(3, "torch", "火把", Some("create"), "0.5", -2.0),
        ];
        let results = aggregate(rows, Column::OriginName, "torch");
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.frequency, 3);
        assert_eq!(r.match_weight, WEIGHT_EXACT);
        assert_eq!(r.all_mods, vec!["minecraft (1.20)", "tconstruct (3.6)", "create (0.5)"]);
        assert_eq!(r.all_keys, vec!["key.1", "key.2", "key.3"]);
        assert_eq!(r.all_curseforge_ids, vec!["minecraft-cf", "tconstruct-cf", "create-cf"]);
    }

    #[test]
    fn test_versions_of_one_mod_collapse() {
        let rows = vec![
            row(5, "Gear", "齿轮", Some("create"), "0.5", -1.0),
            row(2, "Gear", "齿轮", Some("create"), "0.4", -1.0),
            row(9, "Gear", "齿轮", None, "", -1.0),
        ];
        let results = aggregate(rows, Column::OriginName, "gear");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].all_mods, vec!["create (0.4, 0.5)", "unknown (N/A)"]);
        assert_eq!(results[0].all_keys, vec!["key.2", "key.5", "key.9"]);
        assert_eq!(results[0].frequency, 3);
    }

    #[test]
    fn test_weights_and_ordering() {
        let rows = vec![
            row(1, "torchlight", "火炬光", Some("a"), "1", -1.0),
            row(2, "torch", "火把", Some("a"), "1", -1.0),
            row(3, "stone torch", "石火把", Some("a"), "1", -3.0),
            row(4, "torch holder", "火把架", Some("a"), "1", -0.5),
            row(5, "torch holder", "火把架", Some("b"), "1", -0.5),
        ];
        let results = aggregate(rows, Column::OriginName, "torch");
        let order: Vec<(&str, u8)> = results.iter().map(|r| (r.origin_name.as_str(), r.match_weight)).collect();
        assert_eq!(order, vec![
            ("torch", 3),
            ("stone torch", 2),
            ("torch holder", 1),
            ("torchlight", 1),
        ]);
        assert_eq!(results[2].frequency, 2);
    }

    #[test]
    fn test_exact_rows_always_first() {
        let rows = vec![
            row(1, "Torch", "火把", Some("a"), "1", -0.1),
            row(2, "torches", "火把们", Some("a"), "1", -9.0),
        ];
        let results = aggregate(rows, Column::OriginName, "torch");
        assert_eq!(results[0].origin_name, "Torch");
        assert_eq!(results[0].match_weight, WEIGHT_EXACT);
        assert_eq!(results[1].match_weight, WEIGHT_TOP_RANK);
    }

    #[test]
    fn test_exact_against_trans_column() {
        let rows = vec![row(1, "Torch", "火把", Some("a"), "1", -1.0)];
        let results = aggregate(rows, Column::TransName, "火把");
        assert_eq!(results[0].match_weight, WEIGHT_EXACT);
    }

    #[test]
    fn test_aggregation_ignores_input_order() {
        let rows = vec![
            row(1, "torch", "火把", Some("minecraft"), "1.20", -2.0),
            row(2, "torch", "火炬", Some("create"), "0.5", -2.0),
            row(3, "torch", "火把", Some("create"), "0.5", -2.0),
            row(4, "redstone torch", "红石火把", Some("minecraft"), "1.20", -1.0),
            row(5, "torch", "火把", Some("minecraft"), "1.19", -2.0),
        ];
        let expected = aggregate(rows.clone(), Column::OriginName, "torch");

        let mut reversed = rows.clone();
        reversed.reverse();
        assert_eq!(aggregate(reversed, Column::OriginName, "torch"), expected);

        let mut rotated = rows;
        rotated.rotate_left(2);
        assert_eq!(aggregate(rotated, Column::OriginName, "torch"), expected);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(Vec::new(), Column::OriginName, "x").is_empty());
    }
}
