//! Dictionary data model / 词典数据模型

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mod id used when a row has none / 缺失模组ID时的占位
pub const UNKNOWN_MOD: &str = "unknown";
/// Version used when a row has none / 缺失版本时的占位
pub const UNKNOWN_VERSION: &str = "N/A";

/// Searchable column of `dict_fts` / 可搜索列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// Source-language term / 原文
    OriginName,
    /// Translated term / 译文
    TransName,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::OriginName => "origin_name",
            Column::TransName => "trans_name",
        }
    }
}

/// Search direction / 搜索方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SearchMode {
    /// English to Chinese, searches `origin_name` / 英译中
    #[default]
    #[serde(rename = "en2zh")]
    En2Zh,
    /// Chinese to English, searches `trans_name` / 中译英
    #[serde(rename = "zh2en")]
    Zh2En,
}

impl SearchMode {
    /// Parse a mode parameter, `None` if unrecognized / 解析模式参数
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "en2zh" => Some(SearchMode::En2Zh),
            "zh2en" => Some(SearchMode::Zh2En),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::En2Zh => "en2zh",
            SearchMode::Zh2En => "zh2en",
        }
    }

    pub fn column(&self) -> Column {
        match self {
            SearchMode::En2Zh => Column::OriginName,
            SearchMode::Zh2En => Column::TransName,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `dict` row / 词典条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DictionaryEntry {
    pub origin_name: String,
    pub trans_name: String,
    pub modid: Option<String>,
    pub version: Option<String>,
    pub key: Option<String>,
    pub curseforge: Option<String>,
}

impl DictionaryEntry {
    pub fn column(&self, column: Column) -> &str {
        match column {
            Column::OriginName => &self.origin_name,
            Column::TransName => &self.trans_name,
        }
    }

    pub fn mod_id(&self) -> &str {
        match self.modid.as_deref() {
            Some(m) if !m.trim().is_empty() => m,
            _ => UNKNOWN_MOD,
        }
    }
}

/// A matching row as returned by the store / 存储层返回的匹配行
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RawMatch {
    /// `dict.rowid`, stable order key / 行ID
    pub row_id: i64,
    #[sqlx(flatten)]
    pub entry: DictionaryEntry,
    /// FTS5 rank, lower is better / 相关度（越小越好）
    pub rank: f64,
}

/// Aggregated search result / 聚合后的搜索结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub trans_name: String,
    pub origin_name: String,
    /// Raw rows folded into this result / 合并的原始行数
    pub frequency: u32,
    /// `"modId (v1, v2)"` per contributing mod / 每个模组一项
    pub all_mods: Vec<String>,
    pub all_keys: Vec<String>,
    pub all_curseforge_ids: Vec<String>,
    pub match_weight: u8,
}
