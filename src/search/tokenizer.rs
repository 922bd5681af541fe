//! Query tokenizer - splits a raw search string into typed tokens / 查询分词器
//!
//! Syntax / 语法：
//! - `"a b"`  phrase, matched as one unit / 短语
//! - `-word`  exclude / 排除
//! - `word*`  prefix / 前缀
//! - `word+`  expand (prefix, but not the bare stem) / 扩展
//! - `word`   plain word / 普通词

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Quoted run or bare non-whitespace run / 引号短语或连续非空白字符
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""([^"]+)"|(\S+)"#).expect("token pattern is valid")
});

/// Token kind / 词元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Word,
    Phrase,
    Prefix,
    Exclude,
    Expand,
}

/// A single query token, markers already stripped / 单个词元（已去除标记符）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self { kind, value: value.into() }
    }

    /// Whether this token removes rows instead of selecting them / 是否为排除型词元
    pub fn is_negative(&self) -> bool {
        self.kind == TokenKind::Exclude
    }
}

/// Tokenize a raw query, preserving source order / 对查询进行分词，保持原始顺序
///
/// Tokens that are empty once their marker is stripped (a lone `-`, `*` or `+`)
/// are dropped.
pub fn tokenize(raw: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for caps in TOKEN_RE.captures_iter(raw) {
        let token = if let Some(phrase) = caps.get(1) {
            Token::new(TokenKind::Phrase, phrase.as_str())
        } else if let Some(bare) = caps.get(2) {
            classify(bare.as_str())
        } else {
            continue;
        };

        if token.value.is_empty() {
            continue;
        }
        tokens.push(token);
    }

    tokens
}

/// Classify a bare run by its marker / 根据标记符判断词元类型
fn classify(bare: &str) -> Token {
    if let Some(rest) = bare.strip_prefix('-') {
        Token::new(TokenKind::Exclude, rest)
    } else if let Some(stem) = bare.strip_suffix('*') {
        Token::new(TokenKind::Prefix, stem)
    } else if let Some(stem) = bare.strip_suffix('+') {
        Token::new(TokenKind::Expand, stem)
    } else {
        Token::new(TokenKind::Word, bare)
    }
}

/// Check if text contains CJK characters (Chinese, Japanese, Korean) / 检测文本是否包含CJK字符
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{4e00}'..='\u{9fff}' |  // CJK Unified Ideographs
            '\u{3400}'..='\u{4dbf}' |  // CJK Extension A
            '\u{f900}'..='\u{faff}' |  // CJK Compatibility Ideographs
            '\u{3040}'..='\u{309f}' |  // Hiragana
            '\u{30a0}'..='\u{30ff}' |  // Katakana
            '\u{ac00}'..='\u{d7af}'    // Hangul Syllables
        )
    })
}

/// Normalize the raw query into the exact-match key / 标准化为精确匹配键
///
/// Trimmed and lower-cased; inner whitespace is left alone so it compares
/// against the stored term verbatim.
pub fn normalize_exact(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_plain_words() {
        let tokens = tokenize("iron ingot");
        assert_eq!(tokens, vec![
            Token::new(TokenKind::Word, "iron"),
            Token::new(TokenKind::Word, "ingot"),
        ]);
    }

    #[test]
    fn test_tokenize_markers() {
        let tokens = tokenize(r#"-llo tor* gear+ "iron ingot" he"#);
        assert_eq!(kinds(&tokens), vec![
            TokenKind::Exclude,
            TokenKind::Prefix,
            TokenKind::Expand,
            TokenKind::Phrase,
            TokenKind::Word,
        ]);
        assert_eq!(tokens[0].value, "llo");
        assert_eq!(tokens[1].value, "tor");
        assert_eq!(tokens[2].value, "gear");
        assert_eq!(tokens[3].value, "iron ingot");
    }

    #[test]
    fn test_exclude_wins_over_suffix_markers() {
        // 前导 - 优先于尾部 * 判断
        let tokens = tokenize("-tor*");
        assert_eq!(tokens, vec![Token::new(TokenKind::Exclude, "tor*")]);
    }

    #[test]
    fn test_hyphen_inside_word_is_not_exclude() {
        let tokens = tokenize("he-llo");
        assert_eq!(tokens, vec![Token::new(TokenKind::Word, "he-llo")]);
    }

    #[test]
    fn test_lone_markers_are_dropped() {
        assert!(tokenize("- * +").is_empty());
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_unclosed_quote_is_bare() {
        let tokens = tokenize(r#""torch"#);
        assert_eq!(tokens, vec![Token::new(TokenKind::Word, "\"torch")]);
    }

    #[test]
    fn test_tokenize_is_deterministic() {
        let q = r#"火把 -红石 "iron ingot" gear+"#;
        assert_eq!(tokenize(q), tokenize(q));
    }

    #[test]
    fn test_contains_cjk() {
        assert!(contains_cjk("火把"));
        assert!(contains_cjk("torch火把"));
        assert!(contains_cjk("たいまつ"));
        assert!(!contains_cjk("torch"));
    }

    #[test]
    fn test_normalize_exact() {
        assert_eq!(normalize_exact("  Iron Ingot "), "iron ingot");
    }
}
