//! Query highlighting for result text / 搜索词高亮

use regex::RegexBuilder;

use crate::search::{tokenize, TokenKind};

const HIGHLIGHT_OPEN: &str = "<span class=\"highlight\">";
const HIGHLIGHT_CLOSE: &str = "</span>";

/// HTML-escape `& < > " '` / HTML 转义
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape `text` and wrap the parts matched by `raw_query` / 转义并高亮匹配部分
///
/// Text containing any excluded term comes back escaped but unhighlighted.
pub fn highlight(text: &str, raw_query: &str) -> String {
    let tokens = tokenize(raw_query);
    if text.is_empty() || tokens.is_empty() {
        return escape_html(text);
    }

    let lowered = text.to_lowercase();
    if tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Exclude)
        .any(|t| lowered.contains(&t.value.to_lowercase()))
    {
        return escape_html(text);
    }

    let patterns: Vec<String> = tokens
        .iter()
        .filter_map(|t| {
            let literal = regex::escape(&t.value);
            match t.kind {
                TokenKind::Exclude => None,
                TokenKind::Prefix => Some(format!("{}\\w*", literal)),
                TokenKind::Expand => Some(format!("{}\\w+", literal)),
                TokenKind::Word | TokenKind::Phrase => Some(literal),
            }
        })
        .collect();
    if patterns.is_empty() {
        return escape_html(text);
    }

    let re = match RegexBuilder::new(&format!("({})", patterns.join("|")))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!("highlight pattern rejected for {:?}: {}", raw_query, e);
            return escape_html(text);
        }
    };

    let mut out = String::with_capacity(text.len() + 32);
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.as_str().is_empty() {
            continue;
        }
        out.push_str(&escape_html(&text[last..m.start()]));
        out.push_str(HIGHLIGHT_OPEN);
        out.push_str(&escape_html(m.as_str()));
        out.push_str(HIGHLIGHT_CLOSE);
        last = m.end();
    }
    out.push_str(&escape_html(&text[last..]));
    out
}
