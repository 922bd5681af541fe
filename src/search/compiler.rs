//! Query compiler - tokens to an FTS5 match expression / 查询编译器
//!
//! The compiler never splices user text into SQL. It produces a structured
//! clause list and renders it into a single FTS5 expression where every user
//! value is an FTS5 string literal. Both the expression and the exact-match
//! term are bound as SQL parameters by the store.
//!
//! FTS5 `NOT` is binary, so positive clauses are rendered first and negative
//! ones after them, each group in token order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::schema::Column;
use super::tokenizer::{contains_cjk, normalize_exact, tokenize, Token, TokenKind};

/// How `stem+` compiles / `stem+` 的编译方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandStyle {
    /// Prefix match AND NOT the bare stem (observed behaviour) / 前缀匹配且排除词干本身
    #[default]
    KeepObserved,
    /// Prefix match only / 仅前缀匹配
    PrefixOnly,
}

/// How `-word` compiles when the word contains CJK / 含CJK排除词的编译方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcludeStyle {
    /// `NOT col : "w"` for every exclude / 一律精确排除
    #[default]
    Exact,
    /// `NOT col : "w" *` when the word contains CJK / CJK词按前缀排除
    CjkPrefix,
}

/// Compiler options / 编译选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    #[serde(default)]
    pub expand: ExpandStyle,
    #[serde(default)]
    pub exclude: ExcludeStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("query produced no search terms")]
    Empty,
    #[error("query must contain at least one term that is not excluded")]
    NoPositiveClause,
}

/// Match pattern of one clause / 单个子句的匹配模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `col : "v"`
    Exact(String),
    /// `col : "v" *`
    Prefix(String),
    /// `(col : "v" OR col : "v" *)`
    ExactOrPrefix(String),
}

/// One AND-ed clause / 一个AND子句
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub negated: bool,
    pub pattern: Pattern,
}

impl Clause {
    fn positive(pattern: Pattern) -> Self {
        Self { negated: false, pattern }
    }

    fn negative(pattern: Pattern) -> Self {
        Self { negated: true, pattern }
    }

    fn render(&self, column: Column) -> String {
        let col = column.as_str();
        let body = match &self.pattern {
            Pattern::Exact(v) => format!("{} : {}", col, fts_string(v)),
            Pattern::Prefix(v) => format!("{} : {} *", col, fts_string(v)),
            Pattern::ExactOrPrefix(v) => {
                let lit = fts_string(v);
                format!("({col} : {lit} OR {col} : {lit} *)")
            }
        };
        if self.negated {
            format!("NOT {}", body)
        } else {
            body
        }
    }
}

/// Quote a value as an FTS5 string literal / 转为FTS5字符串字面量
fn fts_string(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Compiled query / 编译结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// Column the expression targets / 目标列
    pub column: Column,
    /// FTS5 expression, bound as the MATCH parameter / FTS5表达式
    pub expression: String,
    /// Trimmed, lower-cased query for weight-3 matching / 精确匹配词
    pub exact_term: String,
    pub clauses: Vec<Clause>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCompiler {
    options: CompileOptions,
}

impl QueryCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Tokenize and compile a raw query / 分词并编译
    pub fn compile(&self, raw: &str, column: Column) -> Result<CompiledQuery, CompileError> {
        let tokens = tokenize(raw);
        let mut compiled = self.compile_tokens(&tokens, column)?;
        compiled.exact_term = normalize_exact(raw);
        Ok(compiled)
    }

    /// Compile an already tokenized query / 编译已分词的查询
    ///
    /// The exact term is rebuilt from the token values joined by a space;
    /// `compile` replaces it with the normalized raw query.
    pub fn compile_tokens(&self, tokens: &[Token], column: Column) -> Result<CompiledQuery, CompileError> {
        let clauses: Vec<Clause> = tokens.iter().flat_map(|t| self.clauses_for(t)).collect();

        if clauses.is_empty() {
            return Err(CompileError::Empty);
        }
        if clauses.iter().all(|c| c.negated) {
            return Err(CompileError::NoPositiveClause);
        }

        let expression = clauses
            .iter()
            .filter(|c| !c.negated)
            .chain(clauses.iter().filter(|c| c.negated))
            .map(|c| c.render(column))
            .collect::<Vec<_>>()
            .join(" ");

        let joined = tokens.iter().map(|t| t.value.as_str()).collect::<Vec<_>>().join(" ");

        Ok(CompiledQuery {
            column,
            expression,
            exact_term: normalize_exact(&joined),
            clauses,
        })
    }

    fn clauses_for(&self, token: &Token) -> Vec<Clause> {
        let value = token.value.clone();
        match token.kind {
            TokenKind::Word | TokenKind::Phrase => {
                // CJK runs are single tokens in the index, so short runs also need a prefix form
                if contains_cjk(&value) {
                    vec![Clause::positive(Pattern::ExactOrPrefix(value))]
                } else {
                    vec![Clause::positive(Pattern::Exact(value))]
                }
            }
            TokenKind::Prefix => vec![Clause::positive(Pattern::Prefix(value))],
            TokenKind::Exclude => {
                let pattern = match self.options.exclude {
                    ExcludeStyle::CjkPrefix if contains_cjk(&value) => Pattern::Prefix(value),
                    _ => Pattern::Exact(value),
                };
                vec![Clause::negative(pattern)]
            }
            TokenKind::Expand => match self.options.expand {
                ExpandStyle::KeepObserved => vec![
                    Clause::positive(Pattern::Prefix(value.clone())),
                    Clause::negative(Pattern::Exact(value)),
                ],
                ExpandStyle::PrefixOnly => vec![Clause::positive(Pattern::Prefix(value))],
            },
        }
    }
}
