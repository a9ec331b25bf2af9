use clap::ValueEnum;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::tokenizer::{Location, Token, Tokenizer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SplitMode {
    /// Split on every `;`, even inside literals and function bodies.
    #[default]
    Naive,
    /// Ignore `;` inside quotes, comments and dollar-quoted bodies.
    Aware,
}

pub fn split_statements(sql: &str, mode: SplitMode) -> Vec<String> {
    let fragments = match mode {
        SplitMode::Naive => sql.split(';').collect::<Vec<_>>(),
        SplitMode::Aware => split_aware(sql),
    };

    fragments
        .into_iter()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty() && !is_comment_only(fragment))
        .map(str::to_string)
        .collect()
}

/// True when nothing but `--` and `/* */` comments remain.
fn is_comment_only(fragment: &str) -> bool {
    let mut rest = fragment.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = match after.find('\n') {
                Some(end) => after[end + 1..].trim_start(),
                None => "",
            };
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = match after.find("*/") {
                Some(end) => after[end + 2..].trim_start(),
                None => "",
            };
        } else {
            return rest.is_empty();
        }
    }
}

// Cuts at every `;` the Postgres tokenizer reports as a statement terminator,
// so quotes, escape strings, comments and dollar-quoted bodies stay intact.
fn split_aware(sql: &str) -> Vec<&str> {
    let tokens = match Tokenizer::new(&PostgreSqlDialect {}, sql).tokenize_with_location() {
        Ok(tokens) => tokens,
        Err(err) => {
            tracing::warn!("Could not tokenize schema ({}), splitting on every ';'", err);
            return sql.split(';').collect();
        }
    };

    let line_starts = line_starts(sql);
    let mut fragments = Vec::new();
    let mut start = 0;

    for token in tokens.iter().filter(|t| t.token == Token::SemiColon) {
        if let Some(end) = byte_offset(sql, &line_starts, token.span.start) {
            fragments.push(&sql[start..end]);
            start = end + 1;
        }
    }

    fragments.push(&sql[start..]);
    fragments
}

fn line_starts(sql: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(sql.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Tokenizer locations are 1-based lines and 1-based columns counted in chars.
fn byte_offset(sql: &str, line_starts: &[usize], location: Location) -> Option<usize> {
    let line = usize::try_from(location.line).ok()?.checked_sub(1)?;
    let column = usize::try_from(location.column).ok()?.checked_sub(1)?;
    let line_start = *line_starts.get(line)?;
    sql[line_start..]
        .char_indices()
        .nth(column)
        .map(|(offset, _)| line_start + offset)
}
