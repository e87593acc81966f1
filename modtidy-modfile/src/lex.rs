//! Line tokenizer.

use crate::error::ModFileError;

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct LexedLine {
    pub tokens: Vec<String>,
    /// Trailing `//` comment, trimmed, including the slashes.
    pub comment: Option<String>,
}

/// Split one physical line into tokens and an optional trailing comment.
///
/// Tokens are whitespace separated; double- and back-quoted strings are a
/// single token even when they contain spaces. `//` starts a comment only at
/// the beginning of a token.
pub(crate) fn lex_line(text: &str, line: usize) -> Result<LexedLine, ModFileError> {
    let mut out = LexedLine::default();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        if rest.starts_with("//") {
            out.comment = Some(rest.trim_end().to_string());
            break;
        }
        let end = match rest.as_bytes()[0] {
            b'"' => quoted_end(rest, '"', line)?,
            b'`' => quoted_end(rest, '`', line)?,
            _ => rest.find(char::is_whitespace).unwrap_or(rest.len()),
        };
        out.tokens.push(rest[..end].to_string());
        rest = rest[end..].trim_start();
    }

    Ok(out)
}

fn quoted_end(s: &str, quote: char, line: usize) -> Result<usize, ModFileError> {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        if quote == '"' && c == '\\' {
            escaped = true;
            continue;
        }
        if c == quote {
            return Ok(i + c.len_utf8());
        }
    }
    Err(ModFileError::syntax(line, "unterminated quoted string"))
}

/// Strip quoting from a path token.
pub(crate) fn unquote(token: &str) -> String {
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        let inner = &token[1..token.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\'
                && let Some(next) = chars.next()
            {
                out.push(next);
            } else {
                out.push(c);
            }
        }
        return out;
    }
    if token.len() >= 2 && token.starts_with('`') && token.ends_with('`') {
        return token[1..token.len() - 1].to_string();
    }
    token.to_string()
}

/// Quote a path only when it could not be read back as a single bare token.
pub(crate) fn auto_quote(path: &str) -> String {
    let needs_quotes = path.is_empty()
        || path.contains("//")
        || path
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '`' | '(' | ')' | ','));
    if !needs_quotes {
        return path.to_string();
    }
    let escaped = path.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
