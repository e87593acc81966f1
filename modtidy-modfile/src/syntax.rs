//! Syntax tree, parser and canonical printer.

use crate::error::ModFileError;
use crate::lex::{LexedLine, lex_line};
use crate::version::check_version;
use tracing::trace;

/// Directives the parser accepts.
pub(crate) const DIRECTIVES: &[&str] = &[
    "module",
    "go",
    "toolchain",
    "godebug",
    "require",
    "exclude",
    "replace",
    "retract",
];

/// Directives that may use the parenthesized block form.
const BLOCK_DIRECTIVES: &[&str] = &["godebug", "require", "exclude", "replace", "retract"];

/// Blocks whose entries are reordered by `sort_blocks`.
pub(crate) const SORTED_BLOCKS: &[&str] = &["require", "exclude", "replace"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Line {
    pub tokens: Vec<String>,
    /// Full-line comments directly above the entry (block entries only).
    /// An empty string stands for a blank line.
    pub before: Vec<String>,
    pub suffix: Option<String>,
}

impl Line {
    pub fn new(tokens: Vec<String>, suffix: Option<String>) -> Self {
        Self {
            tokens,
            before: Vec::new(),
            suffix,
        }
    }

    pub fn verb(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Block {
    pub verb: String,
    pub open_suffix: Option<String>,
    /// Entries without the verb token.
    pub lines: Vec<Line>,
    /// Comments and blank lines between the last entry and the closing
    /// parenthesis.
    pub trailing: Vec<String>,
    pub close_suffix: Option<String>,
}

impl Block {
    pub fn new(verb: impl Into<String>, lines: Vec<Line>) -> Self {
        Self {
            verb: verb.into(),
            open_suffix: None,
            lines,
            trailing: Vec::new(),
            close_suffix: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Stmt {
    Blank,
    Comment(String),
    /// Top-level directive; `tokens[0]` is the verb.
    Line(Line),
    Block(Block),
}

impl Stmt {
    pub fn is_directive(&self, verb: &str) -> bool {
        match self {
            Stmt::Line(line) => line.verb() == Some(verb),
            Stmt::Block(block) => block.verb == verb,
            _ => false,
        }
    }
}

struct OpenBlock {
    block: Block,
    start_line: usize,
    pending: Vec<String>,
}

pub(crate) fn parse(content: &str) -> Result<Vec<Stmt>, ModFileError> {
    let mut stmts = Vec::new();
    let mut open: Option<OpenBlock> = None;

    for (idx, raw) in content.lines().enumerate() {
        let lineno = idx + 1;
        let LexedLine { tokens, comment } = lex_line(raw, lineno)?;

        if let Some(current) = open.as_mut() {
            if tokens.is_empty() {
                // Blank lines travel with the next entry as empty comments.
                current.pending.push(comment.unwrap_or_default());
                continue;
            }
            if tokens.len() == 1 && tokens[0] == ")" {
                if let Some(mut finished) = open.take() {
                    finished.block.trailing = finished.pending;
                    finished.block.close_suffix = comment;
                    stmts.push(Stmt::Block(finished.block));
                }
                continue;
            }
            reject_parens(&tokens, lineno)?;
            validate_args(&current.block.verb, &tokens, lineno)?;
            let mut line = Line::new(tokens, comment);
            line.before = std::mem::take(&mut current.pending);
            current.block.lines.push(line);
            continue;
        }

        if tokens.is_empty() {
            stmts.push(match comment {
                Some(c) => Stmt::Comment(c),
                None => Stmt::Blank,
            });
            continue;
        }

        let verb = tokens[0].as_str();
        if !DIRECTIVES.contains(&verb) {
            return Err(ModFileError::syntax(
                lineno,
                format!("unknown directive: {verb}"),
            ));
        }

        if tokens.len() == 2 && tokens[1] == "(" {
            if !BLOCK_DIRECTIVES.contains(&verb) {
                return Err(ModFileError::syntax(
                    lineno,
                    format!("{verb} does not take a block"),
                ));
            }
            let mut block = Block::new(verb, Vec::new());
            block.open_suffix = comment;
            open = Some(OpenBlock {
                block,
                start_line: lineno,
                pending: Vec::new(),
            });
            continue;
        }

        reject_parens(&tokens, lineno)?;
        validate_args(verb, &tokens[1..], lineno)?;
        stmts.push(Stmt::Line(Line::new(tokens, comment)));
    }

    if let Some(unclosed) = open {
        return Err(ModFileError::syntax(
            unclosed.start_line,
            format!("unterminated {} block", unclosed.block.verb),
        ));
    }

    trace!(stmts = stmts.len(), "parsed manifest");
    Ok(stmts)
}

fn reject_parens(tokens: &[String], line: usize) -> Result<(), ModFileError> {
    if tokens.iter().any(|t| t == "(" || t == ")") {
        return Err(ModFileError::syntax(line, "unexpected parenthesis"));
    }
    Ok(())
}

fn validate_args(verb: &str, args: &[String], line: usize) -> Result<(), ModFileError> {
    let usage = |text: &str| -> Result<(), ModFileError> {
        Err(ModFileError::syntax(line, format!("usage: {text}")))
    };

    match verb {
        "module" if args.len() != 1 => usage("module module/path"),
        "go" if args.len() != 1 => usage("go 1.23"),
        "toolchain" if args.len() != 1 => usage("toolchain go1.23.1"),
        "require" | "exclude" => {
            if args.len() != 2 {
                return usage(&format!("{verb} module/path v1.2.3"));
            }
            check_version(&args[1]).map_err(|e| ModFileError::syntax(line, e.to_string()))
        }
        "replace" => validate_replace(args, line),
        "retract" | "godebug" if args.is_empty() => usage(&format!("{verb} ...")),
        _ => Ok(()),
    }
}

fn validate_replace(args: &[String], line: usize) -> Result<(), ModFileError> {
    let usage = || {
        ModFileError::syntax(
            line,
            "usage: replace module/path [v1.2.3] => other/module v1.4 | ../local/directory",
        )
    };
    let arrow = args.iter().position(|t| t == "=>").ok_or_else(usage)?;
    let (left, right) = (&args[..arrow], &args[arrow + 1..]);
    if !(1..=2).contains(&left.len()) || !(1..=2).contains(&right.len()) {
        return Err(usage());
    }
    for version in left.get(1).into_iter().chain(right.get(1)) {
        check_version(version).map_err(|e| ModFileError::syntax(line, e.to_string()))?;
    }
    Ok(())
}

/// Print statements in canonical form.
pub(crate) fn format(stmts: &[Stmt]) -> String {
    let mut out = String::new();
    // Suppresses leading blank lines and collapses runs of them.
    let mut after_blank = true;

    for stmt in stmts {
        match stmt {
            Stmt::Blank => {
                if !after_blank {
                    out.push('\n');
                    after_blank = true;
                }
                continue;
            }
            Stmt::Comment(c) => {
                out.push_str(c);
                out.push('\n');
            }
            Stmt::Line(line) => write_line(&mut out, "", &line.tokens, line.suffix.as_deref()),
            Stmt::Block(block) => write_block(&mut out, block),
        }
        after_blank = false;
    }

    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

fn write_line(out: &mut String, indent: &str, tokens: &[String], suffix: Option<&str>) {
    out.push_str(indent);
    out.push_str(&tokens.join(" "));
    if let Some(comment) = suffix {
        if !tokens.is_empty() {
            out.push(' ');
        }
        out.push_str(comment);
    }
    out.push('\n');
}

fn write_block(out: &mut String, block: &Block) {
    out.push_str(&block.verb);
    out.push_str(" (");
    if let Some(comment) = &block.open_suffix {
        out.push(' ');
        out.push_str(comment);
    }
    out.push('\n');

    for line in &block.lines {
        for comment in &line.before {
            write_block_comment(out, comment);
        }
        write_line(out, "\t", &line.tokens, line.suffix.as_deref());
    }
    for comment in &block.trailing {
        write_block_comment(out, comment);
    }

    out.push(')');
    if let Some(comment) = &block.close_suffix {
        out.push(' ');
        out.push_str(comment);
    }
    out.push('\n');
}

fn write_block_comment(out: &mut String, comment: &str) {
    if comment.is_empty() {
        out.push('\n');
    } else {
        write_line(out, "\t", &[], Some(comment));
    }
}
