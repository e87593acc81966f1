use crate::error::ModFileError;
use crate::lex::{auto_quote, unquote};
use crate::syntax::{self, Block, Line, SORTED_BLOCKS, Stmt};
use crate::version::check_version;
use std::collections::{HashMap, HashSet};

const INDIRECT: &str = "// indirect";

/// A parsed manifest.
///
/// Mutations work on this private tree only; callers that need several
/// independent edits of the same text should parse one `ModFile` per edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModFile {
    stmts: Vec<Stmt>,
}

/// A `require` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub path: String,
    pub version: String,
    pub indirect: bool,
}

impl ModFile {
    pub fn parse(content: &str) -> Result<Self, ModFileError> {
        Ok(Self {
            stmts: syntax::parse(content)?,
        })
    }

    /// Canonical text of the tree. Formatting the result again is a no-op.
    pub fn format(&self) -> String {
        syntax::format(&self.stmts)
    }

    pub fn module_path(&self) -> Option<String> {
        self.entries("module")
            .first()
            .and_then(|(args, _)| args.first())
            .map(|t| unquote(t))
    }

    pub fn go_version(&self) -> Option<&str> {
        self.stmts.iter().find_map(|stmt| match stmt {
            Stmt::Line(line) if line.verb() == Some("go") => {
                line.tokens.get(1).map(String::as_str)
            }
            _ => None,
        })
    }

    /// All requirements in file order.
    pub fn requires(&self) -> Vec<Require> {
        self.entries("require")
            .into_iter()
            .map(|(args, suffix)| Require {
                path: unquote(&args[0]),
                version: args[1].clone(),
                indirect: suffix.is_some_and(is_indirect),
            })
            .collect()
    }

    pub fn require(&self, path: &str) -> Option<Require> {
        self.requires().into_iter().find(|r| r.path == path)
    }

    /// Set the required version of `path`.
    ///
    /// An existing requirement is updated in place and any later duplicates
    /// are dropped. Otherwise the entry joins the last `require` block; a
    /// single-line `require` is turned into a block holding both entries, and
    /// with no `require` at all a new directive is appended.
    pub fn add_require(&mut self, path: &str, version: &str) -> Result<(), ModFileError> {
        validate_path(path)?;
        check_version(version)?;

        let mut seen = false;
        self.retain_entries("require", |line, offset| {
            if unquote(&line.tokens[offset]) != path {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            line.tokens[offset + 1] = version.to_string();
            true
        });

        if !seen {
            self.add_new_require(path, version);
        }
        Ok(())
    }

    /// Mark or unmark `path` as an indirect requirement. Returns false when
    /// the manifest does not require `path`.
    pub fn set_indirect(&mut self, path: &str, indirect: bool) -> bool {
        let mut found = false;
        self.retain_entries("require", |line, offset| {
            if unquote(&line.tokens[offset]) == path {
                found = true;
                line.suffix = with_indirect(line.suffix.take(), indirect);
            }
            true
        });
        found
    }

    /// Remove every requirement of `path`. Returns true if anything was removed.
    pub fn drop_require(&mut self, path: &str) -> bool {
        let mut dropped = false;
        self.retain_entries("require", |line, offset| {
            let keep = unquote(&line.tokens[offset]) != path;
            dropped |= !keep;
            keep
        });
        self.stmts.retain(|stmt| {
            !matches!(stmt, Stmt::Block(b)
                if b.verb == "require"
                    && b.lines.is_empty()
                    && b.trailing.iter().all(String::is_empty))
        });
        dropped
    }

    /// Drop duplicate requirements (the last one wins) and duplicate
    /// excludes, then sort the entries of every require, exclude and replace
    /// block. Sorting is stable and compares entries token by token.
    pub fn sort_blocks(&mut self) {
        self.remove_duplicates();
        for stmt in &mut self.stmts {
            if let Stmt::Block(block) = stmt
                && SORTED_BLOCKS.contains(&block.verb.as_str())
            {
                block.lines.sort_by(|a, b| a.tokens.cmp(&b.tokens));
            }
        }
    }

    fn remove_duplicates(&mut self) {
        let mut remaining: HashMap<String, usize> = HashMap::new();
        for (args, _) in self.entries("require") {
            *remaining.entry(unquote(&args[0])).or_default() += 1;
        }
        self.retain_entries("require", |line, offset| {
            match remaining.get_mut(&unquote(&line.tokens[offset])) {
                Some(count) => {
                    *count -= 1;
                    *count == 0
                }
                None => true,
            }
        });

        let mut excluded = HashSet::new();
        self.retain_entries("exclude", |line, offset| {
            excluded.insert((
                unquote(&line.tokens[offset]),
                line.tokens[offset + 1].clone(),
            ))
        });
    }

    fn add_new_require(&mut self, path: &str, version: &str) {
        let entry = Line::new(vec![auto_quote(path), version.to_string()], None);

        let last = self.stmts.iter().rposition(|s| s.is_directive("require"));
        if let Some(idx) = last {
            let converted = match &mut self.stmts[idx] {
                Stmt::Block(block) => {
                    block.lines.push(entry);
                    return;
                }
                Stmt::Line(line) => {
                    let existing = Line::new(line.tokens[1..].to_vec(), line.suffix.take());
                    Block::new("require", vec![existing, entry])
                }
                _ => return,
            };
            self.stmts[idx] = Stmt::Block(converted);
            return;
        }

        if !matches!(self.stmts.last(), None | Some(Stmt::Blank)) {
            self.stmts.push(Stmt::Blank);
        }
        let mut tokens = vec!["require".to_string()];
        tokens.extend(entry.tokens);
        self.stmts.push(Stmt::Line(Line::new(tokens, None)));
    }

    /// Arguments and trailing comment of every `verb` entry, in file order.
    fn entries(&self, verb: &str) -> Vec<(&[String], Option<&str>)> {
        let mut out = Vec::new();
        for stmt in &self.stmts {
            match stmt {
                Stmt::Line(line) if line.verb() == Some(verb) => {
                    out.push((&line.tokens[1..], line.suffix.as_deref()));
                }
                Stmt::Block(block) if block.verb == verb => {
                    out.extend(
                        block
                            .lines
                            .iter()
                            .map(|l| (l.tokens.as_slice(), l.suffix.as_deref())),
                    );
                }
                _ => {}
            }
        }
        out
    }

    /// Visit every `verb` entry in file order, dropping those for which
    /// `keep` returns false. `keep` receives the index of the first argument
    /// token (1 for single-line directives, 0 inside blocks).
    fn retain_entries(&mut self, verb: &str, mut keep: impl FnMut(&mut Line, usize) -> bool) {
        self.stmts.retain_mut(|stmt| match stmt {
            Stmt::Line(line) if line.verb() == Some(verb) => keep(line, 1),
            Stmt::Block(block) if block.verb == verb => {
                block.lines.retain_mut(|l| keep(l, 0));
                true
            }
            _ => true,
        });
    }
}

fn validate_path(path: &str) -> Result<(), ModFileError> {
    if path.trim().is_empty() || path.contains('\n') {
        return Err(ModFileError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(())
}

fn is_indirect(comment: &str) -> bool {
    comment == INDIRECT || comment.starts_with("// indirect;")
}

fn with_indirect(suffix: Option<String>, indirect: bool) -> Option<String> {
    match (suffix, indirect) {
        (None, true) => Some(INDIRECT.to_string()),
        (Some(c), true) if !is_indirect(&c) => Some(format!(
            "{INDIRECT}; {}",
            c.trim_start_matches('/').trim_start()
        )),
        (Some(c), false) if c == INDIRECT => None,
        (Some(c), false) if is_indirect(&c) => {
            let rest = c["// indirect;".len()..].trim_start();
            Some(format!("// {rest}"))
        }
        (suffix, _) => suffix,
    }
}
