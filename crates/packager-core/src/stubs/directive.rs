//! Directive resolution inside stub content
//!
//! Three directives are recognized:
//!
//! - `{{@import <piece> @import}}` or `{{@import <piece>|<resource> @import}}`
//!   replaces the whole line with the resolved `pieces/<piece>` stub. The
//!   conditional form only imports when the package has `<resource>`.
//! - `{{@package <field> @package}}` is replaced with a package field.
//! - `{{@callback <expr> @callback}}` is replaced with the result of a
//!   callback expression (see [`super::callback`]).
//!
//! Directives are handled in one left-to-right pass. Imported content is
//! fully resolved before it is spliced in, and scanning resumes after it.

use super::callback;
use super::{StubSet, TemplateContext};
use crate::error::{PackagerError, Result};
use crate::fs::Filesystem;
use crate::resource::ResourceKind;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::debug;

/// Folder (inside each stub folder) holding importable pieces
pub const PIECES_DIR: &str = "pieces";

/// Deepest allowed chain of nested imports
pub const MAX_IMPORT_DEPTH: usize = 32;

fn directive_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(concat!(
            r"(?P<import>[ \t]*\{\{@import[ \t]+(?P<target>.*?)[ \t]+@import\}\}[ \t]*\r?\n?)",
            r"|(?P<package>\{\{@package[ \t]+(?P<field>.*?)[ \t]+@package\}\})",
            r"|(?P<callback>(?s:\{\{@callback\s*(?P<code>.*?)\s*@callback\}\}))",
        ))
        .expect("Invalid regex")
    })
}

/// A callback that was evaluated while resolving content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTrace {
    pub expression: String,
    pub output: String,
}

/// Resolves directives against one package
pub struct DirectiveEngine<'a, F: Filesystem + ?Sized> {
    stubs: &'a StubSet<'a, F>,
    context: TemplateContext<'a>,
    traces: Vec<CallbackTrace>,
}

impl<'a, F: Filesystem + ?Sized> DirectiveEngine<'a, F> {
    pub fn new(stubs: &'a StubSet<'a, F>, context: TemplateContext<'a>) -> Self {
        Self {
            stubs,
            context,
            traces: Vec::new(),
        }
    }

    /// Resolve every directive in `content`
    pub fn resolve(&mut self, content: &str) -> Result<String> {
        self.resolve_nested(content, 0)
    }

    /// Callbacks evaluated since the last call
    pub fn take_traces(&mut self) -> Vec<CallbackTrace> {
        std::mem::take(&mut self.traces)
    }

    fn resolve_nested(&mut self, content: &str, depth: usize) -> Result<String> {
        let mut out = String::with_capacity(content.len());
        let mut last = 0;

        for caps in directive_regex().captures_iter(content) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&content[last..whole.start()]);
            out.push_str(&self.replacement(&caps, depth)?);
            last = whole.end();
        }

        out.push_str(&content[last..]);
        Ok(out)
    }

    fn replacement(&mut self, caps: &Captures<'_>, depth: usize) -> Result<String> {
        if let Some(target) = caps.name("target") {
            return self.import(target.as_str().trim(), depth);
        }
        if let Some(field) = caps.name("field") {
            return self.context.package.field(field.as_str().trim());
        }
        if let Some(code) = caps.name("code") {
            return self.callback(code.as_str());
        }
        unreachable!("directive regex matched without a known group")
    }

    fn import(&mut self, target: &str, depth: usize) -> Result<String> {
        let piece = match target.split_once('|') {
            Some((piece, condition)) => {
                let condition = condition.trim();
                let wanted = condition
                    .parse::<ResourceKind>()
                    .map(|kind| self.context.package.has_resource(kind))
                    .unwrap_or(false);
                if !wanted {
                    debug!(piece, condition, "skipping conditional import");
                    return Ok(String::new());
                }
                piece.trim()
            }
            None => target,
        };

        if depth >= MAX_IMPORT_DEPTH {
            return Err(PackagerError::ImportDepthExceeded(piece.to_string()));
        }

        let name = format!("{}/{}", PIECES_DIR, piece);
        match self.stubs.load(&name)? {
            Some(content) => self.resolve_nested(&content, depth + 1),
            None => Ok(String::new()),
        }
    }

    fn callback(&mut self, code: &str) -> Result<String> {
        let expr = callback::parse(code)?;
        let output = callback::evaluate(&expr, &self.context)?;
        self.traces.push(CallbackTrace {
            expression: code.trim().to_string(),
            output: output.clone(),
        });
        Ok(output)
    }
}
