//! Callback expressions: a small call language evaluated against a fixed
//! function registry
//!
//! ```text
//! expr := string | word | word '(' [expr (',' expr)*] ')'
//! ```
//!
//! Strings are single- or double-quoted. A bare word that is not followed by
//! `(` is a literal. Functions only see the creation context, so a template
//! can read package information and planned paths but nothing else.

use super::TemplateContext;
use crate::error::{PackagerError, Result};
use crate::package::case;
use crate::resource::ResourceKind;
use chrono::Datelike;
use std::path::Path;

/// Parsed callback expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(String),
    Call { name: String, args: Vec<Expr> },
}

/// Parse a callback body
pub fn parse(source: &str) -> Result<Expr> {
    let mut parser = Parser {
        source,
        chars: source.chars().collect(),
        position: 0,
    };

    let expr = parser.parse_expr()?;
    parser.skip_whitespace();
    if parser.peek() == Some(';') {
        parser.position += 1;
        parser.skip_whitespace();
    }
    if parser.position < parser.chars.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    position: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> PackagerError {
        PackagerError::InvalidCallback {
            expression: self.source.trim().to_string(),
            reason: format!("{} at offset {}", reason, self.position),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.skip_whitespace();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.parse_string(quote).map(Expr::Literal),
            Some(_) => {
                let word = self.parse_word();
                if word.is_empty() {
                    return Err(self.error("expected a value"));
                }
                self.skip_whitespace();
                if self.peek() == Some('(') {
                    self.position += 1;
                    let args = self.parse_args()?;
                    Ok(Expr::Call { name: word, args })
                } else {
                    Ok(Expr::Literal(word))
                }
            }
            None => Err(self.error("empty expression")),
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String> {
        self.position += 1;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.position += 1;
            match c {
                '\\' => match self.peek() {
                    Some(next) if next == quote || next == '\\' => {
                        out.push(next);
                        self.position += 1;
                    }
                    _ => out.push('\\'),
                },
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn parse_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | ',' | ';' | '"' | '\'') {
                break;
            }
            word.push(c);
            self.position += 1;
        }
        word
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.position += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.position += 1,
                Some(')') => {
                    self.position += 1;
                    return Ok(args);
                }
                _ => return Err(self.error("expected ',' or ')'")),
            }
        }
    }
}

type TemplateFunction = fn(&TemplateContext<'_>, &[String]) -> Result<String>;

#[derive(Debug, Clone, Copy)]
enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }

    fn describe(&self) -> String {
        match *self {
            Arity::Exactly(n) => format!("exactly {}", n),
            Arity::AtLeast(n) => format!("at least {}", n),
        }
    }
}

/// The fixed function registry
fn lookup(name: &str) -> Option<(Arity, TemplateFunction)> {
    let entry: (Arity, TemplateFunction) = match name {
        "package" => (Arity::Exactly(1), |ctx, args| ctx.package.field(&args[0])),
        "json" => (Arity::Exactly(1), json),
        "has_resource" => (Arity::Exactly(1), |ctx, args| {
            let kind: ResourceKind = args[0].parse()?;
            Ok(ctx.package.has_resource(kind).to_string())
        }),
        "when" => (Arity::Exactly(2), |ctx, args| {
            let kind: ResourceKind = args[0].parse()?;
            Ok(if ctx.package.has_resource(kind) {
                args[1].clone()
            } else {
                String::new()
            })
        }),
        "resource_namespace" => (Arity::Exactly(1), |ctx, args| {
            let kind = requested(ctx, &args[0])?;
            Ok(ctx
                .layout
                .resource_namespace(kind, &ctx.package.namespace())?
                .unwrap_or_default())
        }),
        "resource_name" => (Arity::Exactly(1), |ctx, args| {
            let path = resource_file(ctx, &args[0])?;
            Ok(file_part(&path, Path::file_stem))
        }),
        "resource_basename" => (Arity::Exactly(1), |ctx, args| {
            let path = resource_file(ctx, &args[0])?;
            Ok(file_part(&path, Path::file_name))
        }),
        "resource_path" => (Arity::Exactly(1), |ctx, args| {
            let path = resource_file(ctx, &args[0])?;
            ctx.paths.relative_to_storage(&path)
        }),
        "resource_dir" => (Arity::Exactly(1), |ctx, args| {
            let kind = requested(ctx, &args[0])?;
            let dir = ctx.layout.dir(kind).unwrap_or_else(|| ctx.paths.storage());
            ctx.paths.relative_to_storage(dir)
        }),
        "provider_path" => (Arity::Exactly(1), |ctx, args| {
            let path = resource_file(ctx, &args[0])?;
            ctx.paths.relative_to_namespace(&path)
        }),
        "provider_dir" => (Arity::Exactly(1), |ctx, args| {
            let kind = requested(ctx, &args[0])?;
            let dir = ctx.layout.dir(kind).unwrap_or_else(|| ctx.paths.storage());
            ctx.paths.relative_to_namespace(dir)
        }),
        "namespace_dir" => (Arity::Exactly(0), |ctx, _| {
            ctx.paths.relative_to_storage(&ctx.paths.namespace())
        }),
        "src_dir" => (Arity::Exactly(0), |ctx, _| {
            ctx.paths.relative_to_storage(&ctx.paths.src())
        }),
        "tests_dir" => (Arity::Exactly(0), |ctx, _| {
            ctx.paths.relative_to_storage(&ctx.paths.tests())
        }),
        "lower" => (Arity::Exactly(1), |_, args| Ok(args[0].to_lowercase())),
        "upper" => (Arity::Exactly(1), |_, args| Ok(args[0].to_uppercase())),
        "snake" => (Arity::Exactly(1), |_, args| Ok(case::snake(&args[0]))),
        "studly" => (Arity::Exactly(1), |_, args| Ok(case::studly(&args[0]))),
        "camel" => (Arity::Exactly(1), |_, args| Ok(case::camel(&args[0]))),
        "kebab" => (Arity::Exactly(1), |_, args| Ok(case::kebab(&args[0]))),
        "title" => (Arity::Exactly(1), |_, args| Ok(case::title(&args[0]))),
        "concat" => (Arity::AtLeast(0), |_, args| Ok(args.concat())),
        "join" => (Arity::AtLeast(1), |_, args| Ok(args[1..].join(&args[0]))),
        "year" => (Arity::Exactly(0), |ctx, _| Ok(ctx.created_at.year().to_string())),
        _ => return None,
    };
    Some(entry)
}

fn json(ctx: &TemplateContext<'_>, args: &[String]) -> Result<String> {
    let encoded = match ctx.package.original(&args[0]) {
        Some(value) => serde_json::to_string(value)?,
        None => serde_json::to_string(&ctx.package.field(&args[0])?)?,
    };
    Ok(encoded)
}

/// Resolve a resource tag that must be part of the package
fn requested(ctx: &TemplateContext<'_>, tag: &str) -> Result<ResourceKind> {
    let kind: ResourceKind = tag.parse()?;
    if ctx.layout.dir(kind).is_none() {
        return Err(PackagerError::InvalidCallback {
            expression: tag.to_string(),
            reason: "resource was not requested for this package".to_string(),
        });
    }
    Ok(kind)
}

fn resource_file(ctx: &TemplateContext<'_>, tag: &str) -> Result<std::path::PathBuf> {
    let kind = requested(ctx, tag)?;
    ctx.layout
        .file_path(kind, ctx.package, &ctx.timestamp())
        .ok_or_else(|| PackagerError::UnknownResourceKind(tag.to_string()))
}

fn file_part<'p>(path: &'p Path, part: fn(&'p Path) -> Option<&'p std::ffi::OsStr>) -> String {
    part(path)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Evaluate an expression; arguments are evaluated before the call
pub fn evaluate(expr: &Expr, ctx: &TemplateContext<'_>) -> Result<String> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Call { name, args } => {
            let (arity, function) =
                lookup(name).ok_or_else(|| PackagerError::UnknownFunction(name.clone()))?;

            if !arity.accepts(args.len()) {
                return Err(PackagerError::InvalidCallback {
                    expression: name.clone(),
                    reason: format!("{} arguments expected, got {}", arity.describe(), args.len()),
                });
            }

            let values = args
                .iter()
                .map(|arg| evaluate(arg, ctx))
                .collect::<Result<Vec<_>>>()?;

            function(ctx, &values)
        }
    }
}
