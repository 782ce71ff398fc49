// src/exec/expand.rs

//! Command template expansion.
//!
//! A rule's command is a template in which `$` introduces a token:
//!
//! - `$$` a literal `$`
//! - `$@` the watched path of the rule
//! - `$#` the file name reported with the event
//! - `$%` the event type names, e.g. `IN_CLOSE_WRITE,IN_ISDIR`
//! - `$&` the event type bits as an unsigned decimal number
//!
//! An unrecognised character after `$` drops the `$` and keeps the character.
//! A `$` at the very end of the template is kept as is.

use std::borrow::Cow;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::exec::tokenize::tokenize;
use crate::types::EventMask;

const MARKER: char = '$';

/// Everything a template can refer to.
#[derive(Debug, Clone, Copy)]
pub struct ExpandContext<'a> {
    pub watch_path: &'a Path,
    pub name: &'a str,
    pub mask: EventMask,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    #[error("command template is empty")]
    EmptyTemplate,

    #[error("command expands to no arguments")]
    EmptyCommand,
}

/// Substitute every recognised token in `template`.
pub fn expand(template: &str, ctx: &ExpandContext<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != MARKER {
            out.push(c);
            continue;
        }

        let Some(&token) = chars.peek() else {
            out.push(MARKER);
            break;
        };

        match token {
            MARKER => out.push(MARKER),
            '@' => {
                let path = ctx.watch_path.to_string_lossy();
                if let Cow::Owned(_) = path {
                    debug!(path = ?ctx.watch_path, "watched path is not valid UTF-8; replaced lossily");
                }
                out.push_str(&path);
            }
            '#' => out.push_str(ctx.name),
            '%' => out.push_str(&ctx.mask.symbolic()),
            '&' => out.push_str(&ctx.mask.bits().to_string()),
            // Drop the marker only; the token is emitted on the next turn.
            _ => continue,
        }
        chars.next();
    }

    out
}

/// An expanded command line together with its argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub line: String,
    pub argv: Vec<String>,
}

/// Expand `template` and split the result into an argument vector.
pub fn prepare_command(
    template: &str,
    ctx: &ExpandContext<'_>,
) -> Result<PreparedCommand, ExpandError> {
    if template.is_empty() {
        return Err(ExpandError::EmptyTemplate);
    }

    let line = expand(template, ctx);
    let argv = tokenize(&line);
    if argv.is_empty() {
        return Err(ExpandError::EmptyCommand);
    }

    Ok(PreparedCommand { line, argv })
}
