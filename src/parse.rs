//! Line-oriented source reader producing [`Item`]s.
//!
//! One statement per line. `;`, `//` and a leading `#` start comments.

use crate::assembler::{Directive, Item, Operation};
use crate::error::{Error, Result};
use crate::resolve::is_ident;

fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    let end = [line.find(';'), line.find("//")].into_iter().flatten().min().unwrap_or(line.len());
    line[..end].trim()
}

fn split_args(rest: &str) -> Vec<String> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Vec::new();
    }
    rest.split(',').map(|a| a.trim().to_string()).collect()
}

/// Parses one source line; `line_no` is 1-based and only used for errors.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Item>> {
    let s = strip_comment(line);
    if s.is_empty() {
        return Ok(None);
    }
    let bad = |message: String| Error::Parse { line: line_no, message };

    if let Some(name) = s.strip_suffix(':') {
        let name = name.trim();
        if !is_ident(name) {
            return Err(bad(format!("bad label name `{name}`")));
        }
        return Ok(Some(Item::Label(name.to_string())));
    }

    let (head, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
    let args = split_args(rest);
    if args.iter().any(|a| a.is_empty()) {
        return Err(bad(format!("empty argument in `{s}`")));
    }
    let dir = match head {
        ".eop" => {
            if !args.is_empty() {
                return Err(bad(".eop takes no arguments".into()));
            }
            Directive::Eop
        }
        ".attach_to_group" => match args.as_slice() {
            [column] => Directive::AttachToGroup(column.clone()),
            _ => return Err(bad(".attach_to_group takes one argument".into())),
        },
        ".set" => match args.as_slice() {
            [name, value] => Directive::Set { name: name.clone(), value: value.clone() },
            _ => return Err(bad(".set takes a name and a value".into())),
        },
        _ => return Ok(Some(Item::Op(Operation { name: head.to_string(), args }))),
    };
    Ok(Some(Item::Dir(dir)))
}

pub fn parse_source(src: &str) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    for (i, line) in src.lines().enumerate() {
        if let Some(item) = parse_line(line, i + 1)? {
            items.push(item);
        }
    }
    Ok(items)
}
