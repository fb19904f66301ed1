//! Argument token -> integer conversion.
//!
//! Accepted forms: `0x` hex, decimal, `tile_<col>_<row>`, `s2mm_<n>`,
//! `mm2s_<n>`, `@label` and plain symbol names.

use crate::error::{Error, Result};
use crate::symbols::SymbolTable;

/// An argument after the eager resolution step. Label references depend on
/// placement and stay symbolic until emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Value(u64),
    Label(String),
}

impl Arg {
    pub fn value(&self, symbols: &SymbolTable) -> Result<u64> {
        match self {
            Arg::Value(v) => Ok(*v),
            Arg::Label(name) => symbols.value(name),
        }
    }
}

/// Resolve `token` completely against the current symbol table.
pub fn resolve(token: &str, symbols: &SymbolTable) -> Result<u64> {
    prepare(token, symbols)?.value(symbols)
}

/// Resolve everything except `@label` references, which are deferred.
pub fn prepare(token: &str, symbols: &SymbolTable) -> Result<Arg> {
    let t = token.trim();
    if let Some(v) = parse_literal(t) {
        return v.map(Arg::Value);
    }
    if let Some(name) = t.strip_prefix('@') {
        if !is_ident(name) {
            return Err(malformed(t));
        }
        return Ok(Arg::Label(name.to_string()));
    }
    if is_ident(t) {
        return symbols.value(t).map(Arg::Value);
    }
    Err(malformed(t))
}

/// `None` when the token is not literal syntax at all.
fn parse_literal(t: &str) -> Option<Result<u64>> {
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Some(Err(malformed(t)));
        }
        return Some(u64::from_str_radix(hex, 16).map_err(|_| malformed(t)));
    }
    if t.starts_with(|c: char| c.is_ascii_digit()) {
        return Some(dec(t).ok_or_else(|| malformed(t)));
    }
    if let Some(rest) = t.strip_prefix("tile_") {
        let tile = rest
            .split_once('_')
            .and_then(|(c, r)| Some((dec(c)?, dec(r)?)))
            .map(|(col, row)| ((col & 0x7F) << 5) | (row & 0x1F));
        return Some(tile.ok_or_else(|| malformed(t)));
    }
    if let Some(n) = t.strip_prefix("s2mm_") {
        return Some(dec(n).ok_or_else(|| malformed(t)));
    }
    if let Some(n) = t.strip_prefix("mm2s_") {
        return Some(dec(n).and_then(|n| n.checked_add(6)).ok_or_else(|| malformed(t)));
    }
    None
}

fn dec(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

pub(crate) fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '.' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn malformed(t: &str) -> Error {
    Error::MalformedLiteral { token: t.to_string() }
}

/// Textual form used by every deserializer for recovered values.
pub fn canonical(v: u64) -> String {
    if v < 10 {
        v.to_string()
    } else {
        format!("{v:#x}")
    }
}
