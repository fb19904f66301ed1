use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    /// Page-relative offset of a placed operation.
    Label { column: u8, page: u32 },
    /// Value bound by `.set`.
    Constant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub value: u64,
    pub kind: SymbolKind,
}

/// Name -> value bindings of one assembly unit. Names are unique.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    map: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, sym: Symbol) -> Result<()> {
        if self.map.contains_key(name) {
            return Err(Error::DuplicateSymbol { name: name.to_string() });
        }
        self.map.insert(name.to_string(), sym);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.map.get(name)
    }

    pub fn value(&self, name: &str) -> Result<u64> {
        self.get(name)
            .map(|s| s.value)
            .ok_or_else(|| Error::SymbolResolution { name: name.to_string() })
    }

    /// Reverse lookup used by deserializers to recover `@label` arguments.
    pub fn label_at(&self, column: u8, page: u32, offset: u64) -> Option<&str> {
        self.map.iter().find_map(|(name, s)| match s.kind {
            SymbolKind::Label { column: c, page: p } if c == column && p == page && s.value == offset => {
                Some(name.as_str())
            }
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
