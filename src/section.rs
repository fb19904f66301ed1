use serde::{Deserialize, Serialize};
use std::fmt;

/// Output region an encoded byte belongs to.
///
/// Ordering matters: within a page the TEXT run is laid out first and the
/// DATA run follows it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    Text,
    Data,
}

impl Section {
    pub const ALL: &'static [Section] = &[Section::Text, Section::Data];
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Text => f.write_str("TEXT"),
            Section::Data => f.write_str("DATA"),
        }
    }
}
