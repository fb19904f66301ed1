use std::fmt;

use crate::section::Section;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Accepted argument count range of an operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self { min: n, max: n }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn check(self, op: &str, found: usize) -> Result<()> {
        if found < self.min || found > self.max {
            return Err(Error::ArgumentCount { op: op.to_string(), expected: self, found });
        }
        Ok(())
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}..={}", self.min, self.max)
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{op}: expected {expected} argument(s), found {found}")]
    ArgumentCount { op: String, expected: Arity, found: usize },
    #[error("malformed literal `{token}`")]
    MalformedLiteral { token: String },
    #[error("undefined symbol `{name}`")]
    SymbolResolution { name: String },
    #[error("{op}: this operation kind can only be used in the {required} section.")]
    SectionMismatch { op: String, required: Section },
    #[error("{op}: field `{field}` value {value:#x} does not fit in {bits} bit(s)")]
    FieldRange { op: String, field: &'static str, value: u64, bits: u32 },
    #[error("{op}: truncated stream, needed {needed} byte(s) but {remaining} remain")]
    TruncatedStream { op: String, needed: usize, remaining: usize },
    #[error("unsupported operation `{op}`")]
    UnsupportedOperation { op: String },
    #[error("symbol `{name}` is already defined")]
    DuplicateSymbol { name: String },
    #[error("invalid alignment {value}: must be a power of two no larger than {limit}")]
    InvalidAlignment { value: u64, limit: u32 },
    #[error("page {page} of column {column} holds {size} bytes, limit is {limit}")]
    PageOverflow { column: u8, page: u32, size: u32, limit: u32 },
    #[error("column {column} out of range (limit {limit})")]
    ColumnOutOfRange { column: u64, limit: u8 },
    #[error("page {page} out of range (limit {limit})")]
    PageOutOfRange { page: u32, limit: u32 },
    #[error("image holds more than one {section} run for column {column} page {page}")]
    DuplicateRun { column: u8, page: u32, section: Section },
    #[error("{op}: declared {declared} byte(s) but wrote {written}")]
    SizeMismatch { op: String, declared: u32, written: usize },
    #[error("job {id} is already defined")]
    DuplicateJob { id: u16 },
    #[error("{op} used outside of a job")]
    NoOpenJob { op: String },
    #[error("job {id} is not terminated by end_job")]
    UnterminatedJob { id: u16 },
    #[error("launch_job refers to unknown job {id}")]
    UnknownJob { id: u16 },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("operation #{index} `{op}`: {source}")]
    Operation {
        index: usize,
        op: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Innermost error, with driver context stripped.
    pub fn root(&self) -> &Error {
        match self {
            Error::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn at(self, index: usize, op: &str) -> Error {
        match self {
            Error::Operation { .. } => self,
            other => Error::Operation { index, op: op.to_string(), source: Box::new(other) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_mismatch_message_names_section() {
        let e = Error::SectionMismatch { op: ".long".into(), required: Section::Data };
        assert!(e
            .to_string()
            .ends_with("this operation kind can only be used in the DATA section."));
    }

    #[test]
    fn root_unwraps_operation_context() {
        let e = Error::SymbolResolution { name: "x".into() }.at(3, ".long");
        assert!(matches!(e, Error::Operation { index: 3, .. }));
        assert!(matches!(e.root(), Error::SymbolResolution { name } if name == "x"));
    }

    #[test]
    fn arity_range() {
        let a = Arity::between(3, 6);
        assert!(a.check("control_packet", 3).is_ok());
        assert!(a.check("control_packet", 7).is_err());
        assert_eq!(a.to_string(), "3..=6");
    }
}
