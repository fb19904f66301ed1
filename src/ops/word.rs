use crate::error::{Arity, Result};
use crate::ops::{check_section, read_words, Field, OpDeserializer, OpKind, OpSerializer, Slot};
use crate::resolve::{canonical, Arg};
use crate::state::AssemblyState;
use crate::stream::{Reader, Writer};
use crate::symbols::SymbolTable;

pub const NAME: &str = ".long";

const VALUE: Field = Field::new("value", 32);

/// `.long <value>`: one little-endian 32-bit word in DATA.
#[derive(Debug)]
pub struct WordSerializer {
    val: Arg,
}

impl WordSerializer {
    pub fn new(args: &[String], state: &AssemblyState) -> Result<Self> {
        Arity::exactly(1).check(NAME, args.len())?;
        Ok(Self { val: VALUE.prepare(NAME, &args[0], state)? })
    }
}

impl OpSerializer for WordSerializer {
    fn size(&self) -> u32 {
        4
    }

    fn align(&self) -> u32 {
        4
    }

    fn serialize(&self, writer: &mut dyn Writer, slot: Slot, symbols: &SymbolTable) -> Result<()> {
        check_section(OpKind::Word, slot)?;
        let val = VALUE.resolve(NAME, &self.val, symbols)? as u32;
        writer.write_words(&[val], slot.section, slot.column, slot.page)
    }
}

/// Recovers the literal value only; label names are not reconstructed.
#[derive(Debug)]
pub struct WordDeserializer;

impl OpDeserializer for WordDeserializer {
    fn align(&self) -> u32 {
        4
    }

    fn deserialize(&self, reader: &mut dyn Reader) -> Result<Vec<String>> {
        let words = read_words(reader, NAME, 1)?;
        Ok(vec![canonical(words[0] as u64)])
    }
}
