use crate::error::{Arity, Error, Result};
use crate::ops::{check_section, OpDeserializer, OpKind, OpSerializer, Slot};
use crate::resolve::canonical;
use crate::state::AssemblyState;
use crate::stream::{Reader, Writer};
use crate::symbols::SymbolTable;

pub const NAME: &str = ".align";

/// `.align <n>`: occupies nothing, the driver pads up to `n`.
#[derive(Debug)]
pub struct AlignSerializer {
    align: u32,
}

impl AlignSerializer {
    pub fn new(args: &[String], state: &AssemblyState) -> Result<Self> {
        Arity::exactly(1).check(NAME, args.len())?;
        let value = state.resolve(&args[0])?;
        let limit = state.cfg.page_size;
        if value == 0 || !value.is_power_of_two() || value > limit as u64 {
            return Err(Error::InvalidAlignment { value, limit });
        }
        Ok(Self { align: value as u32 })
    }
}

impl OpSerializer for AlignSerializer {
    fn size(&self) -> u32 {
        0
    }

    fn align(&self) -> u32 {
        self.align
    }

    fn serialize(&self, _writer: &mut dyn Writer, slot: Slot, _symbols: &SymbolTable) -> Result<()> {
        check_section(OpKind::Align, slot)
    }
}

/// The written argument is not in the stream. What is recovered is the
/// strongest alignment the current position satisfies, capped at the page size.
#[derive(Debug)]
pub struct AlignDeserializer {
    page_size: u32,
}

impl AlignDeserializer {
    pub fn new(state: &AssemblyState) -> Self {
        Self { page_size: state.cfg.page_size }
    }
}

impl OpDeserializer for AlignDeserializer {
    fn align(&self) -> u32 {
        1
    }

    fn deserialize(&self, reader: &mut dyn Reader) -> Result<Vec<String>> {
        let pos = reader.position();
        let align = if pos == 0 { self.page_size } else { (1u32 << pos.trailing_zeros()).min(self.page_size) };
        Ok(vec![canonical(align as u64)])
    }
}
