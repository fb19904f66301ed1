//! `uc_dma_bd`: buffer descriptor consumed by the micro-controller DMA engine.
//!
//! ```text
//! DW0  remote_ptr[31:0]
//! DW1  remote_ptr[56:32]
//! DW2  local_ptr[19:0]
//! DW3  length[19:0] | wait_completion << 30 | next_bd << 31
//! ```

use bitflags::bitflags;
use bitvec::prelude::*;

use crate::error::{Arity, Result};
use crate::ops::{addr_text, check_section, read_words, Field, OpDeserializer, OpKind, OpSerializer, Slot};
use crate::resolve::{canonical, Arg};
use crate::state::AssemblyState;
use crate::stream::{Reader, Writer};
use crate::symbols::SymbolTable;

pub const NAME: &str = "uc_dma_bd";
pub const SIZE: u32 = 16;
pub const ALIGN: u32 = 16;

// Declared argument order.
const FIELDS: [Field; 5] = [
    Field::new("local_ptr", 20),
    Field::new("remote_ptr", 57),
    Field::new("length", 20),
    Field::new("next_bd", 1),
    Field::new("wait_completion", 1),
];

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UcDmaCtrl: u32 {
        const WAIT_COMPLETION = 1 << 30;
        const NEXT_BD = 1 << 31;
    }
}

type Bd = BitArray<[u32; 4], Lsb0>;

#[derive(Debug)]
pub struct UcDmaSerializer {
    args: Vec<Arg>,
}

impl UcDmaSerializer {
    pub fn new(args: &[String], state: &AssemblyState) -> Result<Self> {
        Arity::exactly(FIELDS.len()).check(NAME, args.len())?;
        let args = FIELDS
            .iter()
            .zip(args)
            .map(|(f, tok)| f.prepare(NAME, tok, state))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { args })
    }
}

impl OpSerializer for UcDmaSerializer {
    fn size(&self) -> u32 {
        SIZE
    }

    fn align(&self) -> u32 {
        ALIGN
    }

    fn serialize(&self, writer: &mut dyn Writer, slot: Slot, symbols: &SymbolTable) -> Result<()> {
        check_section(OpKind::UcDma, slot)?;
        let mut v = [0u64; 5];
        for (i, (f, arg)) in FIELDS.iter().zip(&self.args).enumerate() {
            v[i] = f.resolve(NAME, arg, symbols)?;
        }
        let [local, remote, length, next_bd, wait] = v;

        let mut bd = Bd::new([0; 4]);
        bd[0..57].store_le(remote);
        bd[64..84].store_le(local as u32);
        bd[96..116].store_le(length as u32);
        let mut words = bd.into_inner();

        let mut ctrl = UcDmaCtrl::empty();
        ctrl.set(UcDmaCtrl::NEXT_BD, next_bd == 1);
        ctrl.set(UcDmaCtrl::WAIT_COMPLETION, wait == 1);
        words[3] |= ctrl.bits();

        writer.write_words(&words, slot.section, slot.column, slot.page)
    }
}

/// Recovers `local_ptr` as `@label` when a label sits there; the other
/// fields come back as literals.
#[derive(Debug)]
pub struct UcDmaDeserializer<'a> {
    state: &'a AssemblyState,
}

impl<'a> UcDmaDeserializer<'a> {
    pub fn new(state: &'a AssemblyState) -> Self {
        Self { state }
    }
}

impl OpDeserializer for UcDmaDeserializer<'_> {
    fn align(&self) -> u32 {
        ALIGN
    }

    fn deserialize(&self, reader: &mut dyn Reader) -> Result<Vec<String>> {
        let mut words = [0u32; 4];
        words.copy_from_slice(&read_words(reader, NAME, 4)?);
        let ctrl = UcDmaCtrl::from_bits_truncate(words[3]);
        let bd = Bd::new(words);
        let remote = bd[0..57].load_le::<u64>();
        let local = bd[64..84].load_le::<u32>();
        let length = bd[96..116].load_le::<u32>();
        Ok(vec![
            addr_text(self.state, local as u64),
            canonical(remote),
            canonical(length as u64),
            canonical(ctrl.contains(UcDmaCtrl::NEXT_BD) as u64),
            canonical(ctrl.contains(UcDmaCtrl::WAIT_COMPLETION) as u64),
        ])
    }
}
