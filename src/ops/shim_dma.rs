//! `shim_dma_bd`: eight-word shim tile DMA buffer descriptor.
//!
//! The 48-bit address sits in DW1 and the low half of DW2, the layout the
//! runtime patches for host buffers. DW3..DW6 (strides, iteration) are left
//! zero.

use bitflags::bitflags;
use bitvec::prelude::*;

use crate::error::{Arity, Result};
use crate::ops::{check_section, read_words, Field, OpDeserializer, OpKind, OpSerializer, Slot};
use crate::resolve::{canonical, Arg};
use crate::state::AssemblyState;
use crate::stream::{Reader, Writer};
use crate::symbols::SymbolTable;

pub const NAME: &str = "shim_dma_bd";
pub const SIZE: u32 = 32;
pub const ALIGN: u32 = 32;

const FIELDS: [Field; 5] = [
    Field::new("address", 48),
    Field::new("length", 32),
    Field::new("next_bd", 4),
    Field::new("use_next_bd", 1),
    Field::new("valid", 1),
];

bitflags! {
    /// Control bits of DW7.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShimBdCtrl: u32 {
        const VALID_BD = 1 << 25;
        const USE_NEXT_BD = 1 << 26;
    }
}

type Bd = BitArray<[u32; 8], Lsb0>;

const NEXT_BD_BITS: std::ops::Range<usize> = 7 * 32 + 27..7 * 32 + 31;

#[derive(Debug)]
pub struct ShimDmaSerializer {
    args: Vec<Arg>,
}

impl ShimDmaSerializer {
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

impl OpSerializer for ShimDmaSerializer {
    fn size(&self) -> u32 {
        SIZE
    }

    fn align(&self) -> u32 {
        ALIGN
    }

    fn serialize(&self, writer: &mut dyn Writer, slot: Slot, symbols: &SymbolTable) -> Result<()> {
        check_section(OpKind::ShimDma, slot)?;
        let mut v = [0u64; 5];
        for (i, (f, arg)) in FIELDS.iter().zip(&self.args).enumerate() {
            v[i] = f.resolve(NAME, arg, symbols)?;
        }
        let [address, length, next_bd, use_next, valid] = v;

        let mut bd = Bd::new([0; 8]);
        bd[0..32].store_le(length as u32);
        bd[32..80].store_le(address);
        bd[NEXT_BD_BITS].store_le(next_bd as u8);
        let mut words = bd.into_inner();

        let mut ctrl = ShimBdCtrl::empty();
        ctrl.set(ShimBdCtrl::USE_NEXT_BD, use_next == 1);
        ctrl.set(ShimBdCtrl::VALID_BD, valid == 1);
        words[7] |= ctrl.bits();

        writer.write_words(&words, slot.section, slot.column, slot.page)
    }
}

/// Literal values only.
#[derive(Debug)]
pub struct ShimDmaDeserializer;

impl OpDeserializer for ShimDmaDeserializer {
    fn align(&self) -> u32 {
        ALIGN
    }

    fn deserialize(&self, reader: &mut dyn Reader) -> Result<Vec<String>> {
        let mut words = [0u32; 8];
        words.copy_from_slice(&read_words(reader, NAME, 8)?);
        let ctrl = ShimBdCtrl::from_bits_truncate(words[7]);
        let bd = Bd::new(words);
        Ok(vec![
            canonical(bd[32..80].load_le::<u64>()),
            canonical(bd[0..32].load_le::<u32>() as u64),
            canonical(bd[NEXT_BD_BITS].load_le::<u8>() as u64),
            canonical(ctrl.contains(ShimBdCtrl::USE_NEXT_BD) as u64),
            canonical(ctrl.contains(ShimBdCtrl::VALID_BD) as u64),
        ])
    }
}
