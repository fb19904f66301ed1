//! Table-driven codec for TEXT instructions.
//!
//! Encoding: opcode byte, reserved zero byte, then the arguments in declared
//! order. 16-bit arguments sit at 2-byte, 32-bit ones at 4-byte offsets; the
//! gaps and the tail up to a multiple of four are zero.

use crate::error::{Arity, Error, Result};
use crate::ops::{addr_text, check_section, Field, OpDeserializer, OpKind, OpSerializer, Slot};
use crate::resolve::{canonical, Arg};
use crate::state::{align_up, AssemblyState};
use crate::stream::{Reader, Writer};
use crate::symbols::SymbolTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    U16,
    U32,
    /// Job identifier (16 bits).
    Job,
    /// Page offset, usually `@label` (32 bits).
    Addr,
}

impl ArgKind {
    pub fn width(self) -> u32 {
        match self {
            ArgKind::U16 | ArgKind::Job => 2,
            ArgKind::U32 | ArgKind::Addr => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgDesc {
    pub name: &'static str,
    pub kind: ArgKind,
}

impl ArgDesc {
    fn field(&self) -> Field {
        Field::new(self.name, self.kind.width() * 8)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct InstrDesc {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub args: &'static [ArgDesc],
}

impl InstrDesc {
    /// Byte offset of every argument.
    pub fn offsets(&self) -> Vec<u32> {
        let mut off = 2;
        self.args
            .iter()
            .map(|a| {
                let at = align_up(off, a.kind.width());
                off = at + a.kind.width();
                at
            })
            .collect()
    }

    pub fn size(&self) -> u32 {
        let end = match (self.args.last(), self.offsets().last()) {
            (Some(a), Some(off)) => off + a.kind.width(),
            _ => 2,
        };
        align_up(end, 4)
    }
}

#[derive(Debug)]
pub struct InstrSerializer {
    desc: &'static InstrDesc,
    args: Vec<Arg>,
}

impl InstrSerializer {
    pub fn new(desc: &'static InstrDesc, args: &[String], state: &AssemblyState) -> Result<Self> {
        Arity::exactly(desc.args.len()).check(desc.mnemonic, args.len())?;
        let args = desc
            .args
            .iter()
            .zip(args)
            .map(|(a, tok)| a.field().prepare(desc.mnemonic, tok, state))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { desc, args })
    }

    pub fn desc(&self) -> &'static InstrDesc {
        self.desc
    }

    pub fn arg(&self, i: usize) -> Option<&Arg> {
        self.args.get(i)
    }
}

impl OpSerializer for InstrSerializer {
    fn size(&self) -> u32 {
        self.desc.size()
    }

    fn align(&self) -> u32 {
        4
    }

    fn serialize(&self, writer: &mut dyn Writer, slot: Slot, symbols: &SymbolTable) -> Result<()> {
        check_section(OpKind::Instr(self.desc), slot)?;
        let mut buf = vec![0u8; self.size() as usize];
        buf[0] = self.desc.opcode;
        for ((a, off), arg) in self.desc.args.iter().zip(self.desc.offsets()).zip(&self.args) {
            let v = a.field().resolve(self.desc.mnemonic, arg, symbols)?;
            let off = off as usize;
            match a.kind.width() {
                2 => buf[off..off + 2].copy_from_slice(&(v as u16).to_le_bytes()),
                _ => buf[off..off + 4].copy_from_slice(&(v as u32).to_le_bytes()),
            }
        }
        writer.write_bytes(&buf, slot.section, slot.column, slot.page)
    }
}

/// `Addr` arguments come back as `@label` when the reverse symbol table has a
/// label at that offset; everything else as literals.
#[derive(Debug)]
pub struct InstrDeserializer<'a> {
    desc: &'static InstrDesc,
    state: &'a AssemblyState,
}

impl<'a> InstrDeserializer<'a> {
    pub fn new(desc: &'static InstrDesc, state: &'a AssemblyState) -> Self {
        Self { desc, state }
    }
}

impl OpDeserializer for InstrDeserializer<'_> {
    fn align(&self) -> u32 {
        4
    }

    fn deserialize(&self, reader: &mut dyn Reader) -> Result<Vec<String>> {
        let size = self.desc.size() as usize;
        let truncated = |remaining| Error::TruncatedStream {
            op: self.desc.mnemonic.to_string(),
            needed: size,
            remaining,
        };
        if reader.remaining() < size {
            return Err(truncated(reader.remaining()));
        }
        let mut buf = Vec::with_capacity(size);
        while buf.len() < size {
            buf.push(reader.read_u8().ok_or_else(|| truncated(reader.remaining()))?);
        }
        if buf[0] != self.desc.opcode {
            return Err(Error::UnsupportedOperation { op: format!("opcode {:#04x}", buf[0]) });
        }
        let args = self
            .desc
            .args
            .iter()
            .zip(self.desc.offsets())
            .map(|(a, off)| {
                let off = off as usize;
                let v = match a.kind.width() {
                    2 => u16::from_le_bytes([buf[off], buf[off + 1]]) as u64,
                    _ => u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]) as u64,
                };
                match a.kind {
                    ArgKind::Addr => addr_text(self.state, v),
                    _ => canonical(v),
                }
            })
            .collect();
        Ok(args)
    }
}
