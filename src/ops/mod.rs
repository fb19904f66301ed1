//! Operation codecs.
//!
//! Every operation kind has a serializer (assembly direction) and a
//! deserializer (disassembly direction). The set of kinds is closed:
//! [`OpKind`] names them and [`Serializer`] / [`Deserializer`] dispatch to
//! the concrete codec.

pub mod align;
pub mod ctrl_pkt;
pub mod instr;
pub mod shim_dma;
pub mod uc_dma;
pub mod word;

use crate::error::{Error, Result};
use crate::isa::aie2ps;
use crate::resolve::Arg;
use crate::section::Section;
use crate::state::AssemblyState;
use crate::stream::{Reader, Writer};
use crate::symbols::SymbolTable;

use self::instr::InstrDesc;

/// Where a serializer's bytes go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub section: Section,
    pub column: u8,
    pub page: u32,
}

pub trait OpSerializer {
    /// Bytes this operation occupies; known before anything is written.
    fn size(&self) -> u32;
    /// Required alignment of the start offset.
    fn align(&self) -> u32;
    /// Writes exactly `size()` bytes. `symbols` resolves deferred label arguments.
    fn serialize(&self, writer: &mut dyn Writer, slot: Slot, symbols: &SymbolTable) -> Result<()>;
}

pub trait OpDeserializer {
    fn align(&self) -> u32;
    /// Consumes one encoded operation and returns its arguments in canonical form.
    fn deserialize(&self, reader: &mut dyn Reader) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Word,
    Align,
    UcDma,
    ShimDma,
    ControlPacket,
    Instr(&'static InstrDesc),
}

impl OpKind {
    pub fn lookup(name: &str) -> Result<OpKind> {
        let kind = match name {
            word::NAME => OpKind::Word,
            align::NAME => OpKind::Align,
            uc_dma::NAME => OpKind::UcDma,
            shim_dma::NAME => OpKind::ShimDma,
            ctrl_pkt::NAME => OpKind::ControlPacket,
            _ => aie2ps::by_mnemonic(name)
                .map(OpKind::Instr)
                .ok_or_else(|| Error::UnsupportedOperation { op: name.to_string() })?,
        };
        Ok(kind)
    }

    pub fn from_opcode(opcode: u8) -> Result<OpKind> {
        aie2ps::by_opcode(opcode)
            .map(OpKind::Instr)
            .ok_or_else(|| Error::UnsupportedOperation { op: format!("opcode {opcode:#04x}") })
    }

    pub fn name(self) -> &'static str {
        match self {
            OpKind::Word => word::NAME,
            OpKind::Align => align::NAME,
            OpKind::UcDma => uc_dma::NAME,
            OpKind::ShimDma => shim_dma::NAME,
            OpKind::ControlPacket => ctrl_pkt::NAME,
            OpKind::Instr(d) => d.mnemonic,
        }
    }

    /// Sections the kind may be emitted into. Never empty.
    pub fn sections(self) -> &'static [Section] {
        match self {
            OpKind::Align => Section::ALL,
            OpKind::Instr(_) => &[Section::Text],
            OpKind::Word | OpKind::UcDma | OpKind::ShimDma | OpKind::ControlPacket => &[Section::Data],
        }
    }

    pub fn serializer(self, args: &[String], state: &AssemblyState) -> Result<Serializer> {
        Ok(match self {
            OpKind::Word => Serializer::Word(word::WordSerializer::new(args, state)?),
            OpKind::Align => Serializer::Align(align::AlignSerializer::new(args, state)?),
            OpKind::UcDma => Serializer::UcDma(uc_dma::UcDmaSerializer::new(args, state)?),
            OpKind::ShimDma => Serializer::ShimDma(shim_dma::ShimDmaSerializer::new(args, state)?),
            OpKind::ControlPacket => Serializer::ControlPacket(ctrl_pkt::ControlPacketSerializer::new(args, state)?),
            OpKind::Instr(d) => Serializer::Instr(instr::InstrSerializer::new(d, args, state)?),
        })
    }

    pub fn deserializer(self, state: &AssemblyState) -> Deserializer<'_> {
        match self {
            OpKind::Word => Deserializer::Word(word::WordDeserializer),
            OpKind::Align => Deserializer::Align(align::AlignDeserializer::new(state)),
            OpKind::UcDma => Deserializer::UcDma(uc_dma::UcDmaDeserializer::new(state)),
            OpKind::ShimDma => Deserializer::ShimDma(shim_dma::ShimDmaDeserializer),
            OpKind::ControlPacket => Deserializer::ControlPacket(ctrl_pkt::ControlPacketDeserializer),
            OpKind::Instr(d) => Deserializer::Instr(instr::InstrDeserializer::new(d, state)),
        }
    }
}

#[derive(Debug)]
pub enum Serializer {
    Word(word::WordSerializer),
    Align(align::AlignSerializer),
    UcDma(uc_dma::UcDmaSerializer),
    ShimDma(shim_dma::ShimDmaSerializer),
    ControlPacket(ctrl_pkt::ControlPacketSerializer),
    Instr(instr::InstrSerializer),
}

impl Serializer {
    fn inner(&self) -> &dyn OpSerializer {
        match self {
            Serializer::Word(s) => s,
            Serializer::Align(s) => s,
            Serializer::UcDma(s) => s,
            Serializer::ShimDma(s) => s,
            Serializer::ControlPacket(s) => s,
            Serializer::Instr(s) => s,
        }
    }
}

impl OpSerializer for Serializer {
    fn size(&self) -> u32 {
        self.inner().size()
    }
    fn align(&self) -> u32 {
        self.inner().align()
    }
    fn serialize(&self, writer: &mut dyn Writer, slot: Slot, symbols: &SymbolTable) -> Result<()> {
        self.inner().serialize(writer, slot, symbols)
    }
}

#[derive(Debug)]
pub enum Deserializer<'a> {
    Word(word::WordDeserializer),
    Align(align::AlignDeserializer),
    UcDma(uc_dma::UcDmaDeserializer<'a>),
    ShimDma(shim_dma::ShimDmaDeserializer),
    ControlPacket(ctrl_pkt::ControlPacketDeserializer),
    Instr(instr::InstrDeserializer<'a>),
}

impl Deserializer<'_> {
    fn inner(&self) -> &dyn OpDeserializer {
        match self {
            Deserializer::Word(d) => d,
            Deserializer::Align(d) => d,
            Deserializer::UcDma(d) => d,
            Deserializer::ShimDma(d) => d,
            Deserializer::ControlPacket(d) => d,
            Deserializer::Instr(d) => d,
        }
    }
}

impl OpDeserializer for Deserializer<'_> {
    fn align(&self) -> u32 {
        self.inner().align()
    }
    fn deserialize(&self, reader: &mut dyn Reader) -> Result<Vec<String>> {
        self.inner().deserialize(reader)
    }
}

/// Fails unless `slot` is one of the sections `kind` may be emitted into.
pub(crate) fn check_section(kind: OpKind, slot: Slot) -> Result<()> {
    let legal = kind.sections();
    if !legal.contains(&slot.section) {
        return Err(Error::SectionMismatch { op: kind.name().to_string(), required: legal[0] });
    }
    Ok(())
}

/// A named bit field of an encoded operation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Field {
    pub name: &'static str,
    pub bits: u32,
}

impl Field {
    pub(crate) const fn new(name: &'static str, bits: u32) -> Self {
        Self { name, bits }
    }

    pub(crate) fn check(&self, op: &str, value: u64) -> Result<u64> {
        if self.bits < 64 && value >> self.bits != 0 {
            return Err(Error::FieldRange { op: op.to_string(), field: self.name, value, bits: self.bits });
        }
        Ok(value)
    }

    /// Eager half of resolution; immediate values are range checked now.
    pub(crate) fn prepare(&self, op: &str, token: &str, state: &AssemblyState) -> Result<Arg> {
        let arg = state.prepare(token)?;
        if let Arg::Value(v) = arg {
            self.check(op, v)?;
        }
        Ok(arg)
    }

    pub(crate) fn resolve(&self, op: &str, arg: &Arg, symbols: &SymbolTable) -> Result<u64> {
        self.check(op, arg.value(symbols)?)
    }
}

/// Reads `n` words, failing before any read when the stream is too short.
pub(crate) fn read_words(reader: &mut dyn Reader, op: &str, n: usize) -> Result<Vec<u32>> {
    let needed = n * 4;
    let truncated = |remaining| Error::TruncatedStream { op: op.to_string(), needed, remaining };
    if reader.remaining() < needed {
        return Err(truncated(reader.remaining()));
    }
    let mut words = Vec::with_capacity(n);
    for _ in 0..n {
        words.push(reader.read_u32().ok_or_else(|| truncated(reader.remaining()))?);
    }
    Ok(words)
}

/// `@label` when a label sits at `offset` in the current page, else the literal.
pub(crate) fn addr_text(state: &AssemblyState, offset: u64) -> String {
    let c = state.cursor();
    match state.symbols.label_at(c.column, c.page, offset) {
        Some(name) => format!("@{name}"),
        None => crate::resolve::canonical(offset),
    }
}
