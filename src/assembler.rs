//! Two-pass driver.
//!
//! Pass one ([`Assembler::layout`]) builds every serializer, applies padding,
//! binds labels and tracks jobs; nothing is written. Pass two
//! ([`Layout::emit`]) writes the planned operations once every label offset is
//! known, so forward `@label` references resolve.

use tracing::{debug, info};

use crate::config::AsmConfig;
use crate::error::{Error, Result};
use crate::image::{Image, Placement};
use crate::ops::instr::InstrSerializer;
use crate::ops::{OpKind, OpSerializer, Serializer, Slot};
use crate::resolve::{self, Arg};
use crate::section::Section;
use crate::state::{AssemblyState, Cursor};
use crate::stream::Writer;
use crate::symbols::SymbolKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub args: Vec<String>,
}

impl Operation {
    pub fn new(name: &str, args: &[&str]) -> Self {
        Self { name: name.to_string(), args: args.iter().map(|a| a.to_string()).collect() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `.eop`
    Eop,
    /// `.attach_to_group <column>`
    AttachToGroup(String),
    /// `.set NAME, value`
    Set { name: String, value: String },
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Eop => ".eop",
            Directive::AttachToGroup(_) => ".attach_to_group",
            Directive::Set { .. } => ".set",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Label(String),
    Op(Operation),
    Dir(Directive),
}

/// An operation as placed by the layout pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOp {
    pub index: usize,
    pub op: &'static str,
    pub slot: Slot,
    pub offset: u32,
    pub pad: u32,
    pub size: u32,
}

#[derive(Debug)]
struct Planned {
    placed: PlacedOp,
    ser: Serializer,
}

/// Result of the layout pass.
#[derive(Debug)]
pub struct Layout {
    state: AssemblyState,
    planned: Vec<Planned>,
}

impl Layout {
    pub fn state(&self) -> &AssemblyState {
        &self.state
    }

    pub fn ops(&self) -> impl Iterator<Item = &PlacedOp> {
        self.planned.iter().map(|p| &p.placed)
    }

    /// Writes every planned operation into `writer` and returns the DATA
    /// placements. Fails on the first operation that cannot be written.
    pub fn emit_into(&self, writer: &mut dyn Writer) -> Result<Vec<Placement>> {
        let mut data = Vec::new();
        for p in &self.planned {
            let PlacedOp { index, op, slot, offset, pad, size } = p.placed;
            let at = |e: Error| e.at(index, op);
            writer.write_padding(pad as usize, slot.section, slot.column, slot.page).map_err(at)?;
            let before = writer.written(slot.section, slot.column, slot.page);
            p.ser.serialize(writer, slot, &self.state.symbols).map_err(at)?;
            let written = writer.written(slot.section, slot.column, slot.page) - before;
            if written != size as usize {
                return Err(at(Error::SizeMismatch { op: op.to_string(), declared: size, written }));
            }
            if slot.section == Section::Data && size > 0 {
                data.push(Placement { column: slot.column, page: slot.page, offset, op: op.to_string() });
            }
        }
        Ok(data)
    }

    pub fn emit(&self) -> Result<Image> {
        let mut image = Image::new(self.state.cfg);
        let data_map = self.emit_into(&mut image)?;
        image.data_map = data_map;
        for (name, sym) in self.state.symbols.iter() {
            if let SymbolKind::Label { column, page } = sym.kind {
                image.add_label(name, column, page, sym.value as u32);
            }
        }
        // Columns may be filled in any order; the stored image does not depend on it.
        image.normalize()?;
        info!(runs = image.runs.len(), labels = image.labels.len(), "emitted image");
        Ok(image)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Assembler {
    cfg: AsmConfig,
}

impl Assembler {
    pub fn new(cfg: AsmConfig) -> Self {
        Self { cfg }
    }

    pub fn layout(&self, items: &[Item]) -> Result<Layout> {
        let mut state = AssemblyState::new(self.cfg);
        let mut planned = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match item {
                Item::Label(name) => state.add_label(name).map_err(|e| e.at(index, name))?,
                Item::Dir(dir) => directive(&mut state, dir).map_err(|e| e.at(index, dir.name()))?,
                Item::Op(op) => planned.push(place(&mut state, index, op).map_err(|e| e.at(index, &op.name))?),
            }
        }
        state.finish()?;
        info!(ops = planned.len(), symbols = state.symbols.len(), jobs = state.jobs().count(), "layout done");
        Ok(Layout { state, planned })
    }

    pub fn assemble(&self, items: &[Item]) -> Result<Image> {
        self.layout(items)?.emit()
    }
}

fn directive(state: &mut AssemblyState, dir: &Directive) -> Result<()> {
    match dir {
        Directive::Eop => state.end_page(),
        Directive::AttachToGroup(column) => {
            let column = state.resolve(column)?;
            state.attach(column)
        }
        Directive::Set { name, value } => {
            if !resolve::is_ident(name) {
                return Err(Error::MalformedLiteral { token: name.clone() });
            }
            let value = state.resolve(value)?;
            state.define_constant(name, value)
        }
    }
}

fn place(state: &mut AssemblyState, index: usize, op: &Operation) -> Result<Planned> {
    let kind = OpKind::lookup(&op.name)?;
    let ser = kind.serializer(&op.args, state)?;
    let pad = state.align_to(ser.align())?;
    let Cursor { column, page, offset } = state.cursor();
    let size = ser.size();
    state.advance(size);
    if let Serializer::Instr(instr) = &ser {
        track_jobs(state, instr, offset)?;
    }
    debug!(index, op = kind.name(), column, page, offset, pad, size, "placed");
    let placed = PlacedOp {
        index,
        op: kind.name(),
        slot: Slot { section: state.section, column, page },
        offset,
        pad,
        size,
    };
    Ok(Planned { placed, ser })
}

/// Job bookkeeping for the instructions that open, close or reference jobs,
/// plus the `eof` marker.
fn track_jobs(state: &mut AssemblyState, instr: &InstrSerializer, offset: u32) -> Result<()> {
    let mnemonic = instr.desc().mnemonic;
    let id = || -> Result<u16> {
        match instr.arg(0) {
            Some(Arg::Value(v)) => Ok(*v as u16),
            Some(Arg::Label(name)) => Err(Error::MalformedLiteral { token: format!("@{name}") }),
            None => Err(Error::UnsupportedOperation { op: mnemonic.to_string() }),
        }
    };
    match mnemonic {
        "start_job" => state.start_job(id()?, false, offset),
        "start_job_deferred" => state.start_job(id()?, true, offset),
        "end_job" => state.end_job(),
        "launch_job" => state.launch_job(id()?),
        "local_barrier" => state.join_barrier(id()?),
        "eof" => {
            state.mark_eof(offset);
            Ok(())
        }
        _ => Ok(()),
    }
}
