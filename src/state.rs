use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::AsmConfig;
use crate::error::{Error, Result};
use crate::resolve;
use crate::section::Section;
use crate::symbols::{Symbol, SymbolKind, SymbolTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Cursor {
    pub column: u8,
    pub page: u32,
    pub offset: u32, // page-relative
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub id: u16,
    pub column: u8,
    pub page: u32,
    pub start: u32,
    pub end: Option<u32>,
    pub deferred: bool,
    pub launches: Vec<u16>,
    pub barriers: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Eof,
    Eop,
}

/// Position of an `eof` instruction or a `.eop` directive. An `.eop` covers
/// no bytes, so its `start` and `end` are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub column: u8,
    pub page: u32,
    pub start: u32,
    pub end: u32,
}

/// Context shared by every codec of one assembly unit.
#[derive(Debug, Clone)]
pub struct AssemblyState {
    pub cfg: AsmConfig,
    pub section: Section,
    pub symbols: SymbolTable,
    cursor: Cursor,
    parked: BTreeMap<u8, (Cursor, Section)>,
    pending_labels: Vec<String>,
    jobs: BTreeMap<u16, Job>,
    open_job: Option<u16>,
    barriers: BTreeMap<u16, Vec<u16>>,
    markers: Vec<Marker>,
}

impl AssemblyState {
    pub fn new(cfg: AsmConfig) -> Self {
        Self {
            cfg,
            section: Section::Text,
            symbols: SymbolTable::new(),
            cursor: Cursor::default(),
            parked: BTreeMap::new(),
            pending_labels: Vec::new(),
            jobs: BTreeMap::new(),
            open_job: None,
            barriers: BTreeMap::new(),
            markers: Vec::new(),
        }
    }

    /// State for disassembly: labels come from the image.
    pub fn with_symbols(cfg: AsmConfig, symbols: SymbolTable) -> Self {
        Self { symbols, ..Self::new(cfg) }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn resolve(&self, token: &str) -> Result<u64> {
        resolve::resolve(token, &self.symbols)
    }

    pub fn prepare(&self, token: &str) -> Result<resolve::Arg> {
        resolve::prepare(token, &self.symbols)
    }

    /// Positions the cursor for disassembly of one page.
    pub fn seek(&mut self, column: u8, page: u32, offset: u32, section: Section) {
        self.cursor = Cursor { column, page, offset };
        self.section = section;
    }

    /// A label switches to DATA and binds to the next placed operation.
    pub fn add_label(&mut self, name: &str) -> Result<()> {
        if self.symbols.get(name).is_some() || self.pending_labels.iter().any(|l| l == name) {
            return Err(Error::DuplicateSymbol { name: name.to_string() });
        }
        self.section = Section::Data;
        self.pending_labels.push(name.to_string());
        Ok(())
    }

    pub fn define_constant(&mut self, name: &str, value: u64) -> Result<()> {
        if self.pending_labels.iter().any(|l| l == name) {
            return Err(Error::DuplicateSymbol { name: name.to_string() });
        }
        self.symbols.define(name, Symbol { value, kind: SymbolKind::Constant })
    }

    /// Pads to `align`, binds pending labels, and returns the padding length.
    pub fn align_to(&mut self, align: u32) -> Result<u32> {
        let aligned = align_up(self.cursor.offset, align);
        let pad = aligned - self.cursor.offset;
        self.cursor.offset = aligned;
        self.bind_labels()?;
        Ok(pad)
    }

    pub fn advance(&mut self, size: u32) {
        self.cursor.offset += size;
    }

    fn bind_labels(&mut self) -> Result<()> {
        let Cursor { column, page, offset } = self.cursor;
        for name in std::mem::take(&mut self.pending_labels) {
            let kind = SymbolKind::Label { column, page };
            self.symbols.define(&name, Symbol { value: offset as u64, kind })?;
        }
        Ok(())
    }

    /// Closes the current page: checks its size and open jobs.
    fn close_page(&mut self) -> Result<()> {
        self.bind_labels()?;
        if let Some(id) = self.open_job {
            return Err(Error::UnterminatedJob { id });
        }
        let Cursor { column, page, offset } = self.cursor;
        if offset > self.cfg.page_size {
            return Err(Error::PageOverflow { column, page, size: offset, limit: self.cfg.page_size });
        }
        Ok(())
    }

    /// `.eop`
    pub fn end_page(&mut self) -> Result<()> {
        self.close_page()?;
        let Cursor { column, page, offset } = self.cursor;
        let next = page + 1;
        if next >= self.cfg.max_pages {
            return Err(Error::PageOutOfRange { page: next, limit: self.cfg.max_pages });
        }
        self.markers.push(Marker { kind: MarkerKind::Eop, column, page, start: offset, end: offset });
        self.cursor = Cursor { page: next, offset: 0, ..self.cursor };
        self.section = Section::Text;
        Ok(())
    }

    /// `.attach_to_group`: switch columns, resuming the target's saved cursor.
    pub fn attach(&mut self, column: u64) -> Result<()> {
        let limit = self.cfg.columns;
        let column = u8::try_from(column)
            .ok()
            .filter(|c| *c < limit)
            .ok_or(Error::ColumnOutOfRange { column, limit })?;
        if column == self.cursor.column {
            return Ok(());
        }
        self.close_page()?;
        self.parked.insert(self.cursor.column, (self.cursor, self.section));
        let (cursor, section) = self
            .parked
            .remove(&column)
            .unwrap_or((Cursor { column, page: 0, offset: 0 }, Section::Text));
        self.cursor = cursor;
        self.section = section;
        Ok(())
    }

    /// End of input.
    pub fn finish(&mut self) -> Result<()> {
        self.close_page()?;
        for job in self.jobs.values() {
            if let Some(id) = job.launches.iter().find(|id| !self.jobs.contains_key(*id)) {
                return Err(Error::UnknownJob { id: *id });
            }
        }
        Ok(())
    }

    /// Opens job `id` whose first instruction sits at `start`.
    pub fn start_job(&mut self, id: u16, deferred: bool, start: u32) -> Result<()> {
        if self.jobs.contains_key(&id) {
            return Err(Error::DuplicateJob { id });
        }
        if let Some(open) = self.open_job {
            return Err(Error::UnterminatedJob { id: open });
        }
        let Cursor { column, page, .. } = self.cursor;
        self.jobs.insert(
            id,
            Job { id, column, page, start, end: None, deferred, launches: Vec::new(), barriers: Vec::new() },
        );
        self.open_job = Some(id);
        Ok(())
    }

    pub fn end_job(&mut self) -> Result<()> {
        let id = self.open_job.take().ok_or_else(|| Error::NoOpenJob { op: "end_job".into() })?;
        let end = self.cursor.offset;
        if let Some(job) = self.jobs.get_mut(&id) {
            job.end = Some(end);
        }
        Ok(())
    }

    /// Records an `eof` that started at `start` and ends at the cursor.
    pub fn mark_eof(&mut self, start: u32) {
        let Cursor { column, page, offset } = self.cursor;
        self.markers.push(Marker { kind: MarkerKind::Eof, column, page, start, end: offset });
    }

    pub fn launch_job(&mut self, target: u16) -> Result<()> {
        self.open_job_mut("launch_job")?.launches.push(target);
        Ok(())
    }

    pub fn join_barrier(&mut self, barrier: u16) -> Result<()> {
        let job = self.open_job_mut("local_barrier")?;
        job.barriers.push(barrier);
        let id = job.id;
        self.barriers.entry(barrier).or_default().push(id);
        Ok(())
    }

    fn open_job_mut(&mut self, op: &str) -> Result<&mut Job> {
        self.open_job
            .and_then(|id| self.jobs.get_mut(&id))
            .ok_or_else(|| Error::NoOpenJob { op: op.to_string() })
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn job(&self, id: u16) -> Option<&Job> {
        self.jobs.get(&id)
    }

    /// `eof` and `.eop` positions in source order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Jobs participating in each local barrier.
    pub fn barriers(&self) -> &BTreeMap<u16, Vec<u16>> {
        &self.barriers
    }
}

pub fn align_up(offset: u32, align: u32) -> u32 {
    if align <= 1 {
        return offset;
    }
    offset.div_ceil(align) * align
}
