use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::AsmConfig;
use crate::error::{Error, Result};
use crate::section::Section;
use crate::stream::Writer;
use crate::symbols::{Symbol, SymbolKind, SymbolTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub column: u8,
    pub page: u32,
    pub section: Section,
    pub bytes: Vec<u8>,
}

impl Run {
    fn key(&self) -> (u8, u32, Section) {
        (self.column, self.page, self.section)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub name: String,
    pub column: u8,
    pub page: u32,
    pub offset: u32,
}

/// One DATA operation as placed by the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub column: u8,
    pub page: u32,
    pub offset: u32,
    pub op: String,
}

/// Assembled control-code image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub config: AsmConfig,
    pub runs: Vec<Run>, // sorted by (column, page, section)
    #[serde(default)]
    pub labels: Vec<LabelEntry>,
    #[serde(default)]
    pub data_map: Vec<Placement>,
}

impl Image {
    pub fn new(config: AsmConfig) -> Self {
        Self { config, runs: Vec::new(), labels: Vec::new(), data_map: Vec::new() }
    }

    pub fn run(&self, section: Section, column: u8, page: u32) -> Option<&Run> {
        self.runs
            .binary_search_by_key(&(column, page, section), Run::key)
            .ok()
            .map(|i| &self.runs[i])
    }

    fn run_mut(&mut self, section: Section, column: u8, page: u32) -> &mut Run {
        let key = (column, page, section);
        let i = match self.runs.binary_search_by_key(&key, Run::key) {
            Ok(i) => i,
            Err(i) => {
                self.runs.insert(i, Run { column, page, section, bytes: Vec::new() });
                i
            }
        };
        &mut self.runs[i]
    }

    pub fn bytes(&self, section: Section, column: u8, page: u32) -> &[u8] {
        self.run(section, column, page).map(|r| r.bytes.as_slice()).unwrap_or(&[])
    }

    /// Distinct (column, page) pairs in image order.
    pub fn pages(&self) -> Vec<(u8, u32)> {
        let mut v: Vec<(u8, u32)> = self.runs.iter().map(|r| (r.column, r.page)).collect();
        v.extend(self.labels.iter().map(|l| (l.column, l.page)));
        v.sort_unstable();
        v.dedup();
        v
    }

    /// TEXT followed by DATA for one page.
    pub fn page_bytes(&self, column: u8, page: u32) -> Vec<u8> {
        let mut out = self.bytes(Section::Text, column, page).to_vec();
        out.extend_from_slice(self.bytes(Section::Data, column, page));
        out
    }

    /// Columns and pages per column of the raw export: every column up to the
    /// highest one used, each with as many pages as the longest column.
    pub fn bin_shape(&self) -> (u32, u32) {
        let pages = self.pages();
        let columns = pages.iter().map(|p| p.0 as u32 + 1).max().unwrap_or(0);
        let per_column = pages.iter().map(|p| p.1 + 1).max().unwrap_or(0);
        (columns, per_column)
    }

    /// Byte offset of a page in the raw export.
    pub fn bin_offset(&self, column: u8, page: u32) -> usize {
        let (_, per_column) = self.bin_shape();
        (column as usize * per_column as usize + page as usize) * self.config.page_size as usize
    }

    /// Raw export. Columns follow each other in ascending order and every
    /// column holds the same number of pages, so page `p` of column `c` starts
    /// at [`Image::bin_offset`]. Pages with no content are zero-filled.
    pub fn to_bin(&self) -> Vec<u8> {
        let page_size = self.config.page_size as usize;
        let (columns, per_column) = self.bin_shape();
        let mut out = Vec::with_capacity(columns as usize * per_column as usize * page_size);
        for column in 0..columns {
            for page in 0..per_column {
                let mut bytes = self.page_bytes(column as u8, page);
                bytes.resize(bytes.len().max(page_size), 0);
                out.extend_from_slice(&bytes);
            }
        }
        out
    }

    /// Puts runs, labels and DATA placements in canonical order. Images read
    /// from disk must go through this before lookups, which binary search the
    /// runs.
    pub fn normalize(&mut self) -> Result<()> {
        self.runs.sort_by_key(Run::key);
        if let Some(w) = self.runs.windows(2).find(|w| w[0].key() == w[1].key()) {
            let (column, page, section) = w[0].key();
            return Err(Error::DuplicateRun { column, page, section });
        }
        self.labels.sort_by(|a, b| {
            (a.column, a.page, a.offset, &a.name).cmp(&(b.column, b.page, b.offset, &b.name))
        });
        self.data_map.sort_by_key(|p| (p.column, p.page, p.offset));
        Ok(())
    }

    pub fn add_label(&mut self, name: &str, column: u8, page: u32, offset: u32) {
        self.labels.push(LabelEntry { name: name.to_string(), column, page, offset });
    }

    /// Label table in the shape deserializers use for reverse lookup.
    pub fn symbols(&self) -> Result<SymbolTable> {
        let mut t = SymbolTable::new();
        for l in &self.labels {
            let kind = SymbolKind::Label { column: l.column, page: l.page };
            t.define(&l.name, Symbol { value: l.offset as u64, kind })?;
        }
        Ok(t)
    }
}

impl Writer for Image {
    fn write_bytes(&mut self, bytes: &[u8], section: Section, column: u8, page: u32) -> Result<()> {
        if column >= self.config.columns {
            return Err(Error::ColumnOutOfRange { column: column as u64, limit: self.config.columns });
        }
        if page >= self.config.max_pages {
            return Err(Error::PageOutOfRange { page, limit: self.config.max_pages });
        }
        trace!(%section, column, page, len = bytes.len(), "write");
        self.run_mut(section, column, page).bytes.extend_from_slice(bytes);
        Ok(())
    }

    fn written(&self, section: Section, column: u8, page: u32) -> usize {
        self.bytes(section, column, page).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_stay_sorted_and_in_call_order() {
        let mut img = Image::new(AsmConfig::default());
        img.write_words(&[1], Section::Data, 1, 0).unwrap();
        img.write_words(&[2], Section::Text, 0, 0).unwrap();
        img.write_words(&[3], Section::Data, 1, 0).unwrap();
        let keys: Vec<_> = img.runs.iter().map(|r| (r.column, r.page, r.section)).collect();
        assert_eq!(keys, vec![(0, 0, Section::Text), (1, 0, Section::Data)]);
        assert_eq!(img.bytes(Section::Data, 1, 0), &[1, 0, 0, 0, 3, 0, 0, 0]);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let cfg = AsmConfig { columns: 2, max_pages: 4, ..AsmConfig::default() };
        let mut img = Image::new(cfg);
        assert!(matches!(
            img.write_words(&[0], Section::Text, 2, 0),
            Err(Error::ColumnOutOfRange { column: 2, limit: 2 })
        ));
        assert!(matches!(
            img.write_words(&[0], Section::Text, 0, 4),
            Err(Error::PageOutOfRange { page: 4, limit: 4 })
        ));
        assert!(img.runs.is_empty());
    }

    #[test]
    fn bin_export_pads_pages() {
        let cfg = AsmConfig { page_size: 16, ..AsmConfig::default() };
        let mut img = Image::new(cfg);
        img.write_words(&[0xff], Section::Text, 0, 0).unwrap();
        img.write_words(&[0xee], Section::Data, 0, 0).unwrap();
        img.write_words(&[0xdd], Section::Text, 0, 1).unwrap();
        let bin = img.to_bin();
        assert_eq!(bin.len(), 32);
        assert_eq!(&bin[0..8], &[0xff, 0, 0, 0, 0xee, 0, 0, 0]);
        assert_eq!(bin[16], 0xdd);
    }

    #[test]
    fn bin_export_keeps_empty_pages_and_column_stride() {
        let cfg = AsmConfig { page_size: 16, ..AsmConfig::default() };
        let mut img = Image::new(cfg);
        img.write_words(&[0xff], Section::Text, 0, 2).unwrap();
        img.write_words(&[0xee], Section::Text, 2, 0).unwrap();
        assert_eq!(img.bin_shape(), (3, 3));
        let bin = img.to_bin();
        assert_eq!(bin.len(), 3 * 3 * 16);
        assert_eq!(img.bin_offset(0, 2), 32);
        assert_eq!(bin[32], 0xff);
        assert_eq!(img.bin_offset(2, 0), 96);
        assert_eq!(bin[96], 0xee);
        assert_eq!(bin.iter().filter(|b| **b != 0).count(), 2);
        assert!(Image::new(cfg).to_bin().is_empty());
    }

    #[test]
    fn normalize_sorts_and_rejects_duplicates() {
        let mut img = Image::new(AsmConfig::default());
        let run = |column, section, b: u8| Run { column, page: 0, section, bytes: vec![b, 0, 0, 0] };
        img.runs = vec![run(1, Section::Text, 2), run(0, Section::Data, 1), run(0, Section::Text, 0)];
        img.normalize().unwrap();
        assert_eq!(img.bytes(Section::Text, 0, 0), &[0, 0, 0, 0]);
        assert_eq!(img.bytes(Section::Data, 0, 0), &[1, 0, 0, 0]);
        assert_eq!(img.bytes(Section::Text, 1, 0), &[2, 0, 0, 0]);

        img.runs.push(run(1, Section::Text, 3));
        assert!(matches!(
            img.normalize(),
            Err(Error::DuplicateRun { column: 1, page: 0, section: Section::Text })
        ));
    }
}
