#![allow(dead_code)]

use ctrlcode_rs::ops::{OpDeserializer, OpKind, OpSerializer, Slot};
use ctrlcode_rs::state::AssemblyState;
use ctrlcode_rs::stream::{SliceReader, Writer};
use ctrlcode_rs::{AsmConfig, Result, Section};

/// Records every byte and counts calls; one run only.
#[derive(Debug, Default)]
pub struct CountingWriter {
    pub bytes: Vec<u8>,
    pub calls: usize,
}

impl Writer for CountingWriter {
    fn write_bytes(&mut self, bytes: &[u8], _section: Section, _column: u8, _page: u32) -> Result<()> {
        self.bytes.extend_from_slice(bytes);
        self.calls += 1;
        Ok(())
    }

    fn written(&self, _section: Section, _column: u8, _page: u32) -> usize {
        self.bytes.len()
    }
}

pub const TEXT: Slot = Slot { section: Section::Text, column: 0, page: 0 };
pub const DATA: Slot = Slot { section: Section::Data, column: 0, page: 0 };

pub fn args(a: &[&str]) -> Vec<String> {
    a.iter().map(|s| s.to_string()).collect()
}

pub fn state() -> AssemblyState {
    AssemblyState::new(AsmConfig::default())
}

/// Serializes one operation and checks it wrote exactly `size()` bytes.
pub fn encode_with(state: &AssemblyState, name: &str, a: &[&str], slot: Slot) -> Result<Vec<u8>> {
    let ser = OpKind::lookup(name)?.serializer(&args(a), state)?;
    let mut w = CountingWriter::default();
    ser.serialize(&mut w, slot, &state.symbols)?;
    assert_eq!(w.bytes.len(), ser.size() as usize, "{name} size");
    Ok(w.bytes)
}

pub fn encode(name: &str, a: &[&str], slot: Slot) -> Result<Vec<u8>> {
    encode_with(&state(), name, a, slot)
}

pub fn decode_with(state: &AssemblyState, name: &str, bytes: &[u8]) -> Result<Vec<String>> {
    let kind = OpKind::lookup(name)?;
    kind.deserializer(state).deserialize(&mut SliceReader::new(bytes))
}

pub fn decode(name: &str, bytes: &[u8]) -> Result<Vec<String>> {
    decode_with(&state(), name, bytes)
}

pub fn words(bytes: &[u8]) -> Vec<u32> {
    bytes.chunks(4).map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
}
