//! `control_packet stream_id, address, data0 [, data1 .. data3]`
//!
//! ```text
//! DW0  stream_id[4:0]
//! DW1  (n - 1) << 20            n = number of data words, 1..=4
//! DW2  address[31:0]
//! DW3  address[47:32]
//! DW4.. data
//! ```

use bitvec::prelude::*;

use crate::error::{Arity, Result};
use crate::ops::{check_section, read_words, Field, OpDeserializer, OpKind, OpSerializer, Slot};
use crate::resolve::{canonical, Arg};
use crate::state::AssemblyState;
use crate::stream::{Reader, Writer};
use crate::symbols::SymbolTable;

pub const NAME: &str = "control_packet";

const ARITY: Arity = Arity::between(3, 6);
const HEADER_WORDS: usize = 4;
const STREAM_ID: Field = Field::new("stream_id", 5);
const ADDRESS: Field = Field::new("address", 48);
const DATA: Field = Field::new("data", 32);
const COUNT_SHIFT: u32 = 20;

type Header = BitArray<[u32; HEADER_WORDS], Lsb0>;

#[derive(Debug)]
pub struct ControlPacketSerializer {
    stream_id: Arg,
    address: Arg,
    data: Vec<Arg>,
}

impl ControlPacketSerializer {
    pub fn new(args: &[String], state: &AssemblyState) -> Result<Self> {
        ARITY.check(NAME, args.len())?;
        Ok(Self {
            stream_id: STREAM_ID.prepare(NAME, &args[0], state)?,
            address: ADDRESS.prepare(NAME, &args[1], state)?,
            data: args[2..]
                .iter()
                .map(|tok| DATA.prepare(NAME, tok, state))
                .collect::<Result<_>>()?,
        })
    }
}

impl OpSerializer for ControlPacketSerializer {
    fn size(&self) -> u32 {
        4 * (HEADER_WORDS + self.data.len()) as u32
    }

    fn align(&self) -> u32 {
        4
    }

    fn serialize(&self, writer: &mut dyn Writer, slot: Slot, symbols: &SymbolTable) -> Result<()> {
        check_section(OpKind::ControlPacket, slot)?;
        let stream_id = STREAM_ID.resolve(NAME, &self.stream_id, symbols)?;
        let address = ADDRESS.resolve(NAME, &self.address, symbols)?;

        let mut hdr = Header::new([0; HEADER_WORDS]);
        hdr[0..5].store_le(stream_id as u8);
        hdr[64..112].store_le(address);
        let mut words = hdr.into_inner().to_vec();
        words[1] = ((self.data.len() as u32) - 1) << COUNT_SHIFT;
        for d in &self.data {
            words.push(DATA.resolve(NAME, d, symbols)? as u32);
        }
        writer.write_words(&words, slot.section, slot.column, slot.page)
    }
}

/// Literal values only.
#[derive(Debug)]
pub struct ControlPacketDeserializer;

impl OpDeserializer for ControlPacketDeserializer {
    fn align(&self) -> u32 {
        4
    }

    fn deserialize(&self, reader: &mut dyn Reader) -> Result<Vec<String>> {
        let mut words = [0u32; HEADER_WORDS];
        words.copy_from_slice(&read_words(reader, NAME, HEADER_WORDS)?);
        let count = ((words[1] >> COUNT_SHIFT) & 0x3) as usize + 1;
        let hdr = Header::new(words);

        let mut args = vec![
            canonical(hdr[0..5].load_le::<u8>() as u64),
            canonical(hdr[64..112].load_le::<u64>()),
        ];
        for w in read_words(reader, NAME, count)? {
            args.push(canonical(w as u64));
        }
        Ok(args)
    }
}
