//! Image back to source items.
//!
//! TEXT is decoded by opcode. DATA has no opcodes, so the placement map the
//! assembler stores in the image says which codec sits at which offset; when
//! it is missing the run is listed as `.long` words. Gaps that an
//! operation's own alignment does not explain come back as `.align`.

use tracing::debug;

use crate::assembler::{Directive, Item, Operation};
use crate::error::{Error, Result};
use crate::image::{Image, LabelEntry};
use crate::ops::{OpDeserializer, OpKind};
use crate::section::Section;
use crate::state::{align_up, AssemblyState};
use crate::stream::{Reader, SliceReader};

pub fn disassemble(image: &Image) -> Result<Vec<Item>> {
    let mut state = AssemblyState::with_symbols(image.config, image.symbols()?);
    let mut items = Vec::new();
    let mut at: Option<(u8, u32)> = None;
    for (column, page) in image.pages() {
        let first_page = match at {
            Some((c, p)) if c == column => p,
            Some(_) => {
                items.push(Item::Dir(Directive::AttachToGroup(column.to_string())));
                0
            }
            None if column != 0 => {
                items.push(Item::Dir(Directive::AttachToGroup(column.to_string())));
                0
            }
            None => 0,
        };
        for _ in first_page..page {
            items.push(Item::Dir(Directive::Eop));
        }
        text(&mut state, image, column, page, &mut items)?;
        data(&mut state, image, column, page, &mut items)?;
        at = Some((column, page));
    }
    debug!(items = items.len(), "disassembled");
    Ok(items)
}

fn op(name: &str, args: Vec<String>) -> Item {
    Item::Op(Operation { name: name.to_string(), args })
}

fn text(state: &mut AssemblyState, image: &Image, column: u8, page: u32, items: &mut Vec<Item>) -> Result<()> {
    state.seek(column, page, 0, Section::Text);
    let mut r = SliceReader::new(image.bytes(Section::Text, column, page));
    while let Some(opcode) = r.peek_u8() {
        let kind = OpKind::from_opcode(opcode)?;
        let args = kind.deserializer(state).deserialize(&mut r)?;
        items.push(op(kind.name(), args));
    }
    Ok(())
}

fn data(state: &mut AssemblyState, image: &Image, column: u8, page: u32, items: &mut Vec<Item>) -> Result<()> {
    let base = image.bytes(Section::Text, column, page).len() as u32;
    let bytes = image.bytes(Section::Data, column, page);
    let end = base + bytes.len() as u32;
    state.seek(column, page, base, Section::Data);

    let mut marks: Vec<(u32, OpKind)> = image
        .data_map
        .iter()
        .filter(|p| p.column == column && p.page == page)
        .map(|p| Ok((p.offset, OpKind::lookup(&p.op)?)))
        .collect::<Result<_>>()?;
    if image.data_map.is_empty() {
        marks = (base..end).step_by(4).map(|off| (off, OpKind::Word)).collect();
    }
    marks.sort_by_key(|m| m.0);

    let mut labels: Vec<&LabelEntry> =
        image.labels.iter().filter(|l| l.column == column && l.page == page).collect();
    labels.sort_by_key(|l| l.offset);
    let mut labels = labels.into_iter().peekable();

    // Operations in DATA are only legal after a label.
    let first = marks.first().map_or(end, |m| m.0);
    if !bytes.is_empty() && labels.peek().map_or(true, |l| l.offset > first) {
        items.push(Item::Label(format!(".Ldata_{column}_{page}")));
    }

    let mut r = SliceReader::with_base(bytes, base);
    let truncated = |op: &str, needed: u32, r: &SliceReader| Error::TruncatedStream {
        op: op.to_string(),
        needed: needed as usize,
        remaining: r.remaining(),
    };
    for (offset, kind) in marks {
        while let Some(l) = labels.next_if(|l| l.offset <= offset) {
            items.push(Item::Label(l.name.clone()));
        }
        let deser = kind.deserializer(state);
        if align_up(r.position(), deser.align()) != offset {
            r.seek(offset).ok_or_else(|| truncated(kind.name(), offset.saturating_sub(base), &r))?;
            let args = OpKind::Align.deserializer(state).deserialize(&mut r)?;
            items.push(op(OpKind::Align.name(), args));
        } else {
            r.seek(offset).ok_or_else(|| truncated(kind.name(), offset.saturating_sub(base), &r))?;
        }
        let args = deser.deserialize(&mut r)?;
        items.push(op(kind.name(), args));
    }
    for l in labels {
        items.push(Item::Label(l.name.clone()));
    }
    if r.position() < end {
        // Trailing padding from an `.align` with nothing after it.
        r.seek(end).ok_or_else(|| truncated(OpKind::Align.name(), end - base, &r))?;
        items.push(op(OpKind::Align.name(), OpKind::Align.deserializer(state).deserialize(&mut r)?));
    }
    Ok(())
}

/// One listing line per item.
pub fn fmt_item(item: &Item) -> String {
    match item {
        Item::Label(name) => format!("{name}:"),
        Item::Op(op) if op.args.is_empty() => format!("    {}", op.name),
        Item::Op(op) => format!("    {} {}", op.name, op.args.join(", ")),
        Item::Dir(Directive::Eop) => ".eop".to_string(),
        Item::Dir(Directive::AttachToGroup(column)) => format!(".attach_to_group {column}"),
        Item::Dir(Directive::Set { name, value }) => format!(".set {name}, {value}"),
    }
}

pub fn listing(items: &[Item]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&fmt_item(item));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_format() {
        let items = vec![
            Item::Label("bd".into()),
            Item::Op(Operation::new("write_32", &["0x10", "1"])),
            Item::Op(Operation::new("nop", &[])),
            Item::Dir(Directive::AttachToGroup("1".into())),
        ];
        assert_eq!(listing(&items), "bd:\n    write_32 0x10, 1\n    nop\n.attach_to_group 1\n");
    }
}
