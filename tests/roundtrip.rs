use pretty_assertions::assert_eq;

use ctrlcode_rs::disasm::{disassemble, listing};
use ctrlcode_rs::parse::parse_source;
use ctrlcode_rs::{Assembler, Image, Item};

fn assemble(src: &str) -> Image {
    Assembler::default().assemble(&parse_source(src).unwrap()).unwrap()
}

fn reassemble(img: &Image) -> (Vec<Item>, Image) {
    let items = disassemble(img).unwrap();
    let again = Assembler::new(img.config).assemble(&items).unwrap();
    (items, again)
}

const PROGRAM: &str = "
; column 0, page 0
.set BASE, 0x1000
start_job 0
    write_32 BASE, 0x2a
    uc_dma_write_des 0, @bd0
    wait_uc_dma 0
    apply_offset_57 @table, 2, 0x10
end_job
eof

bd0:
    uc_dma_bd @payload, 0x80000000, 0x10, 0, 1
table:
    .long 0
    .long 1
    .align 64
pkt:
    control_packet 1, 0x40000, 0xdead, 0xbeef
shim:
    shim_dma_bd 0x10002000, 0x100, 1, 0, 1
payload:
    .long 0xdeadbeef
.eop
    nop

.attach_to_group 1
start_job 1
    local_barrier 0, 2
    mask_write_32 tile_0_2, 0xff, 3
end_job
";

#[test]
fn whole_program_reassembles_to_identical_image() {
    let img = assemble(PROGRAM);
    let (_, again) = reassemble(&img);
    assert_eq!(again, img);
}

#[test]
fn listing_recovers_labels_and_alignment() {
    let img = assemble(PROGRAM);
    let (items, _) = reassemble(&img);
    let expected = "    start_job 0
    write_32 0x1000, 0x2a
    uc_dma_write_des 0, @bd0
    wait_uc_dma 0
    apply_offset_57 @table, 2, 0x10
    end_job
    eof
bd0:
    uc_dma_bd @payload, 0x80000000, 0x10, 0, 1
table:
    .long 0
    .long 1
pkt:
    .align 0x80
    control_packet 1, 0x40000, 0xdead, 0xbeef
shim:
    shim_dma_bd 0x10002000, 0x100, 1, 0, 1
payload:
    .long 0xdeadbeef
.eop
    nop
.attach_to_group 1
    start_job 1
    local_barrier 0, 2
    mask_write_32 2, 0xff, 3
    end_job
";
    assert_eq!(listing(&items), expected);
}

#[test]
fn text_padding_comes_back_as_nops() {
    let img = assemble("nop\n.align 16\neof");
    let (items, again) = reassemble(&img);
    assert_eq!(listing(&items), "    nop\n    nop\n    nop\n    nop\n    eof\n");
    assert_eq!(again.runs, img.runs);
}

#[test]
fn empty_pages_and_trailing_padding() {
    let img = assemble(".eop\n.eop\nnop\nd:\n.long 5\n.align 32\nend:");
    let (items, again) = reassemble(&img);
    assert_eq!(
        listing(&items),
        ".eop\n.eop\n    nop\nd:\n    .long 5\nend:\n    .align 0x20\n"
    );
    assert_eq!(again, img);
}

#[test]
fn data_without_placement_map_lists_words() {
    let mut img = assemble("nop\nbd:\nuc_dma_bd 0x40, 0, 4, 0, 0");
    img.data_map.clear();
    let (items, again) = reassemble(&img);
    // the padding before the descriptor is listed too
    assert_eq!(
        listing(&items),
        "    nop\n.Ldata_0_0:\n    .long 0\n    .long 0\n    .long 0\nbd:\n    .long 0\n    .long 0\n    .long 0x40\n    .long 4\n"
    );
    assert_eq!(again.runs, img.runs);
}

#[test]
fn unlabelled_data_gets_a_synthetic_label() {
    let mut img = assemble("nop\nbd:\n.long 7");
    img.labels.clear();
    let (items, again) = reassemble(&img);
    assert_eq!(listing(&items), "    nop\n.Ldata_0_0:\n    .long 7\n");
    assert_eq!(again.runs, img.runs);
}

#[test]
fn interleaved_columns_reassemble_to_identical_image() {
    let img = assemble(
        "nop
         d0:
         .long 1
         .attach_to_group 1
         nop
         e0:
         uc_dma_bd @e0, 0, 4, 0, 0
         .attach_to_group 0
         .long 2
         .attach_to_group 1
         .long 3",
    );
    let placements: Vec<_> = img.data_map.iter().map(|p| (p.column, p.page, p.offset)).collect();
    assert_eq!(placements, vec![(0, 0, 4), (0, 0, 8), (1, 0, 16), (1, 0, 32)]);
    let (items, again) = reassemble(&img);
    assert_eq!(
        listing(&items),
        "    nop\nd0:\n    .long 1\n    .long 2\n.attach_to_group 1\n    nop\ne0:\n    uc_dma_bd @e0, 0, 4, 0, 0\n    .long 3\n"
    );
    assert_eq!(again, img);
}
