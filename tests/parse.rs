use pretty_assertions::assert_eq;

use ctrlcode_rs::parse::parse_source;
use ctrlcode_rs::{Directive, Error, Item, Operation};

#[test]
fn statements_and_directives() {
    let src = "
        .set BASE, 0x100      ; constant
        .attach_to_group 1
        write_32 BASE , 7     // spaces around commas
        bd:
        uc_dma_bd 0, 0, 4, 0, 1
        .eop
    ";
    assert_eq!(
        parse_source(src).unwrap(),
        vec![
            Item::Dir(Directive::Set { name: "BASE".into(), value: "0x100".into() }),
            Item::Dir(Directive::AttachToGroup("1".into())),
            Item::Op(Operation::new("write_32", &["BASE", "7"])),
            Item::Label("bd".into()),
            Item::Op(Operation::new("uc_dma_bd", &["0", "0", "4", "0", "1"])),
            Item::Dir(Directive::Eop),
        ]
    );
}

#[test]
fn directive_shape_errors() {
    for (src, line) in [(".eop 1", 1), ("nop\n.set X", 2), ("\n\n.attach_to_group", 3)] {
        let err = parse_source(src).unwrap_err();
        assert!(matches!(err, Error::Parse { line: l, .. } if l == line), "{src}: {err}");
    }
}
