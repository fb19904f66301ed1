use ctrlcode_rs::resolve::resolve;
use ctrlcode_rs::symbols::{Symbol, SymbolKind, SymbolTable};
use ctrlcode_rs::Error;

fn table() -> SymbolTable {
    let mut t = SymbolTable::new();
    t.define("BASE", Symbol { value: 0x1000, kind: SymbolKind::Constant }).unwrap();
    t.define("bd", Symbol { value: 0x40, kind: SymbolKind::Label { column: 1, page: 2 } }).unwrap();
    t
}

#[test]
fn literal_forms() {
    let t = SymbolTable::new();
    assert_eq!(resolve("0x1F", &t).unwrap(), 0x1f);
    assert_eq!(resolve("  42 ", &t).unwrap(), 42);
    assert_eq!(resolve("tile_2_3", &t).unwrap(), (2 << 5) | 3);
    assert_eq!(resolve("s2mm_1", &t).unwrap(), 1);
    assert_eq!(resolve("mm2s_1", &t).unwrap(), 7);
}

#[test]
fn symbols_resolve_to_exact_value() {
    let t = table();
    assert_eq!(resolve("BASE", &t).unwrap(), 0x1000);
    assert_eq!(resolve("@bd", &t).unwrap(), 0x40);
    assert!(matches!(resolve("@later", &t), Err(Error::SymbolResolution { name }) if name == "later"));
}

#[test]
fn bad_tokens_never_become_zero() {
    let t = table();
    for tok in ["0xzz", "0x+10", "0x", "0X-1", "12ab", "tile_1", "tile_x_1", "s2mm_", "@", "@1x", "a-b", ""] {
        let err = resolve(tok, &t).unwrap_err();
        assert!(matches!(err, Error::MalformedLiteral { .. }), "{tok}: {err}");
    }
    assert!(matches!(resolve("undefined", &t), Err(Error::SymbolResolution { .. })));
}
