use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use ctrlcode_rs::{image::Image, parse, AsmConfig, Item};

pub fn load_config(path: Option<&Path>) -> Result<AsmConfig> {
    let Some(path) = path else { return Ok(AsmConfig::default()) };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(AsmConfig::from_json(&text)?)
}

pub fn read_source(path: &Path) -> Result<Vec<Item>> {
    let src = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(parse::parse_source(&src)?)
}

pub fn load_image(path: &Path) -> Result<Image> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut img: Image =
        serde_json::from_str(&text).with_context(|| format!("{} is not an image", path.display()))?;
    img.normalize().with_context(|| format!("{} is not a valid image", path.display()))?;
    Ok(img)
}

pub fn save_image(path: &Path, img: &Image) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(img)?)?;
    Ok(())
}

/// Raw export: see [`Image::to_bin`] for the page layout.
pub fn save_bin(path: &Path, img: &Image) -> Result<()> {
    std::fs::write(path, img.to_bin())?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolOut {
    pub name: String,
    pub column: u8,
    pub page: u32,
    pub offset: u32,
}

impl SymbolOut {
    pub fn from_image(img: &Image) -> Vec<SymbolOut> {
        let mut v: Vec<SymbolOut> = img
            .labels
            .iter()
            .map(|l| SymbolOut { name: l.name.clone(), column: l.column, page: l.page, offset: l.offset })
            .collect();
        v.sort_by_key(|s| (s.column, s.page, s.offset));
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlcode_rs::{Assembler, Section};

    #[test]
    fn image_survives_json_file() {
        let cwd = std::env::current_dir().unwrap();
        let path = cwd.join("_test_image.json");
        let items = parse::parse_source("write_32 0x10, 1\nbd:\n.long 42\n").unwrap();
        let img = Assembler::default().assemble(&items).unwrap();
        save_image(&path, &img).unwrap();
        let back = load_image(&path).unwrap();
        assert_eq!(back, img);
        assert_eq!(SymbolOut::from_image(&back)[0].offset, 12);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn loaded_runs_are_put_in_order() {
        let cwd = std::env::current_dir().unwrap();
        let path = cwd.join("_test_unsorted_image.json");
        let items = parse::parse_source("nop\nbd:\n.long 42\n").unwrap();
        let img = Assembler::default().assemble(&items).unwrap();
        let mut shuffled = img.clone();
        shuffled.runs.reverse();
        save_image(&path, &shuffled).unwrap();
        let back = load_image(&path).unwrap();
        assert_eq!(back, img);
        assert_eq!(back.bytes(Section::Data, 0, 0), &[42, 0, 0, 0]);

        let mut doubled = img.clone();
        doubled.runs.push(img.runs[0].clone());
        save_image(&path, &doubled).unwrap();
        assert!(load_image(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
