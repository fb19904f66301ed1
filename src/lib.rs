pub mod assembler;
pub mod config;
pub mod disasm;
pub mod error;
pub mod image;
pub mod ops;
pub mod parse;
pub mod resolve;
pub mod section;
pub mod state;
pub mod stream;
pub mod symbols;

pub mod isa {
    pub mod aie2ps; // control-code instruction set
}

pub use assembler::{Assembler, Directive, Item, Layout, Operation};
pub use config::AsmConfig;
pub use error::{Error, Result};
pub use image::Image;
pub use section::Section;
