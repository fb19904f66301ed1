pub mod model;

// Re-export commonly used helpers for the binaries
pub use model::{load_config, load_image, read_source, save_bin, save_image, SymbolOut};
