use anyhow::{ensure, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ctrlcode_rs::{disasm, parse, AsmConfig, Assembler};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Assemble a control-code source, disassemble it and check that reassembly gives the same image"
)]
struct Opts {
    /// Assembler configuration (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<String>,
    /// Print the disassembly listing
    #[arg(long)]
    listing: bool,
    #[arg(value_name = "SRCFILE")]
    input: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let cfg = match &opts.config {
        Some(path) => AsmConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => AsmConfig::default(),
    };

    let src = std::fs::read_to_string(&opts.input)?;
    let items = parse::parse_source(&src)?;
    let image = Assembler::new(cfg).assemble(&items)?;

    let recovered = disasm::disassemble(&image)?;
    if opts.listing {
        print!("{}", disasm::listing(&recovered));
    }
    let again = Assembler::new(image.config).assemble(&recovered)?;
    ensure!(again.runs == image.runs, "reassembled runs differ from the assembled image");
    ensure!(again.data_map == image.data_map, "reassembled DATA placements differ");

    info!(items = items.len(), recovered = recovered.len(), "round trip ok");
    println!("ok: {} pages, {} bytes", image.pages().len(), image.to_bin().len());
    Ok(())
}
