use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;

use ctrlcode_rs::disasm;
use ctrlcode_rs::Section;

use ctrlcode_asm::{load_image, SymbolOut};

#[derive(Parser, Debug)]
#[command(author, version, about = "Control-code image disassembler", long_about=None)]
struct Cli {
    /// Image file written by `asm --format json`
    #[arg(value_name = "IMAGE")]
    input: PathBuf,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List runs per column, page and section
    Sections,
    /// Reconstruct assembly source
    Listing {
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Print the label table
    Symbols {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat { Text, Json }

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let img = load_image(&cli.input)?;

    match cli.cmd {
        Command::Sections => {
            println!("{:<6} {:<6} {:<8} {:<#10} {:<#10}", "column", "page", "section", "start", "size");
            for (column, page) in img.pages() {
                let mut start = 0u32;
                for section in Section::ALL {
                    let len = img.bytes(*section, column, page).len() as u32;
                    if len > 0 {
                        println!("{column:<6} {page:<6} {:<8} {start:#010x} {len:#010x}", section.to_string());
                    }
                    start += len;
                }
            }
        }
        Command::Listing { out } => {
            let items = disasm::disassemble(&img)?;
            let text = disasm::listing(&items);
            if let Some(path) = out { std::fs::write(path, text)?; } else { print!("{}", text); }
        }
        Command::Symbols { format } => {
            let symbols = SymbolOut::from_image(&img);
            match format {
                OutputFormat::Text => {
                    for s in &symbols {
                        println!("{:>2}:{:<4} {:#010x}  {}", s.column, s.page, s.offset, s.name);
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&symbols)?),
            }
        }
    }
    Ok(())
}
