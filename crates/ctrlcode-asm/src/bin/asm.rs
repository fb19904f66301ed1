use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;

use ctrlcode_asm::{load_config, read_source, save_bin, save_image};
use ctrlcode_rs::Assembler;

#[derive(Parser, Debug)]
#[command(author, version, about = "Control-code assembler")]
struct Opts {
    /// Input assembly file (one operation, label or directive per line)
    #[arg(short, long)]
    input: PathBuf,
    /// Output file
    #[arg(short, long)]
    output: PathBuf,
    /// json keeps labels and DATA placements for disassembly; bin is the padded page dump
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
    /// Assembler configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print placed jobs, barriers and eof/.eop markers
    #[arg(long)]
    summary: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format { Json, Bin }

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let cfg = load_config(opts.config.as_deref())?;
    let items = read_source(&opts.input)?;

    let layout = Assembler::new(cfg).layout(&items)?;
    let img = layout.emit()?;

    if opts.summary {
        let state = layout.state();
        for job in state.jobs() {
            let end = job.end.map(|e| format!("{e:#x}")).unwrap_or_else(|| "-".into());
            println!(
                "job {:<4} col {} page {:<3} [{:#x}, {end}) deferred={} launches={:?} barriers={:?}",
                job.id, job.column, job.page, job.start, job.deferred, job.launches, job.barriers
            );
        }
        for (barrier, jobs) in state.barriers() {
            println!("barrier {barrier:<4} jobs={jobs:?}");
        }
        for m in state.markers() {
            let kind = format!("{:?}", m.kind).to_lowercase();
            println!("{kind:<8} col {} page {:<3} [{:#x}, {:#x})", m.column, m.page, m.start, m.end);
        }
    }

    match opts.format {
        Format::Json => save_image(&opts.output, &img)?,
        Format::Bin => save_bin(&opts.output, &img)?,
    }
    info!(output = %opts.output.display(), pages = img.pages().len(), "wrote image");
    Ok(())
}
