use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Input character file (.casp)
    pub input: PathBuf,
    /// Output JSON document; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Escalate every diagnostic to fatal and require an Idle state
    #[arg(long)]
    pub strict: bool,
    /// Parse metadata only (editor fast path)
    #[arg(long)]
    pub metadata_only: bool,
}
