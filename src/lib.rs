pub mod cli;
pub mod model;
pub mod modules;
pub mod parser;
pub mod writer;

use anyhow::Context;
use clap::Parser;

pub use model::ParsedCharacter;
pub use parser::{ParseOptions, ParseOutcome, parse_character, parse_metadata_only};

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // 1. ── Parse ──────────────────────────────────────────────────────
    if args.metadata_only {
        let metadata = parser::parse_metadata_only(&args.input)
            .map_err(|e| anyhow::anyhow!("{}", e.render()))
            .with_context(|| format!("Parsing metadata of {}", args.input.display()))?;
        for (key, value) in &metadata.fields {
            println!("{key}: {value}");
        }
        return Ok(());
    }

    let modules = modules::standard_modules();
    let options = ParseOptions { strict: args.strict };
    let outcome = parser::parse_character(&args.input, &modules, &options)
        .map_err(|e| anyhow::anyhow!("{}", e.render()))
        .with_context(|| format!("Parsing {}", args.input.display()))?;

    for diag in &outcome.diagnostics {
        eprintln!("{diag}");
    }

    // 2. ── Write the document ─────────────────────────────────────────
    match &args.output {
        Some(path) => {
            writer::json::emit(&outcome.character, path)
                .with_context(|| "Writing character document")?;
            println!(
                "Parsed `{}`: {} variables, {} states",
                outcome.character.metadata.name(),
                outcome.character.variables.len(),
                outcome.character.states.len()
            );
        }
        None => {
            println!("{}", writer::json::to_json_string(&outcome.character)?);
        }
    }

    Ok(())
}
