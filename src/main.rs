use anyhow::Result;
use clap::{Parser, Subcommand};
use datacite_entries::{batch, submit, suggest};

#[derive(Parser)]
#[command(name = "datacite-entries")]
#[command(about = "Normalize, serialize and save DataCite resource records")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite stored records into canonical save payloads
    Normalize(batch::NormalizeArgs),
    /// Map one stored record and send it to the storage service
    Submit(submit::SubmitArgs),
    /// Look up organization suggestions for an affiliation
    Suggest(suggest::SuggestArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    match cli.command {
        Commands::Normalize(args) => batch::run(args).map(|_| ()),
        Commands::Submit(args) => submit::run(args),
        Commands::Suggest(args) => suggest::run(args),
    }
}
