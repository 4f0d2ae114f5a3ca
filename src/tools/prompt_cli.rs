use clap::{Parser, Subcommand};
use contentgen_backend::helper::prompt_builder::{build_prompt, build_voice_prompt};
use contentgen_backend::helper::time_helpers::{format_yangon, parse_yangon_local};
use contentgen_backend::models::generation::{GenerationForm, OutputLanguage};
use contentgen_backend::models::reference_table::lookup_reference;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "prompt_cli", author, version, about = "Inspect prompts and trial expiry conversions offline.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the prompt for a JSON generation request.
    Render {
        #[arg(long, value_name = "FILE")]
        request: PathBuf,
    },
    /// Render the voice prompt for a language.
    Voice {
        #[arg(long, default_value = "English")]
        language: String,
    },
    /// Show the reference passage chosen for a purpose.
    Reference {
        #[arg(long)]
        purpose: String,
    },
    /// Convert an admin wall-clock input to the stored Asia/Yangon timestamp.
    Expiry {
        #[arg(long)]
        local: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli.command) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("❌ Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Commands) -> Result<String, String> {
    match command {
        Commands::Render { request } => render_request(request),
        Commands::Voice { language } => OutputLanguage::parse(language)
            .map(build_voice_prompt)
            .ok_or_else(|| format!("Unknown language '{}'. Use 'English' or 'Myanmar'.", language)),
        Commands::Reference { purpose } => {
            let passage = lookup_reference(purpose);
            if passage.is_empty() {
                Ok(format!("ℹ️ No reference passage matches '{}'.", purpose))
            } else {
                Ok(passage)
            }
        }
        Commands::Expiry { local } => parse_yangon_local(local)
            .map(format_yangon)
            .map_err(|e| e.to_string()),
    }
}

fn render_request(path: &Path) -> Result<String, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Could not read '{}': {}", path.display(), e))?;
    let form: GenerationForm = serde_json::from_str(&raw)
        .map_err(|e| format!("'{}' is not a valid generation request: {}", path.display(), e))?;
    let request = form.validate().map_err(|e| e.to_string())?;
    Ok(build_prompt(&request))
}
