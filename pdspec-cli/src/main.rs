use anyhow::{bail, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pdspec::{
    default_config_path, generate_samples, load_config, resolve_config_path,
    validate_outputs_with, DocumentProcessor, ExtractionConfig, RunSummary,
};

#[derive(Parser, Debug)]
#[command(name = "pdspec")]
#[command(about = "Extract and cross-validate the outline of a specification document")]
struct Args {
    /// Document to process (.pdf, .txt with form-feed page breaks, or Tika .xhtml)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for the JSONL files and the validation workbook
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Write sample output files into <output-dir>/samples
    #[arg(short = 's', long)]
    generate_samples: bool,

    /// Only check the files already in the output directory
    #[arg(long)]
    validate_only: bool,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reject records that violate the output schema instead of writing them
    #[arg(long)]
    strict: bool,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("❌ {e}");
            for cause in e.chain().skip(1) {
                eprintln!("   caused by: {cause}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Ok(false) means the run finished but the outputs did not validate.
fn run(args: &Args) -> Result<bool> {
    println!("🦀 pdspec Outline Extractor");

    let config_path = resolve_config_path(args.config.as_deref(), default_config_path());
    let loaded = load_config(config_path.as_deref(), args.strict);
    match (&loaded.source, &config_path) {
        (Some(path), _) => println!("📋 Loaded config from: {}", path.display()),
        (None, Some(path)) => println!(
            "⚠️  Could not load config from {}, using default config",
            path.display()
        ),
        (None, None) => println!("📋 Using default config"),
    }
    let config = loaded.config;
    debug!(?config, "effective configuration");

    if args.validate_only {
        return Ok(validate(&args.output_dir, &config));
    }

    if args.generate_samples {
        let samples = generate_samples(&args.output_dir, &config)?;
        println!("🧪 Sample files written to: {}", samples.display());
        if args.input.is_none() {
            return Ok(true);
        }
    }

    let Some(input) = &args.input else {
        bail!("No input document given. Use --input <path>, --generate-samples or --validate-only");
    };

    println!("📄 Processing: {}", input.display());
    let summary = DocumentProcessor::for_files(input, &args.output_dir, &config)?
        .with_profiling(args.profile)
        .run()?;
    print_summary(&summary);

    // Discrepancies are findings, not failures
    validate(&args.output_dir, &config);
    Ok(true)
}

fn print_summary(summary: &RunSummary) {
    let outcome = &summary.outcome;
    let report = &outcome.report;

    println!("✅ Successfully processed: {}", outcome.doc_title);
    println!("📊 Outline metrics:");
    println!("   - Pages: {}", outcome.metadata.total_pages);
    println!("   - Outline entries: {}", outcome.entries.len());
    println!("   - Sections: {}", outcome.sections.len());
    println!("   - Max level: {}", outcome.metadata.max_level);
    println!(
        "   - Records written: {} (rejected: {})",
        summary.records_written, summary.records_rejected
    );

    if report.is_valid {
        println!("🔍 Outline and sections agree ({} identifiers matched)", report.summary.matched);
    } else {
        println!(
            "⚠️  {} discrepancies between outline and sections:",
            report.messages.len()
        );
        for message in &report.messages {
            println!("   - {message}");
        }
    }

    for warning in outcome.warnings.iter().chain(&summary.sink_warnings) {
        println!("⚠️  {warning}");
    }
    for file in &summary.files {
        println!("💾 {}", file.display());
    }
}

fn validate(output_dir: &Path, config: &ExtractionConfig) -> bool {
    let validation = validate_outputs_with(output_dir, &config.output);
    if validation.is_valid() {
        println!(
            "✅ Output files in {} match the record schema",
            output_dir.display()
        );
        return true;
    }

    println!("❌ Output validation failed:");
    for problem in validation.problems() {
        println!("   - {problem}");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["pdspec", "-i", "spec.pdf"]).unwrap();
        assert_eq!(args.input, Some(PathBuf::from("spec.pdf")));
        assert_eq!(args.output_dir, PathBuf::from("output"));
        assert!(!args.strict && !args.validate_only && !args.generate_samples);
    }

    #[test]
    fn test_short_flags() {
        let args =
            Args::try_parse_from(["pdspec", "-s", "-v", "-o", "out", "-c", "pd.yaml"]).unwrap();
        assert!(args.generate_samples);
        assert!(args.verbose);
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert_eq!(args.config, Some(PathBuf::from("pd.yaml")));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().to_str().unwrap();
        let args = Args::try_parse_from(["pdspec", "-o", out, "-c", "/nonexistent.yaml"]).unwrap();
        assert!(run(&args).is_err());
    }

    #[test]
    fn test_samples_then_validate_only() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().to_str().unwrap();
        let config = "/nonexistent.yaml";

        let args = Args::try_parse_from(["pdspec", "-s", "-o", out, "-c", config]).unwrap();
        assert!(run(&args).unwrap());

        // the top-level directory has no outputs yet
        let args =
            Args::try_parse_from(["pdspec", "--validate-only", "-o", out, "-c", config]).unwrap();
        assert!(!run(&args).unwrap());
    }
}
