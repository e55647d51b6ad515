//! CLI for provscan: extract metadata and AI-generation prompts from images and videos.

#![cfg(feature = "cli")]

use clap::Parser;
use indexmap::IndexMap;
use provscan::deep_scan::{best_prompt, format_candidates};
use provscan::export::{export_metadata, export_prompt};
use provscan::{
    classify_extension, detect_media_kind, Analyzer, Capabilities, Extraction, PromptCandidate,
    ScanConfig, Section,
};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Parser)]
#[command(name = "provscan")]
#[command(about = "Extract image/video metadata and recover AI generation prompts", long_about = None)]
struct Args {
    /// Image, video or directory to inspect
    path: Option<String>,

    /// Inspect every supported file in a directory
    #[arg(short = 'd', long = "directory", value_name = "DIR")]
    directory: Option<String>,

    /// Descend into subdirectories (with a directory path)
    #[arg(short, long)]
    recursive: bool,

    /// Also run the exhaustive prompt search over the whole file
    #[arg(long)]
    deep: bool,

    /// Output JSON per file (one line per file unless --pretty)
    #[arg(long)]
    json: bool,

    /// Indent JSON output (with --json)
    #[arg(long)]
    pretty: bool,

    /// Write <stem>_metadata.json and <stem>_prompt.txt for each file
    #[arg(long)]
    export: bool,

    /// Directory for exported files (default: next to each source file)
    #[arg(long, value_name = "DIR", requires = "export")]
    out_dir: Option<PathBuf>,

    /// TOML file with scan settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Quiet: only print files where a prompt was found
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let args = Args::parse();

    let config = match &args.config {
        Some(file) => ScanConfig::from_file(file)?,
        None => ScanConfig::default(),
    };
    let analyzer = Analyzer::new(config, Capabilities::default());

    let path_str = args
        .directory
        .as_ref()
        .or(args.path.as_ref())
        .ok_or("No input: pass a file or directory, or use -d/--directory <DIR>")?;
    let path = Path::new(path_str.as_str());

    if !path.exists() {
        eprintln!("Not found: {}", path.display());
        std::process::exit(1);
    }

    if path.is_file() {
        if args.directory.is_some() {
            eprintln!("--directory expects a directory, not a file: {}", path.display());
            std::process::exit(1);
        }
        if !scan_file(path, &analyzer, &args)? {
            std::process::exit(1);
        }
        return Ok(());
    }

    if path.is_dir() {
        if !args.quiet {
            eprintln!(
                "Scanning directory: {} {}",
                path.display(),
                if args.recursive { "(recursive)" } else { "" }
            );
        }
        scan_dir(path, &analyzer, &args)?;
        return Ok(());
    }

    eprintln!("Not a file or directory: {}", path.display());
    std::process::exit(1);
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "provscan=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Returns `false` when the file was rejected by the dispatcher.
fn scan_file(
    path: &Path,
    analyzer: &Analyzer,
    args: &Args,
) -> Result<bool, Box<dyn std::error::Error>> {
    let extraction = match analyzer.analyze(path) {
        Ok(extraction) => extraction,
        Err(e) => {
            eprintln!("{}: {}", path.display(), e);
            return Ok(false);
        }
    };
    let bytes = fs::read(path)?;
    let candidates = if args.deep {
        analyzer.deep_scan(path)?
    } else {
        Vec::new()
    };
    let prompt = best_prompt(extraction.prompt.as_deref(), &candidates);

    if args.export {
        let out_dir = args.out_dir.as_deref();
        let written = export_metadata(&extraction.document, path, out_dir)?;
        if !args.quiet {
            eprintln!("Exported {}", written.display());
        }
        match export_prompt(prompt.as_deref(), path, out_dir) {
            Ok(written) if !args.quiet => eprintln!("Exported {}", written.display()),
            Ok(_) => {}
            Err(provscan::Error::NoPrompt(_)) => {
                if !args.quiet {
                    eprintln!("No prompt to export for {}", path.display());
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    print_result(
        path,
        &extraction,
        prompt.as_deref(),
        &candidates,
        analyzer.config().top_candidates,
        args,
        &bytes,
    )?;
    Ok(true)
}

fn scan_dir(
    dir: &Path,
    analyzer: &Analyzer,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let walker = if args.recursive {
        WalkDir::new(dir).into_iter()
    } else {
        WalkDir::new(dir).max_depth(1).into_iter()
    };

    let mut total = 0u64;
    let mut with_prompt = 0u64;

    for entry in walker.filter_entry(|e| e.depth() == 0 || !is_hidden(e.path())) {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if classify_extension(&ext).is_none() {
            continue;
        }
        total += 1;
        let extraction = match analyzer.analyze(path) {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipped");
                continue;
            }
        };
        if extraction.prompt.is_some() {
            with_prompt += 1;
        }
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(_) => continue,
        };
        let candidates = if args.deep {
            analyzer.deep_scan(path).unwrap_or_default()
        } else {
            Vec::new()
        };
        let prompt = best_prompt(extraction.prompt.as_deref(), &candidates);
        if args.export {
            let out_dir = args.out_dir.as_deref();
            export_metadata(&extraction.document, path, out_dir)?;
            if let Some(p) = &prompt {
                export_prompt(Some(p), path, out_dir)?;
            }
        }
        print_result(
            path,
            &extraction,
            prompt.as_deref(),
            &candidates,
            analyzer.config().top_candidates,
            args,
            &bytes,
        )?;
    }

    if !args.quiet {
        eprintln!("Scanned {} files, {} with a detected prompt", total, with_prompt);
    }
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn print_result(
    path: &Path,
    extraction: &Extraction,
    prompt: Option<&str>,
    candidates: &[PromptCandidate],
    top: usize,
    args: &Args,
    bytes: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    if args.quiet && prompt.is_none() {
        return Ok(());
    }
    let doc = &extraction.document;
    if args.json {
        let mut out = IndexMap::<String, Value>::new();
        out.insert("sha256".to_string(), Value::String(sha256_hex(bytes)));
        out.insert("path".to_string(), Value::String(path.display().to_string()));
        out.insert(
            "kind".to_string(),
            serde_json::to_value(detect_media_kind(bytes).map(|k| k.label()))?,
        );
        out.insert("prompt".to_string(), serde_json::to_value(prompt)?);
        out.insert("metadata".to_string(), doc.as_value());
        if args.deep {
            out.insert("deep_scan".to_string(), serde_json::to_value(candidates)?);
        }
        let json_str = if args.pretty {
            serde_json::to_string_pretty(&out)?
        } else {
            serde_json::to_string(&out)?
        };
        println!("{}", json_str);
        return Ok(());
    }

    println!("{}", path.display());
    println!("  sha256: {}", sha256_hex(bytes));
    if let Some(basic) = doc.section(Section::Basic) {
        for key in ["File Size", "Image Format", "Dimensions"] {
            if let Some(v) = basic.get(key).and_then(Value::as_str) {
                println!("  {}: {}", key.to_lowercase(), v);
            }
        }
    }
    match doc.get_str(Section::AiMetadata, "Generator") {
        Some(generator) => println!("  generator: {}", generator),
        None if !args.quiet => println!("  generator: none detected"),
        None => {}
    }
    if let Some(p) = prompt {
        println!("  prompt: {}", p);
    }
    if let Some(errors) = doc.section(Section::Error) {
        for (k, v) in errors {
            println!("  error: {}: {}", k, v.as_str().unwrap_or_default());
        }
    }
    if let Some(notice) = doc.section(Section::Notice) {
        for v in notice.values() {
            println!("  notice: {}", v.as_str().unwrap_or_default());
        }
    }
    if !args.quiet {
        let names: Vec<&str> = doc.sections().map(|(name, _)| name).collect();
        println!("  sections: {}", names.join(", "));
    }
    if args.deep {
        if candidates.is_empty() {
            println!("  deep scan: no potential prompts found");
        } else {
            println!("  deep scan: {} potential prompts", candidates.len());
            for line in format_candidates(candidates, top).lines() {
                println!("    {}", line);
            }
        }
    }
    Ok(())
}
