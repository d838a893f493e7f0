use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use deltastate_tools::{
    decode_patches, format_change, format_state_pretty, inspect_patches, load_registry,
    InspectReport,
};
use glob::Pattern;
use schema::{registry_hash, TypeId};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "deltastate-tools",
    version,
    about = "deltastate patch inspection and decoding tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Trace the changes each patch records.
    Inspect {
        /// Patch files, or directories of patch files, applied in order.
        #[arg(required = true)]
        patches: Vec<PathBuf>,
        /// Type registry JSON.
        #[arg(long)]
        registry: PathBuf,
        /// Type id of the root state.
        #[arg(long, default_value_t = 0)]
        root: TypeId,
        /// Glob filter for files inside patch directories.
        #[arg(long)]
        glob: Option<String>,
    },
    /// Apply a sequence of patches and print the resulting state.
    Decode {
        /// Patch files, or directories of patch files, applied in order.
        #[arg(required = true)]
        patches: Vec<PathBuf>,
        /// Type registry JSON.
        #[arg(long)]
        registry: PathBuf,
        /// Type id of the root state.
        #[arg(long, default_value_t = 0)]
        root: TypeId,
        /// Glob filter for files inside patch directories.
        #[arg(long)]
        glob: Option<String>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
    },
    /// Print a registry's type table and hash.
    Registry {
        /// Type registry JSON.
        registry: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Inspect {
            patches,
            registry,
            root,
            glob,
        } => {
            let registry = load_registry(&registry)?;
            println!(
                "registry: {} types, hash 0x{:016x}",
                registry.len(),
                registry_hash(&registry)
            );
            let entries = collect_patch_entries(&patches, glob.as_deref())?;
            let bytes = read_patches(&entries)?;
            let reports = inspect_patches(registry, root, &bytes)?;
            for (entry, report) in entries.iter().zip(&reports) {
                println!("== {} ({} bytes) ==", entry.display(), report.stats.bytes);
                print_inspect_report(report);
            }
        }
        Command::Decode {
            patches,
            registry,
            root,
            glob,
            format,
        } => {
            let registry = load_registry(&registry)?;
            let entries = collect_patch_entries(&patches, glob.as_deref())?;
            let state = decode_patches(registry, root, &read_patches(&entries)?)?;
            match format {
                DecodeFormat::Json => {
                    let json = serde_json::to_string_pretty(&state).context("serialize json")?;
                    println!("{json}");
                }
                DecodeFormat::Pretty => {
                    print!("{}", format_state_pretty(&state));
                }
            }
        }
        Command::Registry { registry } => {
            let registry = load_registry(&registry)?;
            println!("hash: 0x{:016x}", registry_hash(&registry));
            for (id, descriptor) in registry.iter() {
                println!("type {id}: {}", descriptor.name());
                for field in descriptor.fields() {
                    println!("  [{}] {}: {:?}", field.index, field.name, field.ty);
                }
            }
        }
    }
    Ok(())
}

/// Expands directories into their files, sorted by path so numbered patch
/// dumps apply in sequence.
fn collect_patch_entries(paths: &[PathBuf], glob: Option<&str>) -> Result<Vec<PathBuf>> {
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    let mut entries = Vec::new();
    for path in paths {
        if !path.is_dir() {
            entries.push(path.clone());
            continue;
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("read dir {}", path.display()))? {
            let file = entry?.path();
            if !file.is_file() {
                continue;
            }
            if let Some(pattern) = &pattern {
                let matches_path = pattern.matches_path(&file);
                let matches_name = file
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| pattern.matches(name));
                if !matches_path && !matches_name {
                    continue;
                }
            }
            files.push(file);
        }
        files.sort();
        entries.extend(files);
    }
    Ok(entries)
}

fn read_patches(entries: &[PathBuf]) -> Result<Vec<Vec<u8>>> {
    entries.iter().map(|path| read_patch(path)).collect()
}

fn read_patch(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read patch {}", path.display()))
}

fn print_inspect_report(report: &InspectReport) {
    let stats = &report.stats;
    println!(
        "structures: {} changes: {} resyncs: {} collected: {}",
        stats.structures, stats.changes, stats.resyncs, stats.collected
    );
    for line in &report.changes {
        println!("  {}", format_change(line));
    }
    for (ref_id, field_index, skipped) in &report.unknown_fields {
        println!("  unknown field {field_index} on {ref_id}, skipped {skipped} bytes");
    }
    if !report.collected.is_empty() {
        let ids: Vec<String> = report.collected.iter().map(ToString::to_string).collect();
        println!("  collected: {}", ids.join(", "));
    }
}
