use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use split_core::{GeneratorConfig, SplitCatalog, SplitGenerator, SplitMap};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    /// Content catalog JSON; the built-in demo pack is used when omitted
    #[arg(long)]
    content: Option<PathBuf>,
    /// Generator tuning TOML; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Split name; a random split from the catalog is used when omitted
    #[arg(long)]
    split: Option<String>,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    let Some(path) = path else {
        return Ok(GeneratorConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse config TOML: {}", path.display()))
}

fn load_catalog(path: Option<&Path>) -> Result<SplitCatalog> {
    let Some(path) = path else {
        return Ok(SplitCatalog::build_default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read content file: {}", path.display()))?;
    SplitCatalog::from_json_str(&text)
        .with_context(|| format!("Invalid content catalog: {}", path.display()))
}

fn print_summary(map: &SplitMap) {
    let summary = map.summary();
    println!("Split: {} ({}x{})", summary.name, summary.width, summary.height);
    println!("Nodes per column: {:?}", summary.nodes_per_column);
    for (node_type, count) in &summary.node_types {
        println!("  {node_type:?}: {count}");
    }
    println!("Paths: {}", summary.path_count);
    println!(
        "Pruned: {}  Rejected candidates: {}  Secondary paths: {}  Dead ends: {}",
        summary.stats.pruned_nodes,
        summary.stats.rejected_candidates,
        summary.stats.secondary_paths,
        summary.stats.dead_ends
    );
    println!("Trees: {}", summary.stats.scenery_objects);
    println!("Fingerprint: {:016x}", summary.fingerprint);
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let catalog = load_catalog(args.content.as_deref())?;

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let definition = match &args.split {
        Some(name) => catalog.find(name).ok_or_else(|| anyhow!("Unknown split: {name}"))?,
        None => catalog.pick(&mut rng).ok_or_else(|| anyhow!("Content catalog has no splits"))?,
    };

    let map = SplitGenerator::new(config)
        .generate(&mut rng, definition, &catalog.archetypes)
        .with_context(|| format!("Failed to generate split {} for seed {}", definition.name, args.seed))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&map.summary())?);
    } else {
        print_summary(&map);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn missing_paths_fall_back_to_defaults() {
        let config = load_config(None).expect("default config");
        assert_eq!(config, GeneratorConfig::default());
        let catalog = load_catalog(None).expect("default catalog");
        assert!(catalog.find("greenwood").is_some());
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "[paths]\nbranch_chance = 0.8\n\n[layout]\nmax_nodes = 4").expect("write");

        let config = load_config(Some(file.path())).expect("config loads");
        assert_eq!(config.paths.branch_chance, 0.8);
        assert_eq!(config.layout.max_nodes, 4);
        assert_eq!(config.scenery, GeneratorConfig::default().scenery);
    }

    #[test]
    fn malformed_content_reports_the_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "{{ \"splits\": [").expect("write");

        let error = load_catalog(Some(file.path())).expect_err("truncated JSON must fail");
        assert!(format!("{error:#}").contains("Invalid content catalog"));
    }
}
