use std::collections::HashSet;

use anyhow::{Result, bail};
use clap::Parser;
use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};
use serde::Serialize;
use split_core::mapgen::geometry::polylines_cross;
use split_core::{GeneratorConfig, NodeType, SplitCatalog, SplitGenerator, SplitMap};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 200)]
    runs: u64,
}

#[derive(Serialize)]
struct FuzzFailure {
    seed: u64,
    split: String,
    reason: String,
}

fn check_invariants(map: &SplitMap, exemption_radius: f32) -> Result<(), String> {
    let origin = map.node(map.origin).ok_or("origin missing")?;
    if origin.outgoing.is_empty() {
        return Err("origin has no outgoing path".to_owned());
    }
    let terminal = map.node(map.terminal).ok_or("terminal missing")?;
    if terminal.node_type() != NodeType::MajorBattle || !terminal.outgoing.is_empty() {
        return Err("terminal must be a major battle with no outgoing paths".to_owned());
    }

    for node in map.nodes.values() {
        if node.id != map.origin && node.incoming.is_empty() {
            return Err(format!("orphan node on floor {}", node.floor));
        }
    }

    let paths: Vec<_> = map.paths.values().collect();
    for (index, path) in paths.iter().enumerate() {
        let (Some(from), Some(to)) = (map.node(path.from), map.node(path.to)) else {
            return Err("path references a removed node".to_owned());
        };
        if to.floor != from.floor + 1 {
            return Err(format!("path from floor {} to floor {}", from.floor, to.floor));
        }
        let dense: HashSet<_> = path.pixel_points.iter().collect();
        for other in &paths[index + 1..] {
            if polylines_cross(&path.render_points, &other.render_points, exemption_radius) {
                return Err(format!("crossing paths leaving floor {}", from.floor));
            }
            let shares_node = [path.from, path.to].iter().any(|id| [other.from, other.to].contains(id));
            if !shares_node && other.pixel_points.iter().any(|pixel| dense.contains(pixel)) {
                return Err(format!("overlapping path pixels leaving floor {}", from.floor));
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    println!("Starting split fuzz at seed {} for {} runs...", args.seed, args.runs);
    let catalog = SplitCatalog::build_default();
    let config = GeneratorConfig::default();
    let exemption_radius = config.paths.endpoint_exemption_radius;
    let generator = SplitGenerator::new(config);

    let mut failures = Vec::new();
    for seed in args.seed..args.seed.saturating_add(args.runs) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let Some(definition) = catalog.pick(&mut rng) else {
            bail!("Content catalog has no splits");
        };
        let outcome = generator
            .generate(&mut rng, definition, &catalog.archetypes)
            .map_err(|error| error.to_string())
            .and_then(|map| check_invariants(&map, exemption_radius));
        if let Err(reason) = outcome {
            warn!(seed, split = %definition.name, %reason, "invariant failed");
            failures.push(FuzzFailure { seed, split: definition.name.clone(), reason });
        }
    }

    info!(runs = args.runs, failures = failures.len(), "fuzzing finished");
    if !failures.is_empty() {
        println!("{}", serde_json::to_string_pretty(&failures)?);
        bail!("{} of {} runs violated split invariants", failures.len(), args.runs);
    }
    println!("Fuzzing completed successfully.");
    Ok(())
}
