// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use crate::cli::args::ParseArgs;
use crate::cli::logging::{set_json_stdout, set_verbose};
use crate::io::{load_tensor3, load_tensor4, save_json};
use crate::{ParseResult, PoseParser, Result, Scale, Topology, VERSION};
use crate::{error, section, success, verbose, warn};

/// Load the topology named on the command line, or the built-in one.
pub fn load_topology(path: Option<&std::path::Path>) -> Result<Topology> {
    let topology = path.map_or_else(|| Ok(Topology::human_pose()), Topology::from_path)?;
    for part in topology.unconnected_parts() {
        warn!("Topology part '{part}' is not connected to any limb");
    }
    Ok(topology)
}

/// Run the parse command.
#[allow(clippy::cast_precision_loss)]
pub fn run_parse(args: &ParseArgs) {
    set_verbose(args.verbose);
    set_json_stdout(args.json);

    let results = match parse_files(args) {
        Ok(results) => results,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let n = results.len().max(1) as f64;
    let (peaks, matching, assembly) = results.iter().fold((0.0, 0.0, 0.0), |acc, r| {
        (
            acc.0 + r.speed.peaks,
            acc.1 + r.speed.matching,
            acc.2 + r.speed.assembly,
        )
    });
    verbose!(
        "Speed: {:.2}ms peaks, {:.2}ms matching, {:.2}ms assembly per image",
        peaks / n,
        matching / n,
        assembly / n
    );

    if args.json {
        match serde_json::to_string_pretty(&results) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!("Failed to serialize results: {e}");
                process::exit(1);
            }
        }
    }

    if let Some(path) = &args.output {
        if let Err(e) = save_json(&results, path) {
            error!("Failed to save results: {e}");
            process::exit(1);
        }
        success!("Results saved to {}", path.display());
    }
}

fn parse_files(args: &ParseArgs) -> Result<Vec<ParseResult>> {
    let topology = load_topology(args.topology.as_deref())?;
    let scale = Scale::uniform(args.scale)?;
    let parser = PoseParser::new(topology, args.config())?;

    verbose!(
        "pafpose {VERSION} 🚀 {} parts, {} limbs",
        parser.topology().num_parts(),
        parser.topology().num_limbs()
    );

    let results = if args.batch {
        let cmap = load_tensor4(&args.cmap)?;
        let paf = load_tensor4(&args.paf)?;
        parser.parse_batch(cmap.view(), paf.view(), scale)?
    } else {
        let cmap = load_tensor3(&args.cmap)?;
        let paf = load_tensor3(&args.paf)?;
        vec![parser.parse(cmap.view(), paf.view(), scale)?]
    };

    let total = results.len();
    for (i, result) in results.iter().enumerate() {
        verbose!(
            "image {}/{} {}x{}: {}",
            i + 1,
            total,
            result.map_shape.0,
            result.map_shape.1,
            result.verbose()
        );
        print_skeletons(&parser, result);
    }

    Ok(results)
}

fn print_skeletons(parser: &PoseParser, result: &ParseResult) {
    if result.is_empty() {
        return;
    }
    section!("Skeletons");
    for (i, skeleton) in result.skeletons.iter().enumerate() {
        verbose!(
            "  #{i} confidence {:.3}, {} parts",
            skeleton.confidence,
            skeleton.num_parts()
        );
        for (part, kpt) in skeleton.keypoints.iter().enumerate() {
            if let Some(kpt) = kpt {
                verbose!(
                    "      {:<16} ({:8.1}, {:8.1})  {:.3}",
                    parser.topology().part_name(part).unwrap_or("?"),
                    kpt.x,
                    kpt.y,
                    kpt.confidence
                );
            }
        }
    }
    if result.stats.dropped_conflicts > 0 {
        verbose!(
            "  {} conflicting connection(s) dropped",
            result.stats.dropped_conflicts
        );
    }
}
