// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ParseConfig;

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Parse Options:
    --cmap <FILE>              Confidence map tensor (parts, H, W) as ndarray JSON
    --paf <FILE>               Part affinity field tensor (2 * limbs, H, W) as ndarray JSON
    --topology <FILE>          COCO category JSON [default: built-in human pose]
    --scale <SCALE>            Map cell to image pixel factor [default: 4]
    --batch                    Tensors carry a leading batch dimension
    --cmap-threshold <F>       Peak threshold [default: 0.1]
    --link-threshold <F>       Limb affinity threshold [default: 0.1]
    --json                     Print results as JSON on stdout
    --output <FILE>            Save results as JSON

Examples:
    pafpose topology
    pafpose topology --topology human_pose.json
    pafpose parse --cmap cmap.json --paf paf.json
    pafpose parse --cmap cmap.json --paf paf.json --scale 8 --min-parts 4
    pafpose parse --cmap batch_cmap.json --paf batch_paf.json --batch --json"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the part, limb and field channel table of a topology
    Topology(TopologyArgs),
    /// Assemble skeletons from confidence map and part affinity field tensors
    Parse(ParseArgs),
}

/// Arguments for the topology command.
#[derive(Args, Debug)]
pub struct TopologyArgs {
    /// COCO category JSON file (built-in human pose when omitted)
    #[arg(short, long)]
    pub topology: Option<PathBuf>,
}

/// Arguments for the parse command.
#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct ParseArgs {
    /// Confidence map tensor file
    #[arg(long)]
    pub cmap: PathBuf,

    /// Part affinity field tensor file
    #[arg(long)]
    pub paf: PathBuf,

    /// COCO category JSON file (built-in human pose when omitted)
    #[arg(short, long)]
    pub topology: Option<PathBuf>,

    /// Map cell to image pixel factor (network output stride)
    #[arg(long, default_value_t = 4.0)]
    pub scale: f32,

    /// Tensors carry a leading batch dimension
    #[arg(long, default_value_t = false)]
    pub batch: bool,

    /// Confidence map peak threshold
    #[arg(long, default_value_t = 0.1)]
    pub cmap_threshold: f32,

    /// Limb affinity threshold
    #[arg(long, default_value_t = 0.1)]
    pub link_threshold: f32,

    /// Maximum peaks per part type
    #[arg(long, default_value_t = 100)]
    pub max_peaks: usize,

    /// Line-integral samples per candidate limb
    #[arg(long, default_value_t = 10)]
    pub samples: usize,

    /// Peak suppression window radius
    #[arg(long, default_value_t = 1)]
    pub window_radius: usize,

    /// Minimum assigned parts per skeleton
    #[arg(long, default_value_t = 1)]
    pub min_parts: usize,

    /// Largest off-segment field component before a limb is rejected
    #[arg(long, default_value_t = 0.5)]
    pub perpendicular_tolerance: f32,

    /// Match limbs sequentially instead of on the thread pool
    #[arg(long, default_value_t = false)]
    pub sequential: bool,

    /// Print results as JSON on stdout
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Save results as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

impl ParseArgs {
    /// Parser configuration described by these arguments.
    #[must_use]
    pub const fn config(&self) -> ParseConfig {
        ParseConfig {
            cmap_threshold: self.cmap_threshold,
            link_threshold: self.link_threshold,
            max_peaks_per_part: self.max_peaks,
            line_integral_samples: self.samples,
            window_radius: self.window_radius,
            min_assigned_parts: self.min_parts,
            perpendicular_tolerance: self.perpendicular_tolerance,
            parallel: !self.sequential,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_args_defaults() {
        let args = Cli::parse_from(["app", "parse", "--cmap", "c.json", "--paf", "p.json"]);
        match args.command {
            Commands::Parse(parse_args) => {
                assert_eq!(parse_args.cmap, PathBuf::from("c.json"));
                assert!((parse_args.scale - 4.0).abs() < f32::EPSILON);
                assert!(parse_args.topology.is_none());
                assert!(parse_args.verbose);
                assert!(!parse_args.json);
                assert_eq!(parse_args.config(), ParseConfig::default());
            }
            Commands::Topology(_) => panic!("expected parse command"),
        }
    }

    #[test]
    fn test_parse_args_custom() {
        let args = Cli::parse_from([
            "app",
            "parse",
            "--cmap",
            "c.json",
            "--paf",
            "p.json",
            "--topology",
            "body.json",
            "--cmap-threshold",
            "0.3",
            "--min-parts",
            "4",
            "--sequential",
            "--verbose",
            "false",
        ]);
        match args.command {
            Commands::Parse(parse_args) => {
                assert_eq!(parse_args.topology, Some(PathBuf::from("body.json")));
                let config = parse_args.config();
                assert!((config.cmap_threshold - 0.3).abs() < f32::EPSILON);
                assert_eq!(config.min_assigned_parts, 4);
                assert!(!config.parallel);
                assert!(!parse_args.verbose);
            }
            Commands::Topology(_) => panic!("expected parse command"),
        }
    }

    #[test]
    fn test_topology_args() {
        let args = Cli::parse_from(["app", "topology"]);
        assert!(matches!(args.command, Commands::Topology(TopologyArgs { topology: None })));
    }
}
