// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use crate::cli::args::TopologyArgs;
use crate::cli::parse::load_topology;
use crate::{Topology, error, info, section};

/// Run the topology command.
pub fn run_topology(args: &TopologyArgs) {
    match load_topology(args.topology.as_deref()) {
        Ok(topology) => {
            for line in describe(&topology) {
                info!("{line}");
            }
        }
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}

/// Render the part and limb tables.
fn describe(topology: &Topology) -> Vec<String> {
    section!(
        "Topology: {} parts, {} limbs, {} field channels",
        topology.num_parts(),
        topology.num_limbs(),
        topology.num_paf_channels()
    );

    let mut lines = vec!["Parts:".to_string()];
    for (i, name) in topology.parts().iter().enumerate() {
        lines.push(format!("  {i:>3}  {name}"));
    }
    lines.push("Limbs:".to_string());
    for (i, limb) in topology.limbs().iter().enumerate() {
        lines.push(format!(
            "  {i:>3}  {:<16} -> {:<16} paf[{}, {}]",
            topology.part_name(limb.source).unwrap_or("?"),
            topology.part_name(limb.target).unwrap_or("?"),
            limb.paf_x,
            limb.paf_y
        ));
    }
    lines
}
