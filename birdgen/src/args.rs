// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

pub use clap::Parser;
use config::Globals;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "birdgen", about = "BIRD routing daemon configuration generator")]
pub struct CmdArgs {
    /// Network plan (YAML)
    #[arg(long, value_name = "FILE")]
    pub plan: PathBuf,

    /// Previous-run state (JSON); created on first run
    #[arg(long, value_name = "FILE")]
    pub state: PathBuf,

    /// Where to write the generated configuration
    #[arg(long, value_name = "FILE")]
    pub output: PathBuf,

    /// Pre-resolved IRR/PeeringDB answers (JSON), for builds without
    /// live resolver access
    #[arg(long, value_name = "FILE")]
    pub external_data: Option<PathBuf>,

    /// Narrow the private-ASN range for deterministic fixtures
    #[arg(long)]
    pub test_mode: bool,

    /// Emit daemon debug statements and verbose generator logging
    #[arg(long)]
    pub debug: bool,

    /// Daemon log file (stderr when absent)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<String>,

    /// VRF the daemon operates in
    #[arg(long, value_name = "NAME")]
    pub vrf: Option<String>,

    /// Kernel routing table id, required with --vrf
    #[arg(long, value_name = "ID")]
    pub routing_table: Option<u32>,

    /// Skip the 2x deviation guard for IRR-resolved data
    #[arg(long)]
    pub ignore_irr_changes: bool,

    /// Skip the 2x deviation guard for PeeringDB prefix limits
    #[arg(long)]
    pub ignore_peeringdb_changes: bool,

    /// Serve IRR/PeeringDB answers from previous-run state
    #[arg(long)]
    pub use_cached: bool,
}

impl CmdArgs {
    pub fn globals(&self) -> Globals {
        Globals {
            debug: self.debug,
            test_mode: self.test_mode,
            vrf: self.vrf.clone(),
            routing_table: self.routing_table,
            log_file: self.log_file.clone(),
            ignore_irr_changes: self.ignore_irr_changes,
            ignore_peeringdb_changes: self.ignore_peeringdb_changes,
            use_cached: self.use_cached,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_to_globals() {
        let args = CmdArgs::parse_from([
            "birdgen",
            "--plan",
            "plan.yaml",
            "--state",
            "state.json",
            "--output",
            "bird.conf",
            "--test-mode",
            "--use-cached",
            "--vrf",
            "red",
            "--routing-table",
            "90",
        ]);
        let globals = args.globals();
        assert!(globals.test_mode);
        assert!(globals.use_cached);
        assert!(!globals.ignore_irr_changes);
        assert_eq!(globals.vrf.as_deref(), Some("red"));
        assert_eq!(globals.routing_table, Some(90));
    }
}
