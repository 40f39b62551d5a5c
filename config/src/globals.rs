// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Global build options, shared by reference across all sections.

use serde::Deserialize;

/// Options that apply to one whole build invocation. Created once per
/// build and never mutated after construction; per-build facts learned
/// during configuration go into the state mapping instead.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Globals {
    /// Emit daemon-level debug logging statements into the output.
    pub debug: bool,
    /// Narrow the private-ASN range and pin defaults for deterministic
    /// test output.
    pub test_mode: bool,
    /// VRF the daemon operates in, quoted into the main section.
    pub vrf: Option<String>,
    /// Kernel routing table id, present when `vrf` is.
    pub routing_table: Option<u32>,
    /// Daemon log file; stderr when absent.
    pub log_file: Option<String>,
    /// Skip the 2x deviation guard for IRR-resolved data.
    pub ignore_irr_changes: bool,
    /// Skip the 2x deviation guard for PeeringDB prefix limits.
    pub ignore_peeringdb_changes: bool,
    /// Serve IRR/PeeringDB answers from previous-run state instead of
    /// querying live sources.
    pub use_cached: bool,
}

impl Globals {
    /// Private ASN range legal for `replace_aspath` peers. Test mode
    /// narrows the range so fixtures stay deterministic.
    pub fn private_asn_range(&self) -> (u32, u32) {
        if self.test_mode {
            (4_200_000_000, 4_200_001_000)
        } else {
            (4_200_000_000, 4_294_967_294)
        }
    }

    pub fn is_private_asn(&self, asn: u32) -> bool {
        let (lo, hi) = self.private_asn_range();
        (lo..=hi).contains(&asn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_asn_range_narrows_in_test_mode() {
        let prod = Globals::default();
        assert!(prod.is_private_asn(4_200_000_000));
        assert!(prod.is_private_asn(4_294_967_294));
        assert!(!prod.is_private_asn(65001));

        let test = Globals {
            test_mode: true,
            ..Default::default()
        };
        assert!(test.is_private_asn(4_200_001_000));
        assert!(!test.is_private_asn(4_200_001_001));
    }
}
