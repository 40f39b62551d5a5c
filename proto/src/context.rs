// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Build-scoped context threaded through every section.
//!
//! This is explicit, per-build state: no singletons, no ambient globals,
//! so test builds never leak into one another. Protocol sections mutate
//! the shared accumulators (constants, functions, tables) here during
//! pass 1; the root builder flattens them last during pass 2.

use config::{Globals, StateMap};
use functions::FunctionRegistry;
use irr::cache::{CachedIrr, CachedLimits};
use irr::{IrrSource, PrefixLimitSource};

use crate::sections::constants::Constants;
use crate::sections::tables::Tables;

pub struct BuildContext<'a> {
    pub globals: &'a Globals,
    /// Previous-run state, read-only: cached external data, diff baseline
    /// and operator override directives.
    pub previous: &'a StateMap,
    /// State being written for the next run. Persisted only on success.
    pub state: StateMap,
    pub constants: Constants,
    pub functions: FunctionRegistry,
    pub tables: Tables,
    irr_source: &'a dyn IrrSource,
    limit_source: &'a dyn PrefixLimitSource,
    /// Flipped when any section needs the bogon constant lists.
    pub need_bogons: bool,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        globals: &'a Globals,
        previous: &'a StateMap,
        irr_source: &'a dyn IrrSource,
        limit_source: &'a dyn PrefixLimitSource,
    ) -> Self {
        Self {
            globals,
            previous,
            state: StateMap::new(),
            constants: Constants::new(),
            functions: FunctionRegistry::new(),
            tables: Tables::new(),
            irr_source,
            limit_source,
            need_bogons: false,
        }
    }

    /// IRR resolution, served from previous-run state under `use_cached`.
    pub fn irr(&self) -> CachedIrr<'_> {
        CachedIrr::new(self.irr_source, self.previous, self.globals.use_cached)
    }

    /// PeeringDB prefix limits, same caching rule.
    pub fn limits(&self) -> CachedLimits<'_> {
        CachedLimits::new(self.limit_source, self.previous, self.globals.use_cached)
    }
}
