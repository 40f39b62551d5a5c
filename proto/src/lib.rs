// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Protocol policy compilers and section tree for BIRD configuration
//! generation.
//!
//! A build is one synchronous pass over the network plan: pass 1
//! constructs and configures every section (during which protocol
//! sections contribute constants, functions and tables into the shared
//! accumulators), pass 2 flattens the whole tree into the final line
//! sequence. Ordering guarantees are load-bearing; nothing here is or
//! should become concurrent.

pub mod bgp;
pub mod context;
pub mod direct;
pub mod filters;
pub mod kernel;
pub mod names;
pub mod ospf;
pub mod pipe;
pub mod plan;
pub mod rip;
pub mod routeclass;
pub mod rpki;
pub mod sections;
pub mod statics;

pub use context::BuildContext;
pub use plan::NetworkPlan;
pub use sections::builder::{BuildOutput, Builder};

use config::ConfigError;
use doc::ConfigDoc;

/// One configuration section. `configure` runs exactly once per object
/// during pass 1; later calls are no-ops. `doc` is read during pass 2.
pub trait Section {
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), ConfigError>;
    fn doc(&self) -> &ConfigDoc;
}
