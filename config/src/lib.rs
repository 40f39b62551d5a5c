// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Build-scoped configuration: global options, the persisted state
//! mapping, override lookup and the shared error taxonomy.

pub mod errors;
pub mod globals;
pub mod overrides;
pub mod statemap;

pub use errors::ConfigError;
pub use globals::Globals;
pub use statemap::StateMap;
