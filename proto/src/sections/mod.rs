// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! The section tree: root builder plus the fixed top-level sections.
//!
//! Root assembly order is fixed: logging, main, router-id, constants,
//! functions, tables, protocols. The constants/functions/tables sections
//! are shared accumulators that protocol sections contribute to while
//! configuring; they flatten only after every protocol section ran.

pub mod builder;
pub mod constants;
pub mod logging;
pub mod main;
pub mod protocols;
pub mod routerid;
pub mod tables;
