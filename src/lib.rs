//! industree: industry hierarchy editor
//!
//! Layers, innermost first:
//! - `domain`: forest model, builder, path queries
//! - `application`: editor services (mutations, drag and drop, panes, scroll continuity)
//! - `infrastructure`: backend, dialogs, render surface, wiring
//! - `cli`: command line front end

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
