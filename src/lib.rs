#![doc = "repo-flatten: turn a source repository into a single browsable document."]

//! Every file under a repository root is classified (text, binary, skipped), dated by its
//! oldest commit, and ordered so that the oldest parts of the tree come first.
//!
//! # Pipeline
//! [`download`] finds the files, [`classify`] decides how each one is treated, [`history`]
//! resolves ages, [`order`] produces the visiting order and [`assemble`] hands the ordered
//! records to the [`output`] writers. [`pipeline::render`] runs the whole chain.

pub mod assemble;
pub mod classify;
pub mod cli;
pub mod config;
pub mod contract;
pub mod download;
pub mod error;
pub mod history;
pub mod language;
pub mod load_config;
pub mod order;
pub mod output;
pub mod pipeline;

pub use cli::{run, Cli, Commands};
pub use error::RenderError;
