//! Slicing run orchestration for thumbslice
//!
//! Turns one sprite sheet into the full set of mission result thumbnails.
//!
//! # Overview
//!
//! - **Context**: resolved paths and settings for the run
//! - **Pipeline**: source resolution, region resolution, extraction, writing
//! - **Progress**: console status, warnings and the completion summary
//! - **Result**: per-cell outcomes of a run
//!
//! # Example
//!
//! ```ignore
//! use thumbslice::config::load_config_from_cwd;
//! use thumbslice::slice::{ConsoleProgress, SliceContext, SlicePipeline};
//!
//! let context = SliceContext::from_loaded(load_config_from_cwd(None)?);
//! let reporter = ConsoleProgress::new();
//! let report = SlicePipeline::new(context, &reporter).run()?;
//! println!("Wrote {} thumbnails", report.written_count());
//! ```

pub mod context;
pub mod pipeline;
pub mod progress;
pub mod result;

pub use context::*;
pub use pipeline::*;
pub use progress::*;
pub use result::*;
