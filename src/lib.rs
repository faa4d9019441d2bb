//! thumbslice - Library for slicing a mission results sprite sheet
//!
//! This library provides functionality to:
//! - Locate the sprite sheet, falling back to a secondary copy
//! - Resolve each (mission, variant) cell to a pixel rectangle, either from
//!   atlas metadata or an even grid
//! - Crop, normalize and write each cell as a WebP thumbnail

pub mod atlas;
pub mod cell;
pub mod cli;
pub mod config;
pub mod extract;
pub mod output;
pub mod region;
pub mod slice;
pub mod source;
