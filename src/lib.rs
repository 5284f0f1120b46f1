pub mod assets;
pub mod cache;
pub mod cli;
pub mod config;
pub mod emit;
pub mod flock;
pub mod git;
pub mod manifest;
pub mod model;
pub mod resolve;
pub mod resolver;

mod api;

pub use api::{Sourcegen, SourcegenBuilder};
