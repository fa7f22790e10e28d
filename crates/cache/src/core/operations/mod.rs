//! Cache operations module

mod get;
mod misc;
mod put;
pub(super) mod remove;
pub(super) mod utils;

// Operations are implemented directly on the Cache type
