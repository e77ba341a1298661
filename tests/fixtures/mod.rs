#![allow(dead_code)]

mod fixture_shim;
mod mem_fs;

pub use fixture_shim::*;
pub use mem_fs::*;
