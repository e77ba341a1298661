#![allow(
    clippy::collapsible_else_if,
    clippy::collapsible_if,
    clippy::module_inception,
    clippy::needless_range_loop,
    clippy::result_map_unit_fn,
    clippy::useless_format
)]
#![deny(
    clippy::get_unwrap,
    clippy::panic,
    clippy::print_stdout,
    clippy::unwrap_used,
    clippy::use_debug,
    clippy::used_underscore_binding,
    clippy::used_underscore_items
)]

//! `LD_PRELOAD` file-operation interposer.
//!
//! Calls on device and kernel pseudo-filesystem paths are re-rooted below a
//! sandbox directory, path prefixes can be mounted onto virtual filesystem
//! back-ends, and every intercepted call is written to a call log.

pub mod calls;
pub mod classify;
pub mod config;
#[cfg(all(
    feature = "interpose",
    target_os = "linux",
    target_env = "gnu",
    target_arch = "x86_64"
))]
mod exports;
pub mod fd;
pub mod logger;
pub mod mount;
pub mod resolver;
pub mod runtime;
pub mod shim;
pub mod util;

pub use calls::{CallLog, CallRecord};
pub use config::{Config, LogFormat, LogSink, Variant};
pub use fd::{demangle, is_virtual, mangle};
pub use mount::{FsOperations, FsResult, MountError};
pub use resolver::{InitError, RealLibc, ResolveError};
#[cfg(all(target_os = "linux", target_env = "gnu", target_arch = "x86_64"))]
pub use runtime::{mount, unmount};
pub use shim::Shim;
