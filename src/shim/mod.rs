mod control;
mod dir;
mod forward;
mod io;
mod meta;
mod open;
mod paths;
mod shim_struct;
mod stat;
mod xattr;

pub use shim_struct::*;
