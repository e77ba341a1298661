//! The C symbols an `LD_PRELOAD` build puts in front of the real library.

mod calls;
mod lifecycle;
mod mount_api;
