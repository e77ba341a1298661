mod errors;
#[cfg(not(feature = "interpose"))]
mod host;
#[cfg(all(target_os = "linux", target_env = "gnu", target_arch = "x86_64"))]
mod isolated;
mod real_libc;

pub use errors::*;
#[cfg(not(feature = "interpose"))]
pub use host::*;
#[cfg(all(target_os = "linux", target_env = "gnu", target_arch = "x86_64"))]
pub use isolated::*;
pub use real_libc::*;
