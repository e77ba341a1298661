mod libc_io;
mod times;

pub use libc_io::*;
pub use times::*;
