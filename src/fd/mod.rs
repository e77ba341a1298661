mod tag;
mod virtual_fds;

pub use tag::*;
pub use virtual_fds::*;
