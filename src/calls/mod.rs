mod args;
mod fcntl;
mod open_flags;
mod record;
mod ret;
mod sink;
pub mod spec;

pub use args::*;
pub use fcntl::*;
pub use open_flags::*;
pub use record::*;
pub use ret::*;
pub use sink::*;
pub use spec::{ArgLayout, CallSpec};
