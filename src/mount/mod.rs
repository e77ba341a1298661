mod c_operations;
mod errors;
mod mount_struct;
mod operations;
mod table;

pub use c_operations::*;
pub use errors::*;
pub use mount_struct::*;
pub use operations::*;
pub use table::*;
