use nix::errno::Errno;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MountError {
    #[error("Mount point must not be empty")]
    Empty,

    #[error("Mount point {0} contains a NUL byte")]
    InvalidPath(String),

    #[error("No check bytes left; too many concurrent mounts")]
    Exhausted,

    #[error("Nothing is mounted at {0}")]
    NotFound(String),

    #[error("Failed to draw a mount cookie: {0}")]
    Random(getrandom::Error),
}

impl MountError {
    /// The `errno` reported through the C registration API.
    pub fn errno(&self) -> Errno {
        match self {
            MountError::Empty | MountError::InvalidPath(_) => Errno::EINVAL,
            MountError::Exhausted => Errno::ENOMEM,
            MountError::NotFound(_) => Errno::ENOENT,
            MountError::Random(e) => e
                .raw_os_error()
                .map(Errno::from_raw)
                .unwrap_or(Errno::EIO),
        }
    }
}
