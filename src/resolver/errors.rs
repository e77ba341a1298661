use nix::errno::Errno;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Failed to load isolated {library}: {reason}")]
    Load { library: String, reason: String },

    #[error("Failed to resolve {name}@{version}: {reason}")]
    MissingSymbol {
        name: &'static str,
        version: &'static str,
        reason: String,
    },

    #[error("Sandbox root {path} is unreachable: {errno}")]
    RootUnreachable { path: String, errno: Errno },
}

/// Everything that can stop the shim from coming up.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Invalid configuration: {0:#}")]
    Config(anyhow::Error),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}
