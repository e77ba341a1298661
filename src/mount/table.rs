use super::{FsOperations, Mount, MountError};
use log::{debug, trace};
use std::ffi::CStr;
use std::sync::Arc;

/// Value the check-byte counter holds while no mounts exist.
pub const CHECK_BYTE_INIT: u16 = 0;

type EntropySource = fn(&mut [u8]) -> Result<(), getrandom::Error>;

/**
 * Active mounts in registration order.
 *
 * Lookups walk the list backwards, so a later mount shadows any earlier one
 * whose mount point is also a prefix of the path.
 */
pub struct MountTable {
    mounts: Vec<Arc<Mount>>,
    check_byte: u16,
    entropy: EntropySource,
}

impl Default for MountTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MountTable {
    pub fn new() -> Self {
        Self::with_entropy(getrandom::getrandom)
    }

    /// A table drawing its cookies from `entropy` instead of the OS.
    pub fn with_entropy(entropy: EntropySource) -> Self {
        Self {
            mounts: Vec::new(),
            check_byte: CHECK_BYTE_INIT,
            entropy,
        }
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// The check byte the most recent mount received, or the initial value.
    pub fn check_byte_counter(&self) -> u16 {
        self.check_byte
    }

    pub fn mount(
        &mut self,
        mountpoint: &CStr,
        ops: Arc<dyn FsOperations>,
    ) -> Result<Arc<Mount>, MountError> {
        if mountpoint.is_empty() {
            return Err(MountError::Empty);
        }

        let mut cookie = [0u8; 8];
        (self.entropy)(&mut cookie).map_err(MountError::Random)?;

        let check_byte = self.check_byte + 1;
        if check_byte > 0xff {
            return Err(MountError::Exhausted);
        }

        let mount = Arc::new(Mount::new(
            mountpoint.to_owned(),
            ops,
            u64::from_ne_bytes(cookie),
            check_byte as u8,
        ));
        self.check_byte = check_byte;
        self.mounts.push(mount.clone());
        debug!(
            "Mounted {} with check byte {}",
            mount.mountpoint().to_string_lossy(),
            mount.check_byte()
        );
        Ok(mount)
    }

    /// Removes the most recent mount registered at exactly `mountpoint`.
    pub fn unmount(
        &mut self,
        mountpoint: &CStr,
    ) -> Result<Arc<Mount>, MountError> {
        let Some(index) = self
            .mounts
            .iter()
            .rposition(|m| m.mountpoint() == mountpoint)
        else {
            return Err(MountError::NotFound(
                mountpoint.to_string_lossy().into_owned(),
            ));
        };

        let mount = self.mounts.remove(index);
        if self.mounts.is_empty() {
            self.check_byte = CHECK_BYTE_INIT;
        }
        debug!("Unmounted {}", mount.mountpoint().to_string_lossy());
        Ok(mount)
    }

    pub fn resolve(&self, path: &CStr) -> Option<Arc<Mount>> {
        let found = self.mounts.iter().rev().find(|m| m.claims(path)).cloned();
        if let Some(mount) = &found {
            trace!(
                "{} resolves to mount {}",
                path.to_string_lossy(),
                mount.mountpoint().to_string_lossy()
            );
        }
        found
    }

    /// True while the mount that drew `cookie` is still registered.
    pub fn is_active(&self, cookie: u64) -> bool {
        self.mounts.iter().any(|m| m.cookie() == cookie)
    }
}
