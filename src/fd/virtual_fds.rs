use crate::mount::Mount;
use libc::c_int;
use log::trace;
use std::collections::HashMap;
use std::sync::Arc;

/// A descriptor issued by a mount's `open`/`creat`.
#[derive(Debug, Clone)]
pub struct VirtualFd {
    pub mount: Arc<Mount>,
    pub backend_fd: c_int,
}

/**
 * Maps the placeholder descriptors handed to callers back to the mount that
 * produced them.
 *
 * A placeholder is a real kernel descriptor the shim holds open, so its
 * number cannot be reused by anything else while the entry exists. Callers
 * see it mangled.
 */
#[derive(Debug, Default)]
pub struct VirtualFds {
    entries: HashMap<c_int, VirtualFd>,
}

impl VirtualFds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, placeholder: c_int, mount: Arc<Mount>, backend_fd: c_int) {
        trace!(
            "Registered placeholder {} for backend fd {} of {}",
            placeholder,
            backend_fd,
            mount.mountpoint().to_string_lossy()
        );
        self.entries.insert(placeholder, VirtualFd { mount, backend_fd });
    }

    pub fn get(&self, placeholder: c_int) -> Option<&VirtualFd> {
        self.entries.get(&placeholder)
    }

    pub fn remove(&mut self, placeholder: c_int) -> Option<VirtualFd> {
        self.entries.remove(&placeholder)
    }

    /// Drops every entry issued by the mount with `cookie`. The caller still
    /// has to close the returned placeholders.
    pub fn purge(&mut self, cookie: u64) -> Vec<(c_int, VirtualFd)> {
        let placeholders: Vec<c_int> = self
            .entries
            .iter()
            .filter(|(_, vfd)| vfd.mount.cookie() == cookie)
            .map(|(placeholder, _)| *placeholder)
            .collect();
        let stale: Vec<(c_int, VirtualFd)> = placeholders
            .into_iter()
            .filter_map(|p| self.entries.remove(&p).map(|vfd| (p, vfd)))
            .collect();
        if !stale.is_empty() {
            trace!("Purged {} descriptors of an unmounted mount", stale.len());
        }
        stale
    }

    pub fn drain(&mut self) -> Vec<(c_int, VirtualFd)> {
        self.entries.drain().collect()
    }
}
