use super::FsOperations;
use std::ffi::{CStr, CString};
use std::fmt;
use std::sync::Arc;

/// One registered virtual filesystem.
pub struct Mount {
    mountpoint: CString,
    ops: Arc<dyn FsOperations>,
    cookie: u64,
    check_byte: u8,
}

impl Mount {
    pub(crate) fn new(
        mountpoint: CString,
        ops: Arc<dyn FsOperations>,
        cookie: u64,
        check_byte: u8,
    ) -> Self {
        Self {
            mountpoint,
            ops,
            cookie,
            check_byte,
        }
    }

    pub fn mountpoint(&self) -> &CStr {
        &self.mountpoint
    }

    pub fn ops(&self) -> &dyn FsOperations {
        self.ops.as_ref()
    }

    /// Random per-mount value; identifies this mount's descriptors.
    pub fn cookie(&self) -> u64 {
        self.cookie
    }

    pub fn check_byte(&self) -> u8 {
        self.check_byte
    }

    /// Plain byte-prefix match, so `/foo` also claims `/foobar`.
    pub fn claims(&self, path: &CStr) -> bool {
        path.to_bytes().starts_with(self.mountpoint.to_bytes())
    }
}

impl fmt::Debug for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mount")
            .field("mountpoint", &self.mountpoint)
            .field("cookie", &format_args!("{:#018x}", self.cookie))
            .field("check_byte", &self.check_byte)
            .finish()
    }
}
