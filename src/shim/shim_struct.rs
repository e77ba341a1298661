use crate::calls::CallLog;
use crate::config::{Config, LogSink, Variant};
use crate::fd::VirtualFds;
use crate::mount::{FsOperations, MountError, MountTable};
use crate::resolver::{InitError, RealLibc, ResolveError};
use crate::util::{LibcWriter, path_to_cstring};
use libc::{DIR, c_int};
use log::{debug, trace, warn};
use nix::errno::Errno;
use std::ffi::CStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The sandbox root, opened once and read-only afterwards.
struct SandboxRoot {
    dir: *mut DIR,
    fd: c_int,
}

// The handle is only ever closed by the owning `Shim`'s drop.
unsafe impl Send for SandboxRoot {}
unsafe impl Sync for SandboxRoot {}

/**
 * Process-scoped interposition context.
 *
 * Owns the real library, the sandbox root, the mount table and the
 * descriptor registry. Every intercepted call is a method on this type with
 * the same calling convention and `errno` contract as the C function it
 * shadows, so the methods are `unsafe` for the same reasons those functions
 * are.
 */
pub struct Shim<L: RealLibc> {
    pub(crate) libc: Arc<L>,
    root: SandboxRoot,
    mounts: Mutex<MountTable>,
    fds: Mutex<VirtualFds>,
    pub(crate) log: CallLog,
    pub(crate) variant: Variant,
}

impl<L: RealLibc + 'static> Shim<L> {
    pub fn new(
        libc: Arc<L>,
        root: &CStr,
        log: CallLog,
        variant: Variant,
    ) -> Result<Self, ResolveError> {
        let unreachable = |errno: c_int| ResolveError::RootUnreachable {
            path: root.to_string_lossy().into_owned(),
            errno: Errno::from_raw(errno),
        };

        let dir = unsafe { libc.opendir(root.as_ptr()) };
        if dir.is_null() {
            return Err(unreachable(libc.errno()));
        }
        let fd = unsafe { libc.dirfd(dir) };
        if fd < 0 {
            let errno = libc.errno();
            unsafe { libc.closedir(dir) };
            return Err(unreachable(errno));
        }
        debug!(
            "Opened sandbox root {} as fd {}",
            root.to_string_lossy(),
            fd
        );

        Ok(Self {
            libc,
            root: SandboxRoot { dir, fd },
            mounts: Mutex::new(MountTable::new()),
            fds: Mutex::new(VirtualFds::new()),
            log,
            variant,
        })
    }

    pub fn from_config(libc: Arc<L>, config: &Config) -> Result<Self, InitError> {
        let root = path_to_cstring(&config.root).map_err(InitError::Config)?;
        let log = match &config.log {
            LogSink::None => CallLog::disabled(),
            LogSink::Stderr => CallLog::new(
                config.log_format,
                Box::new(LibcWriter::stderr(libc.clone())),
            ),
            LogSink::Stdout => CallLog::new(
                config.log_format,
                Box::new(LibcWriter::stdout(libc.clone())),
            ),
            LogSink::File(path) => CallLog::new(
                config.log_format,
                Box::new(
                    LibcWriter::append(libc.clone(), path)
                        .map_err(InitError::Config)?,
                ),
            ),
        };
        trace!(
            "Call log: {} ({}), variant {}",
            config.log,
            config.log_format,
            config.variant
        );
        Ok(Self::new(libc, &root, log, config.variant)?)
    }
}

impl<L: RealLibc> Shim<L> {
    /// Descriptor of the sandbox root that redirected calls are issued against.
    pub fn root_fd(&self) -> c_int {
        self.root.fd
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn libc(&self) -> &L {
        self.libc.as_ref()
    }

    pub fn mount(
        &self,
        mountpoint: &CStr,
        ops: Arc<dyn FsOperations>,
    ) -> Result<(), MountError> {
        self.mounts().mount(mountpoint, ops)?;
        Ok(())
    }

    /// Removes the newest mount at `mountpoint` and invalidates every
    /// descriptor it issued.
    pub fn unmount(&self, mountpoint: &CStr) -> Result<(), MountError> {
        let mount = self.mounts().unmount(mountpoint)?;
        let stale = self.fds().purge(mount.cookie());
        for (placeholder, vfd) in stale {
            if let Err(e) = mount.ops().close(vfd.backend_fd) {
                warn!(
                    "Closing backend fd {} of {} failed: {}",
                    vfd.backend_fd,
                    mount.mountpoint().to_string_lossy(),
                    e.desc()
                );
            }
            unsafe { self.libc.close(placeholder) };
        }
        Ok(())
    }

    pub fn mount_count(&self) -> usize {
        self.mounts().len()
    }

    /// Number of live descriptors issued by mounts.
    pub fn mount_fd_count(&self) -> usize {
        self.fds().len()
    }

    pub(crate) fn mounts(&self) -> MutexGuard<'_, MountTable> {
        self.mounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn fds(&self) -> MutexGuard<'_, VirtualFds> {
        self.fds.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L: RealLibc> Drop for Shim<L> {
    fn drop(&mut self) {
        let remaining = self.fds().drain();
        for (placeholder, vfd) in remaining {
            let _ = vfd.mount.ops().close(vfd.backend_fd);
            unsafe { self.libc.close(placeholder) };
        }
        unsafe { self.libc.closedir(self.root.dir) };
        trace!("Closed sandbox root fd {}", self.root.fd);
    }
}
