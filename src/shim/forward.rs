use super::Shim;
use crate::calls::{CallRecord, CallRet, CallSpec, RawArg};
use crate::classify::{SymlinkMode, redirect_target};
use crate::config::Variant;
use crate::fd::{VirtualFd, demangle, is_virtual, mangle};
use crate::mount::{FsResult, Mount};
use crate::resolver::{FcntlArg, RealLibc};
use libc::{c_char, c_int, c_void, iovec};
use log::trace;
use nix::errno::Errno;
use std::ffi::{CStr, CString};
use std::sync::Arc;

/// Where a path-taking call goes.
pub(crate) enum PathRoute<'a> {
    Mount(Arc<Mount>, &'a CStr),
    /// Root-relative path to reissue against the sandbox root.
    Redirect(CString),
    Forward,
}

/// Where a descriptor-taking call goes.
pub(crate) enum FdRoute {
    Mount(VirtualFd),
    /// Issued by a mount that has since been unmounted.
    Stale,
    /// A redirected real descriptor, already demangled.
    Redirected(c_int),
    Real(c_int),
}

/// Routing of an `*at` call.
pub(crate) enum AtRoute<'a> {
    Path(PathRoute<'a>),
    /// Relative path; what matters is the directory descriptor.
    Dir(FdRoute),
}

/**
 * What a routed call runs against.
 *
 * Every helper returns `(result, errno)` so the outcome is captured before
 * anything else gets a chance to touch `errno`.
 */
pub(crate) struct Bridge<'a, L: RealLibc> {
    libc: &'a L,
    caller_errno: c_int,
}

impl<L: RealLibc> Bridge<'_, L> {
    pub fn forward<R>(&self, call: impl FnOnce(&L) -> R) -> (R, c_int) {
        self.libc.set_errno(self.caller_errno);
        let ret = call(self.libc);
        (ret, self.libc.errno())
    }

    /// A back-end result. Success leaves the caller's `errno` alone.
    pub fn settle<T, R: CallRet>(
        &self,
        result: FsResult<T>,
        map: impl FnOnce(T) -> R,
    ) -> (R, c_int) {
        match result {
            Ok(value) => (map(value), self.caller_errno),
            Err(errno) => (R::failure(), errno as c_int),
        }
    }

    pub fn fail<R: CallRet>(&self, errno: Errno) -> (R, c_int) {
        (R::failure(), errno as c_int)
    }

    pub fn not_supported<R: CallRet>(&self) -> (R, c_int) {
        self.fail(Errno::ENOSYS)
    }
}

impl<L: RealLibc> Shim<L> {
    /// Runs `route`, logs the call and hands `errno` back to the caller
    /// exactly as the call left it.
    pub(crate) fn dispatch<R: CallRet>(
        &self,
        spec: &'static CallSpec,
        args: &[RawArg],
        route: impl FnOnce(&Bridge<'_, L>) -> (R, c_int),
    ) -> R {
        let bridge = Bridge {
            libc: self.libc.as_ref(),
            caller_errno: Errno::last_raw(),
        };
        let (ret, errno) =
            if spec.extended_only && self.variant == Variant::Minimal {
                bridge.not_supported()
            } else {
                route(&bridge)
            };
        if self.log.is_enabled() {
            self.log
                .emit(&CallRecord::new(spec, args, ret.to_raw(), errno));
        }
        Errno::set_raw(errno);
        ret
    }

    pub(crate) fn route_path<'a>(
        &self,
        path: Option<&'a CStr>,
        mode: SymlinkMode,
    ) -> PathRoute<'a> {
        let Some(path) = path else {
            return PathRoute::Forward;
        };
        let mount = self.mounts().resolve(path);
        if let Some(mount) = mount {
            return PathRoute::Mount(mount, path);
        }
        match redirect_target(self.libc.as_ref(), path, mode) {
            Some(relative) => {
                trace!(
                    "Redirecting {} to root/{}",
                    path.to_string_lossy(),
                    relative.to_string_lossy()
                );
                PathRoute::Redirect(relative)
            }
            None => PathRoute::Forward,
        }
    }

    pub(crate) fn route_fd(&self, fd: c_int) -> FdRoute {
        if !is_virtual(fd) {
            return FdRoute::Real(fd);
        }
        let placeholder = demangle(fd);
        let entry = self.fds().get(placeholder).cloned();
        match entry {
            None => FdRoute::Redirected(placeholder),
            Some(vfd) if self.mounts().is_active(vfd.mount.cookie()) => {
                FdRoute::Mount(vfd)
            }
            Some(_) => FdRoute::Stale,
        }
    }

    /// Absolute paths and `AT_FDCWD` route like the plain call; anything
    /// else depends on `dirfd`.
    pub(crate) fn route_at<'a>(
        &self,
        dirfd: c_int,
        path: Option<&'a CStr>,
        by_path: impl FnOnce(Option<&'a CStr>) -> PathRoute<'a>,
    ) -> AtRoute<'a> {
        match path {
            Some(p) if dirfd == libc::AT_FDCWD || p.to_bytes().starts_with(b"/") => {
                AtRoute::Path(by_path(path))
            }
            _ => AtRoute::Dir(self.route_fd(dirfd)),
        }
    }

    /// Reserves a placeholder for a descriptor a mount just issued and
    /// returns the value the caller sees.
    pub(crate) fn issue_mount_fd(
        &self,
        mount: &Arc<Mount>,
        backend_fd: c_int,
    ) -> FsResult<c_int> {
        let placeholder = unsafe {
            self.libc
                .fcntl(self.root_fd(), libc::F_DUPFD_CLOEXEC, FcntlArg::Int(0))
        };
        if placeholder < 0 {
            let errno = Errno::from_raw(self.libc.errno());
            let _ = mount.ops().close(backend_fd);
            return Err(errno);
        }
        self.fds().insert(placeholder, mount.clone(), backend_fd);
        Ok(mangle(placeholder))
    }
}

/// Tags a descriptor returned by a redirected call.
pub(crate) fn mangled((fd, errno): (c_int, c_int)) -> (c_int, c_int) {
    if fd >= 0 { (mangle(fd), errno) } else { (fd, errno) }
}

pub(crate) unsafe fn opt_cstr<'a>(ptr: *const c_char) -> Option<&'a CStr> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) })
    }
}

pub(crate) unsafe fn buf_mut<'a>(ptr: *mut c_void, len: usize) -> FsResult<&'a mut [u8]> {
    if len == 0 {
        Ok(&mut [])
    } else if ptr.is_null() {
        Err(Errno::EFAULT)
    } else {
        Ok(unsafe { std::slice::from_raw_parts_mut(ptr.cast(), len) })
    }
}

pub(crate) unsafe fn buf_ref<'a>(ptr: *const c_void, len: usize) -> FsResult<&'a [u8]> {
    if len == 0 {
        Ok(&[])
    } else if ptr.is_null() {
        Err(Errno::EFAULT)
    } else {
        Ok(unsafe { std::slice::from_raw_parts(ptr.cast(), len) })
    }
}

pub(crate) unsafe fn out_mut<'a, T>(ptr: *mut T) -> FsResult<&'a mut T> {
    unsafe { ptr.as_mut() }.ok_or(Errno::EFAULT)
}

pub(crate) unsafe fn iovecs<'a>(iov: *const iovec, iovcnt: c_int) -> FsResult<&'a [iovec]> {
    match iovcnt {
        n if n < 0 || n > libc::UIO_MAXIOV => Err(Errno::EINVAL),
        0 => Ok(&[]),
        _ if iov.is_null() => Err(Errno::EFAULT),
        n => Ok(unsafe { std::slice::from_raw_parts(iov, n as usize) }),
    }
}
