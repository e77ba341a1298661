use super::Shim;
use super::forward::{FdRoute, PathRoute, opt_cstr, out_mut};
use crate::calls::{RawArg, spec};
use crate::classify::SymlinkMode;
use crate::resolver::RealLibc;
use libc::{c_char, c_int};
use nix::errno::Errno;

#[allow(clippy::missing_safety_doc)]
impl<L: RealLibc> Shim<L> {
    pub unsafe fn stat(&self, path: *const c_char, buf: *mut libc::stat) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        let args = [RawArg::Str(c_path), RawArg::ptr(buf)];
        self.dispatch(&spec::STAT, &args, |b| {
            match self.route_path(c_path, SymlinkMode::Follow) {
                PathRoute::Mount(mount, p) => b.settle(
                    unsafe { out_mut(buf) }.and_then(|buf| mount.ops().stat(p, buf)),
                    |()| 0,
                ),
                PathRoute::Redirect(relative) => b.forward(|l| unsafe {
                    l.fstatat(self.root_fd(), relative.as_ptr(), buf, 0)
                }),
                PathRoute::Forward => b.forward(|l| unsafe { l.stat(path, buf) }),
            }
        })
    }

    pub unsafe fn lstat(&self, path: *const c_char, buf: *mut libc::stat) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        let args = [RawArg::Str(c_path), RawArg::ptr(buf)];
        self.dispatch(&spec::LSTAT, &args, |b| {
            match self.route_path(c_path, SymlinkMode::NoFollow) {
                PathRoute::Mount(mount, p) => b.settle(
                    unsafe { out_mut(buf) }.and_then(|buf| mount.ops().lstat(p, buf)),
                    |()| 0,
                ),
                PathRoute::Redirect(relative) => b.forward(|l| unsafe {
                    l.fstatat(
                        self.root_fd(),
                        relative.as_ptr(),
                        buf,
                        libc::AT_SYMLINK_NOFOLLOW,
                    )
                }),
                PathRoute::Forward => b.forward(|l| unsafe { l.lstat(path, buf) }),
            }
        })
    }

    pub unsafe fn fstat(&self, fd: c_int, buf: *mut libc::stat) -> c_int {
        let args = [fd.into(), RawArg::ptr(buf)];
        self.dispatch(&spec::FSTAT, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => b.settle(
                unsafe { out_mut(buf) }
                    .and_then(|buf| vfd.mount.ops().fstat(vfd.backend_fd, buf)),
                |()| 0,
            ),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.fstat(real, buf) })
            }
        })
    }
}
