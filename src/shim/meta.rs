use super::Shim;
use super::forward::{Bridge, FdRoute, PathRoute, opt_cstr};
use crate::calls::{RawArg, spec};
use crate::classify::SymlinkMode;
use crate::resolver::RealLibc;
use crate::util::{timevals_to_timespecs, utimbuf_to_timespecs};
use libc::{c_char, c_int, gid_t, mode_t, timespec, timeval, uid_t, utimbuf};
use nix::errno::Errno;
use std::ffi::CString;

#[allow(clippy::missing_safety_doc)]
impl<L: RealLibc> Shim<L> {
    pub unsafe fn chmod(&self, path: *const c_char, mode: mode_t) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        let args = [RawArg::Str(c_path), mode.into()];
        self.dispatch(&spec::CHMOD, &args, |b| {
            match self.route_path(c_path, SymlinkMode::Follow) {
                PathRoute::Mount(mount, p) => b.settle(mount.ops().chmod(p, mode), |()| 0),
                PathRoute::Redirect(relative) => b.forward(|l| unsafe {
                    l.fchmodat(self.root_fd(), relative.as_ptr(), mode, 0)
                }),
                PathRoute::Forward => b.forward(|l| unsafe { l.chmod(path, mode) }),
            }
        })
    }

    pub unsafe fn fchmod(&self, fd: c_int, mode: mode_t) -> c_int {
        let args = [fd.into(), mode.into()];
        self.dispatch(&spec::FCHMOD, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => {
                b.settle(vfd.mount.ops().fchmod(vfd.backend_fd, mode), |()| 0)
            }
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.fchmod(real, mode) })
            }
        })
    }

    pub unsafe fn chown(&self, path: *const c_char, owner: uid_t, group: gid_t) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        let args = [RawArg::Str(c_path), owner.into(), group.into()];
        self.dispatch(&spec::CHOWN, &args, |b| {
            match self.route_path(c_path, SymlinkMode::Follow) {
                PathRoute::Mount(mount, p) => {
                    b.settle(mount.ops().chown(p, owner, group), |()| 0)
                }
                PathRoute::Redirect(relative) => b.forward(|l| unsafe {
                    l.fchownat(self.root_fd(), relative.as_ptr(), owner, group, 0)
                }),
                PathRoute::Forward => b.forward(|l| unsafe { l.chown(path, owner, group) }),
            }
        })
    }

    pub unsafe fn fchown(&self, fd: c_int, owner: uid_t, group: gid_t) -> c_int {
        let args = [fd.into(), owner.into(), group.into()];
        self.dispatch(&spec::FCHOWN, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => {
                b.settle(vfd.mount.ops().fchown(vfd.backend_fd, owner, group), |()| 0)
            }
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.fchown(real, owner, group) })
            }
        })
    }

    pub unsafe fn lchown(&self, path: *const c_char, owner: uid_t, group: gid_t) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        let args = [RawArg::Str(c_path), owner.into(), group.into()];
        self.dispatch(&spec::LCHOWN, &args, |b| {
            match self.route_path(c_path, SymlinkMode::NoFollow) {
                PathRoute::Mount(mount, p) => {
                    b.settle(mount.ops().lchown(p, owner, group), |()| 0)
                }
                PathRoute::Redirect(relative) => b.forward(|l| unsafe {
                    l.fchownat(
                        self.root_fd(),
                        relative.as_ptr(),
                        owner,
                        group,
                        libc::AT_SYMLINK_NOFOLLOW,
                    )
                }),
                PathRoute::Forward => b.forward(|l| unsafe { l.lchown(path, owner, group) }),
            }
        })
    }

    pub unsafe fn utime(&self, path: *const c_char, times: *const utimbuf) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        let args = [RawArg::Str(c_path), RawArg::ptr(times)];
        self.dispatch(&spec::UTIME, &args, |b| {
            match self.route_path(c_path, SymlinkMode::Follow) {
                PathRoute::Mount(mount, p) => {
                    b.settle(mount.ops().utime(p, unsafe { times.as_ref() }), |()| 0)
                }
                PathRoute::Redirect(relative) => {
                    let stamps = unsafe { utimbuf_to_timespecs(times) };
                    self.utimensat_root(b, &relative, stamps, 0)
                }
                PathRoute::Forward => b.forward(|l| unsafe { l.utime(path, times) }),
            }
        })
    }

    pub unsafe fn utimes(&self, path: *const c_char, times: *const timeval) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        let args = [RawArg::Str(c_path), RawArg::ptr(times)];
        self.dispatch(&spec::UTIMES, &args, |b| {
            match self.route_path(c_path, SymlinkMode::Follow) {
                PathRoute::Mount(mount, p) => {
                    b.settle(mount.ops().utimes(p, unsafe { timeval_pair(times) }), |()| 0)
                }
                PathRoute::Redirect(relative) => {
                    let stamps = unsafe { timevals_to_timespecs(times) };
                    self.utimensat_root(b, &relative, stamps, 0)
                }
                PathRoute::Forward => b.forward(|l| unsafe { l.utimes(path, times) }),
            }
        })
    }

    pub unsafe fn futimes(&self, fd: c_int, times: *const timeval) -> c_int {
        let args = [fd.into(), RawArg::ptr(times)];
        self.dispatch(&spec::FUTIMES, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => b.settle(
                vfd.mount
                    .ops()
                    .futimes(vfd.backend_fd, unsafe { timeval_pair(times) }),
                |()| 0,
            ),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.futimes(real, times) })
            }
        })
    }

    pub unsafe fn lutimes(&self, path: *const c_char, times: *const timeval) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        let args = [RawArg::Str(c_path), RawArg::ptr(times)];
        self.dispatch(&spec::LUTIMES, &args, |b| {
            match self.route_path(c_path, SymlinkMode::NoFollow) {
                PathRoute::Mount(mount, p) => {
                    b.settle(mount.ops().lutimes(p, unsafe { timeval_pair(times) }), |()| 0)
                }
                PathRoute::Redirect(relative) => {
                    let stamps = unsafe { timevals_to_timespecs(times) };
                    self.utimensat_root(b, &relative, stamps, libc::AT_SYMLINK_NOFOLLOW)
                }
                PathRoute::Forward => b.forward(|l| unsafe { l.lutimes(path, times) }),
            }
        })
    }

    pub unsafe fn futimens(&self, fd: c_int, times: *const timespec) -> c_int {
        let args = [fd.into(), RawArg::ptr(times)];
        self.dispatch(&spec::FUTIMENS, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => b.settle(
                vfd.mount.ops().futimens(
                    vfd.backend_fd,
                    unsafe { times.cast::<[timespec; 2]>().as_ref() },
                ),
                |()| 0,
            ),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.futimens(real, times) })
            }
        })
    }

    fn utimensat_root(
        &self,
        b: &Bridge<'_, L>,
        relative: &CString,
        times: Option<[timespec; 2]>,
        flags: c_int,
    ) -> (c_int, c_int) {
        let times_ptr = times.as_ref().map_or(std::ptr::null(), |t| t.as_ptr());
        b.forward(|l| unsafe {
            l.utimensat(self.root_fd(), relative.as_ptr(), times_ptr, flags)
        })
    }
}

unsafe fn timeval_pair<'a>(times: *const timeval) -> Option<&'a [timeval; 2]> {
    unsafe { times.cast::<[timeval; 2]>().as_ref() }
}
