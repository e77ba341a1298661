use super::Shim;
use super::forward::{AtRoute, Bridge, FdRoute, PathRoute, buf_mut, opt_cstr};
use crate::calls::{RawArg, spec};
use crate::classify::SymlinkMode;
use crate::mount::Mount;
use crate::resolver::RealLibc;
use libc::{c_char, c_int, size_t, ssize_t};
use nix::errno::Errno;
use std::ffi::{CStr, CString};
use std::sync::Arc;

/// Where a call naming two paths goes. Both have to agree.
enum PairRoute<'a> {
    Mount(Arc<Mount>, &'a CStr, &'a CStr),
    Redirect(CString, CString),
    Forward,
    CrossDevice,
}

#[allow(clippy::missing_safety_doc)]
impl<L: RealLibc> Shim<L> {
    pub unsafe fn access(&self, path: *const c_char, mode: c_int) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        let args = [RawArg::Str(c_path), mode.into()];
        self.dispatch(&spec::ACCESS, &args, |b| {
            let route = self.route_path(c_path, SymlinkMode::Follow);
            self.access_routed(b, route, mode, 0, |l| unsafe { l.access(path, mode) })
        })
    }

    pub unsafe fn faccessat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        mode: c_int,
        flags: c_int,
    ) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        let args = [dirfd.into(), RawArg::Str(c_path), mode.into(), flags.into()];
        self.dispatch(&spec::FACCESSAT, &args, |b| {
            let symlinks = symlink_mode(flags);
            match self.route_at(dirfd, c_path, |p| self.route_path(p, symlinks)) {
                AtRoute::Path(route) => self.access_routed(b, route, mode, flags, |l| unsafe {
                    l.faccessat(dirfd, path, mode, flags)
                }),
                AtRoute::Dir(FdRoute::Redirected(fd) | FdRoute::Real(fd)) => {
                    b.forward(|l| unsafe { l.faccessat(fd, path, mode, flags) })
                }
                AtRoute::Dir(FdRoute::Mount(_)) => b.not_supported(),
                AtRoute::Dir(FdRoute::Stale) => b.fail(Errno::EBADF),
            }
        })
    }

    pub unsafe fn link(&self, oldpath: *const c_char, newpath: *const c_char) -> c_int {
        let (c_old, c_new) = unsafe { (opt_cstr(oldpath), opt_cstr(newpath)) };
        let args = [RawArg::Str(c_old), RawArg::Str(c_new)];
        self.dispatch(&spec::LINK, &args, |b| match self.route_pair(c_old, c_new) {
            PairRoute::Mount(mount, old, new) => b.settle(mount.ops().link(old, new), |()| 0),
            PairRoute::Redirect(old, new) => b.forward(|l| unsafe {
                l.linkat(self.root_fd(), old.as_ptr(), self.root_fd(), new.as_ptr(), 0)
            }),
            PairRoute::Forward => b.forward(|l| unsafe { l.link(oldpath, newpath) }),
            PairRoute::CrossDevice => b.fail(Errno::EXDEV),
        })
    }

    /// Only the link path is routed; the target is stored verbatim.
    pub unsafe fn symlink(&self, target: *const c_char, linkpath: *const c_char) -> c_int {
        let (c_target, c_link) = unsafe { (opt_cstr(target), opt_cstr(linkpath)) };
        let args = [RawArg::Str(c_target), RawArg::Str(c_link)];
        self.dispatch(&spec::SYMLINK, &args, |b| {
            match self.route_path(c_link, SymlinkMode::NoFollow) {
                PathRoute::Mount(mount, p) => match c_target {
                    Some(t) => b.settle(mount.ops().symlink(t, p), |()| 0),
                    None => b.fail(Errno::EFAULT),
                },
                PathRoute::Redirect(relative) => b.forward(|l| unsafe {
                    l.symlinkat(target, self.root_fd(), relative.as_ptr())
                }),
                PathRoute::Forward => b.forward(|l| unsafe { l.symlink(target, linkpath) }),
            }
        })
    }

    pub unsafe fn readlink(
        &self,
        path: *const c_char,
        buf: *mut c_char,
        bufsiz: size_t,
    ) -> ssize_t {
        let c_path = unsafe { opt_cstr(path) };
        let args = [RawArg::Str(c_path), RawArg::ptr(buf), bufsiz.into()];
        self.dispatch(&spec::READLINK, &args, |b| {
            let route = self.route_path(c_path, SymlinkMode::NoFollow);
            self.readlink_routed(b, route, buf, bufsiz, |l| unsafe {
                l.readlink(path, buf, bufsiz)
            })
        })
    }

    pub unsafe fn readlinkat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        buf: *mut c_char,
        bufsiz: size_t,
    ) -> ssize_t {
        let c_path = unsafe { opt_cstr(path) };
        let args = [
            dirfd.into(),
            RawArg::Str(c_path),
            RawArg::ptr(buf),
            bufsiz.into(),
        ];
        self.dispatch(&spec::READLINKAT, &args, |b| {
            match self.route_at(dirfd, c_path, |p| self.route_path(p, SymlinkMode::NoFollow)) {
                AtRoute::Path(route) => self.readlink_routed(b, route, buf, bufsiz, |l| unsafe {
                    l.readlinkat(dirfd, path, buf, bufsiz)
                }),
                AtRoute::Dir(FdRoute::Redirected(fd) | FdRoute::Real(fd)) => {
                    b.forward(|l| unsafe { l.readlinkat(fd, path, buf, bufsiz) })
                }
                AtRoute::Dir(FdRoute::Mount(_)) => b.not_supported(),
                AtRoute::Dir(FdRoute::Stale) => b.fail(Errno::EBADF),
            }
        })
    }

    pub unsafe fn rename(&self, oldpath: *const c_char, newpath: *const c_char) -> c_int {
        let (c_old, c_new) = unsafe { (opt_cstr(oldpath), opt_cstr(newpath)) };
        let args = [RawArg::Str(c_old), RawArg::Str(c_new)];
        self.dispatch(&spec::RENAME, &args, |b| match self.route_pair(c_old, c_new) {
            PairRoute::Mount(mount, old, new) => b.settle(mount.ops().rename(old, new), |()| 0),
            PairRoute::Redirect(old, new) => b.forward(|l| unsafe {
                l.renameat(self.root_fd(), old.as_ptr(), self.root_fd(), new.as_ptr())
            }),
            PairRoute::Forward => b.forward(|l| unsafe { l.rename(oldpath, newpath) }),
            PairRoute::CrossDevice => b.fail(Errno::EXDEV),
        })
    }

    pub unsafe fn unlink(&self, path: *const c_char) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        self.dispatch(&spec::UNLINK, &[RawArg::Str(c_path)], |b| {
            match self.route_path(c_path, SymlinkMode::NoFollow) {
                PathRoute::Mount(mount, p) => b.settle(mount.ops().unlink(p), |()| 0),
                PathRoute::Redirect(relative) => b.forward(|l| unsafe {
                    l.unlinkat(self.root_fd(), relative.as_ptr(), 0)
                }),
                PathRoute::Forward => b.forward(|l| unsafe { l.unlink(path) }),
            }
        })
    }

    fn access_routed(
        &self,
        b: &Bridge<'_, L>,
        route: PathRoute<'_>,
        mode: c_int,
        flags: c_int,
        forward: impl FnOnce(&L) -> c_int,
    ) -> (c_int, c_int) {
        match route {
            PathRoute::Mount(mount, p) => b.settle(mount.ops().access(p, mode), |()| 0),
            PathRoute::Redirect(relative) => b.forward(|l| unsafe {
                l.faccessat(self.root_fd(), relative.as_ptr(), mode, flags)
            }),
            PathRoute::Forward => b.forward(forward),
        }
    }

    fn readlink_routed(
        &self,
        b: &Bridge<'_, L>,
        route: PathRoute<'_>,
        buf: *mut c_char,
        bufsiz: size_t,
        forward: impl FnOnce(&L) -> ssize_t,
    ) -> (ssize_t, c_int) {
        match route {
            PathRoute::Mount(mount, p) => b.settle(
                unsafe { buf_mut(buf.cast(), bufsiz) }
                    .and_then(|buf| mount.ops().readlink(p, buf)),
                |n| n as ssize_t,
            ),
            PathRoute::Redirect(relative) => b.forward(|l| unsafe {
                l.readlinkat(self.root_fd(), relative.as_ptr(), buf, bufsiz)
            }),
            PathRoute::Forward => b.forward(forward),
        }
    }

    fn route_pair<'a>(&self, old: Option<&'a CStr>, new: Option<&'a CStr>) -> PairRoute<'a> {
        let routes = (
            self.route_path(old, SymlinkMode::NoFollow),
            self.route_path(new, SymlinkMode::NoFollow),
        );
        match routes {
            (PathRoute::Mount(a, old), PathRoute::Mount(b, new)) if Arc::ptr_eq(&a, &b) => {
                PairRoute::Mount(a, old, new)
            }
            (PathRoute::Redirect(old), PathRoute::Redirect(new)) => PairRoute::Redirect(old, new),
            (PathRoute::Forward, PathRoute::Forward) => PairRoute::Forward,
            _ => PairRoute::CrossDevice,
        }
    }
}

fn symlink_mode(flags: c_int) -> SymlinkMode {
    if flags & libc::AT_SYMLINK_NOFOLLOW != 0 {
        SymlinkMode::NoFollow
    } else {
        SymlinkMode::Follow
    }
}
