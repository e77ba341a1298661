use super::Shim;
use super::forward::{AtRoute, Bridge, FdRoute, PathRoute, mangled, opt_cstr};
use crate::calls::{OpenMode, RawArg, spec};
use crate::classify::SymlinkMode;
use crate::fd::demangle;
use crate::resolver::RealLibc;
use libc::{c_char, c_int, mode_t};
use nix::errno::Errno;
use std::ffi::CStr;

#[allow(clippy::missing_safety_doc)]
impl<L: RealLibc> Shim<L> {
    /// `mode` is only read when `flags` call for one; pass anything otherwise.
    pub unsafe fn open(&self, path: *const c_char, flags: c_int, mode: mode_t) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        let mode = OpenMode::decode(flags).apply(mode);
        let args = open_args(c_path, flags, mode);
        self.dispatch(&spec::OPEN, &args, |b| {
            let route = self.open_route(c_path, flags);
            self.open_routed(b, route, flags, mode, |l| unsafe {
                l.open(path, flags, mode)
            })
        })
    }

    pub unsafe fn openat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        flags: c_int,
        mode: mode_t,
    ) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        let mode = OpenMode::decode(flags).apply(mode);
        let mut args = vec![RawArg::from(dirfd)];
        args.extend(open_args(c_path, flags, mode));
        self.dispatch(&spec::OPENAT, &args, |b| {
            match self.route_at(dirfd, c_path, |p| self.open_route(p, flags)) {
                AtRoute::Path(route) => {
                    self.open_routed(b, route, flags, mode, |l| unsafe {
                        l.openat(dirfd, path, flags, mode)
                    })
                }
                AtRoute::Dir(FdRoute::Real(fd)) => {
                    b.forward(|l| unsafe { l.openat(fd, path, flags, mode) })
                }
                AtRoute::Dir(FdRoute::Redirected(fd)) => mangled(
                    b.forward(|l| unsafe { l.openat(fd, path, flags, mode) }),
                ),
                AtRoute::Dir(FdRoute::Mount(_)) => b.not_supported(),
                AtRoute::Dir(FdRoute::Stale) => b.fail(Errno::EBADF),
            }
        })
    }

    pub unsafe fn creat(&self, path: *const c_char, mode: mode_t) -> c_int {
        let c_path = unsafe { opt_cstr(path) };
        let args = [RawArg::Str(c_path), mode.into()];
        self.dispatch(&spec::CREAT, &args, |b| {
            match self.open_route(c_path, libc::O_CREAT) {
                PathRoute::Mount(mount, p) => b.settle(
                    mount
                        .ops()
                        .creat(p, mode)
                        .and_then(|fd| self.issue_mount_fd(&mount, fd)),
                    |fd| fd,
                ),
                PathRoute::Redirect(relative) => mangled(b.forward(|l| unsafe {
                    l.openat(
                        self.root_fd(),
                        relative.as_ptr(),
                        libc::O_CREAT | libc::O_WRONLY | libc::O_TRUNC,
                        Some(mode),
                    )
                })),
                PathRoute::Forward => b.forward(|l| unsafe { l.creat(path, mode) }),
            }
        })
    }

    pub unsafe fn close(&self, fd: c_int) -> c_int {
        self.dispatch(&spec::CLOSE, &[fd.into()], |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => {
                let placeholder = demangle(fd);
                self.fds().remove(placeholder);
                unsafe { self.libc.close(placeholder) };
                b.settle(vfd.mount.ops().close(vfd.backend_fd), |()| 0)
            }
            FdRoute::Stale => {
                let placeholder = demangle(fd);
                let entry = self.fds().remove(placeholder);
                if let Some(vfd) = entry {
                    let _ = vfd.mount.ops().close(vfd.backend_fd);
                }
                unsafe { self.libc.close(placeholder) };
                b.fail(Errno::EBADF)
            }
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.close(real) })
            }
        })
    }

    /// A path that does not exist yet is classified by its parent, so that
    /// creating a node under a redirected directory stays redirected.
    fn open_route<'a>(&self, path: Option<&'a CStr>, flags: c_int) -> PathRoute<'a> {
        if flags & libc::O_NOFOLLOW != 0 {
            return self.route_path(path, SymlinkMode::NoFollow);
        }
        match self.route_path(path, SymlinkMode::Follow) {
            PathRoute::Forward if flags & libc::O_CREAT != 0 => {
                self.route_path(path, SymlinkMode::NoFollow)
            }
            route => route,
        }
    }

    fn open_routed(
        &self,
        b: &Bridge<'_, L>,
        route: PathRoute<'_>,
        flags: c_int,
        mode: Option<mode_t>,
        forward: impl FnOnce(&L) -> c_int,
    ) -> (c_int, c_int) {
        match route {
            PathRoute::Mount(mount, p) => b.settle(
                mount
                    .ops()
                    .open(p, flags, mode)
                    .and_then(|fd| self.issue_mount_fd(&mount, fd)),
                |fd| fd,
            ),
            PathRoute::Redirect(relative) => mangled(b.forward(|l| unsafe {
                l.openat(self.root_fd(), relative.as_ptr(), flags, mode)
            })),
            PathRoute::Forward => b.forward(forward),
        }
    }
}

fn open_args(path: Option<&CStr>, flags: c_int, mode: Option<mode_t>) -> Vec<RawArg<'_>> {
    let mut args = vec![RawArg::Str(path), flags.into()];
    if let Some(mode) = mode {
        args.push(mode.into());
    }
    args
}
