use super::Shim;
use super::forward::{FdRoute, PathRoute, opt_cstr};
use crate::calls::{RawArg, spec};
use crate::classify::SymlinkMode;
use crate::resolver::RealLibc;
use libc::{DIR, c_char, c_int, dirent};
use nix::errno::Errno;

/*
 * Directory streams are never virtual: a redirected opendir hands out a
 * stream over a real descriptor below the sandbox root, and mounts have no
 * directory operations.
 */
#[allow(clippy::missing_safety_doc)]
impl<L: RealLibc> Shim<L> {
    pub unsafe fn opendir(&self, path: *const c_char) -> *mut DIR {
        let c_path = unsafe { opt_cstr(path) };
        self.dispatch(&spec::OPENDIR, &[RawArg::Str(c_path)], |b| {
            match self.route_path(c_path, SymlinkMode::Follow) {
                PathRoute::Mount(..) => b.not_supported(),
                PathRoute::Redirect(relative) => b.forward(|l| unsafe {
                    let fd = l.openat(
                        self.root_fd(),
                        relative.as_ptr(),
                        libc::O_RDONLY | libc::O_DIRECTORY | libc::O_CLOEXEC,
                        None,
                    );
                    if fd < 0 {
                        return std::ptr::null_mut();
                    }
                    let dir = l.fdopendir(fd);
                    if dir.is_null() {
                        let errno = l.errno();
                        l.close(fd);
                        l.set_errno(errno);
                    }
                    dir
                }),
                PathRoute::Forward => b.forward(|l| unsafe { l.opendir(path) }),
            }
        })
    }

    pub unsafe fn fdopendir(&self, fd: c_int) -> *mut DIR {
        self.dispatch(&spec::FDOPENDIR, &[fd.into()], |b| match self.route_fd(fd) {
            FdRoute::Mount(_) => b.not_supported(),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.fdopendir(real) })
            }
        })
    }

    pub unsafe fn readdir(&self, dir: *mut DIR) -> *mut dirent {
        self.dispatch(&spec::READDIR, &[RawArg::ptr(dir)], |b| {
            b.forward(|l| unsafe { l.readdir(dir) })
        })
    }

    pub unsafe fn closedir(&self, dir: *mut DIR) -> c_int {
        self.dispatch(&spec::CLOSEDIR, &[RawArg::ptr(dir)], |b| {
            b.forward(|l| unsafe { l.closedir(dir) })
        })
    }

    pub unsafe fn dirfd(&self, dir: *mut DIR) -> c_int {
        self.dispatch(&spec::DIRFD, &[RawArg::ptr(dir)], |b| {
            b.forward(|l| unsafe { l.dirfd(dir) })
        })
    }
}
