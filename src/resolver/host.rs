use super::{FcntlArg, RealLibc};
use crate::util::timevals_to_timespecs;
use libc::{
    DIR, c_char, c_int, c_ulong, c_void, dirent, gid_t, iovec, mode_t, off_t,
    size_t, ssize_t, timespec, timeval, uid_t, utimbuf,
};
use nix::errno::Errno;

/**
 * Forwards straight to the C library this crate was linked against.
 *
 * Only meaningful while the crate's own exports are not interposed on the
 * process, which is why it does not exist in `interpose` builds. Tests drive
 * a [`crate::Shim`] through it without loading a second copy of libc.
 */
#[derive(Debug, Default, Clone, Copy)]
pub struct HostLibc;

impl RealLibc for HostLibc {
    fn errno(&self) -> c_int {
        Errno::last_raw()
    }

    fn set_errno(&self, errno: c_int) {
        Errno::set_raw(errno);
    }

    unsafe fn open(
        &self,
        path: *const c_char,
        flags: c_int,
        mode: Option<mode_t>,
    ) -> c_int {
        match mode {
            Some(mode) => unsafe { libc::open(path, flags, mode) },
            None => unsafe { libc::open(path, flags) },
        }
    }

    unsafe fn openat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        flags: c_int,
        mode: Option<mode_t>,
    ) -> c_int {
        match mode {
            Some(mode) => unsafe { libc::openat(dirfd, path, flags, mode) },
            None => unsafe { libc::openat(dirfd, path, flags) },
        }
    }

    unsafe fn creat(&self, path: *const c_char, mode: mode_t) -> c_int {
        unsafe { libc::creat(path, mode) }
    }

    unsafe fn close(&self, fd: c_int) -> c_int {
        unsafe { libc::close(fd) }
    }

    unsafe fn read(
        &self,
        fd: c_int,
        buf: *mut c_void,
        count: size_t,
    ) -> ssize_t {
        unsafe { libc::read(fd, buf, count) }
    }

    unsafe fn write(
        &self,
        fd: c_int,
        buf: *const c_void,
        count: size_t,
    ) -> ssize_t {
        unsafe { libc::write(fd, buf, count) }
    }

    unsafe fn pread(
        &self,
        fd: c_int,
        buf: *mut c_void,
        count: size_t,
        offset: off_t,
    ) -> ssize_t {
        unsafe { libc::pread(fd, buf, count, offset) }
    }

    unsafe fn pwrite(
        &self,
        fd: c_int,
        buf: *const c_void,
        count: size_t,
        offset: off_t,
    ) -> ssize_t {
        unsafe { libc::pwrite(fd, buf, count, offset) }
    }

    unsafe fn readv(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
    ) -> ssize_t {
        unsafe { libc::readv(fd, iov, iovcnt) }
    }

    unsafe fn writev(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
    ) -> ssize_t {
        unsafe { libc::writev(fd, iov, iovcnt) }
    }

    unsafe fn preadv(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
    ) -> ssize_t {
        unsafe { libc::preadv(fd, iov, iovcnt, offset) }
    }

    unsafe fn pwritev(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
    ) -> ssize_t {
        unsafe { libc::pwritev(fd, iov, iovcnt, offset) }
    }

    /* The x86_64 syscall takes the offset split in two; the high half is unused. */
    unsafe fn preadv2(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
        flags: c_int,
    ) -> ssize_t {
        unsafe {
            libc::syscall(libc::SYS_preadv2, fd, iov, iovcnt, offset, 0, flags)
                as ssize_t
        }
    }

    unsafe fn pwritev2(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
        flags: c_int,
    ) -> ssize_t {
        unsafe {
            libc::syscall(libc::SYS_pwritev2, fd, iov, iovcnt, offset, 0, flags)
                as ssize_t
        }
    }

    unsafe fn lseek(&self, fd: c_int, offset: off_t, whence: c_int) -> off_t {
        unsafe { libc::lseek(fd, offset, whence) }
    }

    unsafe fn stat(&self, path: *const c_char, buf: *mut libc::stat) -> c_int {
        unsafe { libc::stat(path, buf) }
    }

    unsafe fn fstat(&self, fd: c_int, buf: *mut libc::stat) -> c_int {
        unsafe { libc::fstat(fd, buf) }
    }

    unsafe fn lstat(&self, path: *const c_char, buf: *mut libc::stat) -> c_int {
        unsafe { libc::lstat(path, buf) }
    }

    unsafe fn fstatat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        buf: *mut libc::stat,
        flags: c_int,
    ) -> c_int {
        unsafe { libc::fstatat(dirfd, path, buf, flags) }
    }

    unsafe fn access(&self, path: *const c_char, mode: c_int) -> c_int {
        unsafe { libc::access(path, mode) }
    }

    unsafe fn faccessat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        mode: c_int,
        flags: c_int,
    ) -> c_int {
        unsafe { libc::faccessat(dirfd, path, mode, flags) }
    }

    unsafe fn link(&self, old: *const c_char, new: *const c_char) -> c_int {
        unsafe { libc::link(old, new) }
    }

    unsafe fn linkat(
        &self,
        olddirfd: c_int,
        old: *const c_char,
        newdirfd: c_int,
        new: *const c_char,
        flags: c_int,
    ) -> c_int {
        unsafe { libc::linkat(olddirfd, old, newdirfd, new, flags) }
    }

    unsafe fn symlink(
        &self,
        target: *const c_char,
        linkpath: *const c_char,
    ) -> c_int {
        unsafe { libc::symlink(target, linkpath) }
    }

    unsafe fn symlinkat(
        &self,
        target: *const c_char,
        newdirfd: c_int,
        linkpath: *const c_char,
    ) -> c_int {
        unsafe { libc::symlinkat(target, newdirfd, linkpath) }
    }

    unsafe fn readlink(
        &self,
        path: *const c_char,
        buf: *mut c_char,
        bufsiz: size_t,
    ) -> ssize_t {
        unsafe { libc::readlink(path, buf, bufsiz) }
    }

    unsafe fn readlinkat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        buf: *mut c_char,
        bufsiz: size_t,
    ) -> ssize_t {
        unsafe { libc::readlinkat(dirfd, path, buf, bufsiz) }
    }

    unsafe fn rename(&self, old: *const c_char, new: *const c_char) -> c_int {
        unsafe { libc::rename(old, new) }
    }

    unsafe fn renameat(
        &self,
        olddirfd: c_int,
        old: *const c_char,
        newdirfd: c_int,
        new: *const c_char,
    ) -> c_int {
        unsafe { libc::renameat(olddirfd, old, newdirfd, new) }
    }

    unsafe fn unlink(&self, path: *const c_char) -> c_int {
        unsafe { libc::unlink(path) }
    }

    unsafe fn unlinkat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        flags: c_int,
    ) -> c_int {
        unsafe { libc::unlinkat(dirfd, path, flags) }
    }

    unsafe fn chmod(&self, path: *const c_char, mode: mode_t) -> c_int {
        unsafe { libc::chmod(path, mode) }
    }

    unsafe fn fchmod(&self, fd: c_int, mode: mode_t) -> c_int {
        unsafe { libc::fchmod(fd, mode) }
    }

    unsafe fn fchmodat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        mode: mode_t,
        flags: c_int,
    ) -> c_int {
        unsafe { libc::fchmodat(dirfd, path, mode, flags) }
    }

    unsafe fn chown(
        &self,
        path: *const c_char,
        owner: uid_t,
        group: gid_t,
    ) -> c_int {
        unsafe { libc::chown(path, owner, group) }
    }

    unsafe fn fchown(&self, fd: c_int, owner: uid_t, group: gid_t) -> c_int {
        unsafe { libc::fchown(fd, owner, group) }
    }

    unsafe fn lchown(
        &self,
        path: *const c_char,
        owner: uid_t,
        group: gid_t,
    ) -> c_int {
        unsafe { libc::lchown(path, owner, group) }
    }

    unsafe fn fchownat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        owner: uid_t,
        group: gid_t,
        flags: c_int,
    ) -> c_int {
        unsafe { libc::fchownat(dirfd, path, owner, group, flags) }
    }

    unsafe fn utime(&self, path: *const c_char, times: *const utimbuf) -> c_int {
        unsafe { libc::utime(path, times) }
    }

    unsafe fn utimes(&self, path: *const c_char, times: *const timeval) -> c_int {
        unsafe { libc::utimes(path, times) }
    }

    unsafe fn futimes(&self, fd: c_int, times: *const timeval) -> c_int {
        unsafe { libc::futimes(fd, times) }
    }

    unsafe fn lutimes(
        &self,
        path: *const c_char,
        times: *const timeval,
    ) -> c_int {
        let times = unsafe { timevals_to_timespecs(times) };
        let times_ptr =
            times.as_ref().map_or(std::ptr::null(), |t| t.as_ptr());
        unsafe {
            libc::utimensat(
                libc::AT_FDCWD,
                path,
                times_ptr,
                libc::AT_SYMLINK_NOFOLLOW,
            )
        }
    }

    unsafe fn futimens(&self, fd: c_int, times: *const timespec) -> c_int {
        unsafe { libc::futimens(fd, times) }
    }

    unsafe fn utimensat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        times: *const timespec,
        flags: c_int,
    ) -> c_int {
        unsafe { libc::utimensat(dirfd, path, times, flags) }
    }

    unsafe fn opendir(&self, path: *const c_char) -> *mut DIR {
        unsafe { libc::opendir(path) }
    }

    unsafe fn fdopendir(&self, fd: c_int) -> *mut DIR {
        unsafe { libc::fdopendir(fd) }
    }

    unsafe fn readdir(&self, dir: *mut DIR) -> *mut dirent {
        unsafe { libc::readdir(dir) }
    }

    unsafe fn closedir(&self, dir: *mut DIR) -> c_int {
        unsafe { libc::closedir(dir) }
    }

    unsafe fn dirfd(&self, dir: *mut DIR) -> c_int {
        unsafe { libc::dirfd(dir) }
    }

    unsafe fn fcntl(&self, fd: c_int, cmd: c_int, arg: FcntlArg) -> c_int {
        match arg {
            FcntlArg::None => unsafe { libc::fcntl(fd, cmd) },
            FcntlArg::Int(arg) => unsafe { libc::fcntl(fd, cmd, arg) },
            FcntlArg::Ptr(arg) => unsafe { libc::fcntl(fd, cmd, arg) },
        }
    }

    unsafe fn ioctl(
        &self,
        fd: c_int,
        request: c_ulong,
        arg: *mut c_void,
    ) -> c_int {
        unsafe { libc::ioctl(fd, request, arg) }
    }

    unsafe fn getxattr(
        &self,
        path: *const c_char,
        name: *const c_char,
        value: *mut c_void,
        size: size_t,
    ) -> ssize_t {
        unsafe { libc::getxattr(path, name, value, size) }
    }

    unsafe fn realpath(
        &self,
        path: *const c_char,
        resolved: *mut c_char,
    ) -> *mut c_char {
        unsafe { libc::realpath(path, resolved) }
    }
}
