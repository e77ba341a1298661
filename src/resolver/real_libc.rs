use libc::{
    DIR, c_char, c_int, c_ulong, c_void, dirent, gid_t, iovec, mode_t, off_t,
    size_t, ssize_t, timespec, timeval, uid_t, utimbuf,
};

/// Trailing argument actually passed to a variadic `fcntl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FcntlArg {
    None,
    Int(c_int),
    Ptr(*mut c_void),
}

/**
 * The genuine implementations every routed call ends up in.
 *
 * Nothing else in the crate may call the C library's file functions
 * directly, since under `LD_PRELOAD` those names resolve back into our own
 * exports. All methods mirror the C calling convention: a failure value plus
 * an error code readable through [`RealLibc::errno`].
 */
#[allow(clippy::missing_safety_doc)]
pub trait RealLibc: Send + Sync {
    /// The `errno` of the thread as seen by this implementation.
    fn errno(&self) -> c_int;
    fn set_errno(&self, errno: c_int);

    unsafe fn open(
        &self,
        path: *const c_char,
        flags: c_int,
        mode: Option<mode_t>,
    ) -> c_int;
    unsafe fn openat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        flags: c_int,
        mode: Option<mode_t>,
    ) -> c_int;
    unsafe fn creat(&self, path: *const c_char, mode: mode_t) -> c_int;
    unsafe fn close(&self, fd: c_int) -> c_int;

    unsafe fn read(&self, fd: c_int, buf: *mut c_void, count: size_t)
    -> ssize_t;
    unsafe fn write(
        &self,
        fd: c_int,
        buf: *const c_void,
        count: size_t,
    ) -> ssize_t;
    unsafe fn pread(
        &self,
        fd: c_int,
        buf: *mut c_void,
        count: size_t,
        offset: off_t,
    ) -> ssize_t;
    unsafe fn pwrite(
        &self,
        fd: c_int,
        buf: *const c_void,
        count: size_t,
        offset: off_t,
    ) -> ssize_t;
    unsafe fn readv(&self, fd: c_int, iov: *const iovec, iovcnt: c_int)
    -> ssize_t;
    unsafe fn writev(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
    ) -> ssize_t;
    unsafe fn preadv(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
    ) -> ssize_t;
    unsafe fn pwritev(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
    ) -> ssize_t;
    unsafe fn preadv2(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
        flags: c_int,
    ) -> ssize_t;
    unsafe fn pwritev2(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
        flags: c_int,
    ) -> ssize_t;
    unsafe fn lseek(&self, fd: c_int, offset: off_t, whence: c_int) -> off_t;

    unsafe fn stat(&self, path: *const c_char, buf: *mut libc::stat) -> c_int;
    unsafe fn fstat(&self, fd: c_int, buf: *mut libc::stat) -> c_int;
    unsafe fn lstat(&self, path: *const c_char, buf: *mut libc::stat) -> c_int;
    unsafe fn fstatat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        buf: *mut libc::stat,
        flags: c_int,
    ) -> c_int;

    unsafe fn access(&self, path: *const c_char, mode: c_int) -> c_int;
    unsafe fn faccessat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        mode: c_int,
        flags: c_int,
    ) -> c_int;

    unsafe fn link(&self, old: *const c_char, new: *const c_char) -> c_int;
    unsafe fn linkat(
        &self,
        olddirfd: c_int,
        old: *const c_char,
        newdirfd: c_int,
        new: *const c_char,
        flags: c_int,
    ) -> c_int;
    unsafe fn symlink(
        &self,
        target: *const c_char,
        linkpath: *const c_char,
    ) -> c_int;
    unsafe fn symlinkat(
        &self,
        target: *const c_char,
        newdirfd: c_int,
        linkpath: *const c_char,
    ) -> c_int;
    unsafe fn readlink(
        &self,
        path: *const c_char,
        buf: *mut c_char,
        bufsiz: size_t,
    ) -> ssize_t;
    unsafe fn readlinkat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        buf: *mut c_char,
        bufsiz: size_t,
    ) -> ssize_t;
    unsafe fn rename(&self, old: *const c_char, new: *const c_char) -> c_int;
    unsafe fn renameat(
        &self,
        olddirfd: c_int,
        old: *const c_char,
        newdirfd: c_int,
        new: *const c_char,
    ) -> c_int;
    unsafe fn unlink(&self, path: *const c_char) -> c_int;
    unsafe fn unlinkat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        flags: c_int,
    ) -> c_int;

    unsafe fn chmod(&self, path: *const c_char, mode: mode_t) -> c_int;
    unsafe fn fchmod(&self, fd: c_int, mode: mode_t) -> c_int;
    unsafe fn fchmodat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        mode: mode_t,
        flags: c_int,
    ) -> c_int;
    unsafe fn chown(&self, path: *const c_char, owner: uid_t, group: gid_t)
    -> c_int;
    unsafe fn fchown(&self, fd: c_int, owner: uid_t, group: gid_t) -> c_int;
    unsafe fn lchown(
        &self,
        path: *const c_char,
        owner: uid_t,
        group: gid_t,
    ) -> c_int;
    unsafe fn fchownat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        owner: uid_t,
        group: gid_t,
        flags: c_int,
    ) -> c_int;

    unsafe fn utime(&self, path: *const c_char, times: *const utimbuf)
    -> c_int;
    unsafe fn utimes(&self, path: *const c_char, times: *const timeval)
    -> c_int;
    unsafe fn futimes(&self, fd: c_int, times: *const timeval) -> c_int;
    unsafe fn lutimes(&self, path: *const c_char, times: *const timeval)
    -> c_int;
    unsafe fn futimens(&self, fd: c_int, times: *const timespec) -> c_int;
    unsafe fn utimensat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        times: *const timespec,
        flags: c_int,
    ) -> c_int;

    unsafe fn opendir(&self, path: *const c_char) -> *mut DIR;
    unsafe fn fdopendir(&self, fd: c_int) -> *mut DIR;
    unsafe fn readdir(&self, dir: *mut DIR) -> *mut dirent;
    unsafe fn closedir(&self, dir: *mut DIR) -> c_int;
    unsafe fn dirfd(&self, dir: *mut DIR) -> c_int;

    unsafe fn fcntl(&self, fd: c_int, cmd: c_int, arg: FcntlArg) -> c_int;
    unsafe fn ioctl(&self, fd: c_int, request: c_ulong, arg: *mut c_void)
    -> c_int;
    unsafe fn getxattr(
        &self,
        path: *const c_char,
        name: *const c_char,
        value: *mut c_void,
        size: size_t,
    ) -> ssize_t;
    unsafe fn realpath(
        &self,
        path: *const c_char,
        resolved: *mut c_char,
    ) -> *mut c_char;
}
