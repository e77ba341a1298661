#![allow(clippy::missing_safety_doc)]

use crate::calls::{FcntlCmd, OpenMode};
use crate::resolver::{FcntlArg, RealLibc};
use crate::runtime::runtime;
use libc::{
    DIR, c_char, c_int, c_ulong, c_void, dirent, gid_t, iovec, mode_t, off_t,
    size_t, ssize_t, timespec, timeval, uid_t, utimbuf,
};

/// Each entry exports `$name` and routes it through the shim method of the
/// same shape, or straight to the real library for nested calls.
macro_rules! intercept {
    ($($name:ident => $method:ident($($arg:ident: $ty:ty),*) -> $ret:ty;)*) => {
        $(
            #[unsafe(no_mangle)]
            pub unsafe extern "C" fn $name($($arg: $ty),*) -> $ret {
                runtime().enter(
                    |shim| unsafe { shim.$method($($arg),*) },
                    |real| unsafe { real.$method($($arg),*) },
                )
            }
        )*
    };
}

intercept! {
    creat => creat(path: *const c_char, mode: mode_t) -> c_int;
    close => close(fd: c_int) -> c_int;

    read => read(fd: c_int, buf: *mut c_void, count: size_t) -> ssize_t;
    write => write(fd: c_int, buf: *const c_void, count: size_t) -> ssize_t;
    pread => pread(fd: c_int, buf: *mut c_void, count: size_t, offset: off_t) -> ssize_t;
    pread64 => pread(fd: c_int, buf: *mut c_void, count: size_t, offset: off_t) -> ssize_t;
    pwrite => pwrite(fd: c_int, buf: *const c_void, count: size_t, offset: off_t) -> ssize_t;
    pwrite64 => pwrite(fd: c_int, buf: *const c_void, count: size_t, offset: off_t) -> ssize_t;
    readv => readv(fd: c_int, iov: *const iovec, iovcnt: c_int) -> ssize_t;
    writev => writev(fd: c_int, iov: *const iovec, iovcnt: c_int) -> ssize_t;
    preadv => preadv(fd: c_int, iov: *const iovec, iovcnt: c_int, offset: off_t) -> ssize_t;
    pwritev => pwritev(fd: c_int, iov: *const iovec, iovcnt: c_int, offset: off_t) -> ssize_t;
    preadv2 => preadv2(fd: c_int, iov: *const iovec, iovcnt: c_int, offset: off_t, flags: c_int) -> ssize_t;
    pwritev2 => pwritev2(fd: c_int, iov: *const iovec, iovcnt: c_int, offset: off_t, flags: c_int) -> ssize_t;
    lseek => lseek(fd: c_int, offset: off_t, whence: c_int) -> off_t;
    lseek64 => lseek(fd: c_int, offset: off_t, whence: c_int) -> off_t;

    stat => stat(path: *const c_char, buf: *mut libc::stat) -> c_int;
    fstat => fstat(fd: c_int, buf: *mut libc::stat) -> c_int;
    lstat => lstat(path: *const c_char, buf: *mut libc::stat) -> c_int;

    access => access(path: *const c_char, mode: c_int) -> c_int;
    faccessat => faccessat(dirfd: c_int, path: *const c_char, mode: c_int, flags: c_int) -> c_int;

    link => link(oldpath: *const c_char, newpath: *const c_char) -> c_int;
    symlink => symlink(target: *const c_char, linkpath: *const c_char) -> c_int;
    readlink => readlink(path: *const c_char, buf: *mut c_char, bufsiz: size_t) -> ssize_t;
    readlinkat => readlinkat(dirfd: c_int, path: *const c_char, buf: *mut c_char, bufsiz: size_t) -> ssize_t;
    rename => rename(oldpath: *const c_char, newpath: *const c_char) -> c_int;
    unlink => unlink(path: *const c_char) -> c_int;

    chmod => chmod(path: *const c_char, mode: mode_t) -> c_int;
    fchmod => fchmod(fd: c_int, mode: mode_t) -> c_int;
    chown => chown(path: *const c_char, owner: uid_t, group: gid_t) -> c_int;
    fchown => fchown(fd: c_int, owner: uid_t, group: gid_t) -> c_int;
    lchown => lchown(path: *const c_char, owner: uid_t, group: gid_t) -> c_int;

    utime => utime(path: *const c_char, times: *const utimbuf) -> c_int;
    utimes => utimes(path: *const c_char, times: *const timeval) -> c_int;
    futimes => futimes(fd: c_int, times: *const timeval) -> c_int;
    lutimes => lutimes(path: *const c_char, times: *const timeval) -> c_int;
    futimens => futimens(fd: c_int, times: *const timespec) -> c_int;

    opendir => opendir(path: *const c_char) -> *mut DIR;
    fdopendir => fdopendir(fd: c_int) -> *mut DIR;
    readdir => readdir(dir: *mut DIR) -> *mut dirent;
    closedir => closedir(dir: *mut DIR) -> c_int;
    dirfd => dirfd(dir: *mut DIR) -> c_int;

    ioctl => ioctl(fd: c_int, request: c_ulong, arg: *mut c_void) -> c_int;
    getxattr => getxattr(path: *const c_char, name: *const c_char, value: *mut c_void, size: size_t) -> ssize_t;
}

/*
 * Stable Rust cannot define C-variadic functions. The variadic calls below
 * take their trailing argument as one fixed word instead: on x86_64 the
 * caller leaves it in a register whether or not it passed one, and the word
 * is only interpreted when the flags or command say it exists.
 */

#[unsafe(no_mangle)]
pub unsafe extern "C" fn open(path: *const c_char, flags: c_int, mode: mode_t) -> c_int {
    let real_mode = OpenMode::decode(flags).apply(mode);
    runtime().enter(
        |shim| unsafe { shim.open(path, flags, mode) },
        |real| unsafe { real.open(path, flags, real_mode) },
    )
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn open64(path: *const c_char, flags: c_int, mode: mode_t) -> c_int {
    unsafe { open(path, flags, mode) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn openat(
    dirfd: c_int,
    path: *const c_char,
    flags: c_int,
    mode: mode_t,
) -> c_int {
    let real_mode = OpenMode::decode(flags).apply(mode);
    runtime().enter(
        |shim| unsafe { shim.openat(dirfd, path, flags, mode) },
        |real| unsafe { real.openat(dirfd, path, flags, real_mode) },
    )
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn openat64(
    dirfd: c_int,
    path: *const c_char,
    flags: c_int,
    mode: mode_t,
) -> c_int {
    unsafe { openat(dirfd, path, flags, mode) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn fcntl(fd: c_int, cmd: c_int, arg: usize) -> c_int {
    let real_arg = FcntlCmd::from_raw(cmd)
        .map_or(FcntlArg::Ptr(arg as *mut c_void), |c| c.decode_arg(arg));
    runtime().enter(
        |shim| unsafe { shim.fcntl(fd, cmd, arg) },
        |real| unsafe { real.fcntl(fd, cmd, real_arg) },
    )
}

// Pre-2.33 glibc headers inline the stat family into these.

#[unsafe(no_mangle)]
pub unsafe extern "C" fn __xstat(
    _ver: c_int,
    path: *const c_char,
    buf: *mut libc::stat,
) -> c_int {
    unsafe { stat(path, buf) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn __lxstat(
    _ver: c_int,
    path: *const c_char,
    buf: *mut libc::stat,
) -> c_int {
    unsafe { lstat(path, buf) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn __fxstat(_ver: c_int, fd: c_int, buf: *mut libc::stat) -> c_int {
    unsafe { fstat(fd, buf) }
}
