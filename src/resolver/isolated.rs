use super::{FcntlArg, RealLibc, ResolveError};
use libc::{
    DIR, c_char, c_int, c_long, c_ulong, c_void, dirent, gid_t, iovec, mode_t,
    off_t, size_t, ssize_t, timespec, timeval, uid_t, utimbuf,
};
use log::{debug, trace};
use std::ffi::{CStr, CString};

const LIBC_SONAME: &CStr = c"libc.so.6";

/// `dlmopen` namespace id requesting a fresh link map.
const LM_ID_NEWLM: c_long = -1;

/// `_STAT_VER` expected by the `__xstat` family on x86_64.
const STAT_VER: c_int = 1;

unsafe extern "C" {
    fn dlmopen(lmid: c_long, filename: *const c_char, flags: c_int)
    -> *mut c_void;
    fn dlvsym(
        handle: *mut c_void,
        symbol: *const c_char,
        version: *const c_char,
    ) -> *mut c_void;
}

type XstatFn = unsafe extern "C" fn(c_int, *const c_char, *mut libc::stat) -> c_int;

macro_rules! symbols {
    ($($field:ident = $name:literal @ $version:literal : $ty:ty;)*) => {
        struct Symbols {
            $($field: $ty,)*
        }

        impl Symbols {
            unsafe fn resolve(handle: *mut c_void) -> Result<Self, ResolveError> {
                Ok(Self {
                    $($field: unsafe { lookup::<$ty>(handle, $name, $version) }?,)*
                })
            }
        }

        /// Every `(symbol, version)` pair the isolated library must provide.
        pub const REQUIRED_SYMBOLS: &[(&str, &str)] = &[$(($name, $version),)*];
    };
}

symbols! {
    errno_location = "__errno_location" @ "GLIBC_2.2.5" : unsafe extern "C" fn() -> *mut c_int;

    open = "open" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char, c_int, ...) -> c_int;
    openat = "openat" @ "GLIBC_2.4" : unsafe extern "C" fn(c_int, *const c_char, c_int, ...) -> c_int;
    creat = "creat" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char, mode_t) -> c_int;
    close = "close" @ "GLIBC_2.2.5" : unsafe extern "C" fn(c_int) -> c_int;

    read = "read" @ "GLIBC_2.2.5" : unsafe extern "C" fn(c_int, *mut c_void, size_t) -> ssize_t;
    write = "write" @ "GLIBC_2.2.5" : unsafe extern "C" fn(c_int, *const c_void, size_t) -> ssize_t;
    pread = "pread64" @ "GLIBC_2.2.5" : unsafe extern "C" fn(c_int, *mut c_void, size_t, off_t) -> ssize_t;
    pwrite = "pwrite64" @ "GLIBC_2.2.5" : unsafe extern "C" fn(c_int, *const c_void, size_t, off_t) -> ssize_t;
    readv = "readv" @ "GLIBC_2.2.5" : unsafe extern "C" fn(c_int, *const iovec, c_int) -> ssize_t;
    writev = "writev" @ "GLIBC_2.2.5" : unsafe extern "C" fn(c_int, *const iovec, c_int) -> ssize_t;
    preadv = "preadv" @ "GLIBC_2.10" : unsafe extern "C" fn(c_int, *const iovec, c_int, off_t) -> ssize_t;
    pwritev = "pwritev" @ "GLIBC_2.10" : unsafe extern "C" fn(c_int, *const iovec, c_int, off_t) -> ssize_t;
    preadv2 = "preadv2" @ "GLIBC_2.26" : unsafe extern "C" fn(c_int, *const iovec, c_int, off_t, c_int) -> ssize_t;
    pwritev2 = "pwritev2" @ "GLIBC_2.26" : unsafe extern "C" fn(c_int, *const iovec, c_int, off_t, c_int) -> ssize_t;
    lseek = "lseek" @ "GLIBC_2.2.5" : unsafe extern "C" fn(c_int, off_t, c_int) -> off_t;

    xstat = "__xstat" @ "GLIBC_2.2.5" : XstatFn;
    lxstat = "__lxstat" @ "GLIBC_2.2.5" : XstatFn;
    fxstat = "__fxstat" @ "GLIBC_2.2.5" : unsafe extern "C" fn(c_int, c_int, *mut libc::stat) -> c_int;
    fxstatat = "__fxstatat" @ "GLIBC_2.4" : unsafe extern "C" fn(c_int, c_int, *const c_char, *mut libc::stat, c_int) -> c_int;

    access = "access" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char, c_int) -> c_int;
    faccessat = "faccessat" @ "GLIBC_2.4" : unsafe extern "C" fn(c_int, *const c_char, c_int, c_int) -> c_int;

    link = "link" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char, *const c_char) -> c_int;
    linkat = "linkat" @ "GLIBC_2.4" : unsafe extern "C" fn(c_int, *const c_char, c_int, *const c_char, c_int) -> c_int;
    symlink = "symlink" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char, *const c_char) -> c_int;
    symlinkat = "symlinkat" @ "GLIBC_2.4" : unsafe extern "C" fn(*const c_char, c_int, *const c_char) -> c_int;
    readlink = "readlink" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char, *mut c_char, size_t) -> ssize_t;
    readlinkat = "readlinkat" @ "GLIBC_2.4" : unsafe extern "C" fn(c_int, *const c_char, *mut c_char, size_t) -> ssize_t;
    rename = "rename" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char, *const c_char) -> c_int;
    renameat = "renameat" @ "GLIBC_2.4" : unsafe extern "C" fn(c_int, *const c_char, c_int, *const c_char) -> c_int;
    unlink = "unlink" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char) -> c_int;
    unlinkat = "unlinkat" @ "GLIBC_2.4" : unsafe extern "C" fn(c_int, *const c_char, c_int) -> c_int;

    chmod = "chmod" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char, mode_t) -> c_int;
    fchmod = "fchmod" @ "GLIBC_2.2.5" : unsafe extern "C" fn(c_int, mode_t) -> c_int;
    fchmodat = "fchmodat" @ "GLIBC_2.4" : unsafe extern "C" fn(c_int, *const c_char, mode_t, c_int) -> c_int;
    chown = "chown" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char, uid_t, gid_t) -> c_int;
    fchown = "fchown" @ "GLIBC_2.2.5" : unsafe extern "C" fn(c_int, uid_t, gid_t) -> c_int;
    lchown = "lchown" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char, uid_t, gid_t) -> c_int;
    fchownat = "fchownat" @ "GLIBC_2.4" : unsafe extern "C" fn(c_int, *const c_char, uid_t, gid_t, c_int) -> c_int;

    utime = "utime" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char, *const utimbuf) -> c_int;
    utimes = "utimes" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char, *const timeval) -> c_int;
    futimes = "futimes" @ "GLIBC_2.3" : unsafe extern "C" fn(c_int, *const timeval) -> c_int;
    lutimes = "lutimes" @ "GLIBC_2.3" : unsafe extern "C" fn(*const c_char, *const timeval) -> c_int;
    futimens = "futimens" @ "GLIBC_2.6" : unsafe extern "C" fn(c_int, *const timespec) -> c_int;
    utimensat = "utimensat" @ "GLIBC_2.6" : unsafe extern "C" fn(c_int, *const c_char, *const timespec, c_int) -> c_int;

    opendir = "opendir" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*const c_char) -> *mut DIR;
    fdopendir = "fdopendir" @ "GLIBC_2.4" : unsafe extern "C" fn(c_int) -> *mut DIR;
    readdir = "readdir" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*mut DIR) -> *mut dirent;
    closedir = "closedir" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*mut DIR) -> c_int;
    dirfd = "dirfd" @ "GLIBC_2.2.5" : unsafe extern "C" fn(*mut DIR) -> c_int;

    fcntl = "fcntl" @ "GLIBC_2.2.5" : unsafe extern "C" fn(c_int, c_int, ...) -> c_int;
    ioctl = "ioctl" @ "GLIBC_2.2.5" : unsafe extern "C" fn(c_int, c_ulong, ...) -> c_int;
    getxattr = "getxattr" @ "GLIBC_2.3" : unsafe extern "C" fn(*const c_char, *const c_char, *mut c_void, size_t) -> ssize_t;
    realpath = "realpath" @ "GLIBC_2.3" : unsafe extern "C" fn(*const c_char, *mut c_char) -> *mut c_char;
}

fn dlerror_string() -> String {
    let err = unsafe { libc::dlerror() };
    if err.is_null() {
        "unknown error".to_string()
    } else {
        unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned()
    }
}

unsafe fn lookup<F: Copy>(
    handle: *mut c_void,
    name: &'static str,
    version: &'static str,
) -> Result<F, ResolveError> {
    let missing = |reason: String| ResolveError::MissingSymbol {
        name,
        version,
        reason,
    };
    let c_name = CString::new(name).map_err(|e| missing(e.to_string()))?;
    let c_version =
        CString::new(version).map_err(|e| missing(e.to_string()))?;

    let ptr = unsafe { dlvsym(handle, c_name.as_ptr(), c_version.as_ptr()) };
    if ptr.is_null() {
        return Err(missing(dlerror_string()));
    }
    trace!("resolved {}@{} = {:p}", name, version, ptr);

    debug_assert_eq!(
        std::mem::size_of::<F>(),
        std::mem::size_of::<*mut c_void>()
    );
    Ok(unsafe { std::mem::transmute_copy::<*mut c_void, F>(&ptr) })
}

/**
 * A private copy of the C library loaded into its own link-map namespace.
 *
 * The copy shares no symbols with the host process and binds its own
 * references deeply, so calls made through it can never land back in this
 * crate's exports.
 */
pub struct IsolatedLibc {
    handle: *mut c_void,
    sym: Symbols,
}

// The handle and the function pointers are immutable after construction.
unsafe impl Send for IsolatedLibc {}
unsafe impl Sync for IsolatedLibc {}

impl IsolatedLibc {
    pub fn load() -> Result<Self, ResolveError> {
        let handle = unsafe {
            dlmopen(
                LM_ID_NEWLM,
                LIBC_SONAME.as_ptr(),
                libc::RTLD_NOW
                    | libc::RTLD_LOCAL
                    | libc::RTLD_NODELETE
                    | libc::RTLD_DEEPBIND,
            )
        };
        if handle.is_null() {
            return Err(ResolveError::Load {
                library: LIBC_SONAME.to_string_lossy().into_owned(),
                reason: dlerror_string(),
            });
        }

        let sym = match unsafe { Symbols::resolve(handle) } {
            Ok(sym) => sym,
            Err(e) => {
                unsafe { libc::dlclose(handle) };
                return Err(e);
            }
        };
        debug!(
            "Loaded isolated {} with {} versioned symbols",
            LIBC_SONAME.to_string_lossy(),
            REQUIRED_SYMBOLS.len()
        );

        Ok(Self { handle, sym })
    }
}

impl Drop for IsolatedLibc {
    fn drop(&mut self) {
        trace!("Releasing isolated {}", LIBC_SONAME.to_string_lossy());
        unsafe { libc::dlclose(self.handle) };
    }
}

impl RealLibc for IsolatedLibc {
    fn errno(&self) -> c_int {
        unsafe { *(self.sym.errno_location)() }
    }

    fn set_errno(&self, errno: c_int) {
        unsafe { *(self.sym.errno_location)() = errno };
    }

    unsafe fn open(
        &self,
        path: *const c_char,
        flags: c_int,
        mode: Option<mode_t>,
    ) -> c_int {
        match mode {
            Some(mode) => unsafe { (self.sym.open)(path, flags, mode) },
            None => unsafe { (self.sym.open)(path, flags) },
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
            Some(mode) => unsafe { (self.sym.openat)(dirfd, path, flags, mode) },
            None => unsafe { (self.sym.openat)(dirfd, path, flags) },
        }
    }

    unsafe fn creat(&self, path: *const c_char, mode: mode_t) -> c_int {
        unsafe { (self.sym.creat)(path, mode) }
    }

    unsafe fn close(&self, fd: c_int) -> c_int {
        unsafe { (self.sym.close)(fd) }
    }

    unsafe fn read(
        &self,
        fd: c_int,
        buf: *mut c_void,
        count: size_t,
    ) -> ssize_t {
        unsafe { (self.sym.read)(fd, buf, count) }
    }

    unsafe fn write(
        &self,
        fd: c_int,
        buf: *const c_void,
        count: size_t,
    ) -> ssize_t {
        unsafe { (self.sym.write)(fd, buf, count) }
    }

    unsafe fn pread(
        &self,
        fd: c_int,
        buf: *mut c_void,
        count: size_t,
        offset: off_t,
    ) -> ssize_t {
        unsafe { (self.sym.pread)(fd, buf, count, offset) }
    }

    unsafe fn pwrite(
        &self,
        fd: c_int,
        buf: *const c_void,
        count: size_t,
        offset: off_t,
    ) -> ssize_t {
        unsafe { (self.sym.pwrite)(fd, buf, count, offset) }
    }

    unsafe fn readv(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
    ) -> ssize_t {
        unsafe { (self.sym.readv)(fd, iov, iovcnt) }
    }

    unsafe fn writev(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
    ) -> ssize_t {
        unsafe { (self.sym.writev)(fd, iov, iovcnt) }
    }

    unsafe fn preadv(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
    ) -> ssize_t {
        unsafe { (self.sym.preadv)(fd, iov, iovcnt, offset) }
    }

    unsafe fn pwritev(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
    ) -> ssize_t {
        unsafe { (self.sym.pwritev)(fd, iov, iovcnt, offset) }
    }

    unsafe fn preadv2(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
        flags: c_int,
    ) -> ssize_t {
        unsafe { (self.sym.preadv2)(fd, iov, iovcnt, offset, flags) }
    }

    unsafe fn pwritev2(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
        flags: c_int,
    ) -> ssize_t {
        unsafe { (self.sym.pwritev2)(fd, iov, iovcnt, offset, flags) }
    }

    unsafe fn lseek(&self, fd: c_int, offset: off_t, whence: c_int) -> off_t {
        unsafe { (self.sym.lseek)(fd, offset, whence) }
    }

    unsafe fn stat(&self, path: *const c_char, buf: *mut libc::stat) -> c_int {
        unsafe { (self.sym.xstat)(STAT_VER, path, buf) }
    }

    unsafe fn fstat(&self, fd: c_int, buf: *mut libc::stat) -> c_int {
        unsafe { (self.sym.fxstat)(STAT_VER, fd, buf) }
    }

    unsafe fn lstat(&self, path: *const c_char, buf: *mut libc::stat) -> c_int {
        unsafe { (self.sym.lxstat)(STAT_VER, path, buf) }
    }

    unsafe fn fstatat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        buf: *mut libc::stat,
        flags: c_int,
    ) -> c_int {
        unsafe { (self.sym.fxstatat)(STAT_VER, dirfd, path, buf, flags) }
    }

    unsafe fn access(&self, path: *const c_char, mode: c_int) -> c_int {
        unsafe { (self.sym.access)(path, mode) }
    }

    unsafe fn faccessat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        mode: c_int,
        flags: c_int,
    ) -> c_int {
        unsafe { (self.sym.faccessat)(dirfd, path, mode, flags) }
    }

    unsafe fn link(&self, old: *const c_char, new: *const c_char) -> c_int {
        unsafe { (self.sym.link)(old, new) }
    }

    unsafe fn linkat(
        &self,
        olddirfd: c_int,
        old: *const c_char,
        newdirfd: c_int,
        new: *const c_char,
        flags: c_int,
    ) -> c_int {
        unsafe { (self.sym.linkat)(olddirfd, old, newdirfd, new, flags) }
    }

    unsafe fn symlink(
        &self,
        target: *const c_char,
        linkpath: *const c_char,
    ) -> c_int {
        unsafe { (self.sym.symlink)(target, linkpath) }
    }

    unsafe fn symlinkat(
        &self,
        target: *const c_char,
        newdirfd: c_int,
        linkpath: *const c_char,
    ) -> c_int {
        unsafe { (self.sym.symlinkat)(target, newdirfd, linkpath) }
    }

    unsafe fn readlink(
        &self,
        path: *const c_char,
        buf: *mut c_char,
        bufsiz: size_t,
    ) -> ssize_t {
        unsafe { (self.sym.readlink)(path, buf, bufsiz) }
    }

    unsafe fn readlinkat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        buf: *mut c_char,
        bufsiz: size_t,
    ) -> ssize_t {
        unsafe { (self.sym.readlinkat)(dirfd, path, buf, bufsiz) }
    }

    unsafe fn rename(&self, old: *const c_char, new: *const c_char) -> c_int {
        unsafe { (self.sym.rename)(old, new) }
    }

    unsafe fn renameat(
        &self,
        olddirfd: c_int,
        old: *const c_char,
        newdirfd: c_int,
        new: *const c_char,
    ) -> c_int {
        unsafe { (self.sym.renameat)(olddirfd, old, newdirfd, new) }
    }

    unsafe fn unlink(&self, path: *const c_char) -> c_int {
        unsafe { (self.sym.unlink)(path) }
    }

    unsafe fn unlinkat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        flags: c_int,
    ) -> c_int {
        unsafe { (self.sym.unlinkat)(dirfd, path, flags) }
    }

    unsafe fn chmod(&self, path: *const c_char, mode: mode_t) -> c_int {
        unsafe { (self.sym.chmod)(path, mode) }
    }

    unsafe fn fchmod(&self, fd: c_int, mode: mode_t) -> c_int {
        unsafe { (self.sym.fchmod)(fd, mode) }
    }

    unsafe fn fchmodat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        mode: mode_t,
        flags: c_int,
    ) -> c_int {
        unsafe { (self.sym.fchmodat)(dirfd, path, mode, flags) }
    }

    unsafe fn chown(
        &self,
        path: *const c_char,
        owner: uid_t,
        group: gid_t,
    ) -> c_int {
        unsafe { (self.sym.chown)(path, owner, group) }
    }

    unsafe fn fchown(&self, fd: c_int, owner: uid_t, group: gid_t) -> c_int {
        unsafe { (self.sym.fchown)(fd, owner, group) }
    }

    unsafe fn lchown(
        &self,
        path: *const c_char,
        owner: uid_t,
        group: gid_t,
    ) -> c_int {
        unsafe { (self.sym.lchown)(path, owner, group) }
    }

    unsafe fn fchownat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        owner: uid_t,
        group: gid_t,
        flags: c_int,
    ) -> c_int {
        unsafe { (self.sym.fchownat)(dirfd, path, owner, group, flags) }
    }

    unsafe fn utime(&self, path: *const c_char, times: *const utimbuf) -> c_int {
        unsafe { (self.sym.utime)(path, times) }
    }

    unsafe fn utimes(&self, path: *const c_char, times: *const timeval) -> c_int {
        unsafe { (self.sym.utimes)(path, times) }
    }

    unsafe fn futimes(&self, fd: c_int, times: *const timeval) -> c_int {
        unsafe { (self.sym.futimes)(fd, times) }
    }

    unsafe fn lutimes(
        &self,
        path: *const c_char,
        times: *const timeval,
    ) -> c_int {
        unsafe { (self.sym.lutimes)(path, times) }
    }

    unsafe fn futimens(&self, fd: c_int, times: *const timespec) -> c_int {
        unsafe { (self.sym.futimens)(fd, times) }
    }

    unsafe fn utimensat(
        &self,
        dirfd: c_int,
        path: *const c_char,
        times: *const timespec,
        flags: c_int,
    ) -> c_int {
        unsafe { (self.sym.utimensat)(dirfd, path, times, flags) }
    }

    unsafe fn opendir(&self, path: *const c_char) -> *mut DIR {
        unsafe { (self.sym.opendir)(path) }
    }

    unsafe fn fdopendir(&self, fd: c_int) -> *mut DIR {
        unsafe { (self.sym.fdopendir)(fd) }
    }

    unsafe fn readdir(&self, dir: *mut DIR) -> *mut dirent {
        unsafe { (self.sym.readdir)(dir) }
    }

    unsafe fn closedir(&self, dir: *mut DIR) -> c_int {
        unsafe { (self.sym.closedir)(dir) }
    }

    unsafe fn dirfd(&self, dir: *mut DIR) -> c_int {
        unsafe { (self.sym.dirfd)(dir) }
    }

    unsafe fn fcntl(&self, fd: c_int, cmd: c_int, arg: FcntlArg) -> c_int {
        match arg {
            FcntlArg::None => unsafe { (self.sym.fcntl)(fd, cmd) },
            FcntlArg::Int(arg) => unsafe { (self.sym.fcntl)(fd, cmd, arg) },
            FcntlArg::Ptr(arg) => unsafe { (self.sym.fcntl)(fd, cmd, arg) },
        }
    }

    unsafe fn ioctl(
        &self,
        fd: c_int,
        request: c_ulong,
        arg: *mut c_void,
    ) -> c_int {
        unsafe { (self.sym.ioctl)(fd, request, arg) }
    }

    unsafe fn getxattr(
        &self,
        path: *const c_char,
        name: *const c_char,
        value: *mut c_void,
        size: size_t,
    ) -> ssize_t {
        unsafe { (self.sym.getxattr)(path, name, value, size) }
    }

    unsafe fn realpath(
        &self,
        path: *const c_char,
        resolved: *mut c_char,
    ) -> *mut c_char {
        unsafe { (self.sym.realpath)(path, resolved) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_required_symbols_are_unique() {
        let mut seen = HashSet::new();
        for (name, version) in REQUIRED_SYMBOLS {
            assert!(seen.insert(*name), "{} listed twice", name);
            assert!(version.starts_with("GLIBC_2."));
        }
    }

    #[test]
    fn test_required_symbols_pin_legacy_stat() {
        assert!(REQUIRED_SYMBOLS.contains(&("__xstat", "GLIBC_2.2.5")));
        assert!(REQUIRED_SYMBOLS.contains(&("__fxstatat", "GLIBC_2.4")));
        assert!(REQUIRED_SYMBOLS.contains(&("lutimes", "GLIBC_2.3")));
        assert!(REQUIRED_SYMBOLS.contains(&("futimes", "GLIBC_2.3")));
    }

    #[test]
    fn test_load_resolves_every_symbol() {
        let real = IsolatedLibc::load().unwrap();

        let fd = unsafe { real.open(c"/dev/null".as_ptr(), libc::O_RDONLY, None) };
        assert!(fd >= 0);
        let mut sb: libc::stat = unsafe { std::mem::zeroed() };
        assert_eq!(unsafe { real.fstat(fd, &mut sb) }, 0);
        assert_eq!(sb.st_mode & libc::S_IFMT, libc::S_IFCHR);
        assert_eq!(unsafe { real.close(fd) }, 0);

        let ret = unsafe { real.stat(c"/bdsim-missing/entry".as_ptr(), &mut sb) };
        assert_eq!(ret, -1);
        assert_eq!(real.errno(), libc::ENOENT);

        let mut resolved = [0 as c_char; libc::PATH_MAX as usize];
        let out = unsafe { real.realpath(c"/dev/../dev/null".as_ptr(), resolved.as_mut_ptr()) };
        assert!(!out.is_null());
        let resolved = unsafe { CStr::from_ptr(resolved.as_ptr()) };
        assert_eq!(resolved, c"/dev/null");
    }
}
