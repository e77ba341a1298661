use super::{FsOperations, FsResult};
use libc::{
    c_char, c_int, c_uint, c_void, gid_t, mode_t, off_t, size_t, ssize_t,
    timespec, timeval, uid_t, utimbuf,
};
use nix::errno::Errno;
use std::ffi::CStr;

/// The C operation table accepted by `fsmock_mount`. A null slot means the
/// back-end does not implement that call.
#[repr(C)]
#[derive(Default, Clone, Copy)]
pub struct FsmockIo {
    pub open: Option<unsafe extern "C" fn(*const c_char, c_int, ...) -> c_int>,
    pub close: Option<unsafe extern "C" fn(c_int) -> c_int>,
    pub creat: Option<unsafe extern "C" fn(*const c_char, mode_t) -> c_int>,
    pub unlink: Option<unsafe extern "C" fn(*const c_char) -> c_int>,
    pub link: Option<unsafe extern "C" fn(*const c_char, *const c_char) -> c_int>,
    pub symlink:
        Option<unsafe extern "C" fn(*const c_char, *const c_char) -> c_int>,
    pub readlink:
        Option<unsafe extern "C" fn(*const c_char, *mut c_char, size_t) -> ssize_t>,
    pub rename:
        Option<unsafe extern "C" fn(*const c_char, *const c_char) -> c_int>,

    pub access: Option<unsafe extern "C" fn(*const c_char, c_int) -> c_int>,
    pub stat:
        Option<unsafe extern "C" fn(*const c_char, *mut libc::stat) -> c_int>,
    pub fstat: Option<unsafe extern "C" fn(c_int, *mut libc::stat) -> c_int>,
    pub lstat:
        Option<unsafe extern "C" fn(*const c_char, *mut libc::stat) -> c_int>,

    pub read: Option<unsafe extern "C" fn(c_int, *mut c_void, size_t) -> ssize_t>,
    pub write:
        Option<unsafe extern "C" fn(c_int, *const c_void, size_t) -> ssize_t>,
    pub lseek: Option<unsafe extern "C" fn(c_int, off_t, c_int) -> off_t>,

    pub chmod: Option<unsafe extern "C" fn(*const c_char, mode_t) -> c_int>,
    pub fchmod: Option<unsafe extern "C" fn(c_int, mode_t) -> c_int>,

    pub chown: Option<unsafe extern "C" fn(*const c_char, uid_t, gid_t) -> c_int>,
    pub fchown: Option<unsafe extern "C" fn(c_int, uid_t, gid_t) -> c_int>,
    pub lchown:
        Option<unsafe extern "C" fn(*const c_char, uid_t, gid_t) -> c_int>,

    pub utime:
        Option<unsafe extern "C" fn(*const c_char, *const utimbuf) -> c_int>,
    pub utimes:
        Option<unsafe extern "C" fn(*const c_char, *const timeval) -> c_int>,
    pub futimes: Option<unsafe extern "C" fn(c_int, *const timeval) -> c_int>,
    pub lutimes:
        Option<unsafe extern "C" fn(*const c_char, *const timeval) -> c_int>,
    pub futimens: Option<unsafe extern "C" fn(c_int, *const timespec) -> c_int>,
}

/**
 * Adapts a caller-owned [`FsmockIo`] to [`FsOperations`].
 *
 * The table is borrowed, never copied or freed: the registering code keeps
 * it alive for as long as the mount exists. Back-end failures are read from
 * the thread's `errno` right after the slot returns.
 */
pub struct COperations {
    io: *const FsmockIo,
}

// The table is only ever read, and the registering code guarantees it outlives
// the mount.
unsafe impl Send for COperations {}
unsafe impl Sync for COperations {}

impl COperations {
    /// # Safety
    /// `io` must be non-null and stay valid, unchanged, until the mount that
    /// owns this adapter has been removed.
    pub unsafe fn new(io: *const FsmockIo) -> Self {
        Self { io }
    }

    fn io(&self) -> &FsmockIo {
        unsafe { &*self.io }
    }
}

fn check(ret: c_int) -> FsResult<()> {
    if ret < 0 { Err(Errno::last()) } else { Ok(()) }
}

fn check_fd(ret: c_int) -> FsResult<c_int> {
    if ret < 0 { Err(Errno::last()) } else { Ok(ret) }
}

fn check_size(ret: ssize_t) -> FsResult<usize> {
    if ret < 0 { Err(Errno::last()) } else { Ok(ret as usize) }
}

macro_rules! slot {
    ($self:ident . $slot:ident) => {
        match $self.io().$slot {
            Some(f) => f,
            None => return Err(Errno::ENOSYS),
        }
    };
}

impl FsOperations for COperations {
    fn open(
        &self,
        path: &CStr,
        flags: c_int,
        mode: Option<mode_t>,
    ) -> FsResult<c_int> {
        let f = slot!(self.open);
        check_fd(match mode {
            Some(mode) => unsafe { f(path.as_ptr(), flags, mode as c_uint) },
            None => unsafe { f(path.as_ptr(), flags) },
        })
    }

    fn close(&self, fd: c_int) -> FsResult<()> {
        let f = slot!(self.close);
        check(unsafe { f(fd) })
    }

    fn creat(&self, path: &CStr, mode: mode_t) -> FsResult<c_int> {
        let f = slot!(self.creat);
        check_fd(unsafe { f(path.as_ptr(), mode) })
    }

    fn unlink(&self, path: &CStr) -> FsResult<()> {
        let f = slot!(self.unlink);
        check(unsafe { f(path.as_ptr()) })
    }

    fn link(&self, oldpath: &CStr, newpath: &CStr) -> FsResult<()> {
        let f = slot!(self.link);
        check(unsafe { f(oldpath.as_ptr(), newpath.as_ptr()) })
    }

    fn symlink(&self, target: &CStr, linkpath: &CStr) -> FsResult<()> {
        let f = slot!(self.symlink);
        check(unsafe { f(target.as_ptr(), linkpath.as_ptr()) })
    }

    fn readlink(&self, path: &CStr, buf: &mut [u8]) -> FsResult<usize> {
        let f = slot!(self.readlink);
        check_size(unsafe { f(path.as_ptr(), buf.as_mut_ptr().cast(), buf.len()) })
    }

    fn rename(&self, oldpath: &CStr, newpath: &CStr) -> FsResult<()> {
        let f = slot!(self.rename);
        check(unsafe { f(oldpath.as_ptr(), newpath.as_ptr()) })
    }

    fn access(&self, path: &CStr, mode: c_int) -> FsResult<()> {
        let f = slot!(self.access);
        check(unsafe { f(path.as_ptr(), mode) })
    }

    fn stat(&self, path: &CStr, buf: &mut libc::stat) -> FsResult<()> {
        let f = slot!(self.stat);
        check(unsafe { f(path.as_ptr(), buf) })
    }

    fn fstat(&self, fd: c_int, buf: &mut libc::stat) -> FsResult<()> {
        let f = slot!(self.fstat);
        check(unsafe { f(fd, buf) })
    }

    fn lstat(&self, path: &CStr, buf: &mut libc::stat) -> FsResult<()> {
        let f = slot!(self.lstat);
        check(unsafe { f(path.as_ptr(), buf) })
    }

    fn read(&self, fd: c_int, buf: &mut [u8]) -> FsResult<usize> {
        let f = slot!(self.read);
        check_size(unsafe { f(fd, buf.as_mut_ptr().cast(), buf.len()) })
    }

    fn write(&self, fd: c_int, buf: &[u8]) -> FsResult<usize> {
        let f = slot!(self.write);
        check_size(unsafe { f(fd, buf.as_ptr().cast(), buf.len()) })
    }

    fn lseek(&self, fd: c_int, offset: off_t, whence: c_int) -> FsResult<off_t> {
        let f = slot!(self.lseek);
        let ret = unsafe { f(fd, offset, whence) };
        if ret < 0 { Err(Errno::last()) } else { Ok(ret) }
    }

    fn chmod(&self, path: &CStr, mode: mode_t) -> FsResult<()> {
        let f = slot!(self.chmod);
        check(unsafe { f(path.as_ptr(), mode) })
    }

    fn fchmod(&self, fd: c_int, mode: mode_t) -> FsResult<()> {
        let f = slot!(self.fchmod);
        check(unsafe { f(fd, mode) })
    }

    fn chown(&self, path: &CStr, owner: uid_t, group: gid_t) -> FsResult<()> {
        let f = slot!(self.chown);
        check(unsafe { f(path.as_ptr(), owner, group) })
    }

    fn fchown(&self, fd: c_int, owner: uid_t, group: gid_t) -> FsResult<()> {
        let f = slot!(self.fchown);
        check(unsafe { f(fd, owner, group) })
    }

    fn lchown(&self, path: &CStr, owner: uid_t, group: gid_t) -> FsResult<()> {
        let f = slot!(self.lchown);
        check(unsafe { f(path.as_ptr(), owner, group) })
    }

    fn utime(&self, path: &CStr, times: Option<&utimbuf>) -> FsResult<()> {
        let f = slot!(self.utime);
        let times = times.map_or(std::ptr::null(), |t| t as *const utimbuf);
        check(unsafe { f(path.as_ptr(), times) })
    }

    fn utimes(&self, path: &CStr, times: Option<&[timeval; 2]>) -> FsResult<()> {
        let f = slot!(self.utimes);
        let times = times.map_or(std::ptr::null(), |t| t.as_ptr());
        check(unsafe { f(path.as_ptr(), times) })
    }

    fn futimes(&self, fd: c_int, times: Option<&[timeval; 2]>) -> FsResult<()> {
        let f = slot!(self.futimes);
        let times = times.map_or(std::ptr::null(), |t| t.as_ptr());
        check(unsafe { f(fd, times) })
    }

    fn lutimes(&self, path: &CStr, times: Option<&[timeval; 2]>) -> FsResult<()> {
        let f = slot!(self.lutimes);
        let times = times.map_or(std::ptr::null(), |t| t.as_ptr());
        check(unsafe { f(path.as_ptr(), times) })
    }

    fn futimens(&self, fd: c_int, times: Option<&[timespec; 2]>) -> FsResult<()> {
        let f = slot!(self.futimens);
        let times = times.map_or(std::ptr::null(), |t| t.as_ptr());
        check(unsafe { f(fd, times) })
    }
}
