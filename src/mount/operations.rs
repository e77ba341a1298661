use libc::{c_int, gid_t, mode_t, off_t, timespec, timeval, uid_t, utimbuf};
use nix::errno::Errno;
use std::ffi::CStr;

pub type FsResult<T> = Result<T, Errno>;

/**
 * The operation table a virtual filesystem back-end supplies when it is
 * mounted.
 *
 * Paths are always the caller's full, unmodified path, mount point
 * included. Descriptors handed in are the back-end's own descriptors as
 * returned from `open`/`creat`, never the values the caller sees. Every
 * method defaults to `ENOSYS`, which callers observe as "not supported".
 */
#[allow(unused_variables)]
pub trait FsOperations: Send + Sync {
    fn open(
        &self,
        path: &CStr,
        flags: c_int,
        mode: Option<mode_t>,
    ) -> FsResult<c_int> {
        Err(Errno::ENOSYS)
    }

    fn close(&self, fd: c_int) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn creat(&self, path: &CStr, mode: mode_t) -> FsResult<c_int> {
        Err(Errno::ENOSYS)
    }

    fn unlink(&self, path: &CStr) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn link(&self, oldpath: &CStr, newpath: &CStr) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn symlink(&self, target: &CStr, linkpath: &CStr) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    /// Fills `buf` with the link content, unterminated, and returns its length.
    fn readlink(&self, path: &CStr, buf: &mut [u8]) -> FsResult<usize> {
        Err(Errno::ENOSYS)
    }

    fn rename(&self, oldpath: &CStr, newpath: &CStr) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn access(&self, path: &CStr, mode: c_int) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn stat(&self, path: &CStr, buf: &mut libc::stat) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn fstat(&self, fd: c_int, buf: &mut libc::stat) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn lstat(&self, path: &CStr, buf: &mut libc::stat) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn read(&self, fd: c_int, buf: &mut [u8]) -> FsResult<usize> {
        Err(Errno::ENOSYS)
    }

    fn write(&self, fd: c_int, buf: &[u8]) -> FsResult<usize> {
        Err(Errno::ENOSYS)
    }

    fn pread(&self, fd: c_int, buf: &mut [u8], offset: off_t) -> FsResult<usize> {
        Err(Errno::ENOSYS)
    }

    fn pwrite(&self, fd: c_int, buf: &[u8], offset: off_t) -> FsResult<usize> {
        Err(Errno::ENOSYS)
    }

    fn lseek(&self, fd: c_int, offset: off_t, whence: c_int) -> FsResult<off_t> {
        Err(Errno::ENOSYS)
    }

    fn chmod(&self, path: &CStr, mode: mode_t) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn fchmod(&self, fd: c_int, mode: mode_t) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn chown(&self, path: &CStr, owner: uid_t, group: gid_t) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn fchown(&self, fd: c_int, owner: uid_t, group: gid_t) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn lchown(&self, path: &CStr, owner: uid_t, group: gid_t) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    /// `None` sets both times to now.
    fn utime(&self, path: &CStr, times: Option<&utimbuf>) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn utimes(&self, path: &CStr, times: Option<&[timeval; 2]>) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn futimes(&self, fd: c_int, times: Option<&[timeval; 2]>) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn lutimes(&self, path: &CStr, times: Option<&[timeval; 2]>) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }

    fn futimens(&self, fd: c_int, times: Option<&[timespec; 2]>) -> FsResult<()> {
        Err(Errno::ENOSYS)
    }
}
