use super::Shim;
use super::forward::{FdRoute, buf_mut, buf_ref, iovecs};
use crate::calls::{RawArg, spec};
use crate::fd::VirtualFd;
use crate::mount::FsResult;
use crate::resolver::RealLibc;
use libc::{c_int, c_void, iovec, off_t, size_t, ssize_t};
use nix::errno::Errno;

#[derive(Clone, Copy)]
enum Direction {
    Read,
    Write,
}

#[allow(clippy::missing_safety_doc)]
impl<L: RealLibc> Shim<L> {
    pub unsafe fn read(&self, fd: c_int, buf: *mut c_void, count: size_t) -> ssize_t {
        let args = [fd.into(), RawArg::ptr(buf), count.into()];
        self.dispatch(&spec::READ, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => b.settle(
                unsafe { buf_mut(buf, count) }
                    .and_then(|buf| vfd.mount.ops().read(vfd.backend_fd, buf)),
                |n| n as ssize_t,
            ),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.read(real, buf, count) })
            }
        })
    }

    pub unsafe fn write(&self, fd: c_int, buf: *const c_void, count: size_t) -> ssize_t {
        let args = [fd.into(), RawArg::ptr(buf), count.into()];
        self.dispatch(&spec::WRITE, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => b.settle(
                unsafe { buf_ref(buf, count) }
                    .and_then(|buf| vfd.mount.ops().write(vfd.backend_fd, buf)),
                |n| n as ssize_t,
            ),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.write(real, buf, count) })
            }
        })
    }

    pub unsafe fn pread(
        &self,
        fd: c_int,
        buf: *mut c_void,
        count: size_t,
        offset: off_t,
    ) -> ssize_t {
        let args = [fd.into(), RawArg::ptr(buf), count.into(), offset.into()];
        self.dispatch(&spec::PREAD, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => b.settle(
                unsafe { buf_mut(buf, count) }
                    .and_then(|buf| vfd.mount.ops().pread(vfd.backend_fd, buf, offset)),
                |n| n as ssize_t,
            ),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.pread(real, buf, count, offset) })
            }
        })
    }

    pub unsafe fn pwrite(
        &self,
        fd: c_int,
        buf: *const c_void,
        count: size_t,
        offset: off_t,
    ) -> ssize_t {
        let args = [fd.into(), RawArg::ptr(buf), count.into(), offset.into()];
        self.dispatch(&spec::PWRITE, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => b.settle(
                unsafe { buf_ref(buf, count) }
                    .and_then(|buf| vfd.mount.ops().pwrite(vfd.backend_fd, buf, offset)),
                |n| n as ssize_t,
            ),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.pwrite(real, buf, count, offset) })
            }
        })
    }

    pub unsafe fn readv(&self, fd: c_int, iov: *const iovec, iovcnt: c_int) -> ssize_t {
        let args = [fd.into(), RawArg::ptr(iov), iovcnt.into()];
        self.dispatch(&spec::READV, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => b.settle(
                unsafe { vectored(&vfd, Direction::Read, iov, iovcnt, None) },
                |n| n as ssize_t,
            ),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.readv(real, iov, iovcnt) })
            }
        })
    }

    pub unsafe fn writev(&self, fd: c_int, iov: *const iovec, iovcnt: c_int) -> ssize_t {
        let args = [fd.into(), RawArg::ptr(iov), iovcnt.into()];
        self.dispatch(&spec::WRITEV, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => b.settle(
                unsafe { vectored(&vfd, Direction::Write, iov, iovcnt, None) },
                |n| n as ssize_t,
            ),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.writev(real, iov, iovcnt) })
            }
        })
    }

    pub unsafe fn preadv(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
    ) -> ssize_t {
        let args = [fd.into(), RawArg::ptr(iov), iovcnt.into(), offset.into()];
        self.dispatch(&spec::PREADV, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => b.settle(
                unsafe { vectored(&vfd, Direction::Read, iov, iovcnt, Some(offset)) },
                |n| n as ssize_t,
            ),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.preadv(real, iov, iovcnt, offset) })
            }
        })
    }

    pub unsafe fn pwritev(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
    ) -> ssize_t {
        let args = [fd.into(), RawArg::ptr(iov), iovcnt.into(), offset.into()];
        self.dispatch(&spec::PWRITEV, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => b.settle(
                unsafe { vectored(&vfd, Direction::Write, iov, iovcnt, Some(offset)) },
                |n| n as ssize_t,
            ),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.pwritev(real, iov, iovcnt, offset) })
            }
        })
    }

    /// Mounts only take `flags == 0`; an offset of -1 means the current position.
    pub unsafe fn preadv2(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
        flags: c_int,
    ) -> ssize_t {
        let args = [
            fd.into(),
            RawArg::ptr(iov),
            iovcnt.into(),
            offset.into(),
            flags.into(),
        ];
        self.dispatch(&spec::PREADV2, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(_) if flags != 0 => b.not_supported(),
            FdRoute::Mount(vfd) => b.settle(
                unsafe {
                    vectored(&vfd, Direction::Read, iov, iovcnt, positioned(offset))
                },
                |n| n as ssize_t,
            ),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => b.forward(|l| unsafe {
                l.preadv2(real, iov, iovcnt, offset, flags)
            }),
        })
    }

    pub unsafe fn pwritev2(
        &self,
        fd: c_int,
        iov: *const iovec,
        iovcnt: c_int,
        offset: off_t,
        flags: c_int,
    ) -> ssize_t {
        let args = [
            fd.into(),
            RawArg::ptr(iov),
            iovcnt.into(),
            offset.into(),
            flags.into(),
        ];
        self.dispatch(&spec::PWRITEV2, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(_) if flags != 0 => b.not_supported(),
            FdRoute::Mount(vfd) => b.settle(
                unsafe {
                    vectored(&vfd, Direction::Write, iov, iovcnt, positioned(offset))
                },
                |n| n as ssize_t,
            ),
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => b.forward(|l| unsafe {
                l.pwritev2(real, iov, iovcnt, offset, flags)
            }),
        })
    }

    pub unsafe fn lseek(&self, fd: c_int, offset: off_t, whence: c_int) -> off_t {
        let args = [fd.into(), offset.into(), whence.into()];
        self.dispatch(&spec::LSEEK, &args, |b| match self.route_fd(fd) {
            FdRoute::Mount(vfd) => {
                b.settle(vfd.mount.ops().lseek(vfd.backend_fd, offset, whence), |o| o)
            }
            FdRoute::Stale => b.fail(Errno::EBADF),
            FdRoute::Redirected(real) | FdRoute::Real(real) => {
                b.forward(|l| unsafe { l.lseek(real, offset, whence) })
            }
        })
    }
}

fn positioned(offset: off_t) -> Option<off_t> {
    (offset != -1).then_some(offset)
}

/// Runs a vectored transfer against a mount one buffer at a time. A short
/// transfer ends it, and an error after some progress reports the progress.
unsafe fn vectored(
    vfd: &VirtualFd,
    direction: Direction,
    iov: *const iovec,
    iovcnt: c_int,
    offset: Option<off_t>,
) -> FsResult<usize> {
    let ops = vfd.mount.ops();
    let mut total = 0usize;
    for v in unsafe { iovecs(iov, iovcnt) }? {
        let at = offset.map(|o| o + total as off_t);
        let step = match direction {
            Direction::Read => unsafe { buf_mut(v.iov_base, v.iov_len) }.and_then(|buf| {
                match at {
                    Some(at) => ops.pread(vfd.backend_fd, buf, at),
                    None => ops.read(vfd.backend_fd, buf),
                }
            }),
            Direction::Write => unsafe { buf_ref(v.iov_base, v.iov_len) }.and_then(|buf| {
                match at {
                    Some(at) => ops.pwrite(vfd.backend_fd, buf, at),
                    None => ops.write(vfd.backend_fd, buf),
                }
            }),
        };
        match step {
            Ok(n) => {
                total += n;
                if n < v.iov_len {
                    break;
                }
            }
            Err(_) if total > 0 => break,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}
