use super::Shim;
use super::forward::{FdRoute, mangled};
use crate::calls::{FcntlCmd, RawArg, spec};
use crate::fd::is_virtual;
use crate::resolver::RealLibc;
use libc::{c_int, c_ulong, c_void};
use log::trace;
use nix::errno::Errno;

#[allow(clippy::missing_safety_doc)]
impl<L: RealLibc> Shim<L> {
    /// `arg` is the raw trailing word; it is reinterpreted according to
    /// `cmd` and not read at all for commands without an argument.
    pub unsafe fn fcntl(&self, fd: c_int, cmd: c_int, arg: usize) -> c_int {
        let known = FcntlCmd::from_raw(cmd);
        let args = [fd.into(), cmd.into(), arg.into()];
        self.dispatch(&spec::FCNTL, &args, |b| {
            let Some(command) = known.filter(|c| c.is_forwarded()) else {
                return b.not_supported();
            };
            let arg = command.decode_arg(arg);
            match self.route_fd(fd) {
                FdRoute::Real(real) => {
                    b.forward(|l| unsafe { l.fcntl(real, command.raw(), arg) })
                }
                FdRoute::Redirected(real) => {
                    let ret = b.forward(|l| unsafe { l.fcntl(real, command.raw(), arg) });
                    if command == FcntlCmd::DupFd {
                        mangled(ret)
                    } else {
                        ret
                    }
                }
                FdRoute::Mount(_) => {
                    trace!("{} on a mount descriptor is not supported", command.name());
                    b.not_supported()
                }
                FdRoute::Stale => b.fail(Errno::EBADF),
            }
        })
    }

    pub unsafe fn ioctl(&self, fd: c_int, request: c_ulong, arg: *mut c_void) -> c_int {
        let args = [fd.into(), RawArg::Int(request as i64), RawArg::ptr(arg)];
        self.dispatch(&spec::IOCTL, &args, |b| {
            if is_virtual(fd) {
                b.not_supported()
            } else {
                b.forward(|l| unsafe { l.ioctl(fd, request, arg) })
            }
        })
    }
}
