use super::Shim;
use super::forward::{PathRoute, opt_cstr};
use crate::calls::{RawArg, spec};
use crate::classify::SymlinkMode;
use crate::resolver::RealLibc;
use libc::{c_char, c_void, size_t, ssize_t};

#[allow(clippy::missing_safety_doc)]
impl<L: RealLibc> Shim<L> {
    /// There is no `*at` form to reissue, so anything routed away from the
    /// host filesystem is not supported.
    pub unsafe fn getxattr(
        &self,
        path: *const c_char,
        name: *const c_char,
        value: *mut c_void,
        size: size_t,
    ) -> ssize_t {
        let (c_path, c_name) = unsafe { (opt_cstr(path), opt_cstr(name)) };
        let args = [
            RawArg::Str(c_path),
            RawArg::Str(c_name),
            RawArg::ptr(value),
            size.into(),
        ];
        self.dispatch(&spec::GETXATTR, &args, |b| {
            match self.route_path(c_path, SymlinkMode::Follow) {
                PathRoute::Mount(..) | PathRoute::Redirect(_) => b.not_supported(),
                PathRoute::Forward => {
                    b.forward(|l| unsafe { l.getxattr(path, name, value, size) })
                }
            }
        })
    }
}
