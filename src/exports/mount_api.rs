use crate::mount::{COperations, FsmockIo, MountError};
use crate::resolver::{IsolatedLibc, RealLibc};
use crate::runtime::runtime;
use crate::shim::Shim;
use libc::{c_char, c_int};
use nix::errno::Errno;
use std::ffi::CStr;
use std::sync::Arc;

fn mount_call(
    call: impl FnOnce(&Shim<IsolatedLibc>) -> Result<(), MountError>,
) -> c_int {
    runtime().enter(
        |shim| match call(shim) {
            Ok(()) => 0,
            Err(e) => {
                Errno::set_raw(e.errno() as c_int);
                -1
            }
        },
        |real| {
            real.set_errno(Errno::ENOSYS as c_int);
            -1
        },
    )
}

/// # Safety
/// `path` must be a valid C string. `io` must stay valid, and its slots
/// callable, until the matching `fsmock_umount`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fsmock_mount(path: *const c_char, io: *const FsmockIo) -> c_int {
    if path.is_null() || io.is_null() {
        Errno::set_raw(Errno::EINVAL as c_int);
        return -1;
    }
    let mountpoint = unsafe { CStr::from_ptr(path) };
    let ops = Arc::new(unsafe { COperations::new(io) });
    mount_call(|shim| shim.mount(mountpoint, ops))
}

/// # Safety
/// `path` must be a valid C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fsmock_umount(path: *const c_char) -> c_int {
    if path.is_null() {
        Errno::set_raw(Errno::EINVAL as c_int);
        return -1;
    }
    let mountpoint = unsafe { CStr::from_ptr(path) };
    mount_call(|shim| shim.unmount(mountpoint))
}
