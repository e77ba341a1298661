use crate::calls::CallRet;
use crate::logger::RawStderr;
use crate::resolver::{InitError, RealLibc};
use crate::shim::Shim;
use arc_swap::ArcSwapOption;
use log::debug;
use nix::errno::Errno;
use std::cell::Cell;
use std::io::Write;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

thread_local! {
    static IN_SHIM: Cell<bool> = const { Cell::new(false) };
}

/// Held while a thread is inside an intercepted call.
struct ReentryGuard;

impl ReentryGuard {
    /// `None` when the thread is already inside the shim.
    fn acquire() -> Option<Self> {
        IN_SHIM
            .try_with(|inside| (!inside.replace(true)).then_some(ReentryGuard))
            .ok()
            .flatten()
    }
}

impl Drop for ReentryGuard {
    fn drop(&mut self) {
        let _ = IN_SHIM.try_with(|inside| inside.set(false));
    }
}

/// Writes `message` to standard error and aborts the process.
pub fn fatal(message: &str) -> ! {
    let _ = writeln!(RawStderr, "bdsim: fatal: {}", message);
    std::process::abort()
}

pub type ShimBuilder<L> = fn() -> Result<Shim<L>, InitError>;

/**
 * Owns the process-wide [`Shim`].
 *
 * `initialize` and `finalize` are reference counted so nested library
 * constructors pair up. Entry points load the published shim without
 * locking and only fall back to the lock to build it.
 */
pub struct Runtime<L: RealLibc> {
    refs: Mutex<usize>,
    shim: ArcSwapOption<Shim<L>>,
    build: ShimBuilder<L>,
}

impl<L: RealLibc> Runtime<L> {
    pub const fn new(build: ShimBuilder<L>) -> Self {
        Self {
            refs: Mutex::new(0),
            shim: ArcSwapOption::const_empty(),
            build,
        }
    }

    /// Brings the shim up on the first call. A failure aborts the process.
    pub fn initialize(&self) -> Arc<Shim<L>> {
        let mut refs = self.refs();
        *refs += 1;
        self.get_or_build(&refs)
    }

    /// Drops the shim once every `initialize` has been matched.
    pub fn finalize(&self) {
        let mut refs = self.refs();
        match *refs {
            0 => {}
            1 => {
                *refs = 0;
                self.shim.store(None);
                debug!("Shim finalized");
            }
            _ => *refs -= 1,
        }
    }

    pub fn ref_count(&self) -> usize {
        *self.refs()
    }

    /// The running shim, built lazily for calls that beat the constructor.
    pub fn current(&self) -> Arc<Shim<L>> {
        if let Some(shim) = self.shim.load_full() {
            return shim;
        }
        let refs = self.refs();
        self.get_or_build(&refs)
    }

    pub fn loaded(&self) -> Option<Arc<Shim<L>>> {
        self.shim.load_full()
    }

    /**
     * Runs one intercepted call.
     *
     * A call made from inside the shim itself skips routing and logging and
     * goes straight to the real library through `direct`, or fails with
     * `ENOSYS` while no library is loaded yet. A panic turns into a failure
     * with `EIO`.
     */
    pub fn enter<R: CallRet>(
        &self,
        call: impl FnOnce(&Shim<L>) -> R,
        direct: impl FnOnce(&L) -> R,
    ) -> R {
        let Some(_guard) = ReentryGuard::acquire() else {
            return match self.loaded() {
                Some(shim) => {
                    let libc = shim.libc();
                    libc.set_errno(Errno::last_raw());
                    let ret = direct(libc);
                    Errno::set_raw(libc.errno());
                    ret
                }
                None => {
                    Errno::set_raw(Errno::ENOSYS as i32);
                    R::failure()
                }
            };
        };
        match catch_unwind(AssertUnwindSafe(|| call(&self.current()))) {
            Ok(ret) => ret,
            Err(_) => {
                Errno::set_raw(Errno::EIO as i32);
                R::failure()
            }
        }
    }

    fn get_or_build(&self, _refs: &MutexGuard<'_, usize>) -> Arc<Shim<L>> {
        if let Some(shim) = self.shim.load_full() {
            return shim;
        }
        match catch_unwind(self.build) {
            Ok(Ok(shim)) => {
                let shim = Arc::new(shim);
                self.shim.store(Some(shim.clone()));
                shim
            }
            Ok(Err(e)) => fatal(&e.to_string()),
            Err(_) => fatal("Initialization panicked"),
        }
    }

    fn refs(&self) -> MutexGuard<'_, usize> {
        self.refs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(all(target_os = "linux", target_env = "gnu", target_arch = "x86_64"))]
mod process {
    use super::Runtime;
    use crate::config::resolve_config;
    use crate::logger::ShimLogger;
    use crate::mount::{FsOperations, MountError};
    use crate::resolver::{InitError, IsolatedLibc};
    use crate::shim::Shim;
    use crate::util::read_to_string;
    use log::{LevelFilter, debug};
    use std::ffi::CString;
    use std::sync::Arc;

    static RUNTIME: Runtime<IsolatedLibc> = Runtime::new(build);

    /// The runtime behind the exported entry points.
    pub fn runtime() -> &'static Runtime<IsolatedLibc> {
        &RUNTIME
    }

    fn build() -> Result<Shim<IsolatedLibc>, InitError> {
        let libc = Arc::new(IsolatedLibc::load()?);
        let config = resolve_config(|path| read_to_string(libc.as_ref(), path))
            .map_err(InitError::Config)?;
        if config.log_level > LevelFilter::Off {
            let _ = ShimLogger::new(config.log_level).init();
        }
        let shim = Shim::from_config(libc, &config)?;
        debug!(
            "bdsim up: root {}, variant {}",
            config.root.display(),
            config.variant
        );
        Ok(shim)
    }

    /// Registers `ops` at `mountpoint` in the process-wide shim.
    pub fn mount(
        mountpoint: &str,
        ops: Arc<dyn FsOperations>,
    ) -> Result<(), MountError> {
        let c_mountpoint = CString::new(mountpoint)
            .map_err(|_| MountError::InvalidPath(mountpoint.to_string()))?;
        RUNTIME.current().mount(&c_mountpoint, ops)
    }

    pub fn unmount(mountpoint: &str) -> Result<(), MountError> {
        let c_mountpoint = CString::new(mountpoint)
            .map_err(|_| MountError::InvalidPath(mountpoint.to_string()))?;
        RUNTIME.current().unmount(&c_mountpoint)
    }
}

#[cfg(all(target_os = "linux", target_env = "gnu", target_arch = "x86_64"))]
pub use process::*;

#[cfg(all(test, not(feature = "interpose")))]
mod tests {
    use super::*;
    use crate::calls::CallLog;
    use crate::config::Variant;
    use crate::resolver::HostLibc;
    use libc::c_int;
    use std::ffi::CStr;

    fn build_host() -> Result<Shim<HostLibc>, InitError> {
        Ok(Shim::new(
            Arc::new(HostLibc),
            c"/",
            CallLog::disabled(),
            Variant::Extended,
        )?)
    }

    #[test]
    fn test_reference_counted_lifecycle() {
        let rt = Runtime::new(build_host);
        assert!(rt.loaded().is_none());

        let first = rt.initialize();
        let second = rt.initialize();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(rt.ref_count(), 2);

        rt.finalize();
        assert!(rt.loaded().is_some());
        rt.finalize();
        assert!(rt.loaded().is_none());

        rt.finalize();
        assert_eq!(rt.ref_count(), 0);
    }

    #[test]
    fn test_lazy_build_does_not_take_a_reference() {
        let rt = Runtime::new(build_host);
        let shim = rt.current();
        assert_eq!(rt.ref_count(), 0);
        assert!(Arc::ptr_eq(&shim, &rt.current()));
    }

    #[test]
    fn test_nested_calls_go_direct() {
        let rt = Runtime::new(build_host);
        let path: &CStr = c"/";
        let ret: c_int = rt.enter(
            |_| {
                rt.enter(
                    |_| -> c_int { unreachable!("routed twice") },
                    |libc| unsafe { libc.access(path.as_ptr(), libc::F_OK) },
                )
            },
            |_| unreachable!("direct at top level"),
        );
        assert_eq!(ret, 0);
    }

    #[test]
    fn test_panics_become_eio() {
        let rt = Runtime::new(build_host);
        let ret: c_int =
            rt.enter(|_| std::panic::resume_unwind(Box::new("boom")), |_| unreachable!());
        assert_eq!(ret, -1);
        assert_eq!(Errno::last(), Errno::EIO);

        // The guard is released again.
        let ret: c_int = rt.enter(|_| 7, |_| unreachable!());
        assert_eq!(ret, 7);
    }

    #[test]
    fn test_nested_call_before_load_is_not_supported() {
        let rt: Runtime<HostLibc> = Runtime::new(build_host);
        let _outer = ReentryGuard::acquire();
        let ret: c_int = rt.enter(|_| unreachable!(), |_| unreachable!());
        assert_eq!(ret, -1);
        assert_eq!(Errno::last(), Errno::ENOSYS);
    }
}
