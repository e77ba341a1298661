use anyhow::{Context, Result};
use bdsim::resolver::HostLibc;
use bdsim::{CallLog, LogFormat, Shim, Variant};
use log::warn;
use rand::Rng;
use rstest::*;
use std::ffi::CString;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const COVERAGE_TEST_DATA_DIR: &str = "generated-test-data";

/// What `root/dev/null` contains, so reads show they were redirected.
pub const SANDBOX_NULL: &[u8] = b"sandboxed null\n";

pub fn rid() -> String {
    let mut rng = rand::rng();
    let rid: String = (0..10)
        .map(|_| rng.sample(rand::distr::Alphanumeric) as char)
        .collect();
    rid
}

pub fn cstr(path: impl AsRef<Path>) -> CString {
    CString::new(path.as_ref().as_os_str().as_bytes()).unwrap()
}

/// Call log sink the test can read back.
#[derive(Clone, Default)]
pub struct SharedLog(Arc<Mutex<Vec<u8>>>);

impl SharedLog {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    pub fn last(&self) -> String {
        self.lines().pop().unwrap_or_default()
    }
}

impl Write for SharedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/**
 * A `Shim` over the host C library with its own sandbox root under
 * `generated-test-data/`. The root starts out with a regular file at
 * `dev/null` and an empty `dev/input/`.
 */
pub struct TestShim {
    pub name: String,
    pub dir: PathBuf,
    pub root: PathBuf,
    pub shim: Shim<HostLibc>,
    pub log: SharedLog,
    /* When debug mode is on, the scratch directory survives the fixture */
    pub debug_mode: bool,
}

impl TestShim {
    pub fn new(format: LogFormat, variant: Variant) -> Self {
        Self::try_new(format, variant).unwrap()
    }

    pub fn try_new(format: LogFormat, variant: Variant) -> Result<Self> {
        let name = format!("bdsim-test-{}", rid());
        let dir = std::env::current_dir()?
            .join(COVERAGE_TEST_DATA_DIR)
            .join(&name);
        let root = dir.join("root");
        std::fs::create_dir_all(root.join("dev/input")).with_context(|| {
            format!("Failed to create {} dir", COVERAGE_TEST_DATA_DIR)
        })?;
        std::fs::write(root.join("dev/null"), SANDBOX_NULL)?;

        let log = SharedLog::default();
        let shim = Shim::new(
            Arc::new(HostLibc),
            &cstr(&root),
            CallLog::new(format, Box::new(log.clone())),
            variant,
        )?;

        Ok(Self {
            name,
            dir,
            root,
            shim,
            log,
            debug_mode: false,
        })
    }

    /// An absolute path inside the scratch directory, outside the root.
    pub fn scratch(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn scratch_c(&self, name: &str) -> CString {
        cstr(self.scratch(name))
    }

    /// A path under the root as it looks from the host.
    pub fn in_root(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// A mount point nobody else uses, not present on the host.
    pub fn mount_point(&self, label: &str) -> CString {
        cstr(format!("/bdsim-{}-{}", self.name, label))
    }

    #[allow(dead_code)]
    pub fn set_debug_mode(&mut self, debug_mode: bool) {
        self.debug_mode = debug_mode;
    }
}

impl Drop for TestShim {
    fn drop(&mut self) {
        if self.debug_mode {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            warn!("Failed to remove {}: {}", self.dir.display(), e);
        }
    }
}

#[fixture]
pub fn shim() -> TestShim {
    TestShim::new(LogFormat::Text, Variant::Extended)
}

#[fixture]
pub fn json_shim() -> TestShim {
    TestShim::new(LogFormat::Json, Variant::Extended)
}

#[fixture]
pub fn minimal_shim() -> TestShim {
    TestShim::new(LogFormat::Text, Variant::Minimal)
}
