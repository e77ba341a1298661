use crate::resolver::RealLibc;
use anyhow::{Context, Result, anyhow};
use libc::c_int;
use std::ffi::CString;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::Arc;

/**
 * A `Write` sink that goes through a [`RealLibc`] instead of std's own file
 * handles, which under interposition would land back in our exports.
 */
pub struct LibcWriter<L: RealLibc> {
    libc: Arc<L>,
    fd: c_int,
    owned: bool,
}

impl<L: RealLibc> LibcWriter<L> {
    pub fn stdout(libc: Arc<L>) -> Self {
        Self {
            libc,
            fd: libc::STDOUT_FILENO,
            owned: false,
        }
    }

    pub fn stderr(libc: Arc<L>) -> Self {
        Self {
            libc,
            fd: libc::STDERR_FILENO,
            owned: false,
        }
    }

    /// Opens `path` for appending, creating it if needed.
    pub fn append(libc: Arc<L>, path: &Path) -> Result<Self> {
        let c_path = path_to_cstring(path)?;
        let fd = unsafe {
            libc.open(
                c_path.as_ptr(),
                libc::O_WRONLY | libc::O_CREAT | libc::O_APPEND | libc::O_CLOEXEC,
                Some(0o644),
            )
        };
        if fd < 0 {
            return Err(io::Error::from_raw_os_error(libc.errno())).context(
                format!("Failed to open call log {}", path.display()),
            );
        }
        Ok(Self {
            libc,
            fd,
            owned: true,
        })
    }
}

impl<L: RealLibc> Write for LibcWriter<L> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            let n = unsafe {
                self.libc.write(self.fd, buf.as_ptr().cast(), buf.len())
            };
            if n >= 0 {
                return Ok(n as usize);
            }
            let errno = self.libc.errno();
            if errno != libc::EINTR {
                return Err(io::Error::from_raw_os_error(errno));
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<L: RealLibc> Drop for LibcWriter<L> {
    fn drop(&mut self) {
        if self.owned {
            unsafe { self.libc.close(self.fd) };
        }
    }
}

pub fn path_to_cstring(path: &Path) -> Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| anyhow!("Path {} contains a NUL byte", path.display()))
}

/// Reads a whole file through `libc`.
pub fn read_to_string<L: RealLibc + ?Sized>(
    libc: &L,
    path: &Path,
) -> Result<String> {
    let c_path = path_to_cstring(path)?;
    let fd = unsafe {
        libc.open(c_path.as_ptr(), libc::O_RDONLY | libc::O_CLOEXEC, None)
    };
    if fd < 0 {
        return Err(io::Error::from_raw_os_error(libc.errno()).into());
    }

    let mut contents = Vec::new();
    let mut chunk = [0u8; 4096];
    let result = loop {
        let n =
            unsafe { libc.read(fd, chunk.as_mut_ptr().cast(), chunk.len()) };
        if n > 0 {
            contents.extend_from_slice(&chunk[..n as usize]);
        } else if n == 0 {
            break Ok(());
        } else if libc.errno() != libc::EINTR {
            break Err(io::Error::from_raw_os_error(libc.errno()));
        }
    };
    unsafe { libc.close(fd) };
    result?;

    String::from_utf8(contents)
        .map_err(|_| anyhow!("{} is not valid UTF-8", path.display()))
}
