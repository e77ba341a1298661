use super::FcntlCmd;
use crate::fd::is_virtual;
use libc::{c_char, c_int, c_void};
use std::ffi::CStr;

/// An argument exactly as the caller passed it.
#[derive(Debug, Clone, Copy)]
pub enum RawArg<'a> {
    Int(i64),
    Str(Option<&'a CStr>),
    Ptr(*const c_void),
}

impl<'a> RawArg<'a> {
    /// # Safety
    /// `ptr` must be null or point at a NUL-terminated string that outlives
    /// the returned value.
    pub unsafe fn c_str(ptr: *const c_char) -> Self {
        if ptr.is_null() {
            RawArg::Str(None)
        } else {
            RawArg::Str(Some(unsafe { CStr::from_ptr(ptr) }))
        }
    }

    pub fn ptr<T>(ptr: *const T) -> Self {
        RawArg::Ptr(ptr.cast())
    }

    pub fn as_int(&self) -> i64 {
        match self {
            RawArg::Int(v) => *v,
            RawArg::Ptr(p) => *p as usize as i64,
            RawArg::Str(_) => 0,
        }
    }
}

impl From<c_int> for RawArg<'_> {
    fn from(v: c_int) -> Self {
        RawArg::Int(v.into())
    }
}

impl From<i64> for RawArg<'_> {
    fn from(v: i64) -> Self {
        RawArg::Int(v)
    }
}

impl From<u32> for RawArg<'_> {
    fn from(v: u32) -> Self {
        RawArg::Int(v.into())
    }
}

impl From<usize> for RawArg<'_> {
    fn from(v: usize) -> Self {
        RawArg::Int(v as i64)
    }
}

/// How an argument is written in a call record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Dec,
    Oct,
    Hex,
    Str,
    Ptr,
    Fd,
    FcntlCmd,
    Ioctl,
    Size,
}

impl ArgKind {
    pub fn render(self, arg: &RawArg) -> String {
        match (self, arg) {
            (ArgKind::Str, RawArg::Str(Some(s))) => {
                format!("\"{}\"", s.to_string_lossy().escape_debug())
            }
            (ArgKind::Str, RawArg::Str(None)) => "NULL".to_string(),
            (_, arg) => self.render_int(arg.as_int()),
        }
    }

    fn render_int(self, v: i64) -> String {
        match self {
            ArgKind::Dec | ArgKind::Str => v.to_string(),
            ArgKind::Oct => format!("0o{:o}", v as u32),
            ArgKind::Hex => format!("0x{:x}", v as u32),
            ArgKind::Ioctl => format!("0x{:x}", v as u64),
            ArgKind::Size => (v as u64).to_string(),
            ArgKind::Ptr => render_ptr(v as usize as *const c_void),
            ArgKind::Fd => render_fd(v as c_int),
            ArgKind::FcntlCmd => match FcntlCmd::from_raw(v as c_int) {
                Some(cmd) => cmd.name().to_string(),
                None => format!("0x{:x}", v as u32),
            },
        }
    }
}

/// Virtual descriptors are shown in hex so the marker byte stays readable.
pub fn render_fd(fd: c_int) -> String {
    if fd == libc::AT_FDCWD {
        "AT_FDCWD".to_string()
    } else if is_virtual(fd) {
        format!("0x{:x}", fd as u32)
    } else {
        fd.to_string()
    }
}

pub fn render_ptr(ptr: *const c_void) -> String {
    if ptr.is_null() {
        "(nil)".to_string()
    } else {
        format!("{:p}", ptr)
    }
}
