use libc::{c_int, mode_t};

/// Whether an `open`/`openat` call carries a trailing `mode_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Absent,
    Present,
}

impl OpenMode {
    /// A mode follows exactly when the file may be created.
    pub fn decode(flags: c_int) -> Self {
        if flags & libc::O_CREAT != 0
            || flags & libc::O_TMPFILE == libc::O_TMPFILE
        {
            OpenMode::Present
        } else {
            OpenMode::Absent
        }
    }

    pub fn takes_mode(self) -> bool {
        self == OpenMode::Present
    }

    pub fn apply(self, mode: mode_t) -> Option<mode_t> {
        self.takes_mode().then_some(mode)
    }
}
