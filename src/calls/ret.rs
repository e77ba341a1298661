use super::{render_fd, render_ptr};
use crate::fd::is_virtual;
use libc::{c_int, c_void};

/// How a call's return value is rendered and when it counts as failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetKind {
    None,
    Int,
    /// Negative means failure unless the value carries the virtual marker.
    Fd,
    Size,
    Offset,
    Ptr,
}

impl RetKind {
    pub fn is_failure(self, ret: i64) -> bool {
        match self {
            RetKind::None => false,
            RetKind::Int | RetKind::Size | RetKind::Offset => ret < 0,
            RetKind::Fd => ret < 0 && !is_virtual(ret as c_int),
            RetKind::Ptr => ret == 0,
        }
    }

    pub fn render(self, ret: i64) -> Option<String> {
        match self {
            RetKind::None => None,
            RetKind::Int | RetKind::Size | RetKind::Offset => Some(ret.to_string()),
            RetKind::Fd => Some(render_fd(ret as c_int)),
            RetKind::Ptr => Some(render_ptr(ret as usize as *const c_void)),
        }
    }
}

/// A C return type with a conventional failure value.
pub trait CallRet: Copy {
    fn failure() -> Self;
    fn to_raw(self) -> i64;
}

impl CallRet for c_int {
    fn failure() -> Self {
        -1
    }

    fn to_raw(self) -> i64 {
        self.into()
    }
}

impl CallRet for isize {
    fn failure() -> Self {
        -1
    }

    fn to_raw(self) -> i64 {
        self as i64
    }
}

impl CallRet for i64 {
    fn failure() -> Self {
        -1
    }

    fn to_raw(self) -> i64 {
        self
    }
}

impl<T> CallRet for *mut T {
    fn failure() -> Self {
        std::ptr::null_mut()
    }

    fn to_raw(self) -> i64 {
        self as usize as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fd::mangle;

    #[test]
    fn test_failure_by_category() {
        assert!(RetKind::Int.is_failure(-1));
        assert!(!RetKind::Int.is_failure(0));
        assert!(RetKind::Size.is_failure(-1));
        assert!(!RetKind::Offset.is_failure(4096));
        assert!(RetKind::Ptr.is_failure(0));
        assert!(!RetKind::Ptr.is_failure(0x1000));
        assert!(!RetKind::None.is_failure(-1));
    }

    #[test]
    fn test_virtual_descriptor_is_not_an_error() {
        let fd = mangle(5);
        assert!(fd < 0);
        assert!(!RetKind::Fd.is_failure(fd.to_raw()));
        assert!(RetKind::Fd.is_failure(-1));
        assert_eq!(RetKind::Fd.render(fd.to_raw()).unwrap(), "0xbb000005");
    }

    #[test]
    fn test_render() {
        assert_eq!(RetKind::None.render(0), None);
        assert_eq!(RetKind::Size.render(-1).unwrap(), "-1");
        assert_eq!(RetKind::Ptr.render(0).unwrap(), "(nil)");
    }
}
