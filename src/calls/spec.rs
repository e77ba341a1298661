//! Per-call descriptors: argument notation, return category and variant.

use super::{ArgKind, ArgShape, FcntlCmd, OpenMode, RawArg, RetKind};
use libc::c_int;

use super::ArgKind::{Dec, Fd, Hex, Ioctl, Oct, Ptr, Size, Str};

pub type LayoutSelector = fn(&[RawArg]) -> &'static [ArgKind];

pub enum ArgLayout {
    Fixed(&'static [ArgKind]),
    /// Picks the layout from the raw arguments, for calls whose arity
    /// depends on a flag or command.
    Select(LayoutSelector),
}

pub struct CallSpec {
    pub name: &'static str,
    pub args: ArgLayout,
    pub ret: RetKind,
    /// Reported as not supported under the minimal variant.
    pub extended_only: bool,
}

impl CallSpec {
    pub fn layout(&self, args: &[RawArg]) -> &'static [ArgKind] {
        match self.args {
            ArgLayout::Fixed(kinds) => kinds,
            ArgLayout::Select(select) => select(args),
        }
    }
}

fn int_at(args: &[RawArg], index: usize) -> c_int {
    args.get(index).map_or(0, RawArg::as_int) as c_int
}

fn open_layout(args: &[RawArg]) -> &'static [ArgKind] {
    if OpenMode::decode(int_at(args, 1)).takes_mode() {
        &[Str, Hex, Oct]
    } else {
        &[Str, Hex]
    }
}

fn openat_layout(args: &[RawArg]) -> &'static [ArgKind] {
    if OpenMode::decode(int_at(args, 2)).takes_mode() {
        &[Fd, Str, Hex, Oct]
    } else {
        &[Fd, Str, Hex]
    }
}

fn fcntl_layout(args: &[RawArg]) -> &'static [ArgKind] {
    match FcntlCmd::from_raw(int_at(args, 1)).map(FcntlCmd::arg_shape) {
        Some(ArgShape::Int) => &[Fd, ArgKind::FcntlCmd, Dec],
        Some(ArgShape::Ptr) => &[Fd, ArgKind::FcntlCmd, Ptr],
        Some(ArgShape::None) | None => &[Fd, ArgKind::FcntlCmd],
    }
}

macro_rules! calls {
    ($($ident:ident = $name:literal ($($layout:tt)*) -> $ret:ident $(, $extended:ident)?;)*) => {
        $(
            pub static $ident: CallSpec = CallSpec {
                name: $name,
                args: calls!(@layout $($layout)*),
                ret: RetKind::$ret,
                extended_only: calls!(@extended $($extended)?),
            };
        )*

        /// Every call the shim records.
        pub static CALLS: &[&CallSpec] = &[$(&$ident,)*];
    };
    (@layout select $select:ident) => { ArgLayout::Select($select) };
    (@layout $($kind:ident),*) => { ArgLayout::Fixed(&[$($kind),*]) };
    (@extended extended) => { true };
    (@extended) => { false };
}

calls! {
    OPEN = "open" (select open_layout) -> Fd;
    OPENAT = "openat" (select openat_layout) -> Fd;
    CREAT = "creat" (Str, Oct) -> Fd;
    CLOSE = "close" (Fd) -> Int;

    READ = "read" (Fd, Ptr, Size) -> Size;
    WRITE = "write" (Fd, Ptr, Size) -> Size;
    PREAD = "pread" (Fd, Ptr, Size, Dec) -> Size;
    PWRITE = "pwrite" (Fd, Ptr, Size, Dec) -> Size;
    READV = "readv" (Fd, Ptr, Dec) -> Size;
    WRITEV = "writev" (Fd, Ptr, Dec) -> Size;
    PREADV = "preadv" (Fd, Ptr, Dec, Dec) -> Size;
    PWRITEV = "pwritev" (Fd, Ptr, Dec, Dec) -> Size;
    PREADV2 = "preadv2" (Fd, Ptr, Dec, Dec, Hex) -> Size;
    PWRITEV2 = "pwritev2" (Fd, Ptr, Dec, Dec, Hex) -> Size;
    LSEEK = "lseek" (Fd, Dec, Dec) -> Offset;

    STAT = "stat" (Str, Ptr) -> Int;
    FSTAT = "fstat" (Fd, Ptr) -> Int;
    LSTAT = "lstat" (Str, Ptr) -> Int;

    ACCESS = "access" (Str, Oct) -> Int;
    FACCESSAT = "faccessat" (Fd, Str, Oct, Hex) -> Int, extended;

    LINK = "link" (Str, Str) -> Int;
    SYMLINK = "symlink" (Str, Str) -> Int;
    READLINK = "readlink" (Str, Ptr, Size) -> Size, extended;
    READLINKAT = "readlinkat" (Fd, Str, Ptr, Size) -> Size, extended;
    RENAME = "rename" (Str, Str) -> Int;
    UNLINK = "unlink" (Str) -> Int;

    CHMOD = "chmod" (Str, Oct) -> Int;
    FCHMOD = "fchmod" (Fd, Oct) -> Int;
    CHOWN = "chown" (Str, Dec, Dec) -> Int;
    FCHOWN = "fchown" (Fd, Dec, Dec) -> Int;
    LCHOWN = "lchown" (Str, Dec, Dec) -> Int;

    UTIME = "utime" (Str, Ptr) -> Int;
    UTIMES = "utimes" (Str, Ptr) -> Int;
    FUTIMES = "futimes" (Fd, Ptr) -> Int;
    LUTIMES = "lutimes" (Str, Ptr) -> Int;
    FUTIMENS = "futimens" (Fd, Ptr) -> Int;

    OPENDIR = "opendir" (Str) -> Ptr;
    FDOPENDIR = "fdopendir" (Fd) -> Ptr, extended;
    READDIR = "readdir" (Ptr) -> Ptr;
    CLOSEDIR = "closedir" (Ptr) -> Int;
    DIRFD = "dirfd" (Ptr) -> Fd;

    FCNTL = "fcntl" (select fcntl_layout) -> Fd;
    IOCTL = "ioctl" (Fd, Ioctl, Ptr) -> Int;
    GETXATTR = "getxattr" (Str, Str, Ptr, Size) -> Size, extended;
}

pub fn lookup(name: &str) -> Option<&'static CallSpec> {
    CALLS.iter().copied().find(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(lookup("fcntl").unwrap().ret, RetKind::Fd);
        assert_eq!(lookup("lseek").unwrap().ret, RetKind::Offset);
        assert!(lookup("fopen").is_none());
    }

    #[test]
    fn test_open_layout_follows_create_flag() {
        let with_mode = [
            RawArg::Str(Some(c"/f")),
            RawArg::from(libc::O_CREAT | libc::O_WRONLY),
            RawArg::from(0o644u32),
        ];
        assert_eq!(OPEN.layout(&with_mode), &[Str, Hex, Oct]);

        let without_mode = [
            RawArg::Str(Some(c"/f")),
            RawArg::from(libc::O_WRONLY),
            RawArg::from(0u32),
        ];
        assert_eq!(OPEN.layout(&without_mode), &[Str, Hex]);
    }

    #[test]
    fn test_fcntl_layout_follows_command() {
        let getfd = [RawArg::from(3), RawArg::from(libc::F_GETFD), RawArg::Int(0)];
        assert_eq!(FCNTL.layout(&getfd).len(), 2);
        let dupfd = [RawArg::from(3), RawArg::from(libc::F_DUPFD), RawArg::Int(10)];
        assert_eq!(FCNTL.layout(&dupfd), &[Fd, ArgKind::FcntlCmd, Dec]);
        let unknown = [RawArg::from(3), RawArg::Int(0x7777), RawArg::Int(0)];
        assert_eq!(FCNTL.layout(&unknown).len(), 2);
    }

    #[test]
    fn test_extended_only_calls() {
        let extended: Vec<&str> = CALLS
            .iter()
            .filter(|c| c.extended_only)
            .map(|c| c.name)
            .collect();
        assert_eq!(
            extended,
            vec!["faccessat", "readlink", "readlinkat", "fdopendir", "getxattr"]
        );
    }
}
