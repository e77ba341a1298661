use crate::resolver::FcntlArg;
use libc::{c_int, c_void};

/// Commands the `libc` crate does not export for this target.
const F_SETSIG: c_int = 10;
const F_GETSIG: c_int = 11;
const F_SETOWN_EX: c_int = 15;
const F_GETOWN_EX: c_int = 16;
const F_CANCELLK: c_int = 1029;
const F_GET_RW_HINT: c_int = 1035;
const F_SET_RW_HINT: c_int = 1036;
const F_GET_FILE_RW_HINT: c_int = 1037;
const F_SET_FILE_RW_HINT: c_int = 1038;

/// The trailing argument a command takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    None,
    Int,
    Ptr,
}

macro_rules! fcntl_commands {
    ($($variant:ident = $raw:expr, $name:literal, $shape:ident;)*) => {
        /// Every `fcntl` command Linux defines.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum FcntlCmd {
            $($variant,)*
        }

        impl FcntlCmd {
            pub const ALL: &'static [FcntlCmd] = &[$(FcntlCmd::$variant,)*];

            pub fn from_raw(cmd: c_int) -> Option<Self> {
                $(if cmd == $raw {
                    return Some(FcntlCmd::$variant);
                })*
                None
            }

            pub fn raw(self) -> c_int {
                match self {
                    $(FcntlCmd::$variant => $raw,)*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(FcntlCmd::$variant => $name,)*
                }
            }

            pub fn arg_shape(self) -> ArgShape {
                match self {
                    $(FcntlCmd::$variant => ArgShape::$shape,)*
                }
            }
        }
    };
}

fcntl_commands! {
    DupFd = libc::F_DUPFD, "F_DUPFD", Int;
    DupFdCloexec = libc::F_DUPFD_CLOEXEC, "F_DUPFD_CLOEXEC", Int;
    GetFd = libc::F_GETFD, "F_GETFD", None;
    SetFd = libc::F_SETFD, "F_SETFD", Int;
    GetFl = libc::F_GETFL, "F_GETFL", None;
    SetFl = libc::F_SETFL, "F_SETFL", Int;
    GetLk = libc::F_GETLK, "F_GETLK", Ptr;
    SetLk = libc::F_SETLK, "F_SETLK", Ptr;
    SetLkw = libc::F_SETLKW, "F_SETLKW", Ptr;
    OfdGetLk = libc::F_OFD_GETLK, "F_OFD_GETLK", Ptr;
    OfdSetLk = libc::F_OFD_SETLK, "F_OFD_SETLK", Ptr;
    OfdSetLkw = libc::F_OFD_SETLKW, "F_OFD_SETLKW", Ptr;
    GetOwn = libc::F_GETOWN, "F_GETOWN", None;
    SetOwn = libc::F_SETOWN, "F_SETOWN", Int;
    GetOwnEx = F_GETOWN_EX, "F_GETOWN_EX", Ptr;
    SetOwnEx = F_SETOWN_EX, "F_SETOWN_EX", Ptr;
    GetSig = F_GETSIG, "F_GETSIG", None;
    SetSig = F_SETSIG, "F_SETSIG", Int;
    GetLease = libc::F_GETLEASE, "F_GETLEASE", None;
    SetLease = libc::F_SETLEASE, "F_SETLEASE", Int;
    Notify = libc::F_NOTIFY, "F_NOTIFY", Int;
    CancelLk = F_CANCELLK, "F_CANCELLK", Int;
    GetPipeSz = libc::F_GETPIPE_SZ, "F_GETPIPE_SZ", None;
    SetPipeSz = libc::F_SETPIPE_SZ, "F_SETPIPE_SZ", Int;
    AddSeals = libc::F_ADD_SEALS, "F_ADD_SEALS", Int;
    GetSeals = libc::F_GET_SEALS, "F_GET_SEALS", None;
    GetRwHint = F_GET_RW_HINT, "F_GET_RW_HINT", Ptr;
    SetRwHint = F_SET_RW_HINT, "F_SET_RW_HINT", Ptr;
    GetFileRwHint = F_GET_FILE_RW_HINT, "F_GET_FILE_RW_HINT", Ptr;
    SetFileRwHint = F_SET_FILE_RW_HINT, "F_SET_FILE_RW_HINT", Ptr;
}

impl FcntlCmd {
    /// Commands that are passed on to the real library.
    pub fn is_forwarded(self) -> bool {
        matches!(
            self,
            FcntlCmd::DupFd | FcntlCmd::GetFd | FcntlCmd::SetFd | FcntlCmd::GetFl
        )
    }

    /// Reads the trailing argument out of the raw register value.
    pub fn decode_arg(self, raw: usize) -> FcntlArg {
        match self.arg_shape() {
            ArgShape::None => FcntlArg::None,
            ArgShape::Int => FcntlArg::Int(raw as c_int),
            ArgShape::Ptr => FcntlArg::Ptr(raw as *mut c_void),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_commands_round_trip_through_raw() {
        let mut raws = HashSet::new();
        for cmd in FcntlCmd::ALL {
            assert!(raws.insert(cmd.raw()), "{} reuses a value", cmd.name());
            assert_eq!(FcntlCmd::from_raw(cmd.raw()), Some(*cmd));
            assert!(cmd.name().starts_with("F_"));
        }
    }

    #[test]
    fn test_unknown_commands_are_not_guessed() {
        assert_eq!(FcntlCmd::from_raw(0x7777), None);
        assert_eq!(FcntlCmd::from_raw(-1), None);
    }

    #[test]
    fn test_allow_list() {
        let forwarded: Vec<&str> = FcntlCmd::ALL
            .iter()
            .filter(|c| c.is_forwarded())
            .map(|c| c.name())
            .collect();
        assert_eq!(forwarded, vec!["F_DUPFD", "F_GETFD", "F_SETFD", "F_GETFL"]);
    }

    #[test]
    fn test_trailing_argument_shapes() {
        assert_eq!(FcntlCmd::GetFd.decode_arg(99), FcntlArg::None);
        assert_eq!(FcntlCmd::DupFd.decode_arg(10), FcntlArg::Int(10));
        assert_eq!(FcntlCmd::SetLk.arg_shape(), ArgShape::Ptr);
        assert_eq!(FcntlCmd::GetFl.arg_shape(), ArgShape::None);
    }
}
