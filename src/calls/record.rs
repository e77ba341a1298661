use super::{CallSpec, RawArg};
use libc::c_int;
use nix::errno::Errno;
use serde::Serialize;
use std::fmt;

/// One intercepted call as it is written to the call log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    pub call: &'static str,
    pub args: Vec<String>,
    pub result: Option<String>,
    pub errno: Option<c_int>,
    pub error: Option<String>,
}

impl CallRecord {
    /// `errno` is only kept when `ret` signals failure for the call's
    /// return category.
    pub fn new(spec: &CallSpec, args: &[RawArg], ret: i64, errno: c_int) -> Self {
        let args = spec
            .layout(args)
            .iter()
            .zip(args)
            .map(|(kind, arg)| kind.render(arg))
            .collect();
        let errno = spec.ret.is_failure(ret).then_some(errno);
        Self {
            call: spec.name,
            args,
            result: spec.ret.render(ret),
            errno,
            error: errno.map(|e| Errno::from_raw(e).desc().to_string()),
        }
    }

    pub fn failed(&self) -> bool {
        self.errno.is_some()
    }
}

impl fmt::Display for CallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.call, self.args.join(", "))?;
        if let Some(result) = &self.result {
            write!(f, " = {}", result)?;
        }
        if let Some(error) = &self.error {
            write!(f, " ({})", error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::spec;
    use crate::fd::mangle;

    #[test]
    fn test_open_with_mode_renders_three_args() {
        let args = [
            RawArg::Str(Some(c"/tmp/x")),
            RawArg::from(libc::O_CREAT | libc::O_WRONLY),
            RawArg::from(0o644u32),
        ];
        let record = CallRecord::new(&spec::OPEN, &args, 3, 0);
        assert_eq!(record.to_string(), "open(\"/tmp/x\", 0x41, 0o644) = 3");
        assert!(!record.failed());
    }

    #[test]
    fn test_open_without_create_drops_mode() {
        let args = [
            RawArg::Str(Some(c"/nope")),
            RawArg::from(libc::O_RDONLY),
            RawArg::from(0u32),
        ];
        let record = CallRecord::new(&spec::OPEN, &args, -1, libc::ENOENT);
        assert_eq!(
            record.to_string(),
            "open(\"/nope\", 0x0) = -1 (No such file or directory)"
        );
        assert_eq!(record.errno, Some(libc::ENOENT));
    }

    #[test]
    fn test_virtual_result_is_success() {
        let args = [RawArg::Str(Some(c"/dev/sda")), RawArg::from(0), RawArg::from(0u32)];
        let record = CallRecord::new(&spec::OPEN, &args, mangle(4).into(), libc::EINTR);
        assert_eq!(record.result.as_deref(), Some("0xbb000004"));
        assert_eq!(record.error, None);
    }

    #[test]
    fn test_json_shape() {
        let args = [RawArg::from(3), RawArg::from(libc::F_SETLK), RawArg::Int(0)];
        let record = CallRecord::new(&spec::FCNTL, &args, -1, libc::ENOSYS);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["call"], "fcntl");
        assert_eq!(value["args"][1], "F_SETLK");
        assert_eq!(value["result"], "-1");
        assert_eq!(value["errno"], libc::ENOSYS);
        assert_eq!(value["error"], "Function not implemented");
        assert_eq!(value.as_object().unwrap().len(), 5);
    }
}
