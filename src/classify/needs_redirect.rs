use crate::resolver::RealLibc;
use libc::c_char;
use std::ffi::{CStr, CString};

/// Canonical prefixes that always belong to the sandbox root.
const REDIRECTED_PREFIXES: &[&[u8]] = &[b"/dev/", b"/sys/", b"/proc/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymlinkMode {
    Follow,
    /// Only the parent directory is resolved; a final symlink stays as is.
    NoFollow,
}

/// Whether `path` has to be reissued relative to the sandbox root.
pub fn needs_redirect<L: RealLibc + ?Sized>(libc: &L, path: &CStr) -> bool {
    redirect_target(libc, path, SymlinkMode::Follow).is_some()
}

/**
 * The root-relative path a redirected call is reissued with, or `None` when
 * `path` is passed through untouched.
 *
 * Anything that cannot be canonicalized is "not ours".
 */
pub fn redirect_target<L: RealLibc + ?Sized>(
    libc: &L,
    path: &CStr,
    mode: SymlinkMode,
) -> Option<CString> {
    let canonical = match mode {
        SymlinkMode::Follow => canonicalize(libc, path)?,
        SymlinkMode::NoFollow => canonicalize_parent(libc, path)?,
    };
    if !is_redirected(libc, &canonical) {
        return None;
    }
    root_relative(&canonical)
}

pub fn canonicalize<L: RealLibc + ?Sized>(
    libc: &L,
    path: &CStr,
) -> Option<CString> {
    let mut buf = vec![0 as c_char; libc::PATH_MAX as usize];
    let ret = unsafe { libc.realpath(path.as_ptr(), buf.as_mut_ptr()) };
    if ret.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(buf.as_ptr()) }.to_owned())
}

fn canonicalize_parent<L: RealLibc + ?Sized>(
    libc: &L,
    path: &CStr,
) -> Option<CString> {
    let bytes = path.to_bytes();
    let trimmed = match bytes.iter().rposition(|b| *b != b'/') {
        Some(end) => &bytes[..=end],
        None => return canonicalize(libc, path),
    };
    let (parent, name): (&[u8], &[u8]) =
        match trimmed.iter().rposition(|b| *b == b'/') {
            Some(0) => (b"/", &trimmed[1..]),
            Some(slash) => (&trimmed[..slash], &trimmed[slash + 1..]),
            None => (b".", trimmed),
        };
    if name == b"." || name == b".." {
        return canonicalize(libc, path);
    }

    let parent = canonicalize(libc, &CString::new(parent).ok()?)?;
    let mut joined = parent.into_bytes();
    if joined.last() != Some(&b'/') {
        joined.push(b'/');
    }
    joined.extend_from_slice(name);
    CString::new(joined).ok()
}

fn is_redirected<L: RealLibc + ?Sized>(libc: &L, canonical: &CStr) -> bool {
    let bytes = canonical.to_bytes();
    REDIRECTED_PREFIXES.iter().any(|p| bytes.starts_with(p))
        || is_block_device(libc, canonical)
}

fn is_block_device<L: RealLibc + ?Sized>(libc: &L, canonical: &CStr) -> bool {
    let mut sb: libc::stat = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc.stat(canonical.as_ptr(), &mut sb) };
    rc == 0 && (sb.st_mode & libc::S_IFMT) == libc::S_IFBLK
}

fn root_relative(canonical: &CStr) -> Option<CString> {
    let relative = canonical.to_bytes();
    let relative = match relative.iter().position(|b| *b != b'/') {
        Some(start) => &relative[start..],
        None => b".",
    };
    CString::new(relative).ok()
}

#[cfg(all(test, not(feature = "interpose")))]
mod tests {
    use super::*;
    use crate::resolver::HostLibc;
    use std::os::unix::ffi::OsStrExt;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from("generated-test-data").join(format!(
            "classify-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir.canonicalize().unwrap()
    }

    fn c(path: &PathBuf) -> CString {
        CString::new(path.as_os_str().as_bytes()).unwrap()
    }

    #[test]
    fn test_pseudo_filesystems_redirect() {
        assert_eq!(
            redirect_target(&HostLibc, c"/dev/null", SymlinkMode::Follow),
            Some(CString::new("dev/null").unwrap())
        );
        assert!(needs_redirect(&HostLibc, c"/proc/self/status"));
        let target =
            redirect_target(&HostLibc, c"/proc/self/status", SymlinkMode::Follow)
                .unwrap();
        assert!(target.to_bytes().starts_with(b"proc/"));
    }

    #[test]
    fn test_ordinary_paths_pass_through() {
        let dir = scratch_dir("ordinary");
        assert!(!needs_redirect(&HostLibc, &c(&dir)));
        std::fs::remove_dir_all(&dir).unwrap();
        assert!(!needs_redirect(&HostLibc, c"/"));
        assert!(!needs_redirect(&HostLibc, c"/dev"));
    }

    #[test]
    fn test_unresolvable_paths_pass_through() {
        assert!(!needs_redirect(&HostLibc, c"/does/not/exist/at/all"));
        assert!(!needs_redirect(&HostLibc, c"/dev/does-not-exist-bdsim"));
    }

    #[test]
    fn test_symlink_into_dev_follows_only_when_asked() {
        let dir = scratch_dir("symlink");
        let link = dir.join("null-link");
        let _ = std::fs::remove_file(&link);
        std::os::unix::fs::symlink("/dev/null", &link).unwrap();

        assert_eq!(
            redirect_target(&HostLibc, &c(&link), SymlinkMode::Follow),
            Some(CString::new("dev/null").unwrap())
        );
        assert_eq!(
            redirect_target(&HostLibc, &c(&link), SymlinkMode::NoFollow),
            None
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_no_follow_keeps_missing_leaf() {
        assert_eq!(
            redirect_target(&HostLibc, c"/dev/bdsim-new-node", SymlinkMode::NoFollow),
            Some(CString::new("dev/bdsim-new-node").unwrap())
        );
        assert_eq!(
            redirect_target(&HostLibc, c"/dev/null/", SymlinkMode::NoFollow),
            Some(CString::new("dev/null").unwrap())
        );
    }
}
