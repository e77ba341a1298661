#![cfg(not(feature = "interpose"))]

mod fixtures;
use anyhow::Result;
use bdsim::{MountError, is_virtual};
use fixtures::*;
use nix::errno::Errno;
use rstest::*;
use std::ffi::CString;
use std::sync::Arc;

fn under(mountpoint: &CString, rest: &str) -> CString {
    let mut bytes = mountpoint.as_bytes().to_vec();
    bytes.extend_from_slice(rest.as_bytes());
    CString::new(bytes).unwrap()
}

fn open_rw(t: &TestShim, path: &CString) -> i32 {
    unsafe {
        t.shim
            .open(path.as_ptr(), libc::O_CREAT | libc::O_RDWR, 0o644)
    }
}

#[rstest]
fn test_descriptor_lifecycle(shim: TestShim) -> Result<()> {
    let mp = shim.mount_point("io");
    let fs = Arc::new(MemFs::new());
    shim.shim.mount(&mp, fs.clone())?;
    let path = under(&mp, "/file");

    let fd = open_rw(&shim, &path);
    assert!(is_virtual(fd));
    assert_eq!(shim.shim.mount_fd_count(), 1);

    assert_eq!(unsafe { shim.shim.write(fd, b"hello".as_ptr().cast(), 5) }, 5);
    assert_eq!(unsafe { shim.shim.lseek(fd, 1, libc::SEEK_SET) }, 1);
    let mut buf = [0u8; 8];
    assert_eq!(unsafe { shim.shim.read(fd, buf.as_mut_ptr().cast(), buf.len()) }, 4);
    assert_eq!(&buf[..4], b"ello");

    let mut sb: libc::stat = unsafe { std::mem::zeroed() };
    assert_eq!(unsafe { shim.shim.fstat(fd, &mut sb) }, 0);
    assert_eq!(sb.st_size, 5);

    assert_eq!(unsafe { shim.shim.close(fd) }, 0);
    assert_eq!(shim.shim.mount_fd_count(), 0);
    assert_eq!(fs.open_count(), 0);
    assert_eq!(fs.content(&path).as_deref(), Some(&b"hello"[..]));
    Ok(())
}

#[rstest]
fn test_backend_sees_full_path(shim: TestShim) -> Result<()> {
    let mp = shim.mount_point("paths");
    let fs = Arc::new(MemFs::new());
    shim.shim.mount(&mp, fs.clone())?;
    let path = under(&mp, "/nested/name");

    let fd = open_rw(&shim, &path);
    unsafe { shim.shim.close(fd) };
    let mut sb: libc::stat = unsafe { std::mem::zeroed() };
    assert_eq!(unsafe { shim.shim.stat(path.as_ptr(), &mut sb) }, 0);

    let full = path.to_string_lossy();
    assert_eq!(
        fs.seen(),
        vec![format!("open {}", full), format!("stat {}", full)]
    );
    Ok(())
}

#[rstest]
fn test_prefix_is_not_segment_aligned(shim: TestShim) -> Result<()> {
    let mp = shim.mount_point("pre");
    let fs = Arc::new(MemFs::new());
    shim.shim.mount(&mp, fs.clone())?;

    let neighbour = under(&mp, "fix");
    let fd = open_rw(&shim, &neighbour);
    assert!(is_virtual(fd));
    unsafe { shim.shim.close(fd) };
    assert!(fs.content(&neighbour).is_some());
    Ok(())
}

#[rstest]
fn test_later_mount_shadows_earlier(shim: TestShim) -> Result<()> {
    let outer_mp = shim.mount_point("outer");
    let inner_mp = under(&outer_mp, "/inner");
    let outer = Arc::new(MemFs::new());
    let inner = Arc::new(MemFs::new());
    shim.shim.mount(&outer_mp, outer.clone())?;
    shim.shim.mount(&inner_mp, inner.clone())?;

    let shadowed = under(&inner_mp, "/x");
    let fd = open_rw(&shim, &shadowed);
    unsafe { shim.shim.close(fd) };
    assert!(inner.content(&shadowed).is_some());
    assert!(outer.content(&shadowed).is_none());

    let sibling = under(&outer_mp, "/other");
    let fd = open_rw(&shim, &sibling);
    unsafe { shim.shim.close(fd) };
    assert!(outer.content(&sibling).is_some());

    shim.shim.unmount(&inner_mp)?;
    let uncovered = under(&inner_mp, "/y");
    let fd = open_rw(&shim, &uncovered);
    unsafe { shim.shim.close(fd) };
    assert!(outer.content(&uncovered).is_some());
    Ok(())
}

#[rstest]
fn test_unmount_releases_descriptors(shim: TestShim) -> Result<()> {
    let mp = shim.mount_point("gone");
    let fs = Arc::new(MemFs::new());
    shim.shim.mount(&mp, fs.clone())?;

    let a = open_rw(&shim, &under(&mp, "/a"));
    let b = open_rw(&shim, &under(&mp, "/b"));
    assert!(is_virtual(a) && is_virtual(b));
    assert_eq!(fs.open_count(), 2);

    shim.shim.unmount(&mp)?;
    assert_eq!(shim.shim.mount_count(), 0);
    assert_eq!(shim.shim.mount_fd_count(), 0);
    assert_eq!(fs.open_count(), 0);

    let fd = open_rw(&shim, &under(&mp, "/a"));
    assert_eq!(fd, -1);
    Ok(())
}

#[rstest]
fn test_unknown_unmount(shim: TestShim) -> Result<()> {
    let err = shim.shim.unmount(&shim.mount_point("never")).unwrap_err();
    assert!(matches!(err, MountError::NotFound(_)));
    assert_eq!(err.errno(), Errno::ENOENT);

    let err = shim.shim.mount(c"", Arc::new(MemFs::new())).unwrap_err();
    assert!(matches!(err, MountError::Empty));
    Ok(())
}

#[rstest]
fn test_check_bytes_run_out(shim: TestShim) -> Result<()> {
    for i in 0..255 {
        shim.shim
            .mount(&shim.mount_point(&format!("m{}", i)), Arc::new(MemFs::new()))?;
    }
    let err = shim
        .shim
        .mount(&shim.mount_point("one-too-many"), Arc::new(MemFs::new()))
        .unwrap_err();
    assert!(matches!(err, MountError::Exhausted));
    assert_eq!(err.errno(), Errno::ENOMEM);
    assert_eq!(shim.shim.mount_count(), 255);
    Ok(())
}

#[rstest]
fn test_vectored_transfers(shim: TestShim) -> Result<()> {
    let mp = shim.mount_point("vec");
    let fs = Arc::new(MemFs::new());
    shim.shim.mount(&mp, fs.clone())?;
    let path = under(&mp, "/v");
    let fd = open_rw(&shim, &path);

    let (one, two) = (b"abc".to_vec(), b"defg".to_vec());
    let out = [
        libc::iovec { iov_base: one.as_ptr() as *mut _, iov_len: one.len() },
        libc::iovec { iov_base: two.as_ptr() as *mut _, iov_len: two.len() },
    ];
    assert_eq!(unsafe { shim.shim.writev(fd, out.as_ptr(), 2) }, 7);
    assert_eq!(fs.content(&path).as_deref(), Some(&b"abcdefg"[..]));

    let (mut x, mut y) = ([0u8; 2], [0u8; 8]);
    let into = [
        libc::iovec { iov_base: x.as_mut_ptr().cast(), iov_len: x.len() },
        libc::iovec { iov_base: y.as_mut_ptr().cast(), iov_len: y.len() },
    ];
    assert_eq!(unsafe { shim.shim.preadv(fd, into.as_ptr(), 2, 1) }, 6);
    assert_eq!(&x, b"bc");
    assert_eq!(&y[..4], b"defg");

    assert_eq!(unsafe { shim.shim.readv(fd, into.as_ptr(), -1) }, -1);
    assert_eq!(Errno::last(), Errno::EINVAL);

    assert_eq!(unsafe { shim.shim.preadv2(fd, into.as_ptr(), 2, 0, libc::RWF_HIPRI) }, -1);
    assert_eq!(Errno::last(), Errno::ENOSYS);

    unsafe { shim.shim.close(fd) };
    Ok(())
}

#[rstest]
fn test_positioned_io(shim: TestShim) -> Result<()> {
    let mp = shim.mount_point("pos");
    shim.shim.mount(&mp, Arc::new(MemFs::new()))?;
    let fd = open_rw(&shim, &under(&mp, "/p"));

    assert_eq!(unsafe { shim.shim.pwrite(fd, b"xyz".as_ptr().cast(), 3, 4) }, 3);
    let mut buf = [0xffu8; 7];
    assert_eq!(unsafe { shim.shim.pread(fd, buf.as_mut_ptr().cast(), 7, 0) }, 7);
    assert_eq!(&buf, b"\0\0\0\0xyz");
    // The file position is untouched.
    assert_eq!(unsafe { shim.shim.lseek(fd, 0, libc::SEEK_CUR) }, 0);

    unsafe { shim.shim.close(fd) };
    Ok(())
}

#[rstest]
fn test_missing_operations_are_not_supported(shim: TestShim) -> Result<()> {
    let mp = shim.mount_point("bare");
    shim.shim.mount(&mp, Arc::new(MemFs::new()))?;
    let path = under(&mp, "/f");
    let fd = open_rw(&shim, &path);

    assert_eq!(unsafe { shim.shim.chmod(path.as_ptr(), 0o600) }, -1);
    assert_eq!(Errno::last(), Errno::ENOSYS);

    let mut sb: libc::stat = unsafe { std::mem::zeroed() };
    assert_eq!(unsafe { shim.shim.lstat(path.as_ptr(), &mut sb) }, -1);
    assert_eq!(Errno::last(), Errno::ENOSYS);

    assert_eq!(unsafe { shim.shim.fcntl(fd, libc::F_GETFD, 0) }, -1);
    assert_eq!(Errno::last(), Errno::ENOSYS);

    assert_eq!(
        unsafe { shim.shim.ioctl(fd, libc::FIONREAD, std::ptr::null_mut()) },
        -1
    );
    assert_eq!(Errno::last(), Errno::ENOSYS);

    assert!(unsafe { shim.shim.opendir(mp.as_ptr()) }.is_null());
    assert_eq!(Errno::last(), Errno::ENOSYS);

    unsafe { shim.shim.close(fd) };
    Ok(())
}

#[rstest]
fn test_rename_within_and_across_mounts(shim: TestShim) -> Result<()> {
    let mp = shim.mount_point("mv");
    let fs = Arc::new(MemFs::new());
    shim.shim.mount(&mp, fs.clone())?;
    let from = under(&mp, "/from");
    let to = under(&mp, "/to");
    let fd = open_rw(&shim, &from);
    unsafe { shim.shim.close(fd) };

    assert_eq!(unsafe { shim.shim.rename(from.as_ptr(), to.as_ptr()) }, 0);
    assert!(fs.content(&from).is_none());
    assert!(fs.content(&to).is_some());

    let outside = shim.scratch_c("outside");
    assert_eq!(unsafe { shim.shim.rename(to.as_ptr(), outside.as_ptr()) }, -1);
    assert_eq!(Errno::last(), Errno::EXDEV);
    assert_eq!(unsafe { shim.shim.link(to.as_ptr(), outside.as_ptr()) }, -1);
    assert_eq!(Errno::last(), Errno::EXDEV);

    assert_eq!(unsafe { shim.shim.unlink(to.as_ptr()) }, 0);
    assert_eq!(unsafe { shim.shim.access(to.as_ptr(), libc::F_OK) }, -1);
    assert_eq!(Errno::last(), Errno::ENOENT);
    Ok(())
}

#[rstest]
fn test_backend_errors_reach_caller(shim: TestShim) -> Result<()> {
    let mp = shim.mount_point("err");
    let path = under(&mp, "/exists");
    shim.shim.mount(&mp, Arc::new(MemFs::with_file(&path, b"there")))?;

    let missing = under(&mp, "/missing");
    assert_eq!(unsafe { shim.shim.open(missing.as_ptr(), libc::O_RDONLY, 0) }, -1);
    assert_eq!(Errno::last(), Errno::ENOENT);

    let fd = unsafe { shim.shim.open(path.as_ptr(), libc::O_RDONLY, 0) };
    assert!(is_virtual(fd));
    assert_eq!(unsafe { shim.shim.lseek(fd, -10, libc::SEEK_SET) }, -1);
    assert_eq!(Errno::last(), Errno::EINVAL);
    unsafe { shim.shim.close(fd) };
    Ok(())
}
