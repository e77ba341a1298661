use bdsim::{FsOperations, FsResult};
use libc::{c_int, mode_t, off_t};
use nix::errno::Errno;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::sync::Mutex;

struct OpenFile {
    path: CString,
    offset: usize,
}

#[derive(Default)]
struct State {
    files: HashMap<CString, Vec<u8>>,
    open: HashMap<c_int, OpenFile>,
    next_fd: c_int,
    seen: Vec<String>,
}

/**
 * In-memory back-end keyed by the full path it is handed. Every path it
 * sees is recorded so tests can check what reached it.
 */
#[derive(Default)]
pub struct MemFs {
    state: Mutex<State>,
}

impl MemFs {
    pub fn new() -> Self {
        let fs = Self::default();
        fs.state.lock().unwrap().next_fd = 100;
        fs
    }

    pub fn with_file(path: &CStr, content: &[u8]) -> Self {
        let fs = Self::new();
        fs.state
            .lock()
            .unwrap()
            .files
            .insert(path.to_owned(), content.to_vec());
        fs
    }

    pub fn content(&self, path: &CStr) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(path).cloned()
    }

    pub fn seen(&self) -> Vec<String> {
        self.state.lock().unwrap().seen.clone()
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().unwrap().open.len()
    }

    fn note(state: &mut State, op: &str, path: &CStr) {
        state
            .seen
            .push(format!("{} {}", op, path.to_string_lossy()));
    }

    fn with_open<T>(
        &self,
        fd: c_int,
        f: impl FnOnce(&mut OpenFile, &mut HashMap<CString, Vec<u8>>) -> FsResult<T>,
    ) -> FsResult<T> {
        let mut state = self.state.lock().unwrap();
        let State { files, open, .. } = &mut *state;
        let file = open.get_mut(&fd).ok_or(Errno::EBADF)?;
        f(file, files)
    }
}

fn fill_stat(buf: &mut libc::stat, len: usize) {
    *buf = unsafe { std::mem::zeroed() };
    buf.st_mode = libc::S_IFREG | 0o644;
    buf.st_size = len as off_t;
    buf.st_nlink = 1;
}

fn read_at(data: &[u8], offset: usize, buf: &mut [u8]) -> usize {
    let available = data.len().saturating_sub(offset);
    let n = available.min(buf.len());
    buf[..n].copy_from_slice(&data[offset..offset + n]);
    n
}

fn write_at(data: &mut Vec<u8>, offset: usize, buf: &[u8]) -> usize {
    if data.len() < offset + buf.len() {
        data.resize(offset + buf.len(), 0);
    }
    data[offset..offset + buf.len()].copy_from_slice(buf);
    buf.len()
}

impl FsOperations for MemFs {
    fn open(
        &self,
        path: &CStr,
        flags: c_int,
        _mode: Option<mode_t>,
    ) -> FsResult<c_int> {
        let mut state = self.state.lock().unwrap();
        Self::note(&mut state, "open", path);
        if !state.files.contains_key(path) {
            if flags & libc::O_CREAT == 0 {
                return Err(Errno::ENOENT);
            }
            state.files.insert(path.to_owned(), Vec::new());
        } else if flags & libc::O_TRUNC != 0 {
            state.files.insert(path.to_owned(), Vec::new());
        }
        let fd = state.next_fd;
        state.next_fd += 1;
        state.open.insert(
            fd,
            OpenFile {
                path: path.to_owned(),
                offset: 0,
            },
        );
        Ok(fd)
    }

    fn creat(&self, path: &CStr, mode: mode_t) -> FsResult<c_int> {
        self.open(path, libc::O_CREAT | libc::O_WRONLY | libc::O_TRUNC, Some(mode))
    }

    fn close(&self, fd: c_int) -> FsResult<()> {
        self.state
            .lock()
            .unwrap()
            .open
            .remove(&fd)
            .map(|_| ())
            .ok_or(Errno::EBADF)
    }

    fn unlink(&self, path: &CStr) -> FsResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::note(&mut state, "unlink", path);
        state.files.remove(path).map(|_| ()).ok_or(Errno::ENOENT)
    }

    fn rename(&self, oldpath: &CStr, newpath: &CStr) -> FsResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::note(&mut state, "rename", oldpath);
        let data = state.files.remove(oldpath).ok_or(Errno::ENOENT)?;
        state.files.insert(newpath.to_owned(), data);
        Ok(())
    }

    fn access(&self, path: &CStr, _mode: c_int) -> FsResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::note(&mut state, "access", path);
        if state.files.contains_key(path) {
            Ok(())
        } else {
            Err(Errno::ENOENT)
        }
    }

    fn stat(&self, path: &CStr, buf: &mut libc::stat) -> FsResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::note(&mut state, "stat", path);
        let len = state.files.get(path).ok_or(Errno::ENOENT)?.len();
        fill_stat(buf, len);
        Ok(())
    }

    fn fstat(&self, fd: c_int, buf: &mut libc::stat) -> FsResult<()> {
        self.with_open(fd, |file, files| {
            fill_stat(buf, files.get(&file.path).map_or(0, Vec::len));
            Ok(())
        })
    }

    fn read(&self, fd: c_int, buf: &mut [u8]) -> FsResult<usize> {
        self.with_open(fd, |file, files| {
            let data = files.get(&file.path).ok_or(Errno::ENOENT)?;
            let n = read_at(data, file.offset, buf);
            file.offset += n;
            Ok(n)
        })
    }

    fn write(&self, fd: c_int, buf: &[u8]) -> FsResult<usize> {
        self.with_open(fd, |file, files| {
            let data = files.get_mut(&file.path).ok_or(Errno::ENOENT)?;
            let n = write_at(data, file.offset, buf);
            file.offset += n;
            Ok(n)
        })
    }

    fn pread(&self, fd: c_int, buf: &mut [u8], offset: off_t) -> FsResult<usize> {
        self.with_open(fd, |file, files| {
            let data = files.get(&file.path).ok_or(Errno::ENOENT)?;
            Ok(read_at(data, offset as usize, buf))
        })
    }

    fn pwrite(&self, fd: c_int, buf: &[u8], offset: off_t) -> FsResult<usize> {
        self.with_open(fd, |file, files| {
            let data = files.get_mut(&file.path).ok_or(Errno::ENOENT)?;
            Ok(write_at(data, offset as usize, buf))
        })
    }

    fn lseek(&self, fd: c_int, offset: off_t, whence: c_int) -> FsResult<off_t> {
        self.with_open(fd, |file, files| {
            let len = files.get(&file.path).map_or(0, Vec::len) as off_t;
            let base = match whence {
                libc::SEEK_SET => 0,
                libc::SEEK_CUR => file.offset as off_t,
                libc::SEEK_END => len,
                _ => return Err(Errno::EINVAL),
            };
            let target = base + offset;
            if target < 0 {
                return Err(Errno::EINVAL);
            }
            file.offset = target as usize;
            Ok(target)
        })
    }
}
