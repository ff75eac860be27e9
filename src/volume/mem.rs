//! In-memory volume.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use super::{DirEntry, OpenMode, Volume, VolumeError, VolumeFile, checked, normalize, parent};

/// Operation counters of a [`MemVolume`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VolumeStats {
    pub opens: usize,
    pub writes: usize,
    pub removes: usize,
}

#[derive(Default)]
struct MemState {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    stats: VolumeStats,
}

impl MemState {
    fn dir_exists(&self, path: &str) -> bool {
        path.is_empty() || self.dirs.contains(path)
    }
}

/// Volume held entirely in memory.
///
/// Clones share the same contents, so a test can keep one clone to inspect
/// files and [`VolumeStats`] while a [`crate::Storage`] owns another.
#[derive(Clone, Default)]
pub struct MemVolume {
    state: Rc<RefCell<MemState>>,
}

impl MemVolume {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file. The parent directory is created if missing.
    pub fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        let path = normalize(path);
        let mut state = self.state.borrow_mut();
        let dir = parent(path);
        if !dir.is_empty() {
            state.dirs.insert(dir.into());
        }
        state.files.insert(path.into(), data.into());
    }

    /// Copy of a file's contents.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.state.borrow().files.get(normalize(path)).cloned()
    }

    pub fn stats(&self) -> VolumeStats {
        self.state.borrow().stats
    }
}

impl Volume for MemVolume {
    type File = MemFile;

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<MemFile, VolumeError> {
        let path = checked(path)?;
        let mut state = self.state.borrow_mut();
        let pos = match mode {
            OpenMode::Read => match state.files.get(path) {
                Some(_) => 0,
                None if state.dirs.contains(path) => {
                    return Err(VolumeError::IsDirectory);
                }
                None => return Err(VolumeError::NotFound),
            },
            OpenMode::Append => {
                if path.is_empty() || state.dirs.contains(path) {
                    return Err(VolumeError::IsDirectory);
                }
                if !state.dir_exists(parent(path)) {
                    return Err(VolumeError::NotFound);
                }
                state.files.entry(path.into()).or_default().len() as u64
            }
        };
        state.stats.opens += 1;
        Ok(MemFile {
            state: Rc::clone(&self.state),
            path: path.into(),
            pos,
            mode,
        })
    }

    fn exists(&self, path: &str) -> bool {
        let Ok(path) = checked(path) else {
            return false;
        };
        let state = self.state.borrow();
        state.files.contains_key(path) || state.dir_exists(path)
    }

    fn remove(&mut self, path: &str) -> Result<(), VolumeError> {
        let path = checked(path)?;
        let mut state = self.state.borrow_mut();
        if state.files.remove(path).is_none() {
            if !state.dirs.contains(path) {
                return Err(VolumeError::NotFound);
            }
            let prefix = alloc::format!("{path}/");
            let occupied = state.files.keys().any(|k| k.starts_with(&prefix))
                || state.dirs.iter().any(|d| d.starts_with(&prefix));
            if occupied {
                return Err(VolumeError::Io("directory not empty".into()));
            }
            state.dirs.remove(path);
        }
        state.stats.removes += 1;
        Ok(())
    }

    fn create_dir(&mut self, path: &str) -> Result<(), VolumeError> {
        let path = checked(path)?;
        let mut state = self.state.borrow_mut();
        if state.files.contains_key(path) {
            return Err(VolumeError::Io("a file with that name exists".into()));
        }
        if !state.dir_exists(parent(path)) {
            return Err(VolumeError::NotFound);
        }
        if !path.is_empty() {
            state.dirs.insert(path.into());
        }
        Ok(())
    }

    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, VolumeError> {
        let path = checked(path)?;
        let state = self.state.borrow();
        if !state.dir_exists(path) {
            return Err(VolumeError::NotFound);
        }
        let mut entries: Vec<DirEntry> = state
            .dirs
            .iter()
            .filter(|d| parent(d) == path)
            .map(|d| DirEntry {
                name: super::file_name(d).into(),
                is_dir: true,
                size: 0,
            })
            .chain(
                state
                    .files
                    .iter()
                    .filter(|(f, _)| parent(f) == path)
                    .map(|(f, data)| DirEntry {
                        name: super::file_name(f).into(),
                        is_dir: false,
                        size: data.len() as u64,
                    }),
            )
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Handle returned by [`MemVolume::open`].
pub struct MemFile {
    state: Rc<RefCell<MemState>>,
    path: String,
    pos: u64,
    mode: OpenMode,
}

impl VolumeFile for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, VolumeError> {
        let state = self.state.borrow();
        let data = state.files.get(&self.path).ok_or(VolumeError::Closed)?;
        let start = (self.pos as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, VolumeError> {
        if self.mode == OpenMode::Read {
            return Err(VolumeError::Io("file opened read-only".into()));
        }
        let mut state = self.state.borrow_mut();
        let file = state.files.get_mut(&self.path).ok_or(VolumeError::Closed)?;
        file.extend_from_slice(data);
        self.pos = file.len() as u64;
        state.stats.writes += 1;
        Ok(data.len())
    }

    fn seek(&mut self, pos: u64) -> Result<(), VolumeError> {
        self.pos = pos;
        Ok(())
    }

    fn position(&mut self) -> Result<u64, VolumeError> {
        Ok(self.pos)
    }

    fn size(&mut self) -> Result<u64, VolumeError> {
        let state = self.state.borrow();
        let data = state.files.get(&self.path).ok_or(VolumeError::Closed)?;
        Ok(data.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_creates_and_extends() {
        let mut vol = MemVolume::new();
        let mut f = vol.open("/log", OpenMode::Append).unwrap();
        f.write(b"ab").unwrap();
        drop(f);
        let mut f = vol.open("log", OpenMode::Append).unwrap();
        assert_eq!(f.position().unwrap(), 2);
        f.write(b"cd").unwrap();
        assert_eq!(vol.contents("log").unwrap(), b"abcd");
        assert_eq!(vol.stats().opens, 2);
        assert_eq!(vol.stats().writes, 2);
    }

    #[test]
    fn open_in_missing_dir_fails() {
        let mut vol = MemVolume::new();
        assert!(matches!(
            vol.open("enc/a.cbm", OpenMode::Append),
            Err(VolumeError::NotFound)
        ));
        vol.create_dir("enc").unwrap();
        assert!(vol.open("enc/a.cbm", OpenMode::Append).is_ok());
    }

    #[test]
    fn listing_is_sorted_and_flat() {
        let mut vol = MemVolume::new();
        vol.insert("b.bmp", [1u8]);
        vol.insert("a.bmp", [1u8, 2]);
        vol.insert("enc/a.cbm", Vec::new());
        let names: Vec<_> = vol
            .list_dir("/")
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.is_dir))
            .collect();
        assert_eq!(
            names,
            [
                (String::from("a.bmp"), false),
                (String::from("b.bmp"), false),
                (String::from("enc"), true)
            ]
        );
        assert!(vol.remove("enc").is_err());
        vol.remove("enc/a.cbm").unwrap();
        vol.remove("enc").unwrap();
        assert!(!vol.exists("enc"));
    }

    #[test]
    fn removed_file_makes_handle_stale() {
        let mut vol = MemVolume::new();
        vol.insert("x", *b"123");
        let mut f = vol.open("x", OpenMode::Read).unwrap();
        vol.remove("x").unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(f.read(&mut buf), Err(VolumeError::Closed));
    }
}
