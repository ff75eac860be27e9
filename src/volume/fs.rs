//! Volume backed by a host directory.

use alloc::vec::Vec;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use super::{DirEntry, OpenMode, Volume, VolumeError, VolumeFile, checked};

/// A host directory used as the storage root, e.g. a mounted SD card.
#[derive(Clone, Debug)]
pub struct DirVolume {
    root: PathBuf,
}

impl DirVolume {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Host path for `path`; `..` never climbs above the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, VolumeError> {
        let mut full = self.root.clone();
        for part in checked(path)?.split('/').filter(|p| !p.is_empty()) {
            full.push(part);
        }
        Ok(full)
    }
}

impl Volume for DirVolume {
    type File = File;

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<File, VolumeError> {
        let full = self.resolve(path)?;
        let file = match mode {
            OpenMode::Read => File::open(&full)?,
            OpenMode::Append => OpenOptions::new()
                .read(true)
                .append(true)
                .create(true)
                .open(&full)?,
        };
        if file.metadata()?.is_dir() {
            return Err(VolumeError::IsDirectory);
        }
        Ok(file)
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok_and(|full| full.exists())
    }

    fn remove(&mut self, path: &str) -> Result<(), VolumeError> {
        let full = self.resolve(path)?;
        if full.is_dir() {
            fs::remove_dir(&full)?;
        } else {
            fs::remove_file(&full)?;
        }
        Ok(())
    }

    fn create_dir(&mut self, path: &str) -> Result<(), VolumeError> {
        let full = self.resolve(path)?;
        if full.is_dir() {
            return Ok(());
        }
        fs::create_dir(&full)?;
        Ok(())
    }

    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, VolumeError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.resolve(path)?)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: meta.is_dir(),
                size: meta.len(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

impl VolumeFile for File {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, VolumeError> {
        Ok(Read::read(self, buf)?)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, VolumeError> {
        Ok(Write::write(self, data)?)
    }

    fn seek(&mut self, pos: u64) -> Result<(), VolumeError> {
        Seek::seek(self, SeekFrom::Start(pos))?;
        Ok(())
    }

    fn position(&mut self) -> Result<u64, VolumeError> {
        Ok(self.stream_position()?)
    }

    fn size(&mut self) -> Result<u64, VolumeError> {
        Ok(self.metadata()?.len())
    }

    fn flush(&mut self) -> Result<(), VolumeError> {
        Ok(Write::flush(self)?)
    }
}
