//! Single-handle file session over a [`Volume`].
//!
//! Exactly one file is open at a time, identified by the path it was opened
//! with. Opening a different path closes the current handle first; re-opening
//! the same path for reading only rewinds it.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use enough::{Stop, Unstoppable};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::volume::{self, OpenMode, Volume, VolumeError, VolumeFile, normalize};

struct OpenFile<F> {
    path: String,
    mode: OpenMode,
    file: F,
}

/// The session handle plus the volume it reads from.
pub struct Session<V: Volume> {
    volume: V,
    current: Option<OpenFile<V::File>>,
    open_attempts: u32,
    copy_chunk_size: usize,
}

impl<V: Volume> Session<V> {
    pub fn new(volume: V) -> Self {
        Self::with_config(volume, &StoreConfig::default())
    }

    pub fn with_config(volume: V, config: &StoreConfig) -> Self {
        Self {
            volume,
            current: None,
            open_attempts: config.open_attempts.max(1),
            copy_chunk_size: config.copy_chunk_size.max(1),
        }
    }

    pub fn volume(&self) -> &V {
        &self.volume
    }

    pub fn volume_mut(&mut self) -> &mut V {
        &mut self.volume
    }

    pub fn into_volume(self) -> V {
        self.volume
    }

    /// Path of the open handle, if any.
    pub fn open_path(&self) -> Option<&str> {
        self.current.as_ref().map(|f| f.path.as_str())
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Open `path` for reading, reusing the handle when it is already open for reading.
    pub fn open_for_read(&mut self, path: &str) -> Result<(), StoreError> {
        let path = normalize(path);
        if let Some(open) = self.current.as_mut() {
            if open.mode == OpenMode::Read && open.path == path {
                log::debug!("rewinding {path}");
                open.file.seek(0)?;
                return Ok(());
            }
        }
        self.drop_current();
        let file = self.open_with_retry(path, OpenMode::Read)?;
        log::debug!("opened {path} for reading");
        self.current = Some(OpenFile {
            path: path.into(),
            mode: OpenMode::Read,
            file,
        });
        Ok(())
    }

    /// Open `path` for writing. New data is appended; with `overwrite` an
    /// existing file is deleted first.
    pub fn open_for_write(&mut self, path: &str, overwrite: bool) -> Result<(), StoreError> {
        let path = normalize(path);
        self.drop_current();
        if overwrite && self.volume.exists(path) {
            self.volume.remove(path)?;
        }
        let file = self.open_with_retry(path, OpenMode::Append)?;
        log::debug!("opened {path} for writing");
        self.current = Some(OpenFile {
            path: path.into(),
            mode: OpenMode::Append,
            file,
        });
        Ok(())
    }

    pub fn file_size(&mut self) -> Result<u64, StoreError> {
        Ok(self.handle()?.size()?)
    }

    pub fn seek(&mut self, pos: u64) -> Result<(), StoreError> {
        Ok(self.handle()?.seek(pos)?)
    }

    pub fn position(&mut self) -> Result<u64, StoreError> {
        Ok(self.handle()?.position()?)
    }

    /// Read up to `buf.len()` bytes. Short counts only happen at end of file.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, StoreError> {
        Ok(volume::read_full(self.handle()?, buf)?)
    }

    /// Read up to `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, StoreError> {
        let mut buf = vec![0u8; n];
        let read = self.read_into(&mut buf)?;
        buf.truncate(read);
        Ok(buf)
    }

    /// Read from the cursor to end of file.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>, StoreError> {
        let file = self.handle()?;
        let mut out = Vec::new();
        let mut chunk = [0u8; 256];
        loop {
            match file.read(&mut chunk)? {
                0 => return Ok(out),
                n => out.extend_from_slice(&chunk[..n]),
            }
        }
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<usize, StoreError> {
        volume::write_all(self.handle()?, data)?;
        Ok(data.len())
    }

    /// Close the open handle. Fails with [`StoreError::NoOpenHandle`] when nothing is open.
    pub fn close(&mut self) -> Result<(), StoreError> {
        let mut open = self.current.take().ok_or(StoreError::NoOpenHandle)?;
        log::debug!("closing {}", open.path);
        open.file.flush()?;
        Ok(())
    }

    /// Copy `src` to `dst`, returning the number of bytes copied.
    pub fn copy(&mut self, src: &str, dst: &str, overwrite: bool) -> Result<u64, StoreError> {
        self.copy_with_stop(src, dst, overwrite, &Unstoppable)
    }

    /// Copy with cancellation checked between chunks.
    ///
    /// Source and destination use their own handles; the session handle is
    /// left alone unless it refers to `dst`, which is closed. A copy that
    /// fails part way removes the partial destination.
    pub fn copy_with_stop(
        &mut self,
        src: &str,
        dst: &str,
        overwrite: bool,
        stop: &dyn Stop,
    ) -> Result<u64, StoreError> {
        let (src, dst) = (normalize(src), normalize(dst));
        if src == dst || (self.volume.exists(dst) && !overwrite) {
            return Err(StoreError::DestinationExists(dst.into()));
        }
        let mut reader = self.open_with_retry(src, OpenMode::Read)?;
        if self.open_path() == Some(dst) {
            self.drop_current();
        }
        if self.volume.exists(dst) {
            self.volume.remove(dst)?;
        }
        let mut writer = self.open_with_retry(dst, OpenMode::Append)?;

        let mut buf = vec![0u8; self.copy_chunk_size];
        let mut copied = 0u64;
        let result = loop {
            if let Err(reason) = stop.check() {
                break Err(StoreError::from(reason));
            }
            let n = match volume::read_full(&mut reader, &mut buf) {
                Ok(0) => break writer.flush().map_err(StoreError::from),
                Ok(n) => n,
                Err(e) => break Err(e.into()),
            };
            if let Err(e) = volume::write_all(&mut writer, &buf[..n]) {
                break Err(e.into());
            }
            copied += n as u64;
        };
        drop(writer);

        match result {
            Ok(()) => {
                log::debug!("copied {copied} bytes from {src} to {dst}");
                Ok(copied)
            }
            Err(e) => {
                log::warn!("copy from {src} to {dst} failed: {e}");
                if let Err(rm) = self.volume.remove(dst) {
                    log::warn!("could not remove partial {dst}: {rm}");
                }
                Err(e)
            }
        }
    }

    /// Open a handle independent of the session, retrying transient failures.
    pub(crate) fn open_with_retry(
        &mut self,
        path: &str,
        mode: OpenMode,
    ) -> Result<V::File, StoreError> {
        let mut attempt = 1;
        loop {
            match self.volume.open(path, mode) {
                Ok(file) => return Ok(file),
                Err(VolumeError::Io(msg)) if attempt < self.open_attempts => {
                    log::warn!("open {path} failed ({msg}), attempt {attempt}/{}", self.open_attempts);
                    attempt += 1;
                }
                Err(e) => {
                    log::warn!("failed to open {path}: {e}");
                    return Err(StoreError::OpenFailed { path: path.into() });
                }
            }
        }
    }

    fn handle(&mut self) -> Result<&mut V::File, StoreError> {
        self.current
            .as_mut()
            .map(|open| &mut open.file)
            .ok_or(StoreError::NoOpenHandle)
    }

    fn drop_current(&mut self) {
        if let Some(mut open) = self.current.take() {
            if let Err(e) = open.file.flush() {
                log::warn!("flush of {} failed: {e}", open.path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::MemVolume;

    #[test]
    fn read_write_without_handle_fails() {
        let mut session = Session::new(MemVolume::new());
        assert!(matches!(session.read_bytes(4), Err(StoreError::NoOpenHandle)));
        assert!(matches!(session.write_bytes(b"x"), Err(StoreError::NoOpenHandle)));
        assert!(matches!(session.file_size(), Err(StoreError::NoOpenHandle)));
        assert!(matches!(session.close(), Err(StoreError::NoOpenHandle)));
        assert!(matches!(session.close(), Err(StoreError::NoOpenHandle)));
    }

    #[test]
    fn missing_file_is_open_failed() {
        let mut session = Session::new(MemVolume::new());
        match session.open_for_read("/nope.bmp") {
            Err(StoreError::OpenFailed { path }) => assert_eq!(path, "nope.bmp"),
            other => panic!("expected OpenFailed, got {other:?}"),
        }
        assert!(!session.is_open());
    }

    #[test]
    fn write_appends_unless_overwrite() {
        let vol = MemVolume::new();
        let mut session = Session::new(vol.clone());
        session.open_for_write("a", false).unwrap();
        session.write_bytes(b"12").unwrap();
        session.open_for_write("a", false).unwrap();
        session.write_bytes(b"34").unwrap();
        assert_eq!(vol.contents("a").unwrap(), b"1234");
        session.open_for_write("a", true).unwrap();
        session.write_bytes(b"5").unwrap();
        session.close().unwrap();
        assert_eq!(vol.contents("a").unwrap(), b"5");
    }

    #[test]
    fn write_handle_is_not_reused_for_reading() {
        let vol = MemVolume::new();
        let mut session = Session::new(vol.clone());
        session.open_for_write("a", true).unwrap();
        session.write_bytes(b"abc").unwrap();
        let opens = vol.stats().opens;
        session.open_for_read("a").unwrap();
        assert_eq!(vol.stats().opens, opens + 1);
        assert_eq!(session.read_bytes(8).unwrap(), b"abc");
    }
}
