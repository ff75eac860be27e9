//! Bitmap lookup backed by run-length companion files.
//!
//! Looking up `icons/lift.bmp` parses its header and makes sure
//! `enc/lift.cbm` exists, encoding it on first use. A lookup never decodes
//! pixels for the caller; it hands back header metadata and where the
//! companion lives.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use enough::{Stop, Unstoppable};

use crate::bmp::{BmpHeader, is_bitmap, read_header};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::scan::{self, EncodeStats};
use crate::storage::Storage;
use crate::volume::{self, OpenMode, Volume};

/// Pixel layout of the bitmap described by a [`BitmapDescriptor`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BitmapType {
    /// Lookup failed or the layout is not understood.
    #[default]
    Error,
    /// Uncompressed 1-bit source.
    Monochrome,
    /// 1-bit source whose companion file is present.
    MonochromeCompressed,
    /// Uncompressed 24-bit source. Metadata only.
    Rgb888,
    Rgb888Compressed,
}

/// How the companion of the last lookup came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    /// Already on the volume; nothing was written.
    Hit,
    /// Written by this lookup.
    Encoded(EncodeStats),
}

/// Result of the most recent bitmap lookup.
///
/// Exactly one descriptor is live per [`Storage`]; every lookup replaces it
/// and releases the previous row buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitmapDescriptor {
    /// Pixel width, `-1` when unknown.
    pub width: i32,
    /// Scanline count, `-1` when unknown. Never negative otherwise.
    pub height: i32,
    /// Rows are stored top row first.
    pub top_down: bool,
    pub kind: BitmapType,
    pub cache: Option<CacheStatus>,
    /// Volume path of the companion file.
    pub companion: Option<String>,
    data: Vec<u8>,
}

impl Default for BitmapDescriptor {
    fn default() -> Self {
        Self::error()
    }
}

impl BitmapDescriptor {
    /// Descriptor reported when a lookup fails.
    pub fn error() -> Self {
        Self {
            width: -1,
            height: -1,
            top_down: false,
            kind: BitmapType::Error,
            cache: None,
            companion: None,
            data: Vec::new(),
        }
    }

    pub(crate) fn from_header(header: &BmpHeader) -> Self {
        Self {
            width: i32::try_from(header.width).unwrap_or(-1),
            height: i32::try_from(header.height).unwrap_or(-1),
            top_down: header.top_down,
            kind: header.kind(),
            ..Self::error()
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == BitmapType::Error
    }

    /// Last row buffer used while encoding; empty after a cache hit.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Companion path for `source`: the file name cut at its first `.`, given
/// the companion extension, inside the companion directory.
///
/// ```
/// use zenfloor::{StoreConfig, cache::companion_path};
///
/// let config = StoreConfig::default();
/// assert_eq!(companion_path("/lobby.night.bmp", &config), "enc/lobby.cbm");
/// ```
pub fn companion_path(source: &str, config: &StoreConfig) -> String {
    let name = volume::file_name(source);
    let stem = name.split_once('.').map_or(name, |(stem, _)| stem);
    let file = if config.companion_extension.is_empty() {
        String::from(stem)
    } else {
        format!("{stem}.{}", config.companion_extension)
    };
    volume::join(&config.companion_dir, &file)
}

/// Outcome of [`Storage::warm_up`].
#[derive(Debug, Default)]
pub struct WarmUpReport {
    /// Sources whose companion was written during warm-up.
    pub encoded: Vec<String>,
    /// Sources whose companion already existed.
    pub cached: usize,
    /// Root files that are not bitmaps.
    pub skipped: usize,
    pub failed: Vec<(String, StoreError)>,
}

impl<V: Volume> Storage<V> {
    /// Look up a bitmap, encoding its companion on first use.
    pub fn bitmap(&mut self, path: &str) -> Result<&BitmapDescriptor, StoreError> {
        self.bitmap_with_stop(path, &Unstoppable)
    }

    /// [`Storage::bitmap`] with cancellation checked while encoding.
    ///
    /// On failure [`Storage::descriptor`] reports [`BitmapDescriptor::error`],
    /// except for a readable header with an unsupported layout, whose
    /// metadata is kept. A partly written companion is removed.
    pub fn bitmap_with_stop(
        &mut self,
        path: &str,
        stop: &dyn Stop,
    ) -> Result<&BitmapDescriptor, StoreError> {
        self.bitmap = BitmapDescriptor::error();
        self.session.open_for_read(path)?;
        let header = read_header(&mut self.session)?;
        let mut desc = BitmapDescriptor::from_header(&header);
        if let Err(e) = header.ensure_mono() {
            log::debug!("{path}: {e}");
            self.bitmap = desc;
            return Err(e);
        }
        self.limits.check_header(&header)?;

        let companion = companion_path(path, &self.config);
        if self.session.volume().exists(&companion) {
            log::debug!("cache hit for {path}: {companion}");
            desc.cache = Some(CacheStatus::Hit);
        } else {
            let (stats, buf) = self.encode_companion(path, &header, &companion, stop)?;
            desc.cache = Some(CacheStatus::Encoded(stats));
            desc.data = buf;
        }
        desc.kind = BitmapType::MonochromeCompressed;
        desc.companion = Some(companion);
        self.bitmap = desc;
        Ok(&self.bitmap)
    }

    fn encode_companion(
        &mut self,
        path: &str,
        header: &BmpHeader,
        companion: &str,
        stop: &dyn Stop,
    ) -> Result<(EncodeStats, Vec<u8>), StoreError> {
        let dir = volume::normalize(&self.config.companion_dir);
        if !dir.is_empty() {
            self.session.volume_mut().create_dir(dir)?;
        }
        let mut out = self.session.open_with_retry(companion, OpenMode::Append)?;
        log::info!(
            "encoding {path} ({}x{}) into {companion}",
            header.width,
            header.height
        );
        let mut buf = Vec::new();
        let result = scan::encode_bitmap(&mut self.session, header, &mut out, &mut buf, stop);
        drop(out);
        match result {
            Ok(stats) => {
                log::info!(
                    "encoded {companion}: {} runs, {} bytes",
                    stats.runs,
                    stats.bytes
                );
                Ok((stats, buf))
            }
            Err(e) => {
                log::warn!("encoding {path} failed: {e}");
                if let Err(rm) = self.session.volume_mut().remove(companion) {
                    log::warn!("could not remove partial {companion}: {rm}");
                }
                Err(e)
            }
        }
    }

    /// Pass every bitmap at the volume root through [`Storage::bitmap`].
    pub fn warm_up(&mut self) -> Result<WarmUpReport, StoreError> {
        self.warm_up_with_stop(&Unstoppable)
    }

    /// [`Storage::warm_up`] with cancellation. Individual failures are
    /// collected in the report; only cancellation and an unreadable root
    /// abort the walk.
    pub fn warm_up_with_stop(&mut self, stop: &dyn Stop) -> Result<WarmUpReport, StoreError> {
        let entries = self.session.volume().list_dir("")?;
        let mut report = WarmUpReport::default();
        for entry in entries.iter().filter(|e| !e.is_dir) {
            stop.check()?;
            let name = entry.name.as_str();
            let magic = self
                .session
                .open_for_read(name)
                .and_then(|()| self.session.read_bytes(2));
            match magic {
                Ok(m) if is_bitmap(&m) => {}
                Ok(_) => {
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    log::warn!("warm-up: cannot read {name}: {e}");
                    report.failed.push((name.into(), e));
                    continue;
                }
            }
            match self.bitmap_with_stop(name, stop) {
                Ok(desc) if desc.cache == Some(CacheStatus::Hit) => report.cached += 1,
                Ok(_) => report.encoded.push(name.into()),
                Err(StoreError::Cancelled(reason)) => return Err(reason.into()),
                Err(e) => {
                    log::warn!("warm-up: skipping {name}: {e}");
                    report.failed.push((name.into(), e));
                }
            }
        }
        log::info!(
            "warm-up done: {} encoded, {} cached, {} skipped, {} failed",
            report.encoded.len(),
            report.cached,
            report.skipped,
            report.failed.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_names() {
        let config = StoreConfig::default();
        assert_eq!(companion_path("lift.bmp", &config), "enc/lift.cbm");
        assert_eq!(companion_path("/a/b/lift", &config), "enc/lift.cbm");
        let flat = StoreConfig::default()
            .with_companion_dir("")
            .with_companion_extension("");
        assert_eq!(companion_path("lift.bmp", &flat), "lift");
    }

    #[test]
    fn error_descriptor() {
        let desc = BitmapDescriptor::default();
        assert!(desc.is_error());
        assert_eq!((desc.width, desc.height), (-1, -1));
        assert!(desc.data().is_empty());
    }
}
