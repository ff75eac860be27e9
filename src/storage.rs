//! The storage engine: session, bitmap cache, mono colour and mapping table
//! behind one owner.

use alloc::string::String;
use alloc::vec::Vec;

use crate::cache::{BitmapDescriptor, WarmUpReport};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::limits::Limits;
use crate::mapping::{MAX_TEXT_LEN, MappingTable};
use crate::session::Session;
use crate::volume::{self, Volume};

/// Owns the single file session, the live [`BitmapDescriptor`] and the
/// in-memory [`MappingTable`].
///
/// ```
/// use zenfloor::{Storage, volume::MemVolume};
///
/// let mut storage = Storage::new(MemVolume::new());
/// storage.init_mapping("floors.txt")?;
/// storage.mapping_mut().set_mapping("3", "shop", "")?;
/// storage.commit_mapping("floors.txt")?;
/// assert_eq!(storage.load_mapping("floors.txt")?.mapped_floor_count(), 1);
/// # Ok::<(), zenfloor::StoreError>(())
/// ```
pub struct Storage<V: Volume> {
    pub(crate) session: Session<V>,
    pub(crate) config: StoreConfig,
    pub(crate) limits: Limits,
    pub(crate) bitmap: BitmapDescriptor,
    mapping: MappingTable,
}

impl<V: Volume> Storage<V> {
    pub fn new(volume: V) -> Self {
        Self::with_config(volume, StoreConfig::default())
    }

    pub fn with_config(volume: V, config: StoreConfig) -> Self {
        Self {
            session: Session::with_config(volume, &config),
            config,
            limits: Limits::default(),
            bitmap: BitmapDescriptor::error(),
            mapping: MappingTable::new(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Build a storage engine and bring the volume up: every root bitmap
    /// gets its companion and the mono colour file is created if missing.
    pub fn start(volume: V, config: StoreConfig) -> Result<(Self, WarmUpReport), StoreError> {
        let mut storage = Self::with_config(volume, config);
        log::info!("starting storage, warming companion cache");
        let report = storage.warm_up()?;
        storage.ensure_mono_color()?;
        Ok((storage, report))
    }

    pub fn session(&self) -> &Session<V> {
        &self.session
    }

    /// The file API shared with the transfer link.
    pub fn session_mut(&mut self) -> &mut Session<V> {
        &mut self.session
    }

    /// Result of the most recent [`Storage::bitmap`] call.
    pub fn descriptor(&self) -> &BitmapDescriptor {
        &self.bitmap
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn into_volume(self) -> V {
        self.session.into_volume()
    }

    /// Stored display colour (RGB565), or the configured default when the
    /// file is missing or short.
    pub fn mono_color(&mut self) -> u16 {
        let file = self.config.mono_color_file.clone();
        let bytes = self
            .session
            .open_for_read(&file)
            .and_then(|()| self.session.read_bytes(2));
        match bytes.as_deref() {
            Ok([lo, hi]) => u16::from_le_bytes([*lo, *hi]),
            _ => self.config.default_mono_color,
        }
    }

    /// Replace the stored display colour.
    pub fn save_mono_color(&mut self, color: u16) -> Result<(), StoreError> {
        let file = self.config.mono_color_file.clone();
        let result = self
            .session
            .open_for_write(&file, true)
            .and_then(|()| self.session.write_bytes(&color.to_le_bytes()))
            .and_then(|_| self.session.close());
        match result {
            Ok(()) => {
                log::debug!("saved mono colour {color:#06x}");
                Ok(())
            }
            Err(e) => {
                log::warn!("saving mono colour failed: {e}");
                Err(e)
            }
        }
    }

    fn ensure_mono_color(&mut self) -> Result<(), StoreError> {
        if self.session.volume().exists(&self.config.mono_color_file) {
            return Ok(());
        }
        log::info!("no mono colour stored, writing default");
        self.save_mono_color(self.config.default_mono_color)
    }

    /// Companion file listed before `name` in the companion directory.
    pub fn previous_companion(&self, name: &str) -> Result<Option<String>, StoreError> {
        let names = self.companion_names()?;
        let i = position_of(&names, name)?;
        Ok(i.checked_sub(1).map(|j| names[j].clone()))
    }

    /// Companion file listed after `name` in the companion directory.
    pub fn next_companion(&self, name: &str) -> Result<Option<String>, StoreError> {
        let names = self.companion_names()?;
        let i = position_of(&names, name)?;
        Ok(names.get(i + 1).cloned())
    }

    fn companion_names(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.session.volume().list_dir(&self.config.companion_dir)?;
        Ok(entries
            .into_iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.name)
            .collect())
    }

    /// Read the mapping file at `path` into memory.
    ///
    /// The in-memory table is only replaced when the whole file parses.
    pub fn load_mapping(&mut self, path: &str) -> Result<&MappingTable, StoreError> {
        self.session.open_for_read(path)?;
        let data = self.session.read_bytes(MAX_TEXT_LEN)?;
        self.mapping = MappingTable::parse(&data)?;
        log::debug!(
            "loaded {path}: {} floors mapped",
            self.mapping.mapped_floor_count()
        );
        Ok(&self.mapping)
    }

    /// Write the in-memory table to `path`, replacing the file.
    pub fn commit_mapping(&mut self, path: &str) -> Result<(), StoreError> {
        let text = self.mapping.to_text();
        self.write_file(path, text.as_bytes())?;
        log::info!("saved mapping table to {path}");
        Ok(())
    }

    /// Write a blank table (floors `1..=32`, no bitmaps) to `path` and make
    /// it the in-memory table.
    pub fn init_mapping(&mut self, path: &str) -> Result<(), StoreError> {
        let blank = MappingTable::blank();
        self.write_file(path, blank.to_text().as_bytes())?;
        self.mapping = blank;
        log::info!("initialised mapping table at {path}");
        Ok(())
    }

    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    /// Edit the in-memory table; call [`Storage::commit_mapping`] to persist.
    pub fn mapping_mut(&mut self) -> &mut MappingTable {
        &mut self.mapping
    }

    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<(), StoreError> {
        self.session.open_for_write(path, true)?;
        self.session.write_bytes(data)?;
        self.session.close()
    }
}

fn position_of(names: &[String], name: &str) -> Result<usize, StoreError> {
    let name = volume::file_name(name);
    names
        .iter()
        .position(|n| n == name)
        .ok_or_else(|| StoreError::EntryNotFound(name.into()))
}
