//! # zenfloor
//!
//! Storage engine for a floor-directory display: monochrome BMP sources,
//! run-length companion files and the floor to bitmap mapping table, all on
//! one removable volume.
//!
//! ## Volume layout
//!
//! - `/*.bmp`: source bitmaps (uncompressed 1-bit BITMAPINFOHEADER)
//! - `/enc/<stem>.cbm`: companion run lists, written once per source
//! - `/monocolor`: 2-byte little-endian RGB565 display colour
//! - a mapping file named by the caller: 32 `floor,name,name2` lines and a
//!   `$` line
//!
//! ## Companion format
//!
//! 8-byte records `row, start, end` (each `u16` LE) plus `0xFF 0xFF`, one
//! per run of set pixels; see [`compressed`].
//!
//! ## Non-Goals
//!
//! - Decoding anything other than uncompressed 1-bit BMP
//! - Concurrent access: one [`Storage`] owns the single file handle
//!
//! ## Usage
//!
//! ```
//! use enough::Unstoppable;
//! use zenfloor::{Storage, StoreConfig, bmp, volume::MemVolume};
//!
//! let vol = MemVolume::new();
//! let mask = [1u8, 0, 0, 1];
//! vol.insert("arrow.bmp", bmp::encode_mono(&mask, 2, 2, false, &Unstoppable)?);
//!
//! let (mut storage, report) = Storage::start(vol.clone(), StoreConfig::default())?;
//! assert_eq!(report.encoded, ["arrow.bmp"]);
//! assert!(vol.contents("enc/arrow.cbm").is_some());
//!
//! let desc = storage.bitmap("arrow.bmp")?;
//! assert_eq!((desc.width, desc.height), (2, 2));
//! # Ok::<(), zenfloor::StoreError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod color;
mod config;
mod error;
mod limits;
mod session;
mod storage;

pub mod bits;
pub mod bmp;
pub mod cache;
pub mod compressed;
pub mod mapping;
pub mod scan;
pub mod volume;

// Re-exports
pub use cache::{BitmapDescriptor, BitmapType, CacheStatus, WarmUpReport};
pub use color::MonoColor;
pub use compressed::RunRecord;
pub use config::{DEFAULT_MONO_COLOR, StoreConfig};
pub use enough::{Stop, Unstoppable};
pub use error::StoreError;
pub use limits::Limits;
pub use mapping::{FloorMapping, MappingTable};
pub use session::Session;
pub use storage::Storage;
