//! Region files: fixed-slot persistence of column voxel and light data.
//!
//! ## Binary Layout
//!
//! One file per 32×32-column region, named `region_{rx}_{rz}.umr`. Column
//! `(cx, cz)` occupies the 4096-byte slot at index `lx + lz * 32`, where
//! `lx/lz` are its offsets inside the region.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | Voxel payload length `B` (`i32`, little-endian; 0 = no data) |
//! | 4 | B | gzip-compressed voxel run stream |
//! | 4+B | 4 | Light payload length `L` (`i32`, little-endian; 0 = no light) |
//! | 8+B | L | gzip-compressed light run stream |
//!
//! The remainder of the slot is zero padding.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::coords::{ChunkCoord, RegionCoord};
use crate::grid::VoxelGrid;
use crate::light_field::LightField;
use crate::rle::{self, RleError};

/// Bytes reserved for each column inside a region file.
pub const SLOT_SIZE: usize = 4096;

/// Region file extension.
pub const REGION_EXTENSION: &str = "umr";

const LENGTH_PREFIX: usize = 4;

/// Errors raised while reading or writing region files.
#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    /// The region file could not be opened, read or written.
    #[error("region I/O failed for {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A payload could not be compressed.
    #[error("compression failed: {0}")]
    Compress(#[source] std::io::Error),
    /// A compressed payload failed to inflate.
    #[error("corrupt payload: decompression failed: {0}")]
    Decompress(#[source] std::io::Error),
    /// A decompressed payload is not a valid run stream.
    #[error("corrupt payload: {0}")]
    Rle(#[from] RleError),
    /// A length prefix points outside the slot.
    #[error("corrupt payload: length {length} does not fit the slot")]
    BadLength {
        /// The stored length prefix.
        length: i32,
    },
    /// An encoded column does not fit into one slot.
    #[error("column {coord:?} needs {needed} bytes, slot holds {SLOT_SIZE}")]
    SlotOverflow {
        /// Column being saved.
        coord: ChunkCoord,
        /// Encoded size.
        needed: usize,
    },
}

impl RegionError {
    /// Whether this error describes damaged stored data rather than an I/O failure.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            RegionError::Decompress(_) | RegionError::Rle(_) | RegionError::BadLength { .. }
        )
    }
}

/// A column read back from disk.
#[derive(Debug, Clone)]
pub struct StoredColumn {
    /// Decoded voxels.
    pub voxels: VoxelGrid,
    /// Decoded light, or `None` for a partial save that needs re-solving.
    pub light: Option<LightField>,
}

/// Compresses a byte stream with gzip.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, RegionError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(RegionError::Compress)?;
    encoder.finish().map_err(RegionError::Compress)
}

/// Inflates a gzip stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, RegionError> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(RegionError::Decompress)?;
    Ok(out)
}

/// Encodes a column into its slot image (without padding).
pub fn encode_slot(
    coord: ChunkCoord,
    voxels: &VoxelGrid,
    light: Option<&LightField>,
) -> Result<Vec<u8>, RegionError> {
    let block_payload = compress(&rle::encode_voxels(voxels))?;
    let light_payload = light
        .map(|field| compress(&rle::encode_light(field)))
        .transpose()?
        .unwrap_or_default();

    let needed = 2 * LENGTH_PREFIX + block_payload.len() + light_payload.len();
    if needed > SLOT_SIZE {
        return Err(RegionError::SlotOverflow { coord, needed });
    }

    let mut buf = Vec::with_capacity(needed);
    buf.extend_from_slice(&(block_payload.len() as i32).to_le_bytes());
    buf.extend_from_slice(&block_payload);
    buf.extend_from_slice(&(light_payload.len() as i32).to_le_bytes());
    buf.extend_from_slice(&light_payload);
    Ok(buf)
}

/// Decodes a slot image. A zero voxel length yields `Ok(None)`.
///
/// A damaged light payload is dropped (with a warning) so the column can be
/// re-lit; a damaged voxel payload is an error.
pub fn decode_slot(slot: &[u8]) -> Result<Option<StoredColumn>, RegionError> {
    let Some(block_len) = read_length(slot, 0)? else {
        return Ok(None);
    };
    if block_len == 0 {
        return Ok(None);
    }
    let block_start = LENGTH_PREFIX;
    let block_end = block_start + block_len;
    let voxels = rle::decode_voxels(&decompress(&slot[block_start..block_end])?)?;

    let light = match read_length(slot, block_end) {
        Ok(Some(light_len)) if light_len > 0 => {
            let start = block_end + LENGTH_PREFIX;
            match decompress(&slot[start..start + light_len])
                .and_then(|raw| rle::decode_light(&raw).map_err(RegionError::from))
            {
                Ok(field) => Some(field),
                Err(err) => {
                    tracing::warn!("discarding stored light: {err}");
                    None
                }
            }
        }
        Ok(_) => None,
        Err(err) => {
            tracing::warn!("discarding stored light: {err}");
            None
        }
    };

    Ok(Some(StoredColumn { voxels, light }))
}

/// Reads the length prefix at `offset` and checks that its payload fits.
///
/// Returns `Ok(None)` when the slot ends before the prefix.
fn read_length(slot: &[u8], offset: usize) -> Result<Option<usize>, RegionError> {
    let Some(bytes) = slot.get(offset..offset + LENGTH_PREFIX) else {
        return Ok(None);
    };
    let length = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if length < 0 || offset + LENGTH_PREFIX + length as usize > slot.len() {
        return Err(RegionError::BadLength { length });
    }
    Ok(Some(length as usize))
}

/// Directory of region files for one world.
#[derive(Debug, Clone)]
pub struct RegionStore {
    dir: PathBuf,
}

impl RegionStore {
    /// Uses `dir` as the region directory. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the region files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file storing `region`.
    pub fn region_path(&self, region: RegionCoord) -> PathBuf {
        self.dir
            .join(format!("region_{}_{}.{REGION_EXTENSION}", region.x, region.z))
    }

    /// Reads column `coord`. Missing files, short files and empty slots yield `Ok(None)`.
    pub fn load(&self, coord: ChunkCoord) -> Result<Option<StoredColumn>, RegionError> {
        let path = self.region_path(coord.region());
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(RegionError::Io { path, source }),
        };
        let offset = (coord.region_slot() * SLOT_SIZE) as u64;
        let io = |source| RegionError::Io {
            path: path.clone(),
            source,
        };
        let file_len = file.metadata().map_err(io)?.len();
        if file_len <= offset {
            return Ok(None);
        }
        file.seek(SeekFrom::Start(offset)).map_err(io)?;
        let mut slot = Vec::with_capacity(SLOT_SIZE);
        file.take(SLOT_SIZE as u64)
            .read_to_end(&mut slot)
            .map_err(io)?;
        decode_slot(&slot)
    }

    /// Writes column `coord`, replacing whatever its slot held.
    pub fn save(
        &self,
        coord: ChunkCoord,
        voxels: &VoxelGrid,
        light: Option<&LightField>,
    ) -> Result<(), RegionError> {
        let mut slot = encode_slot(coord, voxels, light)?;
        slot.resize(SLOT_SIZE, 0);

        let path = self.region_path(coord.region());
        let io = |source| RegionError::Io {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io)?;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io)?;
        file.seek(SeekFrom::Start((coord.region_slot() * SLOT_SIZE) as u64))
            .map_err(io)?;
        file.write_all(&slot).map_err(io)?;
        tracing::trace!(?coord, "saved column to {}", path.display());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};
    use crate::light_field::LightChannel;
    use crate::registry::BlockId;

    fn terrain() -> VoxelGrid {
        let mut grid = VoxelGrid::new_air();
        grid.fill_layers(0..24, BlockId(1));
        grid.set(2, 24, 2, BlockId(5));
        grid
    }

    fn lit(grid: &VoxelGrid) -> LightField {
        let mut field = LightField::new();
        for z in 0..CHUNK_SIZE_Z {
            for x in 0..CHUNK_SIZE_X {
                let top = grid.top_solid(x, z).map_or(0, |y| y as i32 + 1);
                for y in top..64 {
                    field.set(x, y, z, LightChannel::Sun, 15);
                }
            }
        }
        field.set(2, 25, 2, LightChannel::Red, 13);
        field
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::new(dir.path());
        let coord = ChunkCoord::new(-3, 40);
        let grid = terrain();
        let light = lit(&grid);

        store.save(coord, &grid, Some(&light)).unwrap();
        let loaded = store.load(coord).unwrap().expect("column should exist");
        assert_eq!(loaded.voxels, grid);
        assert_eq!(loaded.light, Some(light));
    }

    #[test]
    fn test_missing_file_and_empty_slot_are_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::new(dir.path());
        assert!(store.load(ChunkCoord::new(0, 0)).unwrap().is_none());

        // Same region, different slot: file exists but the slot is zeroed.
        store.save(ChunkCoord::new(5, 5), &terrain(), None).unwrap();
        assert!(store.load(ChunkCoord::new(4, 4)).unwrap().is_none());
        // Slot beyond the current end of file.
        assert!(store.load(ChunkCoord::new(31, 31)).unwrap().is_none());
    }

    #[test]
    fn test_voxels_without_light_load_as_partial() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::new(dir.path());
        let coord = ChunkCoord::new(1, 2);
        store.save(coord, &terrain(), None).unwrap();
        let loaded = store.load(coord).unwrap().unwrap();
        assert_eq!(loaded.voxels, terrain());
        assert!(loaded.light.is_none());
    }

    #[test]
    fn test_neighbouring_slots_do_not_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::new(dir.path());
        let a = ChunkCoord::new(0, 0);
        let b = ChunkCoord::new(1, 0);
        store.save(a, &VoxelGrid::new(BlockId(1)), None).unwrap();
        store.save(b, &VoxelGrid::new(BlockId(2)), None).unwrap();
        store.save(a, &VoxelGrid::new(BlockId(3)), None).unwrap();
        assert_eq!(store.load(a).unwrap().unwrap().voxels, VoxelGrid::new(BlockId(3)));
        assert_eq!(store.load(b).unwrap().unwrap().voxels, VoxelGrid::new(BlockId(2)));
    }

    /// Every voxel differs from its neighbours, so neither the run encoding
    /// nor gzip can shrink the column into one slot.
    fn fragmented() -> VoxelGrid {
        let mut grid = VoxelGrid::new_air();
        let mut state = 0x9E37_79B9u32;
        for z in 0..CHUNK_SIZE_Z {
            for y in 0..CHUNK_SIZE_Y {
                for x in 0..CHUNK_SIZE_X {
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    grid.set(x, y, z, BlockId(1 + (state % 200) as u16));
                }
            }
        }
        grid
    }

    #[test]
    fn test_fragmented_column_overflows_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::new(dir.path());
        let coord = ChunkCoord::new(2, -7);
        let err = store.save(coord, &fragmented(), None).unwrap_err();
        match err {
            RegionError::SlotOverflow { coord: failed, needed } => {
                assert_eq!(failed, coord);
                assert!(needed > SLOT_SIZE);
            }
            other => panic!("unexpected error {other}"),
        }
        // Nothing was written for the rejected column.
        assert!(store.load(coord).unwrap().is_none());
    }

    #[test]
    fn test_light_that_does_not_fit_overflows() {
        let grid = terrain();
        let mut light = LightField::new();
        let mut state = 0x1234_5678u32;
        for z in 0..CHUNK_SIZE_Z {
            for y in 0..CHUNK_SIZE_Y as i32 {
                for x in 0..CHUNK_SIZE_X {
                    for channel in LightChannel::ALL {
                        state ^= state << 13;
                        state ^= state >> 17;
                        state ^= state << 5;
                        light.set(x, y, z, channel, (state % 16) as u8);
                    }
                }
            }
        }
        let coord = ChunkCoord::new(0, 0);
        assert!(matches!(
            encode_slot(coord, &grid, Some(&light)),
            Err(RegionError::SlotOverflow { .. })
        ));
        assert!(encode_slot(coord, &grid, None).is_ok());
    }

    #[test]
    fn test_region_file_naming() {
        let store = RegionStore::new("/tmp/w");
        let path = store.region_path(ChunkCoord::new(-1, 33).region());
        assert!(path.ends_with("region_-1_1.umr"));
    }

    #[test]
    fn test_corrupt_voxel_payload_is_reported() {
        let mut slot = encode_slot(ChunkCoord::new(0, 0), &terrain(), None).unwrap();
        // First byte of the gzip magic number.
        slot[4] ^= 0xFF;
        let err = decode_slot(&slot).unwrap_err();
        assert!(err.is_corrupt(), "unexpected error {err}");
    }

    #[test]
    fn test_bad_length_prefix_is_corrupt() {
        let mut slot = vec![0u8; SLOT_SIZE];
        slot[..4].copy_from_slice(&5000i32.to_le_bytes());
        let err = decode_slot(&slot).unwrap_err();
        assert!(matches!(err, RegionError::BadLength { length: 5000 }));
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_corrupt_light_is_dropped_not_fatal() {
        let grid = terrain();
        let mut slot = encode_slot(ChunkCoord::new(0, 0), &grid, Some(&lit(&grid))).unwrap();
        let block_len = i32::from_le_bytes([slot[0], slot[1], slot[2], slot[3]]) as usize;
        slot[block_len + 2 * LENGTH_PREFIX] ^= 0xFF;
        let column = decode_slot(&slot).unwrap().unwrap();
        assert_eq!(column.voxels, grid);
        assert!(column.light.is_none());
    }

    #[test]
    fn test_compress_roundtrip() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 7) as u8).collect();
        let packed = compress(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(decompress(&packed).unwrap(), data);
        assert!(decompress(b"not gzip").is_err());
    }
}
