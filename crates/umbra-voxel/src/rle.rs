//! Run-length encoding of voxel and light arrays into region byte streams.
//!
//! Voxel runs are `(block_id: i32 LE, count: i32 LE)`; light runs are
//! `(packed: u16 LE, count: i32 LE)`. Runs are emitted in canonical index
//! order and must sum to exactly the expected element count on decode.

use crate::grid::{CHUNK_VOLUME, VoxelGrid};
use crate::light_field::{LIGHT_VOLUME, LightField, PackedLight};
use crate::registry::BlockId;

/// A single run: `count` consecutive occurrences of `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RleRun<T> {
    /// The repeated value.
    pub value: T,
    /// Number of consecutive identical values (≥ 1).
    pub count: u32,
}

/// Errors that can occur during RLE decoding.
#[derive(Debug, thiserror::Error)]
pub enum RleError {
    /// Decoded length does not match the expected element count.
    #[error("RLE length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Expected number of elements.
        expected: usize,
        /// Number of elements the runs add up to.
        actual: usize,
    },
    /// The byte stream ends in the middle of a run record.
    #[error("RLE stream has {0} trailing bytes")]
    TrailingBytes(usize),
    /// A run carries a zero or negative count.
    #[error("RLE run with invalid count {0}")]
    InvalidCount(i32),
    /// A voxel run carries a block id outside the `u16` id space.
    #[error("RLE run with invalid block id {0}")]
    InvalidBlockId(i32),
}

/// Collapses `values` into runs of identical elements.
pub fn rle_encode<T: Copy + PartialEq>(values: &[T]) -> Vec<RleRun<T>> {
    let mut runs: Vec<RleRun<T>> = Vec::new();
    for &value in values {
        match runs.last_mut() {
            Some(run) if run.value == value => run.count += 1,
            _ => runs.push(RleRun { value, count: 1 }),
        }
    }
    runs
}

/// Expands runs back into a flat array of exactly `expected_len` elements.
pub fn rle_decode<T: Copy>(runs: &[RleRun<T>], expected_len: usize) -> Result<Vec<T>, RleError> {
    let actual: usize = runs.iter().map(|run| run.count as usize).sum();
    if actual != expected_len {
        return Err(RleError::LengthMismatch {
            expected: expected_len,
            actual,
        });
    }
    let mut result = Vec::with_capacity(expected_len);
    for run in runs {
        result.extend(std::iter::repeat_n(run.value, run.count as usize));
    }
    Ok(result)
}

// ---------------------------------------------------------------------------
// Voxel streams
// ---------------------------------------------------------------------------

const VOXEL_RUN_BYTES: usize = 8;
const LIGHT_RUN_BYTES: usize = 6;

/// Encodes a grid to its raw (uncompressed) run stream.
pub fn encode_voxels(grid: &VoxelGrid) -> Vec<u8> {
    let runs = rle_encode(grid.as_slice());
    let mut buf = Vec::with_capacity(runs.len() * VOXEL_RUN_BYTES);
    for run in runs {
        buf.extend_from_slice(&i32::from(run.value.0).to_le_bytes());
        buf.extend_from_slice(&(run.count as i32).to_le_bytes());
    }
    buf
}

/// Decodes a raw run stream produced by [`encode_voxels`].
pub fn decode_voxels(data: &[u8]) -> Result<VoxelGrid, RleError> {
    let records = data.chunks_exact(VOXEL_RUN_BYTES);
    if !records.remainder().is_empty() {
        return Err(RleError::TrailingBytes(records.remainder().len()));
    }
    let mut runs = Vec::with_capacity(data.len() / VOXEL_RUN_BYTES);
    for record in records {
        let id = i32::from_le_bytes([record[0], record[1], record[2], record[3]]);
        let count = i32::from_le_bytes([record[4], record[5], record[6], record[7]]);
        let value = u16::try_from(id).map_err(|_| RleError::InvalidBlockId(id))?;
        runs.push(RleRun {
            value: BlockId(value),
            count: run_count(count)?,
        });
    }
    let blocks = rle_decode(&runs, CHUNK_VOLUME)?;
    // Length was checked by rle_decode.
    VoxelGrid::from_vec(blocks).ok_or(RleError::LengthMismatch {
        expected: CHUNK_VOLUME,
        actual: 0,
    })
}

// ---------------------------------------------------------------------------
// Light streams
// ---------------------------------------------------------------------------

/// Encodes a light field to its raw (uncompressed) run stream.
pub fn encode_light(field: &LightField) -> Vec<u8> {
    let runs = rle_encode(field.as_slice());
    let mut buf = Vec::with_capacity(runs.len() * LIGHT_RUN_BYTES);
    for run in runs {
        buf.extend_from_slice(&run.value.0.to_le_bytes());
        buf.extend_from_slice(&(run.count as i32).to_le_bytes());
    }
    buf
}

/// Decodes a raw run stream produced by [`encode_light`].
pub fn decode_light(data: &[u8]) -> Result<LightField, RleError> {
    let records = data.chunks_exact(LIGHT_RUN_BYTES);
    if !records.remainder().is_empty() {
        return Err(RleError::TrailingBytes(records.remainder().len()));
    }
    let mut runs = Vec::with_capacity(data.len() / LIGHT_RUN_BYTES);
    for record in records {
        let packed = u16::from_le_bytes([record[0], record[1]]);
        let count = i32::from_le_bytes([record[2], record[3], record[4], record[5]]);
        runs.push(RleRun {
            value: PackedLight(packed),
            count: run_count(count)?,
        });
    }
    let cells = rle_decode(&runs, LIGHT_VOLUME)?;
    LightField::from_vec(cells).ok_or(RleError::LengthMismatch {
        expected: LIGHT_VOLUME,
        actual: 0,
    })
}

fn run_count(count: i32) -> Result<u32, RleError> {
    if count <= 0 {
        return Err(RleError::InvalidCount(count));
    }
    Ok(count as u32)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
