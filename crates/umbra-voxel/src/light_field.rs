//! Four-channel per-voxel light storage.
//!
//! Each cell packs four 4-bit levels into a `u16`: red in bits 0–3, green in
//! 4–7, blue in 8–11 and sun in 12–15. The field is one layer taller than the
//! voxel grid; the extra top layer holds the incoming sky light.

use serde::{Deserialize, Serialize};

use crate::grid::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};

/// Height of the light field, including the sky layer.
pub const LIGHT_SIZE_Y: usize = CHUNK_SIZE_Y + 1;

/// Total number of cells in a light field.
pub const LIGHT_VOLUME: usize = CHUNK_SIZE_X * LIGHT_SIZE_Y * CHUNK_SIZE_Z;

/// Maximum level on any channel.
pub const MAX_LIGHT: u8 = 15;

/// One of the four independent light planes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightChannel {
    /// Red block light.
    Red = 0,
    /// Green block light.
    Green = 1,
    /// Blue block light.
    Blue = 2,
    /// Skylight.
    Sun = 3,
}

impl LightChannel {
    /// All channels in id order.
    pub const ALL: [LightChannel; 4] = [
        LightChannel::Red,
        LightChannel::Green,
        LightChannel::Blue,
        LightChannel::Sun,
    ];

    /// Numeric channel id (0 = R, 1 = G, 2 = B, 3 = Sun).
    pub fn index(self) -> usize {
        self as usize
    }

    fn shift(self) -> u16 {
        (self as u16) * 4
    }
}

/// Four packed 4-bit light levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PackedLight(pub u16);

impl PackedLight {
    /// Sun at full strength, colour channels dark.
    pub const SKY: PackedLight = PackedLight((MAX_LIGHT as u16) << 12);

    /// Returns the level on `channel` (0–15).
    pub fn get(self, channel: LightChannel) -> u8 {
        ((self.0 >> channel.shift()) & 0xF) as u8
    }

    /// Returns a copy with `channel` set to `level` (0–15).
    pub fn with(self, channel: LightChannel, level: u8) -> Self {
        debug_assert!(level <= MAX_LIGHT, "light level {level} out of range");
        let shift = channel.shift();
        let cleared = self.0 & !(0xF << shift);
        PackedLight(cleared | (u16::from(level & 0xF) << shift))
    }
}

/// Light for one column: `16 × 65 × 16` packed cells, indexed `x + y*SX + z*SX*(SY+1)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightField {
    cells: Box<[PackedLight]>,
}

impl LightField {
    /// Creates an unlit field: everything dark except the sky layer, which holds full sun.
    pub fn new() -> Self {
        let mut field = Self {
            cells: vec![PackedLight(0); LIGHT_VOLUME].into_boxed_slice(),
        };
        for z in 0..CHUNK_SIZE_Z {
            for x in 0..CHUNK_SIZE_X {
                let i = Self::linear_index(x, CHUNK_SIZE_Y, z);
                field.cells[i] = PackedLight::SKY;
            }
        }
        field
    }

    /// Builds a field from raw packed cells in canonical index order.
    ///
    /// Returns `None` unless `cells.len() == LIGHT_VOLUME`.
    pub fn from_vec(cells: Vec<PackedLight>) -> Option<Self> {
        (cells.len() == LIGHT_VOLUME).then(|| Self {
            cells: cells.into_boxed_slice(),
        })
    }

    /// Level of `channel` at local `(x, y, z)`.
    ///
    /// X/Z must be in range. Y outside the field yields the documented
    /// defaults: 0 below the floor, and above the sky layer 0xF for sun and 0
    /// for colour channels.
    pub fn get(&self, x: usize, y: i32, z: usize, channel: LightChannel) -> u8 {
        if y < 0 {
            return 0;
        }
        if y as usize >= LIGHT_SIZE_Y {
            return if channel == LightChannel::Sun { MAX_LIGHT } else { 0 };
        }
        self.cells[Self::linear_index(x, y as usize, z)].get(channel)
    }

    /// Sets `channel` at local `(x, y, z)`. Writes outside the field are dropped.
    pub fn set(&mut self, x: usize, y: i32, z: usize, channel: LightChannel, level: u8) {
        if y < 0 || y as usize >= LIGHT_SIZE_Y {
            return;
        }
        let i = Self::linear_index(x, y as usize, z);
        self.cells[i] = self.cells[i].with(channel, level);
    }

    /// The packed cell at local `(x, y, z)`; `y` may address the sky layer.
    pub fn packed(&self, x: usize, y: usize, z: usize) -> PackedLight {
        self.cells[Self::linear_index(x, y, z)]
    }

    /// The flat packed array in canonical index order.
    pub fn as_slice(&self) -> &[PackedLight] {
        &self.cells
    }

    /// Converts local `(x, y, z)` to a linear index; `y` ranges over `0..=CHUNK_SIZE_Y`.
    pub fn linear_index(x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < CHUNK_SIZE_X && y < LIGHT_SIZE_Y && z < CHUNK_SIZE_Z);
        x + y * CHUNK_SIZE_X + z * CHUNK_SIZE_X * LIGHT_SIZE_Y
    }
}

impl Default for LightField {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_are_independent() {
        let mut light = PackedLight(0);
        light = light.with(LightChannel::Red, 3);
        light = light.with(LightChannel::Green, 7);
        light = light.with(LightChannel::Blue, 11);
        light = light.with(LightChannel::Sun, 15);
        assert_eq!(light.get(LightChannel::Red), 3);
        assert_eq!(light.get(LightChannel::Green), 7);
        assert_eq!(light.get(LightChannel::Blue), 11);
        assert_eq!(light.get(LightChannel::Sun), 15);
        assert_eq!(light.0, 0xFB73);

        light = light.with(LightChannel::Green, 0);
        assert_eq!(light.get(LightChannel::Green), 0);
        assert_eq!(light.get(LightChannel::Blue), 11);
    }

    #[test]
    fn test_new_field_has_sky_layer() {
        let field = LightField::new();
        let top = CHUNK_SIZE_Y as i32;
        assert_eq!(field.get(0, top, 0, LightChannel::Sun), 15);
        assert_eq!(field.get(15, top, 15, LightChannel::Red), 0);
        assert_eq!(field.get(5, top - 1, 5, LightChannel::Sun), 0);
    }

    #[test]
    fn test_out_of_range_defaults() {
        let field = LightField::new();
        assert_eq!(field.get(3, -1, 3, LightChannel::Sun), 0);
        assert_eq!(field.get(3, -1, 3, LightChannel::Red), 0);
        assert_eq!(field.get(3, 500, 3, LightChannel::Sun), 15);
        assert_eq!(field.get(3, 500, 3, LightChannel::Blue), 0);
    }

    #[test]
    fn test_set_outside_is_dropped() {
        let mut field = LightField::new();
        field.set(0, -1, 0, LightChannel::Red, 9);
        field.set(0, 900, 0, LightChannel::Red, 9);
        assert_eq!(field, LightField::new());
    }

    #[test]
    fn test_set_get_roundtrip_all_channels() {
        let mut field = LightField::new();
        for channel in LightChannel::ALL {
            field.set(8, 30, 2, channel, channel.index() as u8 + 4);
        }
        for channel in LightChannel::ALL {
            assert_eq!(field.get(8, 30, 2, channel), channel.index() as u8 + 4);
        }
        assert_eq!(field.get(8, 31, 2, LightChannel::Red), 0);
    }
}
