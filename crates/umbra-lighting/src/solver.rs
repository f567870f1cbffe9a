//! Incremental flood-fill light propagation for one channel.
//!
//! A [`LightSolver`] owns an add queue and a remove queue. `add` and `remove`
//! write the seed voxel immediately and defer neighbour propagation to
//! [`LightSolver::solve`], which drains the remove queue completely before the
//! add queue: darkening can uncover neighbours lit by an independent source,
//! and those are re-seeded into the add queue.

use std::collections::VecDeque;

use glam::IVec3;
use umbra_voxel::{LightChannel, MAX_LIGHT};

/// World access needed by the solver. Implemented by the chunk store.
///
/// Positions are world coordinates. Reads outside resident data return the
/// documented light defaults, `is_light_passing` returns `false`, and writes
/// are dropped.
pub trait LightAccess {
    /// Light level of `channel` at `pos`.
    fn light(&self, pos: IVec3, channel: LightChannel) -> u8;
    /// Stores `level` for `channel` at `pos`.
    fn set_light(&mut self, pos: IVec3, channel: LightChannel, level: u8);
    /// Whether the block at `pos` lets light through.
    fn is_light_passing(&self, pos: IVec3) -> bool;
    /// Light emitted by the block at `pos` on `channel`.
    fn emission(&self, pos: IVec3, channel: LightChannel) -> u8;
}

/// The six axis-aligned neighbour offsets.
pub const NEIGHBORS_6: [IVec3; 6] = [
    IVec3::X,
    IVec3::NEG_X,
    IVec3::Y,
    IVec3::NEG_Y,
    IVec3::Z,
    IVec3::NEG_Z,
];

/// Light propagation queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LightNode {
    pos: IVec3,
    level: u8,
}

/// Number of queue entries processed by one [`LightSolver::solve`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Entries drained from the remove queue.
    pub removed: usize,
    /// Entries drained from the add queue.
    pub added: usize,
}

/// Flood-fill state for one light channel.
#[derive(Debug)]
pub struct LightSolver {
    channel: LightChannel,
    add_queue: VecDeque<LightNode>,
    remove_queue: VecDeque<LightNode>,
}

impl LightSolver {
    /// Creates a solver with empty queues for `channel`.
    pub fn new(channel: LightChannel) -> Self {
        Self {
            channel,
            add_queue: VecDeque::new(),
            remove_queue: VecDeque::new(),
        }
    }

    /// The channel this solver propagates.
    pub fn channel(&self) -> LightChannel {
        self.channel
    }

    /// Whether both queues are empty.
    pub fn is_idle(&self) -> bool {
        self.add_queue.is_empty() && self.remove_queue.is_empty()
    }

    /// Writes `level` at `pos` and queues it for spreading.
    ///
    /// Levels below 2 cannot reach any neighbour and are ignored.
    pub fn add(&mut self, access: &mut impl LightAccess, pos: IVec3, level: u8) {
        if level < 2 {
            return;
        }
        let level = level.min(MAX_LIGHT);
        access.set_light(pos, self.channel, level);
        self.add_queue.push_back(LightNode { pos, level });
    }

    /// Queues the light already stored at `pos` for spreading.
    pub fn add_current(&mut self, access: &mut impl LightAccess, pos: IVec3) {
        let level = access.light(pos, self.channel);
        self.add(access, pos, level);
    }

    /// Zeroes the light at `pos` and queues its old value for retraction.
    pub fn remove(&mut self, access: &mut impl LightAccess, pos: IVec3) {
        let level = access.light(pos, self.channel);
        if level == 0 {
            return;
        }
        access.set_light(pos, self.channel, 0);
        self.remove_queue.push_back(LightNode { pos, level });
    }

    /// Seeds full sunlight straight down from `top` to the first opaque block.
    pub fn seed_sun_column(&mut self, access: &mut impl LightAccess, top: IVec3) {
        debug_assert_eq!(self.channel, LightChannel::Sun);
        let mut pos = top;
        while pos.y >= 0 && access.is_light_passing(pos) {
            self.add(access, pos, MAX_LIGHT);
            pos.y -= 1;
        }
    }

    /// Retracts the full-sun column hanging below `below`, down to the first
    /// voxel that is opaque or not at full sun.
    pub fn shade_sun_column(&mut self, access: &mut impl LightAccess, below: IVec3) {
        debug_assert_eq!(self.channel, LightChannel::Sun);
        let mut pos = below;
        while pos.y >= 0
            && access.is_light_passing(pos)
            && access.light(pos, self.channel) == MAX_LIGHT
        {
            self.remove(access, pos);
            pos.y -= 1;
        }
    }

    /// Reacts to the voxel at `pos` becoming light-passing: if the voxel above
    /// holds full sun, the column from `pos` downward is seeded with full sun.
    pub fn open_to_sky(&mut self, access: &mut impl LightAccess, pos: IVec3) {
        if access.light(pos + IVec3::Y, self.channel) == MAX_LIGHT {
            self.seed_sun_column(access, pos);
        }
    }

    /// Drains the remove queue, then the add queue, until the field reaches a fixed point.
    pub fn solve(&mut self, access: &mut impl LightAccess) -> SolveStats {
        let mut stats = SolveStats::default();
        let channel = self.channel;

        while let Some(node) = self.remove_queue.pop_front() {
            stats.removed += 1;
            for offset in NEIGHBORS_6 {
                let neighbor = node.pos + offset;
                let level = access.light(neighbor, channel);
                if level == 0 {
                    continue;
                }
                let emitted = access.emission(neighbor, channel);
                if level + 1 == node.level && emitted < level {
                    access.set_light(neighbor, channel, 0);
                    self.remove_queue.push_back(LightNode {
                        pos: neighbor,
                        level,
                    });
                    if emitted >= 2 {
                        access.set_light(neighbor, channel, emitted);
                        self.add_queue.push_back(LightNode {
                            pos: neighbor,
                            level: emitted,
                        });
                    }
                } else if level >= node.level || emitted > 0 {
                    self.add_queue.push_back(LightNode {
                        pos: neighbor,
                        level,
                    });
                }
            }
        }

        while let Some(node) = self.add_queue.pop_front() {
            stats.added += 1;
            // A later removal may have darkened this voxel since it was queued.
            let level = node.level.min(access.light(node.pos, channel));
            if level < 2 {
                continue;
            }
            let next = level - 1;
            for offset in NEIGHBORS_6 {
                let neighbor = node.pos + offset;
                if !access.is_light_passing(neighbor) {
                    continue;
                }
                if access.light(neighbor, channel) < next {
                    access.set_light(neighbor, channel, next);
                    self.add_queue.push_back(LightNode {
                        pos: neighbor,
                        level: next,
                    });
                }
            }
        }

        if stats.removed + stats.added > 0 {
            tracing::trace!(?channel, removed = stats.removed, added = stats.added, "light solved");
        }
        stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SX: i32 = 40;
    const SY: i32 = 32;
    const SZ: i32 = 32;

    /// Bounded test world: everything outside the box is opaque and dark.
    struct BoxWorld {
        opaque: Vec<bool>,
        emission: Vec<[u8; 4]>,
        light: Vec<[u8; 4]>,
    }

    impl BoxWorld {
        fn open() -> Self {
            let n = (SX * SY * SZ) as usize;
            Self {
                opaque: vec![false; n],
                emission: vec![[0; 4]; n],
                light: vec![[0; 4]; n],
            }
        }

        fn index(pos: IVec3) -> Option<usize> {
            let inside = (0..SX).contains(&pos.x)
                && (0..SY).contains(&pos.y)
                && (0..SZ).contains(&pos.z);
            inside.then(|| (pos.x + pos.y * SX + pos.z * SX * SY) as usize)
        }

        fn set_opaque(&mut self, pos: IVec3) {
            let i = Self::index(pos).unwrap();
            self.opaque[i] = true;
        }

        fn positions() -> impl Iterator<Item = IVec3> {
            (0..SZ).flat_map(|z| {
                (0..SY).flat_map(move |y| (0..SX).map(move |x| IVec3::new(x, y, z)))
            })
        }
    }

    impl LightAccess for BoxWorld {
        fn light(&self, pos: IVec3, channel: LightChannel) -> u8 {
            Self::index(pos).map_or(0, |i| self.light[i][channel.index()])
        }

        fn set_light(&mut self, pos: IVec3, channel: LightChannel, level: u8) {
            if let Some(i) = Self::index(pos) {
                self.light[i][channel.index()] = level;
            }
        }

        fn is_light_passing(&self, pos: IVec3) -> bool {
            Self::index(pos).is_some_and(|i| !self.opaque[i])
        }

        fn emission(&self, pos: IVec3, channel: LightChannel) -> u8 {
            Self::index(pos).map_or(0, |i| self.emission[i][channel.index()])
        }
    }

    fn manhattan(a: IVec3, b: IVec3) -> i32 {
        let d = (a - b).abs();
        d.x + d.y + d.z
    }

    fn place_source(world: &mut BoxWorld, solver: &mut LightSolver, pos: IVec3, level: u8) {
        let i = BoxWorld::index(pos).unwrap();
        world.emission[i][solver.channel().index()] = level;
        solver.add(world, pos, level);
    }

    #[test]
    fn test_light_decays_with_distance() {
        let mut world = BoxWorld::open();
        let mut solver = LightSolver::new(LightChannel::Red);
        let source = IVec3::new(16, 16, 16);
        solver.add(&mut world, source, 15);
        solver.solve(&mut world);

        assert_eq!(world.light(source, LightChannel::Red), 15);
        assert_eq!(world.light(IVec3::new(17, 16, 16), LightChannel::Red), 14);
        assert_eq!(world.light(IVec3::new(21, 16, 16), LightChannel::Red), 10);
        assert_eq!(world.light(IVec3::new(31, 16, 16), LightChannel::Red), 0);
        assert_eq!(world.light(source, LightChannel::Green), 0);
    }

    #[test]
    fn test_low_levels_are_ignored() {
        let mut world = BoxWorld::open();
        let mut solver = LightSolver::new(LightChannel::Blue);
        solver.add(&mut world, IVec3::new(3, 3, 3), 1);
        assert!(solver.is_idle());
        assert_eq!(world.light(IVec3::new(3, 3, 3), LightChannel::Blue), 0);

        solver.remove(&mut world, IVec3::new(3, 3, 3));
        assert!(solver.is_idle());
    }

    #[test]
    fn test_opaque_wall_casts_shadow() {
        let mut world = BoxWorld::open();
        for y in 0..SY {
            for z in 0..SZ {
                world.set_opaque(IVec3::new(18, y, z));
            }
        }
        let mut solver = LightSolver::new(LightChannel::Green);
        solver.add(&mut world, IVec3::new(16, 16, 16), 15);
        solver.solve(&mut world);

        assert_eq!(world.light(IVec3::new(17, 16, 16), LightChannel::Green), 14);
        assert_eq!(world.light(IVec3::new(18, 16, 16), LightChannel::Green), 0);
        assert_eq!(world.light(IVec3::new(19, 16, 16), LightChannel::Green), 0);
    }

    #[test]
    fn test_monotonic_and_bounded_after_solve() {
        let mut world = BoxWorld::open();
        for y in 4..20 {
            world.set_opaque(IVec3::new(10, y, 10));
            world.set_opaque(IVec3::new(11, y, 10));
        }
        let mut solver = LightSolver::new(LightChannel::Red);
        let sources = [(IVec3::new(8, 10, 10), 15u8), (IVec3::new(14, 12, 9), 9)];
        for (pos, level) in sources {
            place_source(&mut world, &mut solver, pos, level);
        }
        solver.solve(&mut world);

        for pos in BoxWorld::positions() {
            if !world.is_light_passing(pos) {
                continue;
            }
            let here = world.light(pos, LightChannel::Red);
            for offset in NEIGHBORS_6 {
                let n = pos + offset;
                if world.is_light_passing(n) {
                    let there = world.light(n, LightChannel::Red);
                    assert!(
                        i32::from(here) >= i32::from(there) - 1,
                        "{pos} has {here} next to {n} with {there}"
                    );
                }
            }
            let reachable = sources
                .iter()
                .map(|&(src, level)| i32::from(level) - manhattan(pos, src))
                .max()
                .unwrap_or(0)
                .max(0);
            assert!(i32::from(here) <= reachable, "{pos} too bright: {here}");
        }
    }

    #[test]
    fn test_second_solve_is_idempotent() {
        let mut world = BoxWorld::open();
        let mut solver = LightSolver::new(LightChannel::Sun);
        solver.add(&mut world, IVec3::new(5, 5, 5), 12);
        solver.add(&mut world, IVec3::new(9, 7, 5), 15);
        solver.solve(&mut world);
        let snapshot = world.light.clone();

        let stats = solver.solve(&mut world);
        assert_eq!(stats, SolveStats::default());
        assert_eq!(world.light, snapshot);
    }

    #[test]
    fn test_removal_darkens_reach_and_spares_independent_source() {
        let mut world = BoxWorld::open();
        let mut solver = LightSolver::new(LightChannel::Blue);
        let a = IVec3::new(8, 16, 16);
        let b = IVec3::new(28, 16, 16);
        place_source(&mut world, &mut solver, a, 13);
        place_source(&mut world, &mut solver, b, 13);
        solver.solve(&mut world);
        assert_eq!(world.light(IVec3::new(12, 16, 16), LightChannel::Blue), 9);

        let i = BoxWorld::index(a).unwrap();
        world.emission[i] = [0; 4];
        solver.remove(&mut world, a);
        solver.solve(&mut world);

        for pos in BoxWorld::positions() {
            let expected = (13 - manhattan(pos, b)).max(0) as u8;
            assert_eq!(
                world.light(pos, LightChannel::Blue),
                expected,
                "wrong light at {pos}"
            );
        }
    }

    #[test]
    fn test_removal_reseeds_brighter_neighbor() {
        let mut world = BoxWorld::open();
        let mut solver = LightSolver::new(LightChannel::Red);
        let weak = IVec3::new(10, 10, 10);
        let strong = IVec3::new(12, 10, 10);
        place_source(&mut world, &mut solver, weak, 6);
        place_source(&mut world, &mut solver, strong, 14);
        solver.solve(&mut world);

        let i = BoxWorld::index(weak).unwrap();
        world.emission[i] = [0; 4];
        solver.remove(&mut world, weak);
        solver.solve(&mut world);

        assert_eq!(world.light(weak, LightChannel::Red), 12);
        assert_eq!(world.light(IVec3::new(9, 10, 10), LightChannel::Red), 11);
    }

    #[test]
    fn test_neighbor_emitter_survives_removal() {
        let mut world = BoxWorld::open();
        let mut solver = LightSolver::new(LightChannel::Green);
        let big = IVec3::new(10, 10, 10);
        let small = IVec3::new(11, 10, 10);
        place_source(&mut world, &mut solver, big, 10);
        place_source(&mut world, &mut solver, small, 9);
        solver.solve(&mut world);

        let i = BoxWorld::index(big).unwrap();
        world.emission[i] = [0; 4];
        solver.remove(&mut world, big);
        solver.solve(&mut world);

        assert_eq!(world.light(small, LightChannel::Green), 9);
        assert_eq!(world.light(big, LightChannel::Green), 8);
        assert_eq!(world.light(IVec3::new(13, 10, 10), LightChannel::Green), 7);
    }

    #[test]
    fn test_sun_column_seeds_down_to_first_opaque() {
        let mut world = BoxWorld::open();
        world.set_opaque(IVec3::new(4, 3, 4));
        let mut solver = LightSolver::new(LightChannel::Sun);
        solver.seed_sun_column(&mut world, IVec3::new(4, SY - 1, 4));
        solver.solve(&mut world);

        for y in 4..SY {
            assert_eq!(world.light(IVec3::new(4, y, 4), LightChannel::Sun), 15);
        }
        assert_eq!(world.light(IVec3::new(4, 3, 4), LightChannel::Sun), 0);
        assert_eq!(world.light(IVec3::new(5, 10, 4), LightChannel::Sun), 14);
    }

    #[test]
    fn test_shade_sun_column_retracts_full_sun() {
        let mut world = BoxWorld::open();
        // One-voxel shaft walled in on all four sides.
        for y in 0..SY {
            for wall in [IVec3::new(5, y, 6), IVec3::new(7, y, 6), IVec3::new(6, y, 5), IVec3::new(6, y, 7)] {
                world.set_opaque(wall);
            }
        }
        let mut solver = LightSolver::new(LightChannel::Sun);
        solver.seed_sun_column(&mut world, IVec3::new(6, SY - 1, 6));
        solver.solve(&mut world);
        assert_eq!(world.light(IVec3::new(6, 0, 6), LightChannel::Sun), 15);

        // Roof the shaft at y = 20.
        world.set_opaque(IVec3::new(6, 20, 6));
        solver.remove(&mut world, IVec3::new(6, 20, 6));
        solver.shade_sun_column(&mut world, IVec3::new(6, 19, 6));
        solver.solve(&mut world);

        for y in 0..=20 {
            assert_eq!(world.light(IVec3::new(6, y, 6), LightChannel::Sun), 0);
        }
        for y in 21..SY {
            assert_eq!(world.light(IVec3::new(6, y, 6), LightChannel::Sun), 15);
        }
    }

    #[test]
    fn test_open_to_sky_requires_full_sun_above() {
        let mut world = BoxWorld::open();
        let mut solver = LightSolver::new(LightChannel::Sun);
        solver.open_to_sky(&mut world, IVec3::new(3, 10, 3));
        assert!(solver.is_idle());

        world.set_light(IVec3::new(3, 11, 3), LightChannel::Sun, 15);
        solver.open_to_sky(&mut world, IVec3::new(3, 10, 3));
        solver.solve(&mut world);
        for y in 0..=10 {
            assert_eq!(world.light(IVec3::new(3, y, 3), LightChannel::Sun), 15);
        }
    }
}
