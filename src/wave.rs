//! Wave/level director: decides what the next level contains and moves the
//! formation as a single unit.

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use rand::Rng;

use crate::entities::{Boss, Enemy, GameEvent, GameState, ShieldBlock, Vec2, ENEMY_WIDTH};

pub const MAX_ROWS: usize = 6;
pub const MAX_COLS: usize = 12;

const MARGIN_X: f32 = 80.0;
const TOP_Y: f32 = 80.0;
const ROW_PITCH: f32 = 60.0;
/// Gap kept between the formation's outer edge and the side wall.
const WALL_GAP: f32 = 20.0;

const ENEMY_BASE_SPEED: f32 = 40.0;
const ENEMY_SPEED_PER_LEVEL: f32 = 8.0;

const ENEMY_FIRE_CHANCE: f32 = 0.0025;
const ENEMY_FIRE_PER_LEVEL: f32 = 0.05;
const VOLLEYS_PER_SECOND: f32 = 5.0;
const ROW_FIRE_BONUS: f32 = 0.0025;

const BOSS_Y: f32 = 140.0;
const BOSS_BASE_HP: u32 = 20;
const BOSS_HP_PER_APPEARANCE: u32 = 10;
const BOSS_BASE_SPEED: f32 = 80.0;
const BOSS_SPEED_PER_LEVEL: f32 = 10.0;

const SHIELD_CLUSTERS: usize = 4;
const SHIELD_PITCH: f32 = 16.0;
/// Distance of the top shield row above the bottom edge.
const SHIELD_OFFSET: f32 = 180.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Formation,
    Boss,
}

#[derive(Clone, Debug)]
pub struct WaveDirector {
    pub level: u32,
    pub stage: Stage,
    /// Formation sweep direction, +1.0 right or -1.0 left.
    pub direction: f32,
    /// Formation horizontal speed, units per second.
    pub speed: f32,
    boss_interval: u32,
}

impl WaveDirector {
    pub fn new(boss_interval: u32) -> Self {
        Self {
            level: 1,
            stage: Stage::Formation,
            direction: 1.0,
            speed: formation_speed(1),
            boss_interval: boss_interval.max(1),
        }
    }

    pub fn boss_interval(&self) -> u32 {
        self.boss_interval
    }

    pub fn is_boss_level(&self, level: u32) -> bool {
        level % self.boss_interval == 0
    }

    /// Move every living enemy one step in lock-step. When the leading edge
    /// of the whole group would cross a wall, the group drops by
    /// `drop_amount` and reverses instead of moving sideways.
    pub fn sweep(&mut self, enemies: &mut [Enemy], dt: f32, width: f32, drop_amount: f32) {
        let Some((min_x, max_x)) = horizontal_extent(enemies) else {
            return;
        };
        let step = self.direction * self.speed * dt;
        let half = ENEMY_WIDTH / 2.0;
        let hits_wall = if self.direction > 0.0 {
            max_x + half + step > width - WALL_GAP
        } else {
            min_x - half + step < WALL_GAP
        };

        if hits_wall {
            for e in enemies.iter_mut().filter(|e| !e.dead) {
                e.pos.y += drop_amount;
                e.base_y += drop_amount;
            }
            self.direction = -self.direction;
        } else {
            for e in enemies.iter_mut().filter(|e| !e.dead) {
                e.pos.x += step;
            }
        }
    }
}

fn horizontal_extent(enemies: &[Enemy]) -> Option<(f32, f32)> {
    enemies
        .iter()
        .filter(|e| !e.dead)
        .fold(None, |acc, e| match acc {
            None => Some((e.pos.x, e.pos.x)),
            Some((lo, hi)) => Some((lo.min(e.pos.x), hi.max(e.pos.x))),
        })
}

// ── Difficulty tables ────────────────────────────────────────────────────────

/// Formation rows and columns for `level`; non-decreasing and capped.
pub fn grid_size(level: u32) -> (usize, usize) {
    let level = level as usize;
    let rows = (3 + level / 2).min(MAX_ROWS);
    let cols = (10 + level / 4).min(MAX_COLS);
    (rows, cols)
}

pub fn formation_speed(level: u32) -> f32 {
    ENEMY_BASE_SPEED + level.saturating_sub(1) as f32 * ENEMY_SPEED_PER_LEVEL
}

/// Per-second chance that a front-line enemy in `row` opens fire. Derived
/// from a per-volley chance rolled every 0.2 s; lower rows add a little.
pub fn fire_probability(level: u32, row: usize) -> f32 {
    let per_volley = ENEMY_FIRE_CHANCE * (1.0 + ENEMY_FIRE_PER_LEVEL * level as f32);
    per_volley * VOLLEYS_PER_SECOND + ROW_FIRE_BONUS * row as f32
}

pub fn boss_hp(level: u32, boss_interval: u32) -> u32 {
    let appearance = (level / boss_interval.max(1)).max(1);
    BOSS_BASE_HP + BOSS_HP_PER_APPEARANCE * (appearance - 1)
}

fn boss_speed(level: u32) -> f32 {
    BOSS_BASE_SPEED + level.saturating_sub(1) as f32 * BOSS_SPEED_PER_LEVEL
}

/// Indices of the lowest living enemy in each column, left to right.
/// Only these are allowed to shoot.
pub fn front_line(enemies: &[Enemy]) -> Vec<usize> {
    let mut lowest: BTreeMap<usize, usize> = BTreeMap::new();
    for (i, e) in enemies.iter().enumerate().filter(|(_, e)| !e.dead) {
        match lowest.get(&e.column) {
            Some(&j) if enemies[j].row >= e.row => {}
            _ => {
                lowest.insert(e.column, i);
            }
        }
    }
    lowest.into_values().collect()
}

// ── Spawning ─────────────────────────────────────────────────────────────────

/// Populate the current level: a boss on boss levels, otherwise a fresh
/// formation. Shields are rebuilt either way.
pub fn start_level(state: &mut GameState, rng: &mut impl Rng) {
    let level = state.waves.level;
    let width = state.width();
    state.enemies.clear();
    state.boss = None;
    state.waves.direction = 1.0;
    state.waves.speed = formation_speed(level);

    if state.waves.is_boss_level(level) {
        let hp = boss_hp(level, state.waves.boss_interval());
        state.boss = Some(Boss::new(Vec2::new(width / 2.0, BOSS_Y), hp, boss_speed(level)));
        state.waves.stage = Stage::Boss;
        tracing::info!(level, hp, "boss level started");
    } else {
        spawn_formation(state, rng);
        state.waves.stage = Stage::Formation;
        tracing::info!(level, enemies = state.enemies.len(), "formation level started");
    }

    rebuild_shields(state);
    state.events.push(GameEvent::LevelStarted {
        level,
        boss: state.waves.stage == Stage::Boss,
    });
}

fn spawn_formation(state: &mut GameState, rng: &mut impl Rng) {
    let level = state.waves.level;
    let width = state.width();
    let (rows, cols) = grid_size(level);
    // Columns span the full width between the side margins
    let pitch = if cols > 1 {
        (width - 2.0 * MARGIN_X) / (cols - 1) as f32
    } else {
        0.0
    };
    let left = if cols > 1 { MARGIN_X } else { width / 2.0 };

    for row in 0..rows {
        let y = TOP_Y + row as f32 * ROW_PITCH;
        let tier = ((row as u32 + level - 1) % 3) as u8;
        for column in 0..cols {
            let x = left + column as f32 * pitch;
            let phase = rng.gen_range(0.0..TAU);
            state
                .enemies
                .push(Enemy::new(Vec2::new(x, y), row, column, tier, phase));
        }
    }
}

pub fn rebuild_shields(state: &mut GameState) {
    let width = state.width();
    let top = state.height() - SHIELD_OFFSET;
    let spacing = width / (SHIELD_CLUSTERS + 1) as f32;
    state.shields.clear();
    for cluster in 0..SHIELD_CLUSTERS {
        let cx = spacing * (cluster + 1) as f32;
        for rx in -2..=2 {
            for ry in 0..3 {
                let pos = Vec2::new(cx + rx as f32 * SHIELD_PITCH, top + ry as f32 * SHIELD_PITCH);
                state.shields.push(ShieldBlock::new(pos));
            }
        }
    }
}

/// Move to the next level once nothing hostile is left alive.
pub fn advance_if_cleared(state: &mut GameState, rng: &mut impl Rng) -> bool {
    if !state.wave_cleared() {
        return false;
    }
    state.waves.level += 1;
    start_level(state, rng);
    true
}
