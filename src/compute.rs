//! Game loop controller.
//!
//! `tick` takes an immutable reference to the current `GameState` (plus the
//! polled input, elapsed time and an RNG handle) and returns a brand-new
//! `GameState`. Side effects are limited to the injected RNG, so a seeded RNG
//! and a fixed `dt` sequence always replay the same game.

use std::f32::consts::TAU;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::collision;
use crate::config::GameConfig;
use crate::entities::{
    Bullet, BulletOwner, GameEvent, GameState, GameStatus, LossReason, Particle, Player, PowerUp,
    PowerUpKind, Vec2,
};
use crate::wave::{self, WaveDirector};

/// Player bullets leave the hull this far above its centre.
const MUZZLE_OFFSET: f32 = 22.0;
const PLAYER_BULLET_RADIUS: f32 = 4.0;
const ENEMY_BULLET_RADIUS: f32 = 6.0;
/// Enemy and boss shots travel at this fraction of the player's bullet speed.
const ENEMY_BULLET_SPEED_FACTOR: f32 = 0.6;
const SPREAD_VX: [f32; 3] = [-180.0, 0.0, 180.0];
/// Fire cooldown multiplier while `Rapid` is active.
const RAPID_COOLDOWN_FACTOR: f32 = 0.4;
const BOSS_FAN_ANGLES: [f32; 5] = [-0.6, -0.3, 0.0, 0.3, 0.6];
const BOSS_MUZZLE_OFFSET: f32 = 40.0;
const ENEMY_MUZZLE_OFFSET: f32 = 18.0;
const ENEMY_SHOT_DRIFT: f32 = 30.0;

const EXPLOSION_PARTICLES: usize = 18;
const POWER_UP_SPAWN_MARGIN: f32 = 60.0;

// ── Input ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    #[default]
    Idle,
}

impl Direction {
    fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
            Direction::Idle => 0.0,
        }
    }
}

/// Input state polled once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Input {
    pub direction: Direction,
    pub fire: bool,
}

/// Bound a raw frame time to `[0, max_dt]`. Negative or NaN readings count
/// as no time passing.
pub fn clamp_dt(raw: f32, max_dt: f32) -> f32 {
    if raw.is_nan() || raw <= 0.0 {
        0.0
    } else {
        raw.min(max_dt)
    }
}

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build a fresh game at level 1.
pub fn init_state(config: GameConfig, high_score: u32, rng: &mut impl Rng) -> GameState {
    let width = config.playfield.width;
    let height = config.playfield.height;
    let mut state = GameState {
        player: Player::new(Vec2::new(width / 2.0, height - 80.0), config.player.lives),
        bullets: Vec::new(),
        enemies: Vec::new(),
        boss: None,
        shields: Vec::new(),
        power_ups: Vec::new(),
        particles: Vec::new(),
        waves: WaveDirector::new(config.waves.boss_interval),
        status: GameStatus::Playing,
        high_score,
        frame: 0,
        explosions: Vec::new(),
        events: Vec::new(),
        config,
    };
    wave::start_level(&mut state, rng);
    state
}

/// Start over with the same config, keeping the best score.
pub fn restart(state: &GameState, rng: &mut impl Rng) -> GameState {
    tracing::info!(high_score = state.high_score, "restarting");
    init_state(state.config.clone(), state.high_score, rng)
}

pub fn toggle_pause(state: &GameState) -> GameState {
    let status = match state.status {
        GameStatus::Playing => GameStatus::Paused,
        GameStatus::Paused => GameStatus::Playing,
        over @ GameStatus::GameOver(_) => over,
    };
    GameState {
        status,
        ..state.clone()
    }
}

// ── Player actions ───────────────────────────────────────────────────────────

/// Fire if the cooldown allows. Returns whether anything was fired.
pub fn player_shoot(state: &mut GameState) -> bool {
    if !state.player.can_fire() {
        return false;
    }
    let speed = state.config.player.bullet_speed;
    let muzzle = Vec2::new(state.player.pos.x, state.player.pos.y - MUZZLE_OFFSET);
    if state.player.has(PowerUpKind::Spread) {
        for vx in SPREAD_VX {
            state.bullets.push(player_bullet(muzzle, Vec2::new(vx, -speed)));
        }
    } else {
        state.bullets.push(player_bullet(muzzle, Vec2::new(0.0, -speed)));
    }

    let mut cooldown = state.config.player.fire_rate;
    if state.player.has(PowerUpKind::Rapid) {
        cooldown *= RAPID_COOLDOWN_FACTOR;
    }
    state.player.fire_cooldown = cooldown;
    true
}

fn player_bullet(pos: Vec2, vel: Vec2) -> Bullet {
    Bullet::new(pos, vel, BulletOwner::Player, 1, PLAYER_BULLET_RADIUS)
}

fn enemy_bullet(pos: Vec2, vel: Vec2) -> Bullet {
    Bullet::new(pos, vel, BulletOwner::Enemy, 1, ENEMY_BULLET_RADIUS)
}

// ── Per-frame tick (pure apart from the injected RNG) ────────────────────────

/// Advance the simulation by `dt` seconds and return the new state.
pub fn tick(state: &GameState, input: &Input, dt: f32, rng: &mut impl Rng) -> GameState {
    let mut next = state.clone();
    advance(&mut next, input, dt, rng);
    next
}

/// In-place form of `tick`. Does nothing unless the game is in progress.
pub fn advance(state: &mut GameState, input: &Input, dt: f32, rng: &mut impl Rng) {
    state.events.clear();
    if state.status != GameStatus::Playing {
        return;
    }
    let dt = clamp_dt(dt, state.config.timing.max_dt);
    state.frame += 1;

    // ── 1. Input ─────────────────────────────────────────────────────────────
    let player_speed = state.config.player.speed;
    let width = state.width();
    state
        .player
        .steer(input.direction.sign(), player_speed, dt, width);
    if input.fire {
        player_shoot(state);
    }

    // ── 2. Movement & timers ─────────────────────────────────────────────────
    integrate(state, dt);

    // ── 3. Collisions ────────────────────────────────────────────────────────
    let resolution = collision::resolve(state);

    // ── 4. Prune the dead ────────────────────────────────────────────────────
    state.prune();
    burst_explosions(state, rng);

    // ── 5. Random gunfire & power-up drops ───────────────────────────────────
    formation_gunfire(state, dt, rng);
    drop_power_ups(state, dt, rng);

    // ── 6. Level transition ──────────────────────────────────────────────────
    if resolution.wave_cleared && !resolution.overrun {
        wave::advance_if_cleared(state, rng);
    }

    // ── 7. Win/lose ──────────────────────────────────────────────────────────
    if state.player.lives == 0 {
        end_game(state, LossReason::LivesExhausted);
    } else if resolution.overrun {
        end_game(state, LossReason::Overrun);
    }
}

fn integrate(state: &mut GameState, dt: f32) {
    let width = state.width();
    let height = state.height();

    state.player.update(dt);
    for bullet in &mut state.bullets {
        bullet.update(dt, width, height);
    }
    for particle in &mut state.particles {
        particle.update(dt);
    }
    for power_up in &mut state.power_ups {
        power_up.update(dt, height);
    }

    match state.boss.as_mut() {
        Some(boss) => {
            boss.update(dt, width);
            if !boss.dead && boss.take_volley() {
                let origin = Vec2::new(boss.pos.x, boss.pos.y + BOSS_MUZZLE_OFFSET);
                let speed = state.config.player.bullet_speed * ENEMY_BULLET_SPEED_FACTOR;
                for angle in BOSS_FAN_ANGLES {
                    let vel = Vec2::new(angle.sin() * speed, angle.cos() * speed);
                    state.bullets.push(enemy_bullet(origin, vel));
                }
            }
        }
        None => {
            let drop = state.config.waves.drop_amount;
            state.waves.sweep(&mut state.enemies, dt, width, drop);
            for enemy in &mut state.enemies {
                enemy.update(dt);
            }
        }
    }
}

fn burst_explosions(state: &mut GameState, rng: &mut impl Rng) {
    for at in state.explosions.drain(..) {
        for _ in 0..EXPLOSION_PARTICLES {
            let angle = rng.gen_range(0.0..TAU);
            let speed = rng.gen_range(40.0..320.0);
            let life = rng.gen_range(0.4..1.0);
            let vel = Vec2::new(angle.cos() * speed, angle.sin() * speed);
            state.particles.push(Particle::new(at, vel, life));
        }
    }
}

/// One Bernoulli trial per front-line enemy, scaled by `dt`.
fn formation_gunfire(state: &mut GameState, dt: f32, rng: &mut impl Rng) {
    let level = state.level();
    let scale = state.config.waves.enemy_fire_scale;
    let speed = state.config.player.bullet_speed * ENEMY_BULLET_SPEED_FACTOR;
    for i in wave::front_line(&state.enemies) {
        let enemy = &state.enemies[i];
        let p = wave::fire_probability(level, enemy.row) * scale * dt;
        if rng.gen_bool(chance(p)) {
            let origin = Vec2::new(enemy.pos.x, enemy.pos.y + ENEMY_MUZZLE_OFFSET);
            let vx = rng.gen_range(-ENEMY_SHOT_DRIFT..ENEMY_SHOT_DRIFT);
            state.bullets.push(enemy_bullet(origin, Vec2::new(vx, speed)));
        }
    }
}

fn drop_power_ups(state: &mut GameState, dt: f32, rng: &mut impl Rng) {
    let waves = &state.config.waves;
    let p = waves.powerup_rate * (1.0 + 0.1 * state.level() as f32) * dt;
    if !rng.gen_bool(chance(p)) {
        return;
    }
    let width = state.width();
    let x = if width > 2.0 * POWER_UP_SPAWN_MARGIN {
        rng.gen_range(POWER_UP_SPAWN_MARGIN..width - POWER_UP_SPAWN_MARGIN)
    } else {
        width / 2.0
    };
    let kind = *PowerUpKind::ALL
        .choose(rng)
        .unwrap_or(&PowerUpKind::Score);
    let fall_speed = waves.powerup_fall_speed;
    tracing::debug!(?kind, x, "power-up dropped");
    state
        .power_ups
        .push(PowerUp::new(Vec2::new(x, -20.0), kind, fall_speed));
}

/// Probability for `gen_bool`: clamped to `[0, 1]`, NaN counts as never.
fn chance(p: f32) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        f64::from(p.clamp(0.0, 1.0))
    }
}

fn end_game(state: &mut GameState, reason: LossReason) {
    let score = state.player.score;
    state.status = GameStatus::GameOver(reason);
    if score > state.high_score {
        state.high_score = score;
    }
    tracing::info!(?reason, score, level = state.level(), "game over");
    state.events.push(GameEvent::GameOver { reason, score });
}
