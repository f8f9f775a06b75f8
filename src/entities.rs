//! All game entity types and the simulation-state object that owns them.
//!
//! Every entity advances only its own fields in `update`; anything that
//! involves two entities at once belongs to `collision`.

use std::collections::BTreeMap;

use crate::config::GameConfig;
use crate::wave::WaveDirector;

/// Points credited for destroying a boss.
pub const BOSS_KILL_BONUS: u32 = 500;
/// Points credited by the `Score` power-up.
pub const SCORE_POWER_UP_BONUS: u32 = 200;
/// Seconds a timed power-up (`Rapid`, `Spread`) stays active.
pub const POWER_UP_DURATION: f32 = 10.0;
/// Seconds of invulnerability granted by the `Shield` power-up.
pub const SHIELD_DURATION: f32 = 6.0;

pub const PLAYER_WIDTH: f32 = 48.0;
pub const ENEMY_WIDTH: f32 = 40.0;
pub const ENEMY_HEIGHT: f32 = 30.0;
pub const BOSS_WIDTH: f32 = 160.0;
pub const BOSS_HEIGHT: f32 = 80.0;
pub const SHIELD_BLOCK_SIZE: f32 = 14.0;
pub const SHIELD_BLOCK_HP: u32 = 4;
pub const POWER_UP_RADIUS: f32 = 12.0;

/// How far outside the playfield a bullet may travel before it is culled.
const BULLET_CULL_MARGIN: f32 = 50.0;
/// A falling power-up is culled this far below the bottom edge.
const POWER_UP_CULL_MARGIN: f32 = 40.0;
/// The boss turns around this far from either side wall.
const BOSS_WALL_MARGIN: f32 = 100.0;
/// Vertical offset of the boss hit box from its position.
const BOSS_HITBOX_DROP: f32 = 20.0;

// ── Vector primitive ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Integrate `velocity` over `dt` seconds.
    pub fn add_scaled(&mut self, velocity: Vec2, dt: f32) {
        self.x += velocity.x * dt;
        self.y += velocity.y * dt;
    }

    pub fn distance_sq(&self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

// ── Enumerations ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulletOwner {
    Player,
    Enemy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PowerUpKind {
    /// Fire cooldown cut to 40 % while active.
    Rapid,
    /// Three-way shot while active.
    Spread,
    /// Immediate invulnerability window.
    Shield,
    /// Immediate score bonus.
    Score,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Rapid,
        PowerUpKind::Spread,
        PowerUpKind::Shield,
        PowerUpKind::Score,
    ];

    pub fn label(self) -> char {
        match self {
            PowerUpKind::Rapid => 'R',
            PowerUpKind::Spread => 'S',
            PowerUpKind::Shield => 'D',
            PowerUpKind::Score => '$',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LossReason {
    /// The player ran out of lives.
    LivesExhausted,
    /// The formation reached the player's row.
    Overrun,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    Paused,
    GameOver(LossReason),
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        matches!(self, GameStatus::GameOver(_))
    }
}

/// Something worth reporting that happened during one tick.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    EnemyKilled { at: Vec2, points: u32 },
    BossDamaged { hp: u32 },
    BossDefeated { at: Vec2 },
    PlayerHit { lives: u32 },
    PowerUpCollected(PowerUpKind),
    LevelStarted { level: u32, boss: bool },
    GameOver { reason: LossReason, score: u32 },
}

// ── Player ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub lives: u32,
    pub score: u32,
    /// Active timed power-ups and the seconds each has left.
    pub power_ups: BTreeMap<PowerUpKind, f32>,
    /// Seconds until the next shot is allowed.
    pub fire_cooldown: f32,
    /// Seconds of remaining invulnerability.
    pub invulnerable: f32,
    pub dead: bool,
}

impl Player {
    pub fn new(pos: Vec2, lives: u32) -> Self {
        Self {
            pos,
            lives,
            score: 0,
            power_ups: BTreeMap::new(),
            fire_cooldown: 0.0,
            invulnerable: 0.0,
            dead: false,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        self.invulnerable = (self.invulnerable - dt).max(0.0);
        for remaining in self.power_ups.values_mut() {
            *remaining -= dt;
        }
        self.power_ups.retain(|_, remaining| *remaining > 0.0);
    }

    /// Move horizontally by `dir * speed * dt`, clamped inside `[0, width]`
    /// so the whole hull stays visible.
    pub fn steer(&mut self, dir: f32, speed: f32, dt: f32, width: f32) {
        let half = PLAYER_WIDTH / 2.0;
        self.pos.x = (self.pos.x + dir * speed * dt).clamp(half, (width - half).max(half));
    }

    pub fn has(&self, kind: PowerUpKind) -> bool {
        self.power_ups.contains_key(&kind)
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0.0
    }

    pub fn can_fire(&self) -> bool {
        self.fire_cooldown <= 0.0
    }

    /// Apply the effect of a collected power-up.
    pub fn apply_power_up(&mut self, kind: PowerUpKind) {
        match kind {
            PowerUpKind::Rapid | PowerUpKind::Spread => {
                self.power_ups.insert(kind, POWER_UP_DURATION);
            }
            PowerUpKind::Shield => self.invulnerable = self.invulnerable.max(SHIELD_DURATION),
            PowerUpKind::Score => self.score += SCORE_POWER_UP_BONUS,
        }
    }
}

// ── Projectiles ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub owner: BulletOwner,
    pub damage: u32,
    pub radius: f32,
    pub dead: bool,
}

impl Bullet {
    pub fn new(pos: Vec2, vel: Vec2, owner: BulletOwner, damage: u32, radius: f32) -> Self {
        Self {
            pos,
            vel,
            owner,
            damage,
            radius,
            dead: false,
        }
    }

    pub fn update(&mut self, dt: f32, width: f32, height: f32) {
        self.pos.add_scaled(self.vel, dt);
        if self.pos.x < -BULLET_CULL_MARGIN
            || self.pos.x > width + BULLET_CULL_MARGIN
            || self.pos.y < -BULLET_CULL_MARGIN
            || self.pos.y > height + BULLET_CULL_MARGIN
        {
            self.dead = true;
        }
    }
}

// ── Enemies ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Enemy {
    pub pos: Vec2,
    /// Vertical rest position the oscillation is centred on.
    pub base_y: f32,
    pub hp: u32,
    /// Row index in the formation, top row is 0.
    pub row: usize,
    /// Column index in the formation; stable while the grid sweeps.
    pub column: usize,
    /// Sprite/score variant, 0..=2.
    pub tier: u8,
    /// Oscillation phase in radians.
    pub phase: f32,
    pub dead: bool,
}

impl Enemy {
    pub fn new(pos: Vec2, row: usize, column: usize, tier: u8, phase: f32) -> Self {
        Self {
            pos,
            base_y: pos.y,
            hp: 1 + u32::from(tier) / 2,
            row,
            column,
            tier,
            phase,
            dead: false,
        }
    }

    pub fn points(&self) -> u32 {
        10 + 5 * u32::from(self.tier)
    }

    pub fn update(&mut self, dt: f32) {
        let tier = f32::from(self.tier);
        self.phase += dt * (1.0 + tier * 0.2);
        self.pos.y = self.base_y + self.phase.sin() * (4.0 + tier * 2.0);
        if self.hp == 0 {
            self.dead = true;
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        (p.x - self.pos.x).abs() < ENEMY_WIDTH / 2.0 && (p.y - self.pos.y).abs() < ENEMY_HEIGHT / 2.0
    }

    /// Take `damage`; on the killing blow credit the player. Returns `true`
    /// when this hit destroyed the enemy.
    pub fn hit(&mut self, damage: u32, player: &mut Player) -> bool {
        self.hp = self.hp.saturating_sub(damage);
        if self.hp == 0 && !self.dead {
            self.dead = true;
            player.score += self.points();
            return true;
        }
        false
    }
}

#[derive(Clone, Debug)]
pub struct Boss {
    pub pos: Vec2,
    pub hp: u32,
    pub max_hp: u32,
    /// +1.0 moving right, -1.0 moving left.
    pub dir: f32,
    pub speed: f32,
    /// Seconds until the next fan volley.
    pub fire_timer: f32,
    /// 1..=3, derived from the hp ratio.
    pub phase: u8,
    pub dead: bool,
}

impl Boss {
    pub fn new(pos: Vec2, hp: u32, speed: f32) -> Self {
        let mut boss = Self {
            pos,
            hp,
            max_hp: hp.max(1),
            dir: 1.0,
            speed,
            fire_timer: 0.0,
            phase: 1,
            dead: false,
        };
        boss.fire_timer = boss.fire_interval();
        boss
    }

    pub fn update(&mut self, dt: f32, width: f32) {
        self.pos.x += self.dir * self.speed * dt;
        if self.pos.x < BOSS_WALL_MARGIN {
            self.pos.x = BOSS_WALL_MARGIN;
            self.dir = 1.0;
        } else if self.pos.x > width - BOSS_WALL_MARGIN {
            self.pos.x = width - BOSS_WALL_MARGIN;
            self.dir = -1.0;
        }
        self.fire_timer -= dt;
        self.phase = phase_for(self.hp, self.max_hp);
        if self.hp == 0 {
            self.dead = true;
        }
    }

    /// Seconds between fan volleys; later phases fire faster.
    pub fn fire_interval(&self) -> f32 {
        0.6 - 0.1 * f32::from(self.phase.saturating_sub(1))
    }

    /// `true` once the fire timer has elapsed; rearms the timer.
    pub fn take_volley(&mut self) -> bool {
        if self.fire_timer > 0.0 {
            return false;
        }
        self.fire_timer += self.fire_interval();
        if self.fire_timer < 0.0 {
            self.fire_timer = self.fire_interval();
        }
        true
    }

    /// The hit box sits `BOSS_HITBOX_DROP` below the hull's centre.
    pub fn contains(&self, p: Vec2) -> bool {
        let centre_y = self.pos.y + BOSS_HITBOX_DROP;
        (p.x - self.pos.x).abs() < BOSS_WIDTH / 2.0 && (p.y - centre_y).abs() < BOSS_HEIGHT / 2.0
    }

    pub fn hit(&mut self, damage: u32, player: &mut Player) -> bool {
        self.hp = self.hp.saturating_sub(damage);
        self.phase = phase_for(self.hp, self.max_hp);
        if self.hp == 0 && !self.dead {
            self.dead = true;
            player.score += BOSS_KILL_BONUS;
            return true;
        }
        false
    }
}

fn phase_for(hp: u32, max_hp: u32) -> u8 {
    let ratio = hp as f32 / max_hp.max(1) as f32;
    if ratio > 0.66 {
        1
    } else if ratio > 0.33 {
        2
    } else {
        3
    }
}

// ── Scenery & pickups ────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct ShieldBlock {
    pub pos: Vec2,
    pub hp: u32,
    pub dead: bool,
}

impl ShieldBlock {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            hp: SHIELD_BLOCK_HP,
            dead: false,
        }
    }

    /// Box overlap against a round projectile.
    pub fn overlaps(&self, p: Vec2, radius: f32) -> bool {
        let reach = SHIELD_BLOCK_SIZE / 2.0 + radius;
        (p.x - self.pos.x).abs() < reach && (p.y - self.pos.y).abs() < reach
    }

    pub fn hit(&mut self, damage: u32) -> bool {
        self.hp = self.hp.saturating_sub(damage);
        if self.hp == 0 && !self.dead {
            self.dead = true;
            return true;
        }
        false
    }
}

#[derive(Clone, Debug)]
pub struct PowerUp {
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: PowerUpKind,
    pub dead: bool,
}

impl PowerUp {
    pub fn new(pos: Vec2, kind: PowerUpKind, fall_speed: f32) -> Self {
        Self {
            pos,
            vel: Vec2::new(0.0, fall_speed),
            kind,
            dead: false,
        }
    }

    pub fn update(&mut self, dt: f32, height: f32) {
        self.pos.add_scaled(self.vel, dt);
        if self.pos.y > height + POWER_UP_CULL_MARGIN {
            self.dead = true;
        }
    }
}

/// Explosion debris. Purely visual.
#[derive(Clone, Debug)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub max_life: f32,
    pub dead: bool,
}

impl Particle {
    pub fn new(pos: Vec2, vel: Vec2, life: f32) -> Self {
        Self {
            pos,
            vel,
            life,
            max_life: life,
            dead: false,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.life -= dt;
        if self.life <= 0.0 {
            self.dead = true;
            return;
        }
        self.pos.add_scaled(self.vel, dt);
    }
}

// ── Render snapshot ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Bullet,
    Enemy,
    Boss,
    ShieldBlock,
    PowerUp,
    Particle,
}

/// Closed variant over every kind of game object.
#[derive(Clone, Debug)]
pub enum Entity {
    Player(Player),
    Bullet(Bullet),
    Enemy(Enemy),
    Boss(Boss),
    ShieldBlock(ShieldBlock),
    PowerUp(PowerUp),
    Particle(Particle),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Player(_) => EntityKind::Player,
            Entity::Bullet(_) => EntityKind::Bullet,
            Entity::Enemy(_) => EntityKind::Enemy,
            Entity::Boss(_) => EntityKind::Boss,
            Entity::ShieldBlock(_) => EntityKind::ShieldBlock,
            Entity::PowerUp(_) => EntityKind::PowerUp,
            Entity::Particle(_) => EntityKind::Particle,
        }
    }

    pub fn pos(&self) -> Vec2 {
        match self {
            Entity::Player(p) => p.pos,
            Entity::Bullet(b) => b.pos,
            Entity::Enemy(e) => e.pos,
            Entity::Boss(b) => b.pos,
            Entity::ShieldBlock(s) => s.pos,
            Entity::PowerUp(p) => p.pos,
            Entity::Particle(p) => p.pos,
        }
    }

    pub fn is_dead(&self) -> bool {
        match self {
            Entity::Player(p) => p.dead,
            Entity::Bullet(b) => b.dead,
            Entity::Enemy(e) => e.dead,
            Entity::Boss(b) => b.dead,
            Entity::ShieldBlock(s) => s.dead,
            Entity::PowerUp(p) => p.dead,
            Entity::Particle(p) => p.dead,
        }
    }
}

/// Read-only view of one frame handed to the renderer.
#[derive(Clone, Debug)]
pub struct Frame {
    pub entities: Vec<Entity>,
    pub score: u32,
    pub high_score: u32,
    pub lives: u32,
    pub level: u32,
    pub status: GameStatus,
    pub width: f32,
    pub height: f32,
}

// ── Master game state ────────────────────────────────────────────────────────

/// The entire simulation state. Cloneable so the pure `tick` can return a
/// fresh copy without touching its input.
#[derive(Clone, Debug)]
pub struct GameState {
    pub config: GameConfig,
    pub player: Player,
    pub bullets: Vec<Bullet>,
    pub enemies: Vec<Enemy>,
    /// At most one boss, never alongside a formation.
    pub boss: Option<Boss>,
    pub shields: Vec<ShieldBlock>,
    pub power_ups: Vec<PowerUp>,
    pub particles: Vec<Particle>,
    pub waves: WaveDirector,
    pub status: GameStatus,
    /// Best score known at startup, raised at game over.
    pub high_score: u32,
    pub frame: u64,
    /// Positions where an explosion should burst this tick.
    pub explosions: Vec<Vec2>,
    /// Notable outcomes of the most recent tick.
    pub events: Vec<GameEvent>,
}

impl GameState {
    pub fn width(&self) -> f32 {
        self.config.playfield.width
    }

    pub fn height(&self) -> f32 {
        self.config.playfield.height
    }

    pub fn level(&self) -> u32 {
        self.waves.level
    }

    /// No living enemy and no living boss remain.
    pub fn wave_cleared(&self) -> bool {
        self.enemies.iter().all(|e| e.dead) && self.boss.as_ref().map_or(true, |b| b.dead)
    }

    /// Drop every entity whose dead flag is set.
    pub fn prune(&mut self) {
        self.bullets.retain(|b| !b.dead);
        self.enemies.retain(|e| !e.dead);
        self.shields.retain(|s| !s.dead);
        self.power_ups.retain(|p| !p.dead);
        self.particles.retain(|p| !p.dead);
        if self.boss.as_ref().is_some_and(|b| b.dead) {
            self.boss = None;
        }
    }

    pub fn snapshot(&self) -> Frame {
        let mut entities = Vec::with_capacity(
            1 + self.bullets.len()
                + self.enemies.len()
                + self.shields.len()
                + self.power_ups.len()
                + self.particles.len()
                + usize::from(self.boss.is_some()),
        );
        entities.extend(self.shields.iter().cloned().map(Entity::ShieldBlock));
        entities.extend(self.enemies.iter().cloned().map(Entity::Enemy));
        entities.extend(self.boss.iter().cloned().map(Entity::Boss));
        entities.extend(self.bullets.iter().cloned().map(Entity::Bullet));
        entities.extend(self.particles.iter().cloned().map(Entity::Particle));
        entities.push(Entity::Player(self.player.clone()));
        entities.extend(self.power_ups.iter().cloned().map(Entity::PowerUp));

        Frame {
            entities,
            score: self.player.score,
            high_score: self.high_score,
            lives: self.player.lives,
            level: self.waves.level,
            status: self.status,
            width: self.width(),
            height: self.height(),
        }
    }
}
