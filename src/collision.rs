//! Collision resolver: every interaction between two entities happens here,
//! after movement and before dead entities are pruned.
//!
//! The passes run in a fixed order and a bullet is spent by the first thing
//! it touches, so the outcome of a tick never depends on anything but list
//! order. Entities flagged dead earlier in the same tick are skipped by every
//! later pass.

use crate::entities::{
    Bullet, BulletOwner, GameEvent, GameState, Player, ShieldBlock, POWER_UP_RADIUS,
};

/// Distance added to an enemy bullet's radius for the player hit test.
const PLAYER_HIT_RADIUS: f32 = 18.0;
/// Reach of the player's hull when catching a power-up.
const PLAYER_PICKUP_RADIUS: f32 = 30.0;
/// An enemy this close above the player's row has overrun the defences.
const OVERRUN_MARGIN: f32 = 30.0;

/// What the resolver found out that the loop controller has to act on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// An enemy reached the player's row.
    pub overrun: bool,
    /// No living enemy and no living boss remain.
    pub wave_cleared: bool,
}

pub fn resolve(state: &mut GameState) -> Resolution {
    let hit_invulnerability = state.config.player.hit_invulnerability;
    let GameState {
        player,
        bullets,
        enemies,
        boss,
        shields,
        power_ups,
        explosions,
        events,
        ..
    } = state;

    // ── 1. Player bullets ↔ boss ─────────────────────────────────────────────
    if let Some(boss) = boss.as_mut() {
        for bullet in live_bullets(bullets, BulletOwner::Player) {
            if boss.dead {
                break;
            }
            if boss.contains(bullet.pos) {
                bullet.dead = true;
                if boss.hit(bullet.damage, player) {
                    tracing::info!(score = player.score, "boss defeated");
                    explosions.push(boss.pos);
                    events.push(GameEvent::BossDefeated { at: boss.pos });
                } else {
                    events.push(GameEvent::BossDamaged { hp: boss.hp });
                }
            }
        }
    }

    // ── 2. Player bullets ↔ enemies (first match in list order) ──────────────
    for bullet in live_bullets(bullets, BulletOwner::Player) {
        let Some(enemy) = enemies.iter_mut().find(|e| !e.dead && e.contains(bullet.pos)) else {
            continue;
        };
        bullet.dead = true;
        if enemy.hit(bullet.damage, player) {
            explosions.push(enemy.pos);
            events.push(GameEvent::EnemyKilled {
                at: enemy.pos,
                points: enemy.points(),
            });
        }
    }

    // ── 3. Remaining player bullets ↔ shields ────────────────────────────────
    absorb_into_shields(bullets, shields, BulletOwner::Player);

    // ── 4. Enemy bullets ↔ player ────────────────────────────────────────────
    for bullet in live_bullets(bullets, BulletOwner::Enemy) {
        if player.is_invulnerable() {
            break;
        }
        let reach = bullet.radius + PLAYER_HIT_RADIUS;
        if bullet.pos.distance_sq(player.pos) < reach * reach {
            bullet.dead = true;
            hit_player(player, hit_invulnerability);
            explosions.push(player.pos);
            events.push(GameEvent::PlayerHit {
                lives: player.lives,
            });
        }
    }

    // ── 5. Enemy bullets ↔ shields ───────────────────────────────────────────
    absorb_into_shields(bullets, shields, BulletOwner::Enemy);

    // ── 6. Formation ↔ player's row ──────────────────────────────────────────
    let overrun_line = player.pos.y - OVERRUN_MARGIN;
    let overrun = enemies.iter().any(|e| !e.dead && e.pos.y >= overrun_line);

    // ── 7. Falling power-ups ↔ player ────────────────────────────────────────
    let pickup = POWER_UP_RADIUS + PLAYER_PICKUP_RADIUS;
    for power_up in power_ups.iter_mut().filter(|p| !p.dead) {
        if power_up.pos.distance_sq(player.pos) < pickup * pickup {
            power_up.dead = true;
            player.apply_power_up(power_up.kind);
            events.push(GameEvent::PowerUpCollected(power_up.kind));
        }
    }

    Resolution {
        overrun,
        wave_cleared: state.wave_cleared(),
    }
}

fn live_bullets(bullets: &mut [Bullet], owner: BulletOwner) -> impl Iterator<Item = &mut Bullet> {
    bullets
        .iter_mut()
        .filter(move |b| !b.dead && b.owner == owner)
}

fn absorb_into_shields(bullets: &mut [Bullet], shields: &mut [ShieldBlock], owner: BulletOwner) {
    for bullet in live_bullets(bullets, owner) {
        if let Some(block) = shields
            .iter_mut()
            .find(|s| !s.dead && s.overlaps(bullet.pos, bullet.radius))
        {
            bullet.dead = true;
            block.hit(1);
        }
    }
}

fn hit_player(player: &mut Player, invulnerability: f32) {
    player.lives = player.lives.saturating_sub(1);
    player.invulnerable = invulnerability;
    tracing::debug!(lives = player.lives, "player hit");
}
