use invaders::compute::*;
use invaders::config::GameConfig;
use invaders::entities::*;
use invaders::wave::{self, grid_size, Stage};

use rand::rngs::StdRng;
use rand::SeedableRng;

const DT: f32 = 0.02;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

/// Config with every random spawn switched off.
fn quiet_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.waves.enemy_fire_scale = 0.0;
    config.waves.powerup_rate = 0.0;
    config
}

fn make_state() -> GameState {
    init_state(quiet_config(), 0, &mut seeded_rng())
}

fn idle() -> Input {
    Input::default()
}

/// A player bullet that will sit on `target` after one `DT` step.
fn shot_at(target: Vec2) -> Bullet {
    Bullet::new(
        Vec2::new(target.x, target.y + 700.0 * DT),
        Vec2::new(0.0, -700.0),
        BulletOwner::Player,
        1,
        4.0,
    )
}

// ── init_state ────────────────────────────────────────────────────────────────

#[test]
fn init_state_starts_level_one() {
    let s = make_state();
    assert_eq!(s.level(), 1);
    assert_eq!(s.player.lives, 3);
    assert_eq!(s.player.score, 0);
    assert_eq!(s.player.pos, Vec2::new(512.0, 688.0));
    assert_eq!(s.status, GameStatus::Playing);
    assert_eq!(s.frame, 0);
    assert_eq!(s.enemies.len(), 3 * 10);
    assert!(s.boss.is_none());
    assert_eq!(s.shields.len(), 60);
    assert!(s.bullets.is_empty());
    assert_eq!(
        s.events,
        vec![GameEvent::LevelStarted {
            level: 1,
            boss: false
        }]
    );
}

#[test]
fn restart_keeps_high_score_only() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.high_score = 900;
    s.player.score = 400;
    s.waves.level = 3;
    s.status = GameStatus::GameOver(LossReason::Overrun);

    let fresh = restart(&s, &mut rng);

    assert_eq!(fresh.high_score, 900);
    assert_eq!(fresh.player.score, 0);
    assert_eq!(fresh.level(), 1);
    assert_eq!(fresh.status, GameStatus::Playing);
}

// ── clamp_dt ──────────────────────────────────────────────────────────────────

#[test]
fn clamp_dt_bounds_frame_time() {
    assert_eq!(clamp_dt(0.016, 0.05), 0.016);
    assert_eq!(clamp_dt(0.2, 0.05), 0.05);
    assert_eq!(clamp_dt(-1.0, 0.05), 0.0);
    assert_eq!(clamp_dt(f32::NAN, 0.05), 0.0);
}

#[test]
fn long_stall_advances_only_max_dt() {
    let mut rng = seeded_rng();
    let s = make_state();
    let input = Input {
        direction: Direction::Right,
        fire: false,
    };
    let next = tick(&s, &input, 1.0, &mut rng);
    let moved = next.player.pos.x - s.player.pos.x;
    assert!((moved - 360.0 * 0.05).abs() < 1e-3, "moved {moved}");
}

// ── player_shoot ──────────────────────────────────────────────────────────────

#[test]
fn shooting_spawns_one_bullet_and_arms_cooldown() {
    let mut s = make_state();
    assert!(player_shoot(&mut s));
    assert_eq!(s.bullets.len(), 1);
    let b = &s.bullets[0];
    assert_eq!(b.owner, BulletOwner::Player);
    assert_eq!(b.pos, Vec2::new(512.0, 666.0));
    assert_eq!(b.vel, Vec2::new(0.0, -700.0));
    assert_eq!(s.player.fire_cooldown, 0.18);

    // Still cooling down
    assert!(!player_shoot(&mut s));
    assert_eq!(s.bullets.len(), 1);
}

#[test]
fn spread_fires_three_way() {
    let mut s = make_state();
    s.player.power_ups.insert(PowerUpKind::Spread, 5.0);
    assert!(player_shoot(&mut s));
    let vx: Vec<f32> = s.bullets.iter().map(|b| b.vel.x).collect();
    assert_eq!(vx, vec![-180.0, 0.0, 180.0]);
}

#[test]
fn rapid_shortens_cooldown() {
    let mut s = make_state();
    s.player.power_ups.insert(PowerUpKind::Rapid, 5.0);
    assert!(player_shoot(&mut s));
    assert!((s.player.fire_cooldown - 0.18 * 0.4).abs() < 1e-6);
}

// ── tick basics ───────────────────────────────────────────────────────────────

#[test]
fn tick_leaves_its_input_untouched() {
    let mut rng = seeded_rng();
    let s = make_state();
    let input = Input {
        direction: Direction::Left,
        fire: true,
    };
    let next = tick(&s, &input, DT, &mut rng);

    assert_eq!(s.frame, 0);
    assert!(s.bullets.is_empty());
    assert_eq!(s.player.pos, Vec2::new(512.0, 688.0));

    assert_eq!(next.frame, 1);
    assert_eq!(next.bullets.len(), 1);
    assert!(next.player.pos.x < 512.0);
    assert!(next.events.is_empty());
}

#[test]
fn player_stays_inside_playfield() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    let left = Input {
        direction: Direction::Left,
        fire: false,
    };
    for _ in 0..200 {
        s = tick(&s, &left, 0.05, &mut rng);
    }
    assert_eq!(s.player.pos.x, PLAYER_WIDTH / 2.0);
}

#[test]
fn formation_sweeps_each_tick() {
    let mut rng = seeded_rng();
    let s = make_state();
    let next = tick(&s, &idle(), DT, &mut rng);
    for (before, after) in s.enemies.iter().zip(&next.enemies) {
        assert!(after.pos.x > before.pos.x);
    }
}

// ── Pause ─────────────────────────────────────────────────────────────────────

#[test]
fn paused_game_does_not_advance() {
    let mut rng = seeded_rng();
    let s = toggle_pause(&make_state());
    assert_eq!(s.status, GameStatus::Paused);

    let input = Input {
        direction: Direction::Right,
        fire: true,
    };
    let next = tick(&s, &input, DT, &mut rng);
    assert_eq!(next.frame, 0);
    assert_eq!(next.player.pos, s.player.pos);
    assert!(next.bullets.is_empty());

    assert_eq!(toggle_pause(&next).status, GameStatus::Playing);
}

#[test]
fn pause_does_not_resurrect_a_finished_game() {
    let mut s = make_state();
    s.status = GameStatus::GameOver(LossReason::LivesExhausted);
    assert_eq!(toggle_pause(&s).status, s.status);
}

// ── Level progression ─────────────────────────────────────────────────────────

#[test]
fn clearing_the_last_enemy_starts_the_next_level() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.enemies.truncate(1);
    let target = s.enemies[0].pos;
    s.bullets.push(shot_at(target));

    let next = tick(&s, &idle(), DT, &mut rng);

    assert_eq!(next.level(), 2);
    assert_eq!(next.player.score, 10);
    let (rows, cols) = grid_size(2);
    assert_eq!(next.enemies.len(), rows * cols);
    assert!(next.events.contains(&GameEvent::LevelStarted {
        level: 2,
        boss: false
    }));
    assert_eq!(next.status, GameStatus::Playing);
}

#[test]
fn clearing_level_four_brings_the_boss() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.waves.level = 4;
    s.enemies.truncate(1);
    let target = s.enemies[0].pos;
    s.bullets.push(shot_at(target));

    let next = tick(&s, &idle(), DT, &mut rng);

    assert_eq!(next.level(), 5);
    assert_eq!(next.waves.stage, Stage::Boss);
    assert!(next.boss.is_some());
    assert!(next.enemies.is_empty());
}

#[test]
fn defeating_the_boss_pays_bonus_and_advances() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.waves.level = 5;
    wave::start_level(&mut s, &mut rng);
    assert_eq!(s.boss.as_ref().map(|b| b.hp), Some(20));

    for i in 0..20 {
        let boss_pos = s.boss.as_ref().expect("boss alive").pos;
        s.bullets.push(shot_at(boss_pos));
        s = tick(&s, &idle(), DT, &mut rng);
        if i < 19 {
            assert_eq!(s.boss.as_ref().map(|b| b.hp), Some(19 - i));
        }
    }

    assert!(s.boss.is_none());
    assert_eq!(s.player.score, BOSS_KILL_BONUS);
    assert_eq!(s.level(), 6);
    assert_eq!(s.waves.stage, Stage::Formation);
    assert!(!s.enemies.is_empty());
    assert_eq!(s.player.lives, 3);
}

// ── Game over ─────────────────────────────────────────────────────────────────

#[test]
fn losing_the_last_life_ends_the_game() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.player.lives = 1;
    s.player.score = 1234;
    s.high_score = 100;
    let at = s.player.pos;
    s.bullets.push(Bullet::new(
        at,
        Vec2::new(0.0, 420.0),
        BulletOwner::Enemy,
        1,
        6.0,
    ));

    let next = tick(&s, &idle(), DT, &mut rng);

    assert_eq!(next.player.lives, 0);
    assert_eq!(next.status, GameStatus::GameOver(LossReason::LivesExhausted));
    assert_eq!(next.high_score, 1234);
    assert!(next.events.contains(&GameEvent::GameOver {
        reason: LossReason::LivesExhausted,
        score: 1234
    }));

    // Nothing moves after the end
    let after = tick(&next, &idle(), DT, &mut rng);
    assert_eq!(after.frame, next.frame);
    assert!(after.events.is_empty());
}

#[test]
fn formation_reaching_the_player_ends_the_game() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.high_score = 5000;
    let low = s.player.pos.y - 10.0;
    s.enemies[0].pos.y = low;
    s.enemies[0].base_y = low;

    let next = tick(&s, &idle(), DT, &mut rng);

    assert_eq!(next.status, GameStatus::GameOver(LossReason::Overrun));
    assert_eq!(next.player.lives, 3);
    assert_eq!(next.high_score, 5000);
}

// ── Random spawns ─────────────────────────────────────────────────────────────

#[test]
fn power_up_drops_from_the_top() {
    let mut rng = seeded_rng();
    let mut config = quiet_config();
    config.waves.powerup_rate = 1000.0;
    let s = init_state(config, 0, &mut rng);

    let next = tick(&s, &idle(), DT, &mut rng);

    assert_eq!(next.power_ups.len(), 1);
    let p = &next.power_ups[0];
    assert_eq!(p.pos.y, -20.0);
    assert!(p.pos.x >= 60.0 && p.pos.x < next.width() - 60.0);
}

#[test]
fn only_the_front_line_returns_fire() {
    let mut rng = seeded_rng();
    let mut config = quiet_config();
    config.waves.enemy_fire_scale = 1.0e6;
    let s = init_state(config, 0, &mut rng);

    let next = tick(&s, &idle(), DT, &mut rng);

    let shots: Vec<&Bullet> = next
        .bullets
        .iter()
        .filter(|b| b.owner == BulletOwner::Enemy)
        .collect();
    assert_eq!(shots.len(), 10);
    let bottom = next.enemies.iter().map(|e| e.base_y).fold(f32::MIN, f32::max);
    assert!(shots.iter().all(|b| b.pos.y > bottom));
    assert!(shots.iter().all(|b| b.vel.y > 0.0));
}

#[test]
fn boss_fires_a_five_way_fan() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.waves.level = 5;
    wave::start_level(&mut s, &mut rng);
    if let Some(boss) = s.boss.as_mut() {
        boss.fire_timer = 0.0;
    }

    let next = tick(&s, &idle(), DT, &mut rng);

    let fan: Vec<&Bullet> = next
        .bullets
        .iter()
        .filter(|b| b.owner == BulletOwner::Enemy)
        .collect();
    assert_eq!(fan.len(), 5);
    assert_eq!(fan[2].vel.x, 0.0);
    assert!(fan[0].vel.x < 0.0 && fan[4].vel.x > 0.0);
    let drift: f32 = fan.iter().map(|b| b.vel.x).sum();
    assert!(drift.abs() < 1e-3);
}

#[test]
fn non_finite_rates_never_fire() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.config.waves.powerup_rate = f32::NAN;
    s.config.waves.enemy_fire_scale = f32::INFINITY;

    // inf * 0 s is NaN; neither trial may panic or fire
    let next = tick(&s, &idle(), 0.0, &mut rng);
    assert!(next.power_ups.is_empty());
    assert!(next.bullets.is_empty());

    let next = tick(&next, &idle(), DT, &mut rng);
    assert!(next.power_ups.is_empty());
}

// ── Whole-game properties ─────────────────────────────────────────────────────

fn scripted_input(frame: u32) -> Input {
    let direction = match (frame / 40) % 3 {
        0 => Direction::Left,
        1 => Direction::Right,
        _ => Direction::Idle,
    };
    Input {
        direction,
        fire: frame % 3 == 0,
    }
}

#[test]
fn snapshot_never_contains_dead_entities() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut s = init_state(GameConfig::default(), 0, &mut rng);
    for frame in 0..600 {
        s = tick(&s, &scripted_input(frame), 1.0 / 60.0, &mut rng);
        let snap = s.snapshot();
        assert!(
            snap.entities.iter().all(|e| !e.is_dead()),
            "dead entity at frame {frame}"
        );
        assert!(s.enemies.is_empty() || s.boss.is_none());
    }
}

#[test]
fn same_seed_same_game() {
    let run = |seed: u64| {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut s = init_state(GameConfig::default(), 0, &mut rng);
        for frame in 0..300 {
            s = tick(&s, &scripted_input(frame), 1.0 / 60.0, &mut rng);
        }
        format!("{:?}", s.snapshot())
    };
    assert_eq!(run(99), run(99));
}
