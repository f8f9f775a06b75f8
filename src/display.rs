//! Terminal renderer.
//!
//! Draws a `Frame` snapshot and nothing else: world coordinates are scaled
//! onto the character grid inside the border, the HUD sits on row 0 and the
//! key legend on the last row.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};
use invaders::entities::{
    Boss, Bullet, BulletOwner, Enemy, Entity, Frame, GameStatus, LossReason, Particle, Player,
    PowerUp, PowerUpKind, ShieldBlock, BOSS_HEIGHT, BOSS_WIDTH,
};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_LIVES: Color = Color::Red;
const C_HUD_LEVEL: Color = Color::Cyan;
const C_PLAYER: Color = Color::White;
const C_PLAYER_SHIELDED: Color = Color::Blue;
const C_ENEMY_TIERS: [Color; 3] = [Color::Green, Color::Red, Color::Yellow];
const C_BOSS: Color = Color::Magenta;
const C_BOSS_HP: Color = Color::DarkRed;
const C_BULLET_PLAYER: Color = Color::Cyan;
const C_BULLET_ENEMY: Color = Color::Magenta;
const C_PARTICLE: Color = Color::DarkYellow;
const C_HINT: Color = Color::DarkGrey;

/// Maps world units onto the bordered play area of the terminal.
struct Viewport {
    cols: u16,
    rows: u16,
    sx: f32,
    sy: f32,
}

impl Viewport {
    fn new(frame: &Frame, cols: u16, rows: u16) -> Self {
        let inner_w = cols.saturating_sub(2).max(1) as f32;
        let inner_h = rows.saturating_sub(4).max(1) as f32;
        Self {
            cols,
            rows,
            sx: inner_w / frame.width.max(1.0),
            sy: inner_h / frame.height.max(1.0),
        }
    }

    /// Cell for a world point, or `None` when it falls outside the play area.
    fn cell(&self, x: f32, y: f32) -> Option<(u16, u16)> {
        let col = 1.0 + x * self.sx;
        let row = 2.0 + y * self.sy;
        if col < 1.0 || row < 2.0 {
            return None;
        }
        let (col, row) = (col as u16, row as u16);
        if col >= self.cols.saturating_sub(1) || row >= self.rows.saturating_sub(2) {
            return None;
        }
        Some((col, row))
    }

    fn span(&self, world_width: f32) -> usize {
        ((world_width * self.sx).round() as usize).max(1)
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, frame: &Frame) -> std::io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let view = Viewport::new(frame, cols, rows);

    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, &view)?;
    draw_hud(out, frame, &view)?;

    for entity in &frame.entities {
        match entity {
            Entity::Player(p) => draw_player(out, p, &view)?,
            Entity::Bullet(b) => draw_bullet(out, b, &view)?,
            Entity::Enemy(e) => draw_enemy(out, e, &view)?,
            Entity::Boss(b) => draw_boss(out, b, &view)?,
            Entity::ShieldBlock(s) => draw_shield(out, s, &view)?,
            Entity::PowerUp(p) => draw_power_up(out, p, &view)?,
            Entity::Particle(p) => draw_particle(out, p, &view)?,
        }
    }

    draw_controls_hint(out, &view)?;

    match frame.status {
        GameStatus::GameOver(reason) => draw_game_over(out, frame, reason, &view)?,
        GameStatus::Paused => draw_banner(out, &view, &[("-- PAUSED --", Color::White)])?,
        GameStatus::Playing => {}
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

/// Title screen shown before the first game.
pub fn render_start_screen<W: Write>(out: &mut W, high_score: u32) -> std::io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let view = Viewport {
        cols,
        rows,
        sx: 1.0,
        sy: 1.0,
    };
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let best = format!("Best Score: {high_score}");
    let legend = format!(
        "Power-ups: {} rapid  {} spread  {} shield  {} bonus",
        PowerUpKind::Rapid.label(),
        PowerUpKind::Spread.label(),
        PowerUpKind::Shield.label(),
        PowerUpKind::Score.label(),
    );
    draw_banner(
        out,
        &view,
        &[
            ("★  SPACE  INVADERS  ★", Color::Cyan),
            (best.as_str(), Color::Yellow),
            ("", Color::White),
            ("← → / A D : Move   SPACE : Shoot   P : Pause   Q : Quit", C_HINT),
            (legend.as_str(), C_HINT),
            ("", Color::White),
            ("Press ENTER to start", Color::White),
        ],
    )?;

    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    let w = view.cols as usize;
    let h = view.rows;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    // Row 1: top bar
    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    // Row h-2: bottom bar
    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    // Side walls
    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(view.cols.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, frame: &Frame, view: &Viewport) -> std::io::Result<()> {
    // Score: left
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(format!(
        "Score: {:>7}  High: {:>7}",
        frame.score, frame.high_score
    )))?;

    // Level: centre
    let level_str = format!("[ LEVEL {} ]", frame.level);
    let lx = (view.cols / 2).saturating_sub(level_str.len() as u16 / 2);
    out.queue(cursor::MoveTo(lx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_LEVEL))?;
    out.queue(Print(&level_str))?;

    // Lives: right
    let hearts: String = "♥".repeat(frame.lives as usize);
    let lives_text = format!("Lives: {}", hearts);
    let rx = view
        .cols
        .saturating_sub(lives_text.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_LIVES))?;
    out.queue(Print(&lives_text))?;

    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn put<W: Write>(
    out: &mut W,
    view: &Viewport,
    x: f32,
    y: f32,
    glyph: &str,
    color: Color,
) -> std::io::Result<()> {
    let width = glyph.chars().count() as u16;
    if let Some((col, row)) = view.cell(x, y) {
        let col = col
            .saturating_sub(width / 2)
            .clamp(1, view.cols.saturating_sub(1 + width).max(1));
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(color))?;
        out.queue(Print(glyph))?;
    }
    Ok(())
}

fn draw_player<W: Write>(out: &mut W, p: &Player, view: &Viewport) -> std::io::Result<()> {
    let color = if p.is_invulnerable() {
        C_PLAYER_SHIELDED
    } else {
        C_PLAYER
    };
    put(out, view, p.pos.x, p.pos.y, "/▲\\", color)
}

fn draw_enemy<W: Write>(out: &mut W, e: &Enemy, view: &Viewport) -> std::io::Result<()> {
    let sprite = match e.tier {
        0 => "<▼>",
        1 => "(◉)",
        _ => "{#}",
    };
    let color = C_ENEMY_TIERS[usize::from(e.tier) % C_ENEMY_TIERS.len()];
    put(out, view, e.pos.x, e.pos.y, sprite, color)
}

fn draw_boss<W: Write>(out: &mut W, b: &Boss, view: &Viewport) -> std::io::Result<()> {
    let span = view.span(BOSS_WIDTH).max(5);
    let hull = format!("[{}]", "=".repeat(span.saturating_sub(2)));
    put(out, view, b.pos.x, b.pos.y, &hull, C_BOSS)?;

    let filled = (span as u32 * b.hp / b.max_hp.max(1)) as usize;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(span - filled.min(span)));
    let bar_y = b.pos.y - BOSS_HEIGHT / 2.0;
    put(out, view, b.pos.x, bar_y, &bar, C_BOSS_HP)
}

fn draw_bullet<W: Write>(out: &mut W, b: &Bullet, view: &Viewport) -> std::io::Result<()> {
    match b.owner {
        BulletOwner::Player => put(out, view, b.pos.x, b.pos.y, "║", C_BULLET_PLAYER),
        BulletOwner::Enemy => put(out, view, b.pos.x, b.pos.y, "↓", C_BULLET_ENEMY),
    }
}

fn draw_shield<W: Write>(out: &mut W, s: &ShieldBlock, view: &Viewport) -> std::io::Result<()> {
    let (glyph, color) = match s.hp {
        4.. => ("█", Color::Green),
        3 => ("▓", Color::Green),
        2 => ("▒", Color::DarkGreen),
        _ => ("░", Color::DarkGreen),
    };
    put(out, view, s.pos.x, s.pos.y, glyph, color)
}

fn draw_power_up<W: Write>(out: &mut W, p: &PowerUp, view: &Viewport) -> std::io::Result<()> {
    let color = match p.kind {
        PowerUpKind::Rapid => Color::Cyan,
        PowerUpKind::Spread => Color::Magenta,
        PowerUpKind::Shield => Color::Blue,
        PowerUpKind::Score => Color::Yellow,
    };
    put(out, view, p.pos.x, p.pos.y, &p.kind.label().to_string(), color)
}

fn draw_particle<W: Write>(out: &mut W, p: &Particle, view: &Viewport) -> std::io::Result<()> {
    let glyph = if p.life > p.max_life / 2.0 { "*" } else { "·" };
    put(out, view, p.pos.x, p.pos.y, glyph, C_PARTICLE)
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, view.rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("← → / A D : Move   SPACE : Shoot   P : Pause   Q : Quit"))?;
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn draw_game_over<W: Write>(
    out: &mut W,
    frame: &Frame,
    reason: LossReason,
    view: &Viewport,
) -> std::io::Result<()> {
    let cause = match reason {
        LossReason::LivesExhausted => "Out of lives",
        LossReason::Overrun => "The invaders landed",
    };
    let score_line = format!("Final Score: {}", frame.score);
    let best_line = if frame.score >= frame.high_score && frame.score > 0 {
        "New high score!".to_string()
    } else {
        format!("High Score: {}", frame.high_score)
    };
    draw_banner(
        out,
        view,
        &[
            ("╔══════════════════╗", Color::Red),
            ("║    GAME  OVER    ║", Color::Red),
            ("╚══════════════════╝", Color::Red),
            (cause, Color::Red),
            (score_line.as_str(), Color::Yellow),
            (best_line.as_str(), Color::Yellow),
            ("R - Play Again  Q - Quit", Color::White),
        ],
    )
}

fn draw_banner<W: Write>(
    out: &mut W,
    view: &Viewport,
    lines: &[(&str, Color)],
) -> std::io::Result<()> {
    let cx = view.cols / 2;
    let start_row = (view.rows / 2).saturating_sub(lines.len() as u16 / 2);

    for (i, (msg, color)) in lines.iter().enumerate() {
        let row = start_row + i as u16;
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*msg))?;
    }

    Ok(())
}
