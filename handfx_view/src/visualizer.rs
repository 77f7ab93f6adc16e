//! Software-rendered effects window using `minifb`.
//!
//! Draw order per frame:
//!
//! ```text
//!   background → palm glows (screen) → lightning flash → hand skeletons
//!   + pinch rings
//!   → shock rings (add) → fusion orb (over) → particles (add)
//!   → bolts (add halo + core, white spine) → status bar
//! ```
//!
//! All drawing goes through [`Canvas`], which knows nothing about windows
//! and is what the tests exercise.

use std::sync::mpsc::Sender;

use glam::Vec2;
use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use handfx::gesture::palm_size_px;
use handfx::particle::{sample_gradient, GradientStop};
use handfx::pose::Pose;
use handfx::landmark::HAND_CONNECTIONS;
use handfx::{EffectRenderer, Handedness, Mode, RenderFrame};

use crate::error::ViewError;
use crate::source::{SimInput, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:    usize = 960;
pub const WIN_H:    usize = 540;
const STATUS_H:     usize = 30;
const STATUS_Y:     usize = WIN_H - STATUS_H;
const BG_COLOR:     u32   = 0x0A0500;
const TEXT_BG:      u32   = 0x0F1A30;
const FONT_SCALE:   usize = 2;

const LEFT_BONE:    [u8; 3] = [255, 140, 60];
const RIGHT_BONE:   [u8; 3] = [120, 200, 255];
const FLASH_RGB:    [u8; 3] = [200, 220, 255];

const fn stop(offset: f32, r: u8, g: u8, b: u8, alpha: f32) -> GradientStop {
    GradientStop { offset, rgb: [r, g, b], alpha }
}

const ORB_STOPS: [GradientStop; 9] = [
    stop(0.0,  255, 255, 255, 1.0),
    stop(0.12, 255, 235, 200, 0.98),
    stop(0.25, 255, 200, 150, 0.95),
    stop(0.38, 255, 160, 120, 0.92),
    stop(0.5,  230, 170, 200, 0.9),
    stop(0.62, 180, 180, 240, 0.9),
    stop(0.75, 120, 160, 255, 0.88),
    stop(0.88,  60, 120, 230, 0.6),
    stop(1.0,   40,  80, 180, 0.0),
];

/// Shock ring, drawn over `[0.7, 1] × radius`.
const RING_STOPS: [GradientStop; 4] = [
    stop(0.0, 255, 200, 255, 0.0),
    stop(0.4, 255, 150, 100, 0.3),
    stop(0.7, 100, 150, 255, 0.18),
    stop(1.0,   0,   0,   0, 0.0),
];
const RING_INNER: f32 = 0.7;

// ════════════════════════════════════════════════════════════════════════════
// Canvas
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blend {
    Add,
    Screen,
    Over,
}

/// `0x00RRGGBB` framebuffer with blended primitives.
pub struct Canvas {
    pub width:  usize,
    pub height: usize,
    pub buf:    Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { width, height, buf: vec![BG_COLOR; width * height] }
    }

    pub fn clear(&mut self, color: u32) { self.buf.fill(color); }

    pub fn pixel(&self, x: usize, y: usize) -> u32 { self.buf[y * self.width + x] }

    fn blend_px(&mut self, x: usize, y: usize, rgb: [f32; 3], alpha: f32, mode: Blend) {
        if x >= self.width || y >= self.height || alpha <= 0.0 {
            return;
        }
        let i = y * self.width + x;
        let dst = unpack(self.buf[i]);
        let a = alpha.min(1.0);
        let out = match mode {
            Blend::Add    => [dst[0] + rgb[0] * a, dst[1] + rgb[1] * a, dst[2] + rgb[2] * a],
            Blend::Screen => {
                let s = |d: f32, c: f32| 255.0 - (255.0 - d) * (1.0 - c * a / 255.0);
                [s(dst[0], rgb[0]), s(dst[1], rgb[1]), s(dst[2], rgb[2])]
            }
            Blend::Over   => {
                let o = |d: f32, c: f32| d * (1.0 - a) + c * a;
                [o(dst[0], rgb[0]), o(dst[1], rgb[1]), o(dst[2], rgb[2])]
            }
        };
        self.buf[i] = pack(out);
    }

    /// Radial gradient disc.  With `inner > 0` the gradient spans
    /// `[inner·radius, radius]` and the hole takes the first stop.
    pub fn radial(
        &mut self,
        center: Vec2,
        radius: f32,
        inner:  f32,
        stops:  &[GradientStop],
        alpha:  f32,
        mode:   Blend,
    ) {
        if radius <= 0.0 || alpha <= 0.0 {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.clip_box(center, radius) else { return };
        let start = radius * inner;
        let span = (radius - start).max(f32::EPSILON);
        for y in y0..y1 {
            for x in x0..x1 {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(center);
                if d > radius {
                    continue;
                }
                let t = ((d - start) / span).max(0.0);
                let (rgb, a) = sample_gradient(stops, t);
                self.blend_px(x, y, rgb, a * alpha, mode);
            }
        }
    }

    /// Thick polyline.
    pub fn stroke(&mut self, path: &[Vec2], width: f32, rgb: [u8; 3], alpha: f32, mode: Blend) {
        let half = width * 0.5;
        let c = [rgb[0] as f32, rgb[1] as f32, rgb[2] as f32];
        for seg in path.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            let lo = a.min(b) - Vec2::splat(half);
            let hi = a.max(b) + Vec2::splat(half);
            let Some((x0, y0, x1, y1)) = self.clip_rect(lo, hi) else { continue };
            for y in y0..y1 {
                for x in x0..x1 {
                    let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                    if segment_distance(p, a, b) <= half {
                        self.blend_px(x, y, c, alpha, mode);
                    }
                }
            }
        }
    }

    /// Flat full-canvas wash.
    pub fn wash(&mut self, rgb: [u8; 3], alpha: f32) {
        let c = [rgb[0] as f32, rgb[1] as f32, rgb[2] as f32];
        for y in 0..self.height {
            for x in 0..self.width {
                self.blend_px(x, y, c, alpha, Blend::Over);
            }
        }
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    /// 3×5 bitmap text, scaled.
    pub fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        let (px, py) = (cx + col * FONT_SCALE, y + row * FONT_SCALE);
                        self.fill_rect(px, py, FONT_SCALE, FONT_SCALE, color);
                    }
                }
            }
            cx += 4 * FONT_SCALE;
            if cx + 4 * FONT_SCALE > self.width { break; }
        }
    }

    fn clip_box(&self, center: Vec2, radius: f32) -> Option<(usize, usize, usize, usize)> {
        self.clip_rect(center - Vec2::splat(radius), center + Vec2::splat(radius))
    }

    fn clip_rect(&self, lo: Vec2, hi: Vec2) -> Option<(usize, usize, usize, usize)> {
        let x0 = lo.x.floor().max(0.0) as usize;
        let y0 = lo.y.floor().max(0.0) as usize;
        let x1 = (hi.x.ceil().max(0.0) as usize).min(self.width);
        let y1 = (hi.y.ceil().max(0.0) as usize).min(self.height);
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    // ── Effect layers ─────────────────────────────────────────────────────

    pub fn draw_frame(&mut self, frame: &RenderFrame<'_>) {
        self.clear(BG_COLOR);

        for g in frame.glows {
            self.radial(g.center, g.radius, 0.0, g.family.glow_gradient(), g.alpha, Blend::Screen);
        }

        if let Some(a) = frame.flash {
            self.wash(FLASH_RGB, a);
        }

        for hand in &frame.hands {
            let bone = match hand.handedness {
                Handedness::Left  => LEFT_BONE,
                Handedness::Right => RIGHT_BONE,
            };
            let alpha = 0.25 + 0.5 * hand.intensity;
            let pts: Vec<Vec2> = hand.landmarks.points().iter().map(|&p| frame.surface.project(p)).collect();
            for &(a, b) in HAND_CONNECTIONS.iter() {
                self.stroke(&[pts[a], pts[b]], 2.0, bone, alpha, Blend::Add);
            }
            for &p in &pts {
                self.stroke(&[p, p + Vec2::X], 4.0, bone, alpha, Blend::Add);
            }
            if hand.pinch {
                let r = palm_size_px(hand.landmarks, &frame.surface) * 0.25;
                let at = frame.surface.project(hand.landmarks.pinch_point());
                self.radial(at, r, RING_INNER, &RING_STOPS, alpha, Blend::Add);
            }
        }

        for b in frame.bursts {
            self.radial(b.position, b.radius, RING_INNER, &RING_STOPS, b.life, Blend::Add);
        }

        if let Some(ball) = frame.ball {
            self.radial(ball.position, ball.radius(), 0.0, &ORB_STOPS, 1.0, Blend::Over);
        }

        for p in frame.particles {
            self.radial(p.position, p.size, 0.0, p.family.gradient(), p.life, Blend::Add);
        }

        for bolt in frame.bolts {
            let life = bolt.life();
            let rgb = bolt.color.rgb();
            self.stroke(&bolt.path, 20.0, rgb, life * 0.3, Blend::Add);
            self.stroke(&bolt.path, 8.0, rgb, life * 0.6, Blend::Add);
            self.stroke(&bolt.path, 2.0, [255, 255, 255], life, Blend::Over);
        }
    }

    pub fn draw_status(&mut self, status: &str) {
        let w = self.width;
        self.fill_rect(0, STATUS_Y, w, STATUS_H, TEXT_BG);
        self.draw_label(status, 10, STATUS_Y + 3, 0xEEEEEE);
        self.draw_label(
            "1/2/3=mode  O=open F=fist P=pinch K=ok N=relax  Z/X=hands  C=clear  Q=quit",
            10, STATUS_Y + 17, 0x888888,
        );
    }
}

fn unpack(c: u32) -> [f32; 3] {
    [((c >> 16) & 0xFF) as f32, ((c >> 8) & 0xFF) as f32, (c & 0xFF) as f32]
}

fn pack(rgb: [f32; 3]) -> u32 {
    let ch = |v: f32| v.clamp(0.0, 255.0) as u32;
    (ch(rgb[0]) << 16) | (ch(rgb[1]) << 8) | ch(rgb[2])
}

fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    sim_tx: Sender<SimInput>,
    status: String,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self, ViewError> {
        let mut window = Window::new(
            "handfx — hand-driven effects",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.set_target_fps(60);

        Ok(Visualizer {
            window,
            canvas: Canvas::new(WIN_W, WIN_H),
            sim_tx,
            status: String::new(),
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    pub fn set_status(&mut self, status: String) { self.status = status; }

    /// Drawable area; the status bar is below it.
    pub fn surface_size(&self) -> (f32, f32) { (WIN_W as f32, STATUS_Y as f32) }

    /// Forward keys and the pointer to the simulator.  Returns false when
    /// the window should close.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        const KEYS: [(Key, SimKey); 11] = [
            (Key::Key1, SimKey::Mode(Mode::FireIce)),
            (Key::Key2, SimKey::Mode(Mode::Lightning)),
            (Key::Key3, SimKey::Mode(Mode::RedBlue)),
            (Key::O,    SimKey::Pose(Pose::Open)),
            (Key::F,    SimKey::Pose(Pose::Fist)),
            (Key::P,    SimKey::Pose(Pose::Pinch)),
            (Key::K,    SimKey::Pose(Pose::OkSign)),
            (Key::N,    SimKey::Pose(Pose::Relaxed)),
            (Key::Z,    SimKey::ToggleLeft),
            (Key::X,    SimKey::ToggleRight),
            (Key::C,    SimKey::Clear),
        ];

        if self.window.is_key_pressed(Key::Q, KeyRepeat::No) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::Quit));
            return false;
        }
        for (key, sim) in KEYS {
            if self.window.is_key_pressed(key, KeyRepeat::No) {
                let _ = self.sim_tx.send(SimInput::KeyDown(sim));
            }
        }

        let (w, h) = self.surface_size();
        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) {
            let _ = self.sim_tx.send(SimInput::Pointer { x: mx / w, y: my / h });
        }
        true
    }
}

impl EffectRenderer for Visualizer {
    fn render(&mut self, frame: &RenderFrame<'_>) {
        self.canvas.draw_frame(frame);
        self.canvas.draw_status(&self.status);
        self.window.update_with_buffer(&self.canvas.buf, WIN_W, WIN_H).ok();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '&' => [0b010, 0b101, 0b010, 0b101, 0b011],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use handfx::particle::Family;

    const WHITE: [f32; 3] = [255.0, 255.0, 255.0];

    #[test]
    fn pack_round_trip_and_saturation() {
        assert_eq!(pack(unpack(0x123456)), 0x123456);
        assert_eq!(pack([300.0, -5.0, 128.0]), 0xFF0080);
    }

    #[test]
    fn additive_blend_saturates() {
        let mut c = Canvas::new(4, 4);
        c.clear(0x808080);
        c.blend_px(1, 1, WHITE, 1.0, Blend::Add);
        assert_eq!(c.pixel(1, 1), 0xFFFFFF);
        assert_eq!(c.pixel(0, 0), 0x808080);
    }

    #[test]
    fn screen_blend_never_darkens() {
        let mut c = Canvas::new(2, 1);
        c.clear(0x404040);
        c.blend_px(0, 0, [10.0, 10.0, 10.0], 0.5, Blend::Screen);
        let [r, g, b] = unpack(c.pixel(0, 0));
        assert!(r >= 64.0 && g >= 64.0 && b >= 64.0);
    }

    #[test]
    fn over_blend_interpolates() {
        let mut c = Canvas::new(1, 1);
        c.clear(0x000000);
        c.blend_px(0, 0, [200.0, 100.0, 0.0], 0.5, Blend::Over);
        assert_eq!(c.pixel(0, 0), 0x643200);
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut c = Canvas::new(4, 4);
        c.blend_px(10, 10, WHITE, 1.0, Blend::Add);
        c.radial(Vec2::new(-50.0, -50.0), 10.0, 0.0, Family::Fire.gradient(), 1.0, Blend::Add);
        assert!(c.buf.iter().all(|&p| p == BG_COLOR));
    }

    #[test]
    fn particle_disc_brightest_at_center() {
        let mut c = Canvas::new(64, 64);
        c.clear(0);
        c.radial(Vec2::new(32.0, 32.0), 20.0, 0.0, Family::Ice.gradient(), 1.0, Blend::Add);
        let center = unpack(c.pixel(32, 32));
        let edge = unpack(c.pixel(32, 50));
        assert!(center[2] > edge[2]);
        assert_eq!(c.pixel(0, 0), 0);
    }

    #[test]
    fn life_scales_opacity() {
        let mut full = Canvas::new(16, 16);
        let mut half = Canvas::new(16, 16);
        full.clear(0);
        half.clear(0);
        let at = Vec2::new(8.0, 8.0);
        full.radial(at, 6.0, 0.0, Family::Red.gradient(), 1.0, Blend::Add);
        half.radial(at, 6.0, 0.0, Family::Red.gradient(), 0.5, Blend::Add);
        assert!(unpack(full.pixel(8, 8))[0] > unpack(half.pixel(8, 8))[0]);
    }

    #[test]
    fn ring_leaves_hole() {
        let mut c = Canvas::new(100, 100);
        c.clear(0);
        c.radial(Vec2::new(50.0, 50.0), 40.0, RING_INNER, &RING_STOPS, 1.0, Blend::Add);
        assert_eq!(c.pixel(50, 50), 0);
        assert_ne!(c.pixel(50, 50 + 34), 0);
    }

    #[test]
    fn stroke_covers_segment() {
        let mut c = Canvas::new(32, 32);
        c.clear(0);
        c.stroke(&[Vec2::new(2.0, 16.0), Vec2::new(30.0, 16.0)], 4.0, [255, 0, 0], 1.0, Blend::Over);
        assert_eq!(c.pixel(16, 16), 0xFF0000);
        assert_eq!(c.pixel(16, 2), 0);
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Vec2::ZERO;
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(segment_distance(Vec2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(segment_distance(Vec2::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(segment_distance(Vec2::new(1.0, 1.0), a, a), 2f32.sqrt());
    }

    #[test]
    fn label_draws_pixels() {
        let mut c = Canvas::new(64, 16);
        c.clear(0);
        c.draw_label("A1", 0, 0, 0xFFFFFF);
        assert!(c.buf.iter().any(|&p| p == 0xFFFFFF));
    }
}
