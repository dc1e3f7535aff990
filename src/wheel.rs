//! Wheel of fortune: sector layout and the spin simulation.
//!
//! Angles are degrees, clockwise, with 0 at the top of the wheel (the start
//! of a CSS conic gradient). Velocity is degrees per animation frame.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const MAX_WHEEL_OPTIONS: usize = 30;

pub const FRICTION_SLOW: f64 = 0.99;
pub const FRICTION_FAST: f64 = 0.998;
pub const INITIAL_VELOCITY_MIN: f64 = 30.0;
pub const INITIAL_VELOCITY_MAX: f64 = 80.0;
pub const MIN_VELOCITY: f64 = 0.05;
pub const MAX_VELOCITY: f64 = 70.0;
pub const BRAKE_VELOCITY: f64 = 1.0;
pub const BRAKE_FRICTION: f64 = 0.95;

const LABEL_RADIUS_PERCENT: f64 = 25.0;
const DARKEN_PERCENT: f64 = 20.0;
const LIGHTEN_PERCENT: f64 = 15.0;

pub const PLACEHOLDER_ID: &str = "placeholder";
pub const PLACEHOLDER_LABEL: &str = "?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelOption {
    #[serde(default = "new_option_id")]
    pub id: String,
    #[serde(default)]
    pub label: String,
}

impl WheelOption {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: new_option_id(),
            label: label.into(),
        }
    }

    pub fn placeholder() -> Self {
        Self {
            id: PLACEHOLDER_ID.into(),
            label: PLACEHOLDER_LABEL.into(),
        }
    }
}

fn new_option_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelSector {
    pub id: String,
    pub label: String,
    pub left_percent: f64,
    pub top_percent: f64,
    pub rotation_degrees: f64,
    pub color: String,
    pub start_degrees: f64,
    pub end_degrees: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelLayout {
    pub sectors: Vec<WheelSector>,
    /// Start angle of every sector but the first.
    pub boundaries: Vec<f64>,
    pub segment_angle: f64,
    pub gradient: String,
}

impl WheelLayout {
    pub fn options(&self) -> impl Iterator<Item = WheelOption> + '_ {
        self.sectors.iter().map(|sector| WheelOption {
            id: sector.id.clone(),
            label: sector.label.clone(),
        })
    }

    /// Sector under a pointer fixed at the top after the wheel has turned
    /// clockwise by `angle`.
    pub fn sector_under_pointer(&self, angle: f64) -> usize {
        if self.sectors.is_empty() {
            return 0;
        }
        let on_wheel = (360.0 - angle.rem_euclid(360.0)).rem_euclid(360.0);
        let index = (on_wheel / self.segment_angle).floor() as usize;
        index.min(self.sectors.len() - 1)
    }
}

pub fn generate_sectors(options: &[WheelOption], base_color: &str) -> WheelLayout {
    let mut visible: Vec<WheelOption> = options
        .iter()
        .filter(|option| !option.label.trim().is_empty())
        .cloned()
        .collect();
    if visible.is_empty() {
        visible.push(WheelOption::placeholder());
    }

    let count = visible.len();
    let segment_angle = 360.0 / count as f64;
    let darker = color_darker(base_color);
    let lighter = color_lighter(base_color);

    let sectors: Vec<WheelSector> = visible
        .into_iter()
        .enumerate()
        .map(|(i, option)| {
            let start = i as f64 * segment_angle;
            let end = start + segment_angle;
            let mid = start + segment_angle / 2.0;
            let radians = (mid - 90.0) * PI / 180.0;

            let color = if count > 1 && count % 2 == 1 && i == count - 1 {
                lighter.clone()
            } else if i % 2 == 0 {
                base_color.to_string()
            } else {
                darker.clone()
            };

            WheelSector {
                id: option.id,
                label: option.label,
                left_percent: 50.0 + LABEL_RADIUS_PERCENT * radians.cos(),
                top_percent: 50.0 + LABEL_RADIUS_PERCENT * radians.sin(),
                rotation_degrees: mid + 270.0,
                color,
                start_degrees: start,
                end_degrees: end,
            }
        })
        .collect();

    let boundaries = sectors.iter().skip(1).map(|sector| sector.start_degrees).collect();
    let gradient = conic_gradient(&sectors);

    WheelLayout {
        sectors,
        boundaries,
        segment_angle,
        gradient,
    }
}

fn conic_gradient(sectors: &[WheelSector]) -> String {
    let stops: Vec<String> = sectors
        .iter()
        .map(|sector| {
            format!(
                "{} {}deg {}deg",
                sector.color,
                trim_degrees(sector.start_degrees),
                trim_degrees(sector.end_degrees)
            )
        })
        .collect();
    format!("conic-gradient({})", stops.join(", "))
}

fn trim_degrees(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub fn color_darker(color: &str) -> String {
    shade_color(color, -DARKEN_PERCENT)
}

pub fn color_lighter(color: &str) -> String {
    shade_color(color, LIGHTEN_PERCENT)
}

/// Scales every RGB channel by `(100 + percent) / 100`. Colors that are not
/// `#RGB` / `#RRGGBB` come back unchanged.
pub fn shade_color(color: &str, percent: f64) -> String {
    let Some([r, g, b]) = parse_hex(color) else {
        return color.to_string();
    };
    let factor = (100.0 + percent) / 100.0;
    let scale = |channel: u8| (channel as f64 * factor).round().clamp(0.0, 255.0) as u8;
    format!("#{:02X}{:02X}{:02X}", scale(r), scale(g), scale(b))
}

fn parse_hex(color: &str) -> Option<[u8; 3]> {
    let hex = color.trim().strip_prefix('#')?;
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Effects fired by the simulation. Sound and particles live with the caller.
pub trait WheelHooks {
    fn on_sector_cross(&mut self, _angle: f64) {}
    fn on_stop(&mut self, _angle: f64) {}
}

impl WheelHooks for () {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tick {
    pub crossings: u32,
    pub stopped: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpinSummary {
    pub ticks: u32,
    pub crossings: u32,
    pub stopped: bool,
}

#[derive(Debug, Clone)]
pub struct WheelSimulation<R = StdRng> {
    angle: f64,
    velocity: f64,
    friction: f64,
    is_spinning: bool,
    previous_angle: f64,
    boundaries: Vec<f64>,
    rng: R,
}

impl WheelSimulation<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for WheelSimulation<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> WheelSimulation<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            angle: 0.0,
            velocity: 0.0,
            friction: FRICTION_FAST,
            is_spinning: false,
            previous_angle: 0.0,
            boundaries: Vec::new(),
            rng,
        }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn is_spinning(&self) -> bool {
        self.is_spinning
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Replaces the boundary list; call whenever the sector count changes.
    pub fn set_layout(&mut self, layout: &WheelLayout) {
        self.boundaries = layout.boundaries.clone();
    }

    /// Starts a spin, or boosts one already running. Boosts shrink as the
    /// wheel gets faster and the result is capped at [`MAX_VELOCITY`].
    pub fn spin(&mut self) {
        self.friction = self.rng.random_range(FRICTION_SLOW..=FRICTION_FAST);
        if !self.is_spinning {
            self.velocity = self
                .rng
                .random_range(INITIAL_VELOCITY_MIN..=INITIAL_VELOCITY_MAX);
            self.is_spinning = true;
            return;
        }

        let boost = if self.velocity > 30.0 {
            self.rng.random_range(2.5..=5.0)
        } else if self.velocity > 15.0 {
            self.rng.random_range(5.0..=10.0)
        } else {
            self.rng.random_range(10.0..=17.5)
        };
        self.velocity = (self.velocity + boost).min(MAX_VELOCITY);
    }

    /// Soft brake: the wheel coasts to a halt over a few frames.
    pub fn stop_spin(&mut self) {
        self.velocity = self.velocity.min(BRAKE_VELOCITY);
        self.friction = BRAKE_FRICTION;
    }

    pub fn update(&mut self, hooks: &mut impl WheelHooks) -> Tick {
        let mut tick = Tick::default();
        if self.velocity > MIN_VELOCITY {
            self.velocity *= self.friction;
            self.angle = (self.angle + self.velocity).rem_euclid(360.0);
            tick.crossings = self.crossings_between(self.previous_angle, self.angle);
            for _ in 0..tick.crossings {
                hooks.on_sector_cross(self.angle);
            }
        } else if self.is_spinning {
            self.velocity = 0.0;
            self.is_spinning = false;
            tick.stopped = true;
            hooks.on_stop(self.angle);
        }
        self.previous_angle = self.angle;
        tick
    }

    /// Runs frames until the wheel stops or `max_ticks` frames have elapsed.
    pub fn run_until_stopped(&mut self, max_ticks: u32, hooks: &mut impl WheelHooks) -> SpinSummary {
        let mut summary = SpinSummary::default();
        while summary.ticks < max_ticks {
            let tick = self.update(hooks);
            summary.ticks += 1;
            summary.crossings += tick.crossings;
            if tick.stopped {
                summary.stopped = true;
                break;
            }
        }
        summary
    }

    fn crossings_between(&self, previous: f64, current: f64) -> u32 {
        if current < previous {
            // Wrapped past 0, which is itself a boundary.
            let tail = self.boundaries.iter().filter(|&&b| b > previous).count();
            let head = self.boundaries.iter().filter(|&&b| b < current).count();
            (1 + tail + head) as u32
        } else {
            self.boundaries
                .iter()
                .filter(|&&b| previous < b && b < current)
                .count() as u32
        }
    }

    #[cfg(test)]
    fn set_motion(&mut self, angle: f64, velocity: f64, friction: f64) {
        self.angle = angle;
        self.previous_angle = angle;
        self.velocity = velocity;
        self.friction = friction;
        self.is_spinning = velocity > 0.0;
    }
}

/// Frame driver with an explicit lifecycle. Frames are skipped while the
/// loop is stopped or the wheel is not on screen.
#[derive(Debug, Default)]
pub struct AnimationLoop {
    running: bool,
    visible: bool,
    frames: u64,
}

impl AnimationLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_active(&self) -> bool {
        self.running && self.visible
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn frame<R: Rng>(
        &mut self,
        simulation: &mut WheelSimulation<R>,
        hooks: &mut impl WheelHooks,
    ) -> Option<Tick> {
        if !self.is_active() {
            return None;
        }
        self.frames += 1;
        Some(simulation.update(hooks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        crossings: u32,
        stops: u32,
    }

    impl WheelHooks for Recorder {
        fn on_sector_cross(&mut self, _angle: f64) {
            self.crossings += 1;
        }

        fn on_stop(&mut self, _angle: f64) {
            self.stops += 1;
        }
    }

    fn options(labels: &[&str]) -> Vec<WheelOption> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| WheelOption {
                id: format!("opt-{i}"),
                label: label.to_string(),
            })
            .collect()
    }

    #[test]
    fn blank_labels_are_dropped() {
        let layout = generate_sectors(&options(&["a", "  ", "b", ""]), "#808080");
        let labels: Vec<_> = layout.sectors.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["a", "b"]);
        assert_eq!(layout.segment_angle, 180.0);
        assert_eq!(layout.boundaries, [180.0]);
    }

    #[test]
    fn all_blank_gives_placeholder() {
        let layout = generate_sectors(&options(&["", " \t "]), "#808080");
        assert_eq!(layout.sectors.len(), 1);
        assert_eq!(layout.sectors[0].id, PLACEHOLDER_ID);
        assert_eq!(layout.sectors[0].label, PLACEHOLDER_LABEL);
        assert!(layout.boundaries.is_empty());

        let layout = generate_sectors(&[], "#808080");
        assert_eq!(layout.sectors[0].id, PLACEHOLDER_ID);
    }

    #[test]
    fn odd_count_uses_lighter_last_sector() {
        let base = "#646464";
        let layout = generate_sectors(&options(&["a", "b", "c", "d", "e"]), base);
        let colors: Vec<_> = layout.sectors.iter().map(|s| s.color.as_str()).collect();
        let darker = color_darker(base);
        let lighter = color_lighter(base);
        assert_eq!(colors, [base, darker.as_str(), base, darker.as_str(), lighter.as_str()]);
        assert_ne!(colors[4], colors[0]);
        assert_ne!(colors[4], colors[3]);
    }

    #[test]
    fn even_count_alternates() {
        let base = "#646464";
        let layout = generate_sectors(&options(&["a", "b", "c", "d"]), base);
        let darker = color_darker(base);
        assert_eq!(layout.sectors[3].color, darker);
        assert_eq!(layout.sectors[0].color, base);
        let single = generate_sectors(&options(&["a"]), base);
        assert_eq!(single.sectors[0].color, base);
    }

    #[test]
    fn shades_scale_each_channel() {
        assert_eq!(color_darker("#646464"), "#505050");
        assert_eq!(color_lighter("#646464"), "#737373");
        assert_eq!(color_lighter("#FFFFFF"), "#FFFFFF");
        assert_eq!(color_darker("#fff"), "#CCCCCC");
        assert_eq!(color_darker("rgba(0,0,0,0.4)"), "rgba(0,0,0,0.4)");
    }

    #[test]
    fn labels_sit_on_the_inner_circle() {
        let layout = generate_sectors(&options(&["a", "b", "c", "d"]), "#808080");
        let first = &layout.sectors[0];
        // mid 45deg -> up and to the right
        assert!((first.left_percent - (50.0 + 25.0 * (-45f64).to_radians().cos())).abs() < 1e-9);
        assert!(first.top_percent < 50.0);
        assert!(first.left_percent > 50.0);
        assert_eq!(first.rotation_degrees, 315.0);

        let third = &layout.sectors[2];
        assert!(third.left_percent < 50.0);
        assert!(third.top_percent > 50.0);
    }

    #[test]
    fn gradient_lists_each_sector() {
        let layout = generate_sectors(&options(&["a", "b", "c"]), "#646464");
        assert_eq!(
            layout.gradient,
            "conic-gradient(#646464 0deg 120deg, #505050 120deg 240deg, #737373 240deg 360deg)"
        );
    }

    #[test]
    fn pointer_picks_sector_against_rotation() {
        let layout = generate_sectors(&options(&["a", "b", "c", "d"]), "#808080");
        assert_eq!(layout.sector_under_pointer(0.0), 0);
        assert_eq!(layout.sector_under_pointer(10.0), 3);
        assert_eq!(layout.sector_under_pointer(100.0), 2);
        assert_eq!(layout.sector_under_pointer(359.0), 0);
        assert_eq!(layout.sector_under_pointer(720.0 + 10.0), 3);
    }

    #[test]
    fn first_spin_draws_initial_velocity() {
        let mut sim = WheelSimulation::seeded(7);
        sim.spin();
        assert!(sim.is_spinning());
        assert!((INITIAL_VELOCITY_MIN..=INITIAL_VELOCITY_MAX).contains(&sim.velocity()));
        assert!((FRICTION_SLOW..=FRICTION_FAST).contains(&sim.friction()));
    }

    #[test]
    fn boosts_shrink_with_speed_and_cap() {
        let mut sim = WheelSimulation::seeded(1);
        sim.set_motion(0.0, 10.0, 0.99);
        sim.spin();
        assert!((20.0..=27.5).contains(&sim.velocity()));

        sim.set_motion(0.0, 20.0, 0.99);
        sim.spin();
        assert!((25.0..=30.0).contains(&sim.velocity()));

        sim.set_motion(0.0, 40.0, 0.99);
        sim.spin();
        assert!((42.5..=45.0).contains(&sim.velocity()));

        sim.set_motion(0.0, 68.0, 0.99);
        for _ in 0..10 {
            sim.spin();
        }
        assert_eq!(sim.velocity(), MAX_VELOCITY);
    }

    #[test]
    fn velocity_decays_until_a_single_stop() {
        let mut sim = WheelSimulation::seeded(3);
        sim.set_layout(&generate_sectors(&options(&["a", "b", "c"]), "#808080"));
        sim.set_motion(0.0, 12.0, 0.95);
        let mut hooks = Recorder::default();

        let mut last = sim.velocity();
        loop {
            let tick = sim.update(&mut hooks);
            if tick.stopped {
                break;
            }
            assert!(sim.velocity() < last);
            last = sim.velocity();
        }
        assert!(last <= MIN_VELOCITY);
        assert!(!sim.is_spinning());
        assert_eq!(sim.velocity(), 0.0);
        assert_eq!(hooks.stops, 1);

        for _ in 0..5 {
            sim.update(&mut hooks);
        }
        assert_eq!(hooks.stops, 1);
        assert!(!sim.is_spinning());
    }

    #[test]
    fn crossing_boundaries_fires_tick_hook() {
        let mut sim = WheelSimulation::seeded(5);
        sim.set_layout(&generate_sectors(&options(&["a", "b", "c", "d"]), "#808080"));
        let mut hooks = Recorder::default();

        sim.set_motion(80.0, 20.0, 1.0);
        let tick = sim.update(&mut hooks);
        assert_eq!(tick.crossings, 1);
        assert_eq!(sim.angle(), 100.0);

        sim.set_motion(100.0, 5.0, 1.0);
        assert_eq!(sim.update(&mut hooks).crossings, 0);

        sim.set_motion(350.0, 20.0, 1.0);
        assert_eq!(sim.update(&mut hooks).crossings, 1);
        assert_eq!(sim.angle(), 10.0);

        assert_eq!(hooks.crossings, 2);
    }

    #[test]
    fn fast_frame_counts_every_boundary_passed() {
        let labels: Vec<String> = (0..30).map(|i| format!("o{i}")).collect();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        let mut sim = WheelSimulation::seeded(6);
        sim.set_layout(&generate_sectors(&options(&labels), "#808080"));
        let mut hooks = Recorder::default();

        // 12, 24, ... 84
        sim.set_motion(5.0, 80.0, 1.0);
        let tick = sim.update(&mut hooks);
        assert_eq!(sim.angle(), 85.0);
        assert_eq!(tick.crossings, 7);
        assert_eq!(hooks.crossings, 7);
    }

    #[test]
    fn wrap_counts_boundaries_on_both_sides_of_zero() {
        let mut sim = WheelSimulation::seeded(8);
        sim.set_layout(&generate_sectors(&options(&["a", "b", "c", "d"]), "#808080"));
        let mut hooks = Recorder::default();

        // 270, then 0, then 90
        sim.set_motion(260.0, 200.0, 1.0);
        let tick = sim.update(&mut hooks);
        assert_eq!(sim.angle(), 100.0);
        assert_eq!(tick.crossings, 3);

        // 0 only
        sim.set_motion(275.0, 100.0, 1.0);
        assert_eq!(sim.update(&mut hooks).crossings, 1);
        assert_eq!(hooks.crossings, 4);
    }

    #[test]
    fn stop_spin_brakes_softly() {
        let mut sim = WheelSimulation::seeded(9);
        sim.spin();
        sim.stop_spin();
        assert!(sim.velocity() <= BRAKE_VELOCITY);
        assert_eq!(sim.friction(), BRAKE_FRICTION);
        assert!(sim.is_spinning());

        let summary = sim.run_until_stopped(1_000, &mut ());
        assert!(summary.stopped);
        assert!(summary.ticks > 1);
        assert!(summary.ticks < 100);
    }

    #[test]
    fn full_spin_comes_to_rest() {
        let mut sim = WheelSimulation::seeded(11);
        sim.set_layout(&generate_sectors(&options(&["a", "b", "c", "d", "e"]), "#808080"));
        sim.spin();
        let mut hooks = Recorder::default();
        let summary = sim.run_until_stopped(20_000, &mut hooks);
        assert!(summary.stopped);
        assert_eq!(hooks.stops, 1);
        assert_eq!(hooks.crossings, summary.crossings);
        assert!(summary.crossings > 5);
    }

    #[test]
    fn animation_loop_gates_frames() {
        let mut sim = WheelSimulation::seeded(2);
        sim.spin();
        let mut driver = AnimationLoop::new();

        assert!(driver.frame(&mut sim, &mut ()).is_none());
        driver.start();
        assert!(driver.frame(&mut sim, &mut ()).is_none());
        driver.set_visible(true);
        assert!(driver.frame(&mut sim, &mut ()).is_some());
        let angle = sim.angle();

        driver.set_visible(false);
        assert!(driver.frame(&mut sim, &mut ()).is_none());
        assert_eq!(sim.angle(), angle);
        assert_eq!(driver.frames(), 1);

        driver.set_visible(true);
        driver.stop();
        assert!(!driver.is_active());
    }
}
