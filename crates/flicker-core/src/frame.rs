use crate::color::WarmColor;
use crate::compositor::{ambient_opacity, compose, effect_time};
use crate::config::Config;
use crate::shadow::ShadowBuilder;

/// Minimum spacing of accepted ticks (~30 fps; plenty for candle flicker).
pub const MIN_FRAME_MS: f64 = 33.0;
/// The shadow stylesheet is rebuilt on every Nth accepted frame.
pub const SHADOW_FRAME_DIVISOR: u64 = 4;

/// Throttle and time origin of the animation.
#[derive(Clone, Debug, Default)]
pub struct FrameClock {
    origin: Option<f64>,
    last_frame: Option<f64>,
    frames: u64,
}

impl FrameClock {
    /// Accept `now` if enough time passed since the last accepted tick.
    pub fn accept(&mut self, now: f64) -> bool {
        if let Some(last) = self.last_frame {
            if now - last < MIN_FRAME_MS {
                return false;
            }
        }
        self.last_frame = Some(now);
        self.frames += 1;
        true
    }

    /// Milliseconds since the first rendered tick after the last restart.
    pub fn elapsed(&mut self, now: f64) -> f64 {
        now - *self.origin.get_or_insert(now)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Forget the time origin and throttle state; the frame counter keeps
    /// running so shadow updates stay on their cadence.
    pub fn restart(&mut self) {
        self.origin = None;
        self.last_frame = None;
    }
}

/// Surface writes for one tick. `None` leaves the surface untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderCommand {
    /// Run the classification pass before applying anything below.
    pub classify: bool,
    pub overlay_background: Option<String>,
    pub overlay_opacity: Option<&'static str>,
    pub ambient_opacity: Option<String>,
    /// New stylesheet text; `Some("")` clears it.
    pub stylesheet: Option<String>,
}

impl RenderCommand {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Scheduling policy of the effect: throttle, blanking when inactive, and
/// quarter-rate shadow rebuilds with diffing against the last applied text.
#[derive(Debug, Default)]
pub struct RenderLoop {
    clock: FrameClock,
    shadows: ShadowBuilder,
    last_css: String,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn restart(&mut self) {
        self.clock.restart();
    }

    /// Text of the stylesheet as last applied.
    pub fn applied_css(&self) -> &str {
        &self.last_css
    }

    /// The stylesheet element is gone; the next non-empty build must write.
    pub fn forget_stylesheet(&mut self) {
        self.last_css.clear();
    }

    pub fn tick(
        &mut self,
        now: f64,
        config: &Config,
        active: bool,
        color: &WarmColor,
        classify_due: bool,
    ) -> RenderCommand {
        let mut cmd = RenderCommand::default();
        if !self.clock.accept(now) {
            return cmd;
        }

        if !active {
            self.blank(&mut cmd);
            cmd.ambient_opacity = Some("0".to_string());
            return cmd;
        }

        let t = effect_time(self.clock.elapsed(now), config.speed);
        cmd.ambient_opacity = Some(ambient_opacity(t, config));

        if config.directions.is_empty() {
            self.blank(&mut cmd);
            return cmd;
        }

        cmd.classify = config.shadows && classify_due;

        let composite = compose(t, config, color);
        cmd.overlay_opacity = Some("1");
        cmd.overlay_background = Some(composite.background);

        if !config.shadows {
            self.clear_stylesheet(&mut cmd);
            return cmd;
        }
        if self.clock.frames() % SHADOW_FRAME_DIVISOR != 0 {
            return cmd;
        }

        let css = self.shadows.build(t, config, color, &composite.flicker);
        if css != self.last_css {
            self.last_css.clone_from(&css);
            cmd.stylesheet = Some(css);
        }
        cmd
    }

    /// Zero overlay and drop shadows, leaving ambient to the caller.
    fn blank(&mut self, cmd: &mut RenderCommand) {
        cmd.overlay_opacity = Some("0");
        self.clear_stylesheet(cmd);
    }

    fn clear_stylesheet(&mut self, cmd: &mut RenderCommand) {
        if !self.last_css.is_empty() {
            self.last_css.clear();
            cmd.stylesheet = Some(String::new());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Direction, Directions};

    fn tick_at(lp: &mut RenderLoop, now: f64, cfg: &Config) -> RenderCommand {
        lp.tick(now, cfg, true, &WarmColor::new(cfg.warmth), false)
    }

    #[test]
    fn throttles_to_min_interval() {
        let mut clock = FrameClock::default();
        assert!(clock.accept(0.0));
        assert!(!clock.accept(16.0));
        assert!(clock.accept(33.0));
        assert!(!clock.accept(50.0));
        assert!(clock.accept(70.0));
        assert_eq!(clock.frames(), 3);
    }

    #[test]
    fn elapsed_starts_at_zero_after_restart() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.elapsed(500.0), 0.0);
        assert_eq!(clock.elapsed(750.0), 250.0);
        clock.restart();
        assert_eq!(clock.elapsed(9000.0), 0.0);
    }

    #[test]
    fn skipped_ticks_do_nothing() {
        let mut lp = RenderLoop::new();
        let cfg = Config::default();
        assert!(!tick_at(&mut lp, 0.0, &cfg).is_empty());
        assert!(tick_at(&mut lp, 10.0, &cfg).is_empty());
    }

    #[test]
    fn shadows_rebuild_every_fourth_frame_and_diff() {
        let mut lp = RenderLoop::new();
        let cfg = Config::default();
        let mut writes = Vec::new();
        for i in 0..8 {
            let cmd = tick_at(&mut lp, i as f64 * 40.0, &cfg);
            assert!(cmd.overlay_background.is_some());
            writes.push(cmd.stylesheet.is_some());
        }
        assert_eq!(writes, [false, false, false, true, false, false, false, true]);
        assert!(!lp.applied_css().is_empty());
    }

    #[test]
    fn frozen_time_skips_redundant_stylesheet_writes() {
        // speed 0 freezes t, so every rebuild produces the same text
        let cfg = Config {
            speed: 0,
            ..Config::default()
        };
        let mut lp = RenderLoop::new();
        let writes = (0..16)
            .filter(|i| tick_at(&mut lp, *i as f64 * 40.0, &cfg).stylesheet.is_some())
            .count();
        assert_eq!(writes, 1);
    }

    #[test]
    fn inactive_blanks_everything() {
        let mut lp = RenderLoop::new();
        let cfg = Config::default();
        for i in 0..4 {
            tick_at(&mut lp, i as f64 * 40.0, &cfg);
        }
        let cmd = lp.tick(200.0, &cfg, false, &WarmColor::new(50), true);
        assert!(!cmd.classify);
        assert_eq!(cmd.overlay_opacity, Some("0"));
        assert_eq!(cmd.ambient_opacity.as_deref(), Some("0"));
        assert_eq!(cmd.stylesheet.as_deref(), Some(""));
        assert!(cmd.overlay_background.is_none());

        let again = lp.tick(300.0, &cfg, false, &WarmColor::new(50), true);
        assert_eq!(again.stylesheet, None);
    }

    #[test]
    fn empty_directions_zero_the_overlay() {
        let cfg = Config {
            directions: Directions::new(),
            ..Config::default()
        };
        let mut lp = RenderLoop::new();
        let cmd = lp.tick(0.0, &cfg, true, &WarmColor::new(50), true);
        assert_eq!(cmd.overlay_opacity, Some("0"));
        assert!(!cmd.classify);
        assert!(cmd.ambient_opacity.is_some());
    }

    #[test]
    fn disabling_shadows_clears_the_stylesheet() {
        let mut lp = RenderLoop::new();
        let mut cfg = Config::default();
        cfg.directions = Directions::from([Direction::Bottom]);
        for i in 0..4 {
            tick_at(&mut lp, i as f64 * 40.0, &cfg);
        }
        cfg.shadows = false;
        let cmd = lp.tick(200.0, &cfg, true, &WarmColor::new(50), true);
        assert!(!cmd.classify);
        assert_eq!(cmd.stylesheet.as_deref(), Some(""));
        assert_eq!(cmd.overlay_opacity, Some("1"));
    }

    #[test]
    fn classification_is_requested_only_when_due() {
        let mut lp = RenderLoop::new();
        let cfg = Config::default();
        let color = WarmColor::new(50);
        assert!(lp.tick(0.0, &cfg, true, &color, true).classify);
        assert!(!lp.tick(40.0, &cfg, true, &color, false).classify);
    }
}
