//! Lifecycle of the effect on one page.
//!
//! `EffectSession` owns the configuration snapshot, the cached color, the
//! classifier and the render loop, and is the only thing that writes to the
//! surface. Hosts call it from a single thread: configuration and message
//! handlers between ticks, `tick` once per animation frame.

use crate::classify::{Classifier, ReclassifySchedule};
use crate::color::WarmColor;
use crate::config::{Config, ConfigPatch};
use crate::frame::{RenderCommand, RenderLoop};
use crate::message::{site_label, Message, Reply};
use crate::surface::Surface;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unmounted,
    /// Layers exist but show nothing.
    Inactive,
    Active,
}

/// What the host has to do after a runtime message.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageOutcome {
    pub reply: Option<Reply>,
    /// Settings to write back to storage.
    pub persist: Option<ConfigPatch>,
}

pub struct EffectSession<S: Surface> {
    surface: S,
    hostname: String,
    config: Config,
    color: WarmColor,
    classifier: Classifier<S::Element>,
    reclassify: ReclassifySchedule,
    render: RenderLoop,
    mounted: bool,
    hidden: bool,
    running: bool,
}

impl<S: Surface> EffectSession<S> {
    pub fn new(surface: S, hostname: impl Into<String>) -> Self {
        let config = Config::default();
        Self {
            surface,
            hostname: hostname.into(),
            color: WarmColor::new(config.warmth),
            config,
            classifier: Classifier::new(),
            reclassify: ReclassifySchedule::default(),
            render: RenderLoop::new(),
            mounted: false,
            hidden: false,
            running: false,
        }
    }

    pub fn state(&self) -> SessionState {
        if !self.mounted {
            SessionState::Unmounted
        } else if self.is_active() && !self.config.directions.is_empty() {
            SessionState::Active
        } else {
            SessionState::Inactive
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Effective on/off state for this page.
    pub fn is_active(&self) -> bool {
        self.config.is_active(&self.hostname)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether the host should keep requesting frames.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Replace the whole snapshot. Starts the effect when it becomes active;
    /// otherwise a mounted session goes quiet but keeps its layers.
    pub fn apply_config(&mut self, config: Config) {
        if self.color.update(config.warmth) {
            log::debug!("[session] warm color {}", self.color.css());
        }
        self.config = config;
        self.reclassify.force();

        if self.is_active() {
            self.start();
        } else if self.mounted {
            self.deactivate();
        }
    }

    pub fn apply_patch(&mut self, patch: &ConfigPatch) {
        if patch.is_empty() {
            return;
        }
        self.apply_config(self.config.merged(patch));
    }

    /// Mount if needed and resume the frame loop unless the page is hidden.
    pub fn start(&mut self) {
        if !self.mounted {
            self.surface.mount();
            self.mounted = true;
            self.render.forget_stylesheet();
            self.reclassify.force();
            log::debug!("[session] mounted on {}", site_label(Some(&self.hostname)));
        }
        if !self.running && !self.hidden {
            self.running = true;
            self.render.restart();
            log::debug!("[session] frame loop started");
        }
    }

    /// Remove the layers, the stylesheet and every classification tag.
    pub fn unmount(&mut self) {
        self.running = false;
        if !self.mounted {
            return;
        }
        let removed = self.classifier.clear(&mut self.surface);
        self.surface.unmount();
        self.mounted = false;
        self.render.forget_stylesheet();
        log::debug!("[session] unmounted, {removed} tags removed");
    }

    fn deactivate(&mut self) {
        self.running = false;
        self.surface.set_overlay_opacity("0");
        self.surface.set_ambient_opacity("0");
        if !self.render.applied_css().is_empty() {
            self.surface.set_stylesheet_text("");
            self.render.forget_stylesheet();
        }
        log::debug!("[session] inactive");
    }

    /// Page visibility changed. Hidden pages get no frames at all.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
        if hidden {
            if self.running {
                self.running = false;
                log::debug!("[session] paused");
            }
        } else if self.mounted && self.is_active() {
            self.reclassify.force();
            self.start();
        }
    }

    /// Layout moved (scroll, resize). Coalesced by the cooldown.
    pub fn request_reclassification(&mut self) {
        self.reclassify.request();
    }

    /// One animation frame at host time `now` (ms). Classification, when
    /// due, runs before any style write of the same frame.
    pub fn tick(&mut self, now: f64) -> RenderCommand {
        if !self.running || !self.mounted {
            return RenderCommand::default();
        }
        let active = self.is_active();
        let due = self.reclassify.is_due(now);
        let cmd = self
            .render
            .tick(now, &self.config, active, &self.color, due);

        if cmd.classify {
            let stats = self.classifier.classify(&mut self.surface, &self.config);
            self.reclassify.mark_done(now);
            log::trace!(
                "[classify] {} scanned, {} lit, {} offscreen, {} evicted, {} writes",
                stats.scanned,
                stats.lit,
                stats.offscreen,
                stats.evicted,
                stats.writes
            );
        }
        self.apply(&cmd);
        cmd
    }

    fn apply(&mut self, cmd: &RenderCommand) {
        if let Some(bg) = &cmd.overlay_background {
            self.surface.set_overlay_background(bg);
        }
        if let Some(opacity) = cmd.overlay_opacity {
            self.surface.set_overlay_opacity(opacity);
        }
        if let Some(opacity) = &cmd.ambient_opacity {
            self.surface.set_ambient_opacity(opacity);
        }
        if let Some(css) = &cmd.stylesheet {
            self.surface.set_stylesheet_text(css);
        }
    }

    /// Per-site switch from the popup. Returns the override map to persist.
    pub fn set_site_enabled(&mut self, enabled: bool) -> ConfigPatch {
        let mut overrides = self.config.site_overrides.clone();
        overrides.insert(self.hostname.clone(), enabled);
        self.config.site_overrides = overrides.clone();

        if enabled {
            self.reclassify.force();
            self.start();
        } else {
            self.unmount();
        }
        ConfigPatch {
            site_overrides: Some(overrides),
            ..ConfigPatch::default()
        }
    }

    pub fn handle_message(&mut self, message: Message) -> MessageOutcome {
        match message {
            Message::GetHostname => MessageOutcome {
                reply: Some(Reply::Hostname {
                    hostname: self.hostname.clone(),
                }),
                persist: None,
            },
            Message::ToggleSite { enabled } => MessageOutcome {
                reply: None,
                persist: Some(self.set_site_enabled(enabled)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{MemorySurface, Rect, Viewport};

    fn session() -> EffectSession<MemorySurface> {
        let mut surface = MemorySurface::new(Viewport::new(1000.0, 800.0));
        surface.add_node(Rect::new(10.0, 10.0, 300.0, 20.0), Some("rgb(20,20,20)"));
        EffectSession::new(surface, "example.com")
    }

    #[test]
    fn starts_unmounted() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Unmounted);
        assert!(s.tick(0.0).is_empty());
        assert!(s.surface().calls().is_empty());
    }

    #[test]
    fn active_config_mounts_and_runs() {
        let mut s = session();
        s.apply_config(Config::default());
        assert_eq!(s.state(), SessionState::Active);
        assert!(s.is_running());
        assert!(s.surface().mounted);
        let cmd = s.tick(0.0);
        assert!(cmd.classify);
        assert_eq!(s.surface().overlay_opacity, "1");
    }

    #[test]
    fn missing_settings_fall_back_to_defaults() {
        let mut s = session();
        s.apply_config(Config::from_value(&serde_json::Value::Null));
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.config(), &Config::default());
        assert!(s.tick(0.0).classify);
    }

    #[test]
    fn disabling_keeps_layers_but_blanks_them() {
        let mut s = session();
        s.apply_config(Config::default());
        for i in 0..4 {
            s.tick(i as f64 * 40.0);
        }
        assert!(!s.surface().stylesheet.is_empty());

        s.apply_config(Config {
            enabled: false,
            ..Config::default()
        });
        assert_eq!(s.state(), SessionState::Inactive);
        assert!(!s.is_running());
        assert!(s.surface().mounted);
        assert_eq!(s.surface().overlay_opacity, "0");
        assert_eq!(s.surface().ambient_opacity, "0");
        assert!(s.surface().stylesheet.is_empty());
    }

    #[test]
    fn hidden_page_gets_no_frames() {
        let mut s = session();
        s.set_hidden(true);
        s.apply_config(Config::default());
        assert!(s.is_mounted() && !s.is_running());
        assert!(s.tick(0.0).is_empty());

        s.set_hidden(false);
        assert!(s.is_running());
        assert!(s.tick(5000.0).classify);
    }

    #[test]
    fn hostname_reply_is_the_raw_hostname() {
        let mut s = EffectSession::new(MemorySurface::default(), "");
        let out = s.handle_message(Message::GetHostname);
        assert_eq!(
            out.reply,
            Some(Reply::Hostname {
                hostname: String::new()
            })
        );
        assert!(out.persist.is_none());

        // the override is keyed by the same hostname the reply reported
        let toggled = s.handle_message(Message::ToggleSite { enabled: false });
        let overrides = toggled.persist.and_then(|p| p.site_overrides).unwrap();
        assert_eq!(overrides.get(""), Some(&false));
        assert!(!overrides.contains_key("This site"));
    }

    #[test]
    fn hostname_reply_matches_the_page() {
        let mut s = session();
        let out = s.handle_message(Message::GetHostname);
        assert_eq!(
            out.reply,
            Some(Reply::Hostname {
                hostname: "example.com".into()
            })
        );
    }
}
