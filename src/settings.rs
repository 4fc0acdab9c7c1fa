//! Competition settings
//!
//! Filled in from the setup form. Held in memory only: the one thing that
//! survives a reload is the "setup has run" flag in `persistence`.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::draw::{RevealTiming, Theme};

/// Competition settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Heading shown above the board
    pub competition_name: String,
    /// Free-form date text shown under the heading
    pub competition_date: String,
    /// Suspense phase before a box opens (ms)
    pub suspense_ms: u32,
    /// Boxes per page of the grid
    pub boxes_per_page: u32,
    /// Play suspense and fanfare tones
    pub sound_enabled: bool,
    /// Draw variant
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_theme(Theme::default())
    }
}

impl Settings {
    /// Defaults for a theme
    pub fn from_theme(theme: Theme) -> Self {
        Self {
            competition_name: theme.default_title().to_string(),
            competition_date: String::new(),
            suspense_ms: DEFAULT_SUSPENSE_MS,
            boxes_per_page: DEFAULT_BOXES_PER_PAGE,
            sound_enabled: true,
            theme,
        }
    }

    /// Clamp form input into usable ranges
    pub fn validated(mut self) -> Self {
        if self.suspense_ms > MAX_SUSPENSE_MS {
            log::warn!(
                "Suspense {}ms too long, clamping to {}ms",
                self.suspense_ms,
                MAX_SUSPENSE_MS
            );
            self.suspense_ms = MAX_SUSPENSE_MS;
        }
        self.boxes_per_page = self.boxes_per_page.clamp(1, MAX_BOXES_PER_PAGE);
        if self.competition_name.trim().is_empty() {
            self.competition_name = self.theme.default_title().to_string();
        }
        self
    }

    /// Suspense from the form, settle from the theme
    pub fn reveal_timing(&self) -> RevealTiming {
        RevealTiming {
            suspense_ms: self.suspense_ms,
            settle_ms: self.theme.settle_ms(),
        }
    }

    /// Parse the setup form's suspense field (seconds, e.g. "2.5")
    pub fn parse_suspense_secs(s: &str) -> Option<u32> {
        let secs: f64 = s.trim().parse().ok()?;
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        Some((secs * 1000.0).round().min(f64::from(MAX_SUSPENSE_MS)) as u32)
    }
}
