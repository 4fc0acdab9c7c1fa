//! Prize Draw - a mystery box prize draw engine
//!
//! Core modules:
//! - `draw`: Prize assignment, reveal state machine, CSV import, themes
//! - `platform`: Browser/native timer abstraction
//! - `persistence`: The durable "setup has run" flag
//! - `settings`: Competition configuration

pub mod draw;
pub mod persistence;
pub mod platform;
pub mod settings;

pub use draw::{Assignment, Prize, PrizeDraw, RejectReason, Theme};
pub use settings::Settings;

/// Draw configuration constants
pub mod consts {
    /// Boxes on a fresh board before any CSV import
    pub const DEFAULT_BOX_COUNT: u32 = 100;
    /// Boxes shown per page by default
    pub const DEFAULT_BOXES_PER_PAGE: u32 = 20;
    /// Suspense phase before a box opens (ms)
    pub const DEFAULT_SUSPENSE_MS: u32 = 2000;
    /// Upper bound accepted from the setup form (ms)
    pub const MAX_SUSPENSE_MS: u32 = 10_000;
    /// Upper bound on boxes per page
    pub const MAX_BOXES_PER_PAGE: u32 = 100;
    /// Opening animation after suspense, before the prize is shown (ms)
    pub const DEFAULT_SETTLE_MS: u32 = 800;
}
