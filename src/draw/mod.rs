//! Prize draw logic
//!
//! Everything that decides who wins what lives here. No DOM, no timers:
//! - Seeded RNG only (reproducible boards in tests)
//! - Box ids are 1-based and contiguous
//! - Waiting is delegated to `platform::Delay`

pub mod assign;
pub mod board;
pub mod csv;
pub mod prize;
pub mod reveal;
pub mod theme;

pub use assign::{AssignError, Assignment, PrizeAssigner, shuffle};
pub use board::{DrawError, DrawStats, PrizeDraw, PrizeListEntry};
pub use csv::{ParseError, parse, split_record};
pub use prize::{FALLBACK_POOL_LEN, Prize};
pub use reveal::{BoxState, NoopPresenter, Presenter, RejectReason, RevealStateMachine, RevealTiming};
pub use theme::Theme;
