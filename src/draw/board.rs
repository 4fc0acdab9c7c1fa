//! Draw controller
//!
//! One `PrizeDraw` owns everything a board needs: settings, the prize list,
//! the current assignment and the reveal state. UI handlers share it by
//! reference (`Rc<PrizeDraw<..>>` on the web); every method takes `&self`
//! so a reveal in flight never blocks a reset.

use std::cell::{Cell, Ref, RefCell};
use std::ops::RangeInclusive;

use thiserror::Error;

use super::assign::{AssignError, Assignment, PrizeAssigner};
use super::csv::{self, ParseError};
use super::prize::Prize;
use super::reveal::{BoxState, Presenter, RejectReason, RevealStateMachine};
use super::theme::Theme;
use crate::consts::DEFAULT_BOX_COUNT;
use crate::platform::Delay;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error(transparent)]
    Reject(#[from] RejectReason),
    #[error(transparent)]
    Import(#[from] ParseError),
    #[error(transparent)]
    Assign(#[from] AssignError),
}

/// Claimed/remaining counters for the prize list header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawStats {
    pub total: usize,
    pub claimed: usize,
    pub remaining: usize,
}

/// One row of the prize list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrizeListEntry {
    pub box_id: u32,
    pub prize: Prize,
    pub won: bool,
}

pub struct PrizeDraw<D: Delay, P: Presenter> {
    settings: RefCell<Settings>,
    prizes: RefCell<Vec<Prize>>,
    box_count: Cell<u32>,
    /// Prize list came from a CSV rather than the theme defaults
    imported: Cell<bool>,
    assigner: RefCell<PrizeAssigner>,
    assignment: RefCell<Assignment>,
    reveal: RevealStateMachine<D>,
    /// 1-based
    page: Cell<u32>,
    presenter: P,
}

impl<D: Delay, P: Presenter> PrizeDraw<D, P> {
    /// Board with the theme's starting prizes padded to the default box count
    pub fn new(
        settings: Settings,
        mut assigner: PrizeAssigner,
        delay: D,
        presenter: P,
    ) -> Result<Self, DrawError> {
        let settings = settings.validated();
        let theme = settings.theme;
        let prizes = theme.default_prizes();
        let assignment = assigner.assign(&prizes, DEFAULT_BOX_COUNT, &theme.fallback_pool())?;
        log::info!(
            "{} draw ready: {} boxes (seed {})",
            theme.as_str(),
            assignment.len(),
            assigner.seed()
        );

        Ok(Self {
            reveal: RevealStateMachine::new(delay, settings.reveal_timing()),
            settings: RefCell::new(settings),
            prizes: RefCell::new(prizes),
            box_count: Cell::new(DEFAULT_BOX_COUNT),
            imported: Cell::new(false),
            assigner: RefCell::new(assigner),
            assignment: RefCell::new(assignment),
            page: Cell::new(1),
            presenter,
        })
    }

    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    pub fn theme(&self) -> Theme {
        self.settings.borrow().theme
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn box_count(&self) -> u32 {
        self.box_count.get()
    }

    /// The prize list as supplied (before padding/truncation)
    pub fn prizes(&self) -> Vec<Prize> {
        self.prizes.borrow().clone()
    }

    pub fn assignment(&self) -> Ref<'_, Assignment> {
        self.assignment.borrow()
    }

    pub fn box_state(&self, box_id: u32) -> BoxState {
        self.reveal.state(box_id)
    }

    pub fn is_busy(&self) -> bool {
        self.reveal.is_busy()
    }

    /// Any prizes revealed this round (reloading would lose them)
    pub fn has_progress(&self) -> bool {
        self.reveal.opened_count() > 0
    }

    /// Warning to show before a reload discards revealed prizes
    pub fn reload_warning(&self) -> Option<String> {
        let claimed = self.reveal.opened_count();
        (claimed > 0).then(|| {
            format!(
                "You have {} revealed prize(s). Reloading will lose all progress.",
                claimed
            )
        })
    }

    /// Confirmation text for the reset button; `None` when there is nothing to reset
    pub fn reset_prompt(&self) -> Option<String> {
        let claimed = self.reveal.opened_count();
        (claimed > 0).then(|| {
            format!(
                "Are you sure you want to reset? This will clear all {} revealed prize(s) and cannot be undone.",
                claimed
            )
        })
    }

    /// Save the setup form.
    ///
    /// Switching theme while the board still holds theme defaults loads the
    /// new theme's prizes onto a fresh board of the default size. An imported
    /// CSV prize list is kept across theme changes, as are opened boxes when
    /// the theme is unchanged.
    pub fn apply_settings(&self, settings: Settings) -> Result<(), DrawError> {
        let settings = settings.validated();
        let previous = self.theme();
        let theme = settings.theme;

        if theme != previous && !self.imported.get() {
            let prizes = theme.default_prizes();
            let assignment = self.assigner.borrow_mut().assign(
                &prizes,
                DEFAULT_BOX_COUNT,
                &theme.fallback_pool(),
            )?;
            self.reveal.reset();
            *self.assignment.borrow_mut() = assignment;
            *self.prizes.borrow_mut() = prizes;
            self.box_count.set(DEFAULT_BOX_COUNT);
            log::info!(
                "Theme changed from {} to {}: loaded default prizes",
                previous.as_str(),
                theme.as_str()
            );
        }

        self.reveal.set_timing(settings.reveal_timing());
        log::info!(
            "Settings applied: \"{}\", suspense {}ms, {} per page",
            settings.competition_name,
            settings.suspense_ms,
            settings.boxes_per_page
        );
        *self.settings.borrow_mut() = settings;
        self.page.set(1);
        self.presenter.on_board_changed();
        Ok(())
    }

    /// Replace the prize list from CSV text. The board is resized to one
    /// box per prize, reshuffled and cleared. On error nothing changes.
    pub fn import_csv(&self, text: &str) -> Result<usize, DrawError> {
        let prizes = csv::parse(text).inspect_err(|e| log::warn!("CSV import rejected: {}", e))?;
        let box_count = u32::try_from(prizes.len()).unwrap_or(u32::MAX);
        let fallback = self.theme().fallback_pool();
        let assignment = self
            .assigner
            .borrow_mut()
            .assign(&prizes, box_count, &fallback)?;

        self.reveal.reset();
        *self.assignment.borrow_mut() = assignment;
        *self.prizes.borrow_mut() = prizes;
        self.box_count.set(box_count);
        self.imported.set(true);
        self.page.set(1);
        log::info!("Loaded {} prizes from CSV", box_count);
        self.presenter.on_board_changed();
        Ok(box_count as usize)
    }

    /// Clear every opened box and reshuffle the same prizes.
    pub fn reset(&self) -> Result<(), DrawError> {
        let fallback = self.theme().fallback_pool();
        let assignment = self.assigner.borrow_mut().assign(
            &self.prizes.borrow(),
            self.box_count.get(),
            &fallback,
        )?;

        self.reveal.reset();
        *self.assignment.borrow_mut() = assignment;
        self.page.set(1);
        log::info!("Draw reset and reshuffled");
        self.presenter.on_board_changed();
        Ok(())
    }

    /// Play the reveal for `box_id` and return its prize.
    pub async fn open(&self, box_id: u32) -> Result<Prize, DrawError> {
        let prize = self
            .reveal
            .open_with(
                box_id,
                |id| self.assignment.borrow().get(id).cloned(),
                &self.presenter,
            )
            .await?;
        self.presenter.on_board_changed();
        Ok(prize)
    }

    pub fn stats(&self) -> DrawStats {
        let total = self.assignment.borrow().len();
        let claimed = self.reveal.opened_count();
        DrawStats {
            total,
            claimed,
            remaining: total.saturating_sub(claimed),
        }
    }

    /// Every box with its prize, in box order
    pub fn prize_list(&self) -> Vec<PrizeListEntry> {
        self.assignment
            .borrow()
            .iter()
            .map(|(box_id, prize)| PrizeListEntry {
                box_id,
                prize: prize.clone(),
                won: self.reveal.is_opened(box_id),
            })
            .collect()
    }

    // === Pagination ===

    pub fn current_page(&self) -> u32 {
        self.page.get()
    }

    pub fn total_pages(&self) -> u32 {
        let per_page = self.settings.borrow().boxes_per_page.max(1);
        self.box_count.get().div_ceil(per_page).max(1)
    }

    /// Box ids shown on `page` (1-based, clamped)
    pub fn page_range(&self, page: u32) -> RangeInclusive<u32> {
        let per_page = self.settings.borrow().boxes_per_page.max(1);
        let page = page.clamp(1, self.total_pages());
        let start = (page - 1) * per_page + 1;
        let end = (start + per_page - 1).min(self.box_count.get());
        start..=end
    }

    pub fn set_page(&self, page: u32) {
        self.page.set(page.clamp(1, self.total_pages()));
    }

    /// Step forwards/backwards, staying within the board
    pub fn change_page(&self, delta: i32) {
        let target = i64::from(self.page.get()) + i64::from(delta);
        let clamped = target.clamp(1, i64::from(self.total_pages()));
        self.page.set(clamped as u32);
    }
}
