//! Prize Draw entry point
//!
//! On the web this wires the draw into the page (grid, reveal modal, setup
//! form, CSV upload). Natively it runs a headless draw and logs the results.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::Cell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::{JsFuture, spawn_local};
    use web_sys::{Document, Element, HtmlInputElement, HtmlSelectElement};

    use prize_draw::draw::{BoxState, DrawError, Presenter, Prize, PrizeAssigner, PrizeDraw, RejectReason};
    use prize_draw::persistence::{self, LocalStorageFlagStore};
    use prize_draw::platform::{TimeoutDelay, is_reload_shortcut};
    use prize_draw::{Settings, Theme};

    type Draw = PrizeDraw<TimeoutDelay, DomPresenter>;

    /// Drives the page from reveal events
    struct DomPresenter {
        document: Document,
        theme: Cell<Theme>,
        /// Set by `on_board_changed`, cleared by `render_board`
        dirty: Cell<bool>,
    }

    impl DomPresenter {
        fn box_element(&self, box_id: u32) -> Option<Element> {
            self.document
                .query_selector(&format!("[data-box-num=\"{}\"]", box_id))
                .ok()
                .flatten()
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }
    }

    impl Presenter for DomPresenter {
        fn on_suspense(&self, box_id: u32) {
            if let Some(el) = self.box_element(box_id) {
                let _ = el.class_list().add_1("suspense");
            }
        }

        fn on_opening(&self, box_id: u32) {
            if let Some(el) = self.box_element(box_id) {
                let _ = el.class_list().remove_1("suspense");
                let _ = el.class_list().add_1("opening");
            }
        }

        fn on_revealed(&self, box_id: u32, prize: &Prize) {
            self.set_text("prizeIcon", self.theme.get().icon_for(prize));
            self.set_text("prizeName", &prize.name);
            self.set_text("prizeValue", &prize.value);
            self.set_text("revealBoxNumber", &box_id.to_string());
            show_modal(&self.document, "prizeRevealModal");
        }

        fn on_board_changed(&self) {
            self.dirty.set(true);
        }
    }

    fn show_modal(document: &Document, id: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().add_1("active");
        }
    }

    fn hide_modal(document: &Document, id: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().remove_1("active");
        }
    }

    fn input(document: &Document, id: &str) -> Option<HtmlInputElement> {
        document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    }

    /// Redraw header, current page of boxes, pagination and stats
    fn render_board(draw: &Draw) {
        let presenter = draw.presenter();
        presenter.dirty.set(false);
        let document = &presenter.document;
        let settings = draw.settings();
        let theme = draw.theme();
        presenter.theme.set(theme);

        presenter.set_text("compTitle", &settings.competition_name);
        presenter.set_text("compDate", &settings.competition_date);

        let Some(grid) = document.get_element_by_id("boxesGrid") else {
            log::error!("#boxesGrid missing from page");
            return;
        };
        grid.set_inner_html("");

        let range = draw.page_range(draw.current_page());
        for box_id in range.clone() {
            let Ok(el) = document.create_element("div") else {
                continue;
            };
            let class = if draw.box_state(box_id) == BoxState::Opened {
                "mystery-box locked"
            } else {
                "mystery-box"
            };
            el.set_class_name(class);
            let _ = el.set_attribute("data-box-num", &box_id.to_string());
            el.set_inner_html(&format!(
                "<div class=\"box-content\"><div class=\"box-number\">{}</div>\
                 <div class=\"box-icon\">🎁</div>\
                 <div class=\"box-label\">TAP TO REVEAL</div></div>",
                box_id
            ));
            let _ = grid.append_child(&el);
        }

        presenter.set_text("currentPage", &draw.current_page().to_string());
        presenter.set_text("totalPages", &draw.total_pages().to_string());
        presenter.set_text(
            "boxRange",
            &format!("{}-{}", range.start(), range.end()),
        );

        let stats = draw.stats();
        presenter.set_text("totalPrizes", &stats.total.to_string());
        presenter.set_text("claimedPrizes", &stats.claimed.to_string());
        presenter.set_text("remainingPrizes", &stats.remaining.to_string());

        render_prize_list(draw, theme);
    }

    fn render_prize_list(draw: &Draw, theme: Theme) {
        let document = &draw.presenter().document;
        let Some(container) = document.get_element_by_id("prizeListContainer") else {
            return;
        };
        container.set_inner_html("");
        let noun = theme.box_noun();

        // Prize text comes from uploaded CSV, so it only ever goes in as text
        let div = |class: &str, text: Option<&str>| -> Option<Element> {
            let el = document.create_element("div").ok()?;
            el.set_class_name(class);
            if let Some(text) = text {
                el.set_text_content(Some(text));
            }
            Some(el)
        };

        for entry in draw.prize_list() {
            let item_class = if entry.won { "prize-item claimed" } else { "prize-item" };
            let (Some(item), Some(info)) = (div(item_class, None), div("prize-item-info", None)) else {
                continue;
            };
            let box_label = format!("{} #{}", noun, entry.box_id);
            for (class, text) in [
                ("prize-item-name", entry.prize.name.as_str()),
                ("prize-item-value", entry.prize.value.as_str()),
                ("prize-item-box", box_label.as_str()),
            ] {
                if let Some(field) = div(class, Some(text)) {
                    let _ = info.append_child(&field);
                }
            }
            let _ = item.append_child(&info);
            if entry.won {
                if let Some(status) = div("prize-item-status won", Some("WON")) {
                    let _ = item.append_child(&status);
                }
            }
            let _ = container.append_child(&item);
        }
    }

    fn render_if_dirty(draw: &Draw) {
        if draw.presenter().dirty.get() {
            render_board(draw);
        }
    }

    fn on_click(document: &Document, id: &str, mut handler: impl FnMut() + 'static) {
        if let Some(el) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| handler());
            let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }
        log::info!("Prize Draw starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            web_sys::console::error_1(&"No document available".into());
            return;
        };

        let settings = Settings::default();
        let presenter = DomPresenter {
            document: document.clone(),
            theme: Cell::new(settings.theme),
            dirty: Cell::new(true),
        };
        let draw = match PrizeDraw::new(
            settings,
            PrizeAssigner::from_entropy(),
            TimeoutDelay,
            presenter,
        ) {
            Ok(draw) => Rc::new(draw),
            Err(e) => {
                log::error!("Failed to build draw: {}", e);
                return;
            }
        };

        setup_grid(&document, draw.clone());
        setup_controls(&document, draw.clone());
        setup_csv_upload(&document, draw.clone());
        setup_form(&document, draw.clone());
        setup_reload_guard(draw.clone());
        render_board(&draw);

        if persistence::needs_setup(&LocalStorageFlagStore) {
            show_modal(&document, "setupModal");
        }

        log::info!("Prize Draw running!");
    }

    /// One delegated listener for every box on the grid
    fn setup_grid(document: &Document, draw: Rc<Draw>) {
        let Some(grid) = document.get_element_by_id("boxesGrid") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::MouseEvent| {
            let box_id = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest("[data-box-num]").ok().flatten())
                .and_then(|el| el.get_attribute("data-box-num"))
                .and_then(|n| n.parse::<u32>().ok());
            let Some(box_id) = box_id else { return };

            let draw = draw.clone();
            spawn_local(async move {
                match draw.open(box_id).await {
                    Ok(_) => {}
                    Err(DrawError::Reject(RejectReason::Busy | RejectReason::AlreadyOpened(_))) => {}
                    Err(e) => log::warn!("Box {}: {}", box_id, e),
                }
                render_if_dirty(&draw);
            });
        });
        let _ = grid.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_controls(document: &Document, draw: Rc<Draw>) {
        {
            let draw = draw.clone();
            on_click(document, "prevPage", move || {
                draw.change_page(-1);
                render_board(&draw);
            });
        }
        {
            let draw = draw.clone();
            on_click(document, "nextPage", move || {
                draw.change_page(1);
                render_board(&draw);
            });
        }
        {
            let draw = draw.clone();
            on_click(document, "resetBtn", move || {
                let Some(prompt) = draw.reset_prompt() else {
                    log::info!("No progress to reset");
                    if let Some(window) = web_sys::window() {
                        let _ = window.alert_with_message("No progress to reset.");
                    }
                    return;
                };
                let confirmed = web_sys::window()
                    .and_then(|w| w.confirm_with_message(&prompt).ok())
                    .unwrap_or(false);
                if confirmed {
                    if let Err(e) = draw.reset() {
                        log::error!("Reset failed: {}", e);
                    }
                    render_if_dirty(&draw);
                }
            });
        }
        {
            let document_clone = document.clone();
            on_click(document, "closeReveal", move || {
                hide_modal(&document_clone, "prizeRevealModal");
            });
        }
        {
            let document_clone = document.clone();
            on_click(document, "settingsBtn", move || {
                show_modal(&document_clone, "setupModal");
            });
        }
        {
            let document_clone = document.clone();
            on_click(document, "prizeListBtn", move || {
                render_board(&draw);
                show_modal(&document_clone, "prizeListModal");
            });
        }
    }

    /// Warn before a reload throws away revealed prizes
    fn setup_reload_guard(draw: Rc<Draw>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard reloads get a confirm with the prize count
        {
            let draw = draw.clone();
            let window_clone = window.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if !is_reload_shortcut(&event.key(), event.ctrl_key(), event.meta_key()) {
                    return;
                }
                let Some(warning) = draw.reload_warning() else {
                    return;
                };
                event.prevent_default();
                let confirmed = window_clone
                    .confirm_with_message(&format!("Reload page?\n\n{}", warning))
                    .unwrap_or(false);
                if confirmed {
                    log::info!("Reloading with {} prize(s) revealed", draw.stats().claimed);
                    let _ = window_clone.location().reload();
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Browser button / tab close: only the native dialog is possible here
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::BeforeUnloadEvent| {
                if draw.has_progress() {
                    event.prevent_default();
                    event.set_return_value("");
                }
            });
            let _ = window.add_event_listener_with_callback("beforeunload", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_csv_upload(document: &Document, draw: Rc<Draw>) {
        let Some(upload) = input(document, "csvUpload") else {
            return;
        };
        let upload_clone = upload.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(file) = upload_clone.files().and_then(|f| f.get(0)) else {
                return;
            };
            let draw = draw.clone();
            spawn_local(async move {
                let text = match JsFuture::from(file.text()).await {
                    Ok(v) => v.as_string().unwrap_or_default(),
                    Err(e) => {
                        log::error!("Failed to read CSV file: {:?}", e);
                        return;
                    }
                };
                let message = match draw.import_csv(&text) {
                    Ok(n) => format!("Successfully loaded {} prizes from CSV!", n),
                    Err(e) => format!("{}. Please check the format.", e),
                };
                if let Some(window) = web_sys::window() {
                    let _ = window.alert_with_message(&message);
                }
                render_if_dirty(&draw);
            });
        });
        let _ = upload.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_form(document: &Document, draw: Rc<Draw>) {
        let document_clone = document.clone();
        on_click(document, "saveSetup", move || {
            let document = &document_clone;
            let mut settings = draw.settings();
            if let Some(el) = input(document, "compNameInput") {
                settings.competition_name = el.value();
            }
            if let Some(el) = input(document, "compDateInput") {
                settings.competition_date = el.value();
            }
            if let Some(ms) = input(document, "suspenseTime")
                .and_then(|el| Settings::parse_suspense_secs(&el.value()))
            {
                settings.suspense_ms = ms;
            }
            if let Some(n) = input(document, "boxesPerPage").and_then(|el| el.value().parse().ok()) {
                settings.boxes_per_page = n;
            }
            if let Some(el) = input(document, "soundEnabled") {
                settings.sound_enabled = el.checked();
            }
            if let Some(theme) = document
                .get_element_by_id("themeSelect")
                .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
                .and_then(|el| Theme::from_str(&el.value()))
            {
                settings.theme = theme;
            }

            if let Err(e) = draw.apply_settings(settings) {
                log::error!("Failed to apply settings: {}", e);
            }
            persistence::mark_setup_complete(&mut LocalStorageFlagStore);
            hide_modal(document, "setupModal");
            render_if_dirty(&draw);
        });
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Prize Draw (native) starting...");

    if let Err(e) = run_headless() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless draw: `prize-draw [prizes.csv] [boxes-to-open]`
#[cfg(not(target_arch = "wasm32"))]
fn run_headless() -> Result<(), Box<dyn std::error::Error>> {
    use futures::executor::block_on;
    use prize_draw::draw::{NoopPresenter, PrizeAssigner, PrizeDraw};
    use prize_draw::platform::YieldDelay;
    use prize_draw::Settings;

    let mut args = std::env::args().skip(1);
    let csv_path = args.next();
    let to_open: u32 = args.next().map(|n| n.parse()).transpose()?.unwrap_or(5);

    let draw = PrizeDraw::new(
        Settings::default(),
        PrizeAssigner::from_entropy(),
        YieldDelay,
        NoopPresenter,
    )?;

    if let Some(path) = csv_path {
        let text = std::fs::read_to_string(&path)?;
        let count = draw.import_csv(&text)?;
        log::info!("Imported {} prizes from {}", count, path);
    }

    let theme = draw.theme();
    for box_id in 1..=to_open.min(draw.box_count()) {
        let prize = block_on(draw.open(box_id))?;
        println!(
            "{} #{:>3}: {} {}",
            theme.box_noun(),
            box_id,
            theme.icon_for(&prize),
            prize
        );
    }

    let stats = draw.stats();
    println!(
        "{} claimed, {} remaining of {}",
        stats.claimed, stats.remaining, stats.total
    );
    Ok(())
}
