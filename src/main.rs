//! Tube Clean entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlSelectElement};

    use tube_clean::audio::{AudioManager, SoundEffect, stepped_volume};
    use tube_clean::consts::*;
    use tube_clean::sim::{
        BucketBounds, DropOutcome, GamePhase, GameSession, Presenter, TickInput, clamp_bucket_left,
        steer_bucket, tick,
    };
    use tube_clean::tuning::Difficulty;

    /// Bucket drag in progress
    struct Drag {
        start_x: f32,
        initial_left: f32,
    }

    /// Game instance holding all state
    struct Game {
        session: GameSession,
        audio: AudioManager,
        input: TickInput,
        accumulator: f64,
        last_time: f64,
        /// Autopilot steers the bucket
        idle_mode: bool,
        drag: Option<Drag>,
        /// DOM node per falling drop
        drop_nodes: HashMap<u32, HtmlElement>,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            Self {
                session: GameSession::new(seed),
                audio: AudioManager::new(),
                input: TickInput::default(),
                accumulator: 0.0,
                last_time: 0.0,
                idle_mode: false,
                drag: None,
                drop_nodes: HashMap::new(),
            }
        }

        /// Read bucket and drop-zone geometry from the DOM
        fn measure(&mut self, document: &Document) {
            let (Some(zone), Some(bucket)) = (
                document.get_element_by_id("dropZone"),
                document.get_element_by_id("cleanBucket"),
            ) else {
                return;
            };
            let zone_rect = zone.get_bounding_client_rect();
            let bucket_rect = bucket.get_bounding_client_rect();
            self.input.drop_zone_width = zone.client_width() as f32;
            self.input.bucket = BucketBounds::new(
                (bucket_rect.left() - zone_rect.left()) as f32,
                (bucket_rect.right() - zone_rect.left()) as f32,
            );
        }

        /// Run simulation ticks
        fn update(&mut self, dt_ms: f64, document: &Document) {
            self.measure(document);
            self.accumulator += dt_ms.min(100.0);

            let step = SIM_DT_MS as f64;
            let mut substeps = 0;
            while self.accumulator >= step && substeps < MAX_SUBSTEPS {
                if self.idle_mode && self.session.phase() == GamePhase::Filter {
                    self.input.bucket = steer_bucket(
                        &self.session,
                        self.input.bucket,
                        self.input.drop_zone_width,
                        SIM_DT_MS,
                    );
                }
                tick(&mut self.session, &self.input, SIM_DT_MS);
                self.accumulator -= step;
                substeps += 1;
            }

            if self.idle_mode {
                if let Some(bucket) = document.get_element_by_id("cleanBucket") {
                    set_left(&bucket, self.input.bucket.left);
                }
                // Attract mode keeps squeezing
                self.session.squeeze();
            }
        }

        /// Deliver queued notifications to the DOM and the speakers
        fn present(&mut self, document: &Document) {
            let events = self.session.drain_events();
            if events.is_empty() {
                return;
            }
            let mut presenter = DomPresenter {
                document,
                drop_nodes: &mut self.drop_nodes,
                squeeze_count: self.session.squeeze_count(),
                max_squeezes: self.session.max_squeezes(),
                player_name: self.session.player_name(),
            };
            for event in &events {
                if let Some(effect) = SoundEffect::for_event(event) {
                    self.audio.play(effect);
                }
                event.dispatch(&mut presenter);
            }
        }

        /// Move drop nodes to their current fall height
        fn render_drops(&self) {
            let now = self.session.now_ms();
            for droplet in self.session.drops() {
                if let Some(node) = self.drop_nodes.get(&droplet.id) {
                    let _ = node
                        .style()
                        .set_property("top", &format!("{}px", droplet.top_at(now)));
                }
            }
        }

        fn reset(&mut self, document: &Document) {
            self.session.reset();
            for (_, node) in self.drop_nodes.drain() {
                node.remove();
            }
            if let Some(btn) = document.get_element_by_id("squeezeBtn") {
                let _ = btn.class_list().remove_2("pressed", "released");
                let _ = btn.remove_attribute("disabled");
            }
        }
    }

    /// DOM side of the session notifications
    struct DomPresenter<'a> {
        document: &'a Document,
        drop_nodes: &'a mut HashMap<u32, HtmlElement>,
        squeeze_count: u32,
        max_squeezes: u32,
        player_name: &'a str,
    }

    impl DomPresenter<'_> {
        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn show_only(&self, ids: &[&str], visible: Option<&str>) {
            for id in ids {
                if let Some(el) = self.document.get_element_by_id(id) {
                    let _ = if Some(*id) == visible {
                        el.class_list().remove_1("hidden")
                    } else {
                        el.class_list().add_1("hidden")
                    };
                }
            }
        }
    }

    const SCREENS: [&str; 3] = ["startScreen", "gameScreen", "resultsScreen"];
    const PHASE_PANELS: [&str; 3] = ["scoopPhase", "pourPhase", "filterPhase"];

    impl Presenter for DomPresenter<'_> {
        fn on_phase_changed(&mut self, phase: GamePhase) {
            let (screen, panel, prompt) = match phase {
                GamePhase::Start => ("startScreen", None, String::new()),
                GamePhase::Scoop => (
                    "gameScreen",
                    Some("scoopPhase"),
                    format!("Welcome, {}! Click the dirty tub to scoop water!", self.player_name),
                ),
                GamePhase::Pour => (
                    "gameScreen",
                    Some("pourPhase"),
                    "Great! Now pour into the filter tube!".to_string(),
                ),
                GamePhase::Filter => (
                    "gameScreen",
                    Some("filterPhase"),
                    "Perfect! Now squeeze to filter the water!".to_string(),
                ),
                GamePhase::Results => ("resultsScreen", None, String::new()),
            };
            self.show_only(&SCREENS, Some(screen));
            self.show_only(&PHASE_PANELS, panel);
            if phase == GamePhase::Start {
                self.set_text("milestoneText", "");
                if let Some(el) = self.document.get_element_by_id("milestoneText") {
                    let _ = el.class_list().remove_1("show");
                }
            }
            if !prompt.is_empty() {
                self.set_text("currentPhase", &prompt);
            }
        }

        fn on_purity_changed(&mut self, purity: f32) {
            let text = format!("{}%", purity.round());
            self.set_text("purityScore", &text);
            self.set_text("purityPercent", &text);
            if let Some(fill) = self.document.get_element_by_id("purityFill") {
                let _ = fill.set_attribute("style", &format!("width: {}%", purity));
            }
        }

        fn on_water_level_changed(&mut self, level: f32) {
            // Inline SVG tube: water rect grows upward from the bottom
            const MAX_HEIGHT: f32 = 103.0;
            const TUBE_TOP: f32 = 17.0;
            if let Some(rect) = self.document.get_element_by_id("waterLevel") {
                let height = level / FULL_WATER_LEVEL * MAX_HEIGHT;
                let _ = rect.set_attribute("height", &height.to_string());
                let _ = rect.set_attribute("y", &(TUBE_TOP + MAX_HEIGHT - height).to_string());
            }
        }

        fn on_milestone(&mut self, message: &str) {
            self.set_text("milestoneText", message);
            if let Some(el) = self.document.get_element_by_id("milestoneText") {
                let _ = el.class_list().add_1("show");
            }
        }

        fn on_drop_spawned(&mut self, id: u32, x: f32, is_dirty: bool) {
            let Some(zone) = self.document.get_element_by_id("dropZone") else {
                return;
            };
            let Ok(node) = self.document.create_element("div") else {
                return;
            };
            let class = if is_dirty {
                "drop dirty-drop"
            } else {
                "drop clean-drop"
            };
            let _ = node.set_attribute("class", class);
            let _ = node.set_attribute(
                "style",
                &format!(
                    "position: absolute; width: {}px; height: {}px; left: {}px; top: {}px; z-index: 15",
                    DROP_WIDTH, DROP_HEIGHT, x, DROP_SPAWN_Y
                ),
            );
            if zone.append_child(&node).is_ok() {
                if let Ok(node) = node.dyn_into::<HtmlElement>() {
                    self.drop_nodes.insert(id, node);
                }
            }
        }

        fn on_drop_resolved(&mut self, id: u32, outcome: DropOutcome) {
            if let Some(node) = self.drop_nodes.remove(&id) {
                node.remove();
            }
            if outcome == DropOutcome::CaughtClean {
                if let Some(bucket) = self.document.get_element_by_id("cleanBucket") {
                    let list = bucket.class_list();
                    let _ = list.remove_1("caught");
                    let _ = list.add_1("caught");
                }
            }
        }

        fn on_game_ended(&mut self, final_purity: u32, message: &str, show_celebration: bool) {
            self.set_text("finalPurity", &format!("{}%", final_purity));
            self.set_text("resultsMessage", message);
            if let Some(screen) = self.document.get_element_by_id("resultsScreen") {
                let _ = if show_celebration {
                    screen.class_list().add_1("celebrate")
                } else {
                    screen.class_list().remove_1("celebrate")
                };
            }
        }

        fn on_scoop_started(&mut self) {
            self.set_text("currentPhase", "Scooping...");
            if let Some(cup) = self.document.get_element_by_id("cup") {
                let _ = cup.class_list().remove_1("hidden");
                let _ = cup.class_list().add_1("animate-fill");
            }
        }

        fn on_pour_started(&mut self) {
            self.set_text("currentPhase", "Pouring...");
            if let Some(cup) = self.document.get_element_by_id("filledCup") {
                let _ = cup.class_list().add_1("animate-pour");
            }
        }

        fn on_squeeze_lock_changed(&mut self, locked: bool) {
            let Some(btn) = self.document.get_element_by_id("squeezeBtn") else {
                return;
            };
            let list = btn.class_list();
            if locked {
                let _ = list.remove_1("released");
                let _ = list.add_1("pressed");
                let _ = btn.set_attribute("disabled", "");
                self.set_text(
                    "currentPhase",
                    &format!(
                        "Move bucket to catch drops! {}/{}",
                        self.squeeze_count, self.max_squeezes
                    ),
                );
            } else {
                let _ = list.remove_1("pressed");
                let _ = list.add_1("released");
                let _ = btn.remove_attribute("disabled");
            }
        }
    }

    fn set_left(el: &Element, left: f32) {
        if let Some(el) = el.dyn_ref::<HtmlElement>() {
            let _ = el.style().set_property("left", &format!("{}px", left));
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Tube Clean starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        log::info!("Game initialized with seed: {}", seed);

        setup_buttons(&document, game.clone());
        setup_bucket_drag(&document, game.clone())?;
        setup_keyboard(game.clone());

        request_animation_frame(game);

        log::info!("Tube Clean running!");
        Ok(())
    }

    /// Wire a click handler on element `id`, if present
    fn on_click(
        document: &Document,
        id: &str,
        game: Rc<RefCell<Game>>,
        action: impl Fn(&mut Game, &Document) + 'static,
    ) {
        let Some(el) = document.get_element_by_id(id) else {
            log::warn!("#{} not found", id);
            return;
        };
        let doc = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let mut g = game.borrow_mut();
            action(&mut *g, &doc);
            g.present(&doc);
        });
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        on_click(document, "startBtn", game.clone(), |g, doc| {
            let name = doc
                .get_element_by_id("playerName")
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                .map(|input| input.value())
                .unwrap_or_default();
            let difficulty = doc
                .get_element_by_id("difficultySelect")
                .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
                .and_then(|select| Difficulty::from_str(&select.value()))
                .unwrap_or_default();
            g.session.start(&name, difficulty);
        });
        on_click(document, "dirtyTub", game.clone(), |g, _| {
            g.session.scoop();
        });
        on_click(document, "filledCup", game.clone(), |g, _| {
            g.session.pour();
        });
        on_click(document, "squeezeBtn", game.clone(), |g, _| {
            g.session.squeeze();
        });
        on_click(document, "resetBtn", game.clone(), |g, doc| g.reset(doc));
        on_click(document, "retryBtn", game.clone(), |g, doc| g.reset(doc));
        on_click(document, "shareBtn", game, |g, _| {
            let text = g.session.share_text();
            if let Some(window) = web_sys::window() {
                // Clipboard promise outcome only matters to the player
                let _ = window.navigator().clipboard().write_text(&text);
            }
            log::info!("{}", text);
        });
    }

    fn setup_bucket_drag(document: &Document, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let Some(bucket) = document.get_element_by_id("cleanBucket") else {
            log::warn!("#cleanBucket not found, drag disabled");
            return Ok(());
        };

        // Grab
        {
            let game = game.clone();
            let doc = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::PointerEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                g.measure(&doc);
                g.drag = Some(Drag {
                    start_x: event.client_x() as f32,
                    initial_left: g.input.bucket.left,
                });
                if let Some(bucket) = doc.get_element_by_id("cleanBucket") {
                    let _ = bucket.class_list().add_1("dragging");
                }
            });
            bucket.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Move (horizontal only)
        {
            let game = game.clone();
            let doc = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::PointerEvent| {
                let g = game.borrow();
                let Some(drag) = &g.drag else { return };
                let left = clamp_bucket_left(
                    drag.initial_left + event.client_x() as f32 - drag.start_x,
                    g.input.drop_zone_width,
                );
                if let Some(bucket) = doc.get_element_by_id("cleanBucket") {
                    set_left(&bucket, left);
                }
            });
            document.add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Release
        {
            let doc = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::PointerEvent| {
                game.borrow_mut().drag = None;
                if let Some(bucket) = doc.get_element_by_id("cleanBucket") {
                    let _ = bucket.class_list().remove_1("dragging");
                }
            });
            document.add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let mut g = game.borrow_mut();
            match event.key().as_str() {
                " " => {
                    g.session.squeeze();
                }
                "i" | "I" => {
                    g.idle_mode = !g.idle_mode;
                    log::info!("Idle mode: {}", g.idle_mode);
                }
                "m" | "M" => {
                    let muted = !g.audio.is_muted();
                    g.audio.set_muted(muted);
                    log::info!("Muted: {}", muted);
                }
                "+" | "=" | "-" => {
                    let steps = if event.key() == "-" { -1 } else { 1 };
                    let volume = stepped_volume(g.audio.master_volume(), steps);
                    g.audio.set_master_volume(volume);
                    log::info!("Volume: {:.0}%", volume * 100.0);
                }
                "d" | "D" => log::info!("{}", g.session.snapshot_json()),
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                time - g.last_time
            } else {
                SIM_DT_MS as f64
            };
            g.last_time = time;

            g.update(dt, &document);
            g.present(&document);
            g.render_drops();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Tube Clean (native) starting...");
    log::info!("Native mode runs a headless autopilot game - use `trunk serve` for the web version");

    let difficulty = std::env::args()
        .nth(1)
        .and_then(|arg| tube_clean::Difficulty::from_str(&arg))
        .unwrap_or_default();
    let seed = std::env::args()
        .nth(2)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        });

    demo::run(difficulty, seed);
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use tube_clean::consts::*;
    use tube_clean::sim::{GamePhase, GameSession, Presenter, TickInput, steer_bucket, tick};
    use tube_clean::tuning::Difficulty;

    /// Logs notifications to stdout
    struct ConsolePresenter;

    impl Presenter for ConsolePresenter {
        fn on_phase_changed(&mut self, phase: GamePhase) {
            println!("== {} ==", phase.as_str());
        }

        fn on_milestone(&mut self, message: &str) {
            println!("  * {}", message);
        }

        fn on_game_ended(&mut self, final_purity: u32, message: &str, show_celebration: bool) {
            println!("Final purity: {}%", final_purity);
            println!("{}", message);
            if show_celebration {
                println!("Confetti!");
            }
        }
    }

    pub fn run(difficulty: Difficulty, seed: u64) {
        log::info!("Autopilot game on {} (seed {})", difficulty.as_str(), seed);

        let mut session = GameSession::new(seed);
        let mut presenter = ConsolePresenter;
        let mut input = TickInput::default();

        session.start("Autopilot", difficulty);
        session.scoop();

        // One simulated minute is far more than a full game needs
        for _ in 0..60_000 / SIM_DT_MS {
            match session.phase() {
                GamePhase::Pour => {
                    session.pour();
                }
                GamePhase::Filter => {
                    session.squeeze();
                    input.bucket =
                        steer_bucket(&session, input.bucket, input.drop_zone_width, SIM_DT_MS);
                }
                GamePhase::Results => break,
                GamePhase::Start | GamePhase::Scoop => {}
            }
            tick(&mut session, &input, SIM_DT_MS);
            session.flush_events(&mut presenter);
        }

        println!("{}", session.share_text());
    }
}
