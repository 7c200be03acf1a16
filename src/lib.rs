mod engine;
mod game;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlCanvasElement, KeyboardEvent, WebGlRenderingContext, Window};
use std::cell::RefCell;
use std::rc::Rc;
use crate::engine::assets::load_model_or;
use crate::engine::audio::AudioManager;
use crate::engine::mesh;
use crate::engine::renderer::Renderer;
use crate::engine::{assets, console_log};
use crate::game::vehicle::VehicleKind;
use crate::game::{Game, LoadedMeshes};

thread_local! {
    static GAME: RefCell<Option<Game>> = RefCell::new(None);
}

fn with_game(f: impl FnOnce(&mut Game)) {
    GAME.with(|g| {
        if let Some(game) = g.borrow_mut().as_mut() {
            f(game);
        }
    });
}

#[wasm_bindgen]
pub async fn init_game() -> Result<(), JsValue> {
    console_log::init(log::LevelFilter::Info);

    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;
    let canvas = document.get_element_by_id("canvas")
        .ok_or("No canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    fit_canvas(&window, &canvas);

    let gl = canvas
        .get_context("webgl")?
        .ok_or("No WebGL")?
        .dyn_into::<WebGlRenderingContext>()?;

    let renderer = Renderer::new(gl)?;

    let config = assets::fetch_config(&window).await;
    console_log::set_level(config.log_level());

    let vehicle_fallback: fn() -> mesh::Mesh = match config.vehicle.kind {
        VehicleKind::Car => mesh::placeholder_car,
        VehicleKind::Motorcycle => mesh::placeholder_motorcycle,
    };
    let vehicle_path = config.vehicle_model.as_ref().map(|m| m.path.as_str());
    let meshes = LoadedMeshes {
        vehicle: load_model_or(&window, "vehicle", vehicle_path, vehicle_fallback).await,
        tree: load_model_or(&window, "tree", Some(config.tree_model.path.as_str()), mesh::placeholder_tree).await,
        grass: load_model_or(&window, "grass", Some(config.grass_model.path.as_str()), mesh::placeholder_grass).await,
        rock: mesh::placeholder_rock(),
    };

    let mut audio = AudioManager::new(config.audio.muted);
    for (name, path) in [("engine", &config.audio.engine_path), ("hit", &config.audio.hit_path)] {
        if let Err(err) = audio.load(name, path) {
            log::warn!("sound {} unavailable: {:?}", name, err);
        }
    }

    let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
    let game = Game::new(renderer, config, meshes, audio, seed)?;
    GAME.with(|g| *g.borrow_mut() = Some(game));

    add_key_listener(&window, "keydown", true)?;
    add_key_listener(&window, "keyup", false)?;

    // Held controls would otherwise stay latched while the page is hidden
    let blur = Closure::wrap(Box::new(move |_event: Event| {
        with_game(|game| game.release_all());
    }) as Box<dyn FnMut(_)>);
    window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
    blur.forget();

    let resize_window = window.clone();
    let resize = Closure::wrap(Box::new(move |_event: Event| {
        fit_canvas(&resize_window, &canvas);
    }) as Box<dyn FnMut(_)>);
    window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())?;
    resize.forget();

    // Game loop
    let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
        with_game(|game| {
            game.frame(timestamp);
            let (speed, distance) = game.hud();
            update_ui(speed, distance);
        });
        if let Some(callback) = f.borrow().as_ref() {
            request_animation_frame(callback);
        }
    }) as Box<dyn FnMut(f64)>));

    if let Some(callback) = g.borrow().as_ref() {
        request_animation_frame(callback);
    }

    log::info!("night rider started");
    Ok(())
}

fn add_key_listener(window: &Window, event_name: &str, pressed: bool) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        with_game(|game| {
            if game.handle_key(&event.key(), pressed) {
                event.prevent_default();
            }
        });
    }) as Box<dyn FnMut(_)>);

    window.add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn fit_canvas(window: &Window, canvas: &HtmlCanvasElement) {
    let dimension = |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let width = dimension(window.inner_width());
    let height = dimension(window.inner_height());
    if width > 0.0 && height > 0.0 {
        canvas.set_width(width as u32);
        canvas.set_height(height as u32);
    }
}

fn request_animation_frame(f: &Closure<dyn FnMut(f64)>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(err) = window.request_animation_frame(f.as_ref().unchecked_ref()) {
        log::error!("requestAnimationFrame failed: {:?}", err);
    }
}

fn update_ui(speed: u32, distance: u32) {
    if let Some(window) = web_sys::window() {
        if let Some(document) = window.document() {
            if let Some(speed_el) = document.get_element_by_id("speed") {
                speed_el.set_inner_html(&format!("{} km/h", speed));
            }
            if let Some(distance_el) = document.get_element_by_id("distance") {
                distance_el.set_inner_html(&format!("{} m", distance));
            }
        }
    }
}

/// Press or release an on-screen button: `up`, `down`, `left` or `right`.
#[wasm_bindgen]
pub fn touch_press(button: &str) {
    with_game(|game| game.touch(button, true));
}

#[wasm_bindgen]
pub fn touch_release(button: &str) {
    with_game(|game| game.touch(button, false));
}

#[wasm_bindgen]
pub fn toggle_mute() -> bool {
    let mut muted = false;
    with_game(|game| {
        muted = !game.is_muted();
        game.set_muted(muted);
    });
    muted
}
