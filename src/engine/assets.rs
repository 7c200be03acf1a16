use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response, Window};

use crate::engine::mesh::Mesh;
use crate::game::config::AppConfig;

pub const CONFIG_PATH: &str = "/assets/config.json";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("request for {path} failed: {reason}")]
    Fetch { path: String, reason: String },
    #[error("{path} answered with HTTP {status}")]
    Status { path: String, status: u16 },
    #[error("could not decode model: {0}")]
    Decode(String),
    #[error("model has {0} vertices, more than 16-bit indices can address")]
    TooManyVertices(usize),
    #[error("bad config: {0}")]
    Config(String),
}

fn fetch_error(path: &str, err: JsValue) -> AssetError {
    AssetError::Fetch { path: path.to_string(), reason: format!("{:?}", err) }
}

async fn fetch(window: &Window, path: &str) -> Result<Response, AssetError> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(path, &opts).map_err(|e| fetch_error(path, e))?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| fetch_error(path, e))?;
    let resp: Response = value.dyn_into().map_err(|e| fetch_error(path, e))?;
    if !resp.ok() {
        return Err(AssetError::Status { path: path.to_string(), status: resp.status() });
    }
    Ok(resp)
}

pub async fn fetch_bytes(window: &Window, path: &str) -> Result<Vec<u8>, AssetError> {
    let resp = fetch(window, path).await?;
    let promise = resp.array_buffer().map_err(|e| fetch_error(path, e))?;
    let buffer = JsFuture::from(promise).await.map_err(|e| fetch_error(path, e))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

async fn try_fetch_config(window: &Window) -> Result<AppConfig, AssetError> {
    let resp = fetch(window, CONFIG_PATH).await?;
    let promise = resp.json().map_err(|e| fetch_error(CONFIG_PATH, e))?;
    let json = JsFuture::from(promise).await.map_err(|e| fetch_error(CONFIG_PATH, e))?;
    serde_wasm_bindgen::from_value(json).map_err(|e| AssetError::Config(e.to_string()))
}

/// Loads the game config; any failure falls back to the built-in defaults.
pub async fn fetch_config(window: &Window) -> AppConfig {
    match try_fetch_config(window).await {
        Ok(config) => {
            log::info!("loaded {}", CONFIG_PATH);
            config.validated()
        }
        Err(err) => {
            log::warn!("{}; using default config", err);
            AppConfig::default()
        }
    }
}

pub async fn load_model(window: &Window, name: &str, path: &str) -> Result<Mesh, AssetError> {
    let bytes = fetch_bytes(window, path).await?;
    let mesh = Mesh::from_gltf(&bytes)?;
    log::debug!("model {} decoded: {} vertices", name, mesh.vertex_count());
    Ok(mesh)
}

/// Loads a model, substituting a procedural placeholder when it cannot be had.
pub async fn load_model_or(window: &Window, name: &str, path: Option<&str>, fallback: fn() -> Mesh) -> Mesh {
    let Some(path) = path.filter(|p| !p.is_empty()) else {
        return fallback();
    };
    match load_model(window, name, path).await {
        Ok(mesh) => mesh,
        Err(err) => {
            log::warn!("{} model unavailable ({}), using placeholder", name, err);
            fallback()
        }
    }
}
