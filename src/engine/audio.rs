use std::collections::HashMap;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlAudioElement;

/// Named sound clips backed by `<audio>` elements.
pub struct AudioManager {
    sounds: HashMap<String, HtmlAudioElement>,
    muted: bool,
}

impl AudioManager {
    pub fn new(muted: bool) -> Self {
        AudioManager { sounds: HashMap::new(), muted }
    }

    pub fn load(&mut self, name: &str, url: &str) -> Result<(), JsValue> {
        let audio = HtmlAudioElement::new_with_src(url)?;
        audio.set_preload("auto");
        audio.set_muted(self.muted);
        audio.load();
        self.sounds.insert(name.to_string(), audio);
        Ok(())
    }

    /// Looping sounds play on the loaded element so `stop` and `set_volume`
    /// reach them; one-shots play on a clone so they can overlap.
    pub fn play(&self, name: &str, looped: bool, volume: f64) {
        let Some(audio) = self.sounds.get(name) else {
            return;
        };
        let target = if looped {
            audio.clone()
        } else {
            match audio.clone_node_with_deep(true).map(|n| n.dyn_into::<HtmlAudioElement>()) {
                Ok(Ok(clone)) => clone,
                _ => return,
            }
        };
        target.set_loop(looped);
        target.set_volume(volume.clamp(0.0, 1.0));
        target.set_muted(self.muted);
        // Autoplay refusals arrive as a rejected promise, not an Err
        match target.play() {
            Ok(promise) => {
                let name = name.to_string();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(err) = JsFuture::from(promise).await {
                        log::debug!("playback of {} refused: {:?}", name, err);
                    }
                });
            }
            Err(err) => log::debug!("could not play {}: {:?}", name, err),
        }
    }

    pub fn stop(&self, name: &str) {
        if let Some(audio) = self.sounds.get(name) {
            if let Err(err) = audio.pause() {
                log::debug!("could not pause {}: {:?}", name, err);
            }
            audio.set_current_time(0.0);
        }
    }

    pub fn set_volume(&self, name: &str, volume: f64) {
        if let Some(audio) = self.sounds.get(name) {
            audio.set_volume(volume.clamp(0.0, 1.0));
        }
    }

    pub fn mute_all(&mut self, muted: bool) {
        self.muted = muted;
        for audio in self.sounds.values() {
            audio.set_muted(muted);
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }
}
