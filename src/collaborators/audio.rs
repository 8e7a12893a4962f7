//! Looping ambient soundscape

use thiserror::Error;

pub const DEFAULT_AMBIENT_SOURCE: &str = "/sounds/rainforest-ambient.mp3";
pub const DEFAULT_AMBIENT_VOLUME: f32 = 0.3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
    /// The browser refused to start playback without a user gesture
    #[error("Audio autoplay prevented: {0}")]
    AutoplayBlocked(String),
}

/// A sound sink that can loop one source
pub trait AmbientAudio {
    fn start(&mut self) -> Result<(), AudioError>;
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
}

/// Sink that plays nothing; used natively and in tests
#[derive(Debug, Default)]
pub struct SilentAudio {
    playing: bool,
    starts: usize,
}

impl SilentAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starts(&self) -> usize {
        self.starts
    }
}

impl AmbientAudio for SilentAudio {
    fn start(&mut self) -> Result<(), AudioError> {
        self.playing = true;
        self.starts += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Ambient audio whose failures never reach the caller
pub struct AmbientSound {
    sink: Box<dyn AmbientAudio>,
}

impl AmbientSound {
    pub fn new(sink: Box<dyn AmbientAudio>) -> Self {
        Self { sink }
    }

    /// Start playback; a refusal is logged and otherwise ignored
    pub fn start(&mut self) {
        if let Err(err) = self.sink.start() {
            log::warn!("{}", err);
        }
    }

    pub fn stop(&mut self) {
        if self.sink.is_playing() {
            self.sink.stop();
            log::debug!("Ambient audio stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.sink.is_playing()
    }
}

/// An `<audio>` element looping the soundscape
#[cfg(target_arch = "wasm32")]
pub struct HtmlAmbientAudio {
    element: web_sys::HtmlAudioElement,
    playing: bool,
}

#[cfg(target_arch = "wasm32")]
impl HtmlAmbientAudio {
    pub fn new(source: &str, volume: f32) -> Result<Self, AudioError> {
        let element = web_sys::HtmlAudioElement::new_with_src(source)
            .map_err(|e| AudioError::Unavailable(format!("{:?}", e)))?;
        element.set_loop(true);
        element.set_volume(f64::from(volume.clamp(0.0, 1.0)));
        Ok(Self {
            element,
            playing: false,
        })
    }
}

#[cfg(target_arch = "wasm32")]
impl AmbientAudio for HtmlAmbientAudio {
    fn start(&mut self) -> Result<(), AudioError> {
        let promise = self
            .element
            .play()
            .map_err(|e| AudioError::AutoplayBlocked(format!("{:?}", e)))?;
        // Autoplay rejections arrive later; they only need to be logged
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = wasm_bindgen_futures::JsFuture::from(promise).await {
                log::warn!("{}", AudioError::AutoplayBlocked(format!("{:?}", err)));
            }
        });
        self.playing = true;
        Ok(())
    }

    fn stop(&mut self) {
        if let Err(err) = self.element.pause() {
            log::warn!("Failed to pause ambient audio: {:?}", err);
        }
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Blocked;

    impl AmbientAudio for Blocked {
        fn start(&mut self) -> Result<(), AudioError> {
            Err(AudioError::AutoplayBlocked("NotAllowedError".into()))
        }

        fn stop(&mut self) {}

        fn is_playing(&self) -> bool {
            false
        }
    }

    #[test]
    fn start_failures_are_swallowed() {
        let mut sound = AmbientSound::new(Box::new(Blocked));
        sound.start();
        assert!(!sound.is_playing());
        sound.stop();
    }

    #[test]
    fn silent_audio_tracks_state() {
        let mut sound = AmbientSound::new(Box::new(SilentAudio::new()));
        sound.start();
        assert!(sound.is_playing());
        sound.stop();
        assert!(!sound.is_playing());
    }
}
