//! Audio playback for the countdown completion cue.

use crate::cycle::{AudibleCue, CueError};
use rodio::source::{SineWave, Source};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::time::Duration;
use thiserror::Error;

const TONE_HZ: f32 = 800.0;
const TONE_MS: u64 = 200;
const TONE_GAIN: f32 = 0.5;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to initialize audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("Failed to play audio: {0}")]
    Play(#[from] rodio::PlayError),
}

/// Owns the output stream, so it has to stay on the thread that created it.
pub struct AudioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioPlayer {
    pub fn new() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    fn play_tone(&self) -> Result<(), AudioError> {
        let sink = Sink::try_new(&self.handle)?;

        let tone = SineWave::new(TONE_HZ)
            .take_duration(Duration::from_millis(TONE_MS))
            .amplify(TONE_GAIN);

        sink.append(tone);
        sink.detach(); // Play in background

        Ok(())
    }
}

impl AudibleCue for AudioPlayer {
    fn play(&self) -> Result<(), CueError> {
        self.play_tone()
            .map_err(|e| CueError::Unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_player_creation() {
        // Machines without an output device cannot open a stream; that is
        // fine as long as nothing panics.
        match AudioPlayer::new() {
            Ok(player) => {
                if let Err(e) = player.play() {
                    println!("Tone not played: {}", e);
                }
            }
            Err(e) => println!("Audio player unavailable (expected on CI): {}", e),
        }
    }
}
