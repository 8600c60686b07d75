use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::capability::{AudioPlayer, AudioPlayerBackend, PlayerEvent};
use crate::error::VoiceError;

/// Play/pause state of one response clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Paused,
    /// Load or playback failed; permanent for this message
    Error,
}

struct Entry {
    audio_url: String,
    status: PlaybackStatus,
    // None when creation failed; the Error status is what the UI sees
    player: Option<Box<dyn AudioPlayer>>,
}

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<String, Entry>,
    playing: Option<String>,
}

/// Registry of response-audio players, keyed by message id.
///
/// At most one entry is Playing at any time across the whole registry:
/// starting playback for one message pauses and rewinds whichever other
/// message was playing. Players are created lazily on first use and reused
/// across toggles. A load or playback error flags that message permanently;
/// no automatic retry.
pub struct PlaybackRegistry {
    backend: Arc<dyn AudioPlayerBackend>,
    inner: Arc<Mutex<RegistryInner>>,
    event_tasks: StdMutex<Vec<JoinHandle<()>>>,
}

impl PlaybackRegistry {
    pub fn new(backend: Arc<dyn AudioPlayerBackend>) -> Self {
        Self {
            backend,
            inner: Arc::new(Mutex::new(RegistryInner::default())),
            event_tasks: StdMutex::new(Vec::new()),
        }
    }

    pub async fn status(&self, message_id: &str) -> Option<PlaybackStatus> {
        self.inner
            .lock()
            .await
            .entries
            .get(message_id)
            .map(|e| e.status)
    }

    /// The message currently playing, if any
    pub async fn currently_playing(&self) -> Option<String> {
        self.inner.lock().await.playing.clone()
    }

    /// URL an entry was created from
    pub async fn audio_url(&self, message_id: &str) -> Option<String> {
        self.inner
            .lock()
            .await
            .entries
            .get(message_id)
            .map(|e| e.audio_url.clone())
    }

    /// Toggle playback for `message_id`.
    ///
    /// If this message is already playing it is paused in place (position
    /// kept). Otherwise any other playing message is paused and rewound,
    /// the player is created on first use, and playback starts.
    pub async fn play(&self, message_id: &str, url: &str) -> Result<(), VoiceError> {
        let mut inner = self.inner.lock().await;

        if let Some(entry) = inner.entries.get(message_id) {
            if entry.status == PlaybackStatus::Error {
                warn!("Playback disabled for message {} after earlier failure", message_id);
                return Ok(());
            }
        }

        // Toggling the playing entry pauses it without rewinding
        if inner.playing.as_deref() == Some(message_id) {
            if let Some(entry) = inner.entries.get_mut(message_id) {
                if let Some(player) = entry.player.as_mut() {
                    if let Err(e) = player.pause().await {
                        warn!("Failed to pause message {}: {}", message_id, e);
                    }
                }
                entry.status = PlaybackStatus::Paused;
            }
            inner.playing = None;
            return Ok(());
        }

        // Single concurrent playback: park whatever else is playing at zero
        if let Some(other_id) = inner.playing.take() {
            if let Some(other) = inner.entries.get_mut(&other_id) {
                if let Some(player) = other.player.as_mut() {
                    if let Err(e) = player.pause().await {
                        warn!("Failed to pause message {}: {}", other_id, e);
                    }
                    if let Err(e) = player.rewind().await {
                        warn!("Failed to rewind message {}: {}", other_id, e);
                    }
                }
                other.status = PlaybackStatus::Paused;
            }
        }

        if !inner.entries.contains_key(message_id) {
            match self.backend.create(url).await {
                Ok((player, rx)) => {
                    inner.entries.insert(
                        message_id.to_string(),
                        Entry {
                            audio_url: url.to_string(),
                            status: PlaybackStatus::Idle,
                            player: Some(player),
                        },
                    );
                    self.watch_player(message_id.to_string(), rx);
                    info!("Created player for message {} ({})", message_id, url);
                }
                Err(e) => {
                    error!("Failed to load audio for message {}: {}", message_id, e);
                    inner.entries.insert(
                        message_id.to_string(),
                        Entry {
                            audio_url: url.to_string(),
                            status: PlaybackStatus::Error,
                            player: None,
                        },
                    );
                    return Err(e);
                }
            }
        }

        let started = {
            let Some(entry) = inner.entries.get_mut(message_id) else {
                return Ok(());
            };
            let Some(player) = entry.player.as_mut() else {
                return Ok(());
            };
            match player.play().await {
                Ok(()) => {
                    entry.status = PlaybackStatus::Playing;
                    true
                }
                Err(e) => {
                    error!("Playback failed for message {}: {}", message_id, e);
                    entry.status = PlaybackStatus::Error;
                    return Err(e);
                }
            }
        };

        if started {
            inner.playing = Some(message_id.to_string());
        }
        Ok(())
    }

    /// Forward a player's events into the registry state
    fn watch_player(&self, message_id: String, mut rx: tokio::sync::mpsc::Receiver<PlayerEvent>) {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let mut inner = inner.lock().await;
                match event {
                    PlayerEvent::Ended => {
                        if let Some(entry) = inner.entries.get_mut(&message_id) {
                            entry.status = PlaybackStatus::Idle;
                        }
                        if inner.playing.as_deref() == Some(message_id.as_str()) {
                            inner.playing = None;
                        }
                    }
                    PlayerEvent::Error(reason) => {
                        error!("Player error for message {}: {}", message_id, reason);
                        if let Some(entry) = inner.entries.get_mut(&message_id) {
                            entry.status = PlaybackStatus::Error;
                        }
                        if inner.playing.as_deref() == Some(message_id.as_str()) {
                            inner.playing = None;
                        }
                    }
                }
            }
        });
        self.event_tasks.lock().unwrap().push(task);
    }
}

impl Drop for PlaybackRegistry {
    fn drop(&mut self) {
        for task in self.event_tasks.lock().unwrap().iter() {
            task.abort();
        }
    }
}
