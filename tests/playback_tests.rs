// Registry tests: single-concurrent-playback invariant, lazy player reuse,
// and permanent per-message error flagging.

use std::sync::Arc;
use std::time::Duration;

use dispatch_voice::capability::{PlayerAction, SimulatedPlayerBackend};
use dispatch_voice::{PlaybackRegistry, PlaybackStatus};

const URL_A: &str = "http://127.0.0.1:8000/audio/a.wav";
const URL_B: &str = "http://127.0.0.1:8000/audio/b.wav";

async fn wait_for_status(registry: &PlaybackRegistry, message_id: &str, want: PlaybackStatus) {
    for _ in 0..200 {
        if registry.status(message_id).await == Some(want) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("entry never reached {:?}", want);
}

#[tokio::test]
async fn starting_b_pauses_and_rewinds_a() {
    let backend = Arc::new(SimulatedPlayerBackend::new());
    let registry = PlaybackRegistry::new(backend.clone());

    registry.play("msg-a", URL_A).await.unwrap();
    assert_eq!(registry.status("msg-a").await, Some(PlaybackStatus::Playing));
    assert_eq!(registry.currently_playing().await.as_deref(), Some("msg-a"));

    registry.play("msg-b", URL_B).await.unwrap();
    assert_eq!(registry.status("msg-a").await, Some(PlaybackStatus::Paused));
    assert_eq!(registry.status("msg-b").await, Some(PlaybackStatus::Playing));
    assert_eq!(registry.currently_playing().await.as_deref(), Some("msg-b"));

    // A was parked at zero before B started
    assert_eq!(
        backend.actions(),
        vec![
            PlayerAction::Play(URL_A.to_string()),
            PlayerAction::Pause(URL_A.to_string()),
            PlayerAction::Rewind(URL_A.to_string()),
            PlayerAction::Play(URL_B.to_string()),
        ]
    );
}

#[tokio::test]
async fn toggling_the_playing_entry_pauses_in_place() {
    let backend = Arc::new(SimulatedPlayerBackend::new());
    let registry = PlaybackRegistry::new(backend.clone());

    registry.play("msg-a", URL_A).await.unwrap();
    registry.play("msg-a", URL_A).await.unwrap();

    assert_eq!(registry.status("msg-a").await, Some(PlaybackStatus::Paused));
    assert_eq!(registry.currently_playing().await, None);

    // Paused, not rewound: resuming keeps the position
    assert_eq!(
        backend.actions(),
        vec![
            PlayerAction::Play(URL_A.to_string()),
            PlayerAction::Pause(URL_A.to_string()),
        ]
    );
}

#[tokio::test]
async fn player_is_reused_across_toggles() {
    let backend = Arc::new(SimulatedPlayerBackend::new());
    let registry = PlaybackRegistry::new(backend.clone());

    registry.play("msg-a", URL_A).await.unwrap();
    registry.play("msg-a", URL_A).await.unwrap();
    registry.play("msg-a", URL_A).await.unwrap();

    assert_eq!(registry.status("msg-a").await, Some(PlaybackStatus::Playing));
    assert_eq!(
        backend.actions(),
        vec![
            PlayerAction::Play(URL_A.to_string()),
            PlayerAction::Pause(URL_A.to_string()),
            PlayerAction::Play(URL_A.to_string()),
        ]
    );
}

#[tokio::test]
async fn natural_end_clears_the_playing_marker() {
    let backend = Arc::new(SimulatedPlayerBackend::new());
    let registry = PlaybackRegistry::new(backend.clone());

    registry.play("msg-a", URL_A).await.unwrap();
    backend.finish_clip(URL_A).await;

    wait_for_status(&registry, "msg-a", PlaybackStatus::Idle).await;
    assert_eq!(registry.currently_playing().await, None);
}

#[tokio::test]
async fn load_failure_is_permanent_for_that_message() {
    let backend = Arc::new(SimulatedPlayerBackend::new().with_failing_url(URL_A));
    let registry = PlaybackRegistry::new(backend.clone());

    assert!(registry.play("msg-a", URL_A).await.is_err());
    assert_eq!(registry.status("msg-a").await, Some(PlaybackStatus::Error));

    // No retry: further toggles are ignored
    registry.play("msg-a", URL_A).await.unwrap();
    assert_eq!(registry.status("msg-a").await, Some(PlaybackStatus::Error));
    assert!(backend.actions().is_empty());

    // Other messages are unaffected
    registry.play("msg-b", URL_B).await.unwrap();
    assert_eq!(registry.status("msg-b").await, Some(PlaybackStatus::Playing));
}

#[tokio::test]
async fn playback_error_event_flags_the_entry() {
    let backend = Arc::new(SimulatedPlayerBackend::new());
    let registry = PlaybackRegistry::new(backend.clone());

    registry.play("msg-a", URL_A).await.unwrap();
    backend.fail_clip(URL_A, "decode failed").await;

    wait_for_status(&registry, "msg-a", PlaybackStatus::Error).await;
    assert_eq!(registry.currently_playing().await, None);

    // Flagged permanently; the toggle is ignored
    registry.play("msg-a", URL_A).await.unwrap();
    assert_eq!(registry.status("msg-a").await, Some(PlaybackStatus::Error));
}

#[tokio::test]
async fn at_most_one_entry_plays_across_many_toggles() {
    let backend = Arc::new(SimulatedPlayerBackend::new());
    let registry = PlaybackRegistry::new(backend.clone());

    let ids = ["m1", "m2", "m3", "m1", "m2"];
    for (i, id) in ids.iter().enumerate() {
        let url = format!("http://127.0.0.1:8000/audio/{id}.wav");
        registry.play(id, &url).await.unwrap();

        let mut playing = 0;
        for probe in ["m1", "m2", "m3"] {
            if registry.status(probe).await == Some(PlaybackStatus::Playing) {
                playing += 1;
            }
        }
        assert_eq!(playing, 1, "after toggle {} exactly one entry plays", i);
    }
}
