// State-transition tests for the speech synthesis controller.

use std::time::Duration;

use dispatch_voice::capability::SimulatedSynthesizer;
use dispatch_voice::config::SynthesisConfig;
use dispatch_voice::{SynthesisController, SynthesisStatus, VoiceError};

async fn wait_until_not_speaking(controller: &SynthesisController) {
    for _ in 0..200 {
        if controller.status().await != SynthesisStatus::Speaking {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("controller never left Speaking");
}

#[tokio::test]
async fn utterance_completes_naturally() {
    let synth = SimulatedSynthesizer::completing();
    let spoken = synth.spoken_log();
    let mut controller = SynthesisController::new(Box::new(synth), SynthesisConfig::default());

    controller.speak("Dispatching an ambulance now.").await.unwrap();
    wait_until_not_speaking(&controller).await;

    assert_eq!(controller.status().await, SynthesisStatus::Done);
    assert_eq!(
        spoken.lock().unwrap().as_slice(),
        ["Dispatching an ambulance now."]
    );
}

#[tokio::test]
async fn new_utterance_silences_the_previous_one() {
    let synth = SimulatedSynthesizer::sustained();
    let spoken = synth.spoken_log();
    let cancels = synth.cancel_log();
    let mut controller = SynthesisController::new(Box::new(synth), SynthesisConfig::default());

    controller.speak("A").await.unwrap();
    assert_eq!(controller.status().await, SynthesisStatus::Speaking);

    controller.speak("B").await.unwrap();
    assert_eq!(controller.status().await, SynthesisStatus::Speaking);

    // "A" was cancelled and never resumes; only "B" is audible
    assert_eq!(*cancels.lock().unwrap(), 1);
    assert_eq!(spoken.lock().unwrap().as_slice(), ["A", "B"]);

    controller.stop_speaking().await.unwrap();
    assert_eq!(controller.status().await, SynthesisStatus::Idle);
}

#[tokio::test]
async fn stale_completion_events_do_not_clobber_the_replacement() {
    let synth = SimulatedSynthesizer::sustained();
    let mut controller = SynthesisController::new(Box::new(synth), SynthesisConfig::default());

    controller.speak("A").await.unwrap();
    controller.speak("B").await.unwrap();

    // Give any trailing events from "A" time to drain
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(controller.status().await, SynthesisStatus::Speaking);
}

#[tokio::test]
async fn engine_error_is_recorded() {
    let synth = SimulatedSynthesizer::failing("synthesis-unavailable");
    let mut controller = SynthesisController::new(Box::new(synth), SynthesisConfig::default());

    controller.speak("hello").await.unwrap();
    wait_until_not_speaking(&controller).await;

    match controller.status().await {
        SynthesisStatus::Error(reason) => assert!(reason.contains("synthesis-unavailable")),
        other => panic!("expected Error status, got {:?}", other),
    }
}

#[tokio::test]
async fn unsupported_engine_records_error_and_stays_silent() {
    let synth = SimulatedSynthesizer::unsupported();
    let spoken = synth.spoken_log();
    let mut controller = SynthesisController::new(Box::new(synth), SynthesisConfig::default());

    assert!(!controller.is_supported().await);
    let err = controller.speak("hello").await.unwrap_err();
    assert!(matches!(err, VoiceError::CapabilityUnsupported(_)));
    assert!(matches!(controller.status().await, SynthesisStatus::Error(_)));
    assert!(spoken.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stop_speaking_is_idempotent() {
    let synth = SimulatedSynthesizer::sustained();
    let mut controller = SynthesisController::new(Box::new(synth), SynthesisConfig::default());

    controller.stop_speaking().await.unwrap();
    assert_eq!(controller.status().await, SynthesisStatus::Idle);

    controller.speak("A").await.unwrap();
    controller.stop_speaking().await.unwrap();
    controller.stop_speaking().await.unwrap();
    assert_eq!(controller.status().await, SynthesisStatus::Idle);
}
