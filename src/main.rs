use anyhow::Result;
use dispatch_voice::capability::{
    MicrophoneScript, RecognizerScript, SimulatedMicrophone, SimulatedRecognizer,
};
use dispatch_voice::{
    CaptureController, Config, RecognitionEvent, TranscriptionController, TranscriptionStatus,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = match Config::load("config/dispatch-voice") {
        Ok(cfg) => cfg,
        Err(_) => {
            info!("No config file found, using defaults");
            Config::default()
        }
    };

    info!("dispatch-voice v0.1.0");
    info!("Backend base URL: {}", cfg.backend.base_url);

    // Exercise the capture pipeline against a scripted microphone
    let frames = SimulatedMicrophone::silence_frames(
        20,
        cfg.capture.sample_rate,
        cfg.capture.channels,
    );
    let mic = SimulatedMicrophone::new(MicrophoneScript::Grant { frames });
    let mut capture = CaptureController::new(Box::new(mic), cfg.capture.clone());

    capture.start_recording().await?;
    capture.stop_recording().await?;

    if let Some(clip) = capture.clip().await {
        info!(
            "Captured {:.1}s clip: {} Hz, {} channel(s), {} bytes ({})",
            clip.duration_seconds,
            clip.sample_rate,
            clip.channels,
            clip.data.len(),
            clip.media_type
        );
    }

    // And the transcription pipeline against a scripted recognizer
    let recognizer = SimulatedRecognizer::new(RecognizerScript::Session {
        events: vec![
            RecognitionEvent::Result {
                final_text: String::new(),
                interim_text: "there is a".to_string(),
            },
            RecognitionEvent::Result {
                final_text: "there is a fire on elm street".to_string(),
                interim_text: String::new(),
            },
            RecognitionEvent::End,
        ],
    });
    let mut transcription =
        TranscriptionController::new(Box::new(recognizer), cfg.transcription.clone());

    transcription.start_listening().await?;
    while transcription.status().await == TranscriptionStatus::Listening {
        tokio::task::yield_now().await;
    }
    info!("Transcribed: \"{}\"", transcription.text().await);

    Ok(())
}
