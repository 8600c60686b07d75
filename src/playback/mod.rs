//! Playback of pre-recorded audio responses returned by the backend.

mod registry;

pub use registry::{PlaybackRegistry, PlaybackStatus};

/// Resolve a backend-supplied audio path to a fetchable URL.
///
/// The backend returns either a full `/audio/...` path or a bare filename.
pub fn resolve_audio_url(base_url: &str, audio_path: &str) -> String {
    if audio_path.starts_with("/audio/") {
        format!("{base_url}{audio_path}")
    } else {
        format!("{base_url}/audio/{audio_path}")
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_audio_url;

    #[test]
    fn absolute_audio_path_keeps_prefix() {
        assert_eq!(
            resolve_audio_url("http://127.0.0.1:8000", "/audio/x.wav"),
            "http://127.0.0.1:8000/audio/x.wav"
        );
    }

    #[test]
    fn bare_filename_gets_audio_prefix() {
        assert_eq!(
            resolve_audio_url("http://127.0.0.1:8000", "x.wav"),
            "http://127.0.0.1:8000/audio/x.wav"
        );
    }
}
