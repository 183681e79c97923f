//! Deterministic artifact naming derived from job identity.
//!
//! Job ids are unique, so deriving filenames from them is collision-free.

/// Filename of the synthesized narration audio for a job.
///
/// # Examples
///
/// ```
/// use boardcast_core::naming::audio_filename;
///
/// assert_eq!(audio_filename("job_1712_g3"), "job_1712_g3.mp3");
/// ```
pub fn audio_filename(job_id: &str) -> String {
    format!("{job_id}.mp3")
}

/// Gateway-relative URL under which the audio artifact is served.
pub fn audio_url(job_id: &str) -> String {
    format!("/audio/{}", audio_filename(job_id))
}
