use async_trait::async_trait;

/// Camera permission and capture session.
///
/// Only the session coordinator calls this; implementations serialize
/// start/stop internally.
#[async_trait]
pub trait CameraController: Send + Sync {
    /// Ask for camera access. Resolves once the user (or OS) has answered.
    async fn request_permission(&self) -> bool;

    /// Start the capture session. Idempotent.
    async fn start_camera(&self);

    /// Stop the capture session. Idempotent.
    async fn stop_camera(&self);
}
