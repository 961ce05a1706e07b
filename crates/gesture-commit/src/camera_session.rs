use async_trait::async_trait;
use gesture_commit_core::CameraController;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Camera presentation state.
///
/// The detector process owns the capture device, so permission is always
/// granted here; start and stop are serialized so overlapping requests
/// cannot interleave.
#[derive(Debug, Default)]
pub struct CameraSession {
    active: Mutex<bool>,
}

#[async_trait]
impl CameraController for CameraSession {
    async fn request_permission(&self) -> bool {
        debug!("Camera permission granted, capture is owned by the detector");
        true
    }

    async fn start_camera(&self) {
        let mut active = self.active.lock().await;
        if !*active {
            *active = true;
            info!("Camera session started");
        }
    }

    async fn stop_camera(&self) {
        let mut active = self.active.lock().await;
        if *active {
            *active = false;
            info!("Camera session stopped");
        }
    }
}
