use crate::{CoreResult, protocol::DetectorCommand};

use async_trait::async_trait;

/// Outbound path from the session coordinator to the detector.
///
/// Implementations must deliver commands in call order; enable/disable
/// pairs are order sensitive.
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Encode and queue one command.
    async fn send_command(&self, command: DetectorCommand) -> CoreResult<()>;
}
