use crate::domain::model::StatusChangeEvent;
use crate::domain::ports::Notifier;
use crate::utils::error::{ChronicleError, Result};
use tokio::sync::mpsc;

/// Writes each status change to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    async fn notify(&self, event: &StatusChangeEvent) -> Result<()> {
        tracing::info!(
            record_id = %event.record_id,
            child_id = %event.child_id,
            actor = %event.acting_user_id,
            "Notification: vaccination is now {}",
            event.new_status
        );
        Ok(())
    }
}

/// Forwards events to a channel, for a reminder or messaging worker to consume.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<StatusChangeEvent>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StatusChangeEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    async fn notify(&self, event: &StatusChangeEvent) -> Result<()> {
        self.sender
            .send(event.clone())
            .map_err(|_| ChronicleError::NotificationError {
                message: "notification receiver has been dropped".to_string(),
            })
    }
}
