//! Locally emitted provider output.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::RemoteValue;

/// An item written back to the host, tagged with its path and container flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderItem {
    pub value: RemoteValue,
    pub path: String,
    pub is_container: bool,
}

impl ProviderItem {
    #[must_use]
    pub fn new(value: impl Into<RemoteValue>, path: impl Into<String>, is_container: bool) -> Self {
        Self {
            value: value.into(),
            path: path.into(),
            is_container,
        }
    }
}

/// Sink for provider output.
///
/// Items are written one at a time as remote results arrive.
pub trait ItemWriter: Send {
    fn write_item(&mut self, item: ProviderItem);
}

impl ItemWriter for Vec<ProviderItem> {
    fn write_item(&mut self, item: ProviderItem) {
        self.push(item);
    }
}

/// Channel-backed writer whose receiving half is consumed as a stream.
#[derive(Debug, Clone)]
pub struct ItemChannel {
    sender: mpsc::UnboundedSender<ProviderItem>,
}

impl ItemChannel {
    /// Create a writer and the stream of items written to it.
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiverStream<ProviderItem>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, UnboundedReceiverStream::new(receiver))
    }
}

impl ItemWriter for ItemChannel {
    fn write_item(&mut self, item: ProviderItem) {
        let _ = self.sender.send(item); // receiver may be gone
    }
}
