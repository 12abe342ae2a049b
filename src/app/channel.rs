// logdyn-viewer - app/channel.rs
//
// Duplex message channel seam. The transport pushes outbound text through a
// `Channel`; inbound traffic and lifecycle changes arrive as `ChannelEvent`s
// that the host feeds to `Transport::handle_event`.

use crate::util::error::ChannelError;

/// Outbound half of a duplex text channel.
pub trait Channel {
    /// Push one text message. Fire-and-forget: no acknowledgement is awaited.
    fn send_text(&mut self, text: &str) -> Result<(), ChannelError>;

    /// Close the underlying connection.
    fn close(&mut self) -> Result<(), ChannelError>;
}

/// In-memory channel that records every outbound message.
///
/// Used by the native replay host, where nothing is sent upstream, and by
/// tests.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    sent: Vec<String>,
    closed: bool,
    reject: Option<ChannelError>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages pushed so far, in order.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Make every following `send_text` fail with `error`.
    pub fn reject_with(&mut self, error: ChannelError) {
        self.reject = Some(error);
    }
}

impl Channel for MemoryChannel {
    fn send_text(&mut self, text: &str) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        if let Some(err) = &self.reject {
            return Err(err.clone());
        }
        self.sent.push(text.to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        self.closed = true;
        Ok(())
    }
}
