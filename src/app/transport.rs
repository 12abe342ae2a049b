// logdyn-viewer - app/transport.rs
//
// Transport: the bridge between the duplex channel and the local view.
//
// Architecture:
//   - The host owns the real connection and feeds every lifecycle change and
//     inbound message to `handle_event`; outbound text goes through the
//     `Channel` the transport was built with.
//   - Every record, inbound or outbound, is normalised and then dispatched
//     locally: mirrored to the console sink and appended by the renderer when
//     one is attached.
//   - Nothing here reconnects. A closed or failed channel stays closed and
//     later sends fail fast with `NotConnected` after the local dispatch.
//
// Error policy:
//   - A malformed inbound payload is shown locally as an ERROR record and the
//     wire error is returned to the host.
//   - Renderer failures are logged and never propagated; the console mirror
//     has already happened.

use crate::app::channel::Channel;
use crate::app::console::{console_line, ConsoleSink};
use crate::app::renderer::RecordSink;
use crate::core::model::{
    now_millis, ChannelEvent, ChannelState, ConsoleMethod, LifecycleEvent, LogRecord,
};
use crate::core::wire::{self, RawRecord};
use crate::util::error::TransportError;

// =============================================================================
// Configuration
// =============================================================================

/// Channel behaviour chosen by the host page or `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportConfig {
    /// Send `{"httpSessionId": ...}` once when the channel opens.
    pub send_session_handshake: bool,

    /// Session id used for the handshake.
    pub session_id: Option<String>,
}

/// What `handle_event` did with one channel event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// An inbound message was dispatched as this many records.
    Records(usize),

    /// The channel changed state.
    Lifecycle(LifecycleEvent),
}

// =============================================================================
// Transport
// =============================================================================

pub struct Transport<C: Channel, K: ConsoleSink> {
    channel: C,
    console: K,
    renderer: Option<Box<dyn RecordSink>>,
    config: TransportConfig,
    state: ChannelState,
    handshake_sent: bool,
}

impl<C: Channel, K: ConsoleSink> Transport<C, K> {
    /// Transport with no renderer: records are mirrored to the console only.
    pub fn new(channel: C, console: K, config: TransportConfig) -> Self {
        Self {
            channel,
            console,
            renderer: None,
            config,
            state: ChannelState::Connecting,
            handshake_sent: false,
        }
    }

    /// Attach the renderer every dispatched record is appended to.
    pub fn with_renderer(mut self, renderer: Box<dyn RecordSink>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn console(&self) -> &K {
        &self.console
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn handshake_sent(&self) -> bool {
        self.handshake_sent
    }

    /// Normalise a raw record, logging every validation issue.
    pub fn normalize(&self, raw: &RawRecord) -> LogRecord {
        let normalized = wire::normalize(raw);
        for issue in &normalized.issues {
            tracing::warn!(issue = %issue, level = %normalized.record.level, "Record normalised with defaults");
        }
        normalized.record
    }

    /// Decode an inbound payload and dispatch every record it carries, in
    /// payload order. Returns the number of records dispatched.
    pub fn receive(&mut self, payload: &str) -> Result<usize, TransportError> {
        let parsed = match wire::parse_payload(payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Inbound payload rejected");
                self.dispatch_local(&LogRecord {
                    level: "ERROR".to_string(),
                    message: format!("Unreadable log payload: {e}"),
                    timestamp: now_millis(),
                    session_id: None,
                });
                return Err(e.into());
            }
        };

        for issue in &parsed.skipped {
            tracing::warn!(issue = %issue, "Batch element skipped");
        }

        for raw in &parsed.records {
            let record = self.normalize(raw);
            self.dispatch_local(&record);
        }

        tracing::trace!(records = parsed.records.len(), "Payload dispatched");
        Ok(parsed.records.len())
    }

    /// Mirror a record to the console sink and hand it to the renderer.
    pub fn dispatch_local(&mut self, record: &LogRecord) {
        let method = ConsoleMethod::for_level(&record.level);
        self.console.write(method, &console_line(record));

        if let Some(renderer) = self.renderer.as_mut() {
            if let Err(e) = renderer.append(record) {
                tracing::warn!(error = %e, level = %record.level, "Renderer rejected record");
            }
        }
    }

    /// Normalise, dispatch locally, then push the record over the channel.
    ///
    /// The local dispatch always happens first, so a record sent while the
    /// channel is not open still shows up locally before `NotConnected` is
    /// returned.
    pub fn send(&mut self, raw: &RawRecord) -> Result<LogRecord, TransportError> {
        let record = self.normalize(raw);
        self.dispatch_local(&record);

        if self.state != ChannelState::Open {
            tracing::debug!(state = ?self.state, "Outbound record kept local");
            return Err(TransportError::NotConnected);
        }

        let text = wire::encode_record(&record)?;
        self.channel.send_text(&text)?;
        Ok(record)
    }

    /// Report a runtime error as an ERROR record through `send`.
    pub fn report_error(&mut self, text: &str) -> Result<LogRecord, TransportError> {
        self.send(&RawRecord::new("ERROR", text))
    }

    /// React to one channel event. Never panics and never reconnects.
    pub fn handle_event(&mut self, event: ChannelEvent) -> Result<Dispatch, TransportError> {
        match event {
            ChannelEvent::Opened => {
                self.state = ChannelState::Open;
                tracing::info!("Log channel opened");
                let handshake_sent = match self.handshake() {
                    Ok(sent) => sent,
                    Err(e) => {
                        tracing::error!(error = %e, "Session handshake failed");
                        false
                    }
                };
                Ok(Dispatch::Lifecycle(LifecycleEvent::Opened { handshake_sent }))
            }
            ChannelEvent::Message(text) => self.receive(&text).map(Dispatch::Records),
            ChannelEvent::Closed { code, reason } => {
                self.state = ChannelState::Closed;
                tracing::info!(code, reason = %reason, "Log channel closed");
                Ok(Dispatch::Lifecycle(LifecycleEvent::Closed { code, reason }))
            }
            ChannelEvent::Failed(reason) => {
                self.state = ChannelState::Closed;
                tracing::warn!(reason = %reason, "Log channel failed");
                Ok(Dispatch::Lifecycle(LifecycleEvent::Failed { reason }))
            }
        }
    }

    /// Send the session handshake if configured and not yet sent.
    /// Returns whether a handshake went out.
    fn handshake(&mut self) -> Result<bool, TransportError> {
        if !self.config.send_session_handshake || self.handshake_sent {
            return Ok(false);
        }
        let Some(session_id) = self.config.session_id.as_deref() else {
            tracing::warn!("Session handshake enabled but no session id configured");
            return Ok(false);
        };

        let text = wire::encode_handshake(session_id)?;
        self.channel.send_text(&text)?;
        self.handshake_sent = true;
        tracing::debug!("Session handshake sent");
        Ok(true)
    }

    /// Close the channel. Later sends fail with `NotConnected`.
    pub fn close(&mut self) -> Result<(), TransportError> {
        self.state = ChannelState::Closed;
        self.channel.close()?;
        tracing::info!("Log channel closed by host");
        Ok(())
    }
}
