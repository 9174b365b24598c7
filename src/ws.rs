/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
A synchronous, [`tungstenite`](https://crates.io/crates/tungstenite)-backed carrier
implementation.  TLS validation is performed by the underlying stream during the handshake, so
this carrier never reports `CarrierEvent::TlsErrors`; validation failures surface as transport
errors instead.
 */

use log::*;

use std::collections::VecDeque;
use std::net::TcpStream;

use tungstenite::protocol::{Message, WebSocket};
use tungstenite::stream::MaybeTlsStream;

use crate::carrier::*;
use crate::error::MqttResult;

/// Carrier implementation that runs the websocket channel over a blocking stream.
pub struct WebsocketCarrier {
    stream: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
    pending_events: VecDeque<CarrierEvent>,
}

impl WebsocketCarrier {

    /// Creates a new, unconnected carrier
    pub fn new() -> Self {
        WebsocketCarrier {
            stream: None,
            pending_events: VecDeque::new(),
        }
    }
}

impl Default for WebsocketCarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl Carrier for WebsocketCarrier {

    fn open(&mut self, request: &NetworkRequest) -> MqttResult<()> {
        debug!("WebsocketCarrier - opening websocket to {}", request.url());

        let client_request = request.to_client_request()?;

        match tungstenite::connect(client_request) {
            Ok((stream, _)) => {
                self.stream = Some(stream);
                self.pending_events.push_back(CarrierEvent::Connected);
                Ok(())
            }
            Err(error) => {
                error!("WebsocketCarrier - websocket handshake failed: {}", error);
                Err(error.into())
            }
        }
    }

    fn send_binary(&mut self, bytes: &[u8]) -> MqttResult<()> {
        if let Some(stream) = &mut self.stream {
            stream.send(Message::Binary(bytes.to_vec()))?;
            return Ok(());
        }

        Err(crate::error::MqttError::new_internal_state_error("send on an unopened carrier"))
    }

    fn close(&mut self) {
        if let Some(stream) = &mut self.stream {
            let _ = stream.close(None);
        }
    }

    fn abort(&mut self) {
        // dropping the stream tears down the underlying socket without a close handshake
        self.stream = None;
    }

    fn ignore_tls_errors(&mut self) {
        // validation already happened during the handshake; nothing to override afterwards
    }

    fn poll_event(&mut self) -> Option<CarrierEvent> {
        if let Some(event) = self.pending_events.pop_front() {
            return Some(event);
        }

        loop {
            let read_result =
                match &mut self.stream {
                    Some(stream) => { stream.read() }
                    None => { return None; }
                };

            match read_result {
                Ok(Message::Binary(bytes)) => {
                    return Some(CarrierEvent::BinaryReceived(bytes));
                }
                Ok(Message::Text(text)) => {
                    return Some(CarrierEvent::TextReceived(text));
                }
                Ok(Message::Close(close_frame)) => {
                    self.stream = None;

                    let (code, reason) =
                        if let Some(frame) = close_frame {
                            (u16::from(frame.code), frame.reason.to_string())
                        } else {
                            (1005, String::new())
                        };

                    return Some(CarrierEvent::Disconnected { code, reason });
                }
                Ok(_) => {
                    // websocket-level pings and pongs are handled by tungstenite itself
                    continue;
                }
                Err(error) => {
                    warn!("WebsocketCarrier - read failure: {}", error);
                    self.stream = None;

                    return Some(CarrierEvent::TransportError {
                        code: 0,
                        message: error.to_string(),
                    });
                }
            }
        }
    }
}
