/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Module containing the abstract binary-message channel the session runs over, together with the
request and event types that cross that boundary.
 */

use http::header::{HeaderName, HeaderValue};
use tungstenite::client::IntoClientRequest;
use tungstenite::handshake::client::Request;

use crate::error::{MqttError, MqttResult};

/// Websocket sub-protocol every connection must negotiate
pub const WEBSOCKET_SUBPROTOCOL : &str = "mqttv3.1";

const SEC_WEBSOCKET_PROTOCOL : &str = "Sec-WebSocket-Protocol";

/// A TLS validation failure reported by the carrier during connection establishment.
///
/// Allow-list matching considers only the numeric code; the certificate identity behind the
/// failure is not part of the comparison.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TlsError {

    /// Numeric code identifying the kind of validation failure
    pub code: i32,

    /// Human-readable description of the failure
    pub description: String,
}

/// Connection request handed to the carrier: an endpoint url plus any additional HTTP headers to
/// send with the websocket handshake.
#[derive(Clone, Debug, Default)]
pub struct NetworkRequest {
    url: String,
    headers: Vec<(String, String)>,
}

impl NetworkRequest {

    /// Creates a new request for the given websocket url
    pub fn new(url: &str) -> Self {
        NetworkRequest {
            url: url.to_string(),
            headers: Vec::new(),
        }
    }

    /// Adds an HTTP header to send with the websocket handshake
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Returns the endpoint url
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Converts this request into a websocket client handshake request.  The
    /// `Sec-WebSocket-Protocol: mqttv3.1` header is set exactly once, regardless of what the
    /// caller supplied.
    pub fn to_client_request(&self) -> MqttResult<Request> {
        let mut request = self.url.as_str().into_client_request()?;

        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(MqttError::new_connection_failure)?;
            let header_value = HeaderValue::from_str(value.as_str())
                .map_err(MqttError::new_connection_failure)?;
            request.headers_mut().insert(header_name, header_value);
        }

        request.headers_mut().insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(WEBSOCKET_SUBPROTOCOL),
        );

        Ok(request)
    }
}

/// Events the carrier surfaces to the session.  The driving event loop delivers them in receipt
/// order via `Session::handle_carrier_event`.
#[derive(Debug)]
pub enum CarrierEvent {

    /// The websocket handshake completed and the channel is ready for binary messages.
    Connected,

    /// The channel closed, gracefully or not.
    Disconnected {
        /// Websocket close code
        code: u16,

        /// Close reason supplied by the peer, if any
        reason: String,
    },

    /// One binary message arrived.  Each message carries exactly one MQTT control packet.
    BinaryReceived(Vec<u8>),

    /// A text message arrived.  Always a protocol violation on an MQTT connection.
    TextReceived(String),

    /// Certificate validation failed while establishing TLS.  The session answers by either
    /// instructing the carrier to proceed or by abandoning the connection.
    TlsErrors(Vec<TlsError>),

    /// The transport failed underneath the websocket.
    TransportError {
        /// Carrier-specific error code
        code: i32,

        /// Human-readable description of the failure
        message: String,
    },
}

/// Abstract bidirectional binary message channel the session transports its packets over.
///
/// The session owns its carrier for the duration of a connection attempt and drops it no later
/// than the transition back to offline.
pub trait Carrier {

    /// Starts connecting to the endpoint described by the request.
    fn open(&mut self, request: &NetworkRequest) -> MqttResult<()>;

    /// Sends one binary message over the channel.
    fn send_binary(&mut self, bytes: &[u8]) -> MqttResult<()>;

    /// Closes the channel in an orderly fashion.
    fn close(&mut self);

    /// Tears the channel down immediately, without a close handshake.
    fn abort(&mut self);

    /// Instructs the carrier to proceed past previously reported TLS validation errors.
    fn ignore_tls_errors(&mut self);

    /// Returns the next pending event from the carrier, if any.
    fn poll_event(&mut self) -> Option<CarrierEvent>;
}
