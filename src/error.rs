/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
A module containing the core crate error enumeration, context structures, and conversion
definitions.
 */

use crate::mqtt::{ConnectReturnCode, PacketType};

use std::error::Error;
use std::fmt;

/// Additional details about an EncodingFailure error variant
#[derive(Debug)]
pub struct EncodingFailureContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about a DecodingFailure error variant
#[derive(Debug)]
pub struct DecodingFailureContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about a ParseFailure error variant
#[derive(Debug)]
pub struct ParseFailureContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about a ProtocolViolation error variant
#[derive(Debug)]
pub struct ProtocolViolationContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about a ConnectionRefused error variant
#[derive(Debug)]
pub struct ConnectionRefusedContext {

    /// CONNACK return code the server rejected the connection with
    pub return_code: ConnectReturnCode,
}

/// Additional details about a ConnectionFailure error variant
#[derive(Debug)]
pub struct ConnectionFailureContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about a PingTimeout error variant
#[derive(Debug)]
pub struct PingTimeoutContext {
}

/// Additional details about a PacketValidation error variant
#[derive(Debug)]
pub struct PacketValidationContext {

    /// type of packet that failed validation
    pub packet_type: PacketType,

    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about an InternalStateError error variant
#[derive(Debug)]
pub struct InternalStateErrorContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about a TransportError error variant
#[derive(Debug)]
pub struct TransportErrorContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Basic error type for the entire loam-mqtt crate.
#[derive(Debug)]
#[non_exhaustive]
pub enum MqttError {

    /// Error encountered while attempting to encode an outbound MQTT packet.  Usually means the
    /// packet's remaining length would exceed the protocol maximum (2 ^ 28 - 1).
    EncodingFailure(EncodingFailureContext),

    /// Error encountered while attempting to decode an incoming frame.  Examples include reserved
    /// packet types, bad header flags, and mismatches between remaining length fields and overall
    /// frame length.
    DecodingFailure(DecodingFailureContext),

    /// Error emitted when an internal buffer read fails during decoding.  Distinct from a
    /// malformed encoding; indicates the frame ended mid-field.
    ParseFailure(ParseFailureContext),

    /// Error emitted when the client encounters server behavior that is well-formed on the wire
    /// but disallowed in context by the MQTT specification.  Examples include a CONNACK outside of
    /// connection establishment, a text frame on the websocket, and wrong PUBREL header flags.
    ProtocolViolation(ProtocolViolationContext),

    /// Error emitted when the server explicitly rejects a connection attempt by sending a CONNACK
    /// with a non-zero return code.
    ConnectionRefused(ConnectionRefusedContext),

    /// Error emitted when the carrier reports a transport or TLS failure while establishing or
    /// maintaining a connection.
    ConnectionFailure(ConnectionFailureContext),

    /// Error emitted when the server does not answer a PINGREQ before the next keep-alive
    /// interval elapses.  Generally indicates that connectivity between the client and server is
    /// broken.
    PingTimeout(PingTimeoutContext),

    /// Error emitted when a packet submitted by the caller violates this client's packet
    /// constraints (empty client id, oversized strings, and the like).
    PacketValidation(PacketValidationContext),

    /// Error emitted by the client when something happens that should never happen.  Always
    /// indicates a bug in the client.
    InternalStateError(InternalStateErrorContext),

    /// Generic error wrapping failures surfaced by the underlying websocket implementation.
    TransportError(TransportErrorContext),
}

impl MqttError {

    pub(crate) fn new_encoding_failure(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::EncodingFailure(
            EncodingFailureContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_decoding_failure(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::DecodingFailure(
            DecodingFailureContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_parse_failure(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::ParseFailure(
            ParseFailureContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_protocol_violation(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::ProtocolViolation(
            ProtocolViolationContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_connection_refused(return_code: ConnectReturnCode) -> Self {
        MqttError::ConnectionRefused(
            ConnectionRefusedContext {
                return_code
            }
        )
    }

    /// Constructs a new ConnectionFailure variant from an existing error.  Typically this wraps
    /// an error surfacing from the carrier while a connection is being established.
    pub fn new_connection_failure(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::ConnectionFailure(
            ConnectionFailureContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_ping_timeout() -> Self {
        MqttError::PingTimeout(
            PingTimeoutContext {
            }
        )
    }

    pub(crate) fn new_packet_validation(packet_type: PacketType, source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::PacketValidation(
            PacketValidationContext {
                packet_type,
                source : source.into()
            }
        )
    }

    pub(crate) fn new_internal_state_error(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::InternalStateError(
            InternalStateErrorContext {
                source : source.into()
            }
        )
    }

    /// Constructs a new TransportError variant from an existing error.  Typically this should be
    /// an error surfacing from the third-party websocket library.
    pub fn new_transport_error(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::TransportError(
            TransportErrorContext {
                source : source.into()
            }
        )
    }
}

impl Error for MqttError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MqttError::EncodingFailure(context) => {
                Some(context.source.as_ref())
            }
            MqttError::DecodingFailure(context) => {
                Some(context.source.as_ref())
            }
            MqttError::ParseFailure(context) => {
                Some(context.source.as_ref())
            }
            MqttError::ProtocolViolation(context) => {
                Some(context.source.as_ref())
            }
            MqttError::ConnectionFailure(context) => {
                Some(context.source.as_ref())
            }
            MqttError::PacketValidation(context) => {
                Some(context.source.as_ref())
            }
            MqttError::InternalStateError(context) => {
                Some(context.source.as_ref())
            }
            MqttError::TransportError(context) => {
                Some(context.source.as_ref())
            }
            _ => { None }
        }
    }
}

impl fmt::Display for MqttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MqttError::EncodingFailure(_) => {
                write!(f, "failure encountered while encoding an outbound MQTT packet")
            }
            MqttError::DecodingFailure(_) => {
                write!(f, "failure encountered while decoding an incoming MQTT frame")
            }
            MqttError::ParseFailure(_) => {
                write!(f, "internal buffer read failure while decoding an incoming MQTT frame")
            }
            MqttError::ProtocolViolation(_) => {
                write!(f, "server behavior disallowed in context by the mqtt spec")
            }
            MqttError::ConnectionRefused(context) => {
                write!(f, "server rejected the connection attempt: {}", context.return_code)
            }
            MqttError::ConnectionFailure(_) => {
                write!(f, "carrier failure while establishing or maintaining a connection; source contains further details")
            }
            MqttError::PingTimeout(_) => {
                write!(f, "server did not answer a pingreq before the next keep alive interval")
            }
            MqttError::PacketValidation(context) => {
                write!(f, "{} violates this client's packet constraints", context.packet_type)
            }
            MqttError::InternalStateError(_) => {
                write!(f, "client reached an invalid internal state; almost certainly a client bug")
            }
            MqttError::TransportError(_) => {
                write!(f, "websocket transport error; source contains further details")
            }
        }
    }
}

impl From<core::str::Utf8Error> for MqttError {
    fn from(err: core::str::Utf8Error) -> Self {
        MqttError::new_decoding_failure(err)
    }
}

impl From<std::io::Error> for MqttError {
    fn from(err: std::io::Error) -> Self {
        MqttError::new_transport_error(err)
    }
}

impl From<http::Error> for MqttError {
    fn from(err: http::Error) -> Self {
        MqttError::new_connection_failure(err)
    }
}

impl From<tungstenite::error::Error> for MqttError {
    fn from(err: tungstenite::error::Error) -> Self {
        MqttError::new_transport_error(err)
    }
}

/// Crate-wide result type for functions that can fail
pub type MqttResult<T> = Result<T, MqttError>;
