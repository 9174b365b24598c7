/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Module containing a set of structured data types that model the MQTT 3.1.1 specification.
 */

use std::fmt;

use crate::error::MqttError;

pub(crate) mod connack;
pub(crate) mod connect;
pub(crate) mod disconnect;
pub(crate) mod pingreq;
pub(crate) mod pingresp;
pub(crate) mod puback;
pub(crate) mod pubcomp;
pub(crate) mod publish;
pub(crate) mod pubrec;
pub(crate) mod pubrel;
pub(crate) mod suback;
pub(crate) mod subscribe;
pub(crate) mod unsuback;
pub(crate) mod unsubscribe;
pub mod utils;

pub use connack::ConnackPacket;
pub use connect::ConnectPacket;
pub use disconnect::DisconnectPacket;
pub use pingreq::PingreqPacket;
pub use pingresp::PingrespPacket;
pub use puback::PubackPacket;
pub use pubcomp::PubcompPacket;
pub use publish::PublishPacket;
pub use pubrec::PubrecPacket;
pub use pubrel::PubrelPacket;
pub use suback::SubackPacket;
pub use subscribe::{SubscribePacket, Subscription};
pub use unsuback::UnsubackPacket;
pub use unsubscribe::UnsubscribePacket;

/// MQTT message delivery quality of service.
///
/// Enum values match [MQTT 3.1.1 spec](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718099)
/// encoding values.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum QualityOfService {

    /// The message is delivered according to the capabilities of the underlying network. No response is sent by the
    /// receiver and no retry is performed by the sender. The message arrives at the receiver either once or not at all.
    #[default]
    AtMostOnce = 0,

    /// A level of service that ensures that the message arrives at the receiver at least once.
    AtLeastOnce = 1,

    /// A level of service that ensures that the message arrives at the receiver exactly once.
    ExactlyOnce = 2,

    /// Sentinel that represents a per-filter subscription failure (wire value 0x80) inside a
    /// SUBACK return code list.  Never a legal value for a QoS field on the wire.
    Invalid = 3,
}

impl TryFrom<u8> for QualityOfService {
    type Error = MqttError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        utils::convert_u8_to_quality_of_service(value)
    }
}

/// Server return code for connection attempts.
///
/// Enum values match [MQTT 3.1.1 spec](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718035)
/// encoding values.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ConnectReturnCode {

    /// Returned when the connection is accepted.
    #[default]
    Accepted = 0,

    /// Returned when the server does not support the level of the MQTT protocol requested by the client.
    UnacceptableProtocolVersion = 1,

    /// Returned when the client identifier is correct UTF-8 but not allowed by the server.
    IdentifierRejected = 2,

    /// Returned when the network connection has been made but the MQTT service is unavailable.
    ServerUnavailable = 3,

    /// Returned when the data in the user name or password is malformed.
    BadUsernameOrPassword = 4,

    /// Returned when the client is not authorized to connect.
    NotAuthorized = 5,
}

impl ConnectReturnCode {
    /// Returns whether or not the return code represents an accepted connection
    pub fn is_accepted(&self) -> bool {
        matches!(self, ConnectReturnCode::Accepted)
    }
}

impl fmt::Display for ConnectReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", utils::connect_return_code_to_str(*self))
    }
}

impl TryFrom<u8> for ConnectReturnCode {
    type Error = MqttError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        utils::convert_u8_to_connect_return_code(value)
    }
}

/// An enum indicating the kind of MQTT control packet
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// A Connect packet; client request to connect to the server
    Connect,

    /// A Connack packet; connect acknowledgement
    Connack,

    /// A Publish packet; carries an application message in either direction
    Publish,

    /// A Puback packet; QoS 1 publish acknowledgement
    Puback,

    /// A Pubrec packet; QoS 2 publish received (assured delivery part 1)
    Pubrec,

    /// A Pubrel packet; QoS 2 publish release (assured delivery part 2)
    Pubrel,

    /// A Pubcomp packet; QoS 2 publish complete (assured delivery part 3)
    Pubcomp,

    /// A Subscribe packet; client subscribe request
    Subscribe,

    /// A Suback packet; subscribe acknowledgement
    Suback,

    /// An Unsubscribe packet; client unsubscribe request
    Unsubscribe,

    /// An Unsuback packet; unsubscribe acknowledgement
    Unsuback,

    /// A Pingreq packet; keep-alive probe
    Pingreq,

    /// A Pingresp packet; keep-alive probe response
    Pingresp,

    /// A Disconnect packet; client is disconnecting
    Disconnect,
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketType::Connect => { write!(f, "ConnectPacket") }
            PacketType::Connack => { write!(f, "ConnackPacket") }
            PacketType::Publish => { write!(f, "PublishPacket") }
            PacketType::Puback => { write!(f, "PubackPacket") }
            PacketType::Pubrec => { write!(f, "PubrecPacket") }
            PacketType::Pubrel => { write!(f, "PubrelPacket") }
            PacketType::Pubcomp => { write!(f, "PubcompPacket") }
            PacketType::Subscribe => { write!(f, "SubscribePacket") }
            PacketType::Suback => { write!(f, "SubackPacket") }
            PacketType::Unsubscribe => { write!(f, "UnsubscribePacket") }
            PacketType::Unsuback => { write!(f, "UnsubackPacket") }
            PacketType::Pingreq => { write!(f, "PingreqPacket") }
            PacketType::Pingresp => { write!(f, "PingrespPacket") }
            PacketType::Disconnect => { write!(f, "DisconnectPacket") }
        }
    }
}

/// Last-testament message the server publishes on the client's behalf if the connection drops
/// non-gracefully.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Will {

    /// Topic the server should publish the testament message to.  Non-empty and wildcard-free.
    pub topic: String,

    /// Testament message bytes.  May be empty.
    pub payload: Vec<u8>,

    /// True if the server should retain the testament message on its topic.
    pub retain: bool,

    /// Quality of service the server should publish the testament message with.
    pub qos: QualityOfService,
}

impl Will {

    /// Creates a new Will with the given topic and payload
    pub fn new(topic: &str, payload: &[u8], qos: QualityOfService, retain: bool) -> Self {
        Will {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            retain,
            qos,
        }
    }

    /// Returns whether this Will carries a testament.  A Will with an empty topic does not and
    /// fails CONNECT validation.
    pub fn is_valid(&self) -> bool {
        !self.topic.is_empty()
    }
}

/// Algebraic union of all MQTT 3.1.1 control packets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MqttPacket {
    /// Connect variant
    Connect(ConnectPacket),

    /// Connack variant
    Connack(ConnackPacket),

    /// Publish variant
    Publish(PublishPacket),

    /// Puback variant
    Puback(PubackPacket),

    /// Pubrec variant
    Pubrec(PubrecPacket),

    /// Pubrel variant
    Pubrel(PubrelPacket),

    /// Pubcomp variant
    Pubcomp(PubcompPacket),

    /// Subscribe variant
    Subscribe(SubscribePacket),

    /// Suback variant
    Suback(SubackPacket),

    /// Unsubscribe variant
    Unsubscribe(UnsubscribePacket),

    /// Unsuback variant
    Unsuback(UnsubackPacket),

    /// Pingreq variant
    Pingreq(PingreqPacket),

    /// Pingresp variant
    Pingresp(PingrespPacket),

    /// Disconnect variant
    Disconnect(DisconnectPacket),
}
