/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use log::*;

use std::collections::VecDeque;
use std::fmt;

use crate::decode::utils::*;
use crate::encode::utils::*;
use crate::error::{MqttError, MqttResult};
use crate::logging::*;
use crate::mqtt::*;
use crate::mqtt::utils::*;
use crate::validate::*;

/// Keep-alive interval used when the caller does not configure one
pub const DEFAULT_KEEP_ALIVE_INTERVAL_SECONDS : u16 = 30;

/// Data model of an [MQTT 3.1.1 CONNECT](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718028) packet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectPacket {

    /// Maximum time interval, in seconds, that is permitted to elapse between client
    /// transmissions.  Zero disables the keep-alive contract.
    pub keep_alive_interval_seconds: u16,

    /// True if the server should discard any existing session state for this client id.
    pub clean_session: bool,

    /// A unique string identifying the client to the server.  Must be non-empty and shorter than
    /// 24 characters.
    pub client_id: String,

    /// A string value that the server may use for client authentication.  Non-empty when present.
    pub username: Option<String>,

    /// Opaque binary data that the server may use for client authentication.  An empty password
    /// is legal and distinct from an absent one.
    pub password: Option<Vec<u8>>,

    /// Testament message the server publishes on the client's behalf if the connection drops
    /// non-gracefully.
    pub will: Option<Will>,
}

impl Default for ConnectPacket {
    fn default() -> Self {
        ConnectPacket {
            keep_alive_interval_seconds: DEFAULT_KEEP_ALIVE_INTERVAL_SECONDS,
            clean_session: true,
            client_id: String::new(),
            username: None,
            password: None,
            will: None,
        }
    }
}

/* protocol name, length-prefixed, followed by the protocol level byte */
static MQTT_CONNECT_PROTOCOL_BYTES: [u8; 7] = [0, 4, 77, 81, 84, 84, 4];

fn get_connect_protocol_bytes(_: &MqttPacket) -> &'static [u8] {
    &MQTT_CONNECT_PROTOCOL_BYTES
}

fn get_connect_packet_client_id(packet: &MqttPacket) -> &str {
    get_packet_field!(packet, MqttPacket::Connect, client_id)
}

fn get_connect_packet_username(packet: &MqttPacket) -> &str {
    get_optional_packet_field!(packet, MqttPacket::Connect, username)
}

fn get_connect_packet_password(packet: &MqttPacket) -> &[u8] {
    get_optional_packet_field!(packet, MqttPacket::Connect, password)
}

fn get_connect_packet_will_topic(packet: &MqttPacket) -> &str {
    if let MqttPacket::Connect(connect) = packet {
        if let Some(will) = &connect.will {
            return will.topic.as_str();
        }
    }

    panic!("Packet variant mismatch");
}

fn get_connect_packet_will_payload(packet: &MqttPacket) -> &[u8] {
    if let MqttPacket::Connect(connect) = packet {
        if let Some(will) = &connect.will {
            return will.payload.as_slice();
        }
    }

    panic!("Packet variant mismatch");
}

fn compute_connect_flags(packet: &ConnectPacket) -> u8 {
    let mut flags: u8 = 0;
    if packet.clean_session {
        flags |= CONNECT_PACKET_CLEAN_SESSION_FLAG_MASK;
    }

    if let Some(will) = &packet.will {
        flags |= CONNECT_PACKET_HAS_WILL_FLAG_MASK;
        flags |= (will.qos as u8) << CONNECT_PACKET_WILL_QOS_FLAG_SHIFT;
        if will.retain {
            flags |= CONNECT_PACKET_WILL_RETAIN_FLAG_MASK;
        }
    }

    if packet.password.is_some() {
        flags |= CONNECT_PACKET_HAS_PASSWORD_FLAG_MASK;
    }

    if packet.username.is_some() {
        flags |= CONNECT_PACKET_HAS_USERNAME_FLAG_MASK;
    }

    flags
}

fn compute_connect_packet_length(packet: &ConnectPacket) -> MqttResult<u32> {

    /* variable header length =
     *    10 bytes (6 for the protocol name string, 1 for protocol level, 1 for flags,
     *    2 for keep alive)
     */
    let variable_header_length = 10;

    let mut payload_length : usize = 2 + packet.client_id.len();

    if let Some(will) = &packet.will {
        payload_length += 2 + will.topic.len();
        payload_length += 2 + will.payload.len();
    }

    if let Some(username) = &packet.username {
        payload_length += 2 + username.len();
    }

    if let Some(password) = &packet.password {
        payload_length += 2 + password.len();
    }

    let total_remaining_length : usize = payload_length + variable_header_length;
    compute_variable_length_integer_encode_size(total_remaining_length)?;

    Ok(total_remaining_length as u32)
}

#[rustfmt::skip]
pub(crate) fn write_connect_encoding_steps(packet: &ConnectPacket, steps: &mut VecDeque<EncodingStep>) -> MqttResult<()> {
    let total_remaining_length = compute_connect_packet_length(packet)?;

    encode_integral_expression!(steps, Uint8, CONNECT_FIRST_BYTE);
    encode_integral_expression!(steps, Vli, total_remaining_length);
    encode_raw_bytes!(steps, get_connect_protocol_bytes);
    encode_integral_expression!(steps, Uint8, compute_connect_flags(packet));
    encode_integral_expression!(steps, Uint16, packet.keep_alive_interval_seconds);

    encode_length_prefixed_string!(steps, get_connect_packet_client_id, packet.client_id);

    if let Some(will) = &packet.will {
        encode_length_prefixed_string!(steps, get_connect_packet_will_topic, will.topic);
        encode_length_prefixed_bytes!(steps, get_connect_packet_will_payload, will.payload);
    }

    if packet.username.is_some() {
        encode_length_prefixed_optional_string!(steps, get_connect_packet_username, packet.username);
    }

    if packet.password.is_some() {
        encode_length_prefixed_optional_bytes!(steps, get_connect_packet_password, packet.password);
    }

    Ok(())
}

pub(crate) fn decode_connect_packet(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != CONNECT_FIRST_BYTE {
        error!("ConnectPacket Decode - invalid first byte");
        return Err(MqttError::new_decoding_failure("invalid first byte for connect packet"));
    }

    let mut packet = ConnectPacket { ..Default::default() };
    let mut mutable_body = packet_body;

    let mut protocol_name = String::new();
    mutable_body = decode_length_prefixed_string(mutable_body, &mut protocol_name)?;
    if protocol_name != "MQTT" {
        error!("ConnectPacket Decode - invalid protocol name");
        return Err(MqttError::new_decoding_failure("invalid protocol name for connect packet"));
    }

    let mut protocol_level : u8 = 0;
    mutable_body = decode_u8(mutable_body, &mut protocol_level)?;
    if protocol_level != 4 {
        error!("ConnectPacket Decode - invalid protocol level ({})", protocol_level);
        return Err(MqttError::new_decoding_failure("invalid protocol level for connect packet"));
    }

    let mut flags : u8 = 0;
    mutable_body = decode_u8(mutable_body, &mut flags)?;
    if (flags & 0x01) != 0 {
        error!("ConnectPacket Decode - reserved flag bit set");
        return Err(MqttError::new_decoding_failure("reserved connect flag bit set"));
    }

    packet.clean_session = (flags & CONNECT_PACKET_CLEAN_SESSION_FLAG_MASK) != 0;

    mutable_body = decode_u16(mutable_body, &mut packet.keep_alive_interval_seconds)?;
    mutable_body = decode_length_prefixed_string(mutable_body, &mut packet.client_id)?;

    if (flags & CONNECT_PACKET_HAS_WILL_FLAG_MASK) != 0 {
        let will_qos = convert_u8_to_quality_of_service((flags >> CONNECT_PACKET_WILL_QOS_FLAG_SHIFT) & QOS_MASK)?;
        let will_retain = (flags & CONNECT_PACKET_WILL_RETAIN_FLAG_MASK) != 0;

        let mut will_topic = String::new();
        mutable_body = decode_length_prefixed_string(mutable_body, &mut will_topic)?;

        let mut will_payload : Option<Vec<u8>> = None;
        mutable_body = decode_length_prefixed_optional_bytes(mutable_body, &mut will_payload)?;

        packet.will = Some(Will {
            topic: will_topic,
            payload: will_payload.unwrap_or_default(),
            retain: will_retain,
            qos: will_qos,
        });
    } else if (flags & (CONNECT_PACKET_WILL_RETAIN_FLAG_MASK | (QOS_MASK << CONNECT_PACKET_WILL_QOS_FLAG_SHIFT))) != 0 {
        error!("ConnectPacket Decode - will flags set without a will");
        return Err(MqttError::new_decoding_failure("will flags set without a will"));
    }

    if (flags & CONNECT_PACKET_HAS_USERNAME_FLAG_MASK) != 0 {
        let mut username = String::new();
        mutable_body = decode_length_prefixed_string(mutable_body, &mut username)?;
        packet.username = Some(username);
    }

    if (flags & CONNECT_PACKET_HAS_PASSWORD_FLAG_MASK) != 0 {
        decode_length_prefixed_optional_bytes(mutable_body, &mut packet.password)?;
    }

    Ok(MqttPacket::Connect(packet))
}

pub(crate) fn validate_connect_packet_outbound(packet: &ConnectPacket) -> MqttResult<()> {
    validate_client_id(&packet.client_id, PacketType::Connect)?;

    if let Some(username) = &packet.username {
        if username.is_empty() {
            error!("ConnectPacket Validation - username present but empty");
            return Err(MqttError::new_packet_validation(PacketType::Connect, "username present but empty"));
        }
    }

    validate_optional_string_length(&packet.username, PacketType::Connect, "username")?;
    validate_optional_binary_length(&packet.password, PacketType::Connect, "password")?;

    if let Some(will) = &packet.will {
        if !is_valid_topic_name(&will.topic) {
            error!("ConnectPacket Validation - invalid will topic");
            return Err(MqttError::new_packet_validation(PacketType::Connect, "invalid will topic"));
        }

        if will.payload.len() > MAXIMUM_STRING_LENGTH {
            error!("ConnectPacket Validation - will payload too long");
            return Err(MqttError::new_packet_validation(PacketType::Connect, "will payload too long"));
        }

        if will.qos == QualityOfService::Invalid {
            error!("ConnectPacket Validation - will qos is not a legal wire value");
            return Err(MqttError::new_packet_validation(PacketType::Connect, "will qos is not a legal wire value"));
        }
    }

    Ok(())
}

impl fmt::Display for ConnectPacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ConnectPacket {{")?;
        log_primitive_value!(self.keep_alive_interval_seconds, f, "keep_alive_interval_seconds");
        log_primitive_value!(self.clean_session, f, "clean_session");
        log_string!(self.client_id, f, "client_id");
        log_optional_string!(self.username, f, "username", value);
        log_optional_binary_data_sensitive!(self.password, f, "password");
        if let Some(will) = &self.will {
            write!(f, " will: {{")?;
            log_string!(will.topic, f, "topic");
            log_binary_data!(will.payload, f, "payload");
            log_primitive_value!(will.retain, f, "retain");
            log_enum!(will.qos, f, "qos", quality_of_service_to_str);
            write!(f, " }}")?;
        }
        write!(f, " }}")
    }
}
