/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Module containing miscellaneous constants and conversion functions related to the MQTT
specification.
 */

use log::error;

use crate::error::{MqttError, MqttResult};
use crate::mqtt::*;

pub(crate) const PACKET_TYPE_RESERVED_0: u8 = 0;
pub(crate) const PACKET_TYPE_CONNECT: u8 = 1;
pub(crate) const PACKET_TYPE_CONNACK: u8 = 2;
pub(crate) const PACKET_TYPE_PUBLISH: u8 = 3;
pub(crate) const PACKET_TYPE_PUBACK: u8 = 4;
pub(crate) const PACKET_TYPE_PUBREC: u8 = 5;
pub(crate) const PACKET_TYPE_PUBREL: u8 = 6;
pub(crate) const PACKET_TYPE_PUBCOMP: u8 = 7;
pub(crate) const PACKET_TYPE_SUBSCRIBE: u8 = 8;
pub(crate) const PACKET_TYPE_SUBACK: u8 = 9;
pub(crate) const PACKET_TYPE_UNSUBSCRIBE: u8 = 10;
pub(crate) const PACKET_TYPE_UNSUBACK: u8 = 11;
pub(crate) const PACKET_TYPE_PINGREQ: u8 = 12;
pub(crate) const PACKET_TYPE_PINGRESP: u8 = 13;
pub(crate) const PACKET_TYPE_DISCONNECT: u8 = 14;
pub(crate) const PACKET_TYPE_RESERVED_15: u8 = 15;

pub(crate) const PUBLISH_PACKET_FIXED_HEADER_DUPLICATE_FLAG : u8 = 8;
pub(crate) const PUBLISH_PACKET_FIXED_HEADER_RETAIN_FLAG : u8 = 1;
pub(crate) const QOS_MASK : u8 = 3;

pub(crate) const CONNECT_PACKET_CLEAN_SESSION_FLAG_MASK : u8 = 1 << 1;
pub(crate) const CONNECT_PACKET_HAS_WILL_FLAG_MASK : u8 = 1 << 2;
pub(crate) const CONNECT_PACKET_WILL_QOS_FLAG_SHIFT : u8 = 3;
pub(crate) const CONNECT_PACKET_WILL_RETAIN_FLAG_MASK : u8 = 1 << 5;
pub(crate) const CONNECT_PACKET_HAS_PASSWORD_FLAG_MASK : u8 = 1 << 6;
pub(crate) const CONNECT_PACKET_HAS_USERNAME_FLAG_MASK : u8 = 1 << 7;

pub(crate) const CONNECT_FIRST_BYTE : u8 = PACKET_TYPE_CONNECT << 4;
pub(crate) const CONNACK_FIRST_BYTE : u8 = PACKET_TYPE_CONNACK << 4;
pub(crate) const PUBACK_FIRST_BYTE : u8 = PACKET_TYPE_PUBACK << 4;
pub(crate) const PUBREC_FIRST_BYTE : u8 = PACKET_TYPE_PUBREC << 4;
pub(crate) const PUBREL_FIRST_BYTE : u8 = (PACKET_TYPE_PUBREL << 4) | 0x02u8;
pub(crate) const PUBCOMP_FIRST_BYTE : u8 = PACKET_TYPE_PUBCOMP << 4;
pub(crate) const SUBSCRIBE_FIRST_BYTE : u8 = (PACKET_TYPE_SUBSCRIBE << 4) | 0x02u8;
pub(crate) const SUBACK_FIRST_BYTE : u8 = PACKET_TYPE_SUBACK << 4;
pub(crate) const UNSUBSCRIBE_FIRST_BYTE : u8 = (PACKET_TYPE_UNSUBSCRIBE << 4) | 0x02u8;
pub(crate) const UNSUBACK_FIRST_BYTE : u8 = PACKET_TYPE_UNSUBACK << 4;
pub(crate) const PINGREQ_FIRST_BYTE : u8 = PACKET_TYPE_PINGREQ << 4;
pub(crate) const PINGRESP_FIRST_BYTE : u8 = PACKET_TYPE_PINGRESP << 4;
pub(crate) const DISCONNECT_FIRST_BYTE : u8 = PACKET_TYPE_DISCONNECT << 4;

/// SUBACK return code value that marks a per-filter subscription failure
pub(crate) const SUBACK_RETURN_CODE_FAILURE : u8 = 0x80;

/// Converts a u8 to a QoS enum value.  The raw bit-field value 3 is not a legal wire value for a
/// QoS field, even inside a PUBLISH fixed header.
pub fn convert_u8_to_quality_of_service(value: u8) -> MqttResult<QualityOfService> {
    match value {
        0 => { Ok(QualityOfService::AtMostOnce) }
        1 => { Ok(QualityOfService::AtLeastOnce) }
        2 => { Ok(QualityOfService::ExactlyOnce) }
        _ => {
            error!("Packet Decode - invalid quality of service value ({})", value);
            Err(MqttError::new_decoding_failure("invalid quality of service value"))
        }
    }
}

/// Converts a u8 to a CONNACK return code enum value.  Return codes greater than 5 are not
/// defined by the protocol.
pub fn convert_u8_to_connect_return_code(value: u8) -> MqttResult<ConnectReturnCode> {
    match value {
        0 => { Ok(ConnectReturnCode::Accepted) }
        1 => { Ok(ConnectReturnCode::UnacceptableProtocolVersion) }
        2 => { Ok(ConnectReturnCode::IdentifierRejected) }
        3 => { Ok(ConnectReturnCode::ServerUnavailable) }
        4 => { Ok(ConnectReturnCode::BadUsernameOrPassword) }
        5 => { Ok(ConnectReturnCode::NotAuthorized) }
        _ => {
            error!("Packet Decode - invalid connect return code ({})", value);
            Err(MqttError::new_decoding_failure("invalid connect return code"))
        }
    }
}

pub(crate) fn quality_of_service_to_str(qos: QualityOfService) -> &'static str {
    match qos {
        QualityOfService::AtMostOnce => { "AtMostOnce" }
        QualityOfService::AtLeastOnce => { "AtLeastOnce" }
        QualityOfService::ExactlyOnce => { "ExactlyOnce" }
        QualityOfService::Invalid => { "Invalid" }
    }
}

pub(crate) fn connect_return_code_to_str(code: ConnectReturnCode) -> &'static str {
    match code {
        ConnectReturnCode::Accepted => { "connection accepted" }
        ConnectReturnCode::UnacceptableProtocolVersion => { "connection refused, unacceptable protocol version" }
        ConnectReturnCode::IdentifierRejected => { "connection refused, identifier rejected" }
        ConnectReturnCode::ServerUnavailable => { "connection refused, server unavailable" }
        ConnectReturnCode::BadUsernameOrPassword => { "connection refused, bad user name or password" }
        ConnectReturnCode::NotAuthorized => { "connection refused, not authorized" }
    }
}

pub(crate) fn packet_type_to_str(packet_type: u8) -> &'static str {
    match packet_type {
        PACKET_TYPE_CONNECT => { "Connect" }
        PACKET_TYPE_CONNACK => { "Connack" }
        PACKET_TYPE_PUBLISH => { "Publish" }
        PACKET_TYPE_PUBACK => { "Puback" }
        PACKET_TYPE_PUBREC => { "Pubrec" }
        PACKET_TYPE_PUBREL => { "Pubrel" }
        PACKET_TYPE_PUBCOMP => { "Pubcomp" }
        PACKET_TYPE_SUBSCRIBE => { "Subscribe" }
        PACKET_TYPE_SUBACK => { "Suback" }
        PACKET_TYPE_UNSUBSCRIBE => { "Unsubscribe" }
        PACKET_TYPE_UNSUBACK => { "Unsuback" }
        PACKET_TYPE_PINGREQ => { "Pingreq" }
        PACKET_TYPE_PINGRESP => { "Pingresp" }
        PACKET_TYPE_DISCONNECT => { "Disconnect" }
        _ => {
            "Unknown"
        }
    }
}

pub(crate) fn mqtt_packet_to_str(packet: &MqttPacket) -> &'static str {
    match packet {
        MqttPacket::Connect(_) => { "CONNECT" }
        MqttPacket::Connack(_) => { "CONNACK" }
        MqttPacket::Publish(_) => { "PUBLISH" }
        MqttPacket::Puback(_) => { "PUBACK" }
        MqttPacket::Pubrec(_) => { "PUBREC" }
        MqttPacket::Pubrel(_) => { "PUBREL" }
        MqttPacket::Pubcomp(_) => { "PUBCOMP" }
        MqttPacket::Subscribe(_) => { "SUBSCRIBE" }
        MqttPacket::Suback(_) => { "SUBACK" }
        MqttPacket::Unsubscribe(_) => { "UNSUBSCRIBE" }
        MqttPacket::Unsuback(_) => { "UNSUBACK" }
        MqttPacket::Pingreq(_) => { "PINGREQ" }
        MqttPacket::Pingresp(_) => { "PINGRESP" }
        MqttPacket::Disconnect(_) => { "DISCONNECT" }
    }
}
