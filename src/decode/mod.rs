/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

pub(crate) mod utils;

use log::*;

use crate::decode::utils::*;
use crate::error::{MqttError, MqttResult};
use crate::logging::*;
use crate::mqtt::*;
use crate::mqtt::connack::*;
use crate::mqtt::connect::*;
use crate::mqtt::disconnect::*;
use crate::mqtt::pingreq::*;
use crate::mqtt::pingresp::*;
use crate::mqtt::puback::*;
use crate::mqtt::pubcomp::*;
use crate::mqtt::publish::*;
use crate::mqtt::pubrec::*;
use crate::mqtt::pubrel::*;
use crate::mqtt::suback::*;
use crate::mqtt::subscribe::*;
use crate::mqtt::unsuback::*;
use crate::mqtt::unsubscribe::*;
use crate::mqtt::utils::*;

fn decode_packet(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    let packet_type = first_byte >> 4;

    info!("Decoding a packet of type {}", packet_type_to_str(packet_type));

    match packet_type {
        PACKET_TYPE_CONNECT => { decode_connect_packet(first_byte, packet_body) }
        PACKET_TYPE_CONNACK => { decode_connack_packet(first_byte, packet_body) }
        PACKET_TYPE_PUBLISH => { decode_publish_packet(first_byte, packet_body) }
        PACKET_TYPE_PUBACK => { decode_puback_packet(first_byte, packet_body) }
        PACKET_TYPE_PUBREC => { decode_pubrec_packet(first_byte, packet_body) }
        PACKET_TYPE_PUBREL => { decode_pubrel_packet(first_byte, packet_body) }
        PACKET_TYPE_PUBCOMP => { decode_pubcomp_packet(first_byte, packet_body) }
        PACKET_TYPE_SUBSCRIBE => { decode_subscribe_packet(first_byte, packet_body) }
        PACKET_TYPE_SUBACK => { decode_suback_packet(first_byte, packet_body) }
        PACKET_TYPE_UNSUBSCRIBE => { decode_unsubscribe_packet(first_byte, packet_body) }
        PACKET_TYPE_UNSUBACK => { decode_unsuback_packet(first_byte, packet_body) }
        PACKET_TYPE_PINGREQ => { decode_pingreq_packet(first_byte, packet_body) }
        PACKET_TYPE_PINGRESP => { decode_pingresp_packet(first_byte, packet_body) }
        PACKET_TYPE_DISCONNECT => { decode_disconnect_packet(first_byte, packet_body) }
        _ => {
            error!("Packet Decode - reserved packet type ({})", packet_type);
            Err(MqttError::new_decoding_failure("reserved packet type"))
        }
    }
}

/// Parses one websocket binary message into a typed control packet.
///
/// A frame carries exactly one MQTT control packet.  Trailing bytes beyond the advertised
/// remaining length are tolerated on everything but PUBLISH, which verifies its payload length
/// exactly.
pub(crate) fn decode_frame(frame: &[u8]) -> MqttResult<MqttPacket> {
    if frame.is_empty() {
        error!("Packet Decode - frame is empty");
        return Err(MqttError::new_decoding_failure("frame is empty"));
    }

    let first_byte = frame[0];
    let packet_type = first_byte >> 4;
    if packet_type == PACKET_TYPE_RESERVED_0 || packet_type == PACKET_TYPE_RESERVED_15 {
        error!("Packet Decode - reserved packet type ({})", packet_type);
        return Err(MqttError::new_decoding_failure("reserved packet type"));
    }

    // the qos bit field is invalid for every packet type when it holds the reserved value 3,
    // not just for publishes
    let qos_bits = (first_byte & (QOS_MASK << 1)) >> 1;
    if qos_bits > 2 {
        error!("Packet Decode - invalid qos bits in fixed header ({})", qos_bits);
        return Err(MqttError::new_decoding_failure("invalid qos bits in fixed header"));
    }

    let mut remaining_length : usize = 0;
    let body_bytes = decode_vli_into_mutable(&frame[1..], &mut remaining_length)?;

    if body_bytes.len() < remaining_length {
        error!("Packet Decode - frame shorter than advertised remaining length");
        return Err(MqttError::new_decoding_failure("frame shorter than advertised remaining length"));
    }

    let packet = decode_packet(first_byte, &body_bytes[..remaining_length])?;
    log_packet("Successfully decoded incoming packet: ", &packet);

    Ok(packet)
}
