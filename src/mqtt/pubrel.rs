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

/// Data model of an [MQTT 3.1.1 PUBREL](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718053) packet.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PubrelPacket {

    /// Id of the QoS 2 delivery this packet is releasing
    pub packet_id: u16,
}

define_ack_packet_encoding_impl!(write_pubrel_encoding_steps, PubrelPacket, PUBREL_FIRST_BYTE);

// Unlike the other 2-byte acks, a PUBREL with wrong fixed header flags is a well-formed frame
// whose flags violate the protocol, not a malformed encoding.
pub(crate) fn decode_pubrel_packet(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != PUBREL_FIRST_BYTE {
        error!("Pubrel Packet Decode - invalid fixed header flags");
        return Err(MqttError::new_protocol_violation("invalid fixed header flags for pubrel packet"));
    }

    if packet_body.len() != 2 {
        error!("Pubrel Packet Decode - invalid remaining length");
        return Err(MqttError::new_decoding_failure("invalid remaining length for pubrel packet"));
    }

    let mut packet = PubrelPacket { ..Default::default() };
    decode_u16(packet_body, &mut packet.packet_id)?;

    Ok(MqttPacket::Pubrel(packet))
}

define_ack_packet_display_trait!(PubrelPacket, "PubrelPacket");
