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

/// Data model of an [MQTT 3.1.1 UNSUBSCRIBE](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718072) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UnsubscribePacket {

    /// Packet identifier that correlates this unsubscribe with its UNSUBACK.
    pub packet_id: u16,

    /// List of topic filters the client wishes to unsubscribe from.  This client sends one entry
    /// per unsubscribe request.
    pub topic_filters: Vec<String>,
}

fn get_unsubscribe_packet_topic_filter(packet: &MqttPacket, index: usize) -> &str {
    if let MqttPacket::Unsubscribe(unsubscribe) = packet {
        return unsubscribe.topic_filters[index].as_str();
    }

    panic!("Packet variant mismatch");
}

fn compute_unsubscribe_packet_length(packet: &UnsubscribePacket) -> MqttResult<u32> {
    let mut total_remaining_length : usize = 2;

    for topic_filter in &packet.topic_filters {
        total_remaining_length += 2 + topic_filter.len();
    }

    compute_variable_length_integer_encode_size(total_remaining_length)?;

    Ok(total_remaining_length as u32)
}

#[rustfmt::skip]
pub(crate) fn write_unsubscribe_encoding_steps(packet: &UnsubscribePacket, steps: &mut VecDeque<EncodingStep>) -> MqttResult<()> {
    let total_remaining_length = compute_unsubscribe_packet_length(packet)?;

    encode_integral_expression!(steps, Uint8, UNSUBSCRIBE_FIRST_BYTE);
    encode_integral_expression!(steps, Vli, total_remaining_length);

    encode_integral_expression!(steps, Uint16, packet.packet_id);

    let topic_filters = &packet.topic_filters;
    for (i, topic_filter) in topic_filters.iter().enumerate() {
        encode_indexed_string!(steps, get_unsubscribe_packet_topic_filter, topic_filter, i);
    }

    Ok(())
}

pub(crate) fn decode_unsubscribe_packet(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != UNSUBSCRIBE_FIRST_BYTE {
        error!("UnsubscribePacket Decode - invalid first byte");
        return Err(MqttError::new_decoding_failure("invalid first byte for unsubscribe packet"));
    }

    let mut packet = UnsubscribePacket { ..Default::default() };

    let mut mutable_body = packet_body;
    mutable_body = decode_u16(mutable_body, &mut packet.packet_id)?;

    while !mutable_body.is_empty() {
        let mut topic_filter = String::new();
        mutable_body = decode_length_prefixed_string(mutable_body, &mut topic_filter)?;

        packet.topic_filters.push(topic_filter);
    }

    if packet.topic_filters.is_empty() {
        error!("UnsubscribePacket Decode - no topic filters in payload");
        return Err(MqttError::new_decoding_failure("unsubscribe packet must contain at least one topic filter"));
    }

    Ok(MqttPacket::Unsubscribe(packet))
}

pub(crate) fn validate_unsubscribe_packet_outbound(packet: &UnsubscribePacket) -> MqttResult<()> {
    if packet.topic_filters.is_empty() {
        error!("UnsubscribePacket Validation - no topic filters");
        return Err(MqttError::new_packet_validation(PacketType::Unsubscribe, "unsubscribe packet must contain at least one topic filter"));
    }

    for topic_filter in &packet.topic_filters {
        if !is_valid_topic_filter(topic_filter) {
            error!("UnsubscribePacket Validation - invalid topic filter \"{}\"", topic_filter);
            return Err(MqttError::new_packet_validation(PacketType::Unsubscribe, "invalid topic filter"));
        }
    }

    Ok(())
}

impl fmt::Display for UnsubscribePacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UnsubscribePacket {{")?;
        log_primitive_value!(self.packet_id, f, "packet_id");
        write!(f, " topic_filters: [")?;
        for (i, topic_filter) in self.topic_filters.iter().enumerate() {
            write!(f, " {}: \"{}\"", i, topic_filter)?;
        }
        write!(f, " ]")?;
        write!(f, " }}")
    }
}
