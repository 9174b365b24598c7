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

/// Specifies a single topic filter entry within a Subscribe operation
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Subscription {

    /// Topic filter to subscribe to
    pub topic_filter: String,

    /// Maximum QoS on which the subscriber will accept publish messages.  Granted QoS may be
    /// lower.
    pub qos: QualityOfService,
}

impl Subscription {

    /// Creates a new Subscription for the given filter and requested QoS
    pub fn new(topic_filter: &str, qos: QualityOfService) -> Self {
        Subscription {
            topic_filter: topic_filter.to_string(),
            qos,
        }
    }
}

/// Data model of an [MQTT 3.1.1 SUBSCRIBE](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718063) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubscribePacket {

    /// Packet identifier that correlates this subscribe with its SUBACK.
    pub packet_id: u16,

    /// List of topic filter subscriptions the client wishes to establish.  This client sends one
    /// entry per subscribe request.
    pub subscriptions: Vec<Subscription>,
}

fn get_subscribe_packet_topic_filter(packet: &MqttPacket, index: usize) -> &str {
    if let MqttPacket::Subscribe(subscribe) = packet {
        return subscribe.subscriptions[index].topic_filter.as_str();
    }

    panic!("Packet variant mismatch");
}

fn compute_subscribe_packet_length(packet: &SubscribePacket) -> MqttResult<u32> {
    let mut total_remaining_length : usize = 2;

    for subscription in &packet.subscriptions {
        total_remaining_length += 2 + subscription.topic_filter.len() + 1;
    }

    compute_variable_length_integer_encode_size(total_remaining_length)?;

    Ok(total_remaining_length as u32)
}

#[rustfmt::skip]
pub(crate) fn write_subscribe_encoding_steps(packet: &SubscribePacket, steps: &mut VecDeque<EncodingStep>) -> MqttResult<()> {
    let total_remaining_length = compute_subscribe_packet_length(packet)?;

    encode_integral_expression!(steps, Uint8, SUBSCRIBE_FIRST_BYTE);
    encode_integral_expression!(steps, Vli, total_remaining_length);

    encode_integral_expression!(steps, Uint16, packet.packet_id);

    let subscriptions = &packet.subscriptions;
    for (i, subscription) in subscriptions.iter().enumerate() {
        encode_indexed_string!(steps, get_subscribe_packet_topic_filter, subscription.topic_filter, i);
        encode_enum!(steps, Uint8, u8, subscription.qos);
    }

    Ok(())
}

pub(crate) fn decode_subscribe_packet(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != SUBSCRIBE_FIRST_BYTE {
        error!("SubscribePacket Decode - invalid first byte");
        return Err(MqttError::new_decoding_failure("invalid first byte for subscribe packet"));
    }

    let mut packet = SubscribePacket { ..Default::default() };

    let mut mutable_body = packet_body;
    mutable_body = decode_u16(mutable_body, &mut packet.packet_id)?;

    while !mutable_body.is_empty() {
        let mut subscription = Subscription { ..Default::default() };
        mutable_body = decode_length_prefixed_string(mutable_body, &mut subscription.topic_filter)?;
        mutable_body = decode_u8_as_enum(mutable_body, &mut subscription.qos, convert_u8_to_quality_of_service)?;

        packet.subscriptions.push(subscription);
    }

    if packet.subscriptions.is_empty() {
        error!("SubscribePacket Decode - no topic filters in payload");
        return Err(MqttError::new_decoding_failure("subscribe packet must contain at least one topic filter"));
    }

    Ok(MqttPacket::Subscribe(packet))
}

pub(crate) fn validate_subscribe_packet_outbound(packet: &SubscribePacket) -> MqttResult<()> {
    if packet.subscriptions.is_empty() {
        error!("SubscribePacket Validation - no topic filters");
        return Err(MqttError::new_packet_validation(PacketType::Subscribe, "subscribe packet must contain at least one topic filter"));
    }

    for subscription in &packet.subscriptions {
        if !is_valid_topic_filter(&subscription.topic_filter) {
            error!("SubscribePacket Validation - invalid topic filter \"{}\"", subscription.topic_filter);
            return Err(MqttError::new_packet_validation(PacketType::Subscribe, "invalid topic filter"));
        }

        if subscription.qos == QualityOfService::Invalid {
            error!("SubscribePacket Validation - requested qos is not a legal wire value");
            return Err(MqttError::new_packet_validation(PacketType::Subscribe, "requested qos is not a legal wire value"));
        }
    }

    Ok(())
}

impl fmt::Display for SubscribePacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SubscribePacket {{")?;
        log_primitive_value!(self.packet_id, f, "packet_id");
        write!(f, " subscriptions: [")?;
        for (i, subscription) in self.subscriptions.iter().enumerate() {
            write!(f, " {}: (\"{}\", {})", i, subscription.topic_filter, quality_of_service_to_str(subscription.qos))?;
        }
        write!(f, " ]")?;
        write!(f, " }}")
    }
}
