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

/// Data model of an [MQTT 3.1.1 PUBLISH](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718037) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PublishPacket {

    /// Packet identifier that correlates this publish with its acknowledgement.  Only present on
    /// the wire when qos is greater than AtMostOnce.
    pub packet_id: u16,

    /// True if this packet is a redelivery.  Always false on first transmission.
    pub duplicate: bool,

    /// True if the server should store this message on its topic for delivery to future
    /// subscribers.
    pub retain: bool,

    /// Delivery quality of service for the message.
    pub qos: QualityOfService,

    /// Topic the message is published to.  Non-empty and wildcard-free.
    pub topic: String,

    /// Application message bytes.  May be empty.
    pub payload: Vec<u8>,
}

impl PublishPacket {

    /// Creates a new PublishPacket for the given topic, qos, and payload
    pub fn new(topic: &str, qos: QualityOfService, payload: &[u8]) -> Self {
        PublishPacket {
            topic: topic.to_string(),
            qos,
            payload: payload.to_vec(),
            ..Default::default()
        }
    }
}

fn get_publish_packet_topic(packet: &MqttPacket) -> &str {
    get_packet_field!(packet, MqttPacket::Publish, topic)
}

fn get_publish_packet_payload(packet: &MqttPacket) -> &[u8] {
    get_packet_field!(packet, MqttPacket::Publish, payload)
}

fn compute_publish_fixed_header_first_byte(packet: &PublishPacket) -> u8 {
    let mut first_byte: u8 = PACKET_TYPE_PUBLISH << 4;

    if packet.duplicate {
        first_byte |= PUBLISH_PACKET_FIXED_HEADER_DUPLICATE_FLAG;
    }

    first_byte |= (packet.qos as u8) << 1;

    if packet.retain {
        first_byte |= PUBLISH_PACKET_FIXED_HEADER_RETAIN_FLAG;
    }

    first_byte
}

fn compute_publish_packet_length(packet: &PublishPacket) -> MqttResult<u32> {
    let mut total_remaining_length : usize = 2 + packet.topic.len();

    if packet.qos != QualityOfService::AtMostOnce {
        total_remaining_length += 2;
    }

    total_remaining_length += packet.payload.len();
    compute_variable_length_integer_encode_size(total_remaining_length)?;

    Ok(total_remaining_length as u32)
}

#[rustfmt::skip]
pub(crate) fn write_publish_encoding_steps(packet: &PublishPacket, steps: &mut VecDeque<EncodingStep>) -> MqttResult<()> {
    let total_remaining_length = compute_publish_packet_length(packet)?;

    encode_integral_expression!(steps, Uint8, compute_publish_fixed_header_first_byte(packet));
    encode_integral_expression!(steps, Vli, total_remaining_length);

    encode_length_prefixed_string!(steps, get_publish_packet_topic, packet.topic);

    if packet.qos != QualityOfService::AtMostOnce {
        encode_integral_expression!(steps, Uint16, packet.packet_id);
    }

    if !packet.payload.is_empty() {
        encode_raw_bytes!(steps, get_publish_packet_payload);
    }

    Ok(())
}

pub(crate) fn decode_publish_packet(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    let mut packet = PublishPacket { ..Default::default() };

    packet.duplicate = (first_byte & PUBLISH_PACKET_FIXED_HEADER_DUPLICATE_FLAG) != 0;
    packet.retain = (first_byte & PUBLISH_PACKET_FIXED_HEADER_RETAIN_FLAG) != 0;
    packet.qos = convert_u8_to_quality_of_service((first_byte >> 1) & QOS_MASK)?;

    let mut mutable_body = packet_body;
    mutable_body = decode_length_prefixed_string(mutable_body, &mut packet.topic)?;

    if packet.qos != QualityOfService::AtMostOnce {
        if mutable_body.len() < 2 {
            error!("PublishPacket Decode - insufficient bytes for packet id");
            return Err(MqttError::new_decoding_failure("insufficient bytes for publish packet id"));
        }

        mutable_body = decode_u16(mutable_body, &mut packet.packet_id)?;
    }

    // everything left after the variable header is the application message
    packet.payload = mutable_body.to_vec();

    Ok(MqttPacket::Publish(packet))
}

pub(crate) fn validate_publish_packet_outbound(packet: &PublishPacket) -> MqttResult<()> {
    if !is_valid_topic_name(&packet.topic) {
        error!("PublishPacket Validation - invalid topic name");
        return Err(MqttError::new_packet_validation(PacketType::Publish, "invalid topic name"));
    }

    // qos 2 publishing is not supported by this client
    if packet.qos != QualityOfService::AtMostOnce && packet.qos != QualityOfService::AtLeastOnce {
        error!("PublishPacket Validation - unsupported qos for outbound publish");
        return Err(MqttError::new_packet_validation(PacketType::Publish, "unsupported qos for outbound publish"));
    }

    Ok(())
}

impl fmt::Display for PublishPacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PublishPacket {{")?;
        log_primitive_value!(self.packet_id, f, "packet_id");
        log_primitive_value!(self.duplicate, f, "duplicate");
        log_primitive_value!(self.retain, f, "retain");
        log_enum!(self.qos, f, "qos", quality_of_service_to_str);
        log_string!(self.topic, f, "topic");
        log_binary_data!(self.payload, f, "payload");
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::decode::testing::*;

    #[test]
    fn publish_round_trip_encode_decode_default() {
        let packet = PublishPacket {
            topic: "t".to_string(),
            ..Default::default()
        };

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Publish(packet)));
    }

    #[test]
    fn publish_round_trip_encode_decode_qos0() {
        let packet = PublishPacket::new("telemetry/weight", QualityOfService::AtMostOnce, "125kg".as_bytes());

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Publish(packet)));
    }

    #[test]
    fn publish_round_trip_encode_decode_qos1() {
        let mut packet = PublishPacket::new("commands/door", QualityOfService::AtLeastOnce, "open".as_bytes());
        packet.packet_id = 47;

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Publish(packet)));
    }

    #[test]
    fn publish_round_trip_encode_decode_qos2() {
        // the client never originates a qos 2 publish, but it must decode server redeliveries
        let mut packet = PublishPacket::new("alarms/flood", QualityOfService::ExactlyOnce, "basement".as_bytes());
        packet.packet_id = 258;
        packet.duplicate = true;
        packet.retain = true;

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Publish(packet)));
    }

    #[test]
    fn publish_round_trip_encode_decode_empty_payload() {
        let mut packet = PublishPacket::new("retained/clear", QualityOfService::AtLeastOnce, &[]);
        packet.packet_id = 11;
        packet.retain = true;

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Publish(packet)));
    }

    #[test]
    fn publish_qos0_encoding_is_bit_exact() {
        let packet = PublishPacket::new("a/b", QualityOfService::AtMostOnce, "hi".as_bytes());

        let frame = encode_packet_for_test(&MqttPacket::Publish(packet));

        let expected : Vec<u8> = vec!(
            0x30, 0x07,
            0x00, 0x03, b'a', b'/', b'b',
            b'h', b'i',
        );

        assert_eq!(expected, frame);
    }

    #[test]
    fn publish_qos1_inbound_literal_bytes() {
        let frame : Vec<u8> = vec!(
            0x32, 0x06,
            0x00, 0x01, b't',
            0x00, 0x07,
            b'x',
        );

        let packet = crate::decode::decode_frame(frame.as_slice()).unwrap();

        let mut expected = PublishPacket::new("t", QualityOfService::AtLeastOnce, "x".as_bytes());
        expected.packet_id = 7;

        assert_eq!(MqttPacket::Publish(expected), packet);
    }

    #[test]
    fn publish_decode_failure_invalid_qos_bits() {
        let packet = PublishPacket::new("a/b", QualityOfService::AtMostOnce, "hi".as_bytes());

        let set_qos_bits_to_three = | bytes: &[u8] | -> Vec<u8> {
            let mut clone = bytes.to_vec();
            clone[0] |= QOS_MASK << 1;
            clone
        };

        do_mutated_decode_failure_test(&MqttPacket::Publish(packet), set_qos_bits_to_three);
    }

    #[test]
    fn publish_decode_failure_missing_packet_id() {
        // qos 1 publish whose body ends right after the topic name
        let frame : Vec<u8> = vec!(
            0x32, 0x03,
            0x00, 0x01, b't',
        );

        assert!(crate::decode::decode_frame(frame.as_slice()).is_err());
    }

    #[test]
    fn publish_decode_failure_truncated_topic() {
        let packet = PublishPacket::new("sensors/a", QualityOfService::AtMostOnce, &[]);

        let truncate_topic = | bytes: &[u8] | -> Vec<u8> {
            let mut clone = bytes.to_vec();
            // shrink the frame but leave the topic length prefix intact
            clone.truncate(6);
            clone[1] = 4;
            clone
        };

        do_mutated_decode_failure_test(&MqttPacket::Publish(packet), truncate_topic);
    }

    #[test]
    fn publish_validate_success() {
        let packet = PublishPacket::new("rooms/kitchen/temperature", QualityOfService::AtLeastOnce, "21.5".as_bytes());

        assert!(validate_publish_packet_outbound(&packet).is_ok());
    }

    #[test]
    fn publish_validate_failure_empty_topic() {
        let packet = PublishPacket::new("", QualityOfService::AtMostOnce, &[]);

        assert!(validate_publish_packet_outbound(&packet).is_err());
    }

    #[test]
    fn publish_validate_failure_wildcard_topic() {
        let packet = PublishPacket::new("rooms/+/temperature", QualityOfService::AtMostOnce, &[]);

        assert!(validate_publish_packet_outbound(&packet).is_err());
    }

    #[test]
    fn publish_validate_failure_qos2_outbound() {
        let packet = PublishPacket::new("rooms/kitchen/temperature", QualityOfService::ExactlyOnce, &[]);

        assert!(validate_publish_packet_outbound(&packet).is_err());
    }
}
