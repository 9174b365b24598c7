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

/// Data model of an [MQTT 3.1.1 SUBACK](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718068) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubackPacket {

    /// Id of the subscribe this packet is acknowledging
    pub packet_id: u16,

    /// Per-filter results for the associated SUBSCRIBE packet, in request order.  A granted QoS
    /// per successful entry; `QualityOfService::Invalid` marks a failed entry (wire value 0x80).
    pub granted_qos: Vec<QualityOfService>,
}

fn compute_suback_packet_length(packet: &SubackPacket) -> MqttResult<u32> {
    let total_remaining_length : usize = 2 + packet.granted_qos.len();
    compute_variable_length_integer_encode_size(total_remaining_length)?;

    Ok(total_remaining_length as u32)
}

#[rustfmt::skip]
pub(crate) fn write_suback_encoding_steps(packet: &SubackPacket, steps: &mut VecDeque<EncodingStep>) -> MqttResult<()> {
    let total_remaining_length = compute_suback_packet_length(packet)?;

    encode_integral_expression!(steps, Uint8, SUBACK_FIRST_BYTE);
    encode_integral_expression!(steps, Vli, total_remaining_length);

    encode_integral_expression!(steps, Uint16, packet.packet_id);

    for granted in &packet.granted_qos {
        if *granted == QualityOfService::Invalid {
            encode_integral_expression!(steps, Uint8, SUBACK_RETURN_CODE_FAILURE);
        } else {
            encode_enum!(steps, Uint8, u8, *granted);
        }
    }

    Ok(())
}

pub(crate) fn decode_suback_packet(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != SUBACK_FIRST_BYTE {
        error!("SubackPacket Decode - invalid first byte");
        return Err(MqttError::new_decoding_failure("invalid first byte for suback packet"));
    }

    if packet_body.len() < 2 {
        error!("SubackPacket Decode - invalid remaining length");
        return Err(MqttError::new_decoding_failure("invalid remaining length for suback packet"));
    }

    let mut packet = SubackPacket { ..Default::default() };

    let payload_bytes = decode_u16(packet_body, &mut packet.packet_id)?;

    packet.granted_qos.reserve(payload_bytes.len());
    for return_code in payload_bytes {
        if *return_code == SUBACK_RETURN_CODE_FAILURE {
            packet.granted_qos.push(QualityOfService::Invalid);
        } else {
            packet.granted_qos.push(convert_u8_to_quality_of_service(*return_code)?);
        }
    }

    Ok(MqttPacket::Suback(packet))
}

impl fmt::Display for SubackPacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SubackPacket {{")?;
        log_primitive_value!(self.packet_id, f, "packet_id");
        write!(f, " granted_qos: [")?;
        for (i, granted) in self.granted_qos.iter().enumerate() {
            write!(f, " {}: {}", i, quality_of_service_to_str(*granted))?;
        }
        write!(f, " ]")?;
        write!(f, " }}")
    }
}
