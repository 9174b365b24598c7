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

/// Data model of an [MQTT 3.1.1 CONNACK](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718033) packet.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ConnackPacket {

    /// True if the server resumed an existing session for this client id.
    pub session_present: bool,

    /// Result of the connection attempt.
    pub return_code: ConnectReturnCode,
}

#[rustfmt::skip]
pub(crate) fn write_connack_encoding_steps(packet: &ConnackPacket, steps: &mut VecDeque<EncodingStep>) -> MqttResult<()> {
    encode_integral_expression!(steps, Uint8, CONNACK_FIRST_BYTE);
    encode_integral_expression!(steps, Vli, 2);
    encode_integral_expression!(steps, Uint8, if packet.session_present { 1u8 } else { 0u8 });
    encode_enum!(steps, Uint8, u8, packet.return_code);

    Ok(())
}

pub(crate) fn decode_connack_packet(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != CONNACK_FIRST_BYTE {
        error!("ConnackPacket Decode - invalid first byte");
        return Err(MqttError::new_decoding_failure("invalid first byte for connack packet"));
    }

    if packet_body.len() != 2 {
        error!("ConnackPacket Decode - invalid remaining length");
        return Err(MqttError::new_decoding_failure("invalid remaining length for connack packet"));
    }

    let mut packet = ConnackPacket { ..Default::default() };

    let acknowledge_flags = packet_body[0];
    if (acknowledge_flags & 0xFE) != 0 {
        error!("ConnackPacket Decode - upper seven bits of the acknowledge flags are not zero");
        return Err(MqttError::new_decoding_failure("upper seven bits of the connack acknowledge flags are not zero"));
    }

    packet.session_present = (acknowledge_flags & 0x01) != 0;

    decode_u8_as_enum(&packet_body[1..], &mut packet.return_code, convert_u8_to_connect_return_code)?;

    Ok(MqttPacket::Connack(packet))
}

impl fmt::Display for ConnackPacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ConnackPacket {{")?;
        log_primitive_value!(self.session_present, f, "session_present");
        log_enum!(self.return_code, f, "return_code", connect_return_code_to_str);
        write!(f, " }}")
    }
}
