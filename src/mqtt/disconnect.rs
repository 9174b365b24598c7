/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use log::*;

use std::collections::VecDeque;
use std::fmt;

use crate::encode::utils::*;
use crate::error::{MqttError, MqttResult};
use crate::mqtt::*;
use crate::mqtt::utils::*;

/// Data model of an [MQTT 3.1.1 DISCONNECT](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718090) packet.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DisconnectPacket {}

#[rustfmt::skip]
pub(crate) fn write_disconnect_encoding_steps(_: &DisconnectPacket, steps: &mut VecDeque<EncodingStep>) -> MqttResult<()> {
    encode_integral_expression!(steps, Uint8, DISCONNECT_FIRST_BYTE);
    encode_integral_expression!(steps, Vli, 0);

    Ok(())
}

pub(crate) fn decode_disconnect_packet(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != DISCONNECT_FIRST_BYTE {
        error!("DisconnectPacket Decode - invalid first byte");
        return Err(MqttError::new_decoding_failure("invalid first byte for disconnect packet"));
    }

    if !packet_body.is_empty() {
        error!("DisconnectPacket Decode - non-zero remaining length");
        return Err(MqttError::new_decoding_failure("invalid remaining length for disconnect packet"));
    }

    Ok(MqttPacket::Disconnect(DisconnectPacket {}))
}

impl fmt::Display for DisconnectPacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DisconnectPacket {{ }}")
    }
}
