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

/// Data model of an [MQTT 3.1.1 PINGRESP](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718086) packet.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PingrespPacket {}

#[rustfmt::skip]
pub(crate) fn write_pingresp_encoding_steps(_: &PingrespPacket, steps: &mut VecDeque<EncodingStep>) -> MqttResult<()> {
    encode_integral_expression!(steps, Uint8, PINGRESP_FIRST_BYTE);
    encode_integral_expression!(steps, Vli, 0);

    Ok(())
}

pub(crate) fn decode_pingresp_packet(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != PINGRESP_FIRST_BYTE {
        error!("PingrespPacket Decode - invalid first byte");
        return Err(MqttError::new_decoding_failure("invalid first byte for pingresp packet"));
    }

    if !packet_body.is_empty() {
        error!("PingrespPacket Decode - non-zero remaining length");
        return Err(MqttError::new_decoding_failure("invalid remaining length for pingresp packet"));
    }

    Ok(MqttPacket::Pingresp(PingrespPacket {}))
}

impl fmt::Display for PingrespPacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PingrespPacket {{ }}")
    }
}
