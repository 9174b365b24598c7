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

/// Data model of an [MQTT 3.1.1 PINGREQ](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718081) packet.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PingreqPacket {}

#[rustfmt::skip]
pub(crate) fn write_pingreq_encoding_steps(_: &PingreqPacket, steps: &mut VecDeque<EncodingStep>) -> MqttResult<()> {
    encode_integral_expression!(steps, Uint8, PINGREQ_FIRST_BYTE);
    encode_integral_expression!(steps, Vli, 0);

    Ok(())
}

pub(crate) fn decode_pingreq_packet(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != PINGREQ_FIRST_BYTE {
        error!("PingreqPacket Decode - invalid first byte");
        return Err(MqttError::new_decoding_failure("invalid first byte for pingreq packet"));
    }

    if !packet_body.is_empty() {
        error!("PingreqPacket Decode - non-zero remaining length");
        return Err(MqttError::new_decoding_failure("invalid remaining length for pingreq packet"));
    }

    Ok(MqttPacket::Pingreq(PingreqPacket {}))
}

impl fmt::Display for PingreqPacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PingreqPacket {{ }}")
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::decode::testing::*;

    #[test]
    fn pingreq_round_trip_encode_decode() {
        let packet = PingreqPacket {};

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Pingreq(packet)));
    }

    #[test]
    fn pingreq_encoding_is_bit_exact() {
        let frame = encode_packet_for_test(&MqttPacket::Pingreq(PingreqPacket {}));
        assert_eq!(vec!(0xC0u8, 0x00u8), frame);
    }

    #[test]
    fn pingreq_decode_failure_nonzero_remaining_length() {
        let packet = PingreqPacket {};

        let stretch_packet = | bytes: &[u8] | -> Vec<u8> {
            let mut clone = bytes.to_vec();
            clone[1] = 1;
            clone.push(0);
            clone
        };

        do_mutated_decode_failure_test(&MqttPacket::Pingreq(packet), stretch_packet);
    }
}
