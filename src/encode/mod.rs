/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

pub(crate) mod utils;

use std::collections::VecDeque;

use crate::encode::utils::*;
use crate::error::MqttResult;
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

const FRAME_ENCODE_CHUNK_SIZE : usize = 4 * 1024;

fn write_encoding_steps(mqtt_packet: &MqttPacket, steps: &mut VecDeque<EncodingStep>) -> MqttResult<()> {
    log_packet("Writing encode steps for packet: ", mqtt_packet);

    match mqtt_packet {
        MqttPacket::Connect(packet) => { write_connect_encoding_steps(packet, steps) }
        MqttPacket::Connack(packet) => { write_connack_encoding_steps(packet, steps) }
        MqttPacket::Publish(packet) => { write_publish_encoding_steps(packet, steps) }
        MqttPacket::Puback(packet) => { write_puback_encoding_steps(packet, steps) }
        MqttPacket::Pubrec(packet) => { write_pubrec_encoding_steps(packet, steps) }
        MqttPacket::Pubrel(packet) => { write_pubrel_encoding_steps(packet, steps) }
        MqttPacket::Pubcomp(packet) => { write_pubcomp_encoding_steps(packet, steps) }
        MqttPacket::Subscribe(packet) => { write_subscribe_encoding_steps(packet, steps) }
        MqttPacket::Suback(packet) => { write_suback_encoding_steps(packet, steps) }
        MqttPacket::Unsubscribe(packet) => { write_unsubscribe_encoding_steps(packet, steps) }
        MqttPacket::Unsuback(packet) => { write_unsuback_encoding_steps(packet, steps) }
        MqttPacket::Pingreq(packet) => { write_pingreq_encoding_steps(packet, steps) }
        MqttPacket::Pingresp(packet) => { write_pingresp_encoding_steps(packet, steps) }
        MqttPacket::Disconnect(packet) => { write_disconnect_encoding_steps(packet, steps) }
    }
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum EncodeResult {
    Complete,
    Full,
}

pub(crate) struct Encoder {
    steps: VecDeque<EncodingStep>,
}

impl Encoder {
    pub fn new() -> Encoder {
        Encoder {
            steps: VecDeque::new(),
        }
    }

    pub fn reset(&mut self, packet: &MqttPacket) -> MqttResult<()> {
        self.steps.clear();

        write_encoding_steps(packet, &mut self.steps)
    }

    pub fn encode(
        &mut self,
        packet: &MqttPacket,
        dest: &mut Vec<u8>,
    ) -> MqttResult<EncodeResult> {
        let capacity = dest.capacity();
        if capacity < 4 {
            panic!("Encoder - target buffer too small");
        }

        while !self.steps.is_empty() && dest.len() + 4 <= dest.capacity() {
            let step = self.steps.pop_front().unwrap();
            process_encoding_step(&mut self.steps, step, packet, dest)?;
        }

        if capacity != dest.capacity() {
            panic!("Internal error: encoding logic resized dest buffer");
        }

        if self.steps.is_empty() {
            Ok(EncodeResult::Complete)
        } else {
            Ok(EncodeResult::Full)
        }
    }
}

/// Serializes a packet into the single byte string that becomes one websocket binary message.
pub(crate) fn encode_packet_to_frame(packet: &MqttPacket) -> MqttResult<Vec<u8>> {
    let mut encoder = Encoder::new();
    encoder.reset(packet)?;

    let mut frame = Vec::new();
    let mut chunk : Vec<u8> = Vec::with_capacity(FRAME_ENCODE_CHUNK_SIZE);

    loop {
        chunk.clear();
        let encode_result = encoder.encode(packet, &mut chunk)?;
        frame.extend_from_slice(chunk.as_slice());

        if encode_result == EncodeResult::Complete {
            return Ok(frame);
        }
    }
}
