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

/// Data model of an [MQTT 3.1.1 PUBREC](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718048) packet.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PubrecPacket {

    /// Id of the QoS 2 publish this packet is acknowledging receipt of
    pub packet_id: u16,
}

define_ack_packet_encoding_impl!(write_pubrec_encoding_steps, PubrecPacket, PUBREC_FIRST_BYTE);
define_ack_packet_decode_function!(decode_pubrec_packet, Pubrec, PubrecPacket, "Pubrec", PUBREC_FIRST_BYTE);
define_ack_packet_display_trait!(PubrecPacket, "PubrecPacket");
