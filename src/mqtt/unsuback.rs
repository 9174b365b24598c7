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

/// Data model of an [MQTT 3.1.1 UNSUBACK](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718077) packet.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UnsubackPacket {

    /// Id of the unsubscribe this packet is acknowledging
    pub packet_id: u16,
}

define_ack_packet_encoding_impl!(write_unsuback_encoding_steps, UnsubackPacket, UNSUBACK_FIRST_BYTE);
define_ack_packet_decode_function!(decode_unsuback_packet, Unsuback, UnsubackPacket, "Unsuback", UNSUBACK_FIRST_BYTE);
define_ack_packet_display_trait!(UnsubackPacket, "UnsubackPacket");
