/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use log::*;

use crate::error::{MqttError, MqttResult};

#[derive(Eq, PartialEq, Debug)]
pub(crate) enum DecodeVliResult<'a> {
    InsufficientData,
    Value(u32, &'a[u8]), /* (decoded value, remaining bytes) */
}

pub(crate) fn decode_vli(buffer: &[u8]) -> MqttResult<DecodeVliResult> {
    let mut value: u32 = 0;
    let mut needs_data: bool;
    let mut shift: u32 = 0;
    let data_len = buffer.len();

    for i in 0..4 {
        if i >= data_len {
            return Ok(DecodeVliResult::InsufficientData);
        }

        let byte = buffer[i];
        value |= ((byte & 0x7F) as u32) << shift;
        shift += 7;

        needs_data = (byte & 0x80) != 0;
        if !needs_data {
            return Ok(DecodeVliResult::Value(value, &buffer[(i + 1)..]));
        }
    }

    error!("Packet Decode - invalid variable length integer");
    Err(MqttError::new_decoding_failure("invalid variable length integer"))
}

pub(crate) fn decode_vli_into_mutable<'a>(buffer: &'a[u8], value: &mut usize) -> MqttResult<&'a[u8]> {
    let decode_result = decode_vli(buffer)?;
    match decode_result {
        DecodeVliResult::InsufficientData => {
            error!("Packet Decode - truncated variable length integer");
            Err(MqttError::new_decoding_failure("truncated variable length integer"))
        }
        DecodeVliResult::Value(vli, remaining_slice) => {
            *value = vli as usize;
            Ok(remaining_slice)
        }
    }
}

fn map_utf8_err_to_parse_failure(error: std::str::Utf8Error) -> MqttError {
    error!("Packet Decode - invalid utf-8 in string field");
    MqttError::new_parse_failure(error)
}

pub(crate) fn decode_length_prefixed_string<'a>(bytes: &'a[u8], value: &mut String) -> MqttResult<&'a[u8]> {
    if bytes.len() < 2 {
        error!("Packet Decode - Utf-8 string value does not have a full length prefix");
        return Err(MqttError::new_decoding_failure("utf-8 string value does not have a full length prefix"));
    }

    let value_length : usize = u16::from_be_bytes(bytes[..2].try_into().unwrap()) as usize;
    let mutable_bytes = &bytes[2..];
    if value_length > mutable_bytes.len() {
        error!("Packet Decode - Utf-8 string value has length larger than remaining packet bytes");
        return Err(MqttError::new_decoding_failure("utf-8 string value has length larger than remaining packet bytes"));
    }

    let decode_utf8_result = std::str::from_utf8(&mutable_bytes[..value_length]).map_err(map_utf8_err_to_parse_failure)?;
    *value = decode_utf8_result.to_string();
    Ok(&mutable_bytes[(value_length)..])
}

pub(crate) fn decode_length_prefixed_optional_bytes<'a>(bytes: &'a[u8], value: &mut Option<Vec<u8>>) -> MqttResult<&'a[u8]> {
    if bytes.len() < 2 {
        error!("Packet Decode - Binary data value does not have a full length prefix");
        return Err(MqttError::new_decoding_failure("binary data value does not have a full length prefix"));
    }

    let value_length : usize = u16::from_be_bytes(bytes[..2].try_into().unwrap()) as usize;
    let mutable_bytes = &bytes[2..];
    if value_length > mutable_bytes.len() {
        error!("Packet Decode - Binary data value has length larger than remaining packet bytes");
        return Err(MqttError::new_decoding_failure("binary data value has length larger than remaining packet bytes"));
    }

    *value = Some(Vec::from(&mutable_bytes[..value_length]));
    Ok(&mutable_bytes[(value_length)..])
}

pub(crate) fn decode_u8<'a>(bytes: &'a[u8], value: &mut u8) -> MqttResult<&'a[u8]> {
    if bytes.is_empty() {
        error!("Packet Decode - Insufficient packet bytes for u8 field");
        return Err(MqttError::new_decoding_failure("insufficient packet bytes for u8 field"));
    }

    *value = bytes[0];

    Ok(&bytes[1..])
}

pub(crate) fn decode_u8_as_enum<'a, T>(bytes: &'a[u8], value: &mut T, converter: fn(u8) -> MqttResult<T>) -> MqttResult<&'a[u8]> {
    if bytes.is_empty() {
        error!("Packet Decode - Insufficient packet bytes for enum field");
        return Err(MqttError::new_decoding_failure("insufficient packet bytes for enum field"));
    }

    *value = converter(bytes[0])?;

    Ok(&bytes[1..])
}

pub(crate) fn decode_u16<'a>(bytes: &'a[u8], value: &mut u16) -> MqttResult<&'a[u8]> {
    if bytes.len() < 2 {
        error!("Packet Decode - Insufficient packet bytes for u16 field");
        return Err(MqttError::new_decoding_failure("insufficient packet bytes for u16 field"));
    }

    *value = u16::from_be_bytes(bytes[..2].try_into().unwrap());

    Ok(&bytes[2..])
}

// PUBACK, PUBREC, PUBCOMP and UNSUBACK all decode identically: a flagless fixed header followed
// by exactly a 2-byte packet id.
macro_rules! define_ack_packet_decode_function {
    ($function_name: ident, $mqtt_packet_type: ident, $packet_type: ident, $packet_type_as_string: expr, $first_byte: expr) => {
        pub(crate) fn $function_name(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
            if first_byte != $first_byte {
                error!("{} Packet Decode - invalid first byte", $packet_type_as_string);
                return Err(MqttError::new_decoding_failure("invalid first byte for ack packet"));
            }

            if packet_body.len() != 2 {
                error!("{} Packet Decode - invalid remaining length", $packet_type_as_string);
                return Err(MqttError::new_decoding_failure("invalid remaining length for ack packet"));
            }

            let mut packet = $packet_type { ..Default::default() };
            decode_u16(packet_body, &mut packet.packet_id)?;

            Ok(MqttPacket::$mqtt_packet_type(packet))
        }
    };
}

pub(crate) use define_ack_packet_decode_function;
