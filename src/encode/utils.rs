/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

///
/// Internal utilities to encode MQTT 3.1.1 packets, based on the MQTT 3.1.1 spec
use std::collections::VecDeque;

use crate::error::{MqttError, MqttResult};
use crate::mqtt::*;

pub(crate) enum EncodingStep {
    Uint8(u8),
    Uint16(u16),
    Vli(u32),
    StringSlice(fn(&MqttPacket) -> &str, usize),
    BytesSlice(fn(&MqttPacket) -> &[u8], usize),
    IndexedString(fn(&MqttPacket, usize) -> &str, usize, usize),
}

macro_rules! get_packet_field {
    ($target: expr, $pat: path, $field_name: ident) => {
        if let $pat(a) = $target {
            &a.$field_name
        } else {
            panic!("Packet variant mismatch");
        }
    };
}

pub(crate) use get_packet_field;

macro_rules! get_optional_packet_field {
    ($target: expr, $pat: path, $field_name: ident) => {
        if let $pat(a) = $target {
            &a.$field_name.as_ref().unwrap()
        } else {
            panic!("Packet variant mismatch");
        }
    };
}

pub(crate) use get_optional_packet_field;

macro_rules! encode_integral_expression {
    ($target: ident, $enum_variant: ident, $value: expr) => {
        $target.push_back(EncodingStep::$enum_variant($value));
    };
}

pub(crate) use encode_integral_expression;

macro_rules! encode_length_prefixed_string {
    ($target: ident, $getter: ident, $value: expr) => {
        $target.push_back(EncodingStep::Uint16($value.len() as u16));
        $target.push_back(EncodingStep::StringSlice(
            $getter as fn(&MqttPacket) -> &str,
            0,
        ));
    };
}

pub(crate) use encode_length_prefixed_string;

macro_rules! encode_length_prefixed_optional_string {
    ($target: ident, $getter: ident, $optional_value: expr) => {
        if let Some(val) = &$optional_value {
            $target.push_back(EncodingStep::Uint16(val.len() as u16));
            $target.push_back(EncodingStep::StringSlice(
                $getter as fn(&MqttPacket) -> &str,
                0,
            ));
        } else {
            $target.push_back(EncodingStep::Uint16(0));
        }
    };
}

pub(crate) use encode_length_prefixed_optional_string;

macro_rules! encode_length_prefixed_bytes {
    ($target: ident, $getter: ident, $value: expr) => {
        $target.push_back(EncodingStep::Uint16($value.len() as u16));
        $target.push_back(EncodingStep::BytesSlice(
            $getter as fn(&MqttPacket) -> &[u8],
            0,
        ));
    };
}

pub(crate) use encode_length_prefixed_bytes;

macro_rules! encode_length_prefixed_optional_bytes {
    ($target: ident, $getter: ident, $optional_value: expr) => {
        if let Some(val) = &$optional_value {
            $target.push_back(EncodingStep::Uint16(val.len() as u16));
            $target.push_back(EncodingStep::BytesSlice(
                $getter as fn(&MqttPacket) -> &[u8],
                0,
            ));
        } else {
            $target.push_back(EncodingStep::Uint16(0));
        }
    };
}

pub(crate) use encode_length_prefixed_optional_bytes;

macro_rules! encode_raw_bytes {
    ($target: ident, $getter: ident) => {
        $target.push_back(EncodingStep::BytesSlice(
            $getter as fn(&MqttPacket) -> &[u8],
            0,
        ));
    };
}

pub(crate) use encode_raw_bytes;

macro_rules! encode_indexed_string {
    ($target: ident, $indexed_string_getter: ident, $value: expr, $index: expr) => {{
        $target.push_back(EncodingStep::Uint16($value.len() as u16));
        $target.push_back(EncodingStep::IndexedString(
            $indexed_string_getter as fn(&MqttPacket, usize) -> &str,
            $index,
            0,
        ));
    }};
}

pub(crate) use encode_indexed_string;

macro_rules! encode_enum {
    ($target: ident, $enum_variant: ident, $int_type: ty, $value: expr) => {
        $target.push_back(EncodingStep::$enum_variant($value as $int_type));
    };
}

pub(crate) use encode_enum;

/*****************************************************/

// PUBACK, PUBREC, PUBREL, PUBCOMP and UNSUBACK all share the same shape: a fixed header followed
// by a 2-byte packet id and nothing else.

macro_rules! define_ack_packet_encoding_impl {
    ($function_name: ident, $packet_type: ident, $first_byte: expr) => {
        pub(crate) fn $function_name(packet: &$packet_type, steps: &mut VecDeque<EncodingStep>) -> MqttResult<()> {
            encode_integral_expression!(steps, Uint8, $first_byte);
            encode_integral_expression!(steps, Vli, 2);
            encode_integral_expression!(steps, Uint16, packet.packet_id);

            Ok(())
        }
    };
}

pub(crate) use define_ack_packet_encoding_impl;

/*****************************************************/

/// Largest value encodable as an MQTT variable length integer; also the protocol's maximum
/// remaining length for a single control packet.
pub static MAXIMUM_VARIABLE_LENGTH_INTEGER: usize = (1 << 28) - 1;

pub(crate) fn compute_variable_length_integer_encode_size(value: usize) -> MqttResult<usize> {
    if value < 1usize << 7 {
        Ok(1)
    } else if value < 1usize << 14 {
        Ok(2)
    } else if value < 1usize << 21 {
        Ok(3)
    } else if value < 1usize << 28 {
        Ok(4)
    } else {
        Err(MqttError::new_encoding_failure("vli value exceeds the protocol maximum (2 ^ 28 - 1)"))
    }
}

fn encode_vli(value: u32, dest: &mut Vec<u8>) -> MqttResult<()> {
    if value > MAXIMUM_VARIABLE_LENGTH_INTEGER as u32 {
        return Err(MqttError::new_encoding_failure("vli value exceeds the protocol maximum (2 ^ 28 - 1)"));
    }

    let mut done = false;
    let mut val = value;
    while !done {
        let mut byte: u8 = (val & 0x7F) as u8;
        val /= 128;

        if val != 0 {
            byte |= 128;
        }

        dest.push(byte);

        done = val == 0;
    }

    Ok(())
}

fn process_byte_slice_encoding(bytes: &[u8], offset: usize, dest: &mut Vec<u8>) -> usize {
    let dest_space_in_bytes = dest.capacity() - dest.len();
    let remaining_slice_bytes = bytes.len() - offset;
    let encodable_length = usize::min(dest_space_in_bytes, remaining_slice_bytes);
    let end_offset = offset + encodable_length;
    let encodable_slice = bytes.get(offset..end_offset).unwrap();
    dest.extend_from_slice(encodable_slice);

    if encodable_length < remaining_slice_bytes {
        end_offset
    } else {
        0
    }
}

pub(crate) fn process_encoding_step(
    steps: &mut VecDeque<EncodingStep>,
    step: EncodingStep,
    packet: &MqttPacket,
    dest: &mut Vec<u8>,
) -> MqttResult<()> {
    match step {
        EncodingStep::Uint8(val) => {
            dest.push(val);
        }
        EncodingStep::Uint16(val) => {
            dest.extend_from_slice(&val.to_be_bytes());
        }
        EncodingStep::Vli(val) => {
            return encode_vli(val, dest);
        }
        EncodingStep::StringSlice(getter, offset) => {
            let slice = getter(packet).as_bytes();
            let end_offset = process_byte_slice_encoding(slice, offset, dest);
            if end_offset > 0 {
                steps.push_front(EncodingStep::StringSlice(getter, end_offset));
            }
        }
        EncodingStep::BytesSlice(getter, offset) => {
            let slice = getter(packet);
            let end_offset = process_byte_slice_encoding(slice, offset, dest);
            if end_offset > 0 {
                steps.push_front(EncodingStep::BytesSlice(getter, end_offset));
            }
        }
        EncodingStep::IndexedString(getter, index, offset) => {
            let slice = getter(packet, index).as_bytes();
            let end_offset = process_byte_slice_encoding(slice, offset, dest);
            if end_offset > 0 {
                steps.push_front(EncodingStep::IndexedString(getter, index, end_offset));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::utils::*;

    macro_rules! assert_vli_encoding_equals {
        ($target: ident, $value: expr, $expected_result: expr) => {{
            let mut $target = Vec::<u8>::with_capacity(4);
            assert!(encode_vli($value, &mut $target).is_ok());
            assert_eq!($expected_result, &$target[..]);
        }};
    }

    macro_rules! assert_vli_encoding_fails {
        ($target: ident, $value: expr) => {{
            let mut $target = Vec::<u8>::with_capacity(4);
            assert!(encode_vli($value, &mut $target).is_err());
        }};
    }

    macro_rules! assert_vli_round_trip_success {
        ($value: expr) => {{
            let mut dest = Vec::<u8>::with_capacity(4);
            assert!(encode_vli($value, &mut dest).is_ok());

            for i in 1..dest.len() {
                let insufficient_data_result = decode_vli(&dest[..i]);
                assert!(insufficient_data_result.is_ok());
                assert_eq!(
                    DecodeVliResult::InsufficientData,
                    insufficient_data_result.unwrap()
                );
            }

            let final_result = decode_vli(&dest);
            let expected_bytes =
                compute_variable_length_integer_encode_size($value as usize).unwrap();
            assert!(final_result.is_ok());
            assert_eq!(
                DecodeVliResult::Value($value, &dest[expected_bytes..]),
                final_result.unwrap()
            );
        }};
    }

    #[test]
    fn vli_round_trips() {
        assert_vli_round_trip_success!(0);
        assert_vli_round_trip_success!(1);
        assert_vli_round_trip_success!(47);
        assert_vli_round_trip_success!(127);
        assert_vli_round_trip_success!(128);
        assert_vli_round_trip_success!(129);
        assert_vli_round_trip_success!(511);
        assert_vli_round_trip_success!(8000);
        assert_vli_round_trip_success!(16383);
        assert_vli_round_trip_success!(16384);
        assert_vli_round_trip_success!(16385);
        assert_vli_round_trip_success!(100000);
        assert_vli_round_trip_success!(4200000);
        assert_vli_round_trip_success!(34200000);
        assert_vli_round_trip_success!(MAXIMUM_VARIABLE_LENGTH_INTEGER as u32);
    }

    #[test]
    fn encode_vli_successes() {
        assert_vli_encoding_equals!(dest, 0, [0u8]);
        assert_vli_encoding_equals!(dest, 1, [1u8]);
        assert_vli_encoding_equals!(dest, 127, [127u8]);
        assert_vli_encoding_equals!(dest, 128, [0x80u8, 1u8]);
        assert_vli_encoding_equals!(dest, 129, [0x81u8, 1u8]);
    }

    #[test]
    fn encode_vli_failures() {
        assert_vli_encoding_fails!(dest, MAXIMUM_VARIABLE_LENGTH_INTEGER as u32 + 1);
        assert_vli_encoding_fails!(dest, 0x80000000u32);
        assert_vli_encoding_fails!(dest, 0xFFFFFFFFu32);
    }

    #[test]
    #[rustfmt::skip]
    fn compute_vli_encoding_size_successes() {
        assert_eq!(1, compute_variable_length_integer_encode_size(0).unwrap());
        assert_eq!(1, compute_variable_length_integer_encode_size(1).unwrap());
        assert_eq!(1, compute_variable_length_integer_encode_size(127).unwrap());
        assert_eq!(2, compute_variable_length_integer_encode_size(128).unwrap());
        assert_eq!(2, compute_variable_length_integer_encode_size(256).unwrap());
        assert_eq!(2, compute_variable_length_integer_encode_size(16383).unwrap());
        assert_eq!(3, compute_variable_length_integer_encode_size(16384).unwrap());
        assert_eq!(3, compute_variable_length_integer_encode_size(16385).unwrap());
        assert_eq!(3, compute_variable_length_integer_encode_size(2097151).unwrap());
        assert_eq!(4, compute_variable_length_integer_encode_size(2097152).unwrap());
        assert_eq!(4, compute_variable_length_integer_encode_size(MAXIMUM_VARIABLE_LENGTH_INTEGER).unwrap());
    }

    #[test]
    #[rustfmt::skip]
    fn compute_vli_encoding_size_failures() {
        assert!(compute_variable_length_integer_encode_size(MAXIMUM_VARIABLE_LENGTH_INTEGER + 1).is_err());
        assert!(compute_variable_length_integer_encode_size(u32::MAX as usize).is_err());
        assert!(compute_variable_length_integer_encode_size(usize::MAX).is_err());
    }
}
