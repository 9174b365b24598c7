/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Caller-side validation of topic names, topic filters, and client identifiers.  Invalid values are
rejected before anything is transmitted.
 */

use log::*;

use crate::error::{MqttError, MqttResult};
use crate::mqtt::PacketType;

pub(crate) const MAXIMUM_STRING_LENGTH : usize = 65535;

pub(crate) const MAXIMUM_CLIENT_ID_LENGTH : usize = 23;

/// Checks validity of a topic name for publishing: non-empty, encodable with a u16 length prefix,
/// and free of wildcard characters.
pub(crate) fn is_valid_topic_name(topic: &str) -> bool {
    if topic.is_empty() || topic.len() > MAXIMUM_STRING_LENGTH {
        return false;
    }

    if topic.contains(['#', '+']) {
        return false;
    }

    true
}

/// Checks validity of a topic filter for subscribe/unsubscribe requests.  Splitting on `/`, each
/// segment must be `+`, `#` (only as the last segment), or a literal containing neither wildcard
/// character.
pub(crate) fn is_valid_topic_filter(filter: &str) -> bool {
    if filter.is_empty() || filter.len() > MAXIMUM_STRING_LENGTH {
        return false;
    }

    let segments : Vec<&str> = filter.split('/').collect();
    for (index, segment) in segments.iter().enumerate() {
        if *segment == "+" {
            continue;
        }

        if *segment == "#" {
            if index != segments.len() - 1 {
                return false;
            }

            continue;
        }

        if segment.contains(['#', '+']) {
            return false;
        }
    }

    true
}

pub(crate) fn validate_optional_string_length(optional_string: &Option<String>, packet_type: PacketType, field_name: &str) -> MqttResult<()> {
    if let Some(value) = optional_string {
        if value.len() > MAXIMUM_STRING_LENGTH {
            error!("Packet Validation - {} string field too long", field_name);
            return Err(MqttError::new_packet_validation(packet_type, "string field too long"));
        }
    }

    Ok(())
}

pub(crate) fn validate_optional_binary_length(optional_data: &Option<Vec<u8>>, packet_type: PacketType, field_name: &str) -> MqttResult<()> {
    if let Some(value) = optional_data {
        if value.len() > MAXIMUM_STRING_LENGTH {
            error!("Packet Validation - {} binary field too long", field_name);
            return Err(MqttError::new_packet_validation(packet_type, "binary field too long"));
        }
    }

    Ok(())
}

pub(crate) fn validate_client_id(client_id: &str, packet_type: PacketType) -> MqttResult<()> {
    if client_id.is_empty() {
        error!("Packet Validation - client id is empty");
        return Err(MqttError::new_packet_validation(packet_type, "client id is empty"));
    }

    if client_id.chars().count() > MAXIMUM_CLIENT_ID_LENGTH {
        error!("Packet Validation - client id is {} or more characters", MAXIMUM_CLIENT_ID_LENGTH + 1);
        return Err(MqttError::new_packet_validation(packet_type, "client id too long"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_name_validity() {
        assert!(is_valid_topic_name("a"));
        assert!(is_valid_topic_name("a/b/c"));
        assert!(is_valid_topic_name("/"));
        assert!(is_valid_topic_name("rooms/kitchen/temperature"));

        assert!(!is_valid_topic_name(""));
        assert!(!is_valid_topic_name("rooms/+/temperature"));
        assert!(!is_valid_topic_name("rooms/#"));
        assert!(!is_valid_topic_name("bad+segment"));
    }

    #[test]
    fn topic_filter_validity() {
        assert!(is_valid_topic_filter("/"));
        assert!(is_valid_topic_filter("+"));
        assert!(is_valid_topic_filter("#"));
        assert!(is_valid_topic_filter("resources/+/weight"));
        assert!(is_valid_topic_filter("resources/#"));
        assert!(is_valid_topic_filter("+/+/#"));
        assert!(is_valid_topic_filter("plain/literal"));

        assert!(!is_valid_topic_filter(""));
        assert!(!is_valid_topic_filter("resources/#/weight"));
        assert!(!is_valid_topic_filter("resources/we#ght"));
        assert!(!is_valid_topic_filter("resources/we+ght"));
        assert!(!is_valid_topic_filter("#/resources"));
    }

    #[test]
    fn topic_filter_length_bound() {
        let filter = "a".repeat(MAXIMUM_STRING_LENGTH);
        assert!(is_valid_topic_filter(&filter));

        let too_long = "a".repeat(MAXIMUM_STRING_LENGTH + 1);
        assert!(!is_valid_topic_filter(&too_long));
    }

    #[test]
    fn client_id_validity() {
        assert!(validate_client_id("c", PacketType::Connect).is_ok());
        assert!(validate_client_id("abcdefghijklmnopqrstuvw", PacketType::Connect).is_ok()); // 23 characters

        assert!(validate_client_id("", PacketType::Connect).is_err());
        assert!(validate_client_id("abcdefghijklmnopqrstuvwx", PacketType::Connect).is_err()); // 24 characters
    }
}
