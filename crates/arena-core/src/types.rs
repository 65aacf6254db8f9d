//! Shared types used across Arena crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A synthetic room derived from one pool member.
///
/// Pool and slot indices are 1-based, matching the room names the load
/// generators join.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Room {
    pub pool: u32,
    pub slot: u32,
    pub member: String,
    name: String,
}

impl Room {
    /// Build a room, rendering its name through `template`.
    pub fn new(template: &str, pool: u32, slot: u32, member: &str) -> Self {
        let name = template
            .replace("{pool}", &pool.to_string())
            .replace("{slot}", &slot.to_string())
            .replace("{member}", member);
        Self {
            pool,
            slot,
            member: member.to_string(),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Expand pool members into rooms, `fan_out` per member, member-major.
///
/// Member `i`, slot `j` lands at index `i * fan_out + j`.
pub fn derive_rooms(template: &str, pool: u32, members: &[String], fan_out: u32) -> Vec<Room> {
    members
        .iter()
        .flat_map(|member| (1..=fan_out).map(move |slot| Room::new(template, pool, slot, member)))
        .collect()
}

/// Two rooms and their resolved hosts, ready to battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattlePair {
    pub room_a: String,
    pub room_b: String,
    pub host_a: String,
    pub host_b: String,
}

impl BattlePair {
    /// Composite key identifying the battle: `{room_a}_{room_b}`.
    pub fn entity_id(&self) -> String {
        format!("{}_{}", self.room_a, self.room_b)
    }
}

/// One completed livestream, as published by the backfill job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivestreamRecord {
    pub livestream_id: String,
    pub start_time: i64,
    pub end_time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "d{pool}-{slot}-{member}";

    #[test]
    fn room_name_encodes_pool_slot_member() {
        let room = Room::new(TEMPLATE, 1, 2, "pod-abc");
        assert_eq!(room.name(), "d1-2-pod-abc");
        assert_eq!(room.to_string(), "d1-2-pod-abc");
        assert_eq!(room.member, "pod-abc");
    }

    #[test]
    fn two_members_fan_out_two_yield_four_distinct_rooms() {
        let members = vec!["m1".to_string(), "m2".to_string()];
        let rooms = derive_rooms(TEMPLATE, 1, &members, 2);

        let names: Vec<&str> = rooms.iter().map(Room::name).collect();
        assert_eq!(names, ["d1-1-m1", "d1-2-m1", "d1-1-m2", "d1-2-m2"]);

        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), 4);
        for room in &rooms {
            assert!(room.name().contains(&room.member));
            assert!(room.name().contains(&format!("-{}-", room.slot)));
        }
    }

    #[test]
    fn no_members_no_rooms() {
        assert!(derive_rooms(TEMPLATE, 2, &[], 3).is_empty());
    }

    #[test]
    fn entity_id_joins_rooms_with_underscore() {
        let pair = BattlePair {
            room_a: "d1-1-podA".to_string(),
            room_b: "d2-1-podB".to_string(),
            host_a: "a_pub_0".to_string(),
            host_b: "b_pub_0".to_string(),
        };
        assert_eq!(pair.entity_id(), "d1-1-podA_d2-1-podB");
    }

    #[test]
    fn livestream_record_uses_camel_case() {
        let record = LivestreamRecord {
            livestream_id: "ls-1".to_string(),
            start_time: 10,
            end_time: 20,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"livestreamId": "ls-1", "startTime": 10, "endTime": 20})
        );
    }
}
