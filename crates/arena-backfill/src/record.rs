//! Input line parsing.
//!
//! Fields are separated by two spaces and trimmed:
//! `<livestream id>  <start time>  <end time>`.

use arena_core::LivestreamRecord;

use crate::error::RecordError;

const FIELD_SEPARATOR: &str = "  ";

pub fn parse_record(line: &str) -> Result<LivestreamRecord, RecordError> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    let [id, start, end] = fields.as_slice() else {
        return Err(RecordError::FieldCount {
            found: fields.len(),
        });
    };

    Ok(LivestreamRecord {
        livestream_id: id.to_string(),
        start_time: parse_timestamp("startTime", start)?,
        end_time: parse_timestamp("endTime", end)?,
    })
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<i64, RecordError> {
    value.parse().map_err(|source| RecordError::Timestamp {
        field,
        value: value.to_string(),
        source,
    })
}
