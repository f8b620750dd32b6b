//! The few things the relay itself says, as opposed to the game messages it
//! forwards without looking.

use serde::{Deserialize, Serialize};

use crate::constants::{ROOM_CODE_LEN, ROOM_CODE_SPACE};
use crate::error::ProtoError;

/// WebSocket path for creating and joining rooms.
pub const ROOM_PATH: &str = "/room";
/// Plain HTTP existence check: `GET /check/<code>`.
pub const CHECK_PATH_PREFIX: &str = "/check/";
/// Query parameter carrying the room code when joining.
pub const CODE_PARAM: &str = "code";

/// First and only server-originated text frame, sent to the creator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomAssigned {
    pub room_code: String,
}

impl RoomAssigned {
    pub fn to_json(&self) -> Result<String, ProtoError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtoError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Body of the `/check/<code>` response.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomCheck {
    pub exist: bool,
}

/// Render a numeric code as the zero-padded string handed to clients.
pub fn format_room_code(n: u16) -> String {
    format!("{:0width$}", n % ROOM_CODE_SPACE, width = ROOM_CODE_LEN)
}

pub fn is_room_code(s: &str) -> bool {
    s.len() == ROOM_CODE_LEN && s.bytes().all(|b| b.is_ascii_digit())
}

/// Extract the `code` parameter from a request query string.
///
/// Returns `None` when the parameter is absent. An empty value counts as
/// present so that `?code=` is treated as a join for a room that cannot exist.
pub fn code_from_query(query: Option<&str>) -> Option<&str> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(key, _)| *key == CODE_PARAM)
        .map(|(_, value)| value)
}

/// `ws://host:port/room`, used to create a room.
pub fn create_url(base: &str) -> String {
    format!("{}{ROOM_PATH}", base.trim_end_matches('/'))
}

/// `ws://host:port/room?code=NNNN`, used to join one.
pub fn join_url(base: &str, code: &str) -> String {
    format!("{}?{CODE_PARAM}={code}", create_url(base))
}
