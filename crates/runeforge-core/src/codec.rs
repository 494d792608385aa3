// Inbound event decoding.
//
// Every message on the event source is one JSON object discriminated by a
// `type` field. Known kinds are decoded into `Event` variants, copying the
// service's field names into ours; unknown kinds become `Event::Noop` so a
// newer service never crashes an older client.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::model::{ChampionRecord, Item, Rune, UserInfo};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// The discriminants understood by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    UserInfo,
    ChampionChange,
    QuitChampSelect,
}

impl EventKind {
    /// Map a numeric `type` to a kind. Codes match the service's constants.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(EventKind::UserInfo),
            1 => Some(EventKind::ChampionChange),
            2 => Some(EventKind::QuitChampSelect),
            _ => None,
        }
    }

    /// Map a string `type` to a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "USER_INFO" => Some(EventKind::UserInfo),
            "CHAMPION_CHANGE" => Some(EventKind::ChampionChange),
            "QUIT_CHAMP_SELECT" => Some(EventKind::QuitChampSelect),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::UserInfo => "USER_INFO",
            EventKind::ChampionChange => "CHAMPION_CHANGE",
            EventKind::QuitChampSelect => "QUIT_CHAMP_SELECT",
        }
    }
}

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    UserInfo(UserInfo),
    ChampionChange(Box<ChampionRecord>),
    QuitChampSelect,
    /// A well-formed message of a kind this client does not know.
    Noop,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("message is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("message is not a JSON object")]
    NotAnObject,

    #[error("message has no `type` field")]
    MissingKind,

    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("USER_INFO has an empty username")]
    EmptyUsername,
}

// ---------------------------------------------------------------------------
// Wire formats
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserInfoWire {
    username: String,
    #[serde(default, deserialize_with = "string_or_number")]
    icon_id: String,
}

/// CHAMPION_CHANGE as sent by the service. Older services used
/// `championId`/`championName`; either spelling, or both, is accepted and
/// the current one wins.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChampionChangeWire {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    champion_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    champion_name: Option<String>,
    #[serde(default)]
    role: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    runes_by_popularity: Vec<Rune>,
    #[serde(default, deserialize_with = "null_as_empty")]
    runes_by_win_rate: Vec<Rune>,
    #[serde(default, deserialize_with = "null_as_empty")]
    items_by_popularity: Vec<Item>,
    #[serde(default, deserialize_with = "null_as_empty")]
    items_by_win_rate: Vec<Item>,
    #[serde(default, deserialize_with = "null_as_empty")]
    starting_items_by_popularity: Vec<Item>,
    #[serde(default, deserialize_with = "null_as_empty")]
    starting_items_by_win_rate: Vec<Item>,
}

impl TryFrom<ChampionChangeWire> for ChampionRecord {
    type Error = serde_json::Error;

    fn try_from(wire: ChampionChangeWire) -> Result<Self, Self::Error> {
        let id = wire
            .id
            .or(wire.champion_id)
            .ok_or_else(|| serde_json::Error::missing_field("id"))?;
        let name = wire
            .name
            .or(wire.champion_name)
            .ok_or_else(|| serde_json::Error::missing_field("name"))?;
        Ok(ChampionRecord {
            id,
            name,
            role: wire.role,
            runes_by_popularity: wire.runes_by_popularity,
            runes_by_win_rate: wire.runes_by_win_rate,
            items_by_popularity: wire.items_by_popularity,
            items_by_win_rate: wire.items_by_win_rate,
            starting_items_by_popularity: wire.starting_items_by_popularity,
            starting_items_by_win_rate: wire.starting_items_by_win_rate,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    }))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

/// The service serializes empty collections as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode one raw inbound message.
pub fn decode(raw: &str) -> Result<Event, DecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(DecodeError::Malformed)?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }

    let Some(kind) = read_kind(&value)? else {
        return Ok(Event::Noop);
    };

    match kind {
        EventKind::UserInfo => {
            let wire: UserInfoWire = payload(kind, value)?;
            // The service blanks the username when the summoner logs out.
            // A user is never cleared this way; only a reconnect resets it.
            if wire.username.is_empty() {
                debug!("USER_INFO without username (summoner logged out)");
                return Err(DecodeError::EmptyUsername);
            }
            Ok(Event::UserInfo(UserInfo {
                username: wire.username,
                icon_id: wire.icon_id,
            }))
        }
        EventKind::ChampionChange => {
            let wire: ChampionChangeWire = payload(kind, value)?;
            let record = ChampionRecord::try_from(wire).map_err(|source| {
                DecodeError::InvalidPayload {
                    kind: kind.as_str(),
                    source,
                }
            })?;
            Ok(Event::ChampionChange(Box::new(record)))
        }
        EventKind::QuitChampSelect => Ok(Event::QuitChampSelect),
    }
}

/// Read the discriminant. `Ok(None)` means a present but unknown kind,
/// whatever its JSON type.
fn read_kind(value: &Value) -> Result<Option<EventKind>, DecodeError> {
    let kind = match value.get("type") {
        None | Some(Value::Null) => return Err(DecodeError::MissingKind),
        Some(Value::Number(n)) => n.as_u64().and_then(EventKind::from_code),
        Some(Value::String(s)) => EventKind::from_name(s),
        Some(_) => None,
    };
    if kind.is_none() {
        debug!("Unknown event kind {}", value["type"]);
    }
    Ok(kind)
}

fn payload<T>(kind: EventKind, value: Value) -> Result<T, DecodeError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(value).map_err(|source| DecodeError::InvalidPayload {
        kind: kind.as_str(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn runes_json(base: u16) -> String {
        let entries: Vec<String> = (0..9)
            .map(|i| {
                format!(
                    r#"{{"Id":{},"Asset":"r{}.png","Info":{{"Name":"R{}","Description":"d"}}}}"#,
                    base + i,
                    base + i,
                    base + i
                )
            })
            .collect();
        format!("[{}]", entries.join(","))
    }

    fn items_json(ids: &[u16]) -> String {
        let entries: Vec<String> = ids
            .iter()
            .map(|id| format!(r#"{{"Id":{id},"Asset":"i{id}.png","Name":"Item {id}"}}"#))
            .collect();
        format!("[{}]", entries.join(","))
    }

    #[test]
    fn decodes_user_info() {
        let event = decode(r#"{"type":0,"username":"Fry","iconId":"42"}"#).unwrap();
        assert_eq!(
            event,
            Event::UserInfo(UserInfo {
                username: "Fry".into(),
                icon_id: "42".into(),
            })
        );
    }

    #[test]
    fn numeric_icon_id_is_normalised_to_string() {
        let event = decode(r#"{"type":0,"username":"Fry","iconId":4655}"#).unwrap();
        match event {
            Event::UserInfo(user) => assert_eq!(user.icon_id, "4655"),
            other => panic!("expected UserInfo, got {other:?}"),
        }
    }

    #[test]
    fn string_discriminant_is_accepted() {
        let event = decode(r#"{"type":"QUIT_CHAMP_SELECT"}"#).unwrap();
        assert_eq!(event, Event::QuitChampSelect);
    }

    #[test]
    fn decodes_champion_change_with_all_collections() {
        let raw = format!(
            r#"{{"type":1,"id":"103","name":"Ahri","role":"MID",
                "runesByPopularity":{},"runesByWinRate":{},
                "itemsByPopularity":{},"itemsByWinRate":{},
                "startingItemsByPopularity":{},"startingItemsByWinRate":{}}}"#,
            runes_json(100),
            runes_json(200),
            items_json(&[3020, 6655]),
            items_json(&[3165]),
            items_json(&[1056, 2003]),
            items_json(&[1056]),
        );
        let event = decode(&raw).unwrap();
        let Event::ChampionChange(record) = event else {
            panic!("expected ChampionChange");
        };
        assert_eq!(record.id, "103");
        assert_eq!(record.name, "Ahri");
        assert_eq!(record.role, "MID");
        assert_eq!(record.runes_by_popularity.len(), 9);
        assert_eq!(record.runes_by_win_rate[0].id, 200);
        assert_eq!(record.items_by_popularity.len(), 2);
        assert_eq!(record.items_by_win_rate[0].id, 3165);
        assert_eq!(record.starting_items_by_popularity[1].id, 2003);
        assert_eq!(record.starting_items_by_win_rate.len(), 1);
    }

    #[test]
    fn legacy_champion_field_names_are_renamed() {
        let raw = r#"{"type":1,"championId":266,"championName":"Aatrox","role":"TOP"}"#;
        let Event::ChampionChange(record) = decode(raw).unwrap() else {
            panic!("expected ChampionChange");
        };
        assert_eq!(record.id, "266");
        assert_eq!(record.name, "Aatrox");
        assert_eq!(record.role, "TOP");
    }

    #[test]
    fn null_and_missing_collections_decode_as_empty() {
        let raw = r#"{"type":1,"id":"1","name":"Annie","role":"MID",
            "startingItemsByPopularity":null}"#;
        let Event::ChampionChange(record) = decode(raw).unwrap() else {
            panic!("expected ChampionChange");
        };
        assert!(record.runes_by_popularity.is_empty());
        assert!(record.starting_items_by_popularity.is_empty());
        assert!(record.starting_items_by_win_rate.is_empty());
    }

    #[test]
    fn unknown_numeric_kind_is_noop() {
        assert_eq!(decode(r#"{"type":7,"whatever":true}"#).unwrap(), Event::Noop);
    }

    #[test]
    fn unknown_string_kind_is_noop() {
        assert_eq!(decode(r#"{"type":"LOBBY_UPDATE"}"#).unwrap(), Event::Noop);
    }

    #[test]
    fn negative_kind_is_noop() {
        assert_eq!(decode(r#"{"type":-1}"#).unwrap(), Event::Noop);
    }

    #[test]
    fn unparseable_text_is_malformed() {
        let err = decode("not json at all").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn missing_kind_is_an_error() {
        let err = decode(r#"{"username":"Fry"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingKind), "got {err:?}");
    }

    #[test]
    fn null_kind_is_missing() {
        let err = decode(r#"{"type":null}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingKind), "got {err:?}");
    }

    #[test]
    fn kinds_of_any_other_json_type_are_noop() {
        for raw in [
            r#"{"type":1.5}"#,
            r#"{"type":true}"#,
            r#"{"type":{"v":3}}"#,
            r#"{"type":[0]}"#,
        ] {
            assert_eq!(decode(raw).unwrap(), Event::Noop, "{raw}");
        }
    }

    #[test]
    fn both_champion_spellings_prefer_current_names() {
        let raw = r#"{"type":1,"id":"103","championId":"266",
            "name":"Ahri","championName":"Aatrox","role":"MID"}"#;
        let Event::ChampionChange(record) = decode(raw).unwrap() else {
            panic!("expected ChampionChange");
        };
        assert_eq!(record.id, "103");
        assert_eq!(record.name, "Ahri");
    }

    #[test]
    fn mixed_champion_spellings_are_merged() {
        let raw = r#"{"type":1,"championId":103,"name":"Ahri","role":"MID"}"#;
        let Event::ChampionChange(record) = decode(raw).unwrap() else {
            panic!("expected ChampionChange");
        };
        assert_eq!(record.id, "103");
        assert_eq!(record.name, "Ahri");
    }

    #[test]
    fn champion_without_id_is_invalid_payload() {
        let err = decode(r#"{"type":1,"name":"Ahri"}"#).unwrap_err();
        match err {
            DecodeError::InvalidPayload { kind, .. } => assert_eq!(kind, "CHAMPION_CHANGE"),
            other => panic!("expected InvalidPayload, got {other:?}"),
        }
    }

    #[test]
    fn non_object_message_is_rejected() {
        let err = decode("[0, 1, 2]").unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject), "got {err:?}");
    }

    #[test]
    fn user_info_without_username_is_invalid_payload() {
        let err = decode(r#"{"type":0,"iconId":"1"}"#).unwrap_err();
        match err {
            DecodeError::InvalidPayload { kind, .. } => assert_eq!(kind, "USER_INFO"),
            other => panic!("expected InvalidPayload, got {other:?}"),
        }
    }

    #[test]
    fn empty_username_is_rejected() {
        let err = decode(r#"{"type":0,"username":"","iconId":"1"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::EmptyUsername), "got {err:?}");
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in [
            EventKind::UserInfo,
            EventKind::ChampionChange,
            EventKind::QuitChampSelect,
        ] {
            assert_eq!(EventKind::from_name(kind.as_str()), Some(kind));
        }
    }
}
