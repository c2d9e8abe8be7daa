use crate::relay::RelayError;

/// Splits a room id of the form `"3-5"` into its two member user ids.
/// Callers resolve before touching the registry so that a bad id never
/// leaves a half-registered connection behind.
pub fn resolve(room_id: &str) -> Result<(i64, i64), RelayError> {
    let malformed = || RelayError::MalformedRoomId(room_id.to_owned());

    let mut parts = room_id.split('-');
    let (Some(a), Some(b), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };

    let a: i64 = a.trim().parse().map_err(|_| malformed())?;
    let b: i64 = b.trim().parse().map_err(|_| malformed())?;
    if a == b {
        return Err(malformed());
    }

    Ok((a, b))
}

/// Canonical room id for a pair of users: smaller id first, so both sides
/// of a conversation derive the same key.
pub fn encode(a: i64, b: i64) -> String {
    format!("{}-{}", a.min(b), a.max(b))
}
