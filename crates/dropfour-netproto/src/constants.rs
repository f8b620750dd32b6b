/// Number of digits in a room code.
pub const ROOM_CODE_LEN: usize = 4;

/// Number of distinct room codes (`0000`..=`9999`).
pub const ROOM_CODE_SPACE: u16 = 10_000;

/// Upper bound for an encoded game message, in bytes.
///
/// Every message is a tag plus at most three small integers, so this only
/// guards against garbage.
pub const MAX_MESSAGE_LEN: usize = 256;
