pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

/// Top-level namespace shared by every room.
pub const ROOMS_ROOT: &str = "rooms";

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Lowercase base36, the radix browsers use for `Number.prototype.toString(36)`.
pub fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_owned();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    String::from_utf8_lossy(&digits).into_owned()
}
