use crate::Tick;

/// Returns whether or not a wrapping tick is greater than another
/// sequence_greater_than(2,1) will return true
/// sequence_greater_than(1,2) will return false
/// sequence_greater_than(1,1) will return false
pub fn sequence_greater_than(s1: Tick, s2: Tick) -> bool {
    ((s1 > s2) && (s1 - s2 <= 32768)) || ((s1 < s2) && (s2 - s1 > 32768))
}

/// Returns whether or not a wrapping tick is less than another
/// sequence_less_than(1,2) will return true
/// sequence_less_than(2,1) will return false
/// sequence_less_than(1,1) will return false
pub fn sequence_less_than(s1: Tick, s2: Tick) -> bool {
    sequence_greater_than(s2, s1)
}

/// Retrieves the signed number of ticks from `a` to `b`, across the wrap
/// boundary.
///
/// # Examples
/// ```
/// # use tessera_shared::wrapping_diff;
/// assert_eq!(wrapping_diff(1, 2), 1);
/// assert_eq!(wrapping_diff(2, 1), -1);
/// assert_eq!(wrapping_diff(65535, 0), 1);
/// assert_eq!(wrapping_diff(0, 65535), -1);
/// ```
pub fn wrapping_diff(a: Tick, b: Tick) -> i16 {
    b.wrapping_sub(a) as i16
}
