/// Compute the timestamp resolution, in units per second
///
/// Return the resolution, or `None` if the resolution is invalid (for ex. greater than `2^64`)
pub fn build_ts_resolution(ts_resol: u8) -> Option<u64> {
    let ts_mode = ts_resol & 0x80;
    let unit = if ts_mode == 0 {
        // 10^if_tsresol
        // check that if_tsresol <= 19 (10^19 is the largest power of 10 to fit in a u64)
        if ts_resol > 19 {
            return None;
        }
        10u64.pow(ts_resol as u32)
    } else {
        // 2^if_tsresol, at most 2^63
        let exp = ts_resol & 0x7f;
        if exp > 63 {
            return None;
        }
        1 << (exp as u64)
    };
    Some(unit)
}

/// Given the timestamp parameters, return the timestamp seconds and fractional part (in resolution
/// units)
pub fn build_ts(ts_high: u32, ts_low: u32, resolution: u64) -> (u64, u64) {
    let ts: u64 = ((ts_high as u64) << 32) | (ts_low as u64);
    (ts / resolution, ts % resolution)
}

/// Split a timestamp, in resolution units, into the high and low 32-bit words of a packet block
pub fn split_ts(ts: u64) -> (u32, u32) {
    ((ts >> 32) as u32, ts as u32)
}
