pub const PACKET_STATUS: i32 = 0x01;
pub const PACKET_RESPONSE: i32 = 0x02;

pub const STATUS_RED: i32 = 1;
pub const STATUS_GREEN: i32 = 2;
pub const STATUS_BLUE: i32 = 3;

const UNKNOWN: &str = "UNKNOWN";

pub fn status_label(status: i32) -> &'static str {
    match status {
        STATUS_RED => "EMERGENCY / CRITICAL",
        STATUS_GREEN => "SAFE / OK",
        STATUS_BLUE => "NEED FOOD / WATER / MEDICAL SUPPLIES",
        _ => UNKNOWN,
    }
}

pub fn packet_label(kind: i32) -> &'static str {
    match kind {
        PACKET_STATUS => "STATUS",
        PACKET_RESPONSE => "RESPONSE",
        _ => UNKNOWN,
    }
}
