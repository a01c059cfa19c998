/// `m:ss`, used for the whole-test clock.
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    let minutes = seconds / 60;
    let remainder = seconds % 60;
    format!("{minutes}:{remainder:02}")
}

#[must_use]
pub fn format_seconds(seconds: u32) -> String {
    format!("{seconds}s")
}
