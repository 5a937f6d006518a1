/// Human-readable duration for rendered documents: `45 s`, `4 min 30 s`,
/// `2 h 5 min`.
#[must_use]
pub fn humanize_secs(total_secs: u64) -> String {
    if total_secs < 60 {
        format!("{total_secs} s")
    } else if total_secs < 3600 {
        format!("{} min {} s", total_secs / 60, total_secs % 60)
    } else {
        format!("{} h {} min", total_secs / 3600, (total_secs % 3600) / 60)
    }
}
