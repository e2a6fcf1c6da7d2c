//! Poll identifiers: composite ids for imports and share links.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything except RFC 3986 unreserved characters.
const VOTE_PARAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Id for an imported poll.
///
/// When both `course` and `week` are present the id becomes
/// `<id>_<first word of course, lowercased>_<week>`; otherwise the bare id.
pub fn composite_id(id: &str, course: Option<&str>, week: Option<&str>) -> String {
    let course_word = course
        .and_then(|course| course.split_whitespace().next())
        .map(str::to_lowercase);
    let week = week.map(str::trim).filter(|week| !week.is_empty());
    match (course_word, week) {
        (Some(course), Some(week)) => format!("{id}_{course}_{week}"),
        _ => id.to_string(),
    }
}

/// Link that opens the voting page for `poll_id`. The id is percent-encoded.
pub fn share_url(base_url: &str, poll_id: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let separator = if base.contains('?') { '&' } else { '?' };
    let vote = utf8_percent_encode(poll_id, VOTE_PARAM);
    format!("{base}{separator}vote={vote}")
}
