//! Per-option counting of responses.

use crate::model::{OptionTally, Response};

/// Exact, case-sensitive comparison between a response and an option.
pub fn matches_option(options: &[String], response: &str) -> bool {
    options.iter().any(|option| option == response)
}

/// Count responses per option, in option order.
///
/// Responses that match no option are not counted anywhere; percentages use
/// the total of all responses, so they may sum to less than 100.
pub fn tally(options: &[String], responses: &[Response]) -> Vec<OptionTally> {
    let total = responses.len();
    options
        .iter()
        .map(|option| {
            let count = responses
                .iter()
                .filter(|r| r.response == *option)
                .count();
            OptionTally {
                option: option.clone(),
                count,
                percentage: percentage(count, total),
            }
        })
        .collect()
}

/// `count / total * 100` rounded to one decimal place; `0.0` when `total` is 0.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = count as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}
