/// Response token allotment for a request whose prompt is `prompt_length` long.
///
/// Capped by the room left in `max_request_response_tokens`, but never below
/// `min_response_tokens`, even when that overshoots the combined cap.
pub fn calc_max_response_tokens(
    prompt_length: usize,
    max_request_response_tokens: usize,
    min_response_tokens: usize,
) -> usize {
    let remaining = max_request_response_tokens as i64 - prompt_length as i64;
    let floor = min_response_tokens as i64;
    floor.max(remaining.min(floor)) as usize
}
