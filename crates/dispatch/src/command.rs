use crate::{
    error::{Error, Result},
    request::{Origin, SendRequest, normalize_receivers},
};

/// Command token recognized by [`parse_send_command`].
pub const SEND_COMMAND: &str = "$send_msg";

const GROUP_MARKER: &str = "group[";

/// Parse the fixed send-command grammar:
///
/// ```text
/// $send_msg [name1,name2] body
/// $send_msg [name1,name2] body group[g1,g2]
/// ```
///
/// The recipient list is the bracketed segment immediately after the
/// command token; the group list is the bracketed segment after the
/// literal `group[`. Names are comma-split and trimmed; a recipient list
/// containing the everyone token (either spelling) collapses to it.
pub fn parse_send_command(input: &str) -> Result<SendRequest> {
    let rest = input
        .strip_prefix(SEND_COMMAND)
        .ok_or_else(|| Error::invalid_request(format!("expected {SEND_COMMAND} command")))?;

    let (receivers, mut body) = match rest.find('[') {
        Some(open) => {
            let close = rest[open..]
                .find(']')
                .map(|i| open + i)
                .ok_or_else(|| Error::invalid_request("unclosed receiver list"))?;
            (split_names(&rest[open + 1..close]), rest[close + 1..].trim().to_owned())
        },
        None => (Vec::new(), rest.trim().to_owned()),
    };

    let mut groups = Vec::new();
    if let Some(marker) = body.find(GROUP_MARKER) {
        let after = marker + GROUP_MARKER.len();
        if let Some(close) = body[after..].find(']').map(|i| after + i) {
            groups = split_names(&body[after..close]);
            body = body[..marker].trim().to_owned();
        }
    }

    Ok(SendRequest {
        receivers: normalize_receivers(receivers),
        groups,
        body,
        origin: Origin::Command,
    })
}

fn split_names(segment: &str) -> Vec<String> {
    segment
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}
