use courier_backends::types::EVERYONE_TOKEN;

/// ASCII alias for the everyone token accepted in recipient lists.
pub const EVERYONE_ALIAS: &str = "all";

/// Which entry point produced a request.
///
/// The two paths carry different partial-failure semantics, pinned by
/// tests in `dispatcher`: the queue path isolates failures per name and
/// falls back to an unaddressed group send when no member resolves, the
/// command path aborts the call instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Automatic trigger via the queued-request file.
    Queue,
    /// Interactive `$send_msg` command.
    Command,
}

/// One structured send request, consumed exactly once by the dispatcher.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub receivers: Vec<String>,
    pub groups: Vec<String>,
    pub body: String,
    pub origin: Origin,
}

impl SendRequest {
    /// Whether the recipient list addresses the whole room.
    #[must_use]
    pub fn wants_everyone(&self) -> bool {
        self.receivers
            .iter()
            .any(|name| name == EVERYONE_TOKEN || name == EVERYONE_ALIAS)
    }
}

/// Collapse a recipient list containing the everyone token (in either
/// spelling) to the canonical single-token form.
#[must_use]
pub fn normalize_receivers(receivers: Vec<String>) -> Vec<String> {
    let wants_everyone = receivers
        .iter()
        .any(|name| name == EVERYONE_TOKEN || name == EVERYONE_ALIAS);
    if wants_everyone {
        vec![EVERYONE_TOKEN.to_owned()]
    } else {
        receivers
    }
}
