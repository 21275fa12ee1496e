use serde::{Deserialize, Serialize};

/// Token a recipient list may carry to address a whole room.
/// `"all"` is accepted as an ASCII alias at the request layer.
pub const EVERYONE_TOKEN: &str = "所有人";

/// A directory contact. Identity is the opaque platform id; nickname and
/// remark are lookup keys and are not guaranteed unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub id: String,
    pub nickname: String,
    /// Caller-assigned remark. Only the bulk and direct profiles carry it.
    #[serde(default)]
    pub remark: Option<String>,
}

/// A group chat. The title is the lookup key; first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEntry {
    pub id: String,
    pub title: String,
}

/// A member of one room. Member lists are independent per room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMember {
    pub id: String,
    pub display_name: String,
}

/// Full directory snapshot: every room and friend known to the backend.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    pub rooms: Vec<RoomEntry>,
    pub friends: Vec<ContactEntry>,
}

/// Message kind, classified from the request body by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Text,
    Image,
    Video,
    File,
}

/// Normalized @-mention directive. Each profile adapter renders it in its
/// own wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mention {
    None,
    /// Notify the whole room without enumerating members.
    Everyone,
    /// Notify the listed members.
    Members(Vec<RoomMember>),
}

impl Mention {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Leading `@…` text for profiles that embed mentions in the body.
    /// Empty for [`Mention::None`].
    #[must_use]
    pub fn body_prefix(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Everyone => format!("@{EVERYONE_TOKEN} "),
            Self::Members(members) => {
                let mut prefix = String::new();
                for member in members {
                    prefix.push('@');
                    prefix.push_str(&member.display_name);
                    prefix.push(' ');
                }
                prefix
            },
        }
    }
}

/// One normalized outbound send, consumed by [`crate::Backend::send`].
/// For media kinds the body is the source URL.
#[derive(Debug)]
pub struct OutboundMessage<'a> {
    pub kind: MediaKind,
    pub body: &'a str,
    pub mention: Mention,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, name: &str) -> RoomMember {
        RoomMember {
            id: id.into(),
            display_name: name.into(),
        }
    }

    #[test]
    fn mention_prefix_for_everyone() {
        assert_eq!(Mention::Everyone.body_prefix(), "@所有人 ");
    }

    #[test]
    fn mention_prefix_lists_display_names() {
        let mention = Mention::Members(vec![member("a", "Ann"), member("b", "Bo")]);
        assert_eq!(mention.body_prefix(), "@Ann @Bo ");
    }

    #[test]
    fn mention_prefix_empty_when_unaddressed() {
        assert_eq!(Mention::None.body_prefix(), "");
    }
}
