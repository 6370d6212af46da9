//! Reply-target resolution.
//!
//! Every client notification carries the client id as structured metadata
//! (`Outbound::Notify.correlation`); adapters echo it back in
//! `ReplyRef.correlation` and that value is authoritative. Transports that
//! cannot round-trip metadata fall back to re-parsing the `ID: <id>` line
//! the notification text also carries. Routing by reply works even after a
//! process restart because the target comes from the quoted message, not
//! from transient session state.

use relaydesk_core::domain::UserId;
use relaydesk_core::errors::DomainError;

use crate::events::ReplyRef;

const ID_TAG: &str = "ID:";

/// Notification body for a client message. The `ID:` line doubles as the
/// text-level correlation tag.
pub fn client_notification(client: UserId, display_name: &str, text: &str) -> String {
    format!("New message from {display_name}\n{ID_TAG} {client}\n\n{text}")
}

pub fn resolve(reply: &ReplyRef) -> Result<UserId, DomainError> {
    if let Some(client) = reply.correlation {
        return Ok(client);
    }
    match &reply.quoted_text {
        Some(text) => extract(text),
        None => Err(DomainError::MalformedReplyTarget(
            "reply carries neither correlation metadata nor quoted text".to_owned(),
        )),
    }
}

/// Scans quoted text for the `ID: <id>` tag. The tag must be followed by a
/// parseable id; anything else is a malformed target, not a silent miss.
pub fn extract(quoted_text: &str) -> Result<UserId, DomainError> {
    let Some(tail) = quoted_text.split(ID_TAG).nth(1) else {
        return Err(DomainError::MalformedReplyTarget("no ID tag in quoted text".to_owned()));
    };

    let token = tail.split_whitespace().next().unwrap_or("");
    token
        .parse::<i64>()
        .map(UserId)
        .map_err(|_| DomainError::MalformedReplyTarget(format!("unparseable id `{token}`")))
}

#[cfg(test)]
mod tests {
    use relaydesk_core::domain::UserId;
    use relaydesk_core::errors::DomainError;

    use super::{client_notification, extract, resolve};
    use crate::events::ReplyRef;

    #[test]
    fn metadata_correlation_is_authoritative() {
        let reply = ReplyRef {
            correlation: Some(UserId(111)),
            quoted_text: Some("New message from Bob\nID: 222\n\nhi".to_owned()),
        };
        assert_eq!(resolve(&reply).expect("resolve"), UserId(111));
    }

    #[test]
    fn quoted_text_fallback_recovers_the_id() {
        let notification = client_notification(UserId(111), "Alice", "hello");
        assert!(notification.contains("ID: 111"));

        let reply = ReplyRef::quoted(notification);
        assert_eq!(resolve(&reply).expect("resolve"), UserId(111));
    }

    #[test]
    fn text_without_an_id_tag_is_malformed() {
        let error = extract("just some quoted text").expect_err("no tag");
        assert!(matches!(error, DomainError::MalformedReplyTarget(_)));
    }

    #[test]
    fn unparseable_id_is_malformed() {
        let error = extract("New message\nID: not-a-number").expect_err("bad id");
        assert!(matches!(
            error,
            DomainError::MalformedReplyTarget(ref detail) if detail.contains("not-a-number")
        ));
    }

    #[test]
    fn empty_reply_is_malformed() {
        let error = resolve(&ReplyRef::default()).expect_err("nothing to resolve");
        assert!(matches!(error, DomainError::MalformedReplyTarget(_)));
    }

    #[test]
    fn negative_ids_survive_the_round_trip() {
        // Group chat ids on some platforms are negative.
        let reply = ReplyRef::quoted(client_notification(UserId(-100500), "Group", "hello"));
        assert_eq!(resolve(&reply).expect("resolve"), UserId(-100500));
    }
}
