//! Work-item payloads built from (already redacted) tickets

use tsync_core::{ParentLink, RemotePayload, Ticket, map_priority};

pub const PARENT_LINK_COMMENT: &str = "Linked to parent work item via helpdesk integration";

/// Payload for a new work item: carries the external-id reference and the
/// parent link when the ticket has a parent.
pub fn create_payload(ticket: &Ticket) -> RemotePayload {
    RemotePayload {
        title: ticket.title.clone(),
        description: ticket.description.clone(),
        priority: map_priority(ticket.priority.as_deref()),
        external_id: Some(ticket.id.clone()),
        parent: parent_link(ticket),
    }
}

/// Payload for an existing work item. The external id is never re-sent;
/// the parent link is only added when `link_parent` is set.
pub fn update_payload(ticket: &Ticket, link_parent: bool) -> RemotePayload {
    RemotePayload {
        title: ticket.title.clone(),
        description: ticket.description.clone(),
        priority: map_priority(ticket.priority.as_deref()),
        external_id: None,
        parent: if link_parent { parent_link(ticket) } else { None },
    }
}

fn parent_link(ticket: &Ticket) -> Option<ParentLink> {
    ticket.parent_id.as_ref().map(|parent_id| ParentLink {
        parent_id: parent_id.clone(),
        comment: PARENT_LINK_COMMENT.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_payload_with_parent() {
        let ticket = Ticket::new("42", "Login failure")
            .with_description("cannot log in")
            .with_priority("Low")
            .with_parent("7");

        let payload = create_payload(&ticket);

        assert_eq!(payload.external_id.as_deref(), Some("42"));
        assert_eq!(payload.priority, 3);
        assert_eq!(payload.parent.unwrap().parent_id, "7");
    }

    #[test]
    fn test_create_payload_without_parent() {
        let payload = create_payload(&Ticket::new("42", "Login failure"));
        assert!(payload.parent.is_none());
        assert_eq!(payload.priority, 2);
    }

    #[test]
    fn test_update_payload() {
        let ticket = Ticket::new("42", "Login failure").with_parent("7");

        let linked = update_payload(&ticket, true);
        assert!(linked.external_id.is_none());
        assert_eq!(linked.parent.unwrap().parent_id, "7");

        assert!(update_payload(&ticket, false).parent.is_none());
    }
}
