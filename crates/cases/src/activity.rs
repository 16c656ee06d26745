//! Activity log entries and their display messages.
//!
//! Messages are derived from the typed event plus the actor's display name,
//! so a stored entry can always be re-rendered from its own metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use casetrack_core::{ActivityId, CaseId, CommentId, UserId};

use crate::{CaseStatus, Priority};

/// Identity and display name of whoever performed an action, captured at
/// write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Performer {
    pub uid: UserId,
    pub name: String,
}

impl Performer {
    pub fn new(uid: UserId, name: impl Into<String>) -> Self {
        Self {
            uid,
            name: name.into(),
        }
    }
}

/// Field group reported by a generic edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditedField {
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "description")]
    Description,
    #[serde(rename = "due date")]
    DueDate,
}

impl EditedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditedField::Title => "title",
            EditedField::Description => "description",
            EditedField::DueDate => "due date",
        }
    }
}

/// What happened to a case. Serialized as `{"type": ..., "metadata": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "metadata",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ActivityEvent {
    CaseCreated,
    CaseEdited {
        changed_fields: Vec<EditedField>,
    },
    StatusChanged {
        old_status: CaseStatus,
        new_status: CaseStatus,
    },
    PriorityChanged {
        old_priority: Priority,
        new_priority: Priority,
    },
    #[serde(rename = "assigned_user_changed")]
    AssigneeChanged {
        old_assigned_to: Option<UserId>,
        new_assigned_to: Option<UserId>,
        assigned_to_name: Option<String>,
        #[serde(default)]
        self_assigned: bool,
    },
    CommentAdded {
        comment_id: CommentId,
    },
    CaseDeleted,
}

impl ActivityEvent {
    /// Wire name of the event kind (used in logs).
    pub fn kind(&self) -> &'static str {
        match self {
            ActivityEvent::CaseCreated => "case_created",
            ActivityEvent::CaseEdited { .. } => "case_edited",
            ActivityEvent::StatusChanged { .. } => "status_changed",
            ActivityEvent::PriorityChanged { .. } => "priority_changed",
            ActivityEvent::AssigneeChanged { .. } => "assigned_user_changed",
            ActivityEvent::CommentAdded { .. } => "comment_added",
            ActivityEvent::CaseDeleted => "case_deleted",
        }
    }
}

/// Render the display message for an event.
pub fn generate_message(event: &ActivityEvent, actor: &str) -> String {
    match event {
        ActivityEvent::CaseCreated => format!("{actor} created this case"),
        ActivityEvent::CaseEdited { changed_fields } if changed_fields.is_empty() => {
            format!("{actor} edited this case")
        }
        ActivityEvent::CaseEdited { changed_fields } => {
            let fields: Vec<&str> = changed_fields.iter().map(EditedField::as_str).collect();
            format!("{actor} updated {}", fields.join(", "))
        }
        ActivityEvent::StatusChanged {
            old_status,
            new_status,
        } => format!("{actor} changed status from {old_status} to {new_status}"),
        ActivityEvent::PriorityChanged {
            old_priority,
            new_priority,
        } => format!("{actor} changed priority from {old_priority} to {new_priority}"),
        ActivityEvent::AssigneeChanged {
            assigned_to_name: Some(name),
            ..
        } => format!("{actor} assigned this case to {name}"),
        ActivityEvent::AssigneeChanged { .. } => format!("{actor} unassigned this case"),
        ActivityEvent::CommentAdded { .. } => format!("{actor} added a comment"),
        ActivityEvent::CaseDeleted => format!("{actor} deleted this case"),
    }
}

/// An immutable, timestamped entry in a case's activity ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub case_id: CaseId,
    #[serde(flatten)]
    pub event: ActivityEvent,
    pub message: String,
    pub performed_by_uid: UserId,
    pub performed_by_name: String,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    pub fn record(
        case_id: CaseId,
        event: ActivityEvent,
        by: &Performer,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActivityId::new(),
            case_id,
            message: generate_message(&event, &by.name),
            event,
            performed_by_uid: by.uid.clone(),
            performed_by_name: by.name.clone(),
            created_at: now,
        }
    }

    /// Re-derive the message from the stored event and actor name.
    pub fn regenerate_message(&self) -> String {
        generate_message(&self.event, &self.performed_by_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn alice() -> Performer {
        Performer::new(UserId::new("u-alice"), "Alice")
    }

    #[test]
    fn status_message_matches_persisted_text() {
        let event = ActivityEvent::StatusChanged {
            old_status: CaseStatus::Open,
            new_status: CaseStatus::InProgress,
        };
        let a = Activity::record(CaseId::new(), event, &alice(), Utc::now());
        assert_eq!(a.message, "Alice changed status from Open to In Progress");
        assert_eq!(a.regenerate_message(), a.message);
    }

    #[test]
    fn assignment_messages() {
        let assign = ActivityEvent::AssigneeChanged {
            old_assigned_to: None,
            new_assigned_to: Some(UserId::new("u-bob")),
            assigned_to_name: Some("Bob".into()),
            self_assigned: false,
        };
        assert_eq!(generate_message(&assign, "Alice"), "Alice assigned this case to Bob");

        let unassign = ActivityEvent::AssigneeChanged {
            old_assigned_to: Some(UserId::new("u-bob")),
            new_assigned_to: None,
            assigned_to_name: None,
            self_assigned: false,
        };
        assert_eq!(generate_message(&unassign, "Alice"), "Alice unassigned this case");
    }

    #[test]
    fn edited_lists_fields_in_order() {
        let event = ActivityEvent::CaseEdited {
            changed_fields: vec![EditedField::Title, EditedField::DueDate],
        };
        assert_eq!(generate_message(&event, "Alice"), "Alice updated title, due date");
    }

    #[test]
    fn serialized_shape() {
        let a = Activity::record(
            CaseId::new(),
            ActivityEvent::StatusChanged {
                old_status: CaseStatus::Open,
                new_status: CaseStatus::InProgress,
            },
            &alice(),
            Utc::now(),
        );
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["type"], json!("status_changed"));
        assert_eq!(
            v["metadata"],
            json!({ "oldStatus": "Open", "newStatus": "In Progress" })
        );
        assert_eq!(v["performedByName"], json!("Alice"));

        let created = Activity::record(CaseId::new(), ActivityEvent::CaseCreated, &alice(), Utc::now());
        let v = serde_json::to_value(&created).unwrap();
        assert_eq!(v["type"], json!("case_created"));
        assert_eq!(v["message"], json!("Alice created this case"));
    }

    fn arb_status() -> impl Strategy<Value = CaseStatus> {
        prop::sample::select(CaseStatus::ALL.to_vec())
    }

    fn arb_priority() -> impl Strategy<Value = Priority> {
        prop::sample::select(vec![Priority::Low, Priority::Medium, Priority::High])
    }

    fn arb_event() -> impl Strategy<Value = ActivityEvent> {
        prop_oneof![
            Just(ActivityEvent::CaseCreated),
            Just(ActivityEvent::CaseDeleted),
            (arb_status(), arb_status()).prop_map(|(old_status, new_status)| {
                ActivityEvent::StatusChanged { old_status, new_status }
            }),
            (arb_priority(), arb_priority()).prop_map(|(old_priority, new_priority)| {
                ActivityEvent::PriorityChanged { old_priority, new_priority }
            }),
            prop::option::of("[A-Za-z ]{1,20}").prop_map(|name| ActivityEvent::AssigneeChanged {
                old_assigned_to: None,
                new_assigned_to: name.as_ref().map(|_| UserId::new("u-x")),
                assigned_to_name: name,
                self_assigned: false,
            }),
            prop::sample::subsequence(
                vec![EditedField::Title, EditedField::Description, EditedField::DueDate],
                0..=3
            )
            .prop_map(|changed_fields| ActivityEvent::CaseEdited { changed_fields }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// A stored entry re-renders to exactly the message persisted with it,
        /// even after going through its JSON form.
        #[test]
        fn message_survives_storage(event in arb_event(), actor in "[A-Za-z][A-Za-z ]{0,30}") {
            let by = Performer::new(UserId::new("u-1"), actor);
            let a = Activity::record(CaseId::new(), event, &by, Utc::now());
            let stored: Activity = serde_json::from_value(serde_json::to_value(&a).unwrap()).unwrap();
            prop_assert_eq!(&stored, &a);
            prop_assert_eq!(stored.regenerate_message(), a.message);
        }
    }
}
