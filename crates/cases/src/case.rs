use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use casetrack_core::{CaseId, DomainError, DomainResult, UserId, Versioned};

use crate::{ActivityEvent, CaseStatus, EditedField, Performer, validate_transition, validation};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl core::fmt::Display for Priority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Priority::Low),
            "Medium" => Ok(Priority::Medium),
            "High" => Ok(Priority::High),
            _ => Err(DomainError::validation("Priority must be Low, Medium, or High")),
        }
    }
}

/// A trackable unit of work.
///
/// `created_by_name` and `assigned_to_name` are snapshots taken when the
/// field was written; later profile renames do not touch them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: CaseId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: CaseStatus,
    pub created_by: UserId,
    pub created_by_name: String,
    pub assigned_to: Option<UserId>,
    pub assigned_to_name: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub watchers: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Write counter maintained by the store.
    #[serde(default)]
    pub version: u64,
}

impl Versioned for Case {
    fn version(&self) -> u64 {
        self.version
    }
}

/// Validated input for a new case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDraft {
    pub title: String,
    pub description: String,
    pub priority: Option<Priority>,
    pub assigned_to: Option<UserId>,
    pub due_date: Option<DateTime<Utc>>,
}

impl CaseDraft {
    pub fn new(title: &str, description: &str) -> DomainResult<Self> {
        Ok(Self {
            title: validation::title(title)?,
            description: validation::description(description)?,
            priority: None,
            assigned_to: None,
            due_date: None,
        })
    }

    /// Drop the admin-only fields for non-admin creators. They are ignored,
    /// not rejected.
    pub fn for_creator(self, is_admin: bool) -> Self {
        if is_admin {
            self
        } else {
            Self {
                priority: None,
                assigned_to: None,
                due_date: None,
                ..self
            }
        }
    }
}

/// Partial update of a case. A `Some` field is "present" in the request,
/// whatever its value; for `assigned_to`/`due_date`, `Some(None)` clears.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CasePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<CaseStatus>,
    pub assigned_to: Option<Option<UserId>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl CasePatch {
    /// Trim and length-check the free-text fields that are present.
    pub fn validated(mut self) -> DomainResult<Self> {
        if let Some(t) = self.title.take() {
            self.title = Some(validation::title(&t)?);
        }
        if let Some(d) = self.description.take() {
            self.description = Some(validation::description(&d)?);
        }
        Ok(self)
    }

    /// Whether the request names any admin-only field.
    pub fn touches_restricted_fields(&self) -> bool {
        self.priority.is_some()
            || self.status.is_some()
            || self.assigned_to.is_some()
            || self.due_date.is_some()
    }

    /// The assignee this patch would newly set, if it changes the current one.
    pub fn new_assignee<'a>(&'a self, current: &Case) -> Option<&'a UserId> {
        match &self.assigned_to {
            Some(Some(uid)) if current.assigned_to.as_ref() != Some(uid) => Some(uid),
            _ => None,
        }
    }
}

impl Case {
    /// A freshly created case: `Open`, no watchers.
    pub fn open(
        id: CaseId,
        draft: CaseDraft,
        creator: &Performer,
        assigned_to_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority.unwrap_or_default(),
            status: CaseStatus::Open,
            created_by: creator.uid.clone(),
            created_by_name: creator.name.clone(),
            assigned_to_name: draft.assigned_to.as_ref().and(assigned_to_name),
            assigned_to: draft.assigned_to,
            due_date: draft.due_date,
            watchers: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Ownership and field-presence gate for the general edit path.
    pub fn authorize_edit(
        &self,
        caller: &UserId,
        is_admin: bool,
        patch: &CasePatch,
    ) -> DomainResult<()> {
        if is_admin {
            return Ok(());
        }
        if &self.created_by != caller {
            return Err(DomainError::forbidden("You can only edit cases you created"));
        }
        if patch.touches_restricted_fields() {
            return Err(DomainError::forbidden(
                "You can only edit the title and description of your own cases",
            ));
        }
        Ok(())
    }

    /// Apply an already-authorized patch, returning the activity events for
    /// every field group that actually changed (status, priority, assignee,
    /// then the bundled edit).
    ///
    /// `assignee_name` is the resolved display name of a newly set assignee.
    pub fn apply_patch(
        &mut self,
        patch: CasePatch,
        assignee_name: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<ActivityEvent>> {
        if let Some(requested) = patch.status {
            validate_transition(self.status, requested)?;
        }

        let mut events = Vec::new();
        let mut edited = Vec::new();

        if let Some(new_status) = patch.status.filter(|s| *s != self.status) {
            events.push(ActivityEvent::StatusChanged {
                old_status: self.status,
                new_status,
            });
            self.status = new_status;
        }

        if let Some(new_priority) = patch.priority.filter(|p| *p != self.priority) {
            events.push(ActivityEvent::PriorityChanged {
                old_priority: self.priority,
                new_priority,
            });
            self.priority = new_priority;
        }

        if let Some(new_assignee) = patch.assigned_to.filter(|a| *a != self.assigned_to) {
            let name = new_assignee.as_ref().and(assignee_name);
            events.push(ActivityEvent::AssigneeChanged {
                old_assigned_to: self.assigned_to.take(),
                new_assigned_to: new_assignee.clone(),
                assigned_to_name: name.clone(),
                self_assigned: false,
            });
            self.assigned_to = new_assignee;
            self.assigned_to_name = name;
        }

        if let Some(title) = patch.title.filter(|t| *t != self.title) {
            self.title = title;
            edited.push(EditedField::Title);
        }
        if let Some(description) = patch.description.filter(|d| *d != self.description) {
            self.description = description;
            edited.push(EditedField::Description);
        }
        if let Some(due_date) = patch.due_date.filter(|d| *d != self.due_date) {
            self.due_date = due_date;
            edited.push(EditedField::DueDate);
        }
        if !edited.is_empty() {
            events.push(ActivityEvent::CaseEdited {
                changed_fields: edited,
            });
        }

        self.updated_at = now;
        Ok(events)
    }

    /// Status-only path. A same-state request changes nothing but the
    /// timestamp and yields no event.
    pub fn set_status(
        &mut self,
        requested: CaseStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<ActivityEvent>> {
        validate_transition(self.status, requested)?;
        self.updated_at = now;
        if requested == self.status {
            return Ok(None);
        }
        let event = ActivityEvent::StatusChanged {
            old_status: self.status,
            new_status: requested,
        };
        self.status = requested;
        Ok(Some(event))
    }

    /// Admin assignment. `assignee` is the resolved (uid, name) or `None` to
    /// unassign.
    pub fn assign(
        &mut self,
        assignee: Option<(UserId, String)>,
        now: DateTime<Utc>,
    ) -> ActivityEvent {
        let (new_assigned_to, name) = match assignee {
            Some((uid, name)) => (Some(uid), Some(name)),
            None => (None, None),
        };
        let event = ActivityEvent::AssigneeChanged {
            old_assigned_to: self.assigned_to.take(),
            new_assigned_to: new_assigned_to.clone(),
            assigned_to_name: name.clone(),
            self_assigned: false,
        };
        self.assigned_to = new_assigned_to;
        self.assigned_to_name = name;
        self.updated_at = now;
        event
    }

    /// "Take task": only an unassigned case can be taken.
    pub fn take(&mut self, by: &Performer, now: DateTime<Utc>) -> DomainResult<ActivityEvent> {
        if self.assigned_to.is_some() {
            return Err(DomainError::conflict(
                "This case is already assigned to someone. You can only take unassigned cases.",
            ));
        }
        self.assigned_to = Some(by.uid.clone());
        self.assigned_to_name = Some(by.name.clone());
        self.updated_at = now;
        Ok(ActivityEvent::AssigneeChanged {
            old_assigned_to: None,
            new_assigned_to: Some(by.uid.clone()),
            assigned_to_name: Some(by.name.clone()),
            self_assigned: true,
        })
    }

    pub fn is_watched_by(&self, uid: &UserId) -> bool {
        self.watchers.contains(uid)
    }

    pub fn watch(&mut self, uid: &UserId) -> DomainResult<()> {
        if self.is_watched_by(uid) {
            return Err(DomainError::conflict("You are already watching this case"));
        }
        self.watchers.push(uid.clone());
        Ok(())
    }

    /// Idempotent: returns whether the caller was watching.
    pub fn unwatch(&mut self, uid: &UserId) -> bool {
        let before = self.watchers.len();
        self.watchers.retain(|w| w != uid);
        self.watchers.len() != before
    }

    /// Free-text match over title, description and both display names.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [
            Some(self.title.as_str()),
            Some(self.description.as_str()),
            Some(self.created_by_name.as_str()),
            self.assigned_to_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}
