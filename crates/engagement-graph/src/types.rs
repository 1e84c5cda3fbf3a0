use chrono::{DateTime, NaiveDate, Utc};
use engagement_common::Id;
use serde::{Deserialize, Serialize};

/// Visibility cascade ordering from "public ≺ guilds ≺
/// invite_only ≺ private, where ≺ means 'more restrictive'." `Ord` is
/// derived in declaration order so `child <= parent` is exactly the
/// cascade check C2::CreateEvent needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Guilds,
    InviteOnly,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Organizer {
    User(Id),
    Guild(Id),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuildVisibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: Id,
    pub name: String,
    pub visibility: GuildVisibility,
    pub members: Vec<Id>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllianceStatus {
    Pending,
    Active,
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alliance {
    pub id: Id,
    pub guild_a: Id,
    pub guild_b: Id,
    pub status: AllianceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Idea,
    Planning,
    Confirmed,
    Active,
    Completed,
    Cancelled,
    Frozen,
}

impl LifecycleStatus {
    /// RSVP submission is only accepted while the target is in one of
    /// these states ("Submission contract").
    pub fn accepts_submissions(&self) -> bool {
        matches!(self, Self::Planning | Self::Confirmed | Self::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuesQuestion {
    pub question_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adventure {
    pub id: Id,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LifecycleStatus,
    pub visibility: Visibility,
    pub organizer: Organizer,
    pub guild_id: Option<Id>,
    pub values_questions: Vec<ValuesQuestion>,
    pub forum_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Virtual { url: String },
    Physical { address: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Id,
    pub adventure_id: Option<Id>,
    pub order_in_adventure: Option<u32>,
    pub guild_id: Option<Id>,
    pub template: Option<String>,
    pub visibility: Visibility,
    pub location: Location,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub capacity: Option<u32>,
    pub waitlist_enabled: bool,
    pub values_required: bool,
    pub values_questions: Vec<ValuesQuestion>,
    pub auto_approve_aligned: bool,
    pub yikes_threshold: u32,
    pub is_support_event: bool,
    pub requires_confirmation: bool,
    pub confirmation_deadline: Option<DateTime<Utc>>,
    pub completion_verified: bool,
    pub confirmed_count: u32,
    pub organizer: Organizer,
    pub status: LifecycleStatus,
    pub forum_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Id,
    /// The role's owner: an event or a rideshare.
    pub owner_id: Id,
    pub name: String,
    pub max_slots: u32,
    pub filled_slots: u32,
    pub is_default: bool,
    pub sort_order: u32,
    pub suggested_interests: Vec<String>,
    pub catalog_id: Option<Id>,
}

impl Role {
    pub fn has_capacity(&self) -> bool {
        self.max_slots == 0 || self.filled_slots < self.max_slots
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: Id,
    pub rideshare_id: Id,
    pub order: u32,
    pub pickup: String,
    pub dropoff: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rideshare {
    pub id: Id,
    pub event_id: Option<Id>,
    pub adventure_id: Option<Id>,
    pub organizer: Organizer,
}

impl Rideshare {
    /// invariant: "Rideshare has exactly one parent."
    pub fn has_exactly_one_parent(&self) -> bool {
        self.event_id.is_some() ^ self.adventure_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForumParent {
    Adventure(Id),
    Event(Id),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    pub id: Id,
    pub parent: ForumParent,
    pub visibility: Visibility,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_cascade_orders_public_least_restrictive() {
        assert!(Visibility::Public < Visibility::Guilds);
        assert!(Visibility::Guilds < Visibility::InviteOnly);
        assert!(Visibility::InviteOnly < Visibility::Private);
    }

    #[test]
    fn rideshare_parent_is_xor() {
        let base = Rideshare {
            id: Id::new("rideshare", "1"),
            event_id: None,
            adventure_id: None,
            organizer: Organizer::User(Id::new("user", "a")),
        };
        assert!(!base.has_exactly_one_parent());
        let with_event = Rideshare {
            event_id: Some(Id::new("event", "e1")),
            ..base.clone()
        };
        assert!(with_event.has_exactly_one_parent());
        let with_both = Rideshare {
            adventure_id: Some(Id::new("adventure", "a1")),
            ..with_event
        };
        assert!(!with_both.has_exactly_one_parent());
    }
}
