use engagement_common::Id;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// What a subscriber wants to hear about. `None` in any field means "no
/// filter on this dimension" (`{user_id, guild_ids?, target_ids?}`).
#[derive(Debug, Clone)]
pub struct SubscriberFilter {
    pub user_id: Id,
    pub guild_ids: Option<HashSet<Id>>,
    pub target_ids: Option<HashSet<Id>>,
}

impl SubscriberFilter {
    pub fn for_user(user_id: Id) -> Self {
        Self { user_id, guild_ids: None, target_ids: None }
    }
}

/// A typed, JSON-payload event fanned out after its originating transaction
/// commits. Matches `EventSink::publish`'s `(kind, target,
/// payload)` shape exactly so every producer crate can hand events straight
/// to the hub through that boundary trait.
#[derive(Debug, Clone, Serialize)]
pub struct FanoutEvent {
    pub kind: String,
    pub target: Option<Id>,
    pub payload: Value,
}

impl FanoutEvent {
    /// `guild_id` isn't part of `EventSink::publish`'s signature, so guild
    /// scoping reads it out of the payload when a producer included one —
    /// every guild-scoped event in this codebase does (see each
    /// `sink.publish(..., json!({"guild_id": ...}))` call site).
    fn payload_guild_id(&self) -> Option<Id> {
        self.payload.get("guild_id")?.as_str()?.parse().ok()
    }

    pub fn matches(&self, filter: &SubscriberFilter) -> bool {
        if let (Some(target), Some(wanted)) = (&self.target, &filter.target_ids) {
            if !wanted.contains(target) {
                return false;
            }
        }
        if let Some(wanted) = &filter.guild_ids {
            match self.payload_guild_id() {
                Some(guild) if wanted.contains(&guild) => {}
                Some(_) => return false,
                // An event with no guild scope at all is treated as global,
                // not filtered out by a guild-scoped subscription.
                None => {}
            }
        }
        true
    }
}

/// Forces a client to refetch state after the hub dropped messages for it
/// (backpressure).
pub const SYNC_RESET_KIND: &str = "sync.reset";
