use crate::types::*;
use engagement_common::{BlockChecker, EngagementError, Id, Result};
use engagement_store::{AtomicBatch, RecordStore};

pub const TABLE_GUILDS: &str = "guilds";
pub const TABLE_ALLIANCES: &str = "alliances";
pub const TABLE_ADVENTURES: &str = "adventures";
pub const TABLE_EVENTS: &str = "events";
pub const TABLE_RIDESHARES: &str = "rideshares";
pub const TABLE_ROLES: &str = "roles";
pub const TABLE_SEGMENTS: &str = "segments";
pub const TABLE_FORUMS: &str = "forums";

const EDGE_MEMBER_OF: &str = "member_of";
const EDGE_RESPONSIBLE_FOR: &str = "responsible_for";
const EDGE_INVITED_TO: &str = "invited_to";
const EDGE_ADMITTED_TO: &str = "admitted_to";

/// C2 — owns the hierarchical entities and enforces the visibility
/// cascade. Generic over the store so tests run against
/// `MemoryStore` and a deployed node runs against `SledStore`.
#[derive(Clone)]
pub struct EngagementGraph<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> EngagementGraph<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn create_guild(&self, guild: Guild) -> Result<()> {
        self.store.insert_unique(TABLE_GUILDS, guild.id.clone(), &guild)
    }

    pub fn join_guild(&self, user: &Id, guild: &Id) -> Result<()> {
        self.store.add_edge(user, EDGE_MEMBER_OF, guild)
    }

    pub fn set_guild_owner(&self, user: &Id, guild: &Id) -> Result<()> {
        self.store.add_edge(user, EDGE_RESPONSIBLE_FOR, guild)
    }

    pub fn propose_alliance(&self, a: &Id, b: &Id) -> Result<Alliance> {
        let alliance = Alliance {
            id: Id::new("alliance", format!("{}-{}", a.local(), b.local())),
            guild_a: a.clone(),
            guild_b: b.clone(),
            status: AllianceStatus::Pending,
        };
        self.store
            .insert_unique(TABLE_ALLIANCES, alliance.id.clone(), &alliance)?;
        Ok(alliance)
    }

    pub fn activate_alliance(&self, alliance_id: &Id) -> Result<()> {
        let mut alliance: Alliance = self.store.get(TABLE_ALLIANCES, alliance_id)?;
        alliance.status = AllianceStatus::Active;
        self.store.put(TABLE_ALLIANCES, alliance_id.clone(), &alliance)
    }

    /// Rejects if `adventure_id` is set and `e.visibility` is less
    /// restrictive than the parent Adventure's.
    pub fn create_event(&self, event: Event) -> Result<()> {
        if let Some(adventure_id) = &event.adventure_id {
            let adventure: Adventure = self
                .store
                .get(TABLE_ADVENTURES, adventure_id)
                .map_err(|e| e.context("failed to load parent adventure"))?;
            if event.visibility < adventure.visibility {
                return Err(EngagementError::Validation(format!(
                    "event visibility {:?} is less restrictive than parent adventure visibility {:?}",
                    event.visibility, adventure.visibility
                )));
            }
        }
        self.store.insert_unique(TABLE_EVENTS, event.id.clone(), &event)
    }

    /// Rejects unless exactly one of `event_id`/`adventure_id` is set.
    pub fn create_rideshare(&self, rideshare: Rideshare) -> Result<()> {
        if !rideshare.has_exactly_one_parent() {
            return Err(EngagementError::Validation(
                "rideshare must have exactly one of event_id or adventure_id".to_string(),
            ));
        }
        self.store
            .insert_unique(TABLE_RIDESHARES, rideshare.id.clone(), &rideshare)
    }

    /// Created lazily on first access; inherits the parent's visibility.
    pub fn get_or_create_forum(&self, parent: ForumParent) -> Result<Forum> {
        let (parent_id, visibility) = match &parent {
            ForumParent::Adventure(id) => {
                let adventure: Adventure = self.store.get(TABLE_ADVENTURES, id)?;
                (id.clone(), adventure.visibility)
            }
            ForumParent::Event(id) => {
                let event: Event = self.store.get(TABLE_EVENTS, id)?;
                (id.clone(), event.visibility)
            }
        };
        let forum_id = Id::new("forum", parent_id.local());
        if let Some(forum) = self.store.get_opt::<Forum>(TABLE_FORUMS, &forum_id)? {
            return Ok(forum);
        }
        let forum = Forum {
            id: forum_id.clone(),
            parent,
            visibility,
        };
        self.store.insert_unique(TABLE_FORUMS, forum_id, &forum)?;
        Ok(forum)
    }

    pub fn invite_user(&self, user: &Id, target: &Id) -> Result<()> {
        self.store.add_edge(user, EDGE_INVITED_TO, target)
    }

    pub fn admit_user(&self, user: &Id, target: &Id) -> Result<()> {
        self.store.add_edge(user, EDGE_ADMITTED_TO, target)
    }

    fn user_is_invited_or_admitted(&self, user: &Id, target: &Id) -> Result<bool> {
        Ok(self
            .store
            .edges_from(user, EDGE_INVITED_TO)?
            .contains(target)
            || self
                .store
                .edges_from(user, EDGE_ADMITTED_TO)?
                .contains(target))
    }

    fn shares_guild(&self, user: &Id, target_guild: &Id) -> Result<bool> {
        let user_guilds = self.store.edges_from(user, EDGE_MEMBER_OF)?;
        if user_guilds.contains(target_guild) {
            return Ok(true);
        }
        let alliances: Vec<Alliance> = self.store.scan(TABLE_ALLIANCES, |a: &Alliance| {
            a.status == AllianceStatus::Active
        })?;
        for guild in &user_guilds {
            let allied = alliances.iter().any(|a| {
                (&a.guild_a == guild && &a.guild_b == target_guild)
                    || (&a.guild_b == guild && &a.guild_a == target_guild)
            });
            if allied {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn organizer_did(&self, organizer: &Organizer, user: &Id) -> Result<bool> {
        match organizer {
            Organizer::User(owner) => Ok(owner == user),
            Organizer::Guild(guild) => Ok(self
                .store
                .edges_from(user, EDGE_RESPONSIBLE_FOR)?
                .contains(guild)),
        }
    }

    fn organizer_id_for_block_check<'a>(&self, organizer: &'a Organizer) -> Option<&'a Id> {
        match organizer {
            Organizer::User(id) => Some(id),
            Organizer::Guild(_) => None,
        }
    }

    /// Determines visibility for a node identified by its `Id`. Dispatches
    /// on `Id::kind()` since the store is untyped; walks to the parent
    /// first (Event -> Adventure, Rideshare -> Event|Adventure) per
    /// step 1, then applies the node's own visibility rule,
    /// then the block check.
    pub fn can_view(&self, user: &Id, node: &Id, blocks: &dyn BlockChecker) -> Result<bool> {
        match node.kind() {
            "guild" => {
                let guild: Guild = self.store.get(TABLE_GUILDS, node)?;
                Ok(match guild.visibility {
                    GuildVisibility::Public => true,
                    GuildVisibility::Private => guild.members.contains(user),
                })
            }
            "adventure" => {
                let adventure: Adventure = self.store.get(TABLE_ADVENTURES, node)?;
                if let Some(organizer_user) = self.organizer_id_for_block_check(&adventure.organizer) {
                    if blocks.is_blocked(user, organizer_user)? {
                        return Ok(false);
                    }
                }
                self.check_visibility(user, node, adventure.visibility, &adventure.organizer, adventure.guild_id.as_ref())
            }
            "event" => {
                let event: Event = self.store.get(TABLE_EVENTS, node)?;
                if let Some(adventure_id) = &event.adventure_id {
                    if !self.can_view(user, adventure_id, blocks)? {
                        return Ok(false);
                    }
                }
                if let Some(organizer_user) = self.organizer_id_for_block_check(&event.organizer) {
                    if blocks.is_blocked(user, organizer_user)? {
                        return Ok(false);
                    }
                }
                self.check_visibility(user, node, event.visibility, &event.organizer, event.guild_id.as_ref())
            }
            "rideshare" => {
                let rideshare: Rideshare = self.store.get(TABLE_RIDESHARES, node)?;
                let parent = rideshare
                    .event_id
                    .as_ref()
                    .or(rideshare.adventure_id.as_ref())
                    .ok_or_else(|| {
                        EngagementError::Fatal(format!(
                            "rideshare {node} slipped past the single-parent invariant"
                        ))
                    })?;
                self.can_view(user, parent, blocks)
            }
            "forum" => {
                let forum: Forum = self.store.get(TABLE_FORUMS, node)?;
                let parent_id = match &forum.parent {
                    ForumParent::Adventure(id) | ForumParent::Event(id) => id,
                };
                self.can_view(user, parent_id, blocks)
            }
            other => Err(EngagementError::Validation(format!(
                "unknown node kind `{other}` for id {node}"
            ))),
        }
    }

    fn check_visibility(
        &self,
        user: &Id,
        node: &Id,
        visibility: Visibility,
        organizer: &Organizer,
        guild_id: Option<&Id>,
    ) -> Result<bool> {
        match visibility {
            Visibility::Public => Ok(true),
            Visibility::Guilds => match guild_id {
                Some(guild) => self.shares_guild(user, guild),
                None => Ok(false),
            },
            Visibility::InviteOnly => self.user_is_invited_or_admitted(user, node),
            Visibility::Private => self.organizer_did(organizer, user),
        }
    }

    pub fn add_role(&self, role: Role) -> Result<()> {
        self.store.insert_unique(TABLE_ROLES, role.id.clone(), &role)
    }

    pub fn roles_for(&self, owner_id: &Id) -> Result<Vec<Role>> {
        let owner = owner_id.clone();
        self.store.scan(TABLE_ROLES, move |r: &Role| r.owner_id == owner)
    }

    /// Fills one slot of `role_id`, failing with `CapacityExceeded` if the
    /// role has no remaining slots ("Role slots").
    pub fn fill_role_slot(&self, role_id: &Id) -> Result<()> {
        let mut role: Role = self.store.get(TABLE_ROLES, role_id)?;
        if !role.has_capacity() {
            return Err(EngagementError::CapacityExceeded);
        }
        role.filled_slots += 1;
        self.store.put(TABLE_ROLES, role_id.clone(), &role)
    }

    pub fn release_role_slot(&self, role_id: &Id) -> Result<()> {
        let mut role: Role = self.store.get(TABLE_ROLES, role_id)?;
        role.filled_slots = role.filled_slots.saturating_sub(1);
        self.store.put(TABLE_ROLES, role_id.clone(), &role)
    }

    pub fn get_adventure(&self, id: &Id) -> Result<Adventure> {
        self.store.get(TABLE_ADVENTURES, id)
    }

    pub fn get_event(&self, id: &Id) -> Result<Event> {
        self.store.get(TABLE_EVENTS, id)
    }

    pub fn put_event(&self, event: &Event) -> Result<()> {
        self.store.put(TABLE_EVENTS, event.id.clone(), event)
    }

    pub fn create_adventure(&self, adventure: Adventure) -> Result<()> {
        self.store
            .insert_unique(TABLE_ADVENTURES, adventure.id.clone(), &adventure)
    }

    pub fn stage_event_update(&self, batch: &mut AtomicBatch, event: &Event) -> Result<()> {
        batch.put(TABLE_EVENTS, event.id.clone(), event)?;
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use engagement_common::NoBlocks;
    use engagement_store::MemoryStore;

    fn sample_adventure(id: &str, visibility: Visibility) -> Adventure {
        Adventure {
            id: Id::new("adventure", id),
            title: "Road Trip".into(),
            start_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
            status: LifecycleStatus::Planning,
            visibility,
            organizer: Organizer::User(Id::new("user", "organizer")),
            guild_id: None,
            values_questions: vec![],
            forum_id: None,
        }
    }

    fn sample_event(id: &str, adventure_id: Option<Id>, visibility: Visibility) -> Event {
        Event {
            id: Id::new("event", id),
            adventure_id,
            order_in_adventure: None,
            guild_id: None,
            template: None,
            visibility,
            location: Location::Virtual { url: "x".into() },
            start_time: Utc::now(),
            end_time: None,
            capacity: Some(10),
            waitlist_enabled: true,
            values_required: false,
            values_questions: vec![],
            auto_approve_aligned: false,
            yikes_threshold: 2,
            is_support_event: false,
            requires_confirmation: false,
            confirmation_deadline: None,
            completion_verified: false,
            confirmed_count: 0,
            organizer: Organizer::User(Id::new("user", "organizer")),
            status: LifecycleStatus::Planning,
            forum_id: None,
        }
    }

    #[test]
    fn create_event_rejects_less_restrictive_than_parent() {
        let graph = EngagementGraph::new(MemoryStore::new());
        let adventure = sample_adventure("a1", Visibility::Private);
        graph.create_adventure(adventure.clone()).unwrap();
        let event = sample_event("e1", Some(adventure.id.clone()), Visibility::Public);
        let err = graph.create_event(event).unwrap_err();
        assert!(matches!(err, EngagementError::Validation(_)));
    }

    #[test]
    fn create_event_allows_equal_or_more_restrictive() {
        let graph = EngagementGraph::new(MemoryStore::new());
        let adventure = sample_adventure("a1", Visibility::Guilds);
        graph.create_adventure(adventure.clone()).unwrap();
        let event = sample_event("e1", Some(adventure.id.clone()), Visibility::Private);
        assert!(graph.create_event(event).is_ok());
    }

    #[test]
    fn can_view_private_only_for_organizer() {
        let graph = EngagementGraph::new(MemoryStore::new());
        let event = sample_event("e1", None, Visibility::Private);
        graph.create_event(event.clone()).unwrap();
        let organizer = Id::new("user", "organizer");
        let stranger = Id::new("user", "stranger");
        assert!(graph.can_view(&organizer, &event.id, &NoBlocks).unwrap());
        assert!(!graph.can_view(&stranger, &event.id, &NoBlocks).unwrap());
    }

    #[test]
    fn can_view_cascades_through_parent_adventure() {
        let graph = EngagementGraph::new(MemoryStore::new());
        let adventure = sample_adventure("a1", Visibility::Private);
        graph.create_adventure(adventure.clone()).unwrap();
        let event = sample_event("e1", Some(adventure.id.clone()), Visibility::Private);
        graph.create_event(event.clone()).unwrap();
        let stranger = Id::new("user", "stranger");
        // Even though the event itself is private, visibility must also
        // hold for the parent adventure; here both fail for a stranger.
        assert!(!graph.can_view(&stranger, &event.id, &NoBlocks).unwrap());
    }

    #[test]
    fn rideshare_create_rejects_two_parents() {
        let graph = EngagementGraph::new(MemoryStore::new());
        let rideshare = Rideshare {
            id: Id::new("rideshare", "r1"),
            event_id: Some(Id::new("event", "e1")),
            adventure_id: Some(Id::new("adventure", "a1")),
            organizer: Organizer::User(Id::new("user", "organizer")),
        };
        assert!(graph.create_rideshare(rideshare).is_err());
    }

    #[test]
    fn role_slot_respects_capacity() {
        let graph = EngagementGraph::new(MemoryStore::new());
        let role = Role {
            id: Id::new("role", "r1"),
            owner_id: Id::new("event", "e1"),
            name: "driver".into(),
            max_slots: 1,
            filled_slots: 0,
            is_default: false,
            sort_order: 0,
            suggested_interests: vec![],
            catalog_id: None,
        };
        graph.add_role(role.clone()).unwrap();
        graph.fill_role_slot(&role.id).unwrap();
        assert!(matches!(
            graph.fill_role_slot(&role.id).unwrap_err(),
            EngagementError::CapacityExceeded
        ));
    }
}
