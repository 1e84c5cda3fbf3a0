use engagement_common::{Id, Result};
use engagement_graph::graph::{TABLE_EVENTS, TABLE_GUILDS};
use engagement_graph::{Event, Guild, LifecycleStatus};
use engagement_resonance::{compute_nexus, GuildActivity, ResonanceLedger};
use engagement_rsvp::service::TABLE_RSVPS;
use engagement_rsvp::{RsvpStatus, UnifiedRsvp};
use engagement_store::{RecordStore, Store};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// `NexusMonthly`: gathers each guild's 30-day activity
/// snapshot per active user from C2 (membership/events) and C3 (verified
/// completions), then runs [`compute_nexus`] and awards through C5. Kept
/// out of `engagement-scheduler`/`engagement-resonance` so those crates
/// stay free of direct C2/C3 dependencies (the Nexus formula
/// module takes plain numbers, not store handles).
pub fn run(store: &Store, resonance: &Arc<ResonanceLedger<Store>>) -> Result<u32> {
    let now = chrono::Utc::now();
    let cutoff = now - chrono::Duration::days(30);
    let month = now.format("%Y-%m").to_string();

    let guilds: Vec<Guild> = store.scan(TABLE_GUILDS, |_: &Guild| true)?;
    let events: Vec<Event> = store.scan(TABLE_EVENTS, |e: &Event| {
        e.completion_verified && e.status == LifecycleStatus::Completed && e.start_time >= cutoff
    })?;
    let rsvps: Vec<UnifiedRsvp> =
        store.scan(TABLE_RSVPS, |r: &UnifiedRsvp| r.status != RsvpStatus::Cancelled && r.created_on >= cutoff)?;

    let mut events_by_guild: HashMap<Id, Vec<&Event>> = HashMap::new();
    for event in &events {
        if let Some(guild_id) = &event.guild_id {
            events_by_guild.entry(guild_id.clone()).or_default().push(event);
        }
    }

    let active_users: HashSet<Id> = rsvps.iter().map(|r| r.user_id.clone()).collect();

    let mut completions_by_user_guild: HashMap<(Id, Id), u32> = HashMap::new();
    for rsvp in &rsvps {
        if rsvp.completion_confirmed.is_none() {
            continue;
        }
        let Some(event) = events.iter().find(|e| e.id == rsvp.target_id) else { continue };
        let Some(guild_id) = &event.guild_id else { continue };
        *completions_by_user_guild.entry((rsvp.user_id.clone(), guild_id.clone())).or_insert(0) += 1;
    }

    let mut awarded = 0u32;
    for user_id in &active_users {
        let mut snapshots = Vec::new();
        for guild in &guilds {
            if !guild.members.contains(user_id) {
                continue;
            }
            let guild_events = events_by_guild.get(&guild.id).map(|v| v.len() as u32).unwrap_or(0);
            let user_completions =
                completions_by_user_guild.get(&(user_id.clone(), guild.id.clone())).copied().unwrap_or(0);
            let active_member_ids: HashSet<Id> =
                guild.members.iter().filter(|m| active_users.contains(*m)).cloned().collect();
            snapshots.push(GuildActivity {
                guild_id: guild.id.clone(),
                active_members: active_member_ids.len() as u32,
                verified_events: guild_events,
                user_verified_completions: user_completions,
                active_member_ids,
            });
        }
        if snapshots.is_empty() {
            continue;
        }
        let total = compute_nexus(&snapshots);
        if resonance.award_nexus(user_id, total, &month)? {
            awarded += 1;
        }
    }

    Ok(awarded)
}
