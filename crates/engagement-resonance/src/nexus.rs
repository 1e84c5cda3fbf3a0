use engagement_common::Id;
use std::collections::HashSet;

/// One guild's 30-day activity snapshot for a single user, gathered by the
/// `NexusMonthly` job from C2/C3 data. Kept as a plain struct so the Nexus
/// formula itself (this module) stays free of any C2/C3 dependency — the
/// scheduler crate does the querying and hands in the numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct GuildActivity {
    pub guild_id: Id,
    /// `A` — members active in the last 30 days.
    pub active_members: u32,
    /// `E` — verified events in the last 30 days.
    pub verified_events: u32,
    /// The user's own verified completions in this guild, last 30 days.
    pub user_verified_completions: u32,
    /// Ids of members counted in `active_members`, used to compute the
    /// cross-guild overlap `O` for the bridge term.
    pub active_member_ids: HashSet<Id>,
}

impl GuildActivity {
    fn is_active(&self) -> bool {
        self.verified_events >= 2 && self.active_members >= 3
    }

    /// `af = min(1, user_verified_completions / 3)`.
    fn activity_factor(&self) -> f64 {
        (self.user_verified_completions as f64 / 3.0).min(1.0)
    }

    fn contribution(&self) -> u32 {
        if !self.is_active() {
            return 0;
        }
        let value = 5.0 * (1.0 + self.active_members as f64).log2() * self.activity_factor();
        value.round() as u32
    }
}

/// `nexus_total = min(200, Σ contribution + Σ bridge)`.
/// Guilds with fewer than 2 verified events or 3 active members in the
/// last 30 days contribute nothing and are excluded from the bridge sum too
/// (an inactive guild isn't a bridge).
pub fn compute_nexus(guilds: &[GuildActivity]) -> u32 {
    let active: Vec<&GuildActivity> = guilds.iter().filter(|g| g.is_active()).collect();
    let contribution_sum: u32 = active.iter().map(|g| g.contribution()).sum();

    let mut bridge_sum: u32 = 0;
    for i in 0..active.len() {
        for j in (i + 1)..active.len() {
            let g = active[i];
            let h = active[j];
            let overlap = g.active_member_ids.intersection(&h.active_member_ids).count();
            let bridge = 2.0 * (1.0 + overlap as f64).log2() * g.activity_factor().min(h.activity_factor());
            bridge_sum += bridge.round() as u32;
        }
    }

    (contribution_sum + bridge_sum).min(200)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlap_ids(n: usize) -> HashSet<Id> {
        (0..n).map(|i| Id::new("user", format!("m{i}"))).collect()
    }

    #[test]
    fn nexus_monthly_scenario_6() {
        let shared: Vec<Id> = (0..3).map(|i| Id::new("user", format!("shared{i}"))).collect();
        let mut g1_members: HashSet<Id> = shared.iter().cloned().collect();
        g1_members.insert(Id::new("user", "g1-only"));
        let mut g2_members: HashSet<Id> = shared.iter().cloned().collect();
        g2_members.insert(Id::new("user", "g2-only"));
        g2_members.insert(Id::new("user", "g2-only-2"));

        let g1 = GuildActivity {
            guild_id: Id::new("guild", "g1"),
            active_members: 4,
            verified_events: 3,
            user_verified_completions: 2,
            active_member_ids: g1_members,
        };
        let g2 = GuildActivity {
            guild_id: Id::new("guild", "g2"),
            active_members: 5,
            verified_events: 2,
            user_verified_completions: 3,
            active_member_ids: g2_members,
        };

        assert_eq!(g1.contribution(), 8);
        assert_eq!(g2.contribution(), 13);
        assert_eq!(compute_nexus(&[g1, g2]), 24);
    }

    #[test]
    fn inactive_guild_contributes_nothing() {
        let g = GuildActivity {
            guild_id: Id::new("guild", "quiet"),
            active_members: 2,
            verified_events: 1,
            user_verified_completions: 3,
            active_member_ids: overlap_ids(2),
        };
        assert_eq!(compute_nexus(&[g]), 0);
    }

    #[test]
    fn nexus_total_caps_at_200() {
        let guilds: Vec<GuildActivity> = (0..20)
            .map(|i| GuildActivity {
                guild_id: Id::new("guild", format!("g{i}")),
                active_members: 50,
                verified_events: 10,
                user_verified_completions: 3,
                active_member_ids: overlap_ids(50),
            })
            .collect();
        assert_eq!(compute_nexus(&guilds), 200);
    }
}
