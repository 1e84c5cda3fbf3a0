use crate::types::{AdmissionStatus, AdventureAdmission, RequestedBy};
use engagement_common::{BlockChecker, EngagementError, EventSink, Id, Result};
use engagement_graph::EngagementGraph;
use engagement_store::RecordStore;
use serde_json::json;
use std::sync::Arc;

pub const TABLE_ADMISSIONS: &str = "adventure_admissions";

/// The simpler two-state counterpart to `RsvpService` for Adventure-level
/// joins (`AdventureAdmission`): `requested -> {admitted,
/// rejected}`, both terminal.
pub struct AdmissionService<S: RecordStore> {
    store: S,
    graph: EngagementGraph<S>,
    blocks: Arc<dyn BlockChecker>,
    sink: Arc<dyn EventSink>,
}

impl<S: RecordStore + Clone> AdmissionService<S> {
    pub fn new(store: S, blocks: Arc<dyn BlockChecker>, sink: Arc<dyn EventSink>) -> Self {
        let graph = EngagementGraph::new(store.clone());
        Self {
            store,
            graph,
            blocks,
            sink,
        }
    }

    pub fn request(
        &self,
        adventure_id: &Id,
        user_id: &Id,
        requested_by: RequestedBy,
        invited_by: Option<Id>,
    ) -> Result<AdventureAdmission> {
        if !self
            .graph
            .can_view(user_id, adventure_id, self.blocks.as_ref())?
        {
            return Err(EngagementError::visibility_denied());
        }
        let id = Id::new(
            "admission",
            format!("{}-{}", adventure_id.local(), user_id.local()),
        );
        if let Some(existing) = self
            .store
            .get_opt::<AdventureAdmission>(TABLE_ADMISSIONS, &id)?
        {
            return Ok(existing);
        }
        let admission = AdventureAdmission {
            id: id.clone(),
            adventure_id: adventure_id.clone(),
            user_id: user_id.clone(),
            status: AdmissionStatus::Requested,
            requested_by,
            invited_by,
            rejection_reason: None,
        };
        self.store.insert_unique(TABLE_ADMISSIONS, id, &admission)?;
        Ok(admission)
    }

    pub fn decide(
        &self,
        admission_id: &Id,
        admit: bool,
        rejection_reason: Option<String>,
    ) -> Result<AdventureAdmission> {
        let mut admission: AdventureAdmission = self.store.get(TABLE_ADMISSIONS, admission_id)?;
        if admission.status != AdmissionStatus::Requested {
            return Err(EngagementError::Validation(format!(
                "admission {admission_id} already decided as {:?}",
                admission.status
            )));
        }
        admission.status = if admit {
            AdmissionStatus::Admitted
        } else {
            AdmissionStatus::Rejected
        };
        admission.rejection_reason = rejection_reason;
        self.store
            .put(TABLE_ADMISSIONS, admission.id.clone(), &admission)?;
        if admit {
            self.sink.publish(
                "adventure.joined",
                Some(admission.user_id.clone()),
                json!({
                    "adventure_id": admission.adventure_id.as_str(),
                    "user_id": admission.user_id.as_str(),
                }),
            );
        }
        Ok(admission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use engagement_common::NoBlocks;
    use engagement_common::NoSink;
    use engagement_graph::{Adventure, LifecycleStatus, Organizer, Visibility};
    use engagement_store::MemoryStore;

    fn sample_adventure() -> Adventure {
        Adventure {
            id: Id::new("adventure", "a1"),
            title: "Road Trip".into(),
            start_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
            status: LifecycleStatus::Planning,
            visibility: Visibility::Public,
            organizer: Organizer::User(Id::new("user", "organizer")),
            guild_id: None,
            values_questions: vec![],
            forum_id: None,
        }
    }

    fn service() -> AdmissionService<MemoryStore> {
        let store = MemoryStore::new();
        let graph = EngagementGraph::new(store.clone());
        graph.create_adventure(sample_adventure()).unwrap();
        AdmissionService::new(store, Arc::new(NoBlocks), Arc::new(NoSink))
    }

    #[test]
    fn request_then_request_again_is_idempotent() {
        let svc = service();
        let a = svc
            .request(
                &Id::new("adventure", "a1"),
                &Id::new("user", "maya"),
                RequestedBy::SelfRequested,
                None,
            )
            .unwrap();
        let b = svc
            .request(
                &Id::new("adventure", "a1"),
                &Id::new("user", "maya"),
                RequestedBy::SelfRequested,
                None,
            )
            .unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn decide_admit_transitions_and_cannot_redecide() {
        let svc = service();
        let admission = svc
            .request(
                &Id::new("adventure", "a1"),
                &Id::new("user", "maya"),
                RequestedBy::SelfRequested,
                None,
            )
            .unwrap();
        let decided = svc.decide(&admission.id, true, None).unwrap();
        assert_eq!(decided.status, AdmissionStatus::Admitted);
        assert!(svc.decide(&admission.id, false, None).is_err());
    }
}
