use engagement_compat::CompatEngine;
use engagement_fanout::Hub;
use engagement_graph::EngagementGraph;
use engagement_resonance::ResonanceLedger;
use engagement_rsvp::{AdmissionService, RsvpService};
use engagement_store::RecordStore;
use engagement_trust::TrustService;
use engagement_voting::VotingService;
use std::sync::Arc;

/// Everything a handler needs, generic over the store backend the
/// composition root (`engagement-node`) chose. Cloning is cheap: every
/// field is an `Arc`.
pub struct AppState<S: RecordStore> {
    pub graph: Arc<EngagementGraph<S>>,
    pub rsvp: Arc<RsvpService<S>>,
    pub admission: Arc<AdmissionService<S>>,
    pub compat: Arc<CompatEngine<S>>,
    pub resonance: Arc<ResonanceLedger<S>>,
    pub trust: Arc<TrustService<S>>,
    pub voting: Arc<VotingService<S>>,
    pub fanout: Arc<Hub>,
}

impl<S: RecordStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            rsvp: self.rsvp.clone(),
            admission: self.admission.clone(),
            compat: self.compat.clone(),
            resonance: self.resonance.clone(),
            trust: self.trust.clone(),
            voting: self.voting.clone(),
            fanout: self.fanout.clone(),
        }
    }
}
