use engagement_api::AppState;
use engagement_common::{AlwaysAnchored, SystemClock};
use engagement_compat::CompatEngine;
use engagement_fanout::Hub;
use engagement_graph::EngagementGraph;
use engagement_resonance::ResonanceLedger;
use engagement_rsvp::{AdmissionService, RsvpService};
use engagement_store::Store;
use engagement_trust::TrustService;
use engagement_voting::VotingService;
use std::sync::Arc;

/// Everything the scheduler's jobs and the HTTP router need, built once at
/// startup from a single store handle (every component is
/// generic over C1, wired together here rather than inside any crate).
pub struct Services {
    pub graph: Arc<EngagementGraph<Store>>,
    pub rsvp: Arc<RsvpService<Store>>,
    pub admission: Arc<AdmissionService<Store>>,
    pub compat: Arc<CompatEngine<Store>>,
    pub resonance: Arc<ResonanceLedger<Store>>,
    pub trust: Arc<TrustService<Store>>,
    pub voting: Arc<VotingService<Store>>,
    pub fanout: Arc<Hub>,
    pub store: Store,
}

impl Services {
    pub fn new(store: Store, fanout_mailbox_capacity: usize) -> Self {
        let clock = Arc::new(SystemClock);
        let fanout = Arc::new(Hub::new(fanout_mailbox_capacity));

        let trust = Arc::new(TrustService::new(store.clone(), Arc::new(AlwaysAnchored), clock.clone()));
        let compat = Arc::new(CompatEngine::new(store.clone(), trust.clone(), fanout.clone(), clock.clone()));
        let resonance = Arc::new(ResonanceLedger::new(store.clone(), fanout.clone(), clock.clone()));
        let graph = Arc::new(EngagementGraph::new(store.clone()));
        let rsvp = Arc::new(RsvpService::new(
            store.clone(),
            trust.clone(),
            compat.clone(),
            fanout.clone(),
            resonance.clone(),
            clock.clone(),
        ));
        let admission = Arc::new(AdmissionService::new(store.clone(), trust.clone(), fanout.clone()));
        let voting = Arc::new(VotingService::new(store.clone(), fanout.clone(), clock.clone()));

        Self { graph, rsvp, admission, compat, resonance, trust, voting, fanout, store }
    }

    pub fn app_state(&self) -> AppState<Store> {
        AppState {
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
