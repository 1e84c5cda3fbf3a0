use crate::handlers;
use crate::sse;
use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use engagement_store::RecordStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the `/v1` router. Generic over the store backend
/// so `engagement-node` can plug in `MemoryStore` or a persistent one.
pub fn router<S: RecordStore + Clone + 'static>(state: AppState<S>) -> Router {
    let v1 = Router::new()
        .route("/health", get(handlers::health))
        .route("/stream", get(sse::stream::<S>))
        .route("/events/{event_id}/rsvps", post(handlers::rsvp_submit::<S>))
        .route("/rsvps/{rsvp_id}", delete(handlers::rsvp_cancel::<S>))
        .route("/rsvps/{rsvp_id}/checkin", post(handlers::rsvp_checkin::<S>))
        .route("/rsvps/{rsvp_id}/confirm", post(handlers::rsvp_confirm::<S>))
        .route("/rsvps/{rsvp_id}/feedback", post(handlers::rsvp_feedback::<S>))
        .route("/guilds/{guild_id}/pools/{pool_id}/join", post(handlers::pool_join::<S>))
        .route("/guilds/{guild_id}/pools/{pool_id}/leave", post(handlers::pool_leave::<S>))
        .route("/compat/answers", post(handlers::answer_question::<S>))
        .route("/users/{user_id}/compatibility", get(handlers::compatibility::<S>))
        .route("/users/{user_id}/resonance", get(handlers::resonance_score::<S>))
        .route("/votes", post(handlers::create_vote::<S>))
        .route("/votes/{vote_id}/ballots", post(handlers::cast_ballot::<S>))
        .route("/votes/{vote_id}/results", get(handlers::vote_results::<S>))
        .route("/trust/ratings", post(handlers::rate_user::<S>))
        .route("/trust/ratings/{rating_id}/endorsements", post(handlers::endorse_rating::<S>))
        .route("/users/{user_id}/flags", post(handlers::flag_user::<S>))
        .route("/trust/blocks", post(handlers::block_user::<S>));

    Router::new()
        .nest("/v1", v1)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
