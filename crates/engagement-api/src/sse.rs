use crate::dto::StreamQuery;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use engagement_fanout::SubscriberFilter;
use engagement_store::RecordStore;
use futures_util::stream::Stream;
use std::collections::HashSet;
use std::convert::Infallible;

/// `GET /v1/stream`: a per-connection filtered subscription
/// to the fan-out hub, adapted into an SSE byte stream.
pub async fn stream<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let filter = SubscriberFilter {
        user_id: query.user_id,
        guild_ids: (!query.guild_ids.is_empty()).then(|| query.guild_ids.into_iter().collect::<HashSet<_>>()),
        target_ids: (!query.target_ids.is_empty()).then(|| query.target_ids.into_iter().collect::<HashSet<_>>()),
    };
    let subscription = state.fanout.subscribe(filter);
    let events = futures_util::stream::unfold(subscription, |mut sub| async move {
        let event = sub.recv().await;
        let sse_event = Event::default()
            .event(event.kind.clone())
            .json_data(&event)
            .unwrap_or_else(|_| Event::default().event("error"));
        Some((Ok(sse_event), sub))
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}
