//! Server-sent change feed.

use std::convert::Infallible;
use std::future::ready;

use axum::Router;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use futures::{Stream, StreamExt};
use gastro_core::RestaurantId;
use gastro_service::ChangeEvent;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::extract::CurrentTenant;
use crate::state::AppState;

/// SSE event name of a change.
const CHANGE_EVENT: &str = "change";

/// SSE event name sent after events were dropped; clients reload everything.
const RESYNC_EVENT: &str = "resync";

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/events", get(events))
}

async fn events(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(restaurant = %tenant.restaurant, "Change feed opened");
    let stream = change_stream(
        BroadcastStream::new(state.office.events().subscribe()),
        tenant.restaurant,
    );
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// The restaurant's changes as SSE events.
fn change_stream(
    changes: BroadcastStream<ChangeEvent>,
    restaurant: RestaurantId,
) -> impl Stream<Item = Result<Event, Infallible>> {
    changes.filter_map(move |item| {
        let event = match item {
            Ok(change) if change.restaurant_id == restaurant => change_event(&change),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(%restaurant, skipped, "Change feed lagged");
                Some(Event::default().event(RESYNC_EVENT).data(skipped.to_string()))
            }
        };
        ready(event.map(Ok))
    })
}

fn change_event(change: &ChangeEvent) -> Option<Event> {
    match Event::default().event(CHANGE_EVENT).json_data(change) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::error!(error = %e, "Change not serializable");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gastro_service::{ChangeKind, EventBus};

    fn change(restaurant: RestaurantId) -> ChangeEvent {
        ChangeEvent {
            restaurant_id: restaurant,
            kind: ChangeKind::SettingsChanged,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_stream_keeps_own_restaurant_only() {
        let bus = EventBus::new(8);
        let mine = RestaurantId::new();
        let stream = change_stream(BroadcastStream::new(bus.subscribe()), mine);
        futures::pin_mut!(stream);

        bus.publish(change(RestaurantId::new()));
        bus.publish(change(mine));
        drop(bus);

        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_gets_resync() {
        let bus = EventBus::new(1);
        let mine = RestaurantId::new();
        let stream = change_stream(BroadcastStream::new(bus.subscribe()), mine);
        futures::pin_mut!(stream);

        bus.publish(change(mine));
        bus.publish(change(mine));
        bus.publish(change(mine));
        drop(bus);

        // One resync for the two dropped changes, then the last one.
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 2);
    }
}
