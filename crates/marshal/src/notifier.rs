//! Real-time lifecycle event fan-out.
//!
//! A single process-wide broadcast channel carries every lifecycle event;
//! each WebSocket subscriber filters on its (division, channel) pair.
//! Delivery is best-effort: a subscriber that falls behind the channel
//! capacity drops the oldest events and keeps going.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Capacity of the broadcast ring buffer, per process.
const EVENT_BUFFER: usize = 256;

/// Audience channel an event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    Judging,
    Field,
    PitAdmin,
    AudienceDisplay,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Judging => write!(f, "judging"),
            Channel::Field => write!(f, "field"),
            Channel::PitAdmin => write!(f, "pit-admin"),
            Channel::AudienceDisplay => write!(f, "audience-display"),
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "judging" => Ok(Channel::Judging),
            "field" => Ok(Channel::Field),
            "pit-admin" => Ok(Channel::PitAdmin),
            "audience-display" => Ok(Channel::AudienceDisplay),
            other => Err(format!("unknown channel: {other}")),
        }
    }
}

/// One lifecycle event as delivered to subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    pub division_id: Uuid,
    pub channel: Channel,
    pub name: &'static str,
    pub payload: serde_json::Value,
}

impl LifecycleEvent {
    pub fn new(
        division_id: Uuid,
        channel: Channel,
        name: &'static str,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            division_id,
            channel,
            name,
            payload,
        }
    }

    /// Whether a subscriber on (division, channel) should receive this event.
    pub fn matches(&self, division_id: Uuid, channel: Channel) -> bool {
        self.division_id == division_id && self.channel == channel
    }
}

/// Process-wide event hub.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(EVENT_BUFFER)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. A send error only means nobody is listening.
    pub fn publish(&self, event: LifecycleEvent) {
        let name = event.name;
        let channel = event.channel;
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(%channel, name, receivers, "lifecycle event published");
            }
            Err(_) => {
                tracing::debug!(%channel, name, "lifecycle event dropped, no subscribers");
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscribeQuery {
    pub channel: String,
}

/// GET /api/events/{division_id}/ws?channel=...
///
/// Upgrade to a WebSocket and forward matching lifecycle events as JSON
/// text frames.
pub async fn ws_handler(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
    Query(query): Query<SubscribeQuery>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    let channel: Channel = query.channel.parse().map_err(ApiError::Validation)?;
    let rx = state.notifier.subscribe();

    Ok(ws.on_upgrade(move |socket| forward_events(socket, rx, division_id, channel)))
}

async fn forward_events(
    mut socket: WebSocket,
    mut rx: broadcast::Receiver<LifecycleEvent>,
    division_id: Uuid,
    channel: Channel,
) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if !event.matches(division_id, channel) {
                    continue;
                }
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("failed to serialize lifecycle event: {:?}", e);
                        continue;
                    }
                };
                // A failed send means the client disconnected.
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(
                    skipped,
                    %channel,
                    "websocket subscriber lagged, events dropped"
                );
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(division_id: Uuid, channel: Channel, name: &'static str) -> LifecycleEvent {
        LifecycleEvent::new(division_id, channel, name, json!({}))
    }

    #[tokio::test]
    async fn subscribers_receive_published_events_in_order() {
        let notifier = Notifier::new(8);
        let mut rx = notifier.subscribe();
        let division = Uuid::new_v4();

        notifier.publish(event(division, Channel::Judging, "sessionStarted"));
        notifier.publish(event(division, Channel::Judging, "sessionCompleted"));

        assert_eq!(rx.recv().await.unwrap().name, "sessionStarted");
        assert_eq!(rx.recv().await.unwrap().name, "sessionCompleted");
    }

    #[tokio::test]
    async fn filter_rejects_other_divisions_and_channels() {
        let division = Uuid::new_v4();
        let other = Uuid::new_v4();
        let e = event(division, Channel::Field, "matchStarted");

        assert!(e.matches(division, Channel::Field));
        assert!(!e.matches(other, Channel::Field));
        assert!(!e.matches(division, Channel::Judging));
    }

    #[tokio::test]
    async fn lagged_subscriber_drops_oldest_events() {
        let notifier = Notifier::new(2);
        let mut rx = notifier.subscribe();
        let division = Uuid::new_v4();

        notifier.publish(event(division, Channel::PitAdmin, "ticketCreated"));
        notifier.publish(event(division, Channel::PitAdmin, "ticketUpdated"));
        notifier.publish(event(division, Channel::PitAdmin, "teamRegistered"));

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(rx.recv().await.unwrap().name, "ticketUpdated");
        assert_eq!(rx.recv().await.unwrap().name, "teamRegistered");
    }

    #[test]
    fn event_serializes_camel_case() {
        let division = Uuid::new_v4();
        let e = event(division, Channel::AudienceDisplay, "stateUpdated");
        let value = serde_json::to_value(&e).unwrap();
        assert_eq!(value["divisionId"], json!(division.to_string()));
        assert_eq!(value["channel"], json!("audience-display"));
        assert_eq!(value["name"], json!("stateUpdated"));
    }

    #[test]
    fn channel_parses_wire_strings() {
        assert_eq!("judging".parse::<Channel>().unwrap(), Channel::Judging);
        assert_eq!("pit-admin".parse::<Channel>().unwrap(), Channel::PitAdmin);
        assert!("backstage".parse::<Channel>().is_err());
    }
}
