//! Server-sent-event subscriptions for live notifications and report snapshots.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::{Stream, StreamExt};
use reqwest_eventsource::{Error as EventSourceError, Event, RequestBuilderExt};
use shared::protocol::{Notification, PageOrList};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

use crate::{error::ClientError, ApiClient, ClientResult};

pub const NOTIFICATIONS_STREAM_PATH: &str = "/notificacoes/stream";

/// Live report feeds published under `/relatorios`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStream {
    Analytics,
    Occupancy,
    Movements,
    Maintenance,
}

impl ReportStream {
    pub fn path(self) -> &'static str {
        match self {
            Self::Analytics => "/relatorios/analytics/stream",
            Self::Occupancy => "/relatorios/ocupacao/stream",
            Self::Movements => "/relatorios/movimentacao/stream",
            Self::Maintenance => "/relatorios/manutencao/stream",
        }
    }
}

/// Decoded events of one SSE connection. Dropping it aborts the reader task and
/// closes the connection. The connection is not re-opened after an error.
pub struct EventSubscription<T> {
    events: UnboundedReceiverStream<ClientResult<T>>,
    task: JoinHandle<()>,
}

impl<T> Unpin for EventSubscription<T> {}

impl<T> Stream for EventSubscription<T> {
    type Item = ClientResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().events).poll_next(cx)
    }
}

impl<T> Drop for EventSubscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl ApiClient {
    /// Each event carries the current notification page.
    pub fn subscribe_notifications(&self) -> ClientResult<EventSubscription<Vec<Notification>>> {
        self.subscribe(NOTIFICATIONS_STREAM_PATH, |data| {
            let page: PageOrList<Notification> = serde_json::from_str(data)?;
            Ok(page.into_items())
        })
    }

    pub fn subscribe_analytics(&self) -> ClientResult<EventSubscription<serde_json::Value>> {
        self.subscribe_report(ReportStream::Analytics)
    }

    pub fn subscribe_report(
        &self,
        report: ReportStream,
    ) -> ClientResult<EventSubscription<serde_json::Value>> {
        self.subscribe(report.path(), |data| Ok(serde_json::from_str(data)?))
    }

    fn subscribe<T, F>(&self, path: &str, decode: F) -> ClientResult<EventSubscription<T>>
    where
        T: Send + 'static,
        F: Fn(&str) -> ClientResult<T> + Send + 'static,
    {
        let url = self.endpoint(path);
        let mut source = self
            .stream_http()
            .get(&url)
            .eventsource()
            .map_err(|err| ClientError::Stream(err.to_string()))?;
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => info!(url = %url, "stream: connected"),
                    Ok(Event::Message(message)) => {
                        if message.event != "message" {
                            debug!(url = %url, event = %message.event, "stream: ignoring named event");
                            continue;
                        }
                        if tx.send(decode(&message.data)).is_err() {
                            break;
                        }
                    }
                    Err(EventSourceError::StreamEnded) => {
                        debug!(url = %url, "stream: ended by server");
                        break;
                    }
                    Err(err) => {
                        warn!(url = %url, error = %err, "stream: connection failed");
                        let _ = tx.send(Err(ClientError::Stream(err.to_string())));
                        break;
                    }
                }
            }
            source.close();
        });

        Ok(EventSubscription {
            events: UnboundedReceiverStream::new(rx),
            task,
        })
    }
}
