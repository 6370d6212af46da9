use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::events::Inbound;
use crate::outbound::Outbound;
use crate::router::RelayRouter;
use crate::transport::{deliver_all, ChatTransport};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("event source failed to connect: {0}")]
    Connect(String),
    #[error("event source read failed: {0}")]
    Receive(String),
    #[error("event source disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Long-poll stream of platform updates, already decoded to [`Inbound`].
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn connect(&self) -> Result<(), SourceError>;
    async fn next_event(&self) -> Result<Option<Inbound>, SourceError>;
    async fn disconnect(&self) -> Result<(), SourceError>;
}

/// Yields nothing and closes immediately. Stands in until a real
/// platform source is wired up.
#[derive(Default)]
pub struct NoopEventSource;

#[async_trait]
impl EventSource for NoopEventSource {
    async fn connect(&self) -> Result<(), SourceError> {
        Ok(())
    }

    async fn next_event(&self) -> Result<Option<Inbound>, SourceError> {
        Ok(None)
    }

    async fn disconnect(&self) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Pumps events from an [`EventSource`] through the router and delivers
/// the resulting batch over the transport. Engine errors become a notice
/// to the sender; only source failures trigger the reconnect policy.
pub struct PollingRunner {
    source: Arc<dyn EventSource>,
    transport: Arc<dyn ChatTransport>,
    router: RelayRouter,
    reconnect_policy: ReconnectPolicy,
}

impl PollingRunner {
    pub fn new(
        source: Arc<dyn EventSource>,
        transport: Arc<dyn ChatTransport>,
        router: RelayRouter,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { source, transport, router, reconnect_policy }
    }

    pub async fn start(&mut self) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(source_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %source_error,
                        "event source failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "event source retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn connect_and_pump(&mut self, attempt: u32) -> Result<(), SourceError> {
        info!(attempt, "opening event source connection");
        self.source.connect().await?;
        info!(attempt, "event source connected");

        loop {
            let Some(event) = self.source.next_event().await? else {
                info!(attempt, "event source stream closed");
                self.source.disconnect().await?;
                return Ok(());
            };

            let sender = event.sender();
            info!(
                event_name = "ingress.chat.event_received",
                sender = sender.0,
                "received inbound event"
            );

            let batch = match self.router.handle(event).await {
                Ok(batch) => batch,
                Err(error) => {
                    warn!(
                        sender = sender.0,
                        error = %error,
                        "event rejected; replying with user-safe notice"
                    );
                    vec![Outbound::notify(sender, error.user_message())]
                }
            };

            deliver_all(self.transport.as_ref(), &batch).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use relaydesk_core::config::FanoutPolicy;
    use relaydesk_core::domain::UserId;
    use relaydesk_db::repositories::{
        InMemoryClientRepository, InMemoryMessageRepository, InMemoryOperatorRepository,
    };

    use super::{EventSource, PollingRunner, ReconnectPolicy, SourceError};
    use crate::events::{Inbound, OperatorAction};
    use crate::outbound::Outbound;
    use crate::router::RelayRouter;
    use crate::transport::{ChatTransport, TransportError};

    #[derive(Default)]
    struct ScriptedSource {
        state: Mutex<ScriptedState>,
    }

    #[derive(Default)]
    struct ScriptedState {
        connect_results: VecDeque<Result<(), SourceError>>,
        events: VecDeque<Result<Option<Inbound>, SourceError>>,
        connect_attempts: usize,
        disconnect_calls: usize,
    }

    impl ScriptedSource {
        fn with_script(
            connect_results: Vec<Result<(), SourceError>>,
            events: Vec<Result<Option<Inbound>, SourceError>>,
        ) -> Self {
            Self {
                state: Mutex::new(ScriptedState {
                    connect_results: connect_results.into(),
                    events: events.into(),
                    connect_attempts: 0,
                    disconnect_calls: 0,
                }),
            }
        }

        async fn connect_attempts(&self) -> usize {
            self.state.lock().await.connect_attempts
        }
    }

    #[async_trait]
    impl EventSource for ScriptedSource {
        async fn connect(&self) -> Result<(), SourceError> {
            let mut state = self.state.lock().await;
            state.connect_attempts += 1;
            state.connect_results.pop_front().unwrap_or(Ok(()))
        }

        async fn next_event(&self) -> Result<Option<Inbound>, SourceError> {
            let mut state = self.state.lock().await;
            state.events.pop_front().unwrap_or(Ok(None))
        }

        async fn disconnect(&self) -> Result<(), SourceError> {
            let mut state = self.state.lock().await;
            state.disconnect_calls += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        delivered: Mutex<Vec<Outbound>>,
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn deliver(&self, outbound: &Outbound) -> Result<(), TransportError> {
            self.delivered.lock().await.push(outbound.clone());
            Ok(())
        }
    }

    fn test_router() -> RelayRouter {
        RelayRouter::new(
            Arc::new(InMemoryOperatorRepository::default()),
            Arc::new(InMemoryClientRepository::default()),
            Arc::new(InMemoryMessageRepository::default()),
            FanoutPolicy::Broadcast,
        )
    }

    fn start_event(user_id: i64, owner: bool) -> Inbound {
        Inbound::Start {
            user_id: UserId(user_id),
            display_name: format!("user-{user_id}"),
            is_bootstrap_owner: owner,
        }
    }

    #[tokio::test]
    async fn reconnects_after_initial_connect_failure() {
        let source = Arc::new(ScriptedSource::with_script(
            vec![Err(SourceError::Connect("network down".to_owned())), Ok(())],
            vec![Ok(Some(start_event(999, true))), Ok(None)],
        ));
        let transport = Arc::new(RecordingTransport::default());
        let mut runner = PollingRunner::new(
            source.clone(),
            transport.clone(),
            test_router(),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should not fail");

        assert_eq!(source.connect_attempts().await, 2);
        let delivered = transport.delivered.lock().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].recipient(), UserId(999));
    }

    #[tokio::test]
    async fn exhausts_retries_without_crashing() {
        let source = Arc::new(ScriptedSource::with_script(
            vec![
                Err(SourceError::Connect("fail-1".to_owned())),
                Err(SourceError::Connect("fail-2".to_owned())),
                Err(SourceError::Connect("fail-3".to_owned())),
            ],
            vec![],
        ));
        let transport = Arc::new(RecordingTransport::default());
        let mut runner = PollingRunner::new(
            source.clone(),
            transport,
            test_router(),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should degrade gracefully");
        assert_eq!(source.connect_attempts().await, 3);
    }

    #[tokio::test]
    async fn rejected_event_becomes_a_notice_and_the_loop_continues() {
        // A non-operator pressing an operator button is rejected; the next
        // event in the stream is still processed.
        let source = Arc::new(ScriptedSource::with_script(
            vec![Ok(())],
            vec![
                Ok(Some(Inbound::Action {
                    operator_id: UserId(111),
                    action: OperatorAction::ListClients,
                })),
                Ok(Some(start_event(999, true))),
                Ok(None),
            ],
        ));
        let transport = Arc::new(RecordingTransport::default());
        let mut runner = PollingRunner::new(
            source,
            transport.clone(),
            test_router(),
            ReconnectPolicy::default(),
        );

        runner.start().await.expect("runner should not fail");

        let delivered = transport.delivered.lock().await;
        assert_eq!(delivered.len(), 2);
        assert!(matches!(
            &delivered[0],
            Outbound::Notify { recipient: UserId(111), text, .. }
                if text == "Only the owner can do that."
        ));
        assert_eq!(delivered[1].recipient(), UserId(999));
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let policy = ReconnectPolicy { max_retries: 5, base_delay_ms: 100, max_delay_ms: 1_000 };
        assert_eq!(policy.backoff(0).as_millis(), 100);
        assert_eq!(policy.backoff(1).as_millis(), 200);
        assert_eq!(policy.backoff(2).as_millis(), 400);
        assert_eq!(policy.backoff(10).as_millis(), 1_000);
    }
}
