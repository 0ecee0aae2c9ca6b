//! Common test utilities, fixtures, and mocks

pub mod fixtures;
pub mod mocks;

use std::sync::Arc;
use std::time::Duration;
use viby::commands::music::utils::playback::LifecycleReceiver;
use viby::{QueueRegistry, QueueSettings};

use mocks::{FakeTransport, RecordingNotices};

pub const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// A registry wired to fakes, plus handles to inspect them.
pub struct Harness {
    pub registry: QueueRegistry,
    pub events: LifecycleReceiver,
    pub transport: FakeTransport,
    pub notices: RecordingNotices,
}

impl Harness {
    pub fn new() -> Self {
        crate::test_utils::init();
        let transport = FakeTransport::default();
        let notices = RecordingNotices::default();
        let (registry, events) = QueueRegistry::new(
            Arc::new(transport.clone()),
            Arc::new(notices.clone()),
            QueueSettings {
                idle_timeout: IDLE_TIMEOUT,
            },
        );
        Self {
            registry,
            events,
            transport,
            notices,
        }
    }

    /// Delivers every lifecycle event emitted so far, including ones emitted
    /// while handling earlier events.
    pub async fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.registry.handle_event(event).await;
        }
    }
}

/// Lets spawned tasks (idle timers) run to completion.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
