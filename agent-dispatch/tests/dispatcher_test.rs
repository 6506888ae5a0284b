use agent_dispatch::{
    CapabilityModule, Dispatcher, HostContext, InMemoryTransport, ModuleCatalog, PumpReport
};
use async_trait::async_trait;
use errors::DispatchError;
use st_core::AgentMessage;
use std::sync::Arc;
use std::time::Duration;
use testing::{ProjectFixture, RecordingHandler};
use tokio::sync::Mutex;

fn dispatcher() -> Dispatcher {
    Dispatcher::new("strata", Arc::new(InMemoryTransport::new()))
}

#[tokio::test]
async fn test_failing_handler_does_not_block_others() {
    let dispatcher = dispatcher();
    let flaky = Arc::new(RecordingHandler::failing_on(2));
    let steady = Arc::new(RecordingHandler::new());
    dispatcher.register_handler(flaky.clone()).await;
    dispatcher.register_handler(steady.clone()).await;

    for content in ["one", "two", "three"] {
        dispatcher
            .enqueue(AgentMessage::new("reviewer", "strata", content))
            .await;
    }

    let report = dispatcher.pump().await;

    assert_eq!(report, PumpReport { messages: 3, failures: 1 });
    assert_eq!(flaky.count().await, 3);
    let contents: Vec<String> = steady
        .received()
        .await
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_panicking_handler_is_contained() {
    let dispatcher = dispatcher();
    let panicky = Arc::new(RecordingHandler::panicking_on(1));
    let steady = Arc::new(RecordingHandler::new());
    dispatcher.register_handler(panicky.clone()).await;
    dispatcher.register_handler(steady.clone()).await;

    dispatcher
        .enqueue(AgentMessage::new("reviewer", "strata", "boom"))
        .await;
    dispatcher
        .enqueue(AgentMessage::new("reviewer", "strata", "after"))
        .await;

    let report = dispatcher.pump().await;
    assert_eq!(report.failures, 1);
    assert_eq!(steady.count().await, 2);
    assert_eq!(dispatcher.queued().await, 0);
}

#[tokio::test]
async fn test_pump_with_empty_queue_is_a_no_op() {
    let dispatcher = dispatcher();
    dispatcher
        .register_handler(Arc::new(RecordingHandler::new()))
        .await;
    assert_eq!(dispatcher.pump().await, PumpReport::default());
}

#[tokio::test]
async fn test_send_disabled_by_default() {
    let result = dispatcher().send("reviewer", "hi", None).await;
    match result {
        Err(DispatchError::IntegrationDisabled { feature }) => {
            assert_eq!(feature, "agent_communication");
        }
        other => panic!("expected IntegrationDisabled, got {other:?}")
    }
}

#[tokio::test]
async fn test_from_config_requires_both_flags() {
    let mut integration = config::IntegrationConfig::default();
    integration.agent_communication_enabled = true;
    let transport = Arc::new(InMemoryTransport::new());

    let off = Dispatcher::from_config(&integration, transport.clone());
    assert!(!off.messaging_enabled());

    integration.enabled = true;
    integration.poll_interval_ms = 250;
    let on = Dispatcher::from_config(&integration, transport);
    assert!(on.messaging_enabled());
    assert_eq!(on.poll_interval(), Duration::from_millis(250));
}

// ============================================================================
// Module discovery
// ============================================================================

struct TrackedModule {
    id: String,
    log: Arc<Mutex<Vec<String>>>,
    fail_activation: bool,
    panic_activation: bool
}

#[async_trait]
impl CapabilityModule for TrackedModule {
    fn id(&self) -> &str {
        &self.id
    }

    async fn activate(&self, _host: &HostContext) -> Result<(), DispatchError> {
        if self.panic_activation {
            panic!("module {} exploded", self.id);
        }
        if self.fail_activation {
            return Err(DispatchError::ModuleActivation {
                module_id: self.id.clone(),
                reason: "refused".to_string()
            });
        }
        self.log.lock().await.push(format!("activate:{}", self.id));
        Ok(())
    }

    async fn deactivate(&self) -> Result<(), DispatchError> {
        self.log.lock().await.push(format!("deactivate:{}", self.id));
        Ok(())
    }
}

fn tracked_catalog(log: Arc<Mutex<Vec<String>>>) -> ModuleCatalog {
    let mut catalog = ModuleCatalog::with_builtin();
    for (kind, fail, panic) in [
        ("tracked", false, false),
        ("refusing", true, false),
        ("exploding", false, true)
    ] {
        let log = log.clone();
        catalog.register(kind, move |descriptor| {
            Ok(Arc::new(TrackedModule {
                id: descriptor.id.clone(),
                log: log.clone(),
                fail_activation: fail,
                panic_activation: panic
            }) as Arc<dyn CapabilityModule>)
        });
    }
    catalog
}

#[tokio::test]
async fn test_discover_skips_broken_modules() {
    let extensions = ProjectFixture::new()
        .file("a-first/capability.toml", "id = \"first\"\nkind = \"tracked\"\n")
        .file("b-broken/capability.toml", "id = [not toml\n")
        .file("c-refusing/capability.toml", "id = \"refusing\"\nkind = \"refusing\"\n")
        .file("d-exploding/capability.yaml", "id: exploding\nkind: exploding\n")
        .file("e-unknown/capability.toml", "id = \"unknown\"\nkind = \"nope\"\n")
        .file(
            "f-disabled/capability.toml",
            "id = \"disabled\"\nkind = \"tracked\"\nenabled = false\n"
        )
        .file("g-duplicate/capability.toml", "id = \"first\"\nkind = \"tracked\"\n")
        .file("h-second/capability.yml", "id: second\nkind: tracked\n")
        .file("i-passive/capability.toml", "id = \"notes\"\nkind = \"passive\"\n")
        .dir("j-empty")
        .file("README.md", "not a module\n");

    let log = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = dispatcher().with_catalog(tracked_catalog(log.clone()));

    let loaded = dispatcher.discover(extensions.root()).await;
    let ids: Vec<&str> = loaded.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "notes"]);
    assert_eq!(dispatcher.active_modules().await.len(), 3);

    dispatcher.deactivate_all().await;
    assert_eq!(
        *log.lock().await,
        vec![
            "activate:first",
            "activate:second",
            "deactivate:second",
            "deactivate:first"
        ]
    );
    assert!(dispatcher.active_modules().await.is_empty());
}

#[tokio::test]
async fn test_discover_missing_root_is_empty() {
    let fixture = ProjectFixture::new();
    let loaded = dispatcher().discover(&fixture.path("absent")).await;
    assert!(loaded.is_empty());
}

// ============================================================================
// Background pump
// ============================================================================

#[tokio::test]
async fn test_background_pump_relays_inbound_messages() {
    let transport = Arc::new(InMemoryTransport::new());
    let dispatcher = Arc::new(
        Dispatcher::new("strata", transport.clone())
            .with_messaging(true)
            .with_poll_interval(Duration::from_millis(20))
    );
    let recorder = Arc::new(RecordingHandler::new());
    dispatcher.register_handler(recorder.clone()).await;

    transport
        .push_inbound(AgentMessage::new("reviewer", "strata", "ping"))
        .await;

    let handle = dispatcher.clone().start(dispatcher.poll_interval());
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while recorder.count().await == 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.stop().await;

    let received = recorder.received().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].content, "ping");
}

#[tokio::test]
async fn test_stop_ends_the_loop() {
    let dispatcher = Arc::new(dispatcher());
    let handle = dispatcher.start(Duration::from_millis(5));
    tokio::time::timeout(Duration::from_secs(2), handle.stop())
        .await
        .expect("pump loop should stop promptly");
}
