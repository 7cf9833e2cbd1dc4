use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore, broadcast, mpsc};

use rtevent::{
    Controller, Cursor, Event, EventSource, FetchError, Fetched, HandlerFn, NoticeKind, RingSource,
    SourceError, Subscriber,
};

/// Ring source that counts fetches and interrupts.
#[derive(Default)]
struct CountingSource {
    inner: RingSource,
    fetches: AtomicUsize,
    interrupts: AtomicUsize,
}

#[async_trait]
impl EventSource for CountingSource {
    async fn fetch_next(&self, cursor: Cursor) -> Result<Fetched, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_next(cursor).await
    }

    fn interrupt(&self) {
        self.interrupts.fetch_add(1, Ordering::SeqCst);
        self.inner.interrupt();
    }

    fn post(&self, event: Event) -> Result<u64, SourceError> {
        self.inner.post(event)
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Ring source whose first fetch panics.
#[derive(Default)]
struct PanickingSource {
    inner: RingSource,
    panicked: AtomicBool,
}

#[async_trait]
impl EventSource for PanickingSource {
    async fn fetch_next(&self, cursor: Cursor) -> Result<Fetched, FetchError> {
        if !self.panicked.swap(true, Ordering::SeqCst) {
            panic!("device driver fault");
        }
        self.inner.fetch_next(cursor).await
    }

    fn interrupt(&self) {
        self.inner.interrupt();
    }

    fn post(&self, event: Event) -> Result<u64, SourceError> {
        self.inner.post(event)
    }
}

/// Source that replays a fixed script, then waits for an interrupt.
struct ScriptedSource {
    script: Mutex<VecDeque<Result<Fetched, FetchError>>>,
    interrupted: Notify,
}

impl ScriptedSource {
    fn new(script: Vec<Result<Fetched, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            interrupted: Notify::new(),
        }
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn fetch_next(&self, _cursor: Cursor) -> Result<Fetched, FetchError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(res) => res,
            None => {
                self.interrupted.notified().await;
                Err(FetchError::Interrupted)
            }
        }
    }

    fn interrupt(&self) {
        self.interrupted.notify_one();
    }
}

fn fetched(name: &str, index: u64) -> Result<Fetched, FetchError> {
    Ok(Fetched {
        index,
        event: Event::new(name),
    })
}

type Seen = (String, Option<u64>);

fn recorder(name: &'static str) -> (Arc<Subscriber>, mpsc::UnboundedReceiver<Seen>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sub = Subscriber::new(HandlerFn::arc(name, move |ev: Event| {
        let tx = tx.clone();
        async move {
            let _ = tx.send((ev.name().to_string(), ev.index));
        }
    }));
    (sub, rx)
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<Seen>) -> Seen {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("channel closed")
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached");
}

async fn wait_notice(rx: &mut broadcast::Receiver<rtevent::Notice>, kind: NoticeKind) -> rtevent::Notice {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let n = rx.recv().await.expect("bus closed");
            if n.kind == kind {
                return n;
            }
        }
    })
    .await
    .expect("notice not published")
}

fn btn(index: u64) -> Seen {
    ("BTN".to_string(), Some(index))
}

#[tokio::test]
async fn test_name_routing_preserves_order() {
    let source = Arc::new(CountingSource::default());
    let ctl = Controller::new(source.clone()).unwrap();
    let (a, mut rx_a) = recorder("a");
    let (b, mut rx_b) = recorder("b");
    ctl.add_subscriber("BTN", &a).unwrap();
    ctl.add_subscriber("PWR", &b).unwrap();

    for name in ["BTN", "BTN", "PWR", "BTN"] {
        ctl.post(Event::new(name)).unwrap();
    }

    assert_eq!(recv(&mut rx_a).await, btn(0));
    assert_eq!(recv(&mut rx_a).await, btn(1));
    assert_eq!(recv(&mut rx_a).await, btn(3));
    assert_eq!(recv(&mut rx_b).await, ("PWR".to_string(), Some(2)));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(rx_a.try_recv().is_err());
    assert!(rx_b.try_recv().is_err());
    assert_eq!(ctl.cursor().last_index, Some(3));
}

#[tokio::test]
async fn test_removed_subscriber_stops_receiving() {
    let source = Arc::new(CountingSource::default());
    let ctl = Controller::new(source.clone()).unwrap();
    let (a, mut rx_a) = recorder("a");
    let (b, mut rx_b) = recorder("b");
    ctl.add_subscriber("BTN", &a).unwrap();
    ctl.add_subscriber("BTN", &b).unwrap();

    ctl.post(Event::new("BTN")).unwrap();
    assert_eq!(recv(&mut rx_a).await, btn(0));
    assert_eq!(recv(&mut rx_b).await, btn(0));

    assert!(ctl.remove_subscriber("BTN", &a).unwrap());
    assert_eq!(source.interrupts.load(Ordering::SeqCst), 0);

    ctl.post(Event::new("BTN")).unwrap();
    ctl.post(Event::new("BTN")).unwrap();
    assert_eq!(recv(&mut rx_b).await, btn(1));
    assert_eq!(recv(&mut rx_b).await, btn(2));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn test_last_removal_interrupts_blocked_poller() {
    let source = Arc::new(CountingSource::default());
    let ctl = Controller::new(source.clone()).unwrap();
    let mut notices = ctl.notices();
    let (a, _rx_a) = recorder("a");

    ctl.add_subscriber("BTN", &a).unwrap();
    wait_until(|| source.fetches.load(Ordering::SeqCst) >= 1).await;
    assert!(ctl.is_polling());

    assert_eq!(ctl.remove_subscribers("BTN").unwrap(), 1);
    assert_eq!(source.interrupts.load(Ordering::SeqCst), 1);

    // No event is posted: the interrupt alone must end the poller.
    wait_notice(&mut notices, NoticeKind::PollerStopped).await;
    wait_until(|| !ctl.is_polling()).await;
    assert_eq!(ctl.cursor(), Cursor::UNSET);
}

#[tokio::test]
async fn test_restarted_poller_ignores_stale_events() {
    let source = Arc::new(CountingSource::default());
    let ctl = Controller::new(source.clone()).unwrap();
    let (a, mut rx_a) = recorder("a");

    // Posted while nobody listens.
    ctl.post(Event::new("BTN")).unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;

    ctl.add_subscriber("BTN", &a).unwrap();
    ctl.post(Event::new("BTN")).unwrap();

    assert_eq!(recv(&mut rx_a).await, btn(1));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn test_fire_event_targets_registered_subscribers_only() {
    let source = Arc::new(CountingSource::default());
    let ctl = Controller::new(source.clone()).unwrap();
    let (a, mut rx_a) = recorder("a");
    let (late, mut rx_late) = recorder("late");
    ctl.add_subscriber("BTN", &a).unwrap();

    assert_eq!(ctl.fire_event(Event::new("BTN").with_payload(&b"\x01"[..])).unwrap(), 1);
    // Registered after the call: not a target.
    ctl.add_subscriber("BTN", &late).unwrap();

    assert_eq!(recv(&mut rx_a).await, ("BTN".to_string(), None));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(rx_late.try_recv().is_err());

    assert_eq!(ctl.cursor().last_index, None);
    assert_eq!(ctl.fire_event(Event::new("NONE")).unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_registration_delivers_once() {
    let source = Arc::new(CountingSource::default());
    let ctl = Controller::new(source.clone()).unwrap();
    let (a, mut rx_a) = recorder("a");
    ctl.add_subscriber("BTN", &a).unwrap();
    ctl.add_subscriber("BTN", &a).unwrap();
    assert_eq!(ctl.subscriber_count("BTN"), 1);

    ctl.post(Event::new("BTN")).unwrap();
    assert_eq!(recv(&mut rx_a).await, btn(0));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn test_removal_discards_pending_events() {
    let source = Arc::new(CountingSource::default());
    let ctl = Controller::new(source.clone()).unwrap();
    let mut notices = ctl.notices();

    let gate = Arc::new(Semaphore::new(0));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let slow = {
        let gate = Arc::clone(&gate);
        Subscriber::new(HandlerFn::arc("slow", move |ev: Event| {
            let (gate, tx) = (Arc::clone(&gate), tx.clone());
            async move {
                let _ = tx.send(("enter".to_string(), ev.index));
                gate.acquire().await.unwrap().forget();
                let _ = tx.send(("done".to_string(), ev.index));
            }
        }))
    };
    ctl.add_subscriber("BTN", &slow).unwrap();

    for _ in 0..3 {
        ctl.post(Event::new("BTN")).unwrap();
    }
    assert_eq!(recv(&mut rx).await, ("enter".to_string(), Some(0)));
    wait_until(|| slow.pending() == 2).await;

    assert_eq!(ctl.remove_subscribers("BTN").unwrap(), 1);
    let n = wait_notice(&mut notices, NoticeKind::QueueDiscarded).await;
    assert_eq!(n.count, Some(2));
    assert_eq!(n.subscriber, Some("slow"));

    // The in-flight event completes; nothing else runs.
    gate.add_permits(3);
    assert_eq!(recv(&mut rx).await, ("done".to_string(), Some(0)));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(slow.stats().discarded, 2);
}

#[tokio::test]
async fn test_panicking_handler_is_isolated() {
    let source = Arc::new(CountingSource::default());
    let ctl = Controller::new(source.clone()).unwrap();
    let mut notices = ctl.notices();

    let (tx, mut rx_bad) = mpsc::unbounded_channel();
    let bad = Subscriber::new(HandlerFn::arc("bad", move |ev: Event| {
        let tx = tx.clone();
        async move {
            if ev.index == Some(0) {
                panic!("first event");
            }
            let _ = tx.send((ev.name().to_string(), ev.index));
        }
    }));
    let (good, mut rx_good) = recorder("good");
    ctl.add_subscriber("BTN", &bad).unwrap();
    ctl.add_subscriber("BTN", &good).unwrap();

    ctl.post(Event::new("BTN")).unwrap();
    ctl.post(Event::new("BTN")).unwrap();

    let n = wait_notice(&mut notices, NoticeKind::HandlerPanicked).await;
    assert_eq!(n.subscriber, Some("bad"));
    assert_eq!(recv(&mut rx_good).await, btn(0));
    assert_eq!(recv(&mut rx_good).await, btn(1));
    assert_eq!(recv(&mut rx_bad).await, btn(1));
}

#[tokio::test]
async fn test_index_gap_is_reported() {
    let source = Arc::new(ScriptedSource::new(vec![fetched("BTN", 0), fetched("BTN", 3)]));
    let ctl = Controller::new(source).unwrap();
    let mut notices = ctl.notices();
    let (a, mut rx_a) = recorder("a");
    ctl.add_subscriber("BTN", &a).unwrap();

    assert_eq!(recv(&mut rx_a).await, btn(0));
    assert_eq!(recv(&mut rx_a).await, btn(3));
    let n = wait_notice(&mut notices, NoticeKind::EventsSkipped).await;
    assert_eq!(n.count, Some(2));
    assert_eq!(ctl.cursor().last_index, Some(3));
}

#[tokio::test]
async fn test_failed_fetch_backs_off_and_recovers() {
    let source = Arc::new(ScriptedSource::new(vec![
        Err(FetchError::Failed {
            reason: "device busy".into(),
        }),
        fetched("BTN", 0),
    ]));
    let ctl = Controller::new(source).unwrap();
    let mut notices = ctl.notices();
    let (a, mut rx_a) = recorder("a");
    ctl.add_subscriber("BTN", &a).unwrap();

    let n = wait_notice(&mut notices, NoticeKind::FetchFailed).await;
    assert_eq!(n.count, Some(1));
    assert_eq!(recv(&mut rx_a).await, btn(0));
}

#[tokio::test]
async fn test_dropping_controller_stops_poller() {
    let source = Arc::new(CountingSource::default());
    let ctl = Controller::new(source.clone()).unwrap();
    let (a, _rx_a) = recorder("a");
    ctl.add_subscriber("BTN", &a).unwrap();
    wait_until(|| source.fetches.load(Ordering::SeqCst) >= 1).await;

    drop(ctl);
    assert_eq!(source.interrupts.load(Ordering::SeqCst), 1);

    // The poller releases its clone of the source once it exits.
    wait_until(|| Arc::strong_count(&source) == 1).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_post_right_after_subscribe_is_delivered() {
    let source = Arc::new(CountingSource::default());
    let ctl = Controller::new(source.clone()).unwrap();
    let (a, mut rx_a) = recorder("a");

    ctl.add_subscriber("BTN", &a).unwrap();
    ctl.post(Event::new("BTN")).unwrap();

    assert_eq!(recv(&mut rx_a).await, btn(0));
}

#[tokio::test]
async fn test_panicking_source_is_retried() {
    let source = Arc::new(PanickingSource::default());
    let ctl = Controller::new(source.clone()).unwrap();
    let mut notices = ctl.notices();
    let (a, mut rx_a) = recorder("a");

    ctl.add_subscriber("BTN", &a).unwrap();
    ctl.post(Event::new("BTN")).unwrap();

    let n = wait_notice(&mut notices, NoticeKind::FetchFailed).await;
    assert_eq!(n.reason.as_deref(), Some("fetch_failed"));
    assert_eq!(recv(&mut rx_a).await, btn(0));
    assert!(ctl.is_polling());

    // Resubscribing after the failure still finds a live poller.
    ctl.remove_subscribers("BTN").unwrap();
    ctl.add_subscriber("BTN", &a).unwrap();
    ctl.post(Event::new("BTN")).unwrap();
    assert_eq!(recv(&mut rx_a).await, btn(1));
    assert!(ctl.is_polling());
}
