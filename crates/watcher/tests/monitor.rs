use config::Config;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::{
    fs::{self, File},
    path::Path,
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};
use watcher::{
    Clock, WatchHit, WatchMonitor,
    host::{InstrumentationHost, MemoryAccess, StoreObserver, instrument_block},
};

#[derive(Clone)]
struct ManualClock(Arc<Mutex<Instant>>);

impl ManualClock {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Instant::now())))
    }

    fn advance(&self, by: Duration) {
        *self.0.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock()
    }
}

/// Records the callbacks attached to each instruction, then replays
/// accesses through them.
#[derive(Default)]
struct FakeHost {
    callbacks: Vec<(u64, Arc<dyn StoreObserver>)>,
}

impl FakeHost {
    fn execute(&self, pc: u64, access: MemoryAccess) {
        for (_, observer) in self.callbacks.iter().filter(|(at, _)| *at == pc) {
            observer.observe(&access);
        }
    }
}

impl InstrumentationHost for FakeHost {
    type Instruction = u64;

    fn register_memory_callback(&mut self, instruction: &u64, observer: Arc<dyn StoreObserver>) {
        self.callbacks.push((*instruction, observer));
    }
}

fn write_artifact(path: &Path, text: &str, secs: u64) {
    fs::write(path, text).unwrap();
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

fn setup(dir: &Path) -> (Config, ManualClock) {
    let mut config = Config::new();
    config.artifact.path = dir.join("watchlist.txt");
    config.watch.hit_buffer = 4;
    (config, ManualClock::new())
}

#[test]
fn stores_to_watched_addresses_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let (config, clock) = setup(dir.path());
    write_artifact(&config.artifact.path, "0x4028\n", 1_000);

    let (monitor, hits) = WatchMonitor::with_clock(&config, Box::new(clock));
    monitor.install();
    assert!(monitor.is_loaded());

    let observer: Arc<dyn StoreObserver> = Arc::new(monitor);
    let mut host = FakeHost::default();
    assert_eq!(instrument_block(&mut host, [0x10, 0x14, 0x18], &observer), 3);

    host.execute(0x10, MemoryAccess::store(0, 0x4028));
    host.execute(0x14, MemoryAccess::load(1, 0x4028));
    host.execute(0x18, MemoryAccess::store(2, 0x402c));

    assert_eq!(hits.drain().collect::<Vec<_>>(), [WatchHit {
        vcpu: 0,
        address: 0x4028
    }]);
}

#[test]
fn missing_artifact_watches_nothing_until_it_appears() {
    let dir = tempfile::tempdir().unwrap();
    let (config, clock) = setup(dir.path());

    let (monitor, hits) = WatchMonitor::with_clock(&config, Box::new(clock.clone()));
    monitor.install();
    assert!(!monitor.is_loaded());

    monitor.observe(&MemoryAccess::store(0, 0x4028));
    assert!(hits.is_empty());

    // installing counted as the first attempt, so the next one waits
    write_artifact(&config.artifact.path, "0x4028\n", 1_000);
    monitor.observe(&MemoryAccess::store(0, 0x4028));
    assert!(!monitor.is_loaded());

    clock.advance(config.watch.reload_interval);
    monitor.observe(&MemoryAccess::store(0, 0x4028));

    assert!(monitor.is_loaded());
    assert_eq!(hits.len(), 1);
}

#[test]
fn full_hit_channel_drops_hits() {
    let dir = tempfile::tempdir().unwrap();
    let (config, clock) = setup(dir.path());
    write_artifact(&config.artifact.path, "0x4028\n", 1_000);

    let (monitor, hits) = WatchMonitor::with_clock(&config, Box::new(clock));
    monitor.install();
    for vcpu in 0..10 {
        monitor.observe(&MemoryAccess::store(vcpu, 0x4028));
    }

    let received: Vec<u32> = hits.drain().map(|hit| hit.vcpu).collect();
    assert_eq!(received, [0, 1, 2, 3]);
}

#[test]
fn dropped_receiver_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let (config, clock) = setup(dir.path());
    write_artifact(&config.artifact.path, "0x4028\n", 1_000);

    let (monitor, hits) = WatchMonitor::with_clock(&config, Box::new(clock));
    drop(hits);
    monitor.install();
    monitor.observe(&MemoryAccess::store(0, 0x4028));
}
