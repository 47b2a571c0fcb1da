use criterion::{Criterion, black_box, criterion_group, criterion_main};

use talkbook_core::events::{BusEvent, EventBus};
use talkbook_core::{Command, CommandResult, Editable, Registry, UndoRedoManager};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tally {
    value: i64,
}

impl Editable for Tally {
    type AssetRef = u64;
}

#[derive(Debug)]
struct Bump(i64);

impl Command<Tally> for Bump {
    fn execute(&mut self, target: &mut Tally) -> CommandResult {
        target.value += self.0;
        Ok(())
    }

    fn un_execute(&mut self, target: &mut Tally) -> CommandResult {
        target.value -= self.0;
        Ok(())
    }

    fn description(&self) -> &str {
        "Bump"
    }

    fn used_assets(&self, _target: &Tally) -> Vec<u64> {
        vec![self.0 as u64]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Tick;

impl BusEvent for Tick {
    type Kind = Tick;
    type Source = u32;

    fn kind(&self) -> Tick {
        Tick
    }

    fn source(&self) -> Option<u32> {
        Some(0)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

fn bench_registry_churn(c: &mut Criterion) {
    c.bench_function("registry_manage_unmanage_1k", |b| {
        b.iter(|| {
            let mut registry = Registry::<u64>::new();
            let uids: Vec<_> = (0..1000).map(|i| registry.manage(Box::new(i))).collect();
            for uid in uids.into_iter().step_by(2) {
                let _ = registry.unmanage(uid);
            }
            black_box(registry.len())
        });
    });
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

fn bench_history_execute_undo_redo(c: &mut Criterion) {
    c.bench_function("history_execute_undo_redo_1k", |b| {
        b.iter(|| {
            let mut history = UndoRedoManager::new();
            let mut tally = Tally::default();
            for i in 0..1000 {
                let _ = history.execute(Box::new(Bump(i)), &mut tally);
            }
            while history.undo(&mut tally).is_ok() {}
            while history.redo(&mut tally).is_ok() {}
            black_box(tally.value)
        });
    });
}

fn bench_history_transaction(c: &mut Criterion) {
    c.bench_function("history_transaction_100", |b| {
        b.iter(|| {
            let mut history = UndoRedoManager::new();
            let mut tally = Tally::default();
            history.start_transaction("batch");
            for i in 0..100 {
                let _ = history.execute(Box::new(Bump(i)), &mut tally);
            }
            let _ = history.end_transaction();
            let _ = history.undo(&mut tally);
            black_box(tally.value)
        });
    });
}

fn bench_history_used_assets(c: &mut Criterion) {
    let mut history = UndoRedoManager::new();
    let mut tally = Tally::default();
    for i in 0..1000 {
        let _ = history.execute(Box::new(Bump(i)), &mut tally);
    }
    for _ in 0..500 {
        let _ = history.undo(&mut tally);
    }
    c.bench_function("history_used_assets_1k", |b| {
        b.iter(|| black_box(history.used_assets(&tally).len()));
    });
}

// ---------------------------------------------------------------------------
// Event bus
// ---------------------------------------------------------------------------

fn bench_event_publish(c: &mut Criterion) {
    let mut bus = EventBus::<Tick>::new();
    for _ in 0..16 {
        bus.subscribe(Tick, |event| {
            black_box(event);
        });
        bus.subscribe_local(0, Tick, |event| {
            black_box(event);
        });
    }
    c.bench_function("event_publish_32_listeners", |b| {
        b.iter(|| black_box(bus.publish(&Tick)));
    });
}

criterion_group!(
    benches,
    bench_registry_churn,
    bench_history_execute_undo_redo,
    bench_history_transaction,
    bench_history_used_assets,
    bench_event_publish,
);
criterion_main!(benches);
