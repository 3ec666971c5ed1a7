//! End-to-end scheduler behavior through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use space_events::{Command, EngineConfig, Payload, Periodic, Rank, Scheduler, SystemClass};

fn counting(counter: &Arc<AtomicUsize>) -> Payload {
    let counter = Arc::clone(counter);
    Payload::suspendable(move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

#[tokio::test(start_paused = true)]
async fn combat_round_from_commands() {
    let scheduler = Arc::new(Scheduler::default());
    let hits = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&hits);
    scheduler.register("fire_phasers", move |cmd: &Command| {
        let log = Arc::clone(&log);
        let target = cmd.target.clone().unwrap_or_default();
        Payload::immediate(move || {
            log.lock().unwrap().push(target);
            Ok(())
        })
    });

    for (target, delay) in [("raider-1", 0), ("raider-2", 200), ("raider-3", 400)] {
        scheduler.submit_command(
            Command::new("fire_phasers").with_target(target),
            SystemClass::Combat,
            Duration::from_millis(delay),
        );
    }

    let mut passes = 0;
    while scheduler.queue_depth() > 0 {
        scheduler.process(Some(SystemClass::Combat), None).await;
        tokio::time::advance(SystemClass::Combat.interval()).await;
        passes += 1;
    }

    assert_eq!(passes, 3);
    assert_eq!(*hits.lock().unwrap(), vec!["raider-1", "raider-2", "raider-3"]);
    assert_eq!(scheduler.metrics().dispatched["combat"], 3);
}

#[tokio::test(start_paused = true)]
async fn mixed_systems_drain_by_priority() {
    let scheduler = Scheduler::default();
    let order = Arc::new(Mutex::new(Vec::new()));

    for system in [SystemClass::Sensors, SystemClass::Movement, SystemClass::Power] {
        let order = Arc::clone(&order);
        scheduler.submit(
            Payload::immediate(move || {
                order.lock().unwrap().push(system);
                Ok(())
            }),
            system,
            Duration::ZERO,
        );
    }

    assert_eq!(scheduler.process(None, None).await, 3);
    assert_eq!(
        *order.lock().unwrap(),
        vec![SystemClass::Movement, SystemClass::Power, SystemClass::Sensors]
    );
}

#[tokio::test(start_paused = true)]
async fn configured_periodics_keep_ticking() {
    let config = EngineConfig::from_toml(
        r#"
[periodic.shield_regen]
system = "shields"
interval_ms = 500
"#,
    )
    .unwrap();

    let scheduler = Arc::new(Scheduler::new(config.scheduler.clone()));
    let ticks = Arc::new(AtomicUsize::new(0));
    for periodic in config.periodics() {
        let (name, system) = (periodic.name.clone(), periodic.system);
        let ticks = Arc::clone(&ticks);
        scheduler.register_periodic(periodic, move |_cmd: &Command| counting(&ticks));
        assert!(scheduler.start_periodic(&name, system));
    }

    for _ in 0..4 {
        scheduler.process(Some(SystemClass::Shields), None).await;
        tokio::time::advance(Duration::from_millis(500)).await;
    }

    assert_eq!(ticks.load(Ordering::SeqCst), 4);
    assert_eq!(scheduler.queue_depth(), 1);
}

#[tokio::test(start_paused = true)]
async fn periodic_does_not_keep_scheduler_alive() {
    let scheduler = Arc::new(Scheduler::default());
    let ticks = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&ticks);
    scheduler.register_periodic(
        Periodic::new("sensor_update", SystemClass::Sensors),
        move |_cmd: &Command| counting(&counter),
    );
    scheduler.start_periodic("sensor_update", SystemClass::Sensors);
    scheduler.process(None, None).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 1);

    let weak = Arc::downgrade(&scheduler);
    drop(scheduler);
    assert!(weak.upgrade().is_none());
}

#[tokio::test(start_paused = true)]
async fn metrics_snapshot_serializes() {
    let scheduler = Scheduler::default();
    scheduler.submit(Payload::immediate(|| Ok(())), Rank(7), Duration::ZERO);
    scheduler.process(None, None).await;

    let json = serde_json::to_value(scheduler.metrics()).unwrap();
    assert_eq!(json["submitted"], 1);
    assert_eq!(json["dispatched"]["rank 7"], 1);
    assert_eq!(json["queue_depth"], 0);
}
