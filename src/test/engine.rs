use std::sync::Arc;

use super::support::model;
use crate::chain::{CarryoverShape, RunModel, build_run_model};
use crate::engine::{CallCenterEngine, SimControl, SimulationEngine, simulate_run_model};
use crate::model::{ArrivalProfile, CallCenterModel};
use crate::sim::SimTime;
use crate::stats::{CustomerStats, Statistics};

/// One agent, 2h service, 1 min patience, one arrival per hour at :30.
/// Every second customer finds the agent busy and abandons.
fn overloaded() -> CallCenterModel {
    let mut m = model(2, &[("A", 24.0)]);
    m.agents = 1;
    let a = &mut m.callers[0];
    a.service_secs = 7_200.0;
    a.wait_tolerance_secs = 60.0;
    m
}

fn run(m: CallCenterModel) -> Statistics {
    simulate_run_model(&RunModel::plain(m), &Arc::new(SimControl::default())).expect("not canceled")
}

#[test]
fn ample_staffing_serves_everyone() {
    let mut m = model(2, &[("A", 10.0), ("B", 30.0)]);
    m.agents = 100;
    let stats = run(m);
    assert_eq!(stats.sub_days, 2);
    assert_eq!(stats.type_names(), vec!["A", "B"]);
    let b = stats.customer("B").expect("B");
    assert_eq!(b.arrivals, vec![30, 30]);
    assert_eq!(b.served, vec![30, 30]);
    assert_eq!(b.abandoned, vec![0, 0]);
    assert!(b.next_day_waiting.iter().all(Vec::is_empty));
}

#[test]
fn busy_agent_makes_every_second_customer_abandon() {
    let stats = run(overloaded());
    let a = stats.customer("A").expect("A");
    assert_eq!(a.arrivals, vec![24, 24]);
    assert_eq!(a.served, vec![12, 12]);
    assert_eq!(a.abandoned, vec![12, 12]);
    assert!(a.next_day_retry.iter().all(Vec::is_empty));
}

#[test]
fn retries_past_midnight_move_to_the_next_day() {
    let mut m = overloaded();
    m.callers[0].retry_probability = 0.5;
    m.callers[0].retry_delay_secs = 86_400.0;
    let stats = run(m);
    let a = stats.customer("A").expect("A");
    assert_eq!(a.next_day_retry[0].len(), 6);
    // Second abandon (03:31) is the first one that retries, one day later.
    let first = SimTime::from_hours(3).after(SimTime::from_mins(31));
    assert_eq!(a.next_day_retry[0][0], first.millis());
    // Only the customers who gave up for good count as abandoned.
    assert_eq!(a.abandoned, vec![6, 6]);
}

#[test]
fn customers_retrying_tomorrow_are_not_counted_as_abandoned() {
    let mut m = overloaded();
    m.callers[0].retry_probability = 1.0;
    m.callers[0].retry_delay_secs = 86_400.0;
    let stats = run(m);
    let a = stats.customer("A").expect("A");
    assert_eq!(a.abandoned, vec![0, 0]);
    assert_eq!(a.next_day_retry[0].len(), 12);
    assert_eq!(a.next_day_retry[1].len(), 12);
}

#[test]
fn retries_within_the_day_arrive_again() {
    let mut m = overloaded();
    m.callers[0].retry_probability = 1.0;
    m.callers[0].retry_delay_secs = 60.0;
    let stats = run(m);
    let a = stats.customer("A").expect("A");
    assert!(a.arrivals[0] > 24, "arrivals = {:?}", a.arrivals);
    // Everyone retries, so nobody gives up and each fresh call is
    // served at most once however often it came back.
    assert_eq!(a.abandoned, vec![0, 0]);
    for k in 0..2 {
        assert!(a.served[k] + a.abandoned[k] <= 24, "sub-day {k}: {a:?}");
    }
}

#[test]
fn customers_queued_at_midnight_are_carried() {
    let mut m = model(1, &[("A", 2.0)]);
    m.agents = 1;
    let mut buckets = vec![0.0; 24];
    buckets[23] = 1.0;
    let a = &mut m.callers[0];
    a.arrival_profile = ArrivalProfile::new(buckets);
    a.service_secs = 7_200.0;
    a.wait_tolerance_secs = 7_200.0;

    let stats = run(m);
    let a = stats.customer("A").expect("A");
    assert_eq!(a.served, vec![1]);
    // Arrived 23:45: waited 15 min, 1h45 patience left.
    assert_eq!(a.next_day_waiting, vec![vec![900_000]]);
    assert_eq!(a.next_day_tolerance, vec![vec![6_300_000]]);
}

#[test]
fn carried_customers_start_the_day_in_the_queue() {
    let mut prev = Statistics::new(None, 1);
    let mut a = CustomerStats::new("A", 1);
    a.next_day_waiting = vec![vec![900_000, 100]];
    a.next_day_tolerance = vec![vec![60_000, 60_000]];
    a.next_day_retry = vec![vec![SimTime::from_hours(1).millis()]];
    prev.customer_types.push(a);

    let mut m = model(1, &[("A", 0.0)]);
    m.agents = 1;
    m.callers[0].service_secs = 600.0;
    let run_model = build_run_model(Some(&prev), &CarryoverShape::default(), None, m).expect("build");
    let stats = simulate_run_model(&run_model, &Arc::new(SimControl::default())).expect("run");
    let a = stats.customer("A").expect("A");
    // First carried customer is served, the second gives up after 1 min,
    // the planned retry at 01:00 finds the agent free.
    assert_eq!(a.arrivals, vec![3]);
    assert_eq!(a.served, vec![2]);
    assert_eq!(a.abandoned, vec![1]);
}

#[test]
fn inactive_types_are_not_reported() {
    let mut m = model(1, &[("A", 5.0), ("B", 5.0)]);
    m.callers[1].active = false;
    let stats = run(m);
    assert_eq!(stats.type_names(), vec!["A"]);
}

#[test]
fn canceled_control_yields_nothing() {
    let control = Arc::new(SimControl::default());
    control.cancel();
    assert!(simulate_run_model(&RunModel::plain(overloaded()), &control).is_none());
    assert_eq!(control.sub_days_done(), 0);
}

#[test]
fn check_rejects_unusable_models() {
    let engine = CallCenterEngine::new();
    assert!(engine.check(&RunModel::plain(overloaded())).is_ok());

    let mut m = overloaded();
    m.agents = 0;
    assert!(engine.check(&RunModel::plain(m)).is_err());

    let mut m = overloaded();
    m.sub_days = 0;
    assert!(engine.check(&RunModel::plain(m)).is_err());

    let mut m = overloaded();
    m.callers[0].arrival_profile = ArrivalProfile::uniform(10);
    let err = engine.check(&RunModel::plain(m)).expect_err("10 buckets");
    assert!(err.contains("10 buckets"), "{err}");

    let mut m = overloaded();
    m.callers[0].active = false;
    assert!(engine.check(&RunModel::plain(m)).is_err());

    let mut m = overloaded();
    m.callers[0].retry_probability = 2.0;
    assert!(engine.check(&RunModel::plain(m)).is_err());

    let mut m = overloaded();
    m.callers[0].wait_tolerance_secs = 0.0;
    m.callers[0].retry_probability = 1.0;
    m.callers[0].retry_delay_secs = 0.0;
    let err = engine.check(&RunModel::plain(m)).expect_err("zero retry delay");
    assert!(err.contains("retry delay"), "{err}");

    // Without retries the delay is irrelevant.
    let mut m = overloaded();
    m.callers[0].retry_delay_secs = 0.0;
    assert!(engine.check(&RunModel::plain(m)).is_ok());
}

#[test]
fn submitted_run_finalizes_with_statistics() {
    let mut engine = CallCenterEngine::new();
    let handle = engine.submit(RunModel::plain(overloaded())).expect("submit");
    assert_eq!(handle.total_sub_days(), 2);
    let stats = handle.finalize().expect("statistics");
    assert_eq!(stats.customer("A").expect("A").served, vec![12, 12]);
    assert_eq!(engine.submitted(), 1);
}

#[test]
fn canceled_run_finalizes_as_canceled_or_finished() {
    let mut m = overloaded();
    m.sub_days = 50;
    let mut engine = CallCenterEngine::new();
    let mut handle = engine.submit(RunModel::plain(m)).expect("submit");
    handle.cancel();
    // The run may already be done; either way finalize returns.
    match handle.finalize() {
        Ok(stats) => assert_eq!(stats.sub_days, 50),
        Err(e) => assert_eq!(e, crate::engine::EngineError::Canceled),
    }
}
