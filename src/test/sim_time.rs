use crate::sim::{DAY_MILLIS, SimTime};

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_secs(1), SimTime(1_000));
    assert_eq!(SimTime::from_mins(1), SimTime(60_000));
    assert_eq!(SimTime::from_hours(24), SimTime::END_OF_DAY);
    assert_eq!(SimTime::END_OF_DAY.millis(), DAY_MILLIS);
}

#[test]
fn fractional_seconds_round_to_millis() {
    assert_eq!(SimTime::from_secs_f64(1.2345), SimTime(1_235));
    assert_eq!(SimTime::from_secs_f64(-3.0), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(f64::NAN), SimTime::ZERO);
}

#[test]
fn arithmetic_saturates() {
    assert_eq!(SimTime(u64::MAX).after(SimTime(1)), SimTime(u64::MAX));
    assert_eq!(SimTime(5).since(SimTime(10)), SimTime::ZERO);
    assert_eq!(SimTime(10).since(SimTime(4)), SimTime(6));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
}
