use super::*;

#[test]
fn delay_doubles_and_caps() {
    // jitter makes exact equality unsafe to assert; check bounds instead.
    let d1 = delay_for_attempt(1);
    assert!(d1.as_millis() as i64 >= 250 && d1.as_millis() as i64 <= 750);

    let d_big = delay_for_attempt(20);
    assert!(d_big <= Duration::from_millis(10_250));
}

#[test]
fn transient_status_classification() {
    assert!(is_transient_status(Some(500)));
    assert!(is_transient_status(Some(503)));
    assert!(is_transient_status(Some(429)));
    assert!(is_transient_status(None));
    assert!(!is_transient_status(Some(400)));
    assert!(!is_transient_status(Some(404)));
}
