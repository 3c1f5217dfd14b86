extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec, Address, Env, IntoVal, String, Symbol, TryFromVal, TryIntoVal, Val, Vec,
};

use crate::events::{
    RefundIssued, ReservationCancelled, ReservationCompleted, ReservationConfirmed,
    ReservationRequested, SpotAdded, TimeoutTriggered, UserRegistered,
};
use crate::test::{setup, HOUR, START};
use crate::TIMEOUT_PERIOD;

/// Most recent event published by `contract` under `topic`.
fn last_event(env: &Env, contract: &Address, topic: Symbol) -> (Vec<Val>, Val) {
    let all = env.events().all();
    let mut i = all.len();
    while i > 0 {
        i -= 1;
        let (address, topics, data) = all.get(i).expect("event index in range");
        let first = topics
            .get(0)
            .and_then(|v| Symbol::try_from_val(env, &v).ok());
        if address == *contract && first == Some(topic.clone()) {
            return (topics, data);
        }
    }
    panic!("no event with the requested topic");
}

#[test]
fn test_spot_added_event() {
    let h = setup();
    let spot_id = h.spot(10);

    let all_events = h.env.events().all();
    let last = all_events.last().expect("No events found");
    assert_eq!(last.0, h.client.address);

    let expected_topics = vec![
        &h.env,
        symbol_short!("spot_add").into_val(&h.env),
        spot_id.into_val(&h.env),
    ];
    assert_eq!(last.1, expected_topics);

    let data: SpotAdded = last.2.try_into_val(&h.env).unwrap();
    assert_eq!(
        data,
        SpotAdded {
            spot_id,
            operator: h.operator.clone(),
            price: 10,
            location: String::from_str(&h.env, "Level 1, Bay 7"),
        }
    );
}

#[test]
fn test_user_registered_event() {
    let h = setup();
    let user = Address::generate(&h.env);
    h.client.register(&user, &42u64, &750u32);

    let (topics, data) = last_event(&h.env, &h.client.address, symbol_short!("user_reg"));
    let expected_topics = vec![
        &h.env,
        symbol_short!("user_reg").into_val(&h.env),
        user.into_val(&h.env),
    ];
    assert_eq!(topics, expected_topics);

    let data: UserRegistered = data.try_into_val(&h.env).unwrap();
    assert_eq!(data, UserRegistered { user, identity: 42 });
}

#[test]
fn test_reservation_requested_and_confirmed_events() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let reservation_id = h
        .client
        .request_reservation(&user, &spot_id, &(2 * HOUR), &20);

    let (topics, data) = last_event(&h.env, &h.client.address, symbol_short!("requested"));
    let expected_topics = vec![
        &h.env,
        symbol_short!("requested").into_val(&h.env),
        reservation_id.into_val(&h.env),
    ];
    assert_eq!(topics, expected_topics);
    let data: ReservationRequested = data.try_into_val(&h.env).unwrap();
    let request_id = data.request_id;
    assert_eq!(
        data,
        ReservationRequested {
            reservation_id,
            request_id,
            spot_id,
            user: user.clone(),
            amount: 20,
            end_time: START + 2 * HOUR,
        }
    );

    h.client.confirm(&h.gateway, &request_id, &true);

    let (_, data) = last_event(&h.env, &h.client.address, symbol_short!("confirmed"));
    let data: ReservationConfirmed = data.try_into_val(&h.env).unwrap();
    assert_eq!(
        data,
        ReservationConfirmed {
            reservation_id,
            spot_id,
            user,
            end_time: START + 2 * HOUR,
            fee: 1,
        }
    );
}

#[test]
fn test_cancel_emits_cancelled_and_refunded() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let reservation_id = h.active(&user, spot_id, 2 * HOUR, 20);

    h.client.cancel(&user, &reservation_id);

    let (_, data) = last_event(&h.env, &h.client.address, symbol_short!("cancelled"));
    let data: ReservationCancelled = data.try_into_val(&h.env).unwrap();
    assert_eq!(
        data,
        ReservationCancelled {
            reservation_id,
            user: user.clone(),
            refund: 18,
            fee: 2,
        }
    );

    let (topics, data) = last_event(&h.env, &h.client.address, symbol_short!("refunded"));
    let expected_topics = vec![
        &h.env,
        symbol_short!("refunded").into_val(&h.env),
        reservation_id.into_val(&h.env),
    ];
    assert_eq!(topics, expected_topics);
    let data: RefundIssued = data.try_into_val(&h.env).unwrap();
    assert_eq!(
        data,
        RefundIssued {
            reservation_id,
            user,
            amount: 18,
        }
    );
}

#[test]
fn test_timeout_event() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let (reservation_id, request_id) = h.request(&user, spot_id, HOUR, 10);

    h.advance(TIMEOUT_PERIOD + 1);
    h.client.trigger_timeout(&user, &request_id);

    let (_, data) = last_event(&h.env, &h.client.address, symbol_short!("timeout"));
    let data: TimeoutTriggered = data.try_into_val(&h.env).unwrap();
    assert_eq!(
        data,
        TimeoutTriggered {
            reservation_id,
            request_id,
            by: user,
        }
    );
}

#[test]
fn test_completed_event() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let reservation_id = h.active(&user, spot_id, HOUR, 10);

    h.advance(HOUR);
    h.client.complete(&user, &reservation_id);

    let all_events = h.env.events().all();
    let last = all_events.last().expect("No events found");
    let expected_topics = vec![
        &h.env,
        symbol_short!("completed").into_val(&h.env),
        reservation_id.into_val(&h.env),
    ];
    assert_eq!(last.1, expected_topics);
    let data: ReservationCompleted = last.2.try_into_val(&h.env).unwrap();
    assert_eq!(
        data,
        ReservationCompleted {
            reservation_id,
            spot_id,
            amount: 10,
        }
    );
}
