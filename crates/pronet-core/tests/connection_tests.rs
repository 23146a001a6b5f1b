mod common;

use common::{befriend, register, setup};
use pronet_core::CoreError;
use pronet_types::models::{ConnectionStatus, Decision};
use uuid::Uuid;

#[test]
fn test_send_request_creates_pending_edge() {
    let env = setup();
    let alice = register(&env, "alice");
    let bob = register(&env, "bob");

    let conn = env.connections.send_request(alice, bob).unwrap();
    assert_eq!(conn.requester_id, alice);
    assert_eq!(conn.target_id, bob);
    assert_eq!(conn.status, ConnectionStatus::Pending);
    assert!(conn.decided_at.is_none());

    let pending = env.connections.list_pending_for(bob).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, conn.id);
}

#[test]
fn test_duplicate_request_rejected() {
    let env = setup();
    let alice = register(&env, "alice");
    let bob = register(&env, "bob");

    env.connections.send_request(alice, bob).unwrap();
    let err = env.connections.send_request(alice, bob).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateRequest));

    // Still exactly one request on bob's desk.
    assert_eq!(env.connections.list_pending_for(bob).unwrap().len(), 1);
}

#[test]
fn test_reverse_direction_is_also_a_duplicate() {
    let env = setup();
    let alice = register(&env, "alice");
    let bob = register(&env, "bob");

    env.connections.send_request(alice, bob).unwrap();
    let err = env.connections.send_request(bob, alice).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateRequest));
}

#[test]
fn test_accepted_edge_blocks_new_requests() {
    let env = setup();
    let alice = register(&env, "alice");
    let bob = register(&env, "bob");
    befriend(&env, alice, bob);

    assert!(matches!(
        env.connections.send_request(alice, bob).unwrap_err(),
        CoreError::DuplicateRequest
    ));
    assert!(matches!(
        env.connections.send_request(bob, alice).unwrap_err(),
        CoreError::DuplicateRequest
    ));
}

#[test]
fn test_accept_is_visible_to_both_endpoints() {
    let env = setup();
    let alice = register(&env, "alice");
    let bob = register(&env, "bob");

    let conn = env.connections.send_request(alice, bob).unwrap();
    let decided = env.connections.respond(bob, conn.id, Decision::Accept).unwrap();
    assert_eq!(decided.status, ConnectionStatus::Accepted);
    assert!(decided.decided_at.is_some());

    // The friend list is symmetric regardless of request direction.
    let of_alice = env.connections.list_accepted(alice).unwrap();
    let of_bob = env.connections.list_accepted(bob).unwrap();
    assert_eq!(of_alice.len(), 1);
    assert_eq!(of_bob.len(), 1);
    assert_eq!(of_alice[0].other_end(alice), bob);
    assert_eq!(of_bob[0].other_end(bob), alice);
}

#[test]
fn test_declined_edge_is_tombstone_not_blocker() {
    let env = setup();
    let alice = register(&env, "alice");
    let bob = register(&env, "bob");

    let conn = env.connections.send_request(alice, bob).unwrap();
    let decided = env.connections.respond(bob, conn.id, Decision::Decline).unwrap();
    assert_eq!(decided.status, ConnectionStatus::Declined);

    assert!(env.connections.list_accepted(alice).unwrap().is_empty());
    assert!(env.connections.list_pending_for(bob).unwrap().is_empty());

    // A declined pair may try again.
    env.connections.send_request(alice, bob).unwrap();
}

#[test]
fn test_only_the_target_may_respond() {
    let env = setup();
    let alice = register(&env, "alice");
    let bob = register(&env, "bob");
    let carol = register(&env, "carol");

    let conn = env.connections.send_request(alice, bob).unwrap();

    assert!(matches!(
        env.connections.respond(alice, conn.id, Decision::Accept).unwrap_err(),
        CoreError::Forbidden
    ));
    assert!(matches!(
        env.connections.respond(carol, conn.id, Decision::Accept).unwrap_err(),
        CoreError::Forbidden
    ));

    // The edge is untouched.
    assert_eq!(env.connections.list_pending_for(bob).unwrap().len(), 1);
}

#[test]
fn test_respond_is_single_shot() {
    let env = setup();
    let alice = register(&env, "alice");
    let bob = register(&env, "bob");

    let conn = env.connections.send_request(alice, bob).unwrap();
    env.connections.respond(bob, conn.id, Decision::Accept).unwrap();

    let err = env.connections.respond(bob, conn.id, Decision::Decline).unwrap_err();
    assert!(matches!(err, CoreError::NotFound));

    // Status did not move.
    let of_bob = env.connections.list_accepted(bob).unwrap();
    assert_eq!(of_bob.len(), 1);
    assert_eq!(of_bob[0].status, ConnectionStatus::Accepted);
}

#[test]
fn test_respond_to_missing_edge_not_found() {
    let env = setup();
    let bob = register(&env, "bob");

    let err = env
        .connections
        .respond(bob, Uuid::new_v4(), Decision::Accept)
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound));
}

#[test]
fn test_capacity_refusal_maps_to_capacity_exceeded() {
    let env = setup();
    let alice = register(&env, "alice");
    for name in ["pal1", "pal2", "pal3", "pal4", "pal5"] {
        let friend = register(&env, name);
        befriend(&env, alice, friend);
    }

    let zed = register(&env, "zed");
    let err = env.connections.send_request(alice, zed).unwrap_err();
    assert!(matches!(err, CoreError::CapacityExceeded));
    assert!(env.connections.list_pending_for(zed).unwrap().is_empty());
}

#[test]
fn test_saturated_requester_can_reach_through_network() {
    let env = setup();
    let alice = register(&env, "alice");
    let bob = register(&env, "bob");
    befriend(&env, alice, bob);
    for name in ["pal1", "pal2", "pal3", "pal4"] {
        let friend = register(&env, name);
        befriend(&env, alice, friend);
    }

    let gina = register(&env, "gina");
    befriend(&env, bob, gina);

    // Within reach, so the request goes through despite the full roster.
    let conn = env.connections.send_request(alice, gina).unwrap();
    assert_eq!(conn.status, ConnectionStatus::Pending);
}
