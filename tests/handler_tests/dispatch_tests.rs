//! Tests for request dispatch
//!
//! These tests verify:
//! - PING
//! - Unknown commands and unknown uids
//! - Data commands without a uid
//! - Shared secret checks

use elevator::protocol::{ErrorCode, Request, META_AUTH};

use super::{assert_failure, assert_success, s, Fixture};

// =============================================================================
// Dispatch Tests
// =============================================================================

#[test]
fn test_ping() {
    let fixture = Fixture::new();
    let pong = fixture.admin("PING", vec![]);
    assert_success(&pong);
    assert_eq!(pong.datas(), &[s("PONG")]);
}

#[test]
fn test_unknown_command_is_key_error() {
    let fixture = Fixture::new();
    assert_failure(&fixture.admin("FLY", vec![]), ErrorCode::KeyError);
    // Command names are case-sensitive
    assert_failure(&fixture.admin("ping", vec![]), ErrorCode::KeyError);
}

#[test]
fn test_unknown_uid_is_runtime_error() {
    let fixture = Fixture::new();
    let request = Request::new("GET", vec![s("k")]).with_uid("no-such-uid");
    assert_failure(&fixture.handler.handle(&request), ErrorCode::RuntimeError);

    // Even an unknown command reports the uid first
    let request = Request::new("FLY", vec![]).with_uid("no-such-uid");
    assert_failure(&fixture.handler.handle(&request), ErrorCode::RuntimeError);
}

#[test]
fn test_data_command_without_uid_is_request_error() {
    let fixture = Fixture::new();
    assert_failure(&fixture.admin("GET", vec![s("k")]), ErrorCode::RequestError);
}

#[test]
fn test_admin_command_ignores_uid() {
    let fixture = Fixture::new();
    assert_success(&fixture.data("DBLIST", vec![]));
}

// =============================================================================
// Secret Tests
// =============================================================================

#[test]
fn test_secret_required_when_configured() {
    let fixture = Fixture::with_secret(Some("hunter2"));

    assert_failure(&fixture.admin("PING", vec![]), ErrorCode::RequestError);

    let wrong = Request::new("PING", vec![]).with_meta(META_AUTH, "guess");
    assert_failure(&fixture.handler.handle(&wrong), ErrorCode::RequestError);

    let right = Request::new("PING", vec![]).with_meta(META_AUTH, "hunter2");
    assert_success(&fixture.handler.handle(&right));
}

#[test]
fn test_secret_checked_before_anything_else() {
    let fixture = Fixture::with_secret(Some("hunter2"));
    let request = Request::new("FLY", vec![]).with_uid("no-such-uid");
    assert_failure(&fixture.handler.handle(&request), ErrorCode::RequestError);
}
