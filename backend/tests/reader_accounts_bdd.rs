//! Behaviour tests for registration, sign-in, and sign-out.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

#[allow(dead_code)]
#[path = "support/app_world.rs"]
mod app_world;

use app_world::{AppWorld, READER_PASSWORD};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

#[fixture]
fn world() -> AppWorld {
    AppWorld::new()
}

#[given("a running bookchat app")]
fn a_running_bookchat_app(world: &AppWorld) {
    let _ = world;
}

#[when("a reader registers as {email}")]
fn a_reader_registers_as(world: &AppWorld, email: String) {
    world.register(&email);
}

#[when("the reader signs in as {email} with the correct password")]
fn the_reader_signs_in_with_the_correct_password(world: &AppWorld, email: String) {
    world.login(&email, READER_PASSWORD);
}

#[when("the reader signs in as {email} with a wrong password")]
fn the_reader_signs_in_with_a_wrong_password(world: &AppWorld, email: String) {
    world.login(&email, "NotTheSecret1");
}

#[when("the reader requests their profile")]
fn the_reader_requests_their_profile(world: &AppWorld) {
    world.get("/api/v1/auth/me");
}

#[when("the reader signs out")]
fn the_reader_signs_out(world: &AppWorld) {
    let response = world.post("/api/v1/auth/logout", serde_json::json!({}));
    assert_eq!(response.status, 200);
}

#[then("the response status is {status}")]
fn the_response_status_is(world: &AppWorld, status: u16) {
    assert_eq!(world.last().status, status, "body: {}", world.last().body);
}

#[then("the profile email is {email}")]
fn the_profile_email_is(world: &AppWorld, email: String) {
    let body = world.last().body;
    assert_eq!(
        body.pointer("/user/email").and_then(Value::as_str),
        Some(email.as_str())
    );
    assert!(body.pointer("/user/createdAt").is_some());
}

#[then("the error code is {code}")]
fn the_error_code_is(world: &AppWorld, code: String) {
    let body = world.last().body;
    assert_eq!(body.get("code").and_then(Value::as_str), Some(code.as_str()));
    assert!(body.get("traceId").and_then(Value::as_str).is_some());
}

#[scenario(
    path = "tests/features/reader_accounts.feature",
    name = "A registered reader signs in and sees their profile"
)]
fn a_registered_reader_signs_in(world: AppWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/reader_accounts.feature",
    name = "A wrong password is rejected"
)]
fn a_wrong_password_is_rejected(world: AppWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/reader_accounts.feature",
    name = "Registering the same email twice conflicts"
)]
fn registering_twice_conflicts(world: AppWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/reader_accounts.feature",
    name = "Signing out ends the session"
)]
fn signing_out_ends_the_session(world: AppWorld) {
    drop(world);
}
