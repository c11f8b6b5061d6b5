//! Account flows end to end through `AppState`, with file storage and a
//! scripted Commerce API.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use fromage_integration_tests::{cheese, file_backed_state, state_in};
use fromage_storefront::error::AccountError;
use fromage_storefront::shopify::stub::{access_token, customer};

#[tokio::test]
async fn test_login_persists_and_revalidates_after_restart() {
    let (state, dir) = file_backed_state();
    let session = state.session();
    session
        .api()
        .issue_token(access_token("tok_brie", Utc::now() + TimeDelta::days(14)));
    session
        .api()
        .return_customer(Some(customer("Marie Harel", "marie@camembert.fr")));

    session.login("marie@camembert.fr", "pw").await.unwrap();
    assert!(session.is_authorized());

    let raw = fs::read_to_string(dir.path().join("__azx__.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["accessToken"], "tok_brie");
    assert_eq!(json["customer"]["displayName"], "Marie Harel");

    // A restarted process starts unauthorized until it re-checks.
    let restarted = state_in(&dir);
    assert!(!restarted.session().is_authorized());
    restarted
        .session()
        .api()
        .return_customer(Some(customer("Marie Harel", "marie@camembert.fr")));
    assert!(restarted.session().revalidate().await);
    assert_eq!(
        restarted.session().api().fetched_tokens(),
        vec!["tok_brie".to_string()]
    );
}

#[tokio::test]
async fn test_expired_session_on_disk_never_calls_remote() {
    let (_, dir) = file_backed_state();
    let expired = Utc::now() - TimeDelta::hours(1);
    fs::write(
        dir.path().join("__azx__.json"),
        format!(
            r#"{{"customer":{{"displayName":"Marie Harel","email":"marie@camembert.fr"}},"accessToken":"tok_old","expiresAt":"{}"}}"#,
            expired.to_rfc3339()
        ),
    )
    .unwrap();

    let state = state_in(&dir);
    assert!(state.session().snapshot().credential.is_some());
    assert!(!state.session().revalidate().await);
    assert_eq!(state.session().api().fetch_customer_calls(), 0);
}

#[tokio::test]
async fn test_login_with_failing_lookup_keeps_token_on_disk() {
    let (state, dir) = file_backed_state();
    let session = state.session();
    session
        .api()
        .issue_token(access_token("tok_comte", Utc::now() + TimeDelta::days(14)));
    session.api().fail_customer("Internal error");

    assert_eq!(
        session.login("marie@camembert.fr", "pw").await,
        Err(AccountError::Failed)
    );

    let restarted = state_in(&dir);
    let snapshot = restarted.session().snapshot();
    assert_eq!(snapshot.access_token(), Some("tok_comte"));
    assert!(snapshot.customer.is_none());
}

#[tokio::test]
async fn test_logout_with_failing_revocation_clears_disk() {
    let (state, dir) = file_backed_state();
    let session = state.session();
    session
        .api()
        .issue_token(access_token("tok_roquefort", Utc::now() + TimeDelta::days(14)));
    session
        .api()
        .return_customer(Some(customer("Marie Harel", "marie@camembert.fr")));
    session.login("marie@camembert.fr", "pw").await.unwrap();

    session.api().fail_revoke("Internal error");
    session.logout().await;

    assert!(session.snapshot().is_empty());
    assert!(!session.is_authorized());
    assert_eq!(
        fs::read_to_string(dir.path().join("__azx__.json")).unwrap(),
        "{}"
    );
    assert!(state_in(&dir).session().snapshot().is_empty());
}

#[tokio::test]
async fn test_session_flows_leave_cart_alone() {
    let (state, dir) = file_backed_state();
    state.cart().add(cheese(1, 2, "24.90")).unwrap();

    state.session().api().accept_revoke();
    state.session().logout().await;
    state.session().api().recover_result(vec![]);
    state
        .session()
        .request_password_reset("marie@camembert.fr")
        .await
        .unwrap();

    assert_eq!(state_in(&dir).cart().item_count(), 2);
}

#[tokio::test]
async fn test_background_task_tracks_login_and_logout() {
    let (state, _dir) = file_backed_state();
    let session = state.session();
    session
        .api()
        .return_customer(Some(customer("Marie Harel", "marie@camembert.fr")));
    session
        .api()
        .issue_token(access_token("tok_chevre", Utc::now() + TimeDelta::days(14)));
    session.api().accept_revoke();

    let mut authorized = session.authorized();
    let task = state.spawn_background_tasks();

    session.login("marie@camembert.fr", "pw").await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), authorized.wait_for(|a| *a))
        .await
        .unwrap()
        .unwrap();

    session.logout().await;
    tokio::time::timeout(Duration::from_secs(2), authorized.wait_for(|a| !*a))
        .await
        .unwrap()
        .unwrap();

    task.abort();
}
