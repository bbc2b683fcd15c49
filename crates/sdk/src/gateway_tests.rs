use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use crate::test_support::*;
use crate::{ActionCommand, BotSdk, ConnectionState, SdkError};

// =============================================================================
// Connection lifecycle
// =============================================================================

#[tokio::test]
async fn connect_identifies_and_reports_connected() {
    let mut gateway = FakeGateway::start().await;
    let sdk = BotSdk::new(gateway.config("bot1")).unwrap();
    let states = record_states(&sdk);

    let connect = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.connect().await }
    });
    let mut client = gateway.next_client().await;
    let hello = client.accept_handshake().await;
    connect.await.unwrap().unwrap();

    assert_eq!(hello["username"], "bot1");
    assert_eq!(hello["clientId"], sdk.client_id());
    assert!(sdk.client_id().starts_with("sdk-"));
    assert!(sdk.is_connected());
    assert_eq!(
        *states.lock().unwrap(),
        vec![(ConnectionState::Connecting, 0), (ConnectionState::Connected, 0)]
    );
}

#[tokio::test]
async fn concurrent_connects_share_one_attempt() {
    let mut gateway = FakeGateway::start().await;
    let sdk = BotSdk::new(gateway.config("bot1")).unwrap();

    let callers: Vec<_> = (0..3)
        .map(|_| {
            let sdk = sdk.clone();
            tokio::spawn(async move { sdk.connect().await })
        })
        .collect();
    let mut client = gateway.next_client().await;
    client.accept_handshake().await;

    for caller in callers {
        assert_eq!(caller.await.unwrap(), Ok(()));
    }
    // Already connected: no new dial.
    sdk.connect().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(gateway.connection_count(), 1);
}

#[tokio::test]
async fn handshake_timeout_leaves_sdk_disconnected() {
    let mut gateway = FakeGateway::start().await;
    let config = gateway
        .config("bot1")
        .with_connect_timeout(Duration::from_millis(100));
    let sdk = BotSdk::new(config).unwrap();

    let connect = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.connect().await }
    });
    // Accept the socket but never acknowledge.
    let mut client = gateway.next_client().await;
    client.expect_type("sdk_connect").await;

    assert_eq!(connect.await.unwrap(), Err(SdkError::ConnectTimeout));
    assert_eq!(sdk.connection_state(), ConnectionState::Disconnected);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(gateway.connection_count(), 1);
}

#[tokio::test]
async fn rejected_handshake_fails_connect() {
    let mut gateway = FakeGateway::start().await;
    let sdk = BotSdk::new(gateway.config("bot1")).unwrap();

    let connect = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.connect().await }
    });
    let mut client = gateway.next_client().await;
    client.expect_type("sdk_connect").await;
    client
        .send(json!({ "type": "sdk_connected", "success": false }))
        .await;

    assert_eq!(connect.await.unwrap(), Err(SdkError::HandshakeRejected));
    assert_eq!(sdk.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn wait_for_connection_times_out_while_idle() {
    let gateway = FakeGateway::start().await;
    let sdk = BotSdk::new(gateway.config("bot1")).unwrap();

    let err = sdk
        .wait_for_connection(Duration::from_millis(50))
        .await
        .unwrap_err();
    assert_eq!(err, SdkError::WaitTimeout("connection"));
}

#[tokio::test]
async fn disconnect_fails_pending_work_and_stays_down() {
    let mut gateway = FakeGateway::start().await;
    let (sdk, mut client) = connect_bot(&mut gateway).await;
    let states = record_states(&sdk);

    let action = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_close_modal().await }
    });
    let screenshot = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_screenshot().await }
    });
    client.recv().await;
    client.recv().await;

    sdk.disconnect().await;

    assert_eq!(action.await.unwrap(), Err(SdkError::ConnectionClosed));
    assert_eq!(screenshot.await.unwrap(), Err(SdkError::ConnectionClosed));
    assert_eq!(sdk.connection_state(), ConnectionState::Disconnected);
    assert_eq!(sdk.reconnect_attempt(), 0);
    client.expect_closed().await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(gateway.connection_count(), 1);
    assert_eq!(
        *states.lock().unwrap(),
        vec![(ConnectionState::Disconnected, 0)]
    );
}

#[tokio::test]
async fn unexpected_close_reconnects_and_gates_requests() {
    let mut gateway = FakeGateway::start().await;
    let (sdk, mut client) = connect_bot(&mut gateway).await;
    let states = record_states(&sdk);

    let in_flight = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_wait(None).await }
    });
    client.expect_type("sdk_action").await;
    client.close().await;
    assert_eq!(in_flight.await.unwrap(), Err(SdkError::ConnectionClosed));

    wait_until(|| sdk.connection_state() == ConnectionState::Reconnecting).await;
    // Issued mid-reconnect: waits for the new session instead of failing.
    let gated = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_say("back again").await }
    });

    let mut client = gateway.next_client().await;
    client.accept_handshake().await;
    sdk.wait_for_connection(STEP).await.unwrap();

    let frame = client.expect_type("sdk_action").await;
    assert_eq!(frame["action"]["type"], "say");
    assert_eq!(frame["action"]["message"], "back again");
    client.ack(&frame["actionId"], true, "said").await;
    assert_eq!(gated.await.unwrap().unwrap().message, "said");

    assert_eq!(sdk.reconnect_attempt(), 0);
    assert_eq!(
        *states.lock().unwrap(),
        vec![
            (ConnectionState::Reconnecting, 1),
            (ConnectionState::Connected, 0)
        ]
    );
}

#[tokio::test]
async fn cancelled_gated_request_leaves_no_listener() {
    let mut gateway = FakeGateway::start().await;
    let config = gateway.config("bot1").with_reconnect_backoff(
        Duration::from_secs(5),
        Duration::from_secs(5),
        None,
    );
    let (sdk, client) = connected_sdk(&mut gateway, config).await;
    let listeners = sdk.inner().connection_listeners.len();

    gateway.stop_accepting().await;
    client.close().await;
    wait_until(|| sdk.connection_state() == ConnectionState::Reconnecting).await;

    let gated = tokio::time::timeout(Duration::from_millis(20), sdk.send_say("hello")).await;
    assert!(gated.is_err());
    assert_eq!(sdk.inner().connection_listeners.len(), listeners);
    sdk.disconnect().await;
}

#[tokio::test]
async fn unexpected_close_without_auto_reconnect_disconnects() {
    let mut gateway = FakeGateway::start().await;
    let config = gateway.config("bot1").with_auto_reconnect(false);
    let (sdk, client) = connected_sdk(&mut gateway, config).await;

    client.close().await;
    wait_until(|| sdk.connection_state() == ConnectionState::Disconnected).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(gateway.connection_count(), 1);
}

#[tokio::test]
async fn reconnect_gives_up_after_max_retries() {
    let mut gateway = FakeGateway::start().await;
    let config = gateway.config("bot1").with_reconnect_backoff(
        Duration::from_millis(10),
        Duration::from_millis(40),
        Some(2),
    );
    let (sdk, client) = connected_sdk(&mut gateway, config).await;
    let states = record_states(&sdk);

    gateway.stop_accepting().await;
    client.close().await;

    wait_until(|| {
        states
            .lock()
            .unwrap()
            .last()
            .is_some_and(|(state, _)| *state == ConnectionState::Disconnected)
    })
    .await;
    assert_eq!(
        *states.lock().unwrap(),
        vec![
            (ConnectionState::Reconnecting, 1),
            (ConnectionState::Reconnecting, 2),
            (ConnectionState::Disconnected, 2)
        ]
    );

    let err = sdk.send_close_shop().await.unwrap_err();
    assert_eq!(
        err,
        SdkError::NotConnected {
            state: ConnectionState::Disconnected
        }
    );
}

// =============================================================================
// Actions
// =============================================================================

#[tokio::test]
async fn action_frame_carries_command_and_defaults() {
    let mut gateway = FakeGateway::start().await;
    let (sdk, mut client) = connect_bot(&mut gateway).await;

    let walk = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_walk(3222, 3218, None).await }
    });
    let frame = client.expect_type("sdk_action").await;
    assert_eq!(frame["username"], "bot1");
    assert!(frame["actionId"].as_str().unwrap().starts_with("act-"));
    assert_eq!(
        frame["action"],
        json!({ "type": "walkTo", "x": 3222, "z": 3218, "running": true, "reason": "SDK" })
    );

    client.ack(&frame["actionId"], true, "walking").await;
    let result = walk.await.unwrap().unwrap();
    assert!(result.success);
    assert_eq!(result.message, "walking");
}

#[tokio::test]
async fn acks_resolve_their_own_callers_in_any_order() {
    let mut gateway = FakeGateway::start().await;
    let (sdk, mut client) = connect_bot(&mut gateway).await;

    let first = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_drop_item(1).await }
    });
    let first_frame = client.expect_type("sdk_action").await;
    let second = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_drop_item(2).await }
    });
    let second_frame = client.expect_type("sdk_action").await;

    client.ack(&second_frame["actionId"], true, "second").await;
    client.ack(&first_frame["actionId"], false, "first").await;
    // Duplicate ack: nobody left to receive it.
    client.ack(&first_frame["actionId"], true, "again").await;

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!((first.success, first.message.as_str()), (false, "first"));
    assert_eq!((second.success, second.message.as_str()), (true, "second"));
    assert_eq!(sdk.inner().actions.len(), 0);
}

#[tokio::test]
async fn late_ack_after_timeout_is_ignored() {
    let mut gateway = FakeGateway::start().await;
    let (sdk, mut client) = connect_bot(&mut gateway).await;

    let timed_out = tokio::spawn({
        let sdk = sdk.clone();
        async move {
            sdk.send_action_with_timeout(ActionCommand::SkipTutorial, Duration::from_millis(50))
                .await
        }
    });
    let late = client.expect_type("sdk_action").await;
    assert_eq!(
        timed_out.await.unwrap(),
        Err(SdkError::ActionTimeout {
            action: "skipTutorial"
        })
    );
    assert_eq!(
        SdkError::ActionTimeout {
            action: "skipTutorial"
        }
        .to_string(),
        "Action timed out: skipTutorial"
    );

    client.ack(&late["actionId"], true, "too late").await;

    let next = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_set_tab(3).await }
    });
    let frame = client.expect_type("sdk_action").await;
    client.ack(&frame["actionId"], true, "tab").await;
    assert_eq!(next.await.unwrap().unwrap().message, "tab");
    assert!(sdk.is_connected());
}

#[tokio::test]
async fn missing_result_and_gateway_errors_reject() {
    let mut gateway = FakeGateway::start().await;
    let (sdk, mut client) = connect_bot(&mut gateway).await;

    let missing = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_talk_to_npc(7).await }
    });
    let frame = client.expect_type("sdk_action").await;
    client
        .send(json!({ "type": "sdk_action_result", "actionId": frame["actionId"] }))
        .await;
    let err = missing.await.unwrap().unwrap_err();
    assert_eq!(err, SdkError::MissingResult);
    assert_eq!(err.to_string(), "No result in action response");

    let rejected = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_use_item(40, None).await }
    });
    let frame = client.expect_type("sdk_action").await;
    assert_eq!(frame["action"]["optionIndex"], 1);
    client
        .send(json!({ "type": "sdk_error", "actionId": frame["actionId"], "error": "Bad slot" }))
        .await;
    assert_eq!(
        rejected.await.unwrap(),
        Err(SdkError::Gateway("Bad slot".into()))
    );
}

// =============================================================================
// State
// =============================================================================

#[tokio::test]
async fn snapshots_arrive_in_order_and_replace_wholesale() {
    let mut gateway = FakeGateway::start().await;
    let (sdk, mut client) = connect_bot(&mut gateway).await;

    let ticks = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&ticks);
    let _subscription = sdk.on_state_update(move |state| seen.lock().unwrap().push(state.tick));

    let waiter = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.wait_for_condition(|s| s.tick == 2, STEP).await }
    });
    tokio::task::yield_now().await;

    client
        .send_state(json!({
            "tick": 1,
            "inventory": [{ "slot": 0, "id": 1511, "name": "Logs", "count": 1 }]
        }))
        .await;
    client.send_raw("not json").await;
    client.send(json!({ "type": "mystery", "payload": 1 })).await;
    client.send_state(json!({ "tick": 2 })).await;

    let state = waiter.await.unwrap().unwrap();
    assert_eq!(state.tick, 2);
    assert!(sdk.inventory().is_empty());
    assert!(sdk.find_inventory_item("logs").is_none());
    assert_eq!(*ticks.lock().unwrap(), vec![1, 2]);
    assert!(sdk.is_connected());
}

#[tokio::test]
async fn wait_for_state_change_takes_next_snapshot() {
    let mut gateway = FakeGateway::start().await;
    let (sdk, mut client) = connect_bot(&mut gateway).await;
    client.send_state(json!({ "tick": 10 })).await;
    wait_until(|| sdk.state().is_some()).await;

    let waiter = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.wait_for_state_change(STEP).await }
    });
    tokio::task::yield_now().await;
    client.send_state(json!({ "tick": 11 })).await;

    assert_eq!(waiter.await.unwrap().unwrap().tick, 11);
}

// =============================================================================
// Screenshots
// =============================================================================

#[tokio::test]
async fn screenshot_resolves_by_id() {
    let mut gateway = FakeGateway::start().await;
    let (sdk, mut client) = connect_bot(&mut gateway).await;

    let shot = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_screenshot().await }
    });
    let frame = client.expect_type("sdk_screenshot_request").await;
    assert!(frame["screenshotId"].as_str().unwrap().starts_with("ss-"));
    client
        .send(json!({
            "type": "sdk_screenshot_response",
            "screenshotId": frame["screenshotId"],
            "dataUrl": "data:image/png;base64,AAAA"
        }))
        .await;

    assert_eq!(shot.await.unwrap().unwrap(), "data:image/png;base64,AAAA");
}

#[tokio::test]
async fn uncorrelated_screenshot_resolves_sole_request() {
    let mut gateway = FakeGateway::start().await;
    let (sdk, mut client) = connect_bot(&mut gateway).await;

    let shot = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_screenshot().await }
    });
    client.expect_type("sdk_screenshot_request").await;
    client
        .send(json!({ "type": "sdk_screenshot_response", "dataUrl": "data:image/png;base64,BBBB" }))
        .await;

    assert_eq!(shot.await.unwrap().unwrap(), "data:image/png;base64,BBBB");
}

#[tokio::test]
async fn uncorrelated_screenshot_is_dropped_when_ambiguous() {
    let mut gateway = FakeGateway::start().await;
    let (sdk, mut client) = connect_bot(&mut gateway).await;

    let shots: Vec<_> = (0..2)
        .map(|_| {
            let sdk = sdk.clone();
            tokio::spawn(async move {
                sdk.send_screenshot_with_timeout(Duration::from_millis(150))
                    .await
            })
        })
        .collect();
    client.expect_type("sdk_screenshot_request").await;
    client.expect_type("sdk_screenshot_request").await;
    client
        .send(json!({
            "type": "sdk_screenshot_response",
            "screenshotId": "ss-unknown",
            "dataUrl": "data:image/png;base64,CCCC"
        }))
        .await;

    for shot in shots {
        assert_eq!(shot.await.unwrap(), Err(SdkError::ScreenshotTimeout));
    }
}

#[tokio::test]
async fn screenshot_error_rejects_matching_request() {
    let mut gateway = FakeGateway::start().await;
    let (sdk, mut client) = connect_bot(&mut gateway).await;

    let shot = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_screenshot().await }
    });
    let frame = client.expect_type("sdk_screenshot_request").await;
    client
        .send(json!({
            "type": "sdk_error",
            "screenshotId": frame["screenshotId"],
            "error": "Renderer unavailable"
        }))
        .await;

    assert_eq!(
        shot.await.unwrap(),
        Err(SdkError::Gateway("Renderer unavailable".into()))
    );
}

#[tokio::test]
async fn gateway_error_rejects_both_correlated_requests() {
    let mut gateway = FakeGateway::start().await;
    let (sdk, mut client) = connect_bot(&mut gateway).await;

    let action = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_skip_tutorial().await }
    });
    let action_frame = client.expect_type("sdk_action").await;
    let shot = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.send_screenshot().await }
    });
    let shot_frame = client.expect_type("sdk_screenshot_request").await;

    client
        .send(json!({
            "type": "sdk_error",
            "actionId": action_frame["actionId"],
            "screenshotId": shot_frame["screenshotId"]
        }))
        .await;

    assert_eq!(
        action.await.unwrap(),
        Err(SdkError::Gateway("Unknown error".into()))
    );
    assert_eq!(
        shot.await.unwrap(),
        Err(SdkError::Gateway("Screenshot error".into()))
    );
}
