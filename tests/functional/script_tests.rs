//! Script handle lifecycle: content addressing, idempotent close and the
//! shared-entry behaviour of identical bodies.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use valkey_cluster_client::bridge::script_cache::script_hash;
use valkey_cluster_client::script::{drop_script, store_script};
use valkey_cluster_client::{
    BridgeError, ClientError, ClusterScriptOptions, ClusterValue, Route, Script, ScriptArgOptions,
    ScriptOptions, Value,
};

use crate::{Call, MockBridge, args, mock_client};

const GET_SCRIPT: &str = "return redis.call('GET', KEYS[1])";

#[test]
fn test_identical_bodies_share_hash() {
    let (client, bridge) = mock_client();

    let first = client.create_script(GET_SCRIPT);
    let second = client.create_script(GET_SCRIPT);

    assert_eq!(first.hash(), second.hash());
    assert_eq!(first.hash(), script_hash(GET_SCRIPT.as_bytes()));
    assert_eq!(bridge.store_calls(), 2);
    assert_eq!(bridge.cached_scripts(), 1);
}

#[test]
fn test_close_twice_drops_once() {
    let (client, bridge) = mock_client();
    let script = client.create_script("return 1");

    script.close().unwrap();
    assert!(script.is_closed());
    script.close().unwrap();

    assert_eq!(bridge.drop_calls(), 1);
    assert_eq!(bridge.cached_scripts(), 0);
    // The hash survives closing.
    assert_eq!(script.hash(), script_hash(b"return 1"));
}

#[test]
fn test_drop_closes_handle() {
    let (client, bridge) = mock_client();
    {
        let _script = client.create_script("return 2");
        assert_eq!(bridge.cached_scripts(), 1);
    }
    assert_eq!(bridge.drop_calls(), 1);
    assert_eq!(bridge.cached_scripts(), 0);
}

#[test]
fn test_drop_after_close_does_not_drop_again() {
    let (client, bridge) = mock_client();
    let script = client.create_script("return 3");
    script.close().unwrap();
    drop(script);
    assert_eq!(bridge.drop_calls(), 1);
}

#[test]
fn test_empty_body_short_circuits() {
    let bridge = Arc::new(MockBridge::new());

    let script = Script::new(bridge.clone(), "");
    assert_eq!(script.hash(), "");
    assert_eq!(bridge.store_calls(), 0);

    script.close().unwrap();
    assert_eq!(bridge.drop_calls(), 0);
}

#[test]
fn test_store_and_drop_helpers_short_circuit() {
    let bridge = MockBridge::new();

    assert_eq!(store_script(&bridge, b""), "");
    assert!(drop_script(&bridge, "").is_ok());
    assert_eq!(bridge.store_calls(), 0);
    assert_eq!(bridge.drop_calls(), 0);

    let hash = store_script(&bridge, b"return 4");
    assert_eq!(hash.len(), 40);
    drop_script(&bridge, &hash).unwrap();
    assert_eq!(bridge.store_calls(), 1);
    assert_eq!(bridge.drop_calls(), 1);
}

#[test]
fn test_failed_drop_still_closes() {
    let (client, bridge) = mock_client();
    let script = client.create_script("return 5");
    bridge.fail_next_drop(BridgeError::Disconnect("connection reset".to_string()));

    let err = script.close().unwrap_err();
    assert_eq!(err, BridgeError::Disconnect("connection reset".to_string()));
    assert!(script.is_closed());

    script.close().unwrap();
    assert_eq!(bridge.drop_calls(), 1);
}

#[test]
fn test_closing_one_handle_removes_shared_entry() {
    let (client, bridge) = mock_client();
    let first = client.create_script(GET_SCRIPT);
    let second = client.create_script(GET_SCRIPT);

    first.close().unwrap();
    assert!(!second.is_closed());

    let err = client
        .invoke_script(&second, &ScriptOptions::new().with_keys(["k"]))
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Bridge(BridgeError::ScriptNotFound(_))
    ));
}

#[test]
fn test_concurrent_close_drops_once() {
    const THREADS: usize = 8;

    let bridge = Arc::new(MockBridge::new().with_drop_delay(Duration::from_millis(20)));
    let script = Arc::new(Script::new(bridge.clone(), "return 6"));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let script = Arc::clone(&script);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                script.close()
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(bridge.drop_calls(), 1);
    assert!(script.is_closed());
}

#[test]
fn test_invoke_script_by_keys() {
    let (client, bridge) = mock_client();
    let script = client.create_script(GET_SCRIPT);
    bridge.push_scalar("alice");

    let options = ScriptOptions::new().with_keys(["user:1"]).with_args(["x"]);
    let value = client.invoke_script(&script, &options).unwrap();

    assert_eq!(value, Value::from("alice"));
    assert_eq!(
        bridge.calls(),
        vec![Call::InvokeScript {
            hash: script.hash().to_string(),
            keys: args(&["user:1"]),
            args: args(&["x"]),
            route: None,
        }]
    );
}

#[test]
fn test_invoke_script_with_route() {
    let (client, bridge) = mock_client();
    let script = client.create_script("return ARGV[1]");
    bridge.push_per_node(&[("a:1", "hi"), ("b:2", "hi")]);

    let options = ClusterScriptOptions::new()
        .with_script_arg_options(ScriptArgOptions::new().with_args(["hi"]))
        .with_route(Route::AllPrimaries);
    let result = client.invoke_script_with_route(&script, &options).unwrap();

    assert!(matches!(result, ClusterValue::Multi(ref m) if m.len() == 2));
    assert!(matches!(
        &bridge.calls()[0],
        Call::InvokeScript { keys, route: Some(Route::AllPrimaries), .. } if keys.is_empty()
    ));
}

#[test]
fn test_invoke_closed_script_is_misuse() {
    let (client, bridge) = mock_client();
    let script = client.create_script("return 7");
    script.close().unwrap();

    let err = client
        .invoke_script(&script, &ScriptOptions::new())
        .unwrap_err();
    assert!(err.is_misuse());
    let err = client
        .invoke_script_with_route(&script, &ClusterScriptOptions::new())
        .unwrap_err();
    assert!(err.is_misuse());
    assert_eq!(bridge.call_count(), 0);
}

#[test]
fn test_scripts_active_gauge() {
    let (client, _bridge) = mock_client();
    let a = client.create_script("return 8");
    let b = client.create_script("return 9");
    assert_eq!(client.metrics().scripts_active.get(), 2);

    a.close().unwrap();
    a.close().unwrap();
    assert_eq!(client.metrics().scripts_active.get(), 1);

    drop(b);
    assert_eq!(client.metrics().scripts_active.get(), 0);
}
