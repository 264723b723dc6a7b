//! Facade operations against a live cluster.

use valkey_cluster_client::parsing::parse_info_value;
use valkey_cluster_client::{
    ClusterInfoOptions, ClusterPingOptions, ClusterScanCursor, FlushMode, InfoOptions, Route,
    ScanOptions, ScriptFlushOptions, Section, Value,
};

use crate::{args, connect, unique_key};

#[test]
#[ignore = "requires a running Valkey cluster"]
fn test_ping() {
    let client = connect();
    assert_eq!(client.ping().unwrap(), "PONG");

    let options = ClusterPingOptions::new()
        .with_message("Hello")
        .with_route(Route::AllNodes);
    assert_eq!(client.ping_with_options(&options).unwrap(), "Hello");
}

#[test]
#[ignore = "requires a running Valkey cluster"]
fn test_info_from_all_primaries() {
    let client = connect();
    let info = client.info().unwrap();
    assert!(!info.is_empty());
    for (node, text) in &info {
        assert!(node.contains(':'), "node key {} is not host:port", node);
        assert_eq!(parse_info_value(text, "role").as_deref(), Some("master"));
    }
}

#[test]
#[ignore = "requires a running Valkey cluster"]
fn test_info_single_route() {
    let client = connect();
    let options = ClusterInfoOptions::new()
        .with_info_options(InfoOptions::new().with_sections([Section::Replication]))
        .with_route(Route::slot_key("user:1"));

    let result = client.info_with_options(&options).unwrap();
    let text = result.single_value().unwrap();
    assert_eq!(parse_info_value(text, "role").as_deref(), Some("master"));
}

#[test]
#[ignore = "requires a running Valkey cluster"]
fn test_info_all_nodes_includes_replicas() {
    let client = connect();
    let options = ClusterInfoOptions::new()
        .with_info_options(InfoOptions::new().with_sections([Section::Replication]))
        .with_route(Route::AllNodes);

    let primaries = client.info().unwrap().len();
    let all = client.info_with_options(&options).unwrap();
    assert!(all.multi_value().unwrap().len() >= primaries);
}

#[test]
#[ignore = "requires a running Valkey cluster"]
fn test_custom_command_set_get() {
    let client = connect();
    let key = unique_key("it:custom");

    let set = client
        .custom_command(&args(&["SET", &key, "alice", "EX", "60"]))
        .unwrap();
    assert_eq!(set.into_single().unwrap(), Value::Okay);

    let get = client
        .custom_command_with_route(&args(&["GET", &key]), &Route::slot_key(key.clone()))
        .unwrap();
    assert_eq!(get.into_single().unwrap(), Value::from("alice"));
}

#[test]
#[ignore = "requires a running Valkey cluster"]
fn test_custom_command_fanout_shapes() {
    let client = connect();

    let dbsize = client.custom_command(&args(&["DBSIZE"])).unwrap();
    assert!(matches!(dbsize.into_single().unwrap(), Value::Int(n) if n >= 0));

    let clients = client
        .custom_command_with_route(&args(&["CLIENT", "LIST"]), &Route::AllPrimaries)
        .unwrap();
    assert!(clients.is_multi());
}

#[test]
#[ignore = "requires a running Valkey cluster"]
fn test_script_flush() {
    let client = connect();
    let options = ScriptFlushOptions::new().with_mode(FlushMode::Sync);
    assert_eq!(client.script_flush(&options).unwrap(), "OK");
}

#[test]
#[ignore = "requires a running Valkey cluster"]
fn test_cluster_scan_finds_keys_on_every_primary() {
    let client = connect();
    let prefix = unique_key("it:scan");
    let written: Vec<String> = (0..50).map(|i| format!("{prefix}:{i}")).collect();
    for key in &written {
        client
            .custom_command(&args(&["SET", key, "1", "EX", "60"]))
            .unwrap();
    }

    let options = ScanOptions::new().with_match(format!("{prefix}:*")).with_count(100);
    let mut cursor = ClusterScanCursor::new();
    let mut found = Vec::new();
    while !cursor.is_finished() {
        let (next, keys) = client.cluster_scan(cursor, &options).unwrap();
        found.extend(keys.iter().filter_map(|k| k.as_str().map(str::to_string)));
        cursor = next;
    }

    found.sort();
    found.dedup();
    let mut expected = written;
    expected.sort();
    assert_eq!(found, expected);
}
