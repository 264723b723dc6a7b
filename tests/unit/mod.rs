// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Unit tests for valkey-cluster-client.
//!
//! These tests exercise the public API of individual components without a
//! cluster or an execution engine.

mod route_tests {
    use valkey_cluster_client::{NodeAddress, Route, SlotType};

    #[test]
    fn test_multi_node_predicate_table() {
        let cases = vec![
            (Route::AllNodes, true),
            (Route::AllPrimaries, true),
            (
                Route::multi_node(vec![
                    NodeAddress::new("10.0.0.1", 6379),
                    NodeAddress::new("10.0.0.2", 6379),
                ]),
                true,
            ),
            (Route::Random, false),
            (Route::slot_key("user:1"), false),
            (Route::replica_slot_key("user:1"), false),
            (Route::slot_id(0).unwrap(), false),
            (Route::by_address("10.0.0.1", 6379), false),
        ];

        for (route, expected) in cases {
            assert_eq!(route.is_multi_node(), expected, "route {}", route);
        }
    }

    #[test]
    fn test_route_serde() {
        let route: Route =
            serde_json::from_str(r#"{"type": "slot_key", "key": "user:1"}"#).unwrap();
        assert_eq!(route, Route::slot_key("user:1"));

        let route: Route = serde_json::from_str(
            r#"{"type": "slot_id", "id": 12, "slot_type": "replica"}"#,
        )
        .unwrap();
        assert_eq!(
            route,
            Route::SlotId {
                id: 12,
                slot_type: SlotType::Replica
            }
        );

        let route: Route = serde_json::from_str(
            r#"{"type": "multi_node", "nodes": [{"host": "a", "port": 1}]}"#,
        )
        .unwrap();
        assert!(route.is_multi_node());

        let json = serde_json::to_string(&Route::AllPrimaries).unwrap();
        assert_eq!(json, r#"{"type":"all_primaries"}"#);
    }

    #[test]
    fn test_route_serde_rejects_out_of_range_slot() {
        let err = serde_json::from_str::<Route>(r#"{"type": "slot_id", "id": 16384}"#)
            .unwrap_err();
        assert!(err.to_string().contains("out of range"), "{}", err);

        let route: Route = serde_json::from_str(r#"{"type": "slot_id", "id": 16383}"#).unwrap();
        assert_eq!(route, Route::slot_id(16383).unwrap());
    }

    #[test]
    fn test_route_display() {
        assert_eq!(Route::AllNodes.to_string(), "all-nodes");
        assert_eq!(
            Route::by_address("node-a", 7000).to_string(),
            "address(node-a:7000)"
        );
    }
}

mod cluster_value_tests {
    use std::collections::HashMap;

    use valkey_cluster_client::ClusterValue;

    #[test]
    fn test_wrong_accessor_is_misuse() {
        let single = ClusterValue::Single("PONG".to_string());
        assert!(single.multi_value().unwrap_err().is_misuse());

        let multi: ClusterValue<String> = ClusterValue::Multi(HashMap::new());
        assert!(multi.single_value().unwrap_err().is_misuse());
    }

    #[test]
    fn test_try_map_parses_every_node() {
        let mut map = HashMap::new();
        map.insert("a:1".to_string(), "role:master\nconnected_slaves:1".to_string());
        map.insert("b:2".to_string(), "role:slave\nconnected_slaves:0".to_string());

        let parsed = ClusterValue::Multi(map)
            .try_map(|info| valkey_cluster_client::parsing::parse_info_output(&info))
            .unwrap();
        let parsed = parsed.into_multi().unwrap();
        assert_eq!(parsed["a:1"]["role"], "master");
        assert_eq!(parsed["b:2"]["connected_slaves"], "0");
    }
}

mod options_tests {
    use valkey_cluster_client::{
        ClusterInfoOptions, ClusterPingOptions, FlushMode, InfoOptions, Route,
        ScriptFlushOptions, Section,
    };

    #[test]
    fn test_info_sections() {
        let opts = InfoOptions::new().with_sections([Section::Everything]);
        assert_eq!(opts.to_args(), vec!["everything"]);
        assert_eq!(Section::Commandstats.to_string(), "commandstats");
    }

    #[test]
    fn test_default_options_have_no_route() {
        assert!(ClusterInfoOptions::new().route().is_none());
        assert!(ClusterPingOptions::new().route().is_none());
        assert!(ScriptFlushOptions::new().route().is_none());
    }

    #[test]
    fn test_flush_options_serde() {
        let opts: ScriptFlushOptions =
            serde_json::from_str(r#"{"mode": "SYNC", "route": {"type": "all_nodes"}}"#).unwrap();
        assert_eq!(opts.mode, Some(FlushMode::Sync));
        assert_eq!(opts.route(), Some(&Route::AllNodes));
        assert_eq!(opts.to_args(), vec!["SYNC"]);
    }
}

mod error_tests {
    use valkey_cluster_client::{BridgeError, ClientError, DecodeError};

    #[test]
    fn test_error_display() {
        let err = ClientError::from(BridgeError::Request("ERR wrong number of arguments".into()));
        assert_eq!(
            err.to_string(),
            "Execution error: Request error: ERR wrong number of arguments"
        );

        let err = ClientError::from(DecodeError::ExpectedMap { found: "string" });
        assert_eq!(
            err.to_string(),
            "Decode error: Expected a per-node map, found string"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ClientError::from(BridgeError::ScriptNotFound("abc".into())).kind(),
            "bridge"
        );
        assert!(!ClientError::from(BridgeError::Routing("no nodes".into())).is_retryable());
        assert!(ClientError::from(BridgeError::Disconnect("eof".into())).is_retryable());
    }
}

mod config_tests {
    use std::time::Duration;

    use valkey_cluster_client::{BridgeConfig, FredBridge, NodeAddress};

    #[test]
    fn test_config_from_json() {
        let config: BridgeConfig = serde_json::from_str(
            r#"{
                "hosts": [{"host": "valkey-0", "port": 6379}, {"host": "valkey-1", "port": 6379}],
                "password": "secret",
                "tls": {"ca_cert_pem": null}
            }"#,
        )
        .unwrap();

        assert_eq!(config.hosts.len(), 2);
        assert_eq!(config.hosts[1], NodeAddress::new("valkey-1", 6379));
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert!(config.tls.is_some());
        assert_eq!(config.command_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_connect_rejects_empty_hosts() {
        assert!(FredBridge::connect(BridgeConfig::default()).is_err());
    }
}

mod parsing_tests {
    use valkey_cluster_client::parsing::{ReplicationInfo, parse_info_int, parse_info_value};

    const INFO: &str = "# Server\r\nredis_version:7.2.4\r\ntcp_port:6379\r\n\r\n# Replication\r\nrole:slave\r\nmaster_host:10.0.0.1\r\n";

    #[test]
    fn test_info_lookups() {
        assert_eq!(parse_info_value(INFO, "master_host").as_deref(), Some("10.0.0.1"));
        assert_eq!(parse_info_int(INFO, "tcp_port"), Some(6379));
    }

    #[test]
    fn test_replica_info() {
        let repl = ReplicationInfo::parse(INFO).unwrap();
        assert!(!repl.is_primary());
        assert_eq!(repl.connected_replicas, None);
    }
}
