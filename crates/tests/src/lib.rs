//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 完整管道 e2e 测试（演示世界 → 检测引擎 → 日志/上报）
//! - 收集器故障注入测试（降级到备用地址、完全不可达）

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        CollectorConfig, DetectionStrategy, Point, RadarBlueprint, TelemetryProvider,
        ViolationEvent, ZoneConfig,
    };
    use detection::{DetectionEngine, PlateRegistry};
    use observability::ViolationAggregator;
    use telemetry::MockTelemetry;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use violation_sink::{CollectorClient, DeliveryHandle, ViolationJournal, ViolationSink};

    const DEMO_CONFIG: &str = r#"
[[zones]]
id = "radar_center"
x = 100.0
y = 100.0
speed_limit = 10.0
detection_radius = 80.0
description = "city center approach"

[[zones]]
id = "radar_school"
x = -400.0
y = 250.0
speed_limit = 8.0
detection_radius = 60.0

[engine]
strategy = "edge"
cooldown_ticks = 100
sweep_interval = 500
"#;

    fn demo_blueprint() -> RadarBlueprint {
        ConfigLoader::load_from_str(DEMO_CONFIG, ConfigFormat::Toml).unwrap()
    }

    fn single_zone_blueprint(strategy: DetectionStrategy) -> RadarBlueprint {
        let mut blueprint = RadarBlueprint {
            version: Default::default(),
            zones: vec![ZoneConfig {
                id: "radar_center".to_string(),
                x: 100.0,
                y: 100.0,
                speed_limit: 10.0,
                detection_radius: 50.0,
                description: String::new(),
            }],
            engine: Default::default(),
            journal: Default::default(),
            collector: None,
        };
        blueprint.engine.strategy = strategy;
        blueprint
    }

    /// Accept HTTP POSTs on an ephemeral port, record `(request line, body)`
    /// and answer 200. One connection per request; the response closes it.
    async fn spawn_stub_collector() -> (String, mpsc::UnboundedReceiver<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    loop {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                        if let Some(request) = parse_request(&buf) {
                            let _ = tx.send(request);
                            let _ = socket
                                .write_all(
                                    b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
                                )
                                .await;
                            let _ = socket.shutdown().await;
                            break;
                        }
                    }
                });
            }
        });

        (format!("http://{addr}"), rx)
    }

    /// Split a buffered HTTP request into its request line and body once the
    /// whole content-length has arrived.
    fn parse_request(buf: &[u8]) -> Option<(String, String)> {
        let text = String::from_utf8_lossy(buf);
        let head_end = text.find("\r\n\r\n")?;
        let head = &text[..head_end];
        let request_line = head.lines().next()?.to_string();
        let content_length: usize = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);

        let body = &buf[head_end + 4..];
        if body.len() < content_length {
            return None;
        }
        Some((
            request_line,
            String::from_utf8_lossy(&body[..content_length]).to_string(),
        ))
    }

    /// Bind then drop a listener so the port is known to refuse connections.
    fn refused_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    fn collector_config(primary: &str, fallback: Option<&str>) -> CollectorConfig {
        CollectorConfig {
            primary_url: primary.to_string(),
            fallback_url: fallback.map(str::to_string),
            timeout_ms: 500,
            queue_capacity: 16,
        }
    }

    /// End-to-end: demo world -> DetectionEngine -> ViolationSink (journal only)
    ///
    /// 验证完整的数据流：
    /// 1. 从 TOML 配置加载区域
    /// 2. 演示世界驱动 edge 策略逐 tick 检测
    /// 3. 每条违章都写入本地日志
    #[tokio::test]
    async fn test_e2e_demo_world_to_journal() {
        let blueprint = demo_blueprint();
        let mut provider = MockTelemetry::demo_world(&blueprint.zones, 3, 42);
        // Pin one vehicle well above its zone's limit so the run is never
        // violation-free, whatever the seed placed elsewhere.
        provider.set_speed("veh_0_0", 15.0);

        let mut engine =
            DetectionEngine::from_blueprint(&blueprint, Some("run-e2e"), PlateRegistry::with_seed(42));
        engine.prepare(&mut provider).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("violations.log");
        let journal = ViolationJournal::create(&path, Some("run-e2e")).unwrap();
        let mut sink = ViolationSink::new(journal, None);

        let mut aggregator = ViolationAggregator::new();
        for tick in 0..300 {
            for event in engine.tick(tick, &provider) {
                aggregator.update(&event);
                sink.emit(&event).unwrap();
            }
            provider.step();
        }

        assert!(engine.total_checks() > 0, "edge strategy should check vehicles");
        assert!(
            engine.total_violations() >= 1,
            "the pinned speeder must be caught at least once"
        );
        assert_eq!(sink.records(), engine.total_violations());
        assert_eq!(aggregator.summary().total_violations, engine.total_violations());

        sink.close().await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("SPEED VIOLATIONS LOG"));
        assert!(text.contains("Run:     run-e2e"));
        assert!(text.contains("VIOLATION #1"));
        assert!(text.contains("radar_center"));
    }

    /// Cooldown timeline: a vehicle parked over the limit inside the zone is
    /// reported at tick 0, suppressed for the window, reported again exactly
    /// when the window expires.
    #[tokio::test]
    async fn test_e2e_cooldown_timeline() {
        let blueprint = single_zone_blueprint(DetectionStrategy::FullScan);
        assert_eq!(blueprint.engine.cooldown_ticks, 100);

        let mut provider = MockTelemetry::new();
        provider.place_vehicle("veh_fast", Point::new(100.0, 100.0), 15.0);

        let mut engine =
            DetectionEngine::from_blueprint(&blueprint, None, PlateRegistry::with_seed(7));
        engine.prepare(&mut provider).unwrap();

        let mut violation_ticks = Vec::new();
        let mut first_event: Option<ViolationEvent> = None;
        for tick in 0..=100 {
            for event in engine.tick(tick, &provider) {
                violation_ticks.push(tick);
                first_event.get_or_insert(event);
            }
            provider.step();
        }

        assert_eq!(violation_ticks, vec![0, 100], "one report per cooldown window");

        let event = first_event.unwrap();
        assert_eq!(event.zone_id, "radar_center");
        assert_eq!(event.speed_kmh, 54.0);
        assert_eq!(event.speed_limit_kmh, 36.0);
        assert_eq!(event.overspeed_kmh, 18.0);
    }

    /// Full lifecycle against a live collector: run start, violation
    /// delivery through the background queue, run end.
    #[tokio::test]
    async fn test_e2e_collector_lifecycle_and_delivery() {
        let (url, mut requests) = spawn_stub_collector().await;
        let client = CollectorClient::new(&collector_config(&url, None)).unwrap();

        client.notify_run_started("run-lifecycle").await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let journal =
            ViolationJournal::create(&dir.path().join("violations.log"), Some("run-lifecycle"))
                .unwrap();
        let delivery = DeliveryHandle::spawn(client.clone(), 16);
        let mut sink = ViolationSink::new(journal, Some(delivery));

        let event = ViolationEvent::new(
            Some("run-lifecycle".to_string()),
            "radar_center",
            contracts::VehicleId::new("veh_1"),
            "10482-K-07",
            42,
            Point::new(100.0, 100.0),
            10.0,
            15.0,
            "city center approach",
        );
        sink.emit(&event).unwrap();

        let metrics = sink.close().await.unwrap().unwrap();
        assert_eq!(metrics.delivered, 1);
        assert_eq!(metrics.failed, 0);
        assert_eq!(metrics.dropped, 0);

        client.notify_run_ended("run-lifecycle").await.unwrap();

        let (line, body) = requests.try_recv().unwrap();
        assert!(line.starts_with("POST /api/runs/start"), "got: {line}");
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&body).unwrap()["run_id"],
            "run-lifecycle"
        );

        let (line, body) = requests.try_recv().unwrap();
        assert!(line.starts_with("POST /api/violations"), "got: {line}");
        let delivered: ViolationEvent = serde_json::from_str(&body).unwrap();
        assert_eq!(delivered, event, "the wire event round-trips unchanged");

        let (line, _) = requests.try_recv().unwrap();
        assert!(line.starts_with("POST /api/runs/end"), "got: {line}");

        assert!(requests.try_recv().is_err(), "no extra requests expected");
    }

    /// Primary refuses connections: the event reaches the fallback exactly
    /// once and still counts as delivered.
    #[tokio::test]
    async fn test_e2e_fallback_receives_delivery() {
        let (fallback_url, mut requests) = spawn_stub_collector().await;
        let config = collector_config(&refused_url(), Some(&fallback_url));
        let client = CollectorClient::new(&config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let journal =
            ViolationJournal::create(&dir.path().join("violations.log"), Some("run-fb")).unwrap();
        let delivery = DeliveryHandle::spawn(client, 16);
        let mut sink = ViolationSink::new(journal, Some(delivery));

        let event = ViolationEvent::new(
            Some("run-fb".to_string()),
            "radar_center",
            contracts::VehicleId::new("veh_1"),
            "20991-C-31",
            7,
            Point::new(100.0, 100.0),
            10.0,
            13.0,
            "",
        );
        sink.emit(&event).unwrap();

        let metrics = sink.close().await.unwrap().unwrap();
        assert_eq!(metrics.delivered, 1);
        assert_eq!(metrics.failed, 0);

        let (line, _) = requests.try_recv().unwrap();
        assert!(line.starts_with("POST /api/violations"), "got: {line}");
        assert!(
            requests.try_recv().is_err(),
            "fallback must receive the event exactly once"
        );
    }

    /// Both collector addresses down: the journal still gets every record,
    /// emit stays Ok and only the delivery counters show the failure.
    #[tokio::test]
    async fn test_e2e_unreachable_collector_keeps_journal() {
        let config = collector_config(&refused_url(), Some(&refused_url()));
        let client = CollectorClient::new(&config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("violations.log");
        let journal = ViolationJournal::create(&path, Some("run-down")).unwrap();
        let delivery = DeliveryHandle::spawn(client, 16);
        let mut sink = ViolationSink::new(journal, Some(delivery));

        let event = ViolationEvent::new(
            Some("run-down".to_string()),
            "radar_center",
            contracts::VehicleId::new("veh_1"),
            "31240-M-55",
            3,
            Point::new(100.0, 100.0),
            10.0,
            12.0,
            "",
        );
        sink.emit(&event).unwrap();
        assert_eq!(sink.records(), 1);

        let metrics = sink.close().await.unwrap().unwrap();
        assert_eq!(metrics.delivered, 0);
        assert_eq!(metrics.failed, 1);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("VIOLATION #1"));
    }

    /// Subscription strategy survives a zone outage: the zone degrades to
    /// full scans and keeps catching the speeder, then recovers.
    #[tokio::test]
    async fn test_e2e_subscription_outage_degrades_to_full_scan() {
        let blueprint = single_zone_blueprint(DetectionStrategy::ContextSubscription);

        let mut provider = MockTelemetry::new();
        provider.place_vehicle("veh_fast", Point::new(100.0, 100.0), 15.0);
        provider.fail_subscription("radar_center");

        let mut engine =
            DetectionEngine::from_blueprint(&blueprint, None, PlateRegistry::with_seed(7));
        // Registration fails, which is not fatal: the zone starts degraded.
        engine.prepare(&mut provider).unwrap();
        assert_eq!(engine.zones_in_fallback(), 1);

        let events = engine.tick(0, &provider);
        assert_eq!(events.len(), 1, "fallback full scan still catches the speeder");

        // Channel restored (and the zone re-registered) after the outage.
        provider.restore_subscription("radar_center");
        provider
            .subscribe_zone("radar_center", Point::new(100.0, 100.0), 50.0)
            .unwrap();
        let _ = engine.tick(1, &provider);
        assert_eq!(engine.zones_in_fallback(), 0, "recovery clears the outage");

        // Wait out the cooldown window; the recovered subscription reports.
        for tick in 2..=100 {
            let events = engine.tick(tick, &provider);
            if tick == 100 {
                assert_eq!(events.len(), 1, "subscription path reports after cooldown");
            } else {
                assert!(events.is_empty(), "cooldown suppresses tick {tick}");
            }
        }
    }

    /// A paced demo run completes and the engine counters line up with
    /// what the sink observed.
    #[tokio::test]
    async fn test_e2e_paced_run_counters_consistent() {
        let blueprint = demo_blueprint();
        let mut provider = MockTelemetry::demo_world(&blueprint.zones, 2, 7);

        let mut engine =
            DetectionEngine::from_blueprint(&blueprint, Some("run-paced"), PlateRegistry::with_seed(7));
        engine.prepare(&mut provider).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let journal =
            ViolationJournal::create(&dir.path().join("violations.log"), Some("run-paced")).unwrap();
        let mut sink = ViolationSink::new(journal, None);

        let mut emitted = 0u64;
        for tick in 0..50 {
            for event in engine.tick(tick, &provider) {
                sink.emit(&event).unwrap();
                emitted += 1;
            }
            provider.step();
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        assert_eq!(emitted, engine.total_violations());
        assert_eq!(sink.records(), emitted);

        let stats = engine.stats();
        assert_eq!(stats.ticks_processed, 50);
        assert_eq!(
            stats.zones.iter().map(|z| z.violations).sum::<u64>(),
            emitted
        );
        sink.close().await.unwrap();
    }
}
