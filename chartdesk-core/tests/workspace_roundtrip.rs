//! Workspace persistence, import/export and tab switching through a session.

use chartdesk_core::domain::{Bar, Point, Segment, Shape, Timeframe};
use chartdesk_core::drawing::{Tool, Viewport};
use chartdesk_core::indicators::{IndicatorKey, IndicatorParams};
use chartdesk_core::interaction::{InteractionConfig, PointerEvent, PointerKind};
use chartdesk_core::session::{BarUpdate, ChartSession};
use chartdesk_core::workspace::{self, export, import, WorkspaceError, WorkspaceRecord, WorkspaceTabs};

fn every_shape() -> Vec<Shape> {
    vec![
        Shape::Trendline(Segment::new(10.0, 20.0, 110.0, 60.0)),
        Shape::Rectangle(Segment::new(30.0, 30.0, 90.0, 80.0)),
        Shape::Arrow(Segment::new(5.0, 5.0, 45.0, 45.0)),
        Shape::Fib(Segment::new(100.0, 50.0, 200.0, 250.0)),
        Shape::Hline { y: 123.5 },
        Shape::Text {
            x: 60.0,
            y: 70.0,
            text: "breakout".into(),
        },
    ]
}

fn session_for(record: WorkspaceRecord) -> ChartSession {
    let mut s = ChartSession::from_record(record, InteractionConfig::default(), IndicatorParams::default());
    s.interact(|router, _| router.set_viewport(Viewport::new(800.0, 400.0)));
    s
}

fn drag(s: &mut ChartSession, from: (f64, f64), to: (f64, f64)) {
    for (kind, (x, y)) in [
        (PointerKind::Down, from),
        (PointerKind::Move, ((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0)),
        (PointerKind::Up, to),
    ] {
        s.handle_pointer(PointerEvent {
            kind,
            at: Point::new(x, y),
        });
    }
}

fn bar(time: i64, close: f64) -> Bar {
    Bar {
        time,
        open: close,
        high: close + 2.0,
        low: close - 2.0,
        close,
        volume: 1_000,
    }
}

#[test]
fn every_shape_survives_export_and_import() {
    // GIVEN a record holding one shape of each kind and two indicators
    let mut record = WorkspaceRecord::new("AAPL", Timeframe::OneHour);
    record.drawings = every_shape();
    record.active_indicators = vec![IndicatorKey::Rsi.to_active(), IndicatorKey::Macd.to_active()];

    // WHEN exported and imported again
    let json = export(&record).unwrap();
    let back = import(&json).unwrap();

    // THEN nothing changed and the type tags are the lowercase names
    assert_eq!(back, record);
    for tag in ["trendline", "rectangle", "arrow", "fib", "hline", "text"] {
        assert!(json.contains(&format!("\"type\": \"{tag}\"")), "missing {tag}");
    }
    assert!(json.contains("\"activeIndicators\""));
    assert!(json.contains("\"timeframe\": \"1h\""));
}

#[test]
fn dragged_shapes_persist_without_gesture_state() {
    // GIVEN a session where a rectangle is drawn and then moved by its body
    let mut s = session_for(WorkspaceRecord::new("AAPL", Timeframe::OneDay));
    s.activate_tool(Tool::Rectangle);
    drag(&mut s, (100.0, 100.0), (200.0, 180.0));
    s.activate_tool(Tool::Select);
    drag(&mut s, (150.0, 100.0), (150.0, 100.0));
    assert_eq!(s.store().selection(), Some(0));
    drag(&mut s, (150.0, 100.0), (170.0, 120.0));

    // WHEN the tab is exported
    let json = export(&s.to_record()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    // THEN each drawing carries only its geometry
    let drawing = &value["drawings"][0];
    let mut keys: Vec<&str> = drawing.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["type", "x1", "x2", "y1", "y2"]);
    assert_eq!(
        s.store().drawings(),
        &[Shape::Rectangle(Segment::new(120.0, 120.0, 220.0, 200.0))]
    );
}

#[test]
fn import_normalises_symbol_and_fills_identity() {
    let json = r#"{
        "symbol": " msft ",
        "timeframe": "5m",
        "drawings": [{"type": "hline", "y": 99.5}],
        "activeIndicators": [{"key": "sma", "label": "SMA"}],
        "theme": "dark"
    }"#;
    let record = import(json).unwrap();
    assert_eq!(record.symbol, "MSFT");
    assert_eq!(record.label, "MSFT");
    assert_eq!(record.id.len(), 12);
    assert_eq!(record.timeframe, Timeframe::FiveMinutes);
}

#[test]
fn rejected_import_leaves_tabs_untouched() {
    // GIVEN a workspace with one tab
    let mut tabs = WorkspaceTabs::default();
    let before = tabs.fingerprint();

    // WHEN malformed or invalid documents are imported
    let cases = [
        ("not json", true),
        (r#"{"symbol": "AAPL", "timeframe": "1d", "drawings": []}"#, true),
        (r#"{"symbol": "AAPL", "timeframe": "2w", "drawings": [], "activeIndicators": []}"#, true),
        (r#"{"symbol": "  ", "timeframe": "1d", "drawings": [], "activeIndicators": []}"#, false),
        (
            r#"{"symbol": "AAPL", "timeframe": "1d", "drawings": [], "activeIndicators": [{"key": "vwap", "label": "VWAP"}]}"#,
            false,
        ),
    ];
    for (json, malformed) in cases {
        match import(json) {
            Ok(record) => {
                tabs.add(record);
                panic!("accepted {json}");
            }
            Err(WorkspaceError::Malformed(_)) => assert!(malformed, "{json}"),
            Err(WorkspaceError::Invalid(_)) => assert!(!malformed, "{json}"),
            Err(other) => panic!("unexpected error {other}"),
        }
    }

    // THEN the tab set is exactly what it was
    assert_eq!(tabs.fingerprint(), before);
    assert_eq!(tabs.len(), 1);
}

#[test]
fn switching_tabs_swaps_drawings_and_resets_history() {
    // GIVEN two tabs, the first with a drawing made in this session
    let mut tabs = WorkspaceTabs::default();
    let mut session = session_for(tabs.active().clone());
    session.activate_tool(Tool::Trendline);
    drag(&mut session, (10.0, 10.0), (90.0, 90.0));
    assert!(session.store().can_undo());

    let mut second = WorkspaceRecord::new("TSLA", Timeframe::FiveMinutes);
    second.drawings = vec![Shape::Hline { y: 50.0 }];
    tabs.store_active(session.to_record());
    tabs.add(second);

    // WHEN the session loads the second tab, then switches back
    session.load_record(tabs.active().clone());
    assert_eq!(session.symbol(), "TSLA");
    assert_eq!(session.store().drawings(), &[Shape::Hline { y: 50.0 }]);
    assert!(!session.store().can_undo());

    tabs.store_active(session.to_record());
    assert!(tabs.switch(0));
    session.load_record(tabs.active().clone());

    // THEN the first tab's drawing is back but cannot be undone
    assert_eq!(session.store().len(), 1);
    assert!(!session.store().can_undo());
    assert!(session.store().draft().is_none());
}

#[test]
fn tabs_persist_through_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chartdesk").join("workspace.json");

    let mut tabs = WorkspaceTabs::default();
    let mut record = WorkspaceRecord::new("NVDA", Timeframe::OneMinute);
    record.drawings = every_shape();
    tabs.add(record);
    tabs.rename(1, "Scalping board with a long name");
    workspace::save(&path, &tabs).unwrap();

    let loaded = workspace::load(&path);
    assert_eq!(loaded, tabs);
    assert_eq!(loaded.active_index(), 1);
    assert_eq!(loaded.active().label.chars().count(), 18);

    std::fs::write(&path, "{ broken").unwrap();
    assert_eq!(workspace::load(&path), WorkspaceTabs::default());
}

#[test]
fn streamed_bars_update_indicators_in_place() {
    // GIVEN a session with SMA(3) over three bars
    let mut s = session_for(WorkspaceRecord::new("AAPL", Timeframe::OneDay));
    s.toggle_indicator(IndicatorKey::Sma);
    s.apply_bars(vec![bar(86_400, 105.0), bar(172_800, 110.0), bar(259_200, 115.0)]);
    assert_eq!(s.indicators().latest("sma"), Some(110.0));

    // WHEN the forming bar is revised and then a new bar opens
    assert_eq!(s.apply_bar(bar(259_200, 118.0)), BarUpdate::Replaced);
    assert_eq!(s.indicators().latest("sma"), Some(111.0));
    assert_eq!(s.apply_bar(bar(345_600, 121.0)), BarUpdate::Appended);

    // THEN the indicator follows the newest close
    assert_eq!(s.indicators().latest("sma"), Some(116.3333));
    assert_eq!(s.apply_bar(bar(86_400, 1.0)), BarUpdate::Rejected);
    assert_eq!(s.bars().len(), 4);
}
