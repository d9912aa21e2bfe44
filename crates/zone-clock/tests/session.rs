use std::time::Duration;

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use zone_clock::{
    FileStorage, Location, ManualClock, MemoryStorage, Persistence, PersistenceAdapter, Removal,
    Session, Settings, Source, ZoneId,
};

const BASE: &str = "https://example.com/converter";

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap())
}

fn start<P: PersistenceAdapter>(persistence: P, clock: &ManualClock) -> Session<P, &ManualClock> {
    zone_clock::logging::init_for_tests();
    Session::start_with_anchor(persistence, clock, &Settings::default(), Tz::America__New_York)
}

fn codes<P: PersistenceAdapter>(session: &Session<P, &ManualClock>) -> Vec<String> {
    session
        .selection()
        .zones()
        .map(|zone| zone.short_code.clone())
        .collect()
}

#[test]
fn add_then_remove_scenario() {
    let clock = clock();
    let persistence = Persistence::new(MemoryStorage::new(), Location::parse(BASE).unwrap());
    let mut session = start(persistence, &clock);

    assert_eq!(codes(&session), ["IND", "BOS", "SF", "LON"]);

    let syd = session.add_by_code("syd").expect("SYD is in the catalog");
    assert_eq!(codes(&session), ["IND", "BOS", "SF", "LON", "SYD"]);
    assert!(session.rows().last().unwrap().entering);
    assert_eq!(
        session.persistence().location().zone_codes().unwrap(),
        ["IND", "BOS", "SF", "LON", "SYD"]
    );

    let bos = ZoneId::from("bos");
    assert!(matches!(session.remove(&bos), Removal::Scheduled { .. }));

    // not gone yet, and the persisted list still has it
    clock.advance(Duration::from_millis(100));
    session.settle();
    assert_eq!(codes(&session), ["IND", "BOS", "SF", "LON", "SYD"]);
    assert!(session.rows()[1].leaving);
    assert_eq!(session.persistence().location().zone_codes().unwrap().len(), 5);

    // the highlight window on SYD is long over by now
    assert!(!session.rows()[4].entering);

    let deadline = session.next_deadline().expect("removal pending");
    clock.advance(Duration::from_millis(200));
    assert!(clock_reached(&clock, deadline));

    let settled = session.settle();
    assert_eq!(settled.removed.len(), 1);
    assert_eq!(codes(&session), ["IND", "SF", "LON", "SYD"]);
    assert_eq!(
        session.persistence().location().zone_codes().unwrap(),
        ["IND", "SF", "LON", "SYD"]
    );
    assert!(session.selection().get(&syd).is_some());
}

fn clock_reached(clock: &ManualClock, deadline: std::time::Instant) -> bool {
    use zone_clock::Clock;
    clock.monotonic() >= deadline
}

#[test]
fn remove_twice_removes_once() {
    let clock = clock();
    let persistence = Persistence::new(MemoryStorage::new(), Location::parse(BASE).unwrap());
    let mut session = start(persistence, &clock);

    let lon = ZoneId::from("lon");
    assert!(matches!(session.remove(&lon), Removal::Scheduled { .. }));
    assert_eq!(session.remove(&lon), Removal::AlreadyPending);

    clock.advance(Duration::from_secs(1));
    assert_eq!(session.settle().removed.len(), 1);
    assert_eq!(codes(&session), ["IND", "BOS", "SF"]);

    assert_eq!(session.remove(&lon), Removal::NotFound);
}

#[test]
fn cannot_remove_every_zone() {
    let clock = clock();
    let location = Location::parse(&format!("{BASE}?zones=TYO,SEL")).unwrap();
    let mut session = start(Persistence::new(MemoryStorage::new(), location), &clock);

    let ids: Vec<_> = session.rows().into_iter().map(|row| row.id).collect();
    assert!(matches!(session.remove(&ids[0]), Removal::Scheduled { .. }));
    assert_eq!(session.remove(&ids[1]), Removal::LastZone);
    assert!(!session.rows()[1].can_remove);

    clock.advance(Duration::from_secs(1));
    session.settle();
    assert_eq!(codes(&session), ["SEL"]);
}

#[test]
fn location_takes_priority_over_storage() {
    let mut storage = MemoryStorage::new();
    storage.insert(
        "timezone-converter-locations",
        r#"[{"id":"syd","abbreviation":"SYD","timezone":"Australia/Sydney","fullName":"Sydney, AU"}]"#,
    );

    let location = Location::parse(&format!("{BASE}?zones=LON,PAR")).unwrap();
    let persistence = Persistence::new(storage, location);
    assert_eq!(persistence.load_initial_selection().0, Source::Location);

    let clock = clock();
    let session = start(persistence, &clock);
    assert_eq!(codes(&session), ["LON", "PAR"]);

    // starting the session overwrote the stored list with the shared one
    let stored = session
        .persistence()
        .storage()
        .raw("timezone-converter-locations")
        .unwrap();
    assert!(stored.contains("\"LON\"") && !stored.contains("SYD"));
}

#[test]
fn reload_restores_list_and_labels() {
    let dir = std::env::temp_dir().join(format!("zone-clock-it-{}", uuid_like()));
    let clock = clock();

    let added = {
        let persistence = Persistence::new(FileStorage::new(&dir), Location::parse(BASE).unwrap());
        let mut session = start(persistence, &clock);
        let id = session.add_by_code("AKL").unwrap();

        let bos = ZoneId::from("bos");
        session.remove(&bos);
        clock.advance(Duration::from_secs(1));
        session.settle();
        id
    };

    // no query string this time, so the stored list is used as is
    let persistence = Persistence::new(FileStorage::new(&dir), Location::parse(BASE).unwrap());
    let (source, zones) = persistence.load_initial_selection();
    assert_eq!(source, Source::Storage);

    let codes: Vec<_> = zones.iter().map(|zone| zone.short_code.as_str()).collect();
    assert_eq!(codes, ["IND", "SF", "LON", "AKL"]);
    assert_eq!(zones[3].id, added);
    assert_eq!(zones[3].display_label.as_deref(), Some("Auckland, NZ"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn shared_link_drops_labels() {
    let clock = clock();
    let location = Location::parse(&format!("{BASE}?zones=akl")).unwrap();
    let session = start(Persistence::new(MemoryStorage::new(), location), &clock);

    let rows = session.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].short_code, "AKL");
    assert_eq!(rows[0].label, None);
}

#[test]
fn slider_is_anchored_to_viewer_zone() {
    let clock = clock();
    let location = Location::parse(&format!("{BASE}?zones=BOS,LON")).unwrap();
    let mut session = start(Persistence::new(MemoryStorage::new(), location), &clock);

    // 12:00 UTC is 8:00 AM in New York (EDT)
    assert_eq!(session.slider_minutes(), 8 * 60);

    session.set_from_slider(22 * 60 + 45);
    assert_eq!(session.slider_label(), "10:45 PM");

    let rows = session.rows();
    let boston = rows[0].localized.as_ref().unwrap();
    let london = rows[1].localized.as_ref().unwrap();
    assert_eq!(boston.hour_minute, "10:45 PM");
    assert!(!boston.is_daytime);
    assert_eq!(london.hour_minute, "3:45 AM");
}

fn uuid_like() -> String {
    use rand::Rng;
    format!("{:016x}", rand::rng().random::<u64>())
}
