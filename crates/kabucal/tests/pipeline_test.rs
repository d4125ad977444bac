//! End-to-end pipeline tests against in-memory sources.

use chrono::NaiveDate;
use ical::IcalParser;
use kabucal::{PipelineConfig, PipelineError, Sources, generate};
use kabucal_data::dates::DateRange;
use kabucal_data::jquants::{AnnouncementRow, TradingCalendarRow};
use kabucal_data::{AnnouncementRecord, AnnouncementSource, SourceTag, TradingCalendarSource};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tempfile::TempDir;

/// Primary source: raw API rows, normalized the way the real client does.
struct FakeApi(Vec<AnnouncementRow>);

impl AnnouncementSource for FakeApi {
    async fn announcements(&self) -> Vec<AnnouncementRecord> {
        self.0
            .iter()
            .cloned()
            .filter_map(AnnouncementRow::into_record)
            .collect()
    }
}

struct FakeSpreadsheet(Vec<AnnouncementRecord>);

impl AnnouncementSource for FakeSpreadsheet {
    async fn announcements(&self) -> Vec<AnnouncementRecord> {
        self.0.clone()
    }
}

struct FakeCalendar(Vec<TradingCalendarRow>);

impl TradingCalendarSource for FakeCalendar {
    async fn trading_calendar(&self, _range: DateRange) -> Vec<TradingCalendarRow> {
        self.0.clone()
    }

    async fn trading_calendar_error(&self, _range: DateRange) -> Option<String> {
        None
    }
}

fn api_row(code: &str, name: &str, date: &str, quarter: Option<&str>) -> AnnouncementRow {
    AnnouncementRow {
        date: Some(date.to_string()),
        code: Some(code.to_string()),
        company_name: Some(name.to_string()),
        fiscal_quarter: quarter.map(str::to_string),
        ..Default::default()
    }
}

fn sheet_record(code: &str, name: &str, date: &str) -> AnnouncementRecord {
    AnnouncementRecord {
        code: code.to_string(),
        company_name: name.to_string(),
        date: date_of(date),
        fiscal_quarter: None,
        fiscal_year: Some("2024".to_string()),
        fiscal_year_end: Some("3月".to_string()),
        source: SourceTag::Fallback,
    }
}

fn calendar_row(date: &str, division: i64) -> TradingCalendarRow {
    TradingCalendarRow {
        date: Some(date.to_string()),
        holiday_division: Some(division),
        is_trading_day: None,
    }
}

fn date_of(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn config_in(dir: &TempDir) -> PipelineConfig {
    PipelineConfig {
        output: dir.path().join("japan-all-stocks.ics"),
        ..Default::default()
    }
}

/// `(uid, summary)` for every event in the file.
fn read_events(path: &Path) -> Vec<(String, String)> {
    let reader = BufReader::new(File::open(path).unwrap());
    let mut out = Vec::new();
    for calendar in IcalParser::new(reader) {
        for event in calendar.unwrap().events {
            let get = |name: &str| {
                event
                    .properties
                    .iter()
                    .find(|p| p.name == name)
                    .and_then(|p| p.value.clone())
                    .unwrap_or_default()
            };
            out.push((get("UID"), get("SUMMARY")));
        }
    }
    out
}

#[tokio::test]
async fn test_primary_wins_over_fallback() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let api = FakeApi(vec![api_row("1234", "Alpha", "2024-03-31", Some("Q1"))]);
    let sheet = FakeSpreadsheet(vec![
        sheet_record("1234", "Alpha (JPX)", "2024-03-31"),
        sheet_record("5678", "Beta", "2024-04-15"),
    ]);
    let calendar = FakeCalendar(Vec::new());
    let sources = Sources {
        primary: Some(&api),
        fallback: Some(&sheet),
        calendar: &calendar,
    };

    let summary = generate(sources, &config, date_of("2024-01-01")).await.unwrap();

    assert_eq!(summary.announcements, 2);
    let events = read_events(&config.output);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0, "1234-announcement-2024-03-31");
    assert_eq!(events[0].1, "[決算] Alpha (1234) Q1");
    assert_eq!(events[1].1, "[決算] Beta (5678) 2024");
}

#[tokio::test]
async fn test_empty_upstream_still_writes_valid_file() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let api = FakeApi(Vec::new());
    let sheet = FakeSpreadsheet(Vec::new());
    let calendar = FakeCalendar(Vec::new());
    let sources = Sources {
        primary: Some(&api),
        fallback: Some(&sheet),
        calendar: &calendar,
    };

    let summary = generate(sources, &config, date_of("2024-01-01")).await.unwrap();

    assert_eq!(summary.events, 0);
    let text = std::fs::read_to_string(&config.output).unwrap();
    assert!(text.contains("BEGIN:VCALENDAR"));
    assert!(!text.contains("BEGIN:VEVENT"));
    assert!(read_events(&config.output).is_empty());
}

#[tokio::test]
async fn test_invalid_dates_are_skipped() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let api = FakeApi(vec![
        api_row("1111", "Good", "2024-05-10", None),
        api_row("2222", "Bad", "2024/05/10", None),
        api_row("3333", "Worse", "not-a-date", None),
    ]);
    let calendar = FakeCalendar(vec![
        calendar_row("2024-05-03", 0),
        calendar_row("garbage", 0),
        calendar_row("2024-05-07", 1),
    ]);
    let sources = Sources::<_, FakeSpreadsheet, _> {
        primary: Some(&api),
        fallback: None,
        calendar: &calendar,
    };

    let summary = generate(sources, &config, date_of("2024-01-01")).await.unwrap();

    assert_eq!(summary.announcements, 1);
    assert_eq!(summary.holidays, 1);
    let uids: Vec<_> = read_events(&config.output).into_iter().map(|(uid, _)| uid).collect();
    assert_eq!(uids, ["1111-announcement-2024-05-10", "holiday-2024-05-03"]);
}

#[tokio::test]
async fn test_fallback_only_when_primary_disabled() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let sheet = FakeSpreadsheet(vec![sheet_record("7203", "トヨタ自動車", "2024-05-08")]);
    let calendar = FakeCalendar(Vec::new());
    let sources = Sources::<FakeApi, _, _> {
        primary: None,
        fallback: Some(&sheet),
        calendar: &calendar,
    };

    let summary = generate(sources, &config, date_of("2024-01-01")).await.unwrap();

    assert_eq!(summary.events, 1);
}

#[tokio::test]
async fn test_no_source_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig {
        use_fallback: false,
        ..config_in(&dir)
    };
    let sheet = FakeSpreadsheet(vec![sheet_record("7203", "トヨタ自動車", "2024-05-08")]);
    let calendar = FakeCalendar(Vec::new());
    let sources = Sources::<FakeApi, _, _> {
        primary: None,
        fallback: Some(&sheet),
        calendar: &calendar,
    };

    let result = generate(sources, &config, date_of("2024-01-01")).await;

    assert!(matches!(result, Err(PipelineError::NoSource)));
    assert!(!config.output.exists());
}

#[tokio::test]
async fn test_regeneration_keeps_uids() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let api = FakeApi(vec![api_row("9984", "ソフトバンクグループ", "2024-05-13", None)]);
    let calendar = FakeCalendar(vec![calendar_row("2024-05-06", 0)]);
    let sources = Sources::<_, FakeSpreadsheet, _> {
        primary: Some(&api),
        fallback: None,
        calendar: &calendar,
    };

    generate(sources, &config, date_of("2024-01-01")).await.unwrap();
    let first = read_events(&config.output);
    generate(sources, &config, date_of("2024-01-01")).await.unwrap();
    let second = read_events(&config.output);

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_oversized_window_fails_before_writing() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig {
        days: u32::MAX,
        ..config_in(&dir)
    };
    let api = FakeApi(vec![api_row("1111", "Good", "2024-05-10", None)]);
    let calendar = FakeCalendar(Vec::new());
    let sources = Sources::<_, FakeSpreadsheet, _> {
        primary: Some(&api),
        fallback: None,
        calendar: &calendar,
    };

    let result = generate(sources, &config, date_of("2024-01-01")).await;

    assert!(matches!(result, Err(PipelineError::Config(_))));
    assert!(!config.output.exists());
}
