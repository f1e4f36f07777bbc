use std::io::Write;

use roadrisk_algorithms::{detect_hotspots, AlertEngine, DetectionConfig};
use roadrisk_core::{RiskLevel, UserContext};
use roadrisk_io::{read_accidents, read_hotspots, write_json};
use tempfile::{Builder, NamedTempFile};

const ACCIDENTS: &str = "\
id,latitude,longitude,severity,accident_time,weather_condition
1,10.0000,20.0000,dangerous,2024-05-06T08:10:00,Heavy Rain
2,10.0004,20.0002,dangerous,2024-05-06T08:40:00,Rain
3,10.0002,20.0004,major,2024-05-07T08:20:00,Rain
4,10.0003,20.0001,dangerous,2024-05-08T17:00:00,Clear
5,48.8566,2.3522,minor,2024-05-08T12:00:00,Clear
6,91.0,20.0,minor,,
";

#[test]
fn test_detect_write_read_evaluate() {
    let mut input = Builder::new().suffix(".csv").tempfile().unwrap();
    input.write_all(ACCIDENTS.as_bytes()).unwrap();

    let parsed = read_accidents(input.path()).unwrap();
    assert_eq!(parsed.records.len(), 6);
    assert!(parsed.rejected.is_empty());

    let detection = detect_hotspots(&parsed.records, &DetectionConfig::default()).unwrap();
    assert_eq!(detection.hotspots.len(), 1);
    assert_eq!(detection.rejected.len(), 1);
    assert_eq!(detection.noise_count, 1);

    let output = NamedTempFile::new().unwrap();
    write_json(output.path(), &detection).unwrap();

    let loaded = read_hotspots(output.path()).unwrap();
    assert_eq!(loaded.skipped, 0);
    assert_eq!(loaded.hotspots, detection.hotspots);

    let hotspot = &loaded.hotspots[0];
    assert_eq!(hotspot.risk_level, RiskLevel::High);
    assert_eq!(hotspot.time_patterns.peak_hours[0], 8);
    assert_eq!(hotspot.most_common_weather(), Some("Rain"));

    let context = UserContext::at(10.0002, 20.0002).with_weather("rain");
    let now = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(8, 15, 0)
        .unwrap();
    let alerts = AlertEngine::default()
        .evaluate_at(&context, &loaded.hotspots, now)
        .unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].risk_score, 4);
    assert_eq!(alerts[0].severity, RiskLevel::High);
}
