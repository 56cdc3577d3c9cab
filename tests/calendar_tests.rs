use chrono::Weekday;
use smart_schedule::{Day, ScheduleError, TimeSlot, WeekCalendar, WeekCalendarConfig};

#[test]
fn default_calendar_covers_teaching_week() {
    let cal = WeekCalendar::default();
    assert_eq!(cal.days(), &Day::ALL);
    assert_eq!(cal.days().first(), Some(&Day::Sunday));
    assert_eq!(cal.days().last(), Some(&Day::Thursday));
}

#[test]
fn rendering_slots_are_fifty_minute_rows_from_eight_to_fourteen() {
    let cal = WeekCalendar::default();
    let rendered: Vec<String> = cal.rendering_slots().iter().map(|s| s.to_string()).collect();
    assert_eq!(
        rendered,
        [
            "8:00-8:50",
            "9:00-9:50",
            "10:00-10:50",
            "11:00-11:50",
            "12:00-12:50",
            "13:00-13:50",
            "14:00-14:50",
        ]
    );
    // Double blocks and the 15:00 slot exist but are not grid rows.
    assert!(cal.slots().len() > rendered.len());
}

#[test]
fn is_rendered_rejects_double_blocks() {
    assert!(WeekCalendar::is_rendered(&TimeSlot::parse("8:00-8:50").unwrap()));
    assert!(!WeekCalendar::is_rendered(&TimeSlot::parse("8:00-9:50").unwrap()));
    assert!(!WeekCalendar::is_rendered(&TimeSlot::parse("7:00-7:50").unwrap()));
    assert!(!WeekCalendar::is_rendered(&TimeSlot::parse("15:00-15:50").unwrap()));
}

#[test]
fn calendar_requires_days_and_slots() {
    let slot = TimeSlot::parse("8:00-8:50").unwrap();
    let err = WeekCalendar::new(Vec::<Day>::new(), vec![slot]).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidCalendar { .. }));

    let err = WeekCalendar::new(vec![Day::Sunday], Vec::<TimeSlot>::new()).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidCalendar { .. }));
}

#[test]
fn duplicate_axes_are_collapsed() {
    let slot = TimeSlot::parse("9:00-9:50").unwrap();
    let cal = WeekCalendar::new(vec![Day::Monday, Day::Monday], vec![slot, slot]).unwrap();
    assert_eq!(cal.days(), &[Day::Monday]);
    assert_eq!(cal.slots(), &[slot]);
}

#[test]
fn config_round_trip_keeps_axes() {
    let config = WeekCalendarConfig::new(
        vec![Day::Sunday, Day::Tuesday],
        vec!["8:00-8:50", "10:00-11:50"],
    );
    let cal = WeekCalendar::from_config(&config).unwrap();
    assert_eq!(cal.to_config(), config);

    let json = serde_json::to_string(&config).unwrap();
    let parsed: WeekCalendarConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn config_with_malformed_slot_is_rejected() {
    let config = WeekCalendarConfig::new(vec![Day::Sunday], vec!["8:00-8:5"]);
    let err = WeekCalendar::from_config(&config).unwrap_err();
    assert!(matches!(err, ScheduleError::MalformedTimeSlot { .. }));
}

#[test]
fn day_parsing_accepts_names_and_abbreviations() {
    assert_eq!("sunday".parse::<Day>().unwrap(), Day::Sunday);
    assert_eq!("Thu".parse::<Day>().unwrap(), Day::Thursday);
    assert!(matches!(
        "Friday".parse::<Day>(),
        Err(ScheduleError::UnknownDay { .. })
    ));
    assert_eq!(Weekday::from(Day::Wednesday), Weekday::Wed);
}

#[test]
fn time_slot_parsing_is_strict() {
    let slot = TimeSlot::parse("08:00-09:50").unwrap();
    assert_eq!(slot.start_minutes(), 480);
    assert_eq!(slot.duration_minutes(), 110);
    assert_eq!(slot.to_string(), "8:00-9:50");

    for bad in ["8:00", "8-9", "8:0-9:00", "24:00-24:50", "9:00-8:00", "8:00-8:00", "a:00-9:00"] {
        assert!(
            matches!(TimeSlot::parse(bad), Err(ScheduleError::MalformedTimeSlot { .. })),
            "{bad} should be rejected"
        );
    }
}

#[test]
fn overlap_and_interior_checks() {
    let long = TimeSlot::parse("8:00-9:50").unwrap();
    let next = TimeSlot::parse("9:00-9:50").unwrap();
    let after = TimeSlot::parse("9:50-10:40").unwrap();
    assert!(long.overlaps(&next));
    assert!(!long.overlaps(&after));
    assert!(long.covers_interior(540));
    assert!(!long.covers_interior(480));
    assert!(!long.covers_interior(590));
}

#[test]
fn calendar_config_accepts_loose_day_names() {
    let config: WeekCalendarConfig = serde_json::from_str(
        r#"{ "days": ["sun", "TUESDAY", "Thu"], "slots": ["8:00-8:50"] }"#,
    )
    .unwrap();
    assert_eq!(config.days(), &[Day::Sunday, Day::Tuesday, Day::Thursday]);

    // Serialized form stays the canonical name.
    assert_eq!(serde_json::to_value(Day::Tuesday).unwrap(), "Tuesday");

    let err = serde_json::from_str::<WeekCalendarConfig>(
        r#"{ "days": ["Friday"], "slots": ["8:00-8:50"] }"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("unknown day"));
}
