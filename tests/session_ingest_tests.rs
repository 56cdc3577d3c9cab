use serde_json::json;
use smart_schedule::{ActivityType, Day, RawSession, ScheduleError, ingest_sessions};

#[test]
fn canonical_payload_normalizes() {
    let payload = json!([{
        "id": 4,
        "schedule_id": 2,
        "day": "Monday",
        "time_slot": "08:00-09:50",
        "course_code": "CSC111",
        "course_name": "Programming I",
        "section_num": 1,
        "activity_type": "Lecture",
        "level": 3,
        "group_num": 1,
        "room": "B-12",
        "instructor": "Dr. Noor"
    }]);

    let sessions = ingest_sessions(&payload).unwrap();
    assert_eq!(sessions.len(), 1);
    let s = &sessions[0];
    assert_eq!(s.id, Some(4));
    assert_eq!(s.schedule_id, Some(2));
    assert_eq!(s.day, Day::Monday);
    assert_eq!(s.time_slot, "8:00-9:50");
    assert_eq!(s.activity_type, Some(ActivityType::Lecture));
    assert_eq!((s.level, s.group_num), (Some(3), Some(1)));
    assert_eq!(s.room.as_deref(), Some("B-12"));
}

#[test]
fn legacy_field_names_resolve_to_canonical_fields() {
    let payload = json!({
        "success": true,
        "sessions": [
            {
                "dayOfWeek": "sun",
                "timeSlot": "10:00-10:50",
                "courseCode": "MATH101",
                "courseName": "Calculus",
                "sectionNum": "2",
                "activityType": "tut",
                "lvl": "4",
                "grp": 3
            },
            {
                "day": "Tuesday",
                "time": "9:00-9:50",
                "code": "PHYS201",
                "section": 1,
                "student_level": 2,
                "group": "1",
                "faculty": "Dr. Sami"
            }
        ]
    });

    let sessions = ingest_sessions(&payload).unwrap();

    let first = &sessions[0];
    assert_eq!(first.day, Day::Sunday);
    assert_eq!(first.course_code, "MATH101");
    assert_eq!(first.section_num, 2);
    assert_eq!(first.activity_type, Some(ActivityType::Tutorial));
    assert_eq!((first.level, first.group_num), (Some(4), Some(3)));

    let second = &sessions[1];
    assert_eq!(second.course_code, "PHYS201");
    assert_eq!(second.course_name, "");
    assert_eq!((second.level, second.group_num), (Some(2), Some(1)));
    assert_eq!(second.instructor.as_deref(), Some("Dr. Sami"));
}

#[test]
fn canonical_key_wins_over_alias_unless_empty() {
    let payload = json!({
        "day": "Monday",
        "time_slot": "8:00-8:50",
        "course_code": "CSC111",
        "section_num": 1,
        "group_num": null,
        "groupNum": "",
        "group": 5,
        "grp": 9
    });

    let raw = RawSession::from_value(&payload).unwrap();
    assert_eq!(raw.group_num, Some(5));
}

#[test]
fn general_activity_means_none() {
    let payload = json!([{
        "day": "Monday",
        "time_slot": "8:00-8:50",
        "course_code": "CSC111",
        "section_num": 1,
        "activity_type": "General"
    }]);
    let sessions = ingest_sessions(&payload).unwrap();
    assert_eq!(sessions[0].activity_type, None);
}

#[test]
fn malformed_time_slot_is_rejected_at_ingestion() {
    let payload = json!([{
        "day": "Monday",
        "time_slot": "8am-9am",
        "course_code": "CSC111",
        "section_num": 1
    }]);
    let err = ingest_sessions(&payload).unwrap_err();
    assert!(matches!(err, ScheduleError::MalformedTimeSlot { .. }));
}

#[test]
fn unknown_day_and_missing_fields_are_rejected() {
    let friday = json!([{
        "day": "Friday",
        "time_slot": "8:00-8:50",
        "course_code": "CSC111",
        "section_num": 1
    }]);
    assert!(matches!(
        ingest_sessions(&friday),
        Err(ScheduleError::UnknownDay { .. })
    ));

    let no_section = json!([{
        "day": "Monday",
        "time_slot": "8:00-8:50",
        "course_code": "CSC111"
    }]);
    assert!(matches!(
        ingest_sessions(&no_section),
        Err(ScheduleError::InvalidSession { .. })
    ));
}

#[test]
fn payload_without_session_list_is_rejected() {
    assert!(ingest_sessions(&json!({ "success": true })).is_err());
    assert!(ingest_sessions(&json!("sessions")).is_err());
}

#[test]
fn raw_session_deserializes_through_aliases() {
    let raw: RawSession = serde_json::from_value(json!({
        "day": "Wed",
        "timeSlot": "11:00-11:50",
        "courseCode": "CSC220",
        "section": 3,
        "activity": "lab"
    }))
    .unwrap();
    let session = raw.normalize().unwrap();
    assert_eq!(session.day, Day::Wednesday);
    assert_eq!(session.activity_type, Some(ActivityType::Lab));
    assert_eq!(session.section_num, 3);
}
