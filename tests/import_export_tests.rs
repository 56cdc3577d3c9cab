use smart_schedule::{
    ActivityType, Course, Day, PersistenceError, Section, Session, Timetable, WeekCalendar,
    load_sessions_from_csv, load_timetable_from_json, save_sessions_to_csv,
    save_timetable_to_json,
};
use std::fs;
use tempfile::tempdir;

fn sample_timetable() -> Timetable {
    let calendar = WeekCalendar::new(
        vec![Day::Sunday, Day::Monday],
        vec![
            "8:00-8:50".parse().unwrap(),
            "9:00-9:50".parse().unwrap(),
        ],
    )
    .unwrap();
    let mut t = Timetable::with_calendar(calendar);
    t.upsert_course(Course::new("PHYS101", "Physics I"));
    t.upsert_course(Course::new("CSC111", "Programming I"));
    t.upsert_section(Section::new(2, 30));
    t.upsert_section(Section::new(1, 40));
    let schedule_id = t.create_schedule(1, 1, "Level 1 / Group 1").unwrap();
    t.publish(schedule_id).unwrap();

    let mut lab = Session::new(Day::Monday, "8:00-9:50", "CSC111", "Programming I", 1)
        .with_activity(ActivityType::Lab);
    lab.schedule_id = Some(schedule_id);
    lab.room = Some("Lab 3".into());
    t.add_session(lab).unwrap();
    t.add_session(
        Session::new(Day::Sunday, "9:00-9:50", "PHYS101", "Physics I", 2).with_cohort(2, 1),
    )
    .unwrap();
    t
}

#[test]
fn json_snapshot_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("timetable.json");
    let timetable = sample_timetable();

    save_timetable_to_json(&timetable, &path).expect("save json");
    let loaded = load_timetable_from_json(&path).expect("load json");

    assert_eq!(loaded, timetable);
    let codes: Vec<&str> = loaded
        .catalog()
        .courses()
        .iter()
        .map(|c| c.course_code.as_str())
        .collect();
    assert_eq!(codes, ["PHYS101", "CSC111"]);
    assert_eq!(loaded.catalog().sections()[0].section_num, 2);
    assert!(loaded.schedules()[0].published);
}

#[test]
fn json_snapshot_without_calendar_uses_default() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.json");
    fs::write(
        &path,
        r#"{
            "sessions": [{
                "id": 7,
                "schedule_id": null,
                "day": "Tuesday",
                "time_slot": "10:00-10:50",
                "course_code": "MATH101",
                "course_name": "Calculus",
                "section_num": 1,
                "activity_type": null,
                "level": 1,
                "group_num": 2,
                "room": null,
                "instructor": null
            }]
        }"#,
    )
    .unwrap();

    let loaded = load_timetable_from_json(&path).unwrap();
    assert_eq!(loaded.calendar(), &WeekCalendar::default());
    assert_eq!(loaded.sessions().len(), 1);
    assert_eq!(loaded.sessions_for(1, 2)[0].id, Some(7));
}

#[test]
fn json_snapshot_with_duplicate_ids_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dupes.json");
    let session = r#"{"id": 1, "day": "Sunday", "time_slot": "8:00-8:50",
        "course_code": "CSC111", "course_name": "", "section_num": 1,
        "level": 1, "group_num": 1}"#;
    fs::write(&path, format!(r#"{{"sessions": [{session}, {session}]}}"#)).unwrap();

    let err = load_timetable_from_json(&path).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn csv_round_trip_preserves_sessions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sessions.csv");
    let timetable = sample_timetable();

    save_sessions_to_csv(timetable.sessions(), &path).expect("save csv");
    let loaded = load_sessions_from_csv(&path).expect("load csv");

    assert_eq!(loaded.as_slice(), timetable.sessions());
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("id,schedule_id,day,time_slot"));
    assert!(text.contains("Lab 3"));
}

#[test]
fn empty_csv_is_invalid() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    fs::write(
        &path,
        "id,schedule_id,day,time_slot,course_code,course_name,section_num,activity_type,level,group_num,room,instructor\n",
    )
    .unwrap();

    let err = load_sessions_from_csv(&path).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn csv_with_malformed_slot_is_invalid() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(
        &path,
        "id,schedule_id,day,time_slot,course_code,course_name,section_num,activity_type,level,group_num,room,instructor\n\
         1,,Sunday,8:00,CSC111,Programming,1,,1,1,,\n",
    )
    .unwrap();

    assert!(load_sessions_from_csv(&path).is_err());
}
