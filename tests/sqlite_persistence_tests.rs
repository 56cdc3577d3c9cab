#![cfg(feature = "sqlite")]

use smart_schedule::{
    ActivityType, Course, Day, PersistenceError, ScheduleError, ScheduleStore, Section, Session,
    SessionSource, SqliteScheduleStore, Timetable, WeekCalendar, generate_schedule,
    render_group_grid,
};
use tempfile::NamedTempFile;

fn sample_timetable() -> Timetable {
    let mut t = Timetable::new();
    t.upsert_course(Course::new("MATH101", "Calculus I"));
    t.upsert_course(Course::new("CSC111", "Programming I"));
    t.upsert_section(Section::new(3, 25));
    t.upsert_section(Section::new(1, 40));
    let schedule_id = t.create_schedule(2, 1, "Level 2 / Group 1").unwrap();
    t.publish(schedule_id).unwrap();
    t.create_groups(2, 3).unwrap();

    let mut lecture = Session::new(Day::Sunday, "8:00-9:50", "CSC111", "Programming I", 1)
        .with_activity(ActivityType::Lecture);
    lecture.schedule_id = Some(schedule_id);
    lecture.instructor = Some("Dr. Noor".into());
    t.add_session(lecture).unwrap();
    t.add_session(
        Session::new(Day::Thursday, "13:00-13:50", "MATH101", "Calculus I", 3).with_cohort(2, 3),
    )
    .unwrap();
    t
}

#[test]
fn sqlite_store_round_trip_timetable() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteScheduleStore::new(file.path()).unwrap();
    let timetable = sample_timetable();

    store.save_timetable(&timetable).expect("save timetable");
    let loaded = store
        .load_timetable()
        .expect("load timetable")
        .expect("timetable exists");

    assert_eq!(loaded, timetable);
    assert_eq!(loaded.groups(2), vec![1, 2, 3]);
    let sections: Vec<u32> = loaded
        .catalog()
        .sections()
        .iter()
        .map(|s| s.section_num)
        .collect();
    assert_eq!(sections, [3, 1]);
}

#[test]
fn empty_store_has_no_timetable() {
    let store = SqliteScheduleStore::in_memory().unwrap();
    assert!(store.load_timetable().unwrap().is_none());
}

#[test]
fn saving_twice_replaces_previous_contents() {
    let store = SqliteScheduleStore::in_memory().unwrap();
    let mut timetable = sample_timetable();
    store.save_timetable(&timetable).unwrap();

    timetable.delete_course_sessions("MATH101");
    timetable.remove_section(3);
    store.save_timetable(&timetable).unwrap();

    let loaded = store.load_timetable().unwrap().unwrap();
    assert_eq!(loaded.sessions().len(), 1);
    assert_eq!(loaded.catalog().sections().len(), 1);
}

#[test]
fn session_source_generates_into_store() {
    let mut store = SqliteScheduleStore::in_memory().unwrap();
    store.save_course(&Course::new("A", "Course A")).unwrap();
    store.save_course(&Course::new("B", "Course B")).unwrap();
    store.save_section(&Section::new(1, 30)).unwrap();
    let schedule_id = store.create_schedule(1, 4, "generated").unwrap();
    let calendar = WeekCalendar::default();

    let generated = generate_schedule(&mut store, &calendar, schedule_id).unwrap();
    assert_eq!(generated.len(), 2);

    let stored = store.fetch_sessions(1, 4).unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|s| s.schedule_id == Some(schedule_id)));
    assert_eq!(stored[0].course_code, "A");
    assert_eq!(stored[1].time_slot, "9:00-9:50");

    let grid = render_group_grid(&store, &calendar, 1, 4).unwrap();
    assert_eq!(
        grid.rows[1].cells[0]
            .entry
            .as_ref()
            .map(|s| s.course_code.as_str()),
        Some("B")
    );
}

#[test]
fn insert_sessions_requires_known_schedule() {
    let mut store = SqliteScheduleStore::in_memory().unwrap();
    let session = Session::new(Day::Monday, "8:00-8:50", "A", "Course A", 1);
    assert!(store.insert_sessions(77, &[session]).is_err());
    assert!(store.fetch_sessions(1, 1).unwrap().is_empty());
}

#[test]
fn delete_group_removes_sessions_in_one_step() {
    let store = SqliteScheduleStore::in_memory().unwrap();
    store.save_timetable(&sample_timetable()).unwrap();

    let removed = store.delete_group(2, 3).unwrap();
    assert_eq!(removed, 1);
    assert!(store.fetch_sessions(2, 3).unwrap().is_empty());
    assert_eq!(store.fetch_sessions(2, 1).unwrap().len(), 1);

    let loaded = store.load_timetable().unwrap().unwrap();
    assert_eq!(loaded.groups(2), vec![1, 2]);
}

#[test]
fn course_upsert_keeps_position() {
    let store = SqliteScheduleStore::in_memory().unwrap();
    store.save_course(&Course::new("A", "First")).unwrap();
    store.save_course(&Course::new("B", "Second")).unwrap();
    store.save_course(&Course::new("A", "Renamed")).unwrap();

    let courses = store.fetch_courses().unwrap();
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0].course_code, "A");
    assert_eq!(courses[0].course_name, "Renamed");
    assert_eq!(store.delete_course_sessions("A").unwrap(), 0);
}

#[test]
fn second_schedule_for_cohort_is_rejected() {
    let store = SqliteScheduleStore::in_memory().unwrap();
    store.create_schedule(2, 1, "first").unwrap();

    let err = store.create_schedule(2, 1, "second").unwrap_err();
    assert!(matches!(
        err,
        PersistenceError::Schedule(ScheduleError::Conflict { .. })
    ));
    assert!(store.create_schedule(2, 2, "other group").is_ok());
}

#[test]
fn stored_cohort_sessions_are_linked_to_new_schedule() {
    let store = SqliteScheduleStore::in_memory().unwrap();
    let mut timetable = Timetable::new();
    timetable
        .add_session(Session::new(Day::Monday, "8:00-8:50", "A", "Course A", 1).with_cohort(5, 1))
        .unwrap();
    store.save_timetable(&timetable).unwrap();

    let schedule_id = store.create_schedule(5, 1, "").unwrap();

    let sessions = store.fetch_sessions(5, 1).unwrap();
    assert_eq!(sessions[0].schedule_id, Some(schedule_id));
}
