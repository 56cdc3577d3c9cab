use smart_schedule::{
    Day, GridCell, GridProjector, ScheduleError, Session, TimeSlot, WeekCalendar, project,
    project_groups,
};

fn slot(s: &str) -> TimeSlot {
    TimeSlot::parse(s).unwrap()
}

fn session(day: Day, time: &str, code: &str) -> Session {
    Session::new(day, time, code, format!("{code} course"), 1)
}

#[test]
fn hundred_minute_session_spans_two_rows() {
    let sessions = vec![session(Day::Monday, "8:00-9:50", "CSC111")];

    let first = project(&sessions, Day::Monday, &slot("8:00-8:50")).unwrap();
    assert!(first.render());
    assert_eq!(first.row_span(), 2);
    assert_eq!(first.entry().map(|s| s.course_code.as_str()), Some("CSC111"));

    let second = project(&sessions, Day::Monday, &slot("9:00-9:50")).unwrap();
    assert_eq!(second, GridCell::Covered);
    assert!(!second.render());
    assert_eq!(second.row_span(), 0);
    assert!(second.entry().is_none());
}

#[test]
fn row_span_threshold_is_one_hundred_minutes() {
    let cases = [
        ("8:00-8:50", 1),
        ("8:00-9:39", 1),
        ("8:00-9:40", 2),
        ("8:00-10:50", 2),
    ];
    for (time, expected) in cases {
        let sessions = vec![session(Day::Sunday, time, "MATH101")];
        let cell = project(&sessions, Day::Sunday, &slot("8:00-8:50")).unwrap();
        assert_eq!(cell.row_span(), expected, "slot {time}");
    }
}

#[test]
fn empty_cell_when_nothing_matches() {
    let sessions = vec![session(Day::Monday, "8:00-8:50", "CSC111")];

    let other_day = project(&sessions, Day::Tuesday, &slot("8:00-8:50")).unwrap();
    assert_eq!(other_day, GridCell::Empty);
    assert!(other_day.render());
    assert_eq!(other_day.row_span(), 1);

    // A session ending exactly at the next start does not cover it.
    let next = project(&sessions, Day::Monday, &slot("9:00-9:50")).unwrap();
    assert_eq!(next, GridCell::Empty);
}

#[test]
fn only_start_of_canonical_slot_is_compared() {
    let sessions = vec![session(Day::Wednesday, "10:00-10:50", "PHYS201")];
    let cell = project(&sessions, Day::Wednesday, &slot("10:00-11:50")).unwrap();
    assert!(matches!(cell, GridCell::Anchor { row_span: 1, .. }));
}

#[test]
fn malformed_slot_surfaces_as_error() {
    let sessions = vec![
        session(Day::Monday, "8:00-8:50", "CSC111"),
        session(Day::Monday, "8 to 9", "BAD100"),
    ];
    let err = project(&sessions, Day::Monday, &slot("8:00-8:50")).unwrap_err();
    assert!(matches!(err, ScheduleError::MalformedTimeSlot { .. }));

    // Malformed entries on other days do not affect this column.
    let ok = project(&sessions, Day::Tuesday, &slot("8:00-8:50")).unwrap();
    assert_eq!(ok, GridCell::Empty);
}

#[test]
fn first_session_in_input_order_wins_a_shared_start() {
    let sessions = vec![
        session(Day::Thursday, "11:00-11:50", "FIRST"),
        session(Day::Thursday, "11:00-12:50", "SECOND"),
    ];
    let cell = project(&sessions, Day::Thursday, &slot("11:00-11:50")).unwrap();
    assert_eq!(cell.entry().map(|s| s.course_code.as_str()), Some("FIRST"));
    assert_eq!(cell.row_span(), 1);
}

#[test]
fn week_grid_tiles_every_column() {
    let calendar = WeekCalendar::default();
    let slots = calendar.rendering_slots();
    let sessions = vec![
        session(Day::Sunday, "8:00-9:50", "CSC111"),
        session(Day::Sunday, "10:00-10:50", "CSC112"),
        session(Day::Monday, "13:00-14:50", "CSC113"),
        session(Day::Tuesday, "9:00-9:50", "CSC114"),
    ];

    let grid = GridProjector::new(&sessions)
        .project_week(calendar.days(), &slots)
        .unwrap();

    assert_eq!(grid.rows.len(), slots.len());
    for (col, day) in grid.days.iter().enumerate() {
        let covered: u32 = grid
            .rows
            .iter()
            .map(|row| u32::from(row.cells[col].1.row_span()))
            .sum();
        assert_eq!(covered as usize, slots.len(), "column {day} does not tile");
    }
}

#[test]
fn each_session_is_anchored_once() {
    let calendar = WeekCalendar::default();
    let slots = calendar.rendering_slots();
    let sessions = vec![
        session(Day::Sunday, "8:00-9:50", "CSC111"),
        session(Day::Monday, "8:00-8:50", "CSC112"),
        session(Day::Monday, "12:00-13:50", "CSC113"),
    ];

    let grid = GridProjector::new(&sessions)
        .project_week(calendar.days(), &slots)
        .unwrap();

    assert_eq!(grid.anchored_sessions(), sessions.len());
    for s in &sessions {
        let anchors = grid
            .rendered_cells()
            .filter(|(_, _, cell)| cell.entry().is_some_and(|e| e == s))
            .count();
        assert_eq!(anchors, 1, "{} anchored {anchors} times", s.course_code);
    }

    let covered = grid.cell(Day::Monday, &slot("13:00-13:50")).unwrap();
    assert_eq!(*covered, GridCell::Covered);
}

#[test]
fn projected_grid_is_owned_and_serializable() {
    let calendar = WeekCalendar::default();
    let slots = calendar.rendering_slots();
    let sessions = vec![session(Day::Sunday, "8:00-9:50", "CSC111")];

    let projected = GridProjector::new(&sessions)
        .project_week(calendar.days(), &slots)
        .unwrap()
        .to_projected();

    let json = serde_json::to_value(&projected).unwrap();
    let first_row = &json["rows"][0];
    assert_eq!(first_row["slot"], "8:00-8:50");
    assert_eq!(first_row["cells"][0]["row_span"], 2);
    assert_eq!(first_row["cells"][0]["entry"]["course_code"], "CSC111");
    assert_eq!(json["rows"][1]["cells"][0]["render"], false);
}

#[test]
fn groups_are_projected_independently() {
    let calendar = WeekCalendar::default();
    let slots = calendar.rendering_slots();
    let groups = vec![
        ((1u32, 1u32), vec![session(Day::Sunday, "8:00-8:50", "A")]),
        ((1u32, 2u32), vec![session(Day::Sunday, "8:00", "BROKEN")]),
    ];

    let results = project_groups(&groups, calendar.days(), &slots);

    assert_eq!(results.len(), 2);
    assert_eq!(*results[0].0, (1, 1));
    assert_eq!(results[0].1.as_ref().unwrap().anchored_sessions(), 1);
    assert!(matches!(
        results[1].1,
        Err(ScheduleError::MalformedTimeSlot { .. })
    ));
}
