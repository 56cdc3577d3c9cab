use polars::prelude::{AnyValue, DataFrame};
use smart_schedule::{
    ActivityType, Course, Day, ProjectedGrid, ScheduleStore, Section, Session, SqliteScheduleStore,
    Timetable, load_sessions_from_csv, load_timetable_from_json, logging, save_sessions_to_csv,
    save_timetable_to_json,
};
use std::io::{self, Write};

fn any_value_text(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(ci) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_line = |cells: &[String]| {
        let mut line = String::from("|");
        for (ci, width) in widths.iter().enumerate() {
            let cell = cells.get(ci).map(String::as_str).unwrap_or("");
            let pad = width.saturating_sub(cell.chars().count());
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(pad));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_line(header));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_line(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let header: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
    let rows: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| {
                    col.get(row_idx)
                        .map(|av| any_value_text(&av))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    render_table(&header, &rows)
}

/// Draws a projected grid; `^^` marks cells covered by the session above.
fn render_grid(grid: &ProjectedGrid) -> String {
    let mut header = vec!["slot".to_string()];
    header.extend(grid.days.iter().map(|d| d.to_string()));
    let rows: Vec<Vec<String>> = grid
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.slot.to_string()];
            for cell in &row.cells {
                let text = match (&cell.entry, cell.render) {
                    (_, false) => "^^".to_string(),
                    (Some(session), true) => {
                        let mut text = format!("{} s{}", session.course_code, session.section_num);
                        if let Some(activity) = session.activity_type {
                            text.push_str(&format!(" {activity}"));
                        }
                        if cell.row_span > 1 {
                            text.push_str(&format!(" (x{})", cell.row_span));
                        }
                        text
                    }
                    (None, true) => String::new(),
                };
                cells.push(text);
            }
            cells
        })
        .collect();
    render_table(&header, &rows)
}

fn render_sessions(sessions: &[Session]) -> String {
    let header: Vec<String> = [
        "id", "level", "group", "day", "time", "course", "section", "activity", "room",
        "instructor",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    let opt = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_default();
    let rows: Vec<Vec<String>> = sessions
        .iter()
        .map(|s| {
            vec![
                s.id.map(|v| v.to_string()).unwrap_or_default(),
                opt(s.level),
                opt(s.group_num),
                s.day.to_string(),
                s.time_slot.clone(),
                s.course_code.clone(),
                s.section_num.to_string(),
                s.activity_type.map(|a| a.to_string()).unwrap_or_default(),
                s.room.clone().unwrap_or_default(),
                s.instructor.clone().unwrap_or_default(),
            ]
        })
        .collect();
    render_table(&header, &rows)
}

fn print_help() {
    println!(
        "Commands:\n  help                                   Show this help\n  show                                   List all sessions\n  course add <code> <name...>            Add or update a course\n  course list                            List courses\n  section add <num> <capacity>           Add or update a section\n  section list                           List sections\n  schedule new <level> <group> [name...] Create a schedule for a cohort\n  schedule list                          List schedules\n  publish <schedule_id>                  Publish a schedule\n  groups <level> <count>                 Replace a level's groups with 1..=count\n  session add <level> <group> <day> <slot> <code> <section> [activity]\n                                         Add a session (slot like 8:00-8:50)\n  delete <id>                            Delete a session\n  delete course <code>                   Delete all sessions of a course\n  delete group <level> <group>           Delete a group and its sessions\n  grid <level> <group>                   Show the weekly grid of a cohort\n  generate <schedule_id>                 Fill a schedule from the catalog\n  conflicts                              List overlapping sessions\n  teaching                               Show teaching load per instructor\n  save <json|csv|sqlite> <path>          Persist timetable (csv: sessions only)\n  load <json|csv|sqlite> <path>          Load timetable (csv: sessions only)\n  quit|exit                              Exit"
    );
}

fn parse_u32(value: Option<&str>, what: &str) -> Result<u32, String> {
    value
        .ok_or_else(|| format!("Missing {what}"))?
        .parse()
        .map_err(|_| format!("Invalid {what}"))
}

fn parse_i64(value: Option<&str>, what: &str) -> Result<i64, String> {
    value
        .ok_or_else(|| format!("Missing {what}"))?
        .parse()
        .map_err(|_| format!("Invalid {what}"))
}

fn rest_of_line<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(" ")
}

fn run_command<'a>(
    timetable: &mut Timetable,
    cmd: &str,
    mut parts: impl Iterator<Item = &'a str>,
) -> Result<String, String> {
    match cmd {
        "help" => {
            print_help();
            Ok(String::new())
        }
        "show" => Ok(render_sessions(timetable.sessions())),
        "course" => match parts.next() {
            Some("add") => {
                let code = parts.next().ok_or("Usage: course add <code> <name...>")?;
                let name = rest_of_line(parts);
                timetable.upsert_course(Course::new(code, name));
                Ok(format!("Course {code} saved."))
            }
            Some("list") => {
                let header = vec!["code".to_string(), "name".to_string()];
                let rows: Vec<Vec<String>> = timetable
                    .catalog()
                    .courses()
                    .iter()
                    .map(|c| vec![c.course_code.clone(), c.course_name.clone()])
                    .collect();
                Ok(render_table(&header, &rows))
            }
            _ => Err("Usage: course <add|list>".into()),
        },
        "section" => match parts.next() {
            Some("add") => {
                let num = parse_u32(parts.next(), "section number")?;
                let capacity = parse_u32(parts.next(), "capacity")?;
                timetable.upsert_section(Section::new(num, capacity));
                Ok(format!("Section {num} saved."))
            }
            Some("list") => {
                let header = vec!["section".to_string(), "capacity".to_string()];
                let rows: Vec<Vec<String>> = timetable
                    .catalog()
                    .sections()
                    .iter()
                    .map(|s| vec![s.section_num.to_string(), s.capacity.to_string()])
                    .collect();
                Ok(render_table(&header, &rows))
            }
            _ => Err("Usage: section <add|list>".into()),
        },
        "schedule" => match parts.next() {
            Some("new") => {
                let level = parse_u32(parts.next(), "level")?;
                let group = parse_u32(parts.next(), "group")?;
                let name = rest_of_line(parts);
                let id = timetable
                    .create_schedule(level, group, name)
                    .map_err(|e| format!("Error: {e}"))?;
                Ok(format!("Created schedule {id}."))
            }
            Some("list") => {
                let header: Vec<String> = ["id", "level", "group", "name", "published"]
                    .iter()
                    .map(|h| h.to_string())
                    .collect();
                let rows: Vec<Vec<String>> = timetable
                    .schedules()
                    .iter()
                    .map(|s| {
                        vec![
                            s.id.to_string(),
                            s.level.to_string(),
                            s.group_num.to_string(),
                            s.name.clone(),
                            s.published.to_string(),
                        ]
                    })
                    .collect();
                Ok(render_table(&header, &rows))
            }
            _ => Err("Usage: schedule <new|list>".into()),
        },
        "publish" => {
            let id = parse_i64(parts.next(), "schedule id")?;
            timetable.publish(id).map_err(|e| format!("Error: {e}"))?;
            Ok(format!("Published schedule {id}."))
        }
        "groups" => {
            let level = parse_u32(parts.next(), "level")?;
            let count = parse_u32(parts.next(), "count")?;
            let groups = timetable
                .create_groups(level, count)
                .map_err(|e| format!("Error: {e}"))?;
            Ok(format!("Level {level} groups: {groups:?}"))
        }
        "session" => match parts.next() {
            Some("add") => {
                let level = parse_u32(parts.next(), "level")?;
                let group = parse_u32(parts.next(), "group")?;
                let day: Day = parts
                    .next()
                    .ok_or("Missing day")?
                    .parse()
                    .map_err(|e| format!("Error: {e}"))?;
                let slot = parts.next().ok_or("Missing time slot")?;
                let code = parts.next().ok_or("Missing course code")?;
                let section = parse_u32(parts.next(), "section")?;
                let name = timetable
                    .catalog()
                    .find_course(code)
                    .map(|c| c.course_name.clone())
                    .unwrap_or_default();
                let mut session = Session::new(day, slot, code, name, section).with_cohort(level, group);
                if let Some(activity) = parts.next() {
                    let activity: ActivityType =
                        activity.parse().map_err(|e| format!("Error: {e}"))?;
                    session = session.with_activity(activity);
                }
                let id = timetable
                    .add_session(session)
                    .map_err(|e| format!("Error: {e}"))?;
                Ok(format!("Added session {id}."))
            }
            _ => Err("Usage: session add <level> <group> <day> <slot> <code> <section> [activity]".into()),
        },
        "delete" => match parts.next() {
            Some("course") => {
                let code = parts.next().ok_or("Usage: delete course <code>")?;
                let removed = timetable.delete_course_sessions(code);
                Ok(format!("Deleted {removed} session(s) of {code}."))
            }
            Some("group") => {
                let level = parse_u32(parts.next(), "level")?;
                let group = parse_u32(parts.next(), "group")?;
                let removed = timetable
                    .delete_group(level, group)
                    .map_err(|e| format!("Error: {e}"))?;
                Ok(format!(
                    "Deleted group {group} of level {level} ({removed} session(s))."
                ))
            }
            Some(id_s) => {
                let id: i64 = id_s.parse().map_err(|_| "Invalid id".to_string())?;
                timetable
                    .delete_session(id)
                    .map_err(|e| format!("Error: {e}"))?;
                Ok(format!("Deleted session {id}."))
            }
            None => Err("Usage: delete <id> | delete course <code> | delete group <level> <group>".into()),
        },
        "grid" => {
            let level = parse_u32(parts.next(), "level")?;
            let group = parse_u32(parts.next(), "group")?;
            let grid = timetable
                .render_grid(level, group)
                .map_err(|e| format!("Error: {e}"))?;
            Ok(render_grid(&grid))
        }
        "generate" => {
            let id = parse_i64(parts.next(), "schedule id")?;
            let summary = timetable.generate(id).map_err(|e| format!("Error: {e}"))?;
            Ok(format!(
                "Generated {} session(s) for schedule {} over {} cell(s).",
                summary.generated, summary.schedule_id, summary.grid_cells
            ))
        }
        "conflicts" => {
            let conflicts = timetable.conflicts();
            if conflicts.is_empty() {
                return Ok("No conflicts.".into());
            }
            let lines: Vec<String> = conflicts
                .iter()
                .map(|c| {
                    format!(
                        "{} {} {} overlaps {} {}",
                        c.first.day,
                        c.first.time_slot,
                        c.first.course_code,
                        c.second.time_slot,
                        c.second.course_code
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
        "teaching" => {
            let df = timetable
                .teaching_load()
                .map_err(|e| format!("Error: {e}"))?;
            Ok(render_df_as_text_table(&df))
        }
        "save" => {
            let kind = parts.next();
            let path = parts.next().ok_or("Usage: save <json|csv|sqlite> <path>")?;
            let saved = match kind {
                Some("json") => save_timetable_to_json(timetable, path),
                Some("csv") => save_sessions_to_csv(timetable.sessions(), path),
                Some("sqlite") => {
                    SqliteScheduleStore::new(path).and_then(|store| store.save_timetable(timetable))
                }
                _ => return Err("Usage: save <json|csv|sqlite> <path>".into()),
            };
            saved.map_err(|e| format!("Save error: {e}"))?;
            Ok(format!("Timetable saved to {path}"))
        }
        "load" => {
            let kind = parts.next();
            let path = parts.next().ok_or("Usage: load <json|csv|sqlite> <path>")?;
            let loaded = match kind {
                Some("json") => load_timetable_from_json(path).map_err(|e| e.to_string())?,
                Some("csv") => {
                    let sessions = load_sessions_from_csv(path).map_err(|e| e.to_string())?;
                    Timetable::from_parts(
                        timetable.calendar().clone(),
                        timetable.catalog().clone(),
                        timetable.schedules().to_vec(),
                        timetable.all_groups().clone(),
                        sessions,
                    )
                    .map_err(|e| e.to_string())?
                }
                Some("sqlite") => SqliteScheduleStore::new(path)
                    .and_then(|store| store.load_timetable())
                    .map_err(|e| e.to_string())?
                    .ok_or("No timetable stored in database")?,
                _ => return Err("Usage: load <json|csv|sqlite> <path>".into()),
            };
            *timetable = loaded;
            Ok(format!("Timetable loaded from {path}"))
        }
        other => Err(format!("Unknown command '{other}'. Type 'help'.")),
    }
}

fn main() {
    logging::init();
    let mut timetable = Timetable::new();

    println!("SmartSchedule (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        if matches!(cmd, "quit" | "exit") {
            break;
        }

        match run_command(&mut timetable, cmd, parts) {
            Ok(output) if output.is_empty() => {}
            Ok(output) => println!("{output}"),
            Err(message) => println!("{message}"),
        }
    }
}
