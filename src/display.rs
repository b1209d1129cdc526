use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;
use maud::{html, Markup, DOCTYPE};

use crate::parser::RejectedSession;
use crate::timetable::{Grid, Session};

/// Formats a session as "COURSE @ ROOM"
pub fn format_cell(session: &Session) -> String {
    if session.room.is_empty() {
        session.course_id.clone()
    } else {
        format!("{} @ {}", session.course_id, session.room)
    }
}

/// Renders each day as a block of "HH:MM - HH:MM course" lines
pub fn format_grid(grid: &Grid) -> String {
    let mut out = String::new();
    for row in grid.rows() {
        out.push_str(&format!("** {} **\n", row.day));
        for cell in &row.cells {
            let label = grid.slots().span_label(cell.slot_index, cell.span);
            match cell.session {
                Some(session) if cell.span > 1 => {
                    out.push_str(&format!("{} {} ({} slots)\n", label, format_cell(session), cell.span));
                }
                Some(session) => out.push_str(&format!("{} {}\n", label, format_cell(session))),
                None => out.push_str(&format!("{} [EMPTY]\n", label)),
            }
        }
    }
    out
}

/// Writes the text rendering of the grid to a file
pub fn write_grid_to_file<P: AsRef<Path>>(grid: &Grid, path: P) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(path)?;
    file.write_all(format_grid(grid).as_bytes())?;
    Ok(())
}

/// Writes one CSV record per visible cell
pub fn write_grid_csv<P: AsRef<Path>>(grid: &Grid, path: P) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["day", "slot", "label", "span", "course_id", "title", "room"])?;

    for row in grid.rows() {
        for cell in &row.cells {
            let Some(slot) = grid.slots().get(cell.slot_index) else {
                continue;
            };
            let key = slot.key();
            let label = grid.slots().span_label(cell.slot_index, cell.span);
            let span = cell.span.to_string();
            let (course, title, room) = match cell.session {
                Some(s) => (s.course_id.as_str(), s.title.as_str(), s.room.as_str()),
                None => ("", "", ""),
            };
            wtr.write_record([
                row.day.name(),
                key.as_str(),
                label.as_str(),
                span.as_str(),
                course,
                title,
                room,
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Prints the grid and everything that didn't make it in
pub fn print_timetable(grid: &Grid, rejected: &[RejectedSession]) {
    println!("\n=== Weekly Timetable ===");
    println!("Classes placed: {}", grid.placed_count());

    if !grid.unplaced().is_empty() {
        println!("⚠️  Not shown ({}):", grid.unplaced().len());
        for item in grid.unplaced() {
            println!(
                "  - {} {} {} ({:?})",
                item.session.course_id, item.session.day, item.session.start, item.reason
            );
        }
    }
    if !rejected.is_empty() {
        println!("⚠️  Rejected from response ({}):", rejected.len());
        for item in rejected {
            println!("  - {}: {}", item.course_id, item.reason);
        }
    }

    println!();
    print!("{}", format_grid(grid));
}

/// Renders the grid as an HTML table with merged cells
pub fn render_html_table(grid: &Grid) -> Markup {
    html! {
        table.timetable {
            thead {
                tr {
                    th { "Day / Time" }
                    @for slot in grid.slots().iter() {
                        th { (slot.label) }
                    }
                }
            }
            tbody {
                @for row in grid.rows() {
                    tr {
                        td.day { (row.day.name()) }
                        @for cell in &row.cells {
                            @let colspan = (cell.span > 1).then_some(cell.span);
                            @if let Some(session) = cell.session {
                                td colspan=[colspan] title=(session.title) {
                                    strong { (session.course_id) }
                                    br;
                                    span { (session.room) }
                                }
                            } @else {
                                td colspan=[colspan] {}
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Full page around [`render_html_table`]
pub fn render_html_page(grid: &Grid) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { "Timetable" }
            }
            body {
                h1 { "Weekly Schedule" }
                (render_html_table(grid))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::slots::parse_time_of_day;
    use crate::timetable::{build_grid, default_slots, Day};

    fn sample_grid() -> Grid {
        let session = |day, start: &str, end: &str, course: &str, room: &str| Session {
            day,
            start: parse_time_of_day(start).unwrap(),
            end: parse_time_of_day(end).unwrap(),
            course_id: course.to_string(),
            room: room.to_string(),
            title: "R&D <lab>".to_string(),
            section: None,
        };
        build_grid(
            &[
                session(Day::Monday, "09:00", "10:00", "CD252IA", "PG-101"),
                session(Day::Wednesday, "14:30", "16:30", "IS353IA", "Lab 2"),
            ],
            &default_slots(),
        )
    }

    #[test]
    fn text_rendering_merges_spans() {
        let text = format_grid(&sample_grid());
        assert!(text.contains("** Monday **\n09:00 - 10:00 CD252IA @ PG-101\n"));
        assert!(text.contains("14:30 - 16:30 IS353IA @ Lab 2 (2 slots)\n"));
        assert!(!text.contains("15:30 - 16:30 [EMPTY]\n** Thursday"));
        assert_eq!(text.matches("** ").count(), 5);
    }

    #[test]
    fn html_uses_colspan_and_escapes() {
        let html = render_html_table(&sample_grid()).into_string();
        assert!(html.starts_with("<table class=\"timetable\">"));
        assert!(html.contains("<th>09:00 - 10:00</th>"));
        assert!(html.contains("<td colspan=\"2\" title=\"R&amp;D &lt;lab&gt;\"><strong>IS353IA</strong>"));
        assert!(!html.contains("<lab>"));
        assert_eq!(html.matches("<tr>").count(), 6);
        assert!(html.contains("<td class=\"day\">Wednesday</td>"));
        assert!(html.contains("<td></td>"));
    }

    #[test]
    fn page_wraps_table() {
        let page = render_html_page(&sample_grid()).into_string();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<h1>Weekly Schedule</h1><table class=\"timetable\">"));
    }

    #[test]
    fn csv_has_one_record_per_visible_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.csv");
        write_grid_csv(&sample_grid(), &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        // 5 days x 8 slots, minus the one absorbed Wednesday slot
        assert_eq!(records.len(), 39);

        let lab = records
            .iter()
            .find(|r| r.get(4) == Some("IS353IA"))
            .unwrap();
        assert_eq!(lab.get(0), Some("Wednesday"));
        assert_eq!(lab.get(1), Some("14:30"));
        assert_eq!(lab.get(2), Some("14:30 - 16:30"));
        assert_eq!(lab.get(3), Some("2"));
    }

    #[test]
    fn writes_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.txt");
        write_grid_to_file(&sample_grid(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, format_grid(&sample_grid()));
    }

    #[test]
    fn cell_without_room() {
        let mut session = sample_grid().rows()[0].cells[0].session.unwrap().clone();
        session.room.clear();
        assert_eq!(format_cell(&session), "CD252IA");
    }
}
