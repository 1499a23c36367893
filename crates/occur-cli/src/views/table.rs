use comfy_table::{Attribute, Cell, Color, Row, Table};
use occur_core::codec;
use occur_core::models::{EventResponse, RecurrenceRequest};

pub fn display_events(events: &[EventResponse]) {
    if events.is_empty() {
        println!("No events found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Starts", "Duration", "Location", "Capacity", "Recurrence", "Activities"]);

    for event in events {
        let mut row = Row::new();
        row.add_cell(Cell::new(&event.id.to_string()[..8]));

        let title_cell = if event.recurrence.is_some() {
            Cell::new(format!("↻ {}", event.title)).fg(Color::Cyan)
        } else {
            Cell::new(&event.title)
        };
        row.add_cell(title_cell.add_attribute(Attribute::Bold));

        row.add_cell(Cell::new(event.date_time.format("%Y-%m-%d %H:%M").to_string()));
        row.add_cell(Cell::new(format_duration(event.duration_minutes)));
        row.add_cell(Cell::new(&event.location));
        row.add_cell(Cell::new(event.capacity));
        row.add_cell(match event.recurrence.as_ref() {
            Some(recurrence) => Cell::new(rule_text(recurrence)),
            None => Cell::new("None").fg(Color::DarkGrey),
        });
        row.add_cell(Cell::new(if event.activity_types.is_empty() {
            "None".to_string()
        } else {
            event.activity_types.join(", ")
        }));
        table.add_row(row);
    }

    println!("{table}");
}

fn format_duration(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h{:02}m", h, m),
    }
}

/// Canonical rule text of a decoded recurrence, for display.
fn rule_text(recurrence: &RecurrenceRequest) -> String {
    codec::encode(recurrence)
        .ok()
        .and_then(|encoded| encoded.into_rule())
        .map(|rule| rule.into_string())
        .unwrap_or_else(|| "?".to_string())
}
