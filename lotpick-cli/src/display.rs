use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};

use lotpick_db::models::HistoryEntry;
use lotpick_engine::api::GenerateResponse;
use lotpick_engine::config::GamePreset;

fn join_numbers(numbers: &[u32]) -> String {
    if numbers.is_empty() {
        return "—".to_string();
    }
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

fn preset_label(id: Option<&str>) -> &'static str {
    GamePreset::ALL
        .iter()
        .find(|p| Some(p.id()) == id)
        .map(|p| p.label())
        .unwrap_or("Custom")
}

pub fn display_pick(response: &GenerateResponse) {
    println!("\n🎲 Your winning numbers\n");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Main", "Secondary", "Iterations", "Time"]);

    table.add_row(vec![
        Cell::new(join_numbers(&response.main_numbers)).fg(Color::Green),
        Cell::new(join_numbers(&response.secondary_numbers)).fg(Color::Yellow),
        Cell::new(response.total_iterations.to_string()),
        Cell::new(format!("{:.2}s", response.elapsed_seconds)),
    ]);
    println!("{table}");
}

pub fn display_presets(presets: &[GamePreset]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Preset", "Game", "Main", "Secondary"]);

    for preset in presets {
        let (main_count, main_max, secondary_count, secondary_max) = preset.layout();
        let secondary = if secondary_max == 0 {
            "—".to_string()
        } else {
            format!("{secondary_count} of 1-{secondary_max}")
        };
        table.add_row(vec![
            preset.id().to_string(),
            preset.label().to_string(),
            format!("{main_count} of 1-{main_max}"),
            secondary,
        ]);
    }
    println!("{table}");
}

pub fn display_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("No saved picks.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Date", "Method", "Game", "Main", "Secondary", "Iterations", "Time"]);

    for entry in entries {
        let date = entry.timestamp.get(..19).unwrap_or(&entry.timestamp).replace('T', " ");
        let (iterations, time) = match &entry.stats {
            Some(stats) => (
                stats.total_iterations.to_string(),
                format!("{:.2}s", stats.elapsed_seconds),
            ),
            None => ("—".to_string(), "—".to_string()),
        };
        table.add_row(vec![
            entry.id.to_string(),
            date,
            entry.method.label().to_string(),
            preset_label(entry.preset.as_deref()).to_string(),
            join_numbers(&entry.main_numbers),
            join_numbers(&entry.secondary_numbers),
            iterations,
            time,
        ]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_numbers() {
        assert_eq!(join_numbers(&[3, 14, 27]), " 3 - 14 - 27");
        assert_eq!(join_numbers(&[]), "—");
    }

    #[test]
    fn test_preset_label() {
        assert_eq!(preset_label(Some("lucky4life")), "Lucky 4 Life");
        assert_eq!(preset_label(Some("unknown")), "Custom");
        assert_eq!(preset_label(None), "Custom");
    }
}
