use chrono::NaiveDate;

use crate::models::{Episode, Script, ShowNote};

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Pair a finished script with its episode metadata.
pub fn package(script: &Script, date: NaiveDate, show_title: &str) -> Episode {
    let script_text = std::iter::once(script.intro.as_str())
        .chain(script.facts.iter().map(|f| f.display_text.as_str()))
        .chain(std::iter::once(script.outro.as_str()))
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR);

    let show_notes = script
        .facts
        .iter()
        .map(|f| ShowNote {
            source_name: f.source_name.clone(),
            title: f.title.clone(),
            link: f.link.clone(),
        })
        .collect();

    Episode {
        date,
        title: episode_title(show_title, date),
        script_text,
        fact_count: script.facts.len(),
        duration_secs: None,
        show_notes,
    }
}

pub fn episode_title(show_title: &str, date: NaiveDate) -> String {
    format!("{} \u{2013} {}", show_title, date.format("%Y-%m-%d"))
}
