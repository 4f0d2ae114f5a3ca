use crate::models::generation::WritingStyle;

/// Word target for the extended form's coarse length tier.
/// Anything other than `short` or `medium` gets the `long` target.
pub fn word_count_for_length(tier: Option<&str>) -> u32 {
    match tier.map(str::trim) {
        Some("short") => 350,
        Some("medium") => 500,
        _ => 650,
    }
}

/// Trims `value`, treating an absent value as the empty string.
pub fn trim_or_default(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// `"<label>: <value>\n"` when the trimmed value is non-empty, otherwise nothing.
pub fn render_section(label: &str, value: Option<&str>) -> String {
    let value = trim_or_default(value);
    if value.is_empty() {
        String::new()
    } else {
        format!("{}: {}\n", label, value)
    }
}

/// One `Description of Image N: ...` line per entry, joined by newlines.
pub fn format_image_descriptions(descriptions: &[Option<String>]) -> String {
    descriptions
        .iter()
        .enumerate()
        .map(|(i, text)| {
            format!(
                "Description of Image {}: {}",
                i + 1,
                trim_or_default(text.as_deref())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapses either tone form into the single string the templates interpolate.
pub fn normalize_writing_style(style: &WritingStyle) -> String {
    match style {
        WritingStyle::Single(tone) => tone.trim().to_string(),
        WritingStyle::Triple(tones) => tones
            .iter()
            .map(|tone| tone.trim())
            .filter(|tone| !tone.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
    }
}
