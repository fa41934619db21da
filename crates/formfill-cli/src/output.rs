use std::io::Write;

use owo_colors::OwoColorize;

use formfill_core::{Capabilities, FieldMapping};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print one line per mapping; unmatched fields are dimmed.
pub fn print_mappings(
    w: &mut dyn Write,
    mappings: &[FieldMapping],
    color: ColorMode,
) -> std::io::Result<()> {
    let matched = mappings.iter().filter(|m| !m.value.is_empty()).count();
    writeln!(w, "Matched {} of {} fields", matched, mappings.len())?;
    writeln!(w)?;

    for mapping in mappings {
        let name = if mapping.field_name.is_empty() {
            &mapping.field_id
        } else {
            &mapping.field_name
        };
        if mapping.value.is_empty() {
            if color.enabled() {
                writeln!(w, "  {}", format!("{name}: (no match)").dimmed())?;
            } else {
                writeln!(w, "  {name}: (no match)")?;
            }
        } else if color.enabled() {
            writeln!(w, "  {name}: {}", mapping.value.green())?;
        } else {
            writeln!(w, "  {name}: {}", mapping.value)?;
        }
    }
    Ok(())
}

pub fn print_capabilities(
    w: &mut dyn Write,
    caps: &Capabilities,
    color: ColorMode,
) -> std::io::Result<()> {
    let available = |yes: bool| -> String {
        if !color.enabled() {
            return if yes { "available".into() } else { "unavailable".into() };
        }
        if yes {
            "available".green().to_string()
        } else {
            "unavailable".red().to_string()
        }
    };

    writeln!(w, "Raster OCR:     {}", available(caps.raster_available))?;
    writeln!(w, "Structured OCR: {}", available(caps.structured_available))?;
    writeln!(w, "Default mode:   {}", caps.default_mode.as_str())?;
    writeln!(w, "Formats:        {}", caps.supported_formats.join(" "))?;
    Ok(())
}
