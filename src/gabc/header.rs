use crate::models::ChantRecord;

/// Line that ends the header section of a GABC file.
pub const HEADER_SEPARATOR: &str = "%%";

/// Build the `name:`/`office-part:`/`mode:`/`transcriber:` preamble followed by
/// the `%%` separator. Empty fields are left out.
pub fn gabc_header(record: &ChantRecord) -> String {
    // Semicolons terminate header values, so they cannot appear inside one.
    let name = record.incipit.replace(';', ":");
    let transcriber = record.transcriber.as_deref().unwrap_or_default();

    let fields = [
        ("name", name.as_str()),
        ("office-part", record.office_part.as_str()),
        ("mode", record.mode.as_str()),
        ("transcriber", transcriber),
    ];

    let lines: Vec<String> = fields
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}:{value};"))
        .collect();

    format!("{}\n{HEADER_SEPARATOR}\n", lines.join("\n"))
}

/// Header plus processed score, ready to be saved or copied.
pub fn gabc_document(record: &ChantRecord, processed: &str) -> String {
    let mut document = gabc_header(record);
    document.push_str(processed);
    document
}

/// File name stem derived from the incipit: every character outside
/// `[A-Za-z0-9]` becomes `_`.
pub fn export_file_stem(incipit: &str) -> String {
    let base = if incipit.is_empty() { "chant" } else { incipit };
    base.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}
