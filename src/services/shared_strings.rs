//! Formatted runs of an XLSX workbook's shared strings.
//!
//! calamine hands back only the plain text of a cell, so the runs are read
//! straight from `xl/sharedStrings.xml`.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::common::rich_text::{push_text, runs_to_html, TextRun, TextStyle};
use crate::errors::ImportExportResult;

const SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";

/// HTML for every shared string with at least one formatted run, keyed by
/// the string's trimmed plain text. When two strings share the same text
/// the first one wins.
pub(crate) fn formatted_strings(xlsx_data: &[u8]) -> ImportExportResult<HashMap<String, String>> {
    let mut archive = ZipArchive::new(Cursor::new(xlsx_data))?;
    let mut xml = String::new();
    match archive.by_name(SHARED_STRINGS_PATH) {
        Ok(mut file) => {
            file.read_to_string(&mut xml)?;
        }
        Err(ZipError::FileNotFound) => return Ok(HashMap::new()),
        Err(err) => return Err(err.into()),
    }

    let mut formatted = HashMap::new();
    for runs in parse_shared_strings(&xml)? {
        if runs.iter().all(|run| run.style.is_plain()) {
            continue;
        }
        let plain: String = runs.iter().map(|run| run.text.as_str()).collect();
        formatted
            .entry(plain.trim().to_string())
            .or_insert_with(|| runs_to_html(&runs));
    }
    Ok(formatted)
}

/// One entry per `<si>`, in table order. Phonetic hints (`<rPh>`) are skipped.
fn parse_shared_strings(xml: &str) -> ImportExportResult<Vec<Vec<TextRun>>> {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut runs: Vec<TextRun> = Vec::new();
    let mut style = TextStyle::default();
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => runs.clear(),
                b"r" => style = TextStyle::default(),
                b"t" => in_text = !in_phonetic,
                b"rPh" => in_phonetic = true,
                name => apply_style(&mut style, name, &e)?,
            },
            Event::Empty(e) => apply_style(&mut style, e.local_name().as_ref(), &e)?,
            Event::Text(e) if in_text => {
                let text = e.unescape()?;
                push_text(&mut runs, &text, style);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => style = TextStyle::default(),
                b"rPh" => in_phonetic = false,
                b"si" => strings.push(std::mem::take(&mut runs)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// `<b/>`, `<i/>` and `<u/>` inside a run's `<rPr>`. A `val` of `0`,
/// `false` or `none` switches the style off.
fn apply_style(style: &mut TextStyle, name: &[u8], element: &BytesStart) -> ImportExportResult<()> {
    let flag = match name {
        b"b" => &mut style.bold,
        b"i" => &mut style.italic,
        b"u" => &mut style.underline,
        _ => return Ok(()),
    };
    *flag = match element.try_get_attribute("val")? {
        Some(attr) => !matches!(attr.value.as_ref(), b"0" | b"false" | b"none"),
        None => true,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
<si><t>Governance</t></si>
<si><r><t xml:space="preserve">Board </t></r><r><rPr><b/><sz val="11"/></rPr><t>oversight</t></r></si>
<si><r><rPr><i/><u val="none"/></rPr><t>R&amp;D</t></r><rPh sb="0" eb="1"><t>ignored</t></rPh></si>
</sst>"#;

    #[test]
    fn test_parse_runs_per_string() {
        let strings = parse_shared_strings(SAMPLE).unwrap();
        assert_eq!(strings.len(), 3);
        assert_eq!(strings[0], vec![TextRun::plain("Governance")]);
        assert_eq!(
            strings[1],
            vec![
                TextRun::plain("Board "),
                TextRun::styled(
                    "oversight",
                    TextStyle {
                        bold: true,
                        ..TextStyle::default()
                    }
                ),
            ]
        );
        assert_eq!(
            strings[2],
            vec![TextRun::styled(
                "R&D",
                TextStyle {
                    italic: true,
                    ..TextStyle::default()
                }
            )]
        );
    }

    #[test]
    fn test_formatted_strings_from_workbook() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        let bold = rust_xlsxwriter::Format::new().set_bold();
        let plain = rust_xlsxwriter::Format::new();
        sheet.write_string(0, 0, "Category").unwrap();
        sheet
            .write_rich_string(1, 0, &[(&plain, "Board "), (&bold, "oversight")])
            .unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let formatted = formatted_strings(&bytes).unwrap();
        assert_eq!(formatted.len(), 1);
        assert_eq!(
            formatted.get("Board oversight").map(String::as_str),
            Some("Board <strong>oversight</strong>")
        );
    }

    #[test]
    fn test_not_an_archive() {
        assert!(formatted_strings(b"not a zip").is_err());
    }
}
