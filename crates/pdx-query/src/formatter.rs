//! Result formatting: table and JSON output.

use serde::Serialize;

use pdx_store::{EntityMention, PaperRecord};

/// Output format for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Printed by the table format when a query matches nothing.
pub const NO_RESULTS: &str = "No results found";

/// Format paper rows.
#[must_use]
pub fn format_papers(rows: &[PaperRecord], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(rows),
        OutputFormat::Table => format_table(
            &["paper_id", "paper_name", "paper_pdf", "paper_docx", "paper_json", "paper_entities"],
            rows.iter()
                .map(|r| {
                    vec![
                        r.paper_id.to_string(),
                        r.paper_name.clone(),
                        r.paper_pdf.clone(),
                        r.paper_docx.clone(),
                        r.paper_json.clone(),
                        r.paper_entities.clone(),
                    ]
                })
                .collect(),
        ),
    }
}

/// Format the entities linked to one paper.
#[must_use]
pub fn format_mentions(rows: &[EntityMention], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(rows),
        OutputFormat::Table => format_table(
            &["entity_id", "entity_name", "entity_type", "count"],
            rows.iter()
                .map(|m| {
                    vec![
                        m.entity_id.to_string(),
                        m.name.clone(),
                        m.entity_type.clone(),
                        m.count.to_string(),
                    ]
                })
                .collect(),
        ),
    }
}

fn format_json<T: Serialize>(rows: &[T]) -> String {
    serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string())
}

fn format_table(columns: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let mut output = String::new();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{c:w$}"))
        .collect();
    output.push_str(header.join(" | ").trim_end());
    output.push('\n');

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&sep.join("-+-"));
    output.push('\n');

    for row in &rows {
        let vals: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{v:w$}"))
            .collect();
        output.push_str(vals.join(" | ").trim_end());
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> Vec<PaperRecord> {
        vec![
            PaperRecord {
                paper_id: 1,
                paper_name: "Calvert 2021".to_string(),
                paper_pdf: "Papers/a.pdf".to_string(),
                paper_docx: "Docs/a.pdf.txt".to_string(),
                paper_json: "JSON/a.pdf.json".to_string(),
                paper_entities: "Ents/a.pdf.json".to_string(),
            },
            PaperRecord {
                paper_id: 2,
                paper_name: "Doe".to_string(),
                paper_pdf: "Papers/b.pdf".to_string(),
                paper_docx: "Docs/b.pdf.txt".to_string(),
                paper_json: "JSON/b.pdf.json".to_string(),
                paper_entities: "Ents/b.pdf.json".to_string(),
            },
        ]
    }

    #[test]
    fn format_as_table() {
        let output = format_papers(&sample_rows(), OutputFormat::Table);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("paper_id | paper_name   | paper_pdf"));
        assert!(lines[1].starts_with("---------+-"));
        assert!(lines[2].starts_with("1        | Calvert 2021 | Papers/a.pdf"));
        assert!(lines[3].contains("| Doe          |"));
    }

    #[test]
    fn format_as_json() {
        let output = format_papers(&sample_rows(), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["paper_name"], "Calvert 2021");
        assert_eq!(parsed[1]["paper_id"], 2);
    }

    #[test]
    fn format_empty_result() {
        assert_eq!(format_papers(&[], OutputFormat::Table), NO_RESULTS);
        assert_eq!(format_papers(&[], OutputFormat::Json), "[]");
    }

    #[test]
    fn format_mentions_table() {
        let rows = vec![EntityMention {
            entity_id: 7,
            name: "Acme".to_string(),
            entity_type: "ORG".to_string(),
            count: 3,
        }];
        let output = format_mentions(&rows, OutputFormat::Table);
        assert!(output.contains("entity_name"));
        assert!(output.lines().nth(2).unwrap().starts_with("7         | Acme"));
    }
}
