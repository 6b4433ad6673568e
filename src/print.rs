use stanza::renderer::Renderer;
use stanza::renderer::console::Console;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};

use crate::eda::{Report, Section};

/// Table with a header row; columns after the first are right-aligned.
pub fn tabulate(headers: &[String], rows: &[Vec<String>]) -> Table {
    let mut table = Table::default()
        .with_cols(
            (0..headers.len())
                .map(|idx| {
                    let styles = Styles::default().with(MinWidth(6));
                    if idx == 0 {
                        Col::new(styles)
                    } else {
                        Col::new(styles.with(HAlign::Right))
                    }
                })
                .collect(),
        )
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            headers.iter().map(|h| h.clone().into()).collect(),
        ));
    for row in rows {
        table.push_row(Row::new(
            Styles::default(),
            row.iter().map(|cell| cell.clone().into()).collect(),
        ));
    }
    table
}

pub fn tabulate_section(section: &Section) -> Table {
    tabulate(&section.headers, &section.rows)
}

pub fn render(table: &Table) -> String {
    Console::default().render(table).to_string()
}

/// Title, metrics and every section of a report as console text.
pub fn render_report(report: &Report) -> String {
    let mut out = format!("=== {} ===\n", report.title);
    if !report.metrics.is_empty() {
        let rows: Vec<Vec<String>> = report
            .metrics
            .iter()
            .map(|(name, value)| vec![name.clone(), value.clone()])
            .collect();
        out.push_str(&render(&tabulate(&["metric".to_string(), "value".to_string()], &rows)));
        out.push('\n');
    }
    for section in &report.sections {
        out.push_str(&format!("\n{}\n", section.title));
        if section.rows.is_empty() {
            out.push_str("(none)\n");
        } else {
            out.push_str(&render(&tabulate_section(section)));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{render, render_report, tabulate};
    use crate::eda::{Report, Section};

    #[test]
    fn rendered_table_contains_every_cell() {
        let table = tabulate(
            &["team".to_string(), "windows".to_string()],
            &[vec!["Spain".to_string(), "12".to_string()]],
        );
        let text = render(&table);
        assert!(text.contains("team"));
        assert!(text.contains("Spain"));
        assert!(text.contains("12"));
    }

    #[test]
    fn empty_sections_are_marked() {
        let report = Report::new("Lineups")
            .metric("rows", 0)
            .section(Section::new("Positions", &["position", "count"]));
        let text = render_report(&report);
        assert!(text.starts_with("=== Lineups ==="));
        assert!(text.contains("Positions\n(none)"));
    }
}
