//! Linearization of structured-analyzer output.
//!
//! Tables become tab-separated rows bracketed by `[Table]` markers and are
//! embedded after the text of the page they were detected on, preserving
//! reading order. Pages are joined with a `---PAGE---` separator.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use formfill_core::{StructuredPage, TableBlock};

pub const TABLE_OPEN: &str = "[Table]";
pub const TABLE_CLOSE: &str = "[/Table]";
pub const PAGE_SEPARATOR: &str = "---PAGE---";

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td, th").unwrap());

/// Render one table as tab-separated rows, one row per line.
pub fn linearize_table(block: &TableBlock) -> String {
    match block {
        TableBlock::Rows(rows) => rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n"),
        TableBlock::Html(html) => {
            let fragment = Html::parse_fragment(html);
            fragment
                .select(&ROW_SELECTOR)
                .map(|row| {
                    row.select(&CELL_SELECTOR)
                        .map(|cell| {
                            cell.text()
                                .collect::<String>()
                                .split_whitespace()
                                .collect::<Vec<_>>()
                                .join(" ")
                        })
                        .collect::<Vec<_>>()
                        .join("\t")
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// Render one page: its reading-order text followed by each detected
/// table, bracketed so the matching model can see table boundaries.
pub fn linearize_page(page: &StructuredPage) -> String {
    let mut out = page.text.trim_end().to_string();
    for table in &page.tables {
        let body = linearize_table(table);
        if body.trim().is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(TABLE_OPEN);
        out.push('\n');
        out.push_str(&body);
        out.push('\n');
        out.push_str(TABLE_CLOSE);
    }
    out
}

/// Render an analyzed document, pages joined by the page separator.
pub fn linearize_pages(pages: &[StructuredPage]) -> String {
    pages
        .iter()
        .map(linearize_page)
        .collect::<Vec<_>>()
        .join(&format!("\n{PAGE_SEPARATOR}\n"))
}
