use pdf_extract::{Document, MediaBox, OutputDev, OutputError, Transform};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{IngestError, Result};

/// A rectangular grid of cell strings found on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub page: usize,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, padding short rows with empty cells.
    pub fn new(page: usize, mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { page, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }
}

/// Locates tables inside a PDF on disk, in document order.
pub trait TableExtractor {
    fn extract_tables(&self, path: &Path) -> Result<Vec<Table>>;
}

/// Select the first detected table.
pub fn first_table(tables: Vec<Table>) -> Result<Table> {
    tables.into_iter().next().ok_or(IngestError::NoTableFound)
}

pub struct TableDetectorConfig {
    pub min_rows: usize,
    pub min_columns: usize,
    /// Horizontal gap, in multiples of the font size, that separates two cells.
    pub column_gap: f64,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            column_gap: 1.0,
        }
    }
}

// Smaller gaps than this between glyphs are kerning, not word breaks.
const WORD_GAP: f64 = 0.1;

/// One glyph as placed on the page, in PDF user space (y grows upwards).
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub x: f64,
    pub y: f64,
    pub advance: f64,
    pub size: f64,
    pub text: String,
}

impl Glyph {
    fn end(&self) -> f64 {
        self.x + self.advance
    }
}

/// Collects positioned glyphs per page from the PDF content streams.
#[derive(Default)]
struct GlyphCollector {
    pages: Vec<Vec<Glyph>>,
}

impl OutputDev for GlyphCollector {
    fn begin_page(
        &mut self,
        _page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        self.pages.push(Vec::new());
        Ok(())
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        text: &str,
    ) -> std::result::Result<(), OutputError> {
        let size = font_size * (trm.m11 * trm.m22 - trm.m12 * trm.m21).abs().sqrt();
        if let Some(page) = self.pages.last_mut() {
            page.push(Glyph {
                x: trm.m31,
                y: trm.m32,
                advance: width * size,
                size,
                text: text.to_string(),
            });
        }
        Ok(())
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }
}

/// Detects tables from glyph positions in the PDF text layer.
///
/// Glyphs sharing a baseline form a line; a horizontal gap wider than
/// `column_gap` font sizes (or a tab / ideographic space glyph) starts a new
/// cell. A table is a run of at least `min_rows` consecutive lines that each
/// have at least `min_columns` cells.
pub struct LayoutTableExtractor {
    config: TableDetectorConfig,
}

impl LayoutTableExtractor {
    pub fn new(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables in glyphs already grouped by page (index 0 is page 1).
    pub fn detect_tables(&self, pages: Vec<Vec<Glyph>>) -> Vec<Table> {
        let mut tables = Vec::new();

        for (index, glyphs) in pages.into_iter().enumerate() {
            let page_number = index + 1;
            let mut current: Vec<Vec<String>> = Vec::new();

            for line in group_lines(glyphs) {
                let cells = split_cells(&line, self.config.column_gap);
                if cells.is_empty() {
                    continue;
                }

                if cells.len() >= self.config.min_columns {
                    current.push(cells);
                } else {
                    self.flush(page_number, &mut current, &mut tables);
                }
            }

            self.flush(page_number, &mut current, &mut tables);
        }

        tables
    }

    fn flush(&self, page: usize, current: &mut Vec<Vec<String>>, tables: &mut Vec<Table>) {
        if current.len() >= self.config.min_rows {
            tables.push(Table::new(page, std::mem::take(current)));
        } else {
            current.clear();
        }
    }
}

impl Default for LayoutTableExtractor {
    fn default() -> Self {
        Self::new(TableDetectorConfig::default())
    }
}

impl TableExtractor for LayoutTableExtractor {
    fn extract_tables(&self, path: &Path) -> Result<Vec<Table>> {
        let pages = read_glyphs(path)?;
        let glyphs: usize = pages.iter().map(Vec::len).sum();

        let tables = self.detect_tables(pages);
        tracing::debug!(
            path = %path.display(),
            glyphs,
            tables = tables.len(),
            "Scanned PDF text layer for tables"
        );

        Ok(tables)
    }
}

fn read_glyphs(path: &Path) -> Result<Vec<Vec<Glyph>>> {
    let mut doc = Document::load(path).map_err(|e| IngestError::Pdf(e.to_string()))?;
    if doc.is_encrypted() {
        doc.decrypt("").map_err(|e| IngestError::Pdf(e.to_string()))?;
    }

    let mut collector = GlyphCollector::default();
    pdf_extract::output_doc(&doc, &mut collector).map_err(|e| IngestError::Pdf(e.to_string()))?;
    Ok(collector.pages)
}

/// Group glyphs into lines top to bottom, each sorted left to right.
fn group_lines(mut glyphs: Vec<Glyph>) -> Vec<Vec<Glyph>> {
    glyphs.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<Vec<Glyph>> = Vec::new();
    for glyph in glyphs {
        match lines.last_mut() {
            Some(line) if (line[0].y - glyph.y).abs() <= line[0].size.max(glyph.size) * 0.5 => {
                line.push(glyph)
            }
            _ => lines.push(vec![glyph]),
        }
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    lines
}

fn is_column_break(text: &str) -> bool {
    matches!(text, "\t" | "\u{3000}")
}

fn split_cells(line: &[Glyph], column_gap: f64) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut last_end: Option<f64> = None;

    for glyph in line {
        if is_column_break(&glyph.text) {
            push_cell(&mut cells, &mut cell);
            last_end = None;
            continue;
        }
        // Space glyphs widen the gap to the next visible glyph instead of filling it.
        if glyph.text.trim().is_empty() {
            continue;
        }

        if let Some(end) = last_end {
            let gap = glyph.x - end;
            if gap > glyph.size * column_gap {
                push_cell(&mut cells, &mut cell);
            } else if gap > glyph.size * WORD_GAP && !cell.is_empty() {
                cell.push(' ');
            }
        }

        cell.push_str(&glyph.text);
        last_end = Some(glyph.end());
    }

    push_cell(&mut cells, &mut cell);
    cells
}

fn push_cell(cells: &mut Vec<String>, cell: &mut String) {
    let text = cell.trim();
    if !text.is_empty() {
        cells.push(text.to_string());
    }
    cell.clear();
}
