//! Table-aware extraction: detect cell grids and linearize them
//!
//! Detection works on positioned text spans recovered from the page's
//! content stream. Rows are clustered by Y position, columns by the X
//! positions shared across rows. Each detected table renders one line per
//! row with cells joined by `" | "`; missing cells render as empty strings
//! so column alignment survives across rows.

use crate::DocError;
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

/// Delimiter between cells in a linearized table row.
pub const CELL_DELIMITER: &str = " | ";

/// A detected table as a row-major grid of optional cell texts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableGrid {
    pub cells: Vec<Vec<Option<String>>>,
}

impl TableGrid {
    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Linearize: one line per row, cells joined by [`CELL_DELIMITER`],
    /// missing cells rendered as empty strings (never omitted).
    pub fn render(&self) -> String {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_deref().unwrap_or(""))
                    .collect::<Vec<_>>()
                    .join(CELL_DELIMITER)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Detects tables on one page of an opened document.
///
/// Implementations return grids in detection order. A failure is page-level:
/// the orchestrator records it and degrades the page's table block to empty.
pub trait TableDetector {
    fn detect_tables(
        &self,
        doc: &Document,
        page_id: ObjectId,
        page: u32,
    ) -> Result<Vec<TableGrid>, DocError>;
}

/// Built-in detector that clusters positioned text spans into row/column
/// grids. Tables have fixed column positions across rows; paragraph text has
/// varying word positions, which is what the column-consistency requirement
/// filters out.
pub struct GridTableDetector {
    /// Spans within this Y distance belong to the same row.
    pub row_tolerance: f32,
    /// X positions within this distance collapse into one column.
    pub column_tolerance: f32,
    /// Vertical gap that ends a table region.
    pub region_gap: f32,
    /// Minimum rows for a region to qualify as a table.
    pub min_rows: usize,
    /// Minimum columns per row for the row to count as tabular.
    pub min_columns: usize,
}

impl Default for GridTableDetector {
    fn default() -> Self {
        Self {
            row_tolerance: 3.0,
            column_tolerance: 12.0,
            region_gap: 40.0,
            min_rows: 2,
            min_columns: 2,
        }
    }
}

impl TableDetector for GridTableDetector {
    fn detect_tables(
        &self,
        doc: &Document,
        page_id: ObjectId,
        page: u32,
    ) -> Result<Vec<TableGrid>, DocError> {
        let spans = positioned_spans(doc, page_id, page)?;
        Ok(self.grids_from_spans(spans))
    }
}

impl GridTableDetector {
    fn grids_from_spans(&self, spans: Vec<Span>) -> Vec<TableGrid> {
        let rows = self.group_rows(spans);
        let mut grids = Vec::new();
        let mut region: Vec<&Row> = Vec::new();
        let mut last_y = f32::INFINITY;

        for row in &rows {
            let tabular = row.spans.len() >= self.min_columns;
            let contiguous = last_y.is_infinite() || (last_y - row.y) <= self.region_gap;
            if !(tabular && contiguous) {
                if region.len() >= self.min_rows {
                    if let Some(grid) = self.build_grid(&region) {
                        grids.push(grid);
                    }
                }
                region.clear();
            }
            if tabular {
                region.push(row);
            }
            last_y = row.y;
        }
        if region.len() >= self.min_rows {
            if let Some(grid) = self.build_grid(&region) {
                grids.push(grid);
            }
        }

        grids
    }

    /// Group spans into rows by Y position (descending, i.e. top of page
    /// first), then order each row left to right.
    fn group_rows(&self, mut spans: Vec<Span>) -> Vec<Row> {
        spans.sort_by(|a, b| {
            b.y.partial_cmp(&a.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut rows: Vec<Row> = Vec::new();
        for span in spans {
            match rows.last_mut() {
                Some(row) if (row.y - span.y).abs() < self.row_tolerance => {
                    row.spans.push(span);
                }
                _ => {
                    let y = span.y;
                    rows.push(Row {
                        y,
                        spans: vec![span],
                    });
                }
            }
        }
        for row in &mut rows {
            row.spans
                .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        }
        rows
    }

    fn build_grid(&self, region: &[&Row]) -> Option<TableGrid> {
        let columns = self.column_positions(region);
        if columns.len() < self.min_columns {
            return None;
        }

        let mut cells = Vec::with_capacity(region.len());
        for row in region {
            let mut row_cells: Vec<Option<String>> = vec![None; columns.len()];
            for span in &row.spans {
                let col = nearest_column(&columns, span.x);
                match &mut row_cells[col] {
                    Some(existing) => {
                        existing.push(' ');
                        existing.push_str(span.text.trim());
                    }
                    slot => *slot = Some(span.text.trim().to_string()),
                }
            }
            cells.push(row_cells);
        }

        Some(TableGrid { cells })
    }

    /// Cluster the X start positions of all spans in the region into column
    /// anchors, left to right.
    fn column_positions(&self, region: &[&Row]) -> Vec<f32> {
        let mut xs: Vec<f32> = region
            .iter()
            .flat_map(|row| row.spans.iter().map(|s| s.x))
            .collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut columns: Vec<f32> = Vec::new();
        for x in xs {
            match columns.last() {
                Some(&last) if (x - last) <= self.column_tolerance => {}
                _ => columns.push(x),
            }
        }
        columns
    }
}

fn nearest_column(columns: &[f32], x: f32) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, &col) in columns.iter().enumerate() {
        let dist = (x - col).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// A positioned run of text from a content stream.
#[derive(Debug, Clone)]
struct Span {
    text: String,
    x: f32,
    y: f32,
}

#[derive(Debug)]
struct Row {
    y: f32,
    spans: Vec<Span>,
}

/// Recover positioned text spans from one page.
///
/// This is a reduced content-stream interpreter: it tracks the text and line
/// matrices plus the current font, enough to place each shown string on the
/// page. Rotated or CTM-scaled text is placed at its untransformed text-space
/// position, which is sufficient for row/column clustering.
fn positioned_spans(doc: &Document, page_id: ObjectId, page: u32) -> Result<Vec<Span>, DocError> {
    let page_error = |reason: String| DocError::PageExtraction { page, reason };

    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();
    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| page_error(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| page_error(e.to_string()))?;

    let mut spans = Vec::new();
    let mut current_font = String::new();
    let mut font_size: f32 = 12.0;
    let mut text_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut line_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut in_text_block = false;

    for op in &content.operations {
        match op.operator.as_str() {
            "BT" => {
                in_text_block = true;
                text_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                line_matrix = text_matrix;
            }
            "ET" => in_text_block = false,
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Ok(name) = op.operands[0].as_name() {
                        current_font = String::from_utf8_lossy(name).to_string();
                    }
                    if let Some(size) = operand_number(&op.operands[1]) {
                        font_size = size;
                    }
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    line_matrix[4] += operand_number(&op.operands[0]).unwrap_or(0.0);
                    line_matrix[5] += operand_number(&op.operands[1]).unwrap_or(0.0);
                    text_matrix = line_matrix;
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    for (i, operand) in op.operands.iter().take(6).enumerate() {
                        text_matrix[i] = operand_number(operand)
                            .unwrap_or(if i == 0 || i == 3 { 1.0 } else { 0.0 });
                    }
                    line_matrix = text_matrix;
                }
            }
            "T*" => {
                line_matrix[5] -= font_size * 1.2;
                text_matrix = line_matrix;
            }
            "Tj" | "'" => {
                if op.operator == "'" {
                    line_matrix[5] -= font_size * 1.2;
                    text_matrix = line_matrix;
                }
                if in_text_block && !op.operands.is_empty() {
                    if let Some(text) =
                        decode_text_operand(&op.operands[0], doc, &fonts, &current_font)
                    {
                        push_span(&mut spans, text, &text_matrix);
                    }
                }
            }
            "TJ" => {
                if in_text_block && !op.operands.is_empty() {
                    if let Ok(array) = op.operands[0].as_array() {
                        let mut combined = String::new();
                        for item in array {
                            if let Some(text) =
                                decode_text_operand(item, doc, &fonts, &current_font)
                            {
                                combined.push_str(&text);
                            }
                        }
                        push_span(&mut spans, combined, &text_matrix);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn push_span(spans: &mut Vec<Span>, text: String, text_matrix: &[f32; 6]) {
    if !text.trim().is_empty() {
        spans.push(Span {
            text,
            x: text_matrix[4],
            y: text_matrix[5],
        });
    }
}

fn operand_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Decode a shown string through the current font's encoding, falling back
/// to UTF-16BE (BOM-tagged) and then Latin-1.
fn decode_text_operand(
    obj: &Object,
    doc: &Document,
    fonts: &std::collections::BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    current_font: &str,
) -> Option<String> {
    if let Object::String(bytes, _) = obj {
        if let Some(font_dict) = fonts.get(current_font.as_bytes()) {
            if let Ok(encoding) = font_dict.get_font_encoding(doc) {
                if let Ok(text) = Document::decode_text(&encoding, bytes) {
                    return Some(text);
                }
            }
        }

        if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
            let utf16: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
                .collect();
            return Some(String::from_utf16_lossy(&utf16));
        }

        Some(bytes.iter().map(|&b| b as char).collect())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, y: f32) -> Span {
        Span {
            text: text.to_string(),
            x,
            y,
        }
    }

    #[test]
    fn test_render_joins_cells_with_delimiter() {
        let grid = TableGrid {
            cells: vec![
                vec![Some("A".into()), Some("B".into())],
                vec![Some("C".into()), Some("D".into())],
            ],
        };
        assert_eq!(grid.render(), "A | B\nC | D");
    }

    #[test]
    fn test_render_missing_cells_stay_aligned() {
        let grid = TableGrid {
            cells: vec![
                vec![Some("Qty".into()), None, Some("Total".into())],
                vec![Some("2".into()), Some("Widget".into()), None],
            ],
        };
        assert_eq!(grid.render(), "Qty |  | Total\n2 | Widget | ");
    }

    #[test]
    fn test_render_dimensions() {
        // M rows, N columns: M lines with N-1 delimiters each
        let rows = 4;
        let cols = 3;
        let grid = TableGrid {
            cells: (0..rows)
                .map(|r| (0..cols).map(|c| Some(format!("r{r}c{c}"))).collect())
                .collect(),
        };
        let rendered = grid.render();
        assert_eq!(rendered.lines().count(), rows);
        for line in rendered.lines() {
            assert_eq!(line.matches(CELL_DELIMITER).count(), cols - 1);
        }
    }

    #[test]
    fn test_two_by_two_grid_from_spans() {
        let detector = GridTableDetector::default();
        let spans = vec![
            span("A", 50.0, 700.0),
            span("B", 150.0, 700.0),
            span("C", 50.0, 680.0),
            span("D", 150.0, 680.0),
        ];
        let grids = detector.grids_from_spans(spans);
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].render(), "A | B\nC | D");
    }

    #[test]
    fn test_single_column_text_is_not_a_table() {
        let detector = GridTableDetector::default();
        let spans = vec![
            span("First paragraph line", 50.0, 700.0),
            span("second line of prose", 50.0, 685.0),
            span("third line", 50.0, 670.0),
        ];
        assert!(detector.grids_from_spans(spans).is_empty());
    }

    #[test]
    fn test_large_gap_splits_regions() {
        let detector = GridTableDetector::default();
        // Two 2x2 clusters separated by more than region_gap
        let spans = vec![
            span("A", 50.0, 700.0),
            span("B", 150.0, 700.0),
            span("C", 50.0, 685.0),
            span("D", 150.0, 685.0),
            span("E", 50.0, 400.0),
            span("F", 150.0, 400.0),
            span("G", 50.0, 385.0),
            span("H", 150.0, 385.0),
        ];
        let grids = detector.grids_from_spans(spans);
        assert_eq!(grids.len(), 2);
    }

    #[test]
    fn test_missing_cell_renders_empty() {
        let detector = GridTableDetector::default();
        // Second row has no entry in the middle column
        let spans = vec![
            span("A", 50.0, 700.0),
            span("B", 150.0, 700.0),
            span("C", 250.0, 700.0),
            span("D", 50.0, 680.0),
            span("F", 250.0, 680.0),
        ];
        let mut grids = detector.grids_from_spans(spans);
        assert_eq!(grids.len(), 1);
        let grid = grids.remove(0);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.render(), "A | B | C\nD |  | F");
    }
}
