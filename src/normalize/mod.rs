use tracing::{debug, info, instrument};

use crate::error::{Result, ToolError};
use crate::io::source::{Cell, SourceFile, SourceTable, read_source};
use crate::model::{
    NormalizedRow, NormalizedTable, ORIGINAL_PRICE, PRODUCT_ID, PRODUCT_NAME, Price,
    SELLING_PRICE, VARIANT_ID, VARIANT_NAME, product_link,
};
use crate::progress::Progress;

/// How a source value is coerced before it lands in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Identifier: string form with a trailing ".0" removed.
    Id,
    /// Free text, copied as a string.
    Text,
    /// Number; anything unparseable becomes 0.
    Price,
}

/// One entry of the source → template field mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub template: &'static str,
    pub source: &'static str,
    pub coercion: Coercion,
}

/// Column names of the marketplace price export, keyed by template column.
pub const FIELD_MAPPING: [FieldMapping; 6] = [
    FieldMapping {
        template: PRODUCT_ID,
        source: "Mã sản phẩm",
        coercion: Coercion::Id,
    },
    FieldMapping {
        template: PRODUCT_NAME,
        source: "Tên Sản phẩm (Tùy chọn)",
        coercion: Coercion::Text,
    },
    FieldMapping {
        template: VARIANT_ID,
        source: "Mã phân loại hàng",
        coercion: Coercion::Id,
    },
    FieldMapping {
        template: VARIANT_NAME,
        source: "Tên phân loại hàng (Tùy chọn)",
        coercion: Coercion::Text,
    },
    FieldMapping {
        template: ORIGINAL_PRICE,
        source: "Giá gốc (Tùy chọn)",
        coercion: Coercion::Price,
    },
    FieldMapping {
        template: SELLING_PRICE,
        source: "Giá đã giảm",
        coercion: Coercion::Price,
    },
];

/// Removes one trailing ".0" left behind by number-to-string coercion.
pub fn strip_float_suffix(value: &str) -> &str {
    value.strip_suffix(".0").unwrap_or(value)
}

/// Coerces an identifier cell to its string form.
pub fn normalize_id(cell: &Cell) -> String {
    strip_float_suffix(&cell.to_text()).to_string()
}

/// Coerces a price cell to a number; missing or invalid values become 0.
pub fn normalize_price(cell: &Cell) -> Price {
    match cell {
        Cell::Number(value) => Price::new(*value),
        Cell::Text(value) => value
            .trim()
            .parse::<f64>()
            .map(Price::new)
            .unwrap_or_default(),
        Cell::Bool(value) => Price::new(if *value { 1.0 } else { 0.0 }),
        Cell::Empty => Price::default(),
    }
}

/// Maps one source table onto the template, tagging every row with `shop_id`.
pub fn normalize_table(table: &SourceTable, shop_id: &str) -> Vec<NormalizedRow> {
    let columns: Vec<Option<usize>> = FIELD_MAPPING
        .iter()
        .map(|mapping| table.column_index(mapping.source))
        .collect();
    debug!(
        matched = columns.iter().filter(|index| index.is_some()).count(),
        "resolved source columns"
    );

    table
        .rows
        .iter()
        .map(|row| {
            let cells: Vec<Option<&Cell>> =
                columns.iter().map(|index| lookup(row, *index)).collect();
            let text = |slot: usize| {
                cells[slot]
                    .map(|cell| match FIELD_MAPPING[slot].coercion {
                        Coercion::Id => normalize_id(cell),
                        _ => cell.to_text(),
                    })
                    .unwrap_or_default()
            };

            let product_id = text(0);
            NormalizedRow {
                shop_id: shop_id.to_string(),
                link: product_link(shop_id, &product_id),
                product_id,
                product_name: text(1),
                variant_id: text(2),
                variant_name: text(3),
                original_price: cells[4].map(normalize_price),
                selling_price: cells[5].map(normalize_price),
            }
        })
        .collect()
}

static EMPTY_CELL: Cell = Cell::Empty;

/// The cell under a mapped column; rows shorter than the header read as empty.
fn lookup(row: &[Cell], index: Option<usize>) -> Option<&Cell> {
    index.map(|index| row.get(index).unwrap_or(&EMPTY_CELL))
}

/// Reads and normalizes every source file in upload order, concatenating the
/// results. The first failing file aborts the whole run.
#[instrument(level = "info", skip_all, fields(file_count = files.len(), shop_id = %shop_id))]
pub fn normalize_files(
    files: &[SourceFile],
    shop_id: &str,
    progress: &mut dyn Progress,
) -> Result<NormalizedTable> {
    if files.is_empty() {
        return Err(ToolError::MissingSourceFiles);
    }

    let total = files.len();
    let mut merged = NormalizedTable::default();
    for (index, file) in files.iter().enumerate() {
        progress.report(
            0.2 + (index as f32 / total as f32) * 0.3,
            &format!("Reading file {}/{total}...", index + 1),
        );
        file.format()?;
        let table = read_source(file).map_err(|error| ToolError::SourceFile {
            file: file.name().to_string(),
            reason: error.to_string(),
        })?;
        let rows = normalize_table(&table, shop_id);
        info!(file = file.name(), rows = rows.len(), "normalized source file");
        merged.rows.extend(rows);
    }

    progress.report(0.5, "Merging data from files...");
    Ok(merged)
}
