use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::model::{LINK, NormalizedTable, PRODUCT_NAME, TemplateCell};

/// Name of the single worksheet in the generated file.
pub const SHEET_NAME: &str = "Sheet1";

/// Font families offered for the generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontFamily {
    #[default]
    Calibri,
    Arial,
    TimesNewRoman,
}

impl FontFamily {
    pub fn name(self) -> &'static str {
        match self {
            FontFamily::Calibri => "Calibri",
            FontFamily::Arial => "Arial",
            FontFamily::TimesNewRoman => "Times New Roman",
        }
    }
}

/// Header font size in points, bounded to `8..=24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSize(u8);

impl FontSize {
    pub const MIN: u8 = 8;
    pub const MAX: u8 = 24;

    pub fn new(points: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&points)
            .then_some(FontSize(points))
    }

    pub fn points(self) -> u8 {
        self.0
    }
}

impl Default for FontSize {
    fn default() -> Self {
        FontSize(12)
    }
}

/// Caller selected typography. Data rows use one point less than the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStyle {
    pub family: FontFamily,
    pub size: FontSize,
}

/// Background treatment of data rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowBanding {
    #[default]
    None,
    /// Every second data row gets the given RGB fill.
    Zebra(u32),
}

/// Cosmetic layout of the generated sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetStyle {
    pub header_fill: u32,
    pub header_font_color: u32,
    pub wrap_header: bool,
    pub wrap_data: bool,
    pub banding: RowBanding,
    /// Fixed widths for named columns, bypassing the content heuristic.
    pub width_overrides: Vec<(&'static str, f64)>,
    pub max_column_width: f64,
}

impl Default for SheetStyle {
    fn default() -> Self {
        Self {
            header_fill: 0x107C41,
            header_font_color: 0xFFFFFF,
            wrap_header: true,
            wrap_data: false,
            banding: RowBanding::None,
            width_overrides: vec![(PRODUCT_NAME, 45.0), (LINK, 30.0)],
            max_column_width: 60.0,
        }
    }
}

/// Computes every column's width: `(longest cell + 2) * 1.2` over the header
/// and data, unless overridden, capped at the style's maximum. Prices count
/// in their float form, so `200000` measures as `200000.0`.
pub fn column_widths(table: &NormalizedTable, style: &SheetStyle) -> Vec<f64> {
    let mut longest: Vec<usize> = table
        .columns()
        .iter()
        .map(|header| header.chars().count())
        .collect();
    for row in &table.rows {
        for (col_idx, cell) in row.cells().iter().enumerate() {
            longest[col_idx] = longest[col_idx].max(measured_len(cell));
        }
    }

    table
        .columns()
        .iter()
        .zip(longest)
        .map(|(header, length)| {
            let width = style
                .width_overrides
                .iter()
                .find(|(name, _)| name == header)
                .map(|(_, width)| *width)
                .unwrap_or((length as f64 + 2.0) * 1.2);
            width.min(style.max_column_width)
        })
        .collect()
}

fn measured_len(cell: &TemplateCell) -> usize {
    match cell {
        TemplateCell::Number(price) => format!("{:?}", price.value()).chars().count(),
        other => other.to_literal().chars().count(),
    }
}

/// Writes the template table to a styled single-sheet workbook at `path`.
#[instrument(level = "info", skip_all, fields(output = %path.display(), rows = table.len()))]
pub fn write_template(
    path: &Path,
    table: &NormalizedTable,
    text: &TextStyle,
    style: &SheetStyle,
) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;
    fill_worksheet(worksheet, table, text, style)?;
    workbook.save(path)?;
    debug!("template workbook saved");
    Ok(())
}

fn fill_worksheet(
    worksheet: &mut Worksheet,
    table: &NormalizedTable,
    text: &TextStyle,
    style: &SheetStyle,
) -> Result<()> {
    let mut header_format = Format::new()
        .set_bold()
        .set_font_name(text.family.name())
        .set_font_size(f64::from(text.size.points()))
        .set_font_color(Color::RGB(style.header_font_color))
        .set_background_color(Color::RGB(style.header_fill))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    if style.wrap_header {
        header_format = header_format.set_text_wrap();
    }

    let mut data_format = Format::new()
        .set_font_name(text.family.name())
        .set_font_size(f64::from(text.size.points()) - 1.0)
        .set_align(FormatAlign::VerticalCenter);
    if style.wrap_data {
        data_format = data_format.set_text_wrap();
    }
    let banded_format = match style.banding {
        RowBanding::None => data_format.clone(),
        RowBanding::Zebra(fill) => data_format.clone().set_background_color(Color::RGB(fill)),
    };

    for (col_idx, header) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, *header, &header_format)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let sheet_row = (row_idx + 1) as u32;
        let format = if row_idx % 2 == 1 {
            &banded_format
        } else {
            &data_format
        };
        for (col_idx, cell) in row.cells().iter().enumerate() {
            let col = col_idx as u16;
            match cell {
                TemplateCell::Text(value) => {
                    worksheet.write_string_with_format(sheet_row, col, value, format)?;
                }
                TemplateCell::Number(price) => {
                    worksheet.write_number_with_format(sheet_row, col, price.value(), format)?;
                }
                TemplateCell::Blank => {
                    worksheet.write_blank(sheet_row, col, format)?;
                }
            }
        }
    }

    for (col_idx, width) in column_widths(table, style).into_iter().enumerate() {
        worksheet.set_column_width(col_idx as u16, width)?;
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NormalizedRow, Price};

    fn sample_table() -> NormalizedTable {
        NormalizedTable {
            rows: vec![NormalizedRow {
                shop_id: "998877".into(),
                product_id: "123456".into(),
                product_name: "A very long product name that goes on and on".into(),
                link: "https://shopee.vn/a-i.998877.123456".into(),
                original_price: Some(Price::new(150000.0)),
                ..NormalizedRow::default()
            }],
        }
    }

    #[test]
    fn widths_follow_longest_cell() {
        let widths = column_widths(&sample_table(), &SheetStyle::default());

        // "Shop_id" (7) vs "998877" (6)
        assert!((widths[0] - 10.8).abs() < 1e-9);
        // "ID sản phẩm" is 11 characters
        assert!((widths[1] - 15.6).abs() < 1e-9);
        assert_eq!(widths[2], 45.0);
        assert_eq!(widths[5], 30.0);
    }

    #[test]
    fn price_widths_use_float_rendering() {
        let mut table = sample_table();
        table.rows[0].original_price = Some(Price::new(200000.0));
        table.rows[0].selling_price = Some(Price::new(123456789012.5));
        let widths = column_widths(&table, &SheetStyle::default());

        // "200000.0" (8) beats "Giá gốc" (7)
        assert!((widths[6] - 12.0).abs() < 1e-9);
        // "123456789012.5" (14) beats "Giá đang bán" (12)
        assert!((widths[7] - 19.2).abs() < 1e-9);
    }

    #[test]
    fn widths_are_capped() {
        let mut table = sample_table();
        table.rows[0].variant_name = "x".repeat(200);
        let style = SheetStyle {
            max_column_width: 50.0,
            ..SheetStyle::default()
        };
        let widths = column_widths(&table, &style);
        assert_eq!(widths[4], 50.0);
    }

    #[test]
    fn font_size_is_bounded() {
        assert!(FontSize::new(7).is_none());
        assert_eq!(FontSize::new(24).map(FontSize::points), Some(24));
        assert!(FontSize::new(25).is_none());
    }
}
