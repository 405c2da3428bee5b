use std::fmt;

/// Template column holding the run's shop identifier.
pub const SHOP_ID: &str = "Shop_id";
/// Template column holding the product identifier.
pub const PRODUCT_ID: &str = "ID sản phẩm";
/// Template column holding the product name.
pub const PRODUCT_NAME: &str = "Tên sản phẩm";
/// Template column holding the variant identifier.
pub const VARIANT_ID: &str = "ID phân loại";
/// Template column holding the variant name.
pub const VARIANT_NAME: &str = "Tên phân loại";
/// Template column holding the derived product link.
pub const LINK: &str = "Link";
/// Template column holding the original (list) price.
pub const ORIGINAL_PRICE: &str = "Giá gốc";
/// Template column holding the current selling price.
pub const SELLING_PRICE: &str = "Giá đang bán";
/// Reserved flash-sale price column, always blank.
pub const FLASH_SALE_PRICE: &str = "Giá FS";
/// Reserved campaign price column, always blank.
pub const CAMPAIGN_PRICE: &str = "Giá campaign";

/// The fixed output layout every normalized row conforms to.
pub const TEMPLATE_COLUMNS: [&str; 10] = [
    SHOP_ID,
    PRODUCT_ID,
    PRODUCT_NAME,
    VARIANT_ID,
    VARIANT_NAME,
    LINK,
    ORIGINAL_PRICE,
    SELLING_PRICE,
    FLASH_SALE_PRICE,
    CAMPAIGN_PRICE,
];

/// Prefix of every product link; the shop and product ids follow, dot separated.
pub const LINK_PREFIX: &str = "https://shopee.vn/a-i.";

/// Builds the product link for a shop/product pair.
pub fn product_link(shop_id: &str, product_id: &str) -> String {
    format!("{LINK_PREFIX}{shop_id}.{product_id}")
}

/// A normalized price. Always finite.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Price(f64);

impl Price {
    /// Wraps a number, mapping NaN and infinities to zero.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Price(value)
        } else {
            Price(0.0)
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_number(self.0))
    }
}

/// Renders a spreadsheet number the way a person would type it: integral
/// values without a fractional part ("150000", not "150000.0").
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// One output cell of the template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateCell {
    Text(String),
    Number(Price),
    Blank,
}

impl TemplateCell {
    fn text(value: &str) -> Self {
        if value.is_empty() {
            TemplateCell::Blank
        } else {
            TemplateCell::Text(value.to_string())
        }
    }

    fn price(value: Option<Price>) -> Self {
        value.map_or(TemplateCell::Blank, TemplateCell::Number)
    }

    /// Literal string form, as sent to destinations that interpret values
    /// themselves.
    pub fn to_literal(&self) -> String {
        match self {
            TemplateCell::Text(value) => value.clone(),
            TemplateCell::Number(price) => price.to_string(),
            TemplateCell::Blank => String::new(),
        }
    }
}

/// One record of the pricing template.
///
/// Text fields use the empty string for "blank". Prices are `None` when the
/// source file had no such column at all and `Some` (possibly zero) when the
/// column existed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRow {
    pub shop_id: String,
    pub product_id: String,
    pub product_name: String,
    pub variant_id: String,
    pub variant_name: String,
    pub link: String,
    pub original_price: Option<Price>,
    pub selling_price: Option<Price>,
}

impl NormalizedRow {
    /// The row's cells in [`TEMPLATE_COLUMNS`] order.
    pub fn cells(&self) -> [TemplateCell; 10] {
        [
            TemplateCell::text(&self.shop_id),
            TemplateCell::text(&self.product_id),
            TemplateCell::text(&self.product_name),
            TemplateCell::text(&self.variant_id),
            TemplateCell::text(&self.variant_name),
            TemplateCell::text(&self.link),
            TemplateCell::price(self.original_price),
            TemplateCell::price(self.selling_price),
            TemplateCell::Blank,
            TemplateCell::Blank,
        ]
    }

    pub fn to_literals(&self) -> Vec<String> {
        self.cells().iter().map(TemplateCell::to_literal).collect()
    }
}

/// The merged output of one run, in upload order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedTable {
    pub rows: Vec<NormalizedRow>,
}

impl NormalizedTable {
    pub fn columns(&self) -> &'static [&'static str] {
        &TEMPLATE_COLUMNS
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header-less literal rows, ready to append to a remote worksheet.
    pub fn literal_rows(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(NormalizedRow::to_literals).collect()
    }
}
