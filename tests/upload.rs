use std::cell::RefCell;
use std::rc::Rc;

use price_template_tools::form::Destination;
use price_template_tools::io::source::SourceFile;
use price_template_tools::model::{NormalizedRow, NormalizedTable, Price, TEMPLATE_COLUMNS};
use price_template_tools::progress::Silent;
use price_template_tools::remote::{
    SheetsError, Spreadsheet, SpreadsheetService, WorksheetRef, WriteMode, upload,
};
use price_template_tools::sync::{self, RunRequest};

const LOCATOR: &str = "https://docs.google.com/spreadsheets/d/abc123/edit";

#[derive(Default)]
struct Book {
    sheets: RefCell<Vec<(WorksheetRef, Vec<Vec<String>>)>>,
    calls: RefCell<Vec<String>>,
    fail_append: bool,
}

impl Book {
    fn with_sheet(self, title: &str, values: Vec<Vec<String>>) -> Self {
        let id = self.sheets.borrow().len() as i64;
        self.sheets.borrow_mut().push((
            WorksheetRef {
                id,
                title: title.to_string(),
            },
            values,
        ));
        self
    }

    fn values(&self, title: &str) -> Vec<Vec<String>> {
        self.sheets
            .borrow()
            .iter()
            .find(|(sheet, _)| sheet.title == title)
            .map(|(_, values)| values.clone())
            .unwrap_or_default()
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

struct FakeService {
    book: Rc<Book>,
}

struct FakeSpreadsheet {
    book: Rc<Book>,
}

impl SpreadsheetService for FakeService {
    type Spreadsheet = FakeSpreadsheet;

    fn open_by_url(&self, url: &str) -> Result<FakeSpreadsheet, SheetsError> {
        if !url.contains("/spreadsheets/d/") {
            return Err(SheetsError::SpreadsheetNotFound(url.to_string()));
        }
        Ok(FakeSpreadsheet {
            book: Rc::clone(&self.book),
        })
    }
}

impl Spreadsheet for FakeSpreadsheet {
    fn worksheet(&self, title: &str) -> Result<Option<WorksheetRef>, SheetsError> {
        self.book.calls.borrow_mut().push(format!("worksheet {title}"));
        Ok(self
            .book
            .sheets
            .borrow()
            .iter()
            .find(|(sheet, _)| sheet.title == title)
            .map(|(sheet, _)| sheet.clone()))
    }

    fn add_worksheet(&self, title: &str, rows: u32, cols: u32) -> Result<WorksheetRef, SheetsError> {
        self.book
            .calls
            .borrow_mut()
            .push(format!("add {title} {rows}x{cols}"));
        let mut sheets = self.book.sheets.borrow_mut();
        let sheet = WorksheetRef {
            id: 100 + sheets.len() as i64,
            title: title.to_string(),
        };
        sheets.push((sheet.clone(), Vec::new()));
        Ok(sheet)
    }

    fn get_all_values(&self, worksheet: &WorksheetRef) -> Result<Vec<Vec<String>>, SheetsError> {
        self.book
            .calls
            .borrow_mut()
            .push(format!("read {}", worksheet.title));
        Ok(self.book.values(&worksheet.title))
    }

    fn append_rows(&self, worksheet: &WorksheetRef, rows: &[Vec<String>]) -> Result<(), SheetsError> {
        self.book
            .calls
            .borrow_mut()
            .push(format!("append {} {}", worksheet.title, rows.len()));
        if self.book.fail_append {
            return Err(SheetsError::Api {
                status: 403,
                message: "The caller does not have permission".to_string(),
            });
        }
        let mut sheets = self.book.sheets.borrow_mut();
        if let Some((_, values)) = sheets.iter_mut().find(|(sheet, _)| sheet.id == worksheet.id) {
            values.extend(rows.iter().cloned());
        }
        Ok(())
    }

    fn bold_header(&self, worksheet: &WorksheetRef, columns: usize) -> Result<(), SheetsError> {
        self.book
            .calls
            .borrow_mut()
            .push(format!("bold {} {columns}", worksheet.title));
        Ok(())
    }
}

fn fake(book: Book) -> (FakeService, Rc<Book>) {
    let book = Rc::new(book);
    (
        FakeService {
            book: Rc::clone(&book),
        },
        book,
    )
}

fn table(count: usize) -> NormalizedTable {
    let rows = (0..count)
        .map(|i| NormalizedRow {
            shop_id: "998877".to_string(),
            product_id: format!("{}", 1000 + i),
            product_name: format!("Item {i}"),
            variant_id: String::new(),
            variant_name: String::new(),
            link: format!("https://shopee.vn/a-i.998877.{}", 1000 + i),
            original_price: Some(Price::new(200000.0)),
            selling_price: Some(Price::new(150000.5)),
        })
        .collect();
    NormalizedTable { rows }
}

fn filled(count: usize) -> Vec<Vec<String>> {
    (0..count).map(|i| vec![format!("old {i}"), String::new()]).collect()
}

#[test]
fn missing_default_worksheet_is_created_with_header() {
    let (service, book) = fake(Book::default());

    let report = upload(&service, LOCATOR, None, &table(2), &mut Silent).expect("upload succeeds");

    assert_eq!(report.worksheet, "Sheet1");
    assert_eq!(report.mode, WriteMode::WithHeader);
    assert!(report.status_message().contains("Created and wrote data"));
    assert_eq!(
        book.calls(),
        vec![
            "worksheet Sheet1",
            "add Sheet1 1x20",
            "append Sheet1 3",
            "bold Sheet1 10",
        ]
    );

    let values = book.values("Sheet1");
    assert_eq!(values[0], TEMPLATE_COLUMNS.map(str::to_string).to_vec());
    assert_eq!(values[1][6], "200000");
    assert_eq!(values[1][7], "150000.5");
    assert_eq!(values[1][8], "");
}

#[test]
fn worksheet_with_content_gets_rows_appended_without_header() {
    let (service, book) = fake(Book::default().with_sheet("Prices", filled(5)));

    let report = upload(&service, LOCATOR, Some("Prices"), &table(3), &mut Silent)
        .expect("upload succeeds");

    assert_eq!(report.mode, WriteMode::Appended);
    assert_eq!(
        report.status_message(),
        "Success! Appended 3 new rows to worksheet 'Prices'."
    );
    let values = book.values("Prices");
    assert_eq!(values.len(), 8);
    assert_eq!(values[5][1], "1000");
    assert!(!book.calls().iter().any(|call| call.starts_with("bold")));
}

#[test]
fn existing_blank_worksheet_receives_header_and_is_not_recreated() {
    let blank = vec![vec![String::new(); 4], Vec::new()];
    let (service, book) = fake(Book::default().with_sheet("Sheet1", blank));

    let report = upload(&service, LOCATOR, Some("  "), &table(1), &mut Silent)
        .expect("upload succeeds");

    assert_eq!(report.mode, WriteMode::WithHeader);
    let calls = book.calls();
    assert!(calls.contains(&"read Sheet1".to_string()));
    assert!(!calls.iter().any(|call| call.starts_with("add")));
    assert!(calls.contains(&"bold Sheet1 10".to_string()));
}

#[test]
fn named_worksheet_is_created_next_to_existing_ones() {
    let (service, book) = fake(Book::default().with_sheet("Sheet1", filled(2)));

    let report = upload(&service, LOCATOR, Some(" Tháng 10 "), &table(1), &mut Silent)
        .expect("upload succeeds");

    assert_eq!(report.worksheet, "Tháng 10");
    assert_eq!(report.mode, WriteMode::WithHeader);
    assert_eq!(book.values("Sheet1").len(), 2);
    assert_eq!(book.values("Tháng 10").len(), 2);
    assert!(!book.calls().contains(&"read Tháng 10".to_string()));
}

#[test]
fn empty_table_on_sheet_with_content_appends_nothing() {
    let (service, book) = fake(Book::default().with_sheet("Sheet1", filled(1)));

    let report = upload(&service, LOCATOR, None, &table(0), &mut Silent).expect("upload succeeds");

    assert_eq!(report.rows, 0);
    assert_eq!(report.mode, WriteMode::Appended);
    assert!(!book.calls().iter().any(|call| call.starts_with("append")));
}

fn csv_request(destination: Destination, sheet_url: &str) -> RunRequest {
    let content = "Mã sản phẩm,Giá đã giảm\n123456,99000\n";
    RunRequest {
        shop_id: "998877".into(),
        files: vec![SourceFile::new("prices.csv", content.as_bytes().to_vec())],
        destination,
        sheet_url: sheet_url.into(),
        ..RunRequest::default()
    }
}

#[test]
fn remote_run_reports_the_upload() {
    let (service, book) = fake(Book::default().with_sheet("Sheet1", filled(4)));
    let request = csv_request(Destination::RemoteSheet, LOCATOR);

    let outcome = sync::run(&request, move || Ok(service), &mut Silent);

    assert!(outcome.success, "{}", outcome.status);
    assert_eq!(
        outcome.status,
        "Success! Appended 1 new rows to worksheet 'Sheet1'."
    );
    assert_eq!(outcome.artifact, None);
    assert_eq!(book.values("Sheet1")[4][5], "https://shopee.vn/a-i.998877.123456");
}

#[test]
fn remote_run_requires_a_link() {
    let (service, book) = fake(Book::default());
    let request = csv_request(Destination::RemoteSheet, "   ");

    let outcome = sync::run(&request, move || Ok(service), &mut Silent);

    assert!(!outcome.success);
    assert!(book.calls().is_empty());
}

#[test]
fn missing_credentials_have_their_own_message() {
    let request = csv_request(Destination::RemoteSheet, LOCATOR);

    let outcome = sync::run(
        &request,
        || -> Result<FakeService, SheetsError> {
            Err(SheetsError::MissingCredentials(
                "GOOGLE_CREDENTIALS_JSON".to_string(),
            ))
        },
        &mut Silent,
    );

    assert!(!outcome.success);
    assert!(outcome.status.contains("GOOGLE_CREDENTIALS_JSON"));
    assert!(!outcome.status.contains("not found. Please check the link"));
}

#[test]
fn unknown_spreadsheet_and_api_failures_are_distinguished() {
    let (service, _) = fake(Book::default());
    let request = csv_request(Destination::RemoteSheet, "https://example.com/nothing");
    let not_found = sync::run(&request, move || Ok(service), &mut Silent);

    let (service, _) = fake(Book {
        fail_append: true,
        ..Book::default()
    });
    let request = csv_request(Destination::RemoteSheet, LOCATOR);
    let denied = sync::run(&request, move || Ok(service), &mut Silent);

    assert!(!not_found.success);
    assert!(not_found.status.contains("Google Sheet not found"));
    assert!(!denied.success);
    assert!(denied.status.contains("does not have permission"));
    assert_ne!(not_found.status, denied.status);
}
