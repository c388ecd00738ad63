//! # Bill PDF
//!
//! Typesets a rendered bill onto a single receipt-width PDF page.
//!
//! ```text
//! BillDocument::render()  ──►  48-column lines  ──►  bill_pdf()  ──►  %PDF bytes
//!                                                    80 mm page, Courier 7 pt,
//!                                                    one text row per line
//! ```
//!
//! The page height follows the number of lines. Document dates and the
//! document id come from the bill, so two saves of the same content differ
//! only in the instance id that `printpdf` draws for the trailer `/ID`.

use printpdf::{BuiltinFont, CustomPdfConformance, Mm, PdfConformance, PdfDocument};
use time::OffsetDateTime;
use till_core::{Bill, StoreError};

/// 80 mm thermal roll.
const PAGE_WIDTH_MM: f32 = 80.0;
const MARGIN_MM: f32 = 4.0;
const FONT_SIZE_PT: f32 = 7.0;
const LINE_HEIGHT_MM: f32 = 3.2;

/// Lays `content` out line by line and returns the PDF file bytes.
pub fn bill_pdf(bill: &Bill, content: &str) -> Result<Vec<u8>, StoreError> {
    let lines: Vec<&str> = content.lines().collect();
    let height = MARGIN_MM * 2.0 + LINE_HEIGHT_MM * lines.len().max(1) as f32;
    let title = bill.bill_number();

    let stamp = OffsetDateTime::from_unix_timestamp(bill.created_at.timestamp()).map_err(pdf_error)?;
    let (doc, page, layer) = PdfDocument::new(title.as_str(), Mm(PAGE_WIDTH_MM), Mm(height), "bill");
    let doc = doc
        .with_conformance(PdfConformance::Custom(CustomPdfConformance {
            requires_icc_profile: false,
            requires_xmp_metadata: false,
            ..Default::default()
        }))
        .with_document_id(title.clone())
        .with_creation_date(stamp)
        .with_mod_date(stamp);

    let font = doc.add_builtin_font(BuiltinFont::Courier).map_err(pdf_error)?;
    let canvas = doc.get_page(page).get_layer(layer);
    for (row, line) in lines.iter().enumerate() {
        let y = height - MARGIN_MM - LINE_HEIGHT_MM * (row as f32 + 1.0);
        canvas.use_text(*line, FONT_SIZE_PT, Mm(MARGIN_MM), Mm(y), &font);
    }

    doc.save_to_bytes().map_err(pdf_error)
}

fn pdf_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::Artifact(format!("pdf: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use till_core::{BillDocument, BillLine, Money, PaymentMethod, ShopInfo};

    fn bill() -> Bill {
        Bill {
            bill_id: 12,
            created_at: Utc.with_ymd_and_hms(2024, 3, 15, 18, 5, 0).unwrap(),
            payment_method: PaymentMethod::Upi,
            operator: "anu".to_string(),
            total: Money::from_cents(4500),
            lines: vec![
                BillLine {
                    bill_id: 12,
                    line_no: 1,
                    item_code: "SHIRT01".to_string(),
                    name: "Linen Shirt".to_string(),
                    quantity: 2,
                    unit_price: Money::from_cents(1000),
                    line_total: Money::from_cents(2000),
                },
                BillLine {
                    bill_id: 12,
                    line_no: 2,
                    item_code: "CAP01".to_string(),
                    name: "Cap".to_string(),
                    quantity: 1,
                    unit_price: Money::from_cents(2500),
                    line_total: Money::from_cents(2500),
                },
            ],
        }
    }

    /// Drops the trailer `/ID [...]` pair, which differs on every save.
    fn without_file_id(pdf: &[u8]) -> Vec<u8> {
        let Some(start) = pdf.windows(3).position(|w| w == b"/ID") else {
            return pdf.to_vec();
        };
        let end = pdf[start..]
            .iter()
            .position(|&b| b == b']')
            .map_or(pdf.len(), |i| start + i + 1);
        [&pdf[..start], &pdf[end..]].concat()
    }

    #[test]
    fn test_produces_pdf() {
        let bill = bill();
        let content = BillDocument::new(&bill, &ShopInfo::default()).render();

        let pdf = bill_pdf(&bill, &content).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        assert!(pdf.len() > 500);
    }

    #[test]
    fn test_same_bill_same_document() {
        let bill = bill();
        let shop = ShopInfo::default();
        let first = bill_pdf(&bill, &BillDocument::new(&bill, &shop).render()).unwrap();
        let second = bill_pdf(&bill, &BillDocument::new(&bill, &shop).render()).unwrap();

        assert_eq!(without_file_id(&first), without_file_id(&second));
    }

    #[test]
    fn test_content_changes_document() {
        let bill = bill();
        let shop = ShopInfo::default();
        let original = bill_pdf(&bill, &BillDocument::new(&bill, &shop).render()).unwrap();
        let reprint = bill_pdf(&bill, &BillDocument::new(&bill, &shop).reprint(true).render()).unwrap();

        assert_ne!(without_file_id(&original), without_file_id(&reprint));
    }
}
