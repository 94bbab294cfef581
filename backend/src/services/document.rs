//! Order document rendering (invoices, receipts, quotations)
//!
//! Renders a booking or quotation snapshot into a single-page PDF and
//! stores it under the configured artifact directory. The filename is
//! the sanitized customer name joined with the document id, so a
//! re-render for the same document overwrites the previous artifact.
//! Callers regenerate on demand rather than trusting stored files to
//! still exist.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

use shared::models::{CustomerProfile, ExtraCharges, LineItem};
use shared::validation::sanitize_customer_name;

use crate::error::{AppError, AppResult};

/// Which artifact is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Invoice,
    Receipt,
    Quotation,
}

impl DocumentKind {
    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "INVOICE",
            DocumentKind::Receipt => "RECEIPT",
            DocumentKind::Quotation => "QUOTATION / ESTIMATE",
        }
    }
}

/// Everything a document render needs, snapshotted by the caller.
#[derive(Debug, Clone)]
pub struct OrderDocument {
    /// Order, receipt, or estimate id printed on the document.
    pub doc_no: String,
    pub customer: CustomerProfile,
    pub items: Vec<LineItem>,
    pub extra_charges: ExtraCharges,
    pub total: Decimal,
    pub amount_paid: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// A rendered artifact, both persisted and in-memory.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Filename relative to the artifact directory; this is what the
    /// ledgers store in their `pdf` columns.
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Document renderer and artifact store
#[derive(Clone)]
pub struct DocumentService {
    dir: PathBuf,
}

impl DocumentService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Artifact filename for a document: sanitized customer name plus
    /// the document id.
    pub fn filename(customer_name: &str, doc_no: &str) -> String {
        let slug = sanitize_customer_name(customer_name);
        if slug.is_empty() {
            format!("{}.pdf", doc_no)
        } else {
            format!("{}-{}.pdf", slug, doc_no)
        }
    }

    /// Render a document and write it under the artifact directory.
    pub async fn render_and_store(
        &self,
        kind: DocumentKind,
        doc: &OrderDocument,
    ) -> AppResult<StoredDocument> {
        let bytes = render_pdf(kind, doc);
        let filename = Self::filename(&doc.customer.customer_name, &doc.doc_no);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::DocumentError(format!("artifact dir: {}", e)))?;
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::DocumentError(format!("write {}: {}", path.display(), e)))?;

        tracing::debug!("Rendered {:?} artifact {}", kind, filename);
        Ok(StoredDocument { filename, bytes })
    }

    /// Whether a previously stored artifact still exists on disk.
    pub async fn exists(&self, filename: &str) -> bool {
        // Stored references are bare filenames; ignore anything that
        // tries to traverse.
        if Path::new(filename).components().count() != 1 {
            return false;
        }
        tokio::fs::try_exists(self.dir.join(filename))
            .await
            .unwrap_or(false)
    }

    pub async fn load(&self, filename: &str) -> AppResult<Vec<u8>> {
        let path = self.dir.join(filename);
        tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::DocumentError(format!("read {}: {}", path.display(), e)))
    }
}

// ============================================================================
// PDF rendering
// ============================================================================

struct TextLine {
    size: u8,
    text: String,
}

fn line(size: u8, text: impl Into<String>) -> TextLine {
    TextLine {
        size,
        text: text.into(),
    }
}

/// Lay the document out as a flat list of text lines and build a
/// one-page PDF from them. Visual design is out of scope; the artifact
/// only has to be a well-formed PDF carrying the order facts.
fn render_pdf(kind: DocumentKind, doc: &OrderDocument) -> Vec<u8> {
    let mut lines = Vec::new();
    lines.push(line(16, kind.title()));
    lines.push(line(10, format!("No: {}", doc.doc_no)));
    lines.push(line(
        10,
        format!("Date: {}", doc.created_at.format("%d-%m-%Y %H:%M UTC")),
    ));
    lines.push(line(10, ""));
    lines.push(line(12, "Billed To"));
    lines.push(line(10, doc.customer.customer_name.clone()));
    lines.push(line(10, doc.customer.address.clone()));
    lines.push(line(
        10,
        format!("{}, {}", doc.customer.district, doc.customer.state),
    ));
    lines.push(line(10, format!("Mobile: {}", doc.customer.mobile_number)));
    lines.push(line(10, format!("Email: {}", doc.customer.email)));
    lines.push(line(10, ""));
    lines.push(line(12, "Items"));
    for item in &doc.items {
        lines.push(line(
            10,
            format!(
                "{} x{} @ {} (disc {}%) = {}",
                item.productname,
                item.quantity,
                item.price,
                item.discount,
                item.line_total()
            ),
        ));
        if kind == DocumentKind::Receipt && item.dispatched > 0 {
            lines.push(line(10, format!("    dispatched: {}", item.dispatched)));
        }
    }
    lines.push(line(10, ""));
    let charges = &doc.extra_charges;
    if charges.tax != Decimal::ZERO {
        lines.push(line(10, format!("Tax: {}", charges.tax)));
    }
    if charges.packing_fee != Decimal::ZERO {
        lines.push(line(10, format!("Packing: {}", charges.packing_fee)));
    }
    if charges.deduction != Decimal::ZERO {
        lines.push(line(10, format!("Deduction: -{}", charges.deduction)));
    }
    lines.push(line(12, format!("Total: {}", doc.total)));
    if let Some(paid) = doc.amount_paid {
        lines.push(line(10, format!("Amount Paid: {}", paid)));
        lines.push(line(10, format!("Balance: {}", doc.total - paid)));
    }

    build_pdf(&lines)
}

/// Escape a string for a PDF literal string object.
fn escape_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            c if c.is_ascii_graphic() || c == ' ' => out.push(c),
            // Non-ASCII falls outside the base font encoding.
            _ => out.push('?'),
        }
    }
    out
}

/// Assemble a minimal single-page PDF (A4, Helvetica) from text lines.
fn build_pdf(lines: &[TextLine]) -> Vec<u8> {
    let mut content = String::new();
    let mut y = 800f32;
    for l in lines {
        y -= l.size as f32 + 6.0;
        if y < 40.0 {
            break;
        }
        content.push_str(&format!(
            "BT /F1 {} Tf 50 {:.0} Td ({}) Tj ET\n",
            l.size,
            y,
            escape_pdf_text(&l.text)
        ));
    }

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }
    let xref_start = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    pdf.push_str("0000000000 65535 f \n");
    for offset in offsets {
        pdf.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_start
    ));

    pdf.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::ProductType;

    fn sample_doc() -> OrderDocument {
        OrderDocument {
            doc_no: "ORD-1751548161837".to_string(),
            customer: CustomerProfile {
                customer_name: "Ravi Kumar & Co".to_string(),
                address: "12 Bazaar St".to_string(),
                district: "Sivakasi".to_string(),
                state: "Tamil Nadu".to_string(),
                mobile_number: "9876543210".to_string(),
                email: "ravi@example.com".to_string(),
            },
            items: vec![LineItem {
                id: 1,
                product_type: ProductType::Crackers,
                productname: "Flower Pots (Big)".to_string(),
                price: Decimal::from(100),
                discount: Decimal::from(10),
                quantity: 2,
                dispatched: 0,
            }],
            extra_charges: ExtraCharges::default(),
            total: Decimal::from(180),
            amount_paid: Some(Decimal::from(50)),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn renders_well_formed_pdf() {
        let bytes = render_pdf(DocumentKind::Invoice, &sample_doc());
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("INVOICE"));
        assert!(text.contains("ORD-1751548161837"));
        assert!(text.contains("Total: 180"));
    }

    #[test]
    fn escapes_literal_string_metacharacters() {
        assert_eq!(escape_pdf_text("a(b)c\\d"), "a\\(b\\)c\\\\d");
        assert_eq!(escape_pdf_text("твой"), "????");
    }

    #[test]
    fn filename_joins_slug_and_doc_no() {
        assert_eq!(
            DocumentService::filename("Ravi Kumar & Co", "ORD-1751548161837"),
            "ravi_kumar_co-ORD-1751548161837.pdf"
        );
        assert_eq!(DocumentService::filename("---", "EST-9"), "EST-9.pdf");
    }
}
