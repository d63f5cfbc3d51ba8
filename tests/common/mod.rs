//! In-memory template builder shared by the integration tests.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use pdftemplate::parser::PdfBackend;
use pdftemplate::{BBox, LopdfBackend, Span, TextBlockExtractor};

pub const A4: (f32, f32) = (595.0, 842.0);

/// One line of template text: text, x, baseline (PDF space), font size.
pub struct Line<'a> {
    pub text: &'a str,
    pub x: f32,
    pub baseline: f32,
    pub size: f32,
}

pub fn line(text: &str, x: f32, baseline: f32, size: f32) -> Line<'_> {
    Line {
        text,
        x,
        baseline,
        size,
    }
}

/// Baseline that puts the top of a `size` run at page-space `top`.
pub fn baseline_for_top(page_height: f32, top: f32, size: f32) -> f32 {
    page_height - (top + 0.8 * size)
}

/// A single-page PDF drawing each line in Helvetica.
///
/// The MediaBox lives on the page tree node so page geometry is inherited.
pub fn build_pdf(page: (f32, f32), lines: &[Line]) -> Vec<u8> {
    build_multi_page_pdf(page, &[lines])
}

pub fn build_multi_page_pdf(page: (f32, f32), pages: &[&[Line]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for l in lines.iter() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), l.size.into()]));
            operations.push(Operation::new("Td", vec![l.x.into(), l.baseline.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(l.text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![0.into(), 0.into(), page.0.into(), page.1.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Append a non-stream entry to a page's content array so the page's
/// content can no longer be read.
pub fn break_page(pdf: &[u8], page: u32) -> Vec<u8> {
    let mut doc = Document::load_mem(pdf).unwrap();
    let page_id = doc.get_pages()[&page];
    let dict = doc.get_dictionary_mut(page_id).unwrap();
    let original = dict.get(b"Contents").unwrap().clone();
    dict.set("Contents", vec![original, Object::Integer(0)]);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// All spans of a page of a PDF held in memory.
pub fn spans(pdf: &[u8], page: u32) -> Vec<Span> {
    let backend = LopdfBackend::load_bytes(pdf).unwrap();
    TextBlockExtractor::new(&backend)
        .extract_page(page)
        .unwrap()
        .spans
}

/// Text of the spans whose center lies inside `region`, joined by spaces.
pub fn text_in(pdf: &[u8], page: u32, region: BBox) -> String {
    spans(pdf, page)
        .iter()
        .filter(|s| {
            let (cx, cy) = s.bbox.center();
            region.contains_point(cx, cy, 1.0)
        })
        .map(|s| s.text.clone())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Page count of a PDF held in memory.
pub fn page_count(pdf: &[u8]) -> usize {
    LopdfBackend::load_bytes(pdf).unwrap().pages().len()
}
