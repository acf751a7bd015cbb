//! Page-ordered text extraction for PDF uploads.

use super::ExtractionError;
use lopdf::Document;

/// Extract the text layer of a PDF, pages ascending.
///
/// Each page contributes one fragment ending in exactly one newline, so a
/// two-page document reading "Hello" and "World" yields `"Hello\nWorld\n"`.
/// Summaries must reflect document order, which is why extraction walks the
/// page map rather than the raw object table. A document without pages yields
/// an empty string.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let document =
        Document::load_mem(bytes).map_err(|error| ExtractionError::PdfParse(error.to_string()))?;
    if document.is_encrypted() {
        return Err(ExtractionError::Encrypted);
    }

    let mut text = String::new();
    // get_pages is keyed by 1-based page number, so iteration is ascending.
    for (page_number, _page_id) in document.get_pages() {
        let fragment =
            document
                .extract_text(&[page_number])
                .map_err(|error| ExtractionError::PdfPage {
                    page: page_number,
                    message: error.to_string(),
                })?;
        text.push_str(fragment.trim_end_matches('\n'));
        text.push('\n');
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    fn pdf_with_pages(page_texts: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("serialize pdf");
        buffer
    }

    #[test]
    fn two_page_document_joins_pages_in_order() {
        let bytes = pdf_with_pages(&["Hello", "World"]);
        let text = extract_text(&bytes).expect("extracted text");
        assert_eq!(text, "Hello\nWorld\n");
    }

    #[test]
    fn pageless_document_yields_empty_text() {
        let bytes = pdf_with_pages(&[]);
        let text = extract_text(&bytes).expect("extracted text");
        assert_eq!(text, "");
    }

    #[test]
    fn malformed_bytes_are_rejected() {
        let error = extract_text(b"definitely not a pdf").expect_err("parse failure");
        assert!(matches!(error, ExtractionError::PdfParse(_)));
    }

    #[test]
    fn encrypted_documents_are_rejected() {
        let mut doc = Document::load_mem(&pdf_with_pages(&["Secret"])).expect("reload pdf");
        // lopdf only treats the document as encrypted when the trailer's
        // Encrypt entry is an indirect reference to the dictionary.
        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 1,
        });
        doc.trailer.set("Encrypt", encrypt_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("serialize pdf");

        let error = extract_text(&bytes).expect_err("encrypted rejection");
        assert!(matches!(error, ExtractionError::Encrypted));
    }

    #[test]
    fn undecodable_page_content_reports_the_failing_page() {
        let mut doc = Document::load_mem(&pdf_with_pages(&["fine"])).expect("reload pdf");
        let page_id = *doc.get_pages().get(&1).expect("page 1");
        let contents_id = doc
            .get_object(page_id)
            .and_then(|object| object.as_dict())
            .and_then(|page| page.get(b"Contents"))
            .and_then(|contents| contents.as_reference())
            .expect("contents reference");
        // A Tf operator without its font operand makes text extraction fail;
        // lopdf's content parser is lenient, so plain syntax garbage would
        // simply be skipped instead of producing an error.
        doc.objects.insert(
            contents_id,
            Object::Stream(Stream::new(dictionary! {}, b"BT Tf ET".to_vec())),
        );
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("serialize pdf");

        let error = extract_text(&bytes).expect_err("content decode failure");
        assert!(matches!(error, ExtractionError::PdfPage { page: 1, .. }));
    }
}
