//! Fixture builders for well-formed and malformed documents.
//!
//! Available to this crate's unit tests and, through the `test-utils`
//! feature, to integration tests elsewhere in the workspace.

#![allow(missing_docs)]

use crate::doc::{FC_CLX_OFFSET, FLAGS_OFFSET, LCB_CLX_OFFSET, WHICH_TABLE_FLAG, WORD_IDENT};
use crate::docx::REQUIRED_PARTS;
use crate::{ByteValidator, FormatValidator, RejectReason, ValidationOutcome};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Build a zip archive containing `parts`, each with a small XML body.
pub fn docx_with_parts(parts: &[&str]) -> Vec<u8> {
    build_zip(parts, None)
}

/// A docx archive with the content-types part and every required part.
pub fn valid_docx() -> Vec<u8> {
    let mut parts = vec!["[Content_Types].xml"];
    parts.extend_from_slice(REQUIRED_PARTS);
    docx_with_parts(&parts)
}

/// A structurally valid docx padded with an uncompressed media entry so the
/// archive is at least `min_len` bytes long.
pub fn oversized_docx(min_len: usize) -> Vec<u8> {
    let mut parts = vec!["[Content_Types].xml"];
    parts.extend_from_slice(REQUIRED_PARTS);
    build_zip(&parts, Some(min_len))
}

fn build_zip(parts: &[&str], padding: Option<usize>) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for part in parts {
        writer.start_file(*part, options).expect("start zip entry");
        writer
            .write_all(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><root/>")
            .expect("write zip entry");
    }

    if let Some(len) = padding {
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer
            .start_file("word/media/padding.bin", stored)
            .expect("start padding entry");
        writer.write_all(&vec![0u8; len]).expect("write padding");
    }

    writer.finish().expect("finish zip").into_inner()
}

/// A one-page PDF produced by the same library that validates it.
pub fn minimal_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let content = Stream::new(dictionary! {}, b"BT 72 712 Td (Jane Doe) Tj ET".to_vec());
    let content_id = doc.add_object(content);

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize pdf");
    bytes
}

/// Offset of the text run inside the generated `WordDocument` stream.
const TEXT_OFFSET: usize = 0x400;

/// A Word 97 binary document whose single piece holds `text` as UTF-16LE.
pub fn word97_doc(text: &str) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().collect();

    let mut word_document = vec![0u8; TEXT_OFFSET];
    word_document[0..2].copy_from_slice(&WORD_IDENT.to_le_bytes());
    word_document[FLAGS_OFFSET..FLAGS_OFFSET + 2].copy_from_slice(&WHICH_TABLE_FLAG.to_le_bytes());
    for unit in &units {
        word_document.extend_from_slice(&unit.to_le_bytes());
    }

    // Clx = Pcdt { PlcPcd { cp[0], cp[1], Pcd } }
    let mut plc_pcd = Vec::new();
    plc_pcd.extend_from_slice(&0u32.to_le_bytes());
    plc_pcd.extend_from_slice(&(units.len() as u32).to_le_bytes());
    plc_pcd.extend_from_slice(&0u16.to_le_bytes());
    plc_pcd.extend_from_slice(&(TEXT_OFFSET as u32).to_le_bytes());
    plc_pcd.extend_from_slice(&0u16.to_le_bytes());

    let mut table = vec![0x02];
    table.extend_from_slice(&(plc_pcd.len() as u32).to_le_bytes());
    table.extend_from_slice(&plc_pcd);

    word_document[FC_CLX_OFFSET..FC_CLX_OFFSET + 4].copy_from_slice(&0u32.to_le_bytes());
    word_document[LCB_CLX_OFFSET..LCB_CLX_OFFSET + 4]
        .copy_from_slice(&(table.len() as u32).to_le_bytes());

    let mut file = cfb::CompoundFile::create(Cursor::new(Vec::new())).expect("create cfb");
    {
        let mut stream = file.create_stream("WordDocument").expect("create stream");
        stream.write_all(&word_document).expect("write WordDocument");
    }
    {
        let mut stream = file.create_stream("1Table").expect("create stream");
        stream.write_all(&table).expect("write 1Table");
    }
    file.flush().expect("flush cfb");
    file.into_inner().into_inner()
}

/// Accepts everything, after sleeping on the blocking thread.
#[derive(Debug, Clone, Copy)]
pub struct StalledValidator(pub std::time::Duration);

impl ByteValidator for StalledValidator {
    fn check_size(&self, size: u64) -> Result<(), RejectReason> {
        FormatValidator::new().check_size(size)
    }

    fn validate(&self, _extension: &str, _bytes: &[u8]) -> ValidationOutcome {
        std::thread::sleep(self.0);
        ValidationOutcome::Accepted
    }
}

/// Panics on every file that passes the size check.
#[derive(Debug, Clone, Copy)]
pub struct PanickingValidator;

impl ByteValidator for PanickingValidator {
    fn check_size(&self, size: u64) -> Result<(), RejectReason> {
        FormatValidator::new().check_size(size)
    }

    fn validate(&self, extension: &str, _bytes: &[u8]) -> ValidationOutcome {
        panic!("{extension} oracle blew up")
    }
}
