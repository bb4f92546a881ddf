//! Legacy Word (97-2003) text check.
//!
//! A `.doc` file is an OLE compound document. Its text is reached through the
//! piece table: the FIB at the start of the `WordDocument` stream points at a
//! `Clx` structure inside the `0Table` or `1Table` stream, and each piece
//! descriptor in it locates a run of characters back in `WordDocument`, stored
//! either as 8-bit (compressed) or UTF-16LE text.

use crate::RejectReason;
use cfb::CompoundFile;
use std::io::{Cursor, Read};
use thiserror::Error;

const WORD_DOCUMENT_STREAM: &str = "WordDocument";
const TABLE_STREAM_0: &str = "0Table";
const TABLE_STREAM_1: &str = "1Table";

/// `wIdent` of a Word binary document.
pub(crate) const WORD_IDENT: u16 = 0xA5EC;
pub(crate) const FLAGS_OFFSET: usize = 0x000A;
/// `fWhichTblStm`: set when the table lives in `1Table`.
pub(crate) const WHICH_TABLE_FLAG: u16 = 0x0200;
pub(crate) const FC_CLX_OFFSET: usize = 0x01A2;
pub(crate) const LCB_CLX_OFFSET: usize = 0x01A6;

const CLX_PRC: u8 = 0x01;
const CLX_PCDT: u8 = 0x02;
const CP_SIZE: usize = 4;
const PCD_SIZE: usize = 8;
const FC_COMPRESSED: u32 = 0x4000_0000;
const FC_MASK: u32 = 0x3FFF_FFFF;

/// Failures reading a Word binary document.
#[derive(Error, Debug)]
pub enum WordError {
    /// Bytes are not an OLE compound document.
    #[error("Not an OLE compound document: {0}")]
    Container(std::io::Error),

    /// A required stream is absent.
    #[error("Missing '{0}' stream")]
    MissingStream(&'static str),

    /// The FIB signature does not identify a Word document.
    #[error("Unrecognized Word signature 0x{0:04X}")]
    Signature(u16),

    /// A structure points outside of its stream.
    #[error("Truncated {0}")]
    Truncated(&'static str),

    /// The piece table is malformed.
    #[error("Malformed piece table: {0}")]
    PieceTable(&'static str),
}

/// Reject the document when it cannot be read or holds no visible text.
pub fn validate(bytes: &[u8]) -> Result<(), RejectReason> {
    let text = extract_text(bytes).map_err(|e| RejectReason::UnreadableDoc(e.to_string()))?;
    if is_blank(&text) {
        Err(RejectReason::EmptyDoc)
    } else {
        Ok(())
    }
}

/// Extract the raw document text.
pub fn extract_text(bytes: &[u8]) -> Result<String, WordError> {
    let mut file = CompoundFile::open(Cursor::new(bytes)).map_err(WordError::Container)?;

    let word_document = read_stream(&mut file, WORD_DOCUMENT_STREAM)?;
    let ident = read_u16(&word_document, 0, "FIB")?;
    if ident != WORD_IDENT {
        return Err(WordError::Signature(ident));
    }

    let flags = read_u16(&word_document, FLAGS_OFFSET, "FIB")?;
    let table_name = if flags & WHICH_TABLE_FLAG != 0 {
        TABLE_STREAM_1
    } else {
        TABLE_STREAM_0
    };
    let table = read_stream(&mut file, table_name)?;

    let fc_clx = read_u32(&word_document, FC_CLX_OFFSET, "FIB")? as usize;
    let lcb_clx = read_u32(&word_document, LCB_CLX_OFFSET, "FIB")? as usize;
    let clx = slice(&table, fc_clx, lcb_clx, "Clx")?;

    let plc_pcd = find_plc_pcd(clx)?;
    decode_pieces(plc_pcd, &word_document)
}

/// Whitespace and control characters (paragraph marks, field delimiters)
/// do not count as text.
fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c.is_control())
}

fn read_stream(
    file: &mut CompoundFile<Cursor<&[u8]>>,
    name: &'static str,
) -> Result<Vec<u8>, WordError> {
    if !file.is_stream(name) {
        return Err(WordError::MissingStream(name));
    }
    let mut stream = file
        .open_stream(name)
        .map_err(|_| WordError::MissingStream(name))?;
    let mut data = Vec::new();
    stream
        .read_to_end(&mut data)
        .map_err(|_| WordError::Truncated(name))?;
    Ok(data)
}

/// Skip `Prc` entries and return the `PlcPcd` payload of the `Pcdt`.
fn find_plc_pcd(clx: &[u8]) -> Result<&[u8], WordError> {
    let mut pos = 0;
    while pos < clx.len() {
        match clx[pos] {
            CLX_PRC => {
                let cb_grpprl = read_u16(clx, pos + 1, "Clx")? as usize;
                pos += 3 + cb_grpprl;
            }
            CLX_PCDT => {
                let lcb = read_u32(clx, pos + 1, "Clx")? as usize;
                return slice(clx, pos + 5, lcb, "PlcPcd");
            }
            _ => return Err(WordError::PieceTable("unexpected Clx entry")),
        }
    }
    Err(WordError::PieceTable("no piece descriptors"))
}

fn decode_pieces(plc_pcd: &[u8], word_document: &[u8]) -> Result<String, WordError> {
    if plc_pcd.len() < CP_SIZE || (plc_pcd.len() - CP_SIZE) % (CP_SIZE + PCD_SIZE) != 0 {
        return Err(WordError::PieceTable("unexpected length"));
    }
    let count = (plc_pcd.len() - CP_SIZE) / (CP_SIZE + PCD_SIZE);
    let descriptors = &plc_pcd[(count + 1) * CP_SIZE..];

    let mut text = String::new();
    for i in 0..count {
        let start_cp = read_u32(plc_pcd, i * CP_SIZE, "PlcPcd")?;
        let end_cp = read_u32(plc_pcd, (i + 1) * CP_SIZE, "PlcPcd")?;
        let chars = end_cp
            .checked_sub(start_cp)
            .ok_or(WordError::PieceTable("character positions out of order"))?
            as usize;

        let fc = read_u32(descriptors, i * PCD_SIZE + 2, "piece descriptor")?;
        if fc & FC_COMPRESSED != 0 {
            let offset = ((fc & FC_MASK) / 2) as usize;
            let run = slice(word_document, offset, chars, "text run")?;
            text.extend(run.iter().map(|&b| char::from(b)));
        } else {
            let run = slice(word_document, fc as usize, chars * 2, "text run")?;
            let units: Vec<u16> = run
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            text.push_str(&String::from_utf16_lossy(&units));
        }
    }
    Ok(text)
}

fn slice<'a>(
    bytes: &'a [u8],
    offset: usize,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8], WordError> {
    offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or(WordError::Truncated(what))
}

fn read_u16(bytes: &[u8], offset: usize, what: &'static str) -> Result<u16, WordError> {
    let b = slice(bytes, offset, 2, what)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(bytes: &[u8], offset: usize, what: &'static str) -> Result<u32, WordError> {
    let b = slice(bytes, offset, 4, what)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}
