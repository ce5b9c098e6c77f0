//! TDX quote protocol: request packets and response decoding.
//!
//! Everything here is pure and operates on byte slices, so the whole codec is
//! testable without a socket. Integers are little-endian throughout.
//!
//! Response frames are a 16 byte header whose last two `u16`s carry the
//! compressed and uncompressed body sizes; when they differ the body is a zlib
//! stream.

use std::io::Read;

use flate2::read::ZlibDecoder;
use thiserror::Error;

use crate::{models::bar::RawBarRow, providers::BarQuery};

pub const RESPONSE_HEADER_LEN: usize = 16;

/// Length of a `get_security_bars` request.
pub const BARS_REQUEST_LEN: usize = 38;

/// Handshake packets sent, in order, right after connecting.
pub const SETUP_PACKETS: [&[u8]; 3] = [
    &[
        0x0c, 0x02, 0x18, 0x93, 0x00, 0x01, 0x03, 0x00, 0x03, 0x00, 0x0d, 0x00, 0x01,
    ],
    &[
        0x0c, 0x02, 0x18, 0x94, 0x00, 0x01, 0x03, 0x00, 0x03, 0x00, 0x0d, 0x00, 0x02,
    ],
    &[
        0x0c, 0x03, 0x18, 0x99, 0x00, 0x01, 0x20, 0x00, 0x20, 0x00, 0xdb, 0x0f, 0xd5, 0xd0,
        0xc9, 0xcc, 0xd6, 0xa4, 0xa8, 0xaf, 0x00, 0x00, 0x00, 0x8f, 0xc2, 0x25, 0x40, 0x13,
        0x00, 0x00, 0xd5, 0x00, 0xc9, 0xcc, 0xbd, 0xf0, 0xd7, 0xea, 0x00, 0x00, 0x00, 0x02,
    ],
];

const CODE_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Truncated frame: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("Body inflated to {actual} bytes, header announced {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Failed to inflate response body: {0}")]
    Inflate(#[source] std::io::Error),

    #[error("Price field at byte {0} does not terminate")]
    OverlongPrice(usize),

    #[error("Invalid instrument code {0:?}, expected at most six ASCII characters")]
    InvalidCode(String),

    #[error("{name} = {value} does not fit in a request packet")]
    OutOfRange { name: &'static str, value: u32 },
}

/// Sizes announced by a response header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseHeader {
    pub zip_size: u16,
    pub unzip_size: u16,
}

impl ResponseHeader {
    pub fn parse(buf: &[u8]) -> Result<Self, ProtocolError> {
        let mut cur = Cursor::new(buf);
        cur.take(12)?;
        Ok(Self {
            zip_size: cur.u16()?,
            unzip_size: cur.u16()?,
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.zip_size != self.unzip_size
    }
}

/// Undo the optional zlib compression of a response body.
pub fn inflate_body(header: &ResponseHeader, body: Vec<u8>) -> Result<Vec<u8>, ProtocolError> {
    if !header.is_compressed() {
        return Ok(body);
    }
    let expected = usize::from(header.unzip_size);
    let mut out = Vec::with_capacity(expected);
    ZlibDecoder::new(body.as_slice())
        .read_to_end(&mut out)
        .map_err(ProtocolError::Inflate)?;
    if out.len() != expected {
        return Err(ProtocolError::LengthMismatch {
            expected,
            actual: out.len(),
        });
    }
    Ok(out)
}

/// Build a `get_security_bars` request for `count` bars, `offset` bars back.
pub fn encode_bars_request(
    query: &BarQuery,
    offset: u32,
    count: u32,
) -> Result<Vec<u8>, ProtocolError> {
    let code = query.code.as_bytes();
    if code.len() > CODE_LEN || !query.code.is_ascii() {
        return Err(ProtocolError::InvalidCode(query.code.clone()));
    }
    let start = u16::try_from(offset).map_err(|_| ProtocolError::OutOfRange {
        name: "offset",
        value: offset,
    })?;
    let count = u16::try_from(count).map_err(|_| ProtocolError::OutOfRange {
        name: "count",
        value: count,
    })?;

    let mut packet = Vec::with_capacity(BARS_REQUEST_LEN);
    packet.extend_from_slice(&0x010c_u16.to_le_bytes());
    packet.extend_from_slice(&0x0101_6408_u32.to_le_bytes());
    packet.extend_from_slice(&0x1c_u16.to_le_bytes());
    packet.extend_from_slice(&0x1c_u16.to_le_bytes());
    packet.extend_from_slice(&0x052d_u16.to_le_bytes());
    packet.extend_from_slice(&query.market.to_le_bytes());
    packet.extend_from_slice(code);
    packet.resize(packet.len() + CODE_LEN - code.len(), 0);
    packet.extend_from_slice(&query.category.to_le_bytes());
    packet.extend_from_slice(&1_u16.to_le_bytes());
    packet.extend_from_slice(&start.to_le_bytes());
    packet.extend_from_slice(&count.to_le_bytes());
    packet.extend_from_slice(&[0; 10]);
    Ok(packet)
}

/// Decode a `get_security_bars` response body into rows, oldest first.
///
/// Prices are deltas in thousandths chained across rows. Timestamps are
/// rendered as `YYYY-MM-DD HH:MM` text without validation; an impossible date
/// simply fails to parse later and the row is skipped.
pub fn decode_bars(body: &[u8], category: u16) -> Result<Vec<RawBarRow>, ProtocolError> {
    let mut cur = Cursor::new(body);
    let count = cur.u16()?;
    let mut rows = Vec::with_capacity(usize::from(count));
    let mut base = 0_i64;

    for _ in 0..count {
        let datetime = decode_datetime(&mut cur, category)?;
        let open_diff = cur.price()?;
        let close_diff = cur.price()?;
        let high_diff = cur.price()?;
        let low_diff = cur.price()?;
        let volume = decode_volume(cur.u32()?);
        let amount = decode_volume(cur.u32()?);

        let open = open_diff + base;
        rows.push(RawBarRow {
            datetime,
            open: Some(thousandths(open)),
            high: Some(thousandths(open + high_diff)),
            low: Some(thousandths(open + low_diff)),
            close: Some(thousandths(open + close_diff)),
            volume,
            turnover: Some(amount),
            open_interest: None,
        });
        base = open + close_diff;
    }
    Ok(rows)
}

fn thousandths(value: i64) -> f64 {
    value as f64 / 1000.0
}

/// Intraday categories pack the date into 16 bits next to minutes-of-day;
/// daily and coarser carry a plain `YYYYMMDD` and close at 15:00.
fn decode_datetime(cur: &mut Cursor<'_>, category: u16) -> Result<String, ProtocolError> {
    let (year, month, day, hour, minute) = if category < 4 || category == 7 || category == 8 {
        let zipday = u32::from(cur.u16()?);
        let minutes = u32::from(cur.u16()?);
        (
            (zipday >> 11) + 2004,
            (zipday % 2048) / 100,
            zipday % 2048 % 100,
            minutes / 60,
            minutes % 60,
        )
    } else {
        let ymd = cur.u32()?;
        (ymd / 10000, ymd % 10000 / 100, ymd % 100, 15, 0)
    };
    Ok(format!("{year}-{month:02}-{day:02} {hour:02}:{minute:02}"))
}

/// The vendor's packed float used for volume and amount.
///
/// The top byte is a binary exponent, the remaining three bytes mantissa
/// chunks with individually shifted weights. Negative exponents on the second
/// byte invert the scale instead of shrinking it; vendor values depend on that.
pub fn decode_volume(raw: u32) -> f64 {
    let logpoint = (raw >> 24) as i32;
    let b2 = (raw >> 16) & 0xff;
    let b1 = (raw >> 8) & 0xff;
    let b0 = raw & 0xff;

    let e_ecx = logpoint * 2 - 0x7f;
    let e_edx = logpoint * 2 - 0x86;
    let e_esi = logpoint * 2 - 0x8e;
    let e_eax = logpoint * 2 - 0x96;

    let mut head = 2f64.powi(e_ecx.abs());
    if e_ecx < 0 {
        head = 1.0 / head;
    }

    let second = if b2 > 0x80 {
        2f64.powi(e_edx) * 128.0 + f64::from(b2 & 0x7f) * 2f64.powi(e_edx + 1)
    } else if e_edx >= 0 {
        2f64.powi(e_edx) * f64::from(b2)
    } else {
        (1.0 / 2f64.powi(e_edx)) * f64::from(b2)
    };

    let mut third = 2f64.powi(e_esi) * f64::from(b1);
    let mut fourth = 2f64.powi(e_eax) * f64::from(b0);
    if b2 & 0x80 != 0 {
        third *= 2.0;
        fourth *= 2.0;
    }

    head + second + third + fourth
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        let end = self.pos + n;
        let bytes = self.buf.get(self.pos..end).ok_or(ProtocolError::Truncated {
            needed: end,
            available: self.buf.len(),
        })?;
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ProtocolError> {
        let mut b = [0; 2];
        b.copy_from_slice(self.take(2)?);
        Ok(u16::from_le_bytes(b))
    }

    fn u32(&mut self) -> Result<u32, ProtocolError> {
        let mut b = [0; 4];
        b.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(b))
    }

    /// Signed varint: 6 value bits, a sign bit and a continuation bit in the
    /// first byte, then 7 value bits per byte.
    fn price(&mut self) -> Result<i64, ProtocolError> {
        let at = self.pos;
        let first = self.u8()?;
        let negative = first & 0x40 != 0;
        let mut value = i64::from(first & 0x3f);
        let mut more = first & 0x80 != 0;
        let mut shift = 6;
        while more {
            if shift > 55 {
                return Err(ProtocolError::OverlongPrice(at));
            }
            let b = self.u8()?;
            value += i64::from(b & 0x7f) << shift;
            shift += 7;
            more = b & 0x80 != 0;
        }
        Ok(if negative { -value } else { value })
    }
}
