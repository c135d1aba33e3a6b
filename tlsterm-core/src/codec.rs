//! Length-checked primitives for the TLS presentation language.
//!
//! Readers advance a `&[u8]` cursor and fail with [`Error::DecodeError`]
//! instead of panicking when a field runs past the end of the buffer.
//! Writers append length-prefixed vectors to a [`BytesMut`].

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result};

fn short(what: &str, need: usize, have: usize) -> Error {
    Error::DecodeError(format!("{}: need {} bytes, have {}", what, need, have))
}

pub(crate) fn read_u8(buf: &mut &[u8], what: &str) -> Result<u8> {
    if buf.remaining() < 1 {
        return Err(short(what, 1, 0));
    }
    Ok(buf.get_u8())
}

pub(crate) fn read_u16(buf: &mut &[u8], what: &str) -> Result<u16> {
    if buf.remaining() < 2 {
        return Err(short(what, 2, buf.remaining()));
    }
    Ok(buf.get_u16())
}

pub(crate) fn read_u24(buf: &mut &[u8], what: &str) -> Result<usize> {
    if buf.remaining() < 3 {
        return Err(short(what, 3, buf.remaining()));
    }
    Ok(buf.get_uint(3) as usize)
}

/// Borrow the next `len` bytes.
pub(crate) fn read_bytes<'a>(buf: &mut &'a [u8], len: usize, what: &str) -> Result<&'a [u8]> {
    if buf.len() < len {
        return Err(short(what, len, buf.len()));
    }
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}

/// `opaque data<0..2^8-1>`
pub(crate) fn read_vec_u8<'a>(buf: &mut &'a [u8], what: &str) -> Result<&'a [u8]> {
    let len = read_u8(buf, what)? as usize;
    read_bytes(buf, len, what)
}

/// `opaque data<0..2^16-1>`
pub(crate) fn read_vec_u16<'a>(buf: &mut &'a [u8], what: &str) -> Result<&'a [u8]> {
    let len = read_u16(buf, what)? as usize;
    read_bytes(buf, len, what)
}

/// `opaque data<0..2^24-1>`
pub(crate) fn read_vec_u24<'a>(buf: &mut &'a [u8], what: &str) -> Result<&'a [u8]> {
    let len = read_u24(buf, what)?;
    read_bytes(buf, len, what)
}

/// Fail if a structure left unread bytes behind.
pub(crate) fn expect_end(buf: &[u8], what: &str) -> Result<()> {
    if buf.is_empty() {
        Ok(())
    } else {
        Err(Error::DecodeError(format!(
            "{}: {} trailing bytes",
            what,
            buf.len()
        )))
    }
}

pub(crate) fn put_u24(buf: &mut BytesMut, value: usize) -> Result<()> {
    if value > 0xFF_FFFF {
        return Err(Error::InternalError(format!(
            "length {} does not fit in 24 bits",
            value
        )));
    }
    buf.put_uint(value as u64, 3);
    Ok(())
}

pub(crate) fn put_vec_u8(buf: &mut BytesMut, data: &[u8]) -> Result<()> {
    let len = u8::try_from(data.len())
        .map_err(|_| Error::InternalError(format!("vector of {} bytes exceeds 2^8-1", data.len())))?;
    buf.put_u8(len);
    buf.put_slice(data);
    Ok(())
}

pub(crate) fn put_vec_u16(buf: &mut BytesMut, data: &[u8]) -> Result<()> {
    let len = u16::try_from(data.len()).map_err(|_| {
        Error::InternalError(format!("vector of {} bytes exceeds 2^16-1", data.len()))
    })?;
    buf.put_u16(len);
    buf.put_slice(data);
    Ok(())
}

pub(crate) fn put_vec_u24(buf: &mut BytesMut, data: &[u8]) -> Result<()> {
    put_u24(buf, data.len())?;
    buf.put_slice(data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readers_advance_cursor() {
        let data = [0x01, 0x02, 0x03, 0x00, 0x00, 0x02, 0xAA, 0xBB, 0xCC];
        let mut cursor = &data[..];

        assert_eq!(read_u8(&mut cursor, "a").unwrap(), 0x01);
        assert_eq!(read_u16(&mut cursor, "b").unwrap(), 0x0203);
        assert_eq!(read_vec_u24(&mut cursor, "c").unwrap(), &[0xAA, 0xBB]);
        assert_eq!(cursor, &[0xCC]);
        assert!(expect_end(cursor, "d").is_err());
    }

    #[test]
    fn test_short_reads_fail() {
        let mut cursor: &[u8] = &[0x05, 0x01];
        assert!(matches!(
            read_vec_u8(&mut cursor, "vec"),
            Err(Error::DecodeError(_))
        ));

        let mut cursor: &[u8] = &[0x01];
        assert!(read_u16(&mut cursor, "u16").is_err());
        let mut cursor: &[u8] = &[0x00, 0x01];
        assert!(read_u24(&mut cursor, "u24").is_err());
    }

    #[test]
    fn test_writers() {
        let mut buf = BytesMut::new();
        put_vec_u8(&mut buf, &[1]).unwrap();
        put_vec_u16(&mut buf, &[2, 3]).unwrap();
        put_vec_u24(&mut buf, &[]).unwrap();
        assert_eq!(&buf[..], &[1, 1, 0, 2, 2, 3, 0, 0, 0]);

        assert!(put_vec_u8(&mut buf, &[0u8; 256]).is_err());
        assert!(put_u24(&mut buf, 1 << 24).is_err());
    }
}
