//! A bounds checked, seekable reader with a switchable byte order.

use std::io::{Read, Seek, SeekFrom};

use binrw::{BinRead, Endian};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::{
    error::{Error, Result},
    types::Record,
};

/// Reader over a source of known length.
///
/// Every read checks that the requested span fits inside the source before touching it, so a
/// truncated file fails with [`Error::OutOfBounds`] instead of returning short or zeroed data.
/// Multi-byte reads use the byte order active at the time of the call, which may be changed
/// at any point with [`ByteCursor::set_endian`].
#[derive(Debug)]
pub struct ByteCursor<R> {
    inner: R,
    length: u64,
    position: u64,
    endian: Endian,
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wrap a reader, measuring its length and rewinding it to the start.
    ///
    /// The cursor starts out big-endian.
    pub fn new(mut inner: R) -> Result<Self> {
        let length = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;

        Ok(Self {
            inner,
            length,
            position: 0,
            endian: Endian::Big,
        })
    }

    /// Total length of the source
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Current position in the source
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes left between the current position and the end
    pub fn remaining(&self) -> u64 {
        self.length - self.position
    }

    /// Byte order used by multi-byte reads
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Change the byte order used by all subsequent reads
    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// Move to an absolute position. Positions past the end are rejected.
    pub fn seek(&mut self, position: u64) -> Result<()> {
        if position > self.length {
            return Err(Error::OutOfBounds {
                offset: position,
                requested: 0,
                length: self.length,
            });
        }

        self.inner.seek(SeekFrom::Start(position))?;
        self.position = position;
        Ok(())
    }

    /// Move forward by `delta` bytes
    pub fn advance(&mut self, delta: u64) -> Result<()> {
        let target = self.position.checked_add(delta).ok_or(Error::OutOfBounds {
            offset: self.position,
            requested: delta,
            length: self.length,
        })?;
        self.seek(target)
    }

    fn ensure(&self, requested: u64) -> Result<()> {
        let fits = self.position < self.length
            && self
                .position
                .checked_add(requested)
                .is_some_and(|end| end <= self.length);

        if fits {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                offset: self.position,
                requested,
                length: self.length,
            })
        }
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let value = self.inner.read_u8()?;
        self.position += 1;
        Ok(value)
    }

    /// Read a 16-bit word
    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        let value = match self.endian {
            Endian::Big => self.inner.read_u16::<BigEndian>()?,
            Endian::Little => self.inner.read_u16::<LittleEndian>()?,
        };
        self.position += 2;
        Ok(value)
    }

    /// Read a signed 16-bit word
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_u16().map(|v| v as i16)
    }

    /// Read a 32-bit double word
    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        let value = match self.endian {
            Endian::Big => self.inner.read_u32::<BigEndian>()?,
            Endian::Little => self.inner.read_u32::<LittleEndian>()?,
        };
        self.position += 4;
        Ok(value)
    }

    /// Read `count` bytes into a new buffer
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.ensure(count as u64)?;
        let mut buffer = vec![0u8; count];
        self.inner.read_exact(&mut buffer)?;
        self.position += count as u64;
        Ok(buffer)
    }

    /// Read a fixed-size on-disk record using the current byte order
    pub(crate) fn read_record<T>(&mut self) -> Result<T>
    where
        T: Record + for<'a> BinRead<Args<'a> = ()>,
    {
        self.ensure(T::SIZE)?;
        let value = T::read_options(&mut self.inner, self.endian, ())?;
        self.position += T::SIZE;
        Ok(value)
    }

    /// Run `f` with the cursor moved to `position`, then move back.
    ///
    /// The original position is restored whether or not `f` succeeds.
    pub fn peek_at<T>(
        &mut self,
        position: u64,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = self.position;
        self.seek(position)?;
        let result = f(self);
        let restored = self.seek(saved);
        let value = result?;
        restored?;
        Ok(value)
    }

    /// Read `count` bytes at `position` without moving the cursor
    pub fn read_at(&mut self, position: u64, count: usize) -> Result<Vec<u8>> {
        self.peek_at(position, |c| c.read_bytes(count))
    }

    /// Unwrap and return the inner reader object
    ///
    /// The position of the reader is undefined.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
