use bytes::Buf;
#[cfg(feature = "debug")]
use thiserror::Error;

macro_rules! try_def {
    ($meth:ident, $ty:ty) => {
        fn $meth(&mut self) -> Result<$ty, TryBufError>;
    };
}

macro_rules! try_impl {
    ($meth:ident, $inner:ident, $ty:ty, $len:literal) => {
        fn $meth(&mut self) -> Result<$ty, TryBufError> {
            if self.remaining() < $len {
                Err(TryBufError::InvalidLength {
                    remaining: self.remaining(),
                    required: $len,
                })
            } else {
                Ok(self.$inner())
            }
        }
    };
}

#[cfg_attr(feature = "debug", derive(Error))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TryBufError {
    #[cfg_attr(
        feature = "debug",
        error("invalid read length, remaining: {remaining}, required: {required}")
    )]
    InvalidLength { remaining: usize, required: usize },

    #[cfg_attr(feature = "debug", error("unexpected status byte {status:#04x}"))]
    UnexpectedStatus { status: u8 },
}

pub trait TryBuf {
    try_def!(try_read_u8, u8);

    /// Reads a MIDI data byte, failing if its high bit is set
    fn try_get_data(&mut self) -> Result<u8, TryBufError>;
}

impl<T> TryBuf for T
where
    T: Buf,
{
    try_impl!(try_read_u8, get_u8, u8, 1);

    fn try_get_data(&mut self) -> Result<u8, TryBufError> {
        let byte = self.try_read_u8()?;
        if byte & 0x80 != 0 {
            Err(TryBufError::UnexpectedStatus { status: byte })
        } else {
            Ok(byte)
        }
    }
}

#[cfg(test)]
mod test {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn data_bytes() {
        let mut b = Bytes::from_static(&[0x12, 0x90]);
        assert_eq!(b.try_get_data(), Ok(0x12));
        assert_eq!(
            b.try_get_data(),
            Err(TryBufError::UnexpectedStatus { status: 0x90 })
        );
        assert_eq!(
            b.try_read_u8(),
            Err(TryBufError::InvalidLength {
                remaining: 0,
                required: 1
            })
        );
    }
}
