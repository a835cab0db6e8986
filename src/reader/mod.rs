use crate::error::{DissectError, Result};

/// 境界チェック付きのバイトカーソル。全パーサはこの型を経由して読み取る。
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// カーソルを移動する。バッファ長を超える値は末尾に丸められる。
    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.data.len());
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    pub fn advance(&mut self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(DissectError::Truncated {
                needed: n,
                available: self.remaining(),
            });
        }
        self.position += n;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// 読み取りに成功した場合のみカーソルが進む。
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(DissectError::Truncated {
                needed: n,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.position..self.position + n];
        self.position += n;
        Ok(bytes)
    }

    /// 停止条件に一致するバイトの直前までをトークンとして返す。
    /// 停止バイトが存在した場合はそれも読み飛ばす。戻り値は (トークン, 消費バイト数)。
    pub fn read_until(&mut self, stop: impl Fn(u8) -> bool) -> (&'a [u8], usize) {
        let start = self.position;
        while let Some(byte) = self.peek() {
            if stop(byte) {
                break;
            }
            self.position += 1;
        }
        let token = &self.data[start..self.position];
        if self.position < self.data.len() {
            self.position += 1;
        }
        (token, self.position - start)
    }

    /// CRLF の直前までを行として返し、CRLF を読み飛ばす。
    /// CRLF が見つからない場合はカーソルを動かさずに Truncated を返す。
    pub fn read_line(&mut self) -> Result<&'a [u8]> {
        let start = self.position;
        let mut index = self.position;

        while index + 1 < self.data.len() {
            if self.data[index] == b'\r' && self.data[index + 1] == b'\n' {
                let line = &self.data[start..index];
                self.position = index + 2;
                return Ok(line);
            }
            index += 1;
        }

        Err(DissectError::Truncated {
            needed: 2,
            available: 0,
        })
    }

    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.position..]
    }
}
