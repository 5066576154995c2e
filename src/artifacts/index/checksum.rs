use crate::artifacts::index::CHECKSUM_SIZE;
use anyhow::anyhow;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::io::{Read, Write};

/// Stream wrapper that hashes everything read from or written to it
///
/// The index file ends with the SHA-256 of all preceding bytes; `verify` compares
/// the trailer with the running digest after the body has been read.
#[derive(Debug)]
pub struct Checksum<T> {
    stream: T,
    digest: Sha256,
}

impl<T> Checksum<T> {
    pub(crate) fn new(stream: T) -> Self {
        Checksum {
            stream,
            digest: Sha256::new(),
        }
    }

    pub(crate) fn into_inner(self) -> T {
        self.stream
    }
}

impl<T: Read> Checksum<T> {
    pub(crate) fn read(&mut self, size: usize) -> anyhow::Result<Bytes> {
        let mut buffer = vec![0; size];
        self.stream
            .read_exact(&mut buffer)
            .map_err(|_| anyhow!("Unexpected end-of-file while reading index"))?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    pub(crate) fn verify(&mut self) -> anyhow::Result<()> {
        let mut expected_checksum = [0u8; CHECKSUM_SIZE];
        self.stream
            .read_exact(&mut expected_checksum)
            .map_err(|_| anyhow!("Index checksum is missing"))?;

        let actual_checksum = self.digest.clone().finalize();
        if expected_checksum != actual_checksum.as_slice() {
            return Err(anyhow!("Checksum does not match value stored on disk"));
        }

        let mut trailing = [0u8; 1];
        if self.stream.read(&mut trailing)? != 0 {
            return Err(anyhow!("Unexpected data after index checksum"));
        }

        Ok(())
    }
}

impl<T: Write> Checksum<T> {
    pub(crate) fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.stream.write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    pub(crate) fn write_checksum(&mut self) -> anyhow::Result<()> {
        let checksum = self.digest.clone().finalize();
        self.stream
            .write_all(checksum.as_slice())
            .map_err(|_| anyhow!("Failed to write checksum to index file"))?;

        Ok(())
    }
}
