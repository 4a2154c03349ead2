use crate::{
    error::{Error, Result},
    types::ENDIAN_MARKER,
};
use log::debug;
use memmap::Mmap;
use rayon::prelude::*;
use std::{
    fs::File,
    io::{BufWriter, Write},
    mem::size_of,
    path::Path,
};

const WORD: usize = size_of::<i64>();

/// A read-only memory mapped file of 64-bit words opening with [`ENDIAN_MARKER`].
pub struct WordFile {
    mmap: Mmap,
    swapped: bool,
}

impl WordFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len() as usize;
        if len == 0 || len % WORD != 0 {
            return Err(Error::CorruptSnapshot(format!(
                "{}: {} bytes is not a whole number of words",
                path.as_ref().display(),
                len
            )));
        }
        // SAFETY: the mapping is read-only and dropped with `self`; files are
        // not expected to be truncated while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        let marker = i64::from_ne_bytes(word_bytes(&mmap[..WORD]));
        let swapped = if marker == ENDIAN_MARKER {
            false
        } else if marker.swap_bytes() == ENDIAN_MARKER {
            true
        } else {
            return Err(Error::CorruptSnapshot(format!(
                "{}: bad marker {:#x}",
                path.as_ref().display(),
                marker
            )));
        };
        debug!(
            "mapped {}: {} words, byte-swapped: {}",
            path.as_ref().display(),
            len / WORD,
            swapped
        );
        Ok(Self { mmap, swapped })
    }

    /// Number of words, the marker included.
    pub fn len(&self) -> usize {
        self.mmap.len() / WORD
    }

    pub fn is_swapped(&self) -> bool {
        self.swapped
    }

    pub fn word(&self, pos: usize) -> i64 {
        self.decode(&self.mmap[pos * WORD..(pos + 1) * WORD])
    }

    /// Words `pos..pos + count`, in native byte order.
    pub fn words(&self, pos: usize, count: usize) -> Vec<i64> {
        self.mmap[pos * WORD..(pos + count) * WORD]
            .par_chunks_exact(WORD)
            .map(|bytes| self.decode(bytes))
            .collect()
    }

    fn decode(&self, bytes: &[u8]) -> i64 {
        let word = i64::from_ne_bytes(word_bytes(bytes));
        if self.swapped {
            word.swap_bytes()
        } else {
            word
        }
    }
}

fn word_bytes(bytes: &[u8]) -> [u8; WORD] {
    let mut word = [0; WORD];
    word.copy_from_slice(bytes);
    word
}

/// Buffered native-order word writer; the marker is written on creation.
pub struct WordWriter {
    out: BufWriter<File>,
}

impl WordWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut writer = Self {
            out: BufWriter::new(File::create(path)?),
        };
        writer.write(&[ENDIAN_MARKER])?;
        Ok(writer)
    }

    pub fn write(&mut self, words: &[i64]) -> Result<()> {
        for word in words {
            self.out.write_all(&word.to_ne_bytes())?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn write_raw(words: &[i64]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for w in words {
            file.write_all(&w.to_ne_bytes()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_native_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = WordWriter::create(file.path()).unwrap();
        writer.write(&[3, -1, i64::MAX]).unwrap();
        writer.finish().unwrap();
        let words = WordFile::open(file.path()).unwrap();
        assert!(!words.is_swapped());
        assert_eq!(words.len(), 4);
        assert_eq!(words.word(2), -1);
        assert_eq!(words.words(1, 3), vec![3, -1, i64::MAX]);
    }

    #[test]
    fn test_swapped_words() {
        let raw: Vec<i64> = [ENDIAN_MARKER, 42, -7].iter().map(|w| w.swap_bytes()).collect();
        let file = write_raw(&raw);
        let words = WordFile::open(file.path()).unwrap();
        assert!(words.is_swapped());
        assert_eq!(words.words(0, 3), vec![ENDIAN_MARKER, 42, -7]);
    }

    #[test]
    fn test_corrupt_files() {
        let file = write_raw(&[]);
        assert!(matches!(WordFile::open(file.path()), Err(Error::CorruptSnapshot(_))));
        let file = write_raw(&[1, 2]);
        assert!(matches!(WordFile::open(file.path()), Err(Error::CorruptSnapshot(_))));
        let mut file = write_raw(&[ENDIAN_MARKER]);
        file.write_all(&[0, 1, 2]).unwrap();
        file.flush().unwrap();
        assert!(matches!(WordFile::open(file.path()), Err(Error::CorruptSnapshot(_))));
        assert!(matches!(WordFile::open("/nonexistent/tempograph"), Err(Error::Io(_))));
    }
}
