use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{BufRead, BufReader, Read},
    marker::PhantomData,
    path::Path,
};

use log::debug;
use serde::de::DeserializeOwned;

use crate::{
    BatchError,
    core::item::{ItemReader, ItemReaderResult},
};

/// Reads the elements of a top-level JSON array.
///
/// The input is streamed through a buffer of `capacity` bytes. Only the bytes of the element
/// being read are held in memory; they are deserialized into `T` when the element ends, so a
/// malformed element fails at its own position in the stream. Fields not declared on `T` are
/// ignored. Anything after the closing bracket is not read.
pub struct JsonItemReader<R, T> {
    pd: PhantomData<T>,
    reader: RefCell<BufReader<R>>,
    capacity: usize,
    started: Cell<bool>,
    finished: Cell<bool>,
    position: Cell<usize>,
    element: RefCell<Vec<u8>>,
}

impl<R: Read, T: DeserializeOwned> JsonItemReader<R, T> {
    fn new(rdr: R, capacity: usize) -> Self {
        Self {
            pd: PhantomData,
            reader: RefCell::new(BufReader::with_capacity(capacity, rdr)),
            capacity,
            started: Cell::new(false),
            finished: Cell::new(false),
            position: Cell::new(0),
            element: RefCell::new(Vec::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn next_byte(reader: &mut BufReader<R>) -> Result<Option<u8>, BatchError> {
        let buffer = reader
            .fill_buf()
            .map_err(|error| BatchError::ItemReader(format!("unable to read JSON: {}", error)))?;

        match buffer.first().copied() {
            Some(byte) => {
                reader.consume(1);
                Ok(Some(byte))
            }
            None => Ok(None),
        }
    }

    /// Consumes the opening bracket of the document.
    fn start(&self, reader: &mut BufReader<R>) -> Result<(), BatchError> {
        let first = loop {
            match Self::next_byte(reader)? {
                Some(byte) if byte.is_ascii_whitespace() => continue,
                other => break other,
            }
        };

        let found = match first {
            Some(b'[') => {
                self.started.set(true);
                return Ok(());
            }
            Some(b'{') => "an object",
            Some(b'"') => "a string",
            Some(byte) if byte == b'-' || byte.is_ascii_digit() => "a number",
            Some(byte) => {
                return Err(BatchError::ItemReader(format!(
                    "malformed JSON: unexpected '{}' at the start of the document",
                    byte.escape_ascii()
                )));
            }
            None => "an empty document",
        };

        Err(BatchError::ItemReader(format!(
            "expected a JSON array, found {}",
            found
        )))
    }

    /// Collects the bytes of the next element into `element`.
    ///
    /// Returns `false` once the closing bracket of the array is reached with no element
    /// pending.
    fn next_element(
        &self,
        reader: &mut BufReader<R>,
        element: &mut Vec<u8>,
    ) -> Result<bool, BatchError> {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        loop {
            let byte = Self::next_byte(reader)?.ok_or_else(|| {
                BatchError::ItemReader("unexpected end of the JSON array".to_string())
            })?;

            if in_string {
                element.push(byte);
                if escaped {
                    escaped = false;
                } else if byte == b'\\' {
                    escaped = true;
                } else if byte == b'"' {
                    in_string = false;
                }
                continue;
            }

            match byte {
                b',' if depth == 0 => {
                    if element.is_empty() {
                        return Err(BatchError::ItemReader(format!(
                            "element {}: missing value before ','",
                            self.position.get()
                        )));
                    }
                    return Ok(true);
                }
                b']' if depth == 0 => {
                    self.finished.set(true);
                    if element.is_empty() && self.position.get() > 0 {
                        return Err(BatchError::ItemReader(
                            "trailing ',' before the end of the JSON array".to_string(),
                        ));
                    }
                    return Ok(!element.is_empty());
                }
                byte if byte.is_ascii_whitespace() && element.is_empty() => {}
                b'"' => {
                    in_string = true;
                    element.push(byte);
                }
                b'{' | b'[' => {
                    depth += 1;
                    element.push(byte);
                }
                b'}' | b']' if depth > 0 => {
                    depth -= 1;
                    element.push(byte);
                }
                _ => element.push(byte),
            }
        }
    }
}

impl<R: Read, T: DeserializeOwned> ItemReader<T> for JsonItemReader<R, T> {
    fn read(&self) -> ItemReaderResult<T> {
        if self.finished.get() {
            return Ok(None);
        }

        let mut reader = self.reader.borrow_mut();
        if !self.started.get() {
            self.start(&mut reader)?;
        }

        let mut element = self.element.borrow_mut();
        element.clear();

        if !self.next_element(&mut reader, &mut element)? {
            debug!("End of JSON array after {} elements", self.position.get());
            return Ok(None);
        }

        let position = self.position.get();
        self.position.set(position + 1);

        serde_json::from_slice(&element)
            .map(Some)
            .map_err(|error| BatchError::ItemReader(format!("element {}: {}", position, error)))
    }
}

pub struct JsonItemReaderBuilder<T> {
    _pd: PhantomData<T>,
    capacity: usize,
}

impl<T: DeserializeOwned> Default for JsonItemReaderBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> JsonItemReaderBuilder<T> {
    pub fn new() -> JsonItemReaderBuilder<T> {
        Self {
            _pd: PhantomData,
            capacity: 8 * 1024,
        }
    }

    /// Size of the read buffer.
    pub fn capacity(mut self, capacity: usize) -> JsonItemReaderBuilder<T> {
        self.capacity = capacity;
        self
    }

    pub fn from_reader<R: Read>(self, rdr: R) -> JsonItemReader<R, T> {
        JsonItemReader::new(rdr, self.capacity)
    }

    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<JsonItemReader<File, T>, BatchError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|error| {
            BatchError::ItemReader(format!("unable to open {}: {}", path.display(), error))
        })?;
        Ok(self.from_reader(file))
    }
}
