use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MappingError(String);

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for MappingError {}

/// Maps the header row of a source table to column indexes so that cells can be looked up by
/// header name regardless of column order.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Mapping {
    headers: Vec<String>,
    header_map: HashMap<String, usize>,
}

impl Mapping {
    /// Create a new `Mapping` from the header row. Headers are trimmed; a byte order mark on the
    /// first header is removed. Duplicate non-empty headers are an error.
    pub fn new<S, I>(headers: I) -> Result<Self, MappingError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S>,
    {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|s| s.as_ref().trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut header_map = HashMap::with_capacity(headers.len());
        for (idx, header) in headers.iter().enumerate() {
            // pandas writes an unnamed index column with an empty header
            if header.is_empty() {
                continue;
            }
            if header_map.insert(header.clone(), idx).is_some() {
                return Err(MappingError(format!(
                    "Encountered a duplicate header '{header}'"
                )));
            }
        }

        Ok(Self {
            headers,
            header_map,
        })
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn index(&self, header: &str) -> Option<usize> {
        self.header_map.get(header).copied()
    }

    /// Like `index` but an absent header is an error.
    pub fn require(&self, header: &str) -> Result<usize, MappingError> {
        self.index(header).ok_or_else(|| {
            MappingError(format!(
                "The required column '{header}' is missing, found: {}",
                self.headers.join(", ")
            ))
        })
    }
}
