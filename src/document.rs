// 📄 Price Document - storage collaborator
// Reads a delimited price table into named nodes and writes it back.
//
// Layout:
//   name,value,tag
//   USD_3M,1.5,PX_LAST
//   EUR_1Y,2.0,PX_LAST
//
// Every row is one top-level record node. Columns other than the name and
// value keys are carried through untouched.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DocumentConfig;
use crate::error::{PriceDataError, Result};

// ============================================================================
// NODE
// ============================================================================

/// One record node: ordered string-keyed attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    attributes: Vec<(String, String)>,
}

impl Node {
    pub fn new(attributes: Vec<(String, String)>) -> Self {
        Node { attributes }
    }

    /// Convenience constructor, mostly for tests and fixtures
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Node {
            attributes: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attribute(key).is_some()
    }

    /// Overwrite an existing attribute.
    ///
    /// The table has a fixed header, so unknown keys are rejected instead of
    /// growing a column for a single row.
    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(PriceDataError::InvalidArgument(format!(
                "attribute '{}' is not part of the document",
                key
            ))),
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Single-line serialization used for display and diffs:
    /// `name="USD_3M" value="1.5" tag="PX_LAST"`
    pub fn render(&self) -> String {
        self.attributes
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn values(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// One row as it sits in storage: the encoded fields and the line ending
/// that followed them, plus the node they parsed to.
#[derive(Debug, Clone)]
struct SourceRow {
    body: Vec<u8>,
    terminator: Vec<u8>,
    parsed: Node,
}

/// Parsed price table.
///
/// Keeps the source bytes of the header and of every row, so rows whose
/// attributes did not change are written back exactly as they were read.
#[derive(Debug, Clone)]
pub struct Document {
    headers: Vec<String>,
    header_bytes: Vec<u8>,
    nodes: Vec<Node>,
    source: Vec<SourceRow>,
    delimiter: u8,
    fingerprint: String,
}

impl Document {
    /// Read and parse the table at `path`.
    ///
    /// Fails with `Io` when the file cannot be read and with `Malformed` when
    /// a required column is missing, a row is ragged, or a name repeats.
    pub fn parse(path: &Path, config: &DocumentConfig) -> Result<Document> {
        let bytes = fs::read(path).map_err(|e| PriceDataError::io(path, e))?;
        let fingerprint = fingerprint_bytes(&bytes);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(config.delimiter)
            .from_reader(bytes.as_slice());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| PriceDataError::malformed(path, e.to_string()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        for required in [&config.name_key, &config.value_key] {
            if !headers.iter().any(|h| h == required) {
                return Err(PriceDataError::malformed(
                    path,
                    format!("missing required column '{}'", required),
                ));
            }
        }

        let mut nodes = Vec::new();
        let mut starts = Vec::new();
        let mut seen = HashSet::new();

        for (line_num, result) in reader.records().enumerate() {
            let row = result.map_err(|e| {
                PriceDataError::malformed(path, format!("line {}: {}", line_num + 2, e))
            })?;
            let start = row.position().map(|p| p.byte() as usize).ok_or_else(|| {
                PriceDataError::malformed(path, format!("line {}: no byte position", line_num + 2))
            })?;

            let node = Node::new(
                headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|field| field.to_string()))
                    .collect(),
            );

            let name = node.attribute(&config.name_key).unwrap_or("").to_string();
            if name.is_empty() {
                return Err(PriceDataError::malformed(
                    path,
                    format!("line {}: empty record name", line_num + 2),
                ));
            }
            if !seen.insert(name.clone()) {
                return Err(PriceDataError::malformed(
                    path,
                    format!("line {}: duplicate record name '{}'", line_num + 2, name),
                ));
            }

            starts.push(start);
            nodes.push(node);
        }

        let (header_bytes, spans) = split_rows(&bytes, &starts);
        let source = spans
            .into_iter()
            .zip(&nodes)
            .map(|(span, node)| {
                let (body, terminator) = split_terminator(span);
                SourceRow {
                    body: body.to_vec(),
                    terminator: terminator.to_vec(),
                    parsed: node.clone(),
                }
            })
            .collect();

        Ok(Document {
            headers,
            header_bytes: header_bytes.to_vec(),
            nodes,
            source,
            delimiter: config.delimiter,
            fingerprint,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Top-level record nodes in document order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_mut(&mut self, name_key: &str, name: &str) -> Option<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|node| node.attribute(name_key) == Some(name))
    }

    /// SHA-256 of the bytes last read from or written to storage
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Serialize the whole table.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.encode()?.0)
    }

    /// Header and untouched rows come from their source bytes; changed rows
    /// are re-encoded and keep the line ending they had.
    fn encode(&self) -> Result<(Vec<u8>, Vec<SourceRow>)> {
        let mut bytes = self.header_bytes.clone();
        let mut source = Vec::with_capacity(self.nodes.len());

        for (node, row) in self.nodes.iter().zip(&self.source) {
            let row = if *node == row.parsed {
                row.clone()
            } else {
                SourceRow {
                    body: encode_row(node, self.delimiter)?,
                    terminator: row.terminator.clone(),
                    parsed: node.clone(),
                }
            };
            bytes.extend_from_slice(&row.body);
            bytes.extend_from_slice(&row.terminator);
            source.push(row);
        }

        Ok((bytes, source))
    }

    /// Write the whole table to `path`.
    ///
    /// Goes through a sibling temp file and a rename, so storage holds either
    /// the old document or the new one.
    pub fn write(&mut self, path: &Path) -> Result<()> {
        let (bytes, source) = self.encode()?;
        let tmp_path = temp_sibling(path);

        if let Err(e) = fs::write(&tmp_path, &bytes) {
            let _ = fs::remove_file(&tmp_path);
            return Err(PriceDataError::io(path, e));
        }
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(PriceDataError::io(path, e));
        }

        self.source = source;
        self.fingerprint = fingerprint_bytes(&bytes);
        Ok(())
    }
}

/// Cut `bytes` at each record start. Blank lines and the tail of a CRLF
/// that the reader left in front of a record belong to the row before it.
fn split_rows<'a>(bytes: &'a [u8], starts: &[usize]) -> (&'a [u8], Vec<&'a [u8]>) {
    let mut bounds: Vec<usize> = starts.iter().map(|&s| s.min(bytes.len())).collect();
    for i in 0..bounds.len() {
        let limit = bounds.get(i + 1).copied().unwrap_or(bytes.len());
        while bounds[i] < limit && matches!(bytes[bounds[i]], b'\r' | b'\n') {
            bounds[i] += 1;
        }
    }

    let header_end = bounds.first().copied().unwrap_or(bytes.len());
    let spans = bounds
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = bounds.get(i + 1).copied().unwrap_or(bytes.len());
            &bytes[start..end.max(start)]
        })
        .collect();

    (&bytes[..header_end], spans)
}

fn split_terminator(span: &[u8]) -> (&[u8], &[u8]) {
    let body_len = span
        .iter()
        .rposition(|b| !matches!(b, b'\r' | b'\n'))
        .map(|i| i + 1)
        .unwrap_or(0);
    span.split_at(body_len)
}

fn encode_row(node: &Node, delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(node.values())
        .map_err(|e| PriceDataError::io("<buffer>", e.into()))?;

    let mut body = writer
        .into_inner()
        .map_err(|e| PriceDataError::io("<buffer>", e.into_error()))?;
    if body.last() == Some(&b'\n') {
        body.pop();
    }
    Ok(body)
}

/// Fingerprint of whatever is currently stored at `path`
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| PriceDataError::io(path, e))?;
    Ok(fingerprint_bytes(&bytes))
}

fn fingerprint_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
