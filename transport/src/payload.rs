use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use flate2::{write::GzEncoder, Compression};
use tracing::debug;

use crate::{
    errors::Result,
    request::FilePart,
    settings::UrlParams,
    stream::WriteChunks,
};

/// The first bytes of every gzip result file: magic, deflate, no flags, zero mtime.
pub const GZIP_PREFIX: [u8; 8] = [0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];

const DEFAULT_EXTERNAL_FORMAT: &str = "CSV";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTable {
    pub name: String,
    pub path: PathBuf,
    /// Column list, e.g. `id UInt64, name String`.
    pub structure: String,
    pub format: String,
}

/// Local files uploaded alongside a read and queryable under their table names, typically to
/// feed an `in` list too large for the statement text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereInFile {
    tables: Vec<ExternalTable>,
}

impl WhereInFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(
        self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        structure: impl Into<String>,
    ) -> Self {
        self.attach_with_format(name, path, structure, DEFAULT_EXTERNAL_FORMAT)
    }

    pub fn attach_with_format(
        mut self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        structure: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        self.tables.push(ExternalTable {
            name: name.into(),
            path: path.into(),
            structure: structure.into(),
            format: format.into(),
        });
        self
    }

    pub fn size(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn tables(&self) -> &[ExternalTable] {
        &self.tables
    }

    /// `<name>_structure` and `<name>_format` for every table.
    pub fn url_params(&self) -> UrlParams {
        let mut params = UrlParams::new();
        for table in &self.tables {
            params.set(format!("{}_structure", table.name), &table.structure);
            params.set(format!("{}_format", table.name), &table.format);
        }
        params
    }

    /// Read every file into a multipart part named after its table.
    pub fn parts(&self) -> Result<Vec<FilePart>> {
        self.tables
            .iter()
            .map(|table| {
                let bytes = std::fs::read(&table.path)?;
                debug!(table = %table.name, bytes = bytes.len(), "attaching external table");
                Ok(FilePart {
                    name: table.name.clone(),
                    file_name: file_name(&table.path),
                    bytes,
                })
            })
            .collect()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Send the result of a read to a local file instead of memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteToFile {
    path: PathBuf,
    format: String,
    gzip: bool,
}

impl WriteToFile {
    pub fn new(path: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: format.into(),
            gzip: false,
        }
    }

    /// Compress the file with gzip as it is written.
    pub fn gzip(mut self) -> Self {
        self.gzip = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn is_gzip(&self) -> bool {
        self.gzip
    }

    /// Create (or truncate) the file.
    pub fn open(&self) -> Result<FileSink> {
        let writer = BufWriter::new(File::create(&self.path)?);
        let target = if self.gzip {
            FileTarget::Gzip(GzEncoder::new(writer, Compression::default()))
        } else {
            FileTarget::Plain(writer)
        };
        Ok(FileSink { target })
    }
}

#[derive(Debug)]
enum FileTarget {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

/// An open result file. The download finishing completes the gzip stream and flushes it; the
/// file is closed when the sink is dropped.
#[derive(Debug)]
pub struct FileSink {
    target: FileTarget,
}

impl WriteChunks for FileSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        match &mut self.target {
            FileTarget::Plain(writer) => writer.write_all(chunk),
            FileTarget::Gzip(encoder) => encoder.write_all(chunk),
        }
    }

    fn finish(&mut self) -> std::io::Result<()> {
        match &mut self.target {
            FileTarget::Plain(writer) => writer.flush(),
            FileTarget::Gzip(encoder) => {
                encoder.try_finish()?;
                encoder.get_mut().flush()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::GzDecoder;

    use super::*;

    #[test]
    fn test_external_table_params_and_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.csv");
        std::fs::write(&path, "1\n2\n3\n").unwrap();
        let files = WhereInFile::new().attach("_ids", &path, "id UInt32");
        assert_eq!(files.size(), 1);
        assert_eq!(
            files.url_params().iter().collect::<Vec<_>>(),
            vec![("_ids_structure", "id UInt32"), ("_ids_format", "CSV")]
        );
        let parts = files.parts().unwrap();
        assert_eq!(parts[0].name, "_ids");
        assert_eq!(parts[0].file_name, "ids.csv");
        assert_eq!(parts[0].bytes, b"1\n2\n3\n");
    }

    #[test]
    fn test_missing_external_file_is_an_error() {
        let files = WhereInFile::new().attach("_ids", "/nonexistent/ids.csv", "id UInt32");
        assert!(files.parts().is_err());
    }

    #[test]
    fn test_gzip_sink_writes_a_valid_gzip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv.gz");
        let target = WriteToFile::new(&path, "CSV").gzip();
        {
            let mut sink = target.open().unwrap();
            sink.write_chunk(b"1,2\n").unwrap();
            sink.write_chunk(b"3,4\n").unwrap();
            sink.finish().unwrap();
        }
        let written = std::fs::read(&path).unwrap();
        assert_eq!(&written[..8], &GZIP_PREFIX);
        let mut decoded = String::new();
        GzDecoder::new(&written[..])
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "1,2\n3,4\n");
    }

    #[test]
    fn test_plain_sink_has_no_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        let mut sink = WriteToFile::new(&path, "TSV").open().unwrap();
        sink.write_chunk(b"a\tb\n").unwrap();
        drop(sink);
        assert_eq!(std::fs::read(&path).unwrap(), b"a\tb\n");
    }
}
