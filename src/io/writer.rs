use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use log::{debug, info};
use object_store::PutPayload;
use object_store::path::Path as ObjectPath;

use crate::conf::{SaveMode, WriteConfig};
use crate::core::TabulaError;
use crate::frame::DataFrame;

use super::store::{is_data_file, list_objects, success_marker_path};

const PART_PREFIX: &str = "part-";
const PART_SUFFIX: &str = ".csv";

/// Resolved write settings, validated from `WriteConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOptions {
    pub header: bool,
    pub delimiter: u8,
    pub mode: SaveMode,
}

impl TryFrom<&WriteConfig> for WriteOptions {
    type Error = TabulaError;

    fn try_from(config: &WriteConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            header: config.header,
            delimiter: config.delimiter_byte()?,
            mode: config.mode,
        })
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            header: true,
            delimiter: b',',
            mode: SaveMode::ErrorIfExists,
        }
    }
}

/// Builder that persists a [DataFrame] as delimited text.
///
/// The output path is a prefix: one `part-NNNNN.csv` object per partition,
/// followed by an empty `_SUCCESS` marker.
#[derive(Debug, Clone)]
pub struct CsvWriter {
    frame: DataFrame,
    options: WriteOptions,
}

impl CsvWriter {
    pub fn new(frame: DataFrame, options: WriteOptions) -> Self {
        Self { frame, options }
    }

    pub fn header(mut self, header: bool) -> Self {
        self.options.header = header;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.options.delimiter = delimiter;
        self
    }

    pub fn mode(mut self, mode: SaveMode) -> Self {
        self.options.mode = mode;
        self
    }

    /// Writes every partition under `path` and returns the part paths written.
    pub async fn csv(self, path: &str) -> Result<Vec<ObjectPath>, TabulaError> {
        let store = self.frame.session().store();
        let prefix = ObjectPath::from(path);

        let mut existing = list_objects(&store, &prefix).await?;
        match store.head(&prefix).await {
            Ok(meta) => existing.push(meta.location),
            Err(object_store::Error::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let mut first_part = 0;
        if !existing.is_empty() {
            match self.options.mode {
                SaveMode::ErrorIfExists => {
                    return Err(TabulaError::PathAlreadyExists(prefix.to_string()));
                }
                SaveMode::Ignore => {
                    info!("'{}' already exists, skipping write", prefix);
                    return Ok(Vec::new());
                }
                SaveMode::Overwrite => {
                    for object in &existing {
                        store.delete(object).await?;
                    }
                    debug!("Deleted {} objects under '{}'", existing.len(), prefix);
                }
                SaveMode::Append => {
                    first_part = next_part_index(&existing);
                }
            }
        }

        let partitions = match self.frame.partitions() {
            [] => vec![RecordBatch::new_empty(self.frame.schema())],
            batches => batches.to_vec(),
        };

        let mut written = Vec::with_capacity(partitions.len());
        for (offset, batch) in partitions.iter().enumerate() {
            let location = prefix.child(part_name(first_part + offset));
            let bytes = encode_csv(batch, self.options.header, self.options.delimiter)?;
            debug!("Writing {} rows to '{}'", batch.num_rows(), location);
            store.put(&location, PutPayload::from(bytes)).await?;
            written.push(location);
        }

        store
            .put(&success_marker_path(&prefix), PutPayload::from_static(b""))
            .await?;

        info!(
            "Wrote {} rows in {} part file(s) to '{}'",
            self.frame.count(),
            written.len(),
            prefix
        );
        Ok(written)
    }
}

/// Encodes one batch as delimited text.
pub fn encode_csv(batch: &RecordBatch, header: bool, delimiter: u8) -> Result<Vec<u8>, TabulaError> {
    let mut writer = WriterBuilder::new()
        .with_header(header)
        .with_delimiter(delimiter)
        .build(Vec::new());
    writer.write(batch)?;
    Ok(writer.into_inner())
}

fn part_name(index: usize) -> String {
    format!("{PART_PREFIX}{index:05}{PART_SUFFIX}")
}

fn part_index(path: &ObjectPath) -> Option<usize> {
    path.filename()?
        .strip_prefix(PART_PREFIX)?
        .strip_suffix(PART_SUFFIX)?
        .parse()
        .ok()
}

fn next_part_index(existing: &[ObjectPath]) -> usize {
    let data_files = existing.iter().filter(|path| is_data_file(path));
    let highest = data_files.clone().filter_map(part_index).max();
    match highest {
        Some(index) => index + 1,
        None => data_files.count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    fn batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("label", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec![Some("a"), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_encode_with_header() {
        let bytes = encode_csv(&batch(), true, b',').unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "id,label\n1,a\n2,\n");
    }

    #[test]
    fn test_encode_pipe_without_header() {
        let bytes = encode_csv(&batch(), false, b'|').unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "1|a\n2|\n");
    }

    #[test]
    fn test_part_names() {
        assert_eq!(part_name(0), "part-00000.csv");
        assert_eq!(part_index(&ObjectPath::from("out/part-00042.csv")), Some(42));
        assert_eq!(part_index(&ObjectPath::from("out/_SUCCESS")), None);
    }

    #[test]
    fn test_next_part_index() {
        let existing = vec![
            ObjectPath::from("out/part-00000.csv"),
            ObjectPath::from("out/part-00003.csv"),
            ObjectPath::from("out/_SUCCESS"),
        ];
        assert_eq!(next_part_index(&existing), 4);

        let foreign = vec![ObjectPath::from("out/data.csv"), ObjectPath::from("out/_SUCCESS")];
        assert_eq!(next_part_index(&foreign), 1);
    }
}
