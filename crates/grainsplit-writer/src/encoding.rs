use parquet::basic::Compression;
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;

const DEFAULT_ROW_GROUP_SIZE: usize = 32 * 1024;

/// Parquet encoding options for split outputs.
///
/// Output files are uncompressed so downstream readers with minimal codec
/// support can consume them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub row_group_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }
}

impl WriteOptions {
    pub fn with_row_group_size(row_group_size: usize) -> Self {
        if row_group_size == 0 {
            return Self::default();
        }
        Self { row_group_size }
    }

    /// Writer properties with `extra` key/value pairs embedded in the footer.
    pub fn writer_properties(&self, extra: &[(&str, String)]) -> WriterProperties {
        let mut metadata = vec![KeyValue {
            key: "grainsplit.version".to_string(),
            value: Some(env!("CARGO_PKG_VERSION").to_string()),
        }];
        metadata.extend(extra.iter().map(|(key, value)| KeyValue {
            key: (*key).to_string(),
            value: Some(value.clone()),
        }));

        WriterProperties::builder()
            .set_compression(Compression::UNCOMPRESSED)
            .set_dictionary_enabled(true)
            .set_statistics_enabled(EnabledStatistics::Page)
            .set_max_row_group_size(self.row_group_size)
            .set_key_value_metadata(Some(metadata))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::schema::types::ColumnPath;

    #[test]
    fn test_properties_are_uncompressed() {
        let props = WriteOptions::default().writer_properties(&[]);
        assert_eq!(
            props.compression(&ColumnPath::from("any")),
            Compression::UNCOMPRESSED
        );
        assert_eq!(props.max_row_group_size(), DEFAULT_ROW_GROUP_SIZE);
    }

    #[test]
    fn test_zero_row_group_size_falls_back() {
        assert_eq!(WriteOptions::with_row_group_size(0), WriteOptions::default());
        assert_eq!(WriteOptions::with_row_group_size(10).row_group_size, 10);
    }

    #[test]
    fn test_extra_metadata_is_embedded() {
        let props = WriteOptions::default().writer_properties(&[("grainsplit.split", "test".into())]);
        let metadata = props.key_value_metadata().unwrap();
        assert!(metadata
            .iter()
            .any(|kv| kv.key == "grainsplit.split" && kv.value.as_deref() == Some("test")));
    }
}
