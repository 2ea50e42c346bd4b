use std::path::Path;

use csv::WriterBuilder;

use crate::error::ExtractError;

pub(crate) fn write_csv(
    path: &Path,
    headers: &[String],
    rows: &[Vec<String>],
    delimiter: u8,
) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_csv_to_string(
    headers: &[String],
    rows: &[Vec<String>],
    delimiter: u8,
) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}

#[cfg(test)]
mod tests {
    use super::write_csv_to_string;

    #[test]
    fn quotes_cells_containing_the_delimiter() {
        let headers = vec!["code".to_string(), "total_price".to_string()];
        let rows = vec![vec!["001.002.003".to_string(), "1,50".to_string()]];

        let csv = write_csv_to_string(&headers, &rows, b',').expect("csv should serialize");
        assert_eq!(csv, "code,total_price\n001.002.003,\"1,50\"\n");
    }

    #[test]
    fn honors_alternate_delimiters() {
        let headers = vec!["code".to_string(), "total_price".to_string()];
        let rows = vec![vec!["001.002.003".to_string(), "1,50".to_string()]];

        let csv = write_csv_to_string(&headers, &rows, b';').expect("csv should serialize");
        assert_eq!(csv, "code;total_price\n001.002.003;1,50\n");
    }
}
