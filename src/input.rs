//! Common routines for handling input data.
use anyhow::{Context, Result, ensure};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod time_series;

/// Read a TOML file at the specified path and deserialise it into type `T`.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let contents = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read file {}", file_path.display()))?;
    toml::from_str(&contents).with_context(|| input_err_msg(file_path))
}

/// Read a series of type `T`s from a CSV file into a `Vec<T>`.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_vec_from_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?;

    let mut vec = Vec::new();
    for result in reader.deserialize() {
        let row: T = result.with_context(|| input_err_msg(file_path))?;
        vec.push(row);
    }

    ensure!(!vec.is_empty(), "CSV file {} is empty", file_path.display());

    Ok(vec)
}

/// Format an error message to indicate the file that a problem occurred in.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Record {
        hour: u32,
        value: f64,
    }

    #[test]
    fn test_read_vec_from_csv() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("data.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "hour,value\n1,0.5\n2,1.5").unwrap();
        }

        let records: Vec<Record> = read_vec_from_csv(&file_path).unwrap();
        assert_eq!(
            records,
            vec![
                Record {
                    hour: 1,
                    value: 0.5
                },
                Record {
                    hour: 2,
                    value: 1.5
                }
            ]
        );
    }

    #[test]
    fn test_read_vec_from_csv_empty() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("data.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "hour,value").unwrap();
        }

        assert!(read_vec_from_csv::<Record>(&file_path).is_err());
    }
}
