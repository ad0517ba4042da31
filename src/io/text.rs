//! Plain-text float loading for candidate outputs

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::ComparisonError;

/// Parse whitespace-delimited floats from `reader`
///
/// Values may span any number of lines. `#` starts a comment that runs to the
/// end of the line. `path` is only used for error reporting.
pub fn read_floats<R: BufRead>(reader: R, path: &Path) -> Result<Vec<f64>, ComparisonError> {
    let mut values = Vec::new();

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ComparisonError::from_io(path, e))?;
        let content = match line.find('#') {
            Some(pos) => &line[..pos],
            None => &line,
        };

        for token in content.split_whitespace() {
            let value = token.parse::<f64>().map_err(|_| ComparisonError::Parse {
                path: path.to_path_buf(),
                line: line_idx + 1,
                token: token.to_string(),
            })?;
            values.push(value);
        }
    }

    Ok(values)
}

/// Load a text file of floats
pub fn load_text<P: AsRef<Path>>(path: P) -> Result<Vec<f64>, ComparisonError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ComparisonError::from_io(path, e))?;
    let values = read_floats(BufReader::new(file), path)?;

    debug!("Loaded {:?}: {} values", path, values.len());
    Ok(values)
}
