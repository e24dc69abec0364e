use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::ViewerError;
use crate::format::DisplayLine;

/// Write `lines` to `path` as plain text, one per line, replacing the file
pub fn export_lines<'a>(
    lines: impl IntoIterator<Item = &'a DisplayLine>,
    path: &Path,
) -> Result<usize, ViewerError> {
    let file =
        File::create(path).map_err(|e| ViewerError::io("unable to create export file", path, e))?;
    let mut writer = BufWriter::new(file);

    let mut count = 0;
    for line in lines {
        writeln!(writer, "{}", line)
            .map_err(|e| ViewerError::io("unable to write to export file", path, e))?;
        count += 1;
    }
    writer
        .flush()
        .map_err(|e| ViewerError::io("unable to write to export file", path, e))?;

    info!(path = %path.display(), lines = count, "exported lines");
    Ok(count)
}
