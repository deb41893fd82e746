use std::path::Path;

use crate::error::FillError;
use crate::grid::Location;
use crate::search::IterationRecord;
use crate::state::CrosswordState;

/// Write the filled grid in the same shape as the input layout: an index
/// column plus a header row of column indices, blocked cells empty, open
/// cells carrying their letter or `_` when still unfilled. The output is
/// itself a valid layout, so a result can be loaded back in.
pub fn write_grid_csv(path: &Path, state: &CrosswordState) -> Result<(), FillError> {
    let grid = state.grid();
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<String> = vec![String::new()];
    header.extend((0..grid.num_cols()).map(|col| col.to_string()));
    writer.write_record(&header)?;

    for row in 0..grid.num_rows() {
        let mut record: Vec<String> = vec![row.to_string()];
        for col in 0..grid.num_cols() {
            let location = Location(row, col);
            let field = if grid.is_open(location) {
                match state.letter_at(location) {
                    Some(letter) => letter.to_string(),
                    None => String::from("_"),
                }
            } else {
                String::new()
            };
            record.push(field);
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per search iteration, in the order the iterations ran.
pub fn write_summary_csv(path: &Path, history: &[IterationRecord]) -> Result<(), FillError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in history {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
