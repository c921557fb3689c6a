use std::io::Write;

use crate::recorder::Entry;

pub const TIME_HEADER: &str = "Time (s)";
pub const ROTATIONS_HEADER: &str = "Rotations";

/// Writes entries as tab-separated rows, ready to paste into a spreadsheet
/// or plotting tool.
pub fn write_table<W: Write>(out: W, entries: &[Entry]) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
    writer.write_record([TIME_HEADER, ROTATIONS_HEADER])?;
    for entry in entries {
        writer.write_record([entry.elapsed_secs.to_string(), entry.index.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
