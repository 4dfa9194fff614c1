//! SQL script rendering
//!
//! ```text
//!  # <header comments>
//!
//!   INSERT IGNORE INTO drop_data (...) VALUES
//! (id, meso, min, max, 0, chance),      <- every row but the last
//! (id, meso, min, max, 0, chance);      <- last row
//!
//!   DELETE FROM drop_data WHERE dropperid BETWEEN lo AND hi AND itemid = meso;
//! ```
//!
//! The DELETE is left out when meso drops are permitted on the excluded zone.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::{ExcludedZone, FetcherConfig};
use crate::meso::{MesoRange, MesoRangeTable, MonsterId};

const INSERT_CLAUSE: &str = "  INSERT IGNORE INTO drop_data (`dropperid`, `itemid`, `minimum_quantity`, `maximum_quantity`, `questid`, `chance`) VALUES";

#[cfg(unix)]
const SCRIPT_MODE: u32 = 0o644;

/// What ended up on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub includes_exclusion_delete: bool,
}

#[derive(Debug, Clone)]
pub struct ScriptWriter {
    pub currency_item_id: i32,
    pub drop_chance: u32,
    pub minimum_item_count: u32,
    /// `None` when meso drops are permitted on excluded bosses
    pub exclusion: Option<ExcludedZone>,
}

impl ScriptWriter {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            currency_item_id: config.currency_item_id,
            drop_chance: config.drop_chance,
            minimum_item_count: config.minimum_item_count,
            exclusion: (!config.permit_currency_on_excluded_bosses).then_some(config.excluded_zone),
        }
    }

    /// Render the script for `candidates` into `out`.
    ///
    /// Candidates without a range are skipped. Returns the number of rows written.
    pub fn render<W: Write>(
        &self,
        out: &mut W,
        candidates: &[MonsterId],
        ranges: &MesoRangeTable,
    ) -> io::Result<usize> {
        let rows = resolve_rows(candidates, ranges);
        self.render_rows(out, &rows)?;
        Ok(rows.len())
    }

    /// Render the script to `path`, replacing it atomically.
    ///
    /// Writes nothing and returns `None` when no candidate has a range.
    pub fn write_script(
        &self,
        path: &Path,
        candidates: &[MonsterId],
        ranges: &MesoRangeTable,
    ) -> io::Result<Option<ScriptSummary>> {
        let rows = resolve_rows(candidates, ranges);
        if rows.is_empty() {
            return Ok(None);
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Dropped (and deleted) on any error before persist
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            self.render_rows(&mut out, &rows)?;
            out.flush()?;
        }
        tmp.as_file().sync_all()?;
        // Temp files are created 0600; the script should be readable like any other file
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file().set_permissions(fs::Permissions::from_mode(SCRIPT_MODE))?;
        }
        tmp.persist(path).map_err(|e| e.error)?;

        info!("Wrote {} meso rows to {}", rows.len(), path.display());

        Ok(Some(ScriptSummary {
            path: path.to_path_buf(),
            rows: rows.len(),
            includes_exclusion_delete: self.exclusion.is_some(),
        }))
    }

    fn render_rows<W: Write>(&self, out: &mut W, rows: &[(MonsterId, MesoRange)]) -> io::Result<()> {
        self.write_header(out)?;

        if let Some((last, init)) = rows.split_last() {
            for row in init {
                self.write_row(out, row, ',')?;
            }
            self.write_row(out, last, ';')?;
        }

        if let Some(zone) = &self.exclusion {
            writeln!(out)?;
            writeln!(
                out,
                "  DELETE FROM drop_data WHERE dropperid BETWEEN {} AND {} AND itemid = {};",
                zone.low, zone.high, self.currency_item_id
            )?;
        }

        Ok(())
    }

    fn write_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, " # SQL file autogenerated by the meso drop fetcher.")?;
        writeln!(
            out,
            " # Generated data takes into account mob stats such as level and boss for the meso ranges."
        )?;
        writeln!(
            out,
            " # Only mobs with {} or more items with no meso entry on the DB it was compiled are presented here.",
            self.minimum_item_count
        )?;
        writeln!(out)?;
        writeln!(out, "{}", INSERT_CLAUSE)
    }

    fn write_row<W: Write>(
        &self,
        out: &mut W,
        (id, range): &(MonsterId, MesoRange),
        terminator: char,
    ) -> io::Result<()> {
        writeln!(
            out,
            "({}, {}, {}, {}, 0, {}){}",
            id, self.currency_item_id, range.min, range.max, self.drop_chance, terminator
        )
    }
}

fn resolve_rows(candidates: &[MonsterId], ranges: &MesoRangeTable) -> Vec<(MonsterId, MesoRange)> {
    candidates
        .iter()
        .filter_map(|id| match ranges.get(id) {
            Some(range) => Some((*id, *range)),
            None => {
                debug!("No meso range for {}, skipping", id);
                None
            }
        })
        .collect()
}
