//! JSON loaders for the track catalog and the genre table.
//!
//! Both files are arrays of flat records. A record missing any required
//! column fails the whole load with [`SongspaceError::Schema`].

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::features::{Catalog, GenreProfile, GenreTable, Track, TrackRecord};
use crate::{Result, SongspaceError};

fn parse_records<T: DeserializeOwned, R: Read>(reader: R, what: &str) -> Result<Vec<T>> {
    serde_json::from_reader(reader)
        .map_err(|e| SongspaceError::Schema(format!("{}: {}", what, e)))
}

pub fn read_catalog<R: Read>(reader: R) -> Result<Catalog> {
    let records: Vec<TrackRecord> = parse_records(reader, "catalog")?;
    Catalog::new(records.into_iter().map(Track::from).collect())
}

pub fn read_genres<R: Read>(reader: R) -> Result<GenreTable> {
    let rows: Vec<GenreProfile> = parse_records(reader, "genre table")?;
    GenreTable::new(rows)
}

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let catalog = read_catalog(BufReader::new(File::open(path)?))?;
    log::info!("loaded {} tracks from {}", catalog.len(), path.display());
    Ok(catalog)
}

pub fn load_genres(path: &Path) -> Result<GenreTable> {
    let table = read_genres(BufReader::new(File::open(path)?))?;
    log::info!("loaded {} genres from {}", table.len(), path.display());
    Ok(table)
}
