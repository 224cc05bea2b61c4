//! Tab-separated place records.
//!
//! Input files carry a header row followed by one place per row. Columns are
//! positional; [`RecordSchema`] names the positions so the parser never
//! indexes rows directly. Identifiers are synthesised from the data-row
//! order and are never read from the file.

use std::{fmt, io, num::ParseFloatError};

use camino::{Utf8Path, Utf8PathBuf};
use tasty_core::{ErrorKind, GeoPoint, Place};
use thiserror::Error;

/// Coordinate columns validated by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateColumn {
    /// The longitude column.
    Longitude,
    /// The latitude column.
    Latitude,
}

impl fmt::Display for CoordinateColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Longitude => "longitude",
            Self::Latitude => "latitude",
        })
    }
}

/// Errors raised while turning input rows into places.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A coordinate field was not a finite floating point number.
    #[error("row {row}: invalid {column} value {value:?}")]
    InvalidCoordinate {
        /// One-based data row, equal to the id the place would have had.
        row: u64,
        /// Column holding the bad value.
        column: CoordinateColumn,
        /// Trimmed field contents.
        value: String,
        /// Parser failure; absent when the value parsed but is NaN or
        /// infinite.
        #[source]
        source: Option<ParseFloatError>,
    },
    /// The input file could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        /// Path supplied by the caller.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The input could not be decoded as tab-separated text.
    #[error("failed to read tab-separated input: {source}")]
    Read {
        /// Decoder failure.
        #[source]
        source: csv::Error,
    },
}

impl RecordError {
    /// Classify the error. Every record error is fatal to the ingestion run.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::MalformedInput
    }
}

/// Column positions of a place row.
///
/// The default layout is `[source id, name, address, phone, longitude,
/// latitude]`; the leading source id and any trailing columns are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    name: usize,
    address: usize,
    phone: usize,
    longitude: usize,
    latitude: usize,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self {
            name: 1,
            address: 2,
            phone: 3,
            longitude: 4,
            latitude: 5,
        }
    }
}

impl RecordSchema {
    /// Build a place from one data row.
    ///
    /// Missing text columns become empty strings and missing coordinate
    /// columns become `0.0`. Present coordinates are trimmed before parsing.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidCoordinate`] for the first coordinate
    /// that does not parse, longitude before latitude.
    ///
    /// # Examples
    /// ```
    /// use tasty_data::records::RecordSchema;
    ///
    /// let row = ["1", "Cafe", "123 St", "555-1234", "-73.99", " 40.75 "];
    /// let place = RecordSchema::default().place_from_row(1, &row)?;
    /// assert_eq!(place.location.lat, 40.75);
    /// assert_eq!(place.location.lon, -73.99);
    /// # Ok::<(), tasty_data::records::RecordError>(())
    /// ```
    pub fn place_from_row<S: AsRef<str>>(
        &self,
        id: u64,
        fields: &[S],
    ) -> Result<Place, RecordError> {
        let text = |index: usize| fields.get(index).map_or("", |field| field.as_ref());
        let coordinate = |index: usize, column: CoordinateColumn| -> Result<f64, RecordError> {
            let Some(raw) = fields.get(index) else {
                return Ok(0.0);
            };
            let value = raw.as_ref().trim();
            let invalid = |source| RecordError::InvalidCoordinate {
                row: id,
                column,
                value: value.to_owned(),
                source,
            };
            // Non-finite values would serialise as JSON null.
            match value.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => Ok(parsed),
                Ok(_) => Err(invalid(None)),
                Err(source) => Err(invalid(Some(source))),
            }
        };

        let lon = coordinate(self.longitude, CoordinateColumn::Longitude)?;
        let lat = coordinate(self.latitude, CoordinateColumn::Latitude)?;
        Ok(Place::new(
            id,
            text(self.name),
            text(self.address),
            text(self.phone),
            GeoPoint::new(lat, lon),
        ))
    }

    /// Convert rows into places, skipping the first row as a header.
    ///
    /// Data rows are numbered from one and that number becomes the place id.
    ///
    /// # Errors
    ///
    /// Returns the first [`RecordError::InvalidCoordinate`]; no partial list
    /// is produced.
    pub fn places_from_rows<I, R, S>(&self, rows: I) -> Result<Vec<Place>, RecordError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        rows.into_iter()
            .skip(1)
            .zip(1_u64..)
            .map(|(row, id)| self.place_from_row(id, row.as_ref()))
            .collect()
    }
}

/// Convert rows into places using the default column layout.
///
/// # Errors
///
/// See [`RecordSchema::places_from_rows`].
pub fn places_from_rows<I, R, S>(rows: I) -> Result<Vec<Place>, RecordError>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    RecordSchema::default().places_from_rows(rows)
}

/// Read tab-separated rows from `reader` and convert them into places.
///
/// Rows may have differing field counts. Blank lines are skipped.
///
/// # Errors
///
/// Returns [`RecordError::Read`] when the input cannot be decoded and
/// [`RecordError::InvalidCoordinate`] for the first malformed coordinate.
pub fn read_places<R: io::Read>(reader: R) -> Result<Vec<Place>, RecordError> {
    let mut tsv = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let rows = tsv
        .records()
        .collect::<Result<Vec<csv::StringRecord>, csv::Error>>()
        .map_err(|source| RecordError::Read { source })?;
    let fields: Vec<Vec<&str>> = rows.iter().map(|row| row.iter().collect()).collect();
    let places = places_from_rows(&fields)?;
    log::debug!("parsed {} places from {} rows", places.len(), rows.len());
    Ok(places)
}

/// Open `path` and read its places.
///
/// # Errors
///
/// Returns [`RecordError::Open`] when the file cannot be opened, otherwise
/// see [`read_places`].
pub fn read_places_file(path: &Utf8Path) -> Result<Vec<Place>, RecordError> {
    let file = tasty_fs::open_input(path).map_err(|source| RecordError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_places(io::BufReader::new(file))
}
