//! Point counts per polygon and category, pivoted into polygon fields.
//!
//! Points are joined to the polygons they fall in, counted per polygon key
//! and pivot value, reshaped into one column per pivot value and joined
//! back onto the polygons by key.

use std::io;

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, info, warn};

use crate::naming::NameSanitizer;
use crate::spatial::join::{one_to_many_join, unique_field_name};
use crate::{AttributeValue, Error, FeatureCollection};

/// Column that collects points with a null pivot value. It is dropped
/// before the rejoin, together with any pivot value literally named `F`.
pub const NULL_PIVOT_COLUMN: &str = "F";

/// Number of joined points for one (key, pivot value) pair
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCount {
    pub key: AttributeValue,
    pub pivot: AttributeValue,
    pub count: u64,
}

/// Counts rows per distinct (key, pivot value) pair, in order of first
/// appearance. Values compare by [`AttributeValue::key`], so `1` and `1.0`
/// fall in the same group.
pub fn group_counts<'a, I>(rows: I) -> Vec<GroupCount>
where
    I: IntoIterator<Item = (&'a AttributeValue, &'a AttributeValue)>,
{
    let mut groups: IndexMap<(Option<String>, Option<String>), GroupCount> = IndexMap::new();
    for (key, pivot) in rows {
        groups
            .entry((key.key(), pivot.key()))
            .or_insert_with(|| GroupCount {
                key: key.clone(),
                pivot: pivot.clone(),
                count: 0,
            })
            .count += 1;
    }
    groups.into_values().collect()
}

/// One row of a pivot table
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub category_key: AttributeValue,
    /// Count per pivot column, zero for combinations never seen
    pub columns: IndexMap<String, u64>,
}

/// Wide table with one row per key and one column per pivot value
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub key_field: String,
    /// Pivot columns, sorted by name
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow>,
}

impl PivotTable {
    /// Reshapes grouped counts. Pivot values become column names through
    /// `sanitizer`; values that sanitize to the same name share a column.
    /// Null pivot values land in [`NULL_PIVOT_COLUMN`].
    pub fn from_counts(key_field: &str, counts: &[GroupCount], sanitizer: NameSanitizer) -> Self {
        let column_of = |pivot: &AttributeValue| match pivot.key() {
            Some(value) => sanitizer.sanitize(&value),
            None => NULL_PIVOT_COLUMN.to_string(),
        };

        let columns: Vec<String> = counts
            .iter()
            .map(|group| column_of(&group.pivot))
            .unique()
            .sorted()
            .collect();

        let mut rows: IndexMap<Option<String>, PivotRow> = IndexMap::new();
        for group in counts {
            let row = rows.entry(group.key.key()).or_insert_with(|| PivotRow {
                category_key: group.key.clone(),
                columns: columns.iter().map(|column| (column.clone(), 0)).collect(),
            });
            if let Some(count) = row.columns.get_mut(&column_of(&group.pivot)) {
                *count += group.count;
            }
        }

        Self {
            key_field: key_field.to_string(),
            columns,
            rows: rows.into_values().collect(),
        }
    }

    /// Count of `column` in the row whose key is `key`
    pub fn count(&self, key: &str, column: &str) -> Option<u64> {
        self.rows
            .iter()
            .find(|row| row.category_key.key().as_deref() == Some(key))
            .and_then(|row| row.columns.get(column).copied())
    }

    /// Drops a column from the table and every row. Returns whether it
    /// existed.
    pub fn remove_column(&mut self, column: &str) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c != column);
        for row in &mut self.rows {
            row.columns.shift_remove(column);
        }
        self.columns.len() != before
    }

    /// Writes the table as CSV: the key field, then the pivot columns.
    ///
    /// # Errors
    ///
    /// Any write error of `writer`.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), Error> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(std::iter::once(&self.key_field).chain(&self.columns))?;
        for row in &self.rows {
            let mut record = Vec::with_capacity(self.columns.len() + 1);
            record.push(row.category_key.to_string());
            record.extend(
                self.columns
                    .iter()
                    .map(|column| row.columns.get(column).copied().unwrap_or(0).to_string()),
            );
            csv.write_record(&record)?;
        }
        csv.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PivotOptions {
    /// Reject polygon sets where a key value appears more than once
    pub validate_keys: bool,
    pub sanitizer: NameSanitizer,
}

/// Joins `points` to `polygons`, counts them per `key_field` and
/// `pivot_field` value and pivots the counts. The placeholder column is
/// already removed from the returned table.
///
/// # Errors
///
/// `MissingField` when either field is missing.
pub fn build_pivot_table(
    polygons: &FeatureCollection,
    key_field: &str,
    points: &FeatureCollection,
    pivot_field: &str,
    sanitizer: NameSanitizer,
) -> Result<PivotTable, Error> {
    polygons.require_field(key_field, "polygons")?;
    points.require_field(pivot_field, "points")?;

    static NULL: AttributeValue = AttributeValue::Null;
    let matches = one_to_many_join(polygons, points);
    debug!("Spatial join produced {} rows", matches.len());

    let rows = matches.iter().filter_map(|m| {
        let polygon = polygons.get(m.target)?;
        let pivot = match m.join {
            Some(idx) => points.get(idx).map_or(&NULL, |point| point.get(pivot_field)),
            None => &NULL,
        };
        Some((polygon.get(key_field), pivot))
    });
    let counts = group_counts(rows);

    let mut table = PivotTable::from_counts(key_field, &counts, sanitizer);
    if table.remove_column(NULL_PIVOT_COLUMN) {
        debug!("Removed placeholder column '{NULL_PIVOT_COLUMN}'");
    }
    Ok(table)
}

/// Joins the pivot table onto `polygons` by key and returns the result as
/// a new collection.
///
/// Pivot columns whose name is taken get a numeric suffix. The table's key
/// column is not carried over. Polygons with no row, or with a null key,
/// get 0 in every pivot column.
pub fn rejoin(polygons: &FeatureCollection, table: &PivotTable) -> FeatureCollection {
    let mut fields = polygons.fields().to_vec();
    // the key column of the table would land next to the polygon key
    let shadow_key = unique_field_name(&fields, &table.key_field);
    fields.push(shadow_key);
    let renamed: Vec<(String, String)> = table
        .columns
        .iter()
        .map(|column| {
            let name = unique_field_name(&fields, column);
            fields.push(name.clone());
            (column.clone(), name)
        })
        .collect();

    let by_key: HashMap<String, &PivotRow> = table
        .rows
        .iter()
        .filter_map(|row| row.category_key.key().map(|key| (key, row)))
        .collect();

    let mut output = FeatureCollection::with_fields(
        polygons
            .fields()
            .iter()
            .cloned()
            .chain(renamed.iter().map(|(_, name)| name.clone())),
    );
    let mut unmatched = 0usize;

    for polygon in polygons {
        let row = polygon
            .get(&table.key_field)
            .key()
            .and_then(|key| by_key.get(&key).copied());
        if row.is_none() {
            unmatched += 1;
        }

        let mut attributes = polygon.attributes.clone();
        for (column, name) in &renamed {
            let count = row
                .and_then(|row| row.columns.get(column).copied())
                .unwrap_or(0);
            attributes.insert(name.clone(), AttributeValue::from(count));
        }
        output.push(polygon.geometry.clone(), attributes);
    }

    if unmatched > 0 {
        debug!("{unmatched} polygons had no pivot row and were filled with zeros");
    }
    output
}

/// Counts `points` per polygon and `pivot_field` value and returns a copy
/// of `polygons` with one count field per pivot value.
///
/// # Errors
///
/// `MissingField` when either field is missing, `DuplicateKey` when
/// `options.validate_keys` is set and a key value repeats.
pub fn aggregate_points(
    polygons: &FeatureCollection,
    key_field: &str,
    points: &FeatureCollection,
    pivot_field: &str,
    options: PivotOptions,
) -> Result<FeatureCollection, Error> {
    let table = build_pivot_table(polygons, key_field, points, pivot_field, options.sanitizer)?;

    if options.validate_keys {
        ensure_unique_keys(polygons, key_field)?;
    } else if has_duplicate_keys(polygons, key_field) {
        warn!("Field '{key_field}' has repeated values, counts are copied to every duplicate");
    }

    let joined = rejoin(polygons, &table);
    info!(
        "Joined {} pivot columns onto {} polygons",
        table.columns.len(),
        joined.len()
    );
    Ok(joined)
}

/// [`aggregate_points`] replacing `polygons` with the joined collection.
///
/// # Errors
///
/// Same as [`aggregate_points`]; `polygons` is left untouched on error.
pub fn aggregate_points_in_place(
    polygons: &mut FeatureCollection,
    key_field: &str,
    points: &FeatureCollection,
    pivot_field: &str,
    options: PivotOptions,
) -> Result<(), Error> {
    *polygons = aggregate_points(polygons, key_field, points, pivot_field, options)?;
    Ok(())
}

fn ensure_unique_keys(polygons: &FeatureCollection, key_field: &str) -> Result<(), Error> {
    let mut seen = HashSet::new();
    for polygon in polygons {
        if let Some(key) = polygon.get(key_field).key()
            && !seen.insert(key.clone())
        {
            return Err(Error::DuplicateKey {
                field: key_field.to_string(),
                value: key,
            });
        }
    }
    Ok(())
}

fn has_duplicate_keys(polygons: &FeatureCollection, key_field: &str) -> bool {
    ensure_unique_keys(polygons, key_field).is_err()
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, Rect, coord, point};

    use super::*;
    use crate::Attributes;

    fn square(collection: &mut FeatureCollection, x: f64, key: &str) {
        let mut attributes = Attributes::new();
        attributes.insert("zone".into(), key.into());
        collection.push(
            Geometry::Polygon(
                Rect::new(coord! { x: x, y: 0.0 }, coord! { x: x + 10.0, y: 10.0 }).to_polygon(),
            ),
            attributes,
        );
    }

    fn category(collection: &mut FeatureCollection, x: f64, y: f64, value: AttributeValue) {
        let mut attributes = Attributes::new();
        attributes.insert("kind".into(), value);
        collection.push(Geometry::Point(point!(x: x, y: y)), attributes);
    }

    fn fixture() -> (FeatureCollection, FeatureCollection) {
        let mut polygons = FeatureCollection::new();
        square(&mut polygons, 0.0, "north");
        square(&mut polygons, 20.0, "south");
        square(&mut polygons, 40.0, "empty");

        let mut points = FeatureCollection::new();
        category(&mut points, 1.0, 1.0, "A".into());
        category(&mut points, 2.0, 2.0, "A".into());
        category(&mut points, 3.0, 3.0, "B".into());
        category(&mut points, 25.0, 5.0, "C".into());
        category(&mut points, 26.0, 5.0, AttributeValue::Null);
        (polygons, points)
    }

    #[test]
    fn counts_group_by_key_and_value() {
        let a = AttributeValue::from("a");
        let x = AttributeValue::from("x");
        let y = AttributeValue::from("y");
        let counts = group_counts([(&a, &x), (&a, &x), (&a, &y)]);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].count, 1);
    }

    #[test]
    fn missing_combinations_are_zero() {
        let (polygons, points) = fixture();
        let table =
            build_pivot_table(&polygons, "zone", &points, "kind", NameSanitizer::default())
                .unwrap();

        assert_eq!(table.columns, vec!["A", "B", "C"]);
        assert_eq!(table.count("north", "A"), Some(2));
        assert_eq!(table.count("north", "B"), Some(1));
        assert_eq!(table.count("north", "C"), Some(0));
        assert_eq!(table.count("south", "C"), Some(1));
    }

    #[test]
    fn rejoin_drops_placeholder_and_shadow_key() {
        let (polygons, points) = fixture();
        let joined =
            aggregate_points(&polygons, "zone", &points, "kind", PivotOptions::default()).unwrap();

        assert!(!joined.has_field(NULL_PIVOT_COLUMN));
        assert!(!joined.has_field("zone_1"));
        assert_eq!(joined.fields(), ["zone", "A", "B", "C"]);

        let empty = joined.get(2).unwrap();
        assert_eq!(empty.get("zone"), &AttributeValue::from("empty"));
        for column in ["A", "B", "C"] {
            assert_eq!(empty.get(column), &AttributeValue::Integer(0));
        }

        // input is untouched
        assert_eq!(polygons.fields(), ["zone"]);
    }

    #[test]
    fn literal_placeholder_value_is_removed() {
        let (polygons, mut points) = fixture();
        category(&mut points, 4.0, 4.0, "F".into());
        let joined =
            aggregate_points(&polygons, "zone", &points, "kind", PivotOptions::default()).unwrap();
        assert!(!joined.has_field("F"));
    }

    #[test]
    fn colliding_pivot_column_gets_suffix() {
        let (polygons, mut points) = fixture();
        category(&mut points, 5.0, 5.0, "zone".into());
        let joined =
            aggregate_points(&polygons, "zone", &points, "kind", PivotOptions::default()).unwrap();

        // zone_1 is reserved for the dropped key column
        assert!(joined.has_field("zone_2"));
        assert!(!joined.has_field("zone_1"));
        assert_eq!(joined.get(0).unwrap().get("zone_2"), &AttributeValue::Integer(1));
    }

    #[test]
    fn duplicate_keys_rejected_when_validated() {
        let (mut polygons, points) = fixture();
        square(&mut polygons, 60.0, "north");
        let options = PivotOptions {
            validate_keys: true,
            ..PivotOptions::default()
        };

        let err = aggregate_points(&polygons, "zone", &points, "kind", options).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { ref value, .. } if value == "north"));

        assert!(aggregate_points(&polygons, "zone", &points, "kind", PivotOptions::default()).is_ok());
    }

    #[test]
    fn in_place_replaces_collection() {
        let (mut polygons, points) = fixture();
        aggregate_points_in_place(&mut polygons, "zone", &points, "kind", PivotOptions::default())
            .unwrap();
        assert!(polygons.has_field("A"));
        assert_eq!(polygons.len(), 3);
    }

    #[test]
    fn missing_pivot_field_is_reported() {
        let (polygons, points) = fixture();
        let err = aggregate_points(&polygons, "zone", &points, "species", PivotOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "species"));
    }

    #[test]
    fn csv_has_key_then_columns() {
        let (polygons, points) = fixture();
        let table =
            build_pivot_table(&polygons, "zone", &points, "kind", NameSanitizer::default())
                .unwrap();
        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("zone,A,B,C"));
        assert_eq!(lines.next(), Some("north,2,1,0"));
    }
}
