//! Spatial joins between feature collections

use geo::Intersects;
use log::trace;

use super::index::{candidates, envelope_index};
use super::overlay::{overlap_measure, to_multi_polygon};
use crate::{AttributeValue, Attributes, FeatureCollection};

pub const JOIN_COUNT_FIELD: &str = "Join_Count";
pub const TARGET_FID_FIELD: &str = "TARGET_FID";

/// Name under which `field` can be added next to `existing` fields:
/// the name itself, or the first free `<field>_<n>` starting at 1.
pub fn unique_field_name(existing: &[String], field: &str) -> String {
    if !existing.iter().any(|f| f == field) {
        return field.to_string();
    }
    (1..)
        .map(|n| format!("{field}_{n}"))
        .find(|candidate| !existing.iter().any(|f| f == candidate))
        .unwrap_or_default()
}

/// Joins to each target the attributes of the one join feature it
/// overlaps most.
///
/// The output keeps every target feature and its geometry, prefixed by
/// `Join_Count` (0 or 1) and `TARGET_FID`, followed by the target fields and
/// the join fields. Join fields whose name is already taken get a numeric
/// suffix. Equal overlaps resolve to the lowest join fid; targets that
/// overlap nothing get nulls.
pub fn largest_overlap_join(
    targets: &FeatureCollection,
    joins: &FeatureCollection,
) -> FeatureCollection {
    let mut fields = vec![JOIN_COUNT_FIELD.to_string(), TARGET_FID_FIELD.to_string()];
    fields.extend(targets.fields().iter().cloned());
    let join_fields: Vec<(String, String)> = joins
        .fields()
        .iter()
        .map(|field| {
            let renamed = unique_field_name(&fields, field);
            fields.push(renamed.clone());
            (field.clone(), renamed)
        })
        .collect();

    let index = envelope_index(joins.iter().map(|f| &f.geometry));
    let mut output = FeatureCollection::with_fields(fields);

    for target in targets {
        let best = to_multi_polygon(&target.geometry).and_then(|polygon| {
            candidates(&index, &target.geometry)
                .into_iter()
                .map(|idx| (idx, overlap_measure(&polygon, &joins.features()[idx].geometry)))
                .filter(|(_, overlap)| *overlap > 0.0)
                .fold(None, |best: Option<(usize, f64)>, (idx, overlap)| match best {
                    Some((_, top)) if top >= overlap => best,
                    _ => Some((idx, overlap)),
                })
        });

        let mut attributes = Attributes::new();
        attributes.insert(
            JOIN_COUNT_FIELD.to_string(),
            AttributeValue::from(usize::from(best.is_some())),
        );
        attributes.insert(TARGET_FID_FIELD.to_string(), AttributeValue::from(target.fid));
        attributes.extend(target.attributes.clone());

        if let Some((idx, overlap)) = best {
            trace!("Target {} joined to {idx} with overlap {overlap}", target.fid);
            let matched = &joins.features()[idx];
            for (field, renamed) in &join_fields {
                attributes.insert(renamed.clone(), matched.get(field).clone());
            }
        }

        output.push(target.geometry.clone(), attributes);
    }

    output
}

/// One row of a one-to-many join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinMatch {
    pub target: usize,
    /// `None` for a target no join feature intersects
    pub join: Option<usize>,
}

/// Pairs every target with every join feature it intersects (boundary
/// inclusive). Targets without a partner appear once with `join: None`.
/// Rows are ordered by target, then join fid.
pub fn one_to_many_join(targets: &FeatureCollection, joins: &FeatureCollection) -> Vec<JoinMatch> {
    let index = envelope_index(joins.iter().map(|f| &f.geometry));
    let mut matches = Vec::new();

    for target in targets {
        let before = matches.len();
        matches.extend(
            candidates(&index, &target.geometry)
                .into_iter()
                .filter(|&idx| target.geometry.intersects(&joins.features()[idx].geometry))
                .map(|idx| JoinMatch {
                    target: target.fid,
                    join: Some(idx),
                }),
        );
        if matches.len() == before {
            matches.push(JoinMatch {
                target: target.fid,
                join: None,
            });
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, Rect, coord, line_string, point};

    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry<f64> {
        Geometry::Polygon(Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 }).to_polygon())
    }

    fn named(collection: &mut FeatureCollection, geometry: Geometry<f64>, name: &str) {
        let mut attributes = Attributes::new();
        attributes.insert("name".into(), name.into());
        collection.push(geometry, attributes);
    }

    #[test]
    fn picks_largest_area() {
        let mut targets = FeatureCollection::new();
        targets.push(rect(0.0, 0.0, 10.0, 10.0), Attributes::new());

        let mut joins = FeatureCollection::new();
        // overlap area 10
        named(&mut joins, rect(9.0, 0.0, 20.0, 10.0), "small");
        // overlap area 20
        named(&mut joins, rect(-5.0, 0.0, 2.0, 10.0), "large");

        let joined = largest_overlap_join(&targets, &joins);
        let feature = joined.get(0).unwrap();
        assert_eq!(feature.get("name"), &AttributeValue::from("large"));
        assert_eq!(feature.get(JOIN_COUNT_FIELD), &AttributeValue::Integer(1));
        assert_eq!(feature.get(TARGET_FID_FIELD), &AttributeValue::Integer(0));
    }

    #[test]
    fn picks_longest_line_and_breaks_ties_by_fid() {
        let mut targets = FeatureCollection::new();
        targets.push(rect(0.0, 0.0, 10.0, 10.0), Attributes::new());

        let mut joins = FeatureCollection::new();
        named(
            &mut joins,
            Geometry::LineString(line_string![(x: 1.0, y: 1.0), (x: 5.0, y: 1.0)]),
            "first",
        );
        named(
            &mut joins,
            Geometry::LineString(line_string![(x: 1.0, y: 5.0), (x: 5.0, y: 5.0)]),
            "second",
        );

        let joined = largest_overlap_join(&targets, &joins);
        assert_eq!(joined.get(0).unwrap().get("name"), &AttributeValue::from("first"));
    }

    #[test]
    fn unmatched_target_kept_with_nulls_and_collisions_renamed() {
        let mut targets = FeatureCollection::new();
        named(&mut targets, rect(0.0, 0.0, 1.0, 1.0), "area");

        let mut joins = FeatureCollection::new();
        named(
            &mut joins,
            Geometry::LineString(line_string![(x: 50.0, y: 50.0), (x: 60.0, y: 50.0)]),
            "far",
        );

        let joined = largest_overlap_join(&targets, &joins);
        assert!(joined.has_field("name_1"));
        let feature = joined.get(0).unwrap();
        assert_eq!(feature.get("name"), &AttributeValue::from("area"));
        assert!(feature.get("name_1").is_null());
        assert_eq!(feature.get(JOIN_COUNT_FIELD), &AttributeValue::Integer(0));
    }

    #[test]
    fn one_to_many_keeps_empty_targets() {
        let mut targets = FeatureCollection::new();
        targets.push(rect(0.0, 0.0, 10.0, 10.0), Attributes::new());
        targets.push(rect(20.0, 20.0, 30.0, 30.0), Attributes::new());

        let mut points = FeatureCollection::new();
        points.push(Geometry::Point(point!(x: 1.0, y: 1.0)), Attributes::new());
        points.push(Geometry::Point(point!(x: 10.0, y: 5.0)), Attributes::new());
        points.push(Geometry::Point(point!(x: 15.0, y: 15.0)), Attributes::new());

        let matches = one_to_many_join(&targets, &points);
        assert_eq!(
            matches,
            vec![
                JoinMatch { target: 0, join: Some(0) },
                JoinMatch { target: 0, join: Some(1) },
                JoinMatch { target: 1, join: None },
            ]
        );
    }
}
