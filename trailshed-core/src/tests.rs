//! Tests across the extraction, solving and aggregation stages.

use geo::{Geometry, LineString, line_string, point};

use crate::network::{SolverSettings, StreetNetwork, StreetNetworkBuilder};
use crate::{AttributeValue, Attributes, FeatureCollection, TravelMode, TravelModes};

const NAMING_FIELD: &str = "TrailName";

fn trail(collection: &mut FeatureCollection, line: LineString<f64>, name: &str) {
    let mut attributes = Attributes::new();
    attributes.insert(NAMING_FIELD.into(), name.into());
    collection.push(Geometry::LineString(line), attributes);
}

fn junction(collection: &mut FeatureCollection, x: f64, y: f64, id: i64) {
    let mut attributes = Attributes::new();
    attributes.insert("jid".into(), AttributeValue::from(id));
    collection.push(Geometry::Point(point!(x: x, y: y)), attributes);
}

/// Trail A along y = 0, trail B along y = 500
fn two_trails() -> FeatureCollection {
    let mut trails = FeatureCollection::new();
    trail(&mut trails, line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)], "Trail A");
    trail(&mut trails, line_string![(x: 0.0, y: 500.0), (x: 1000.0, y: 500.0)], "Trail B");
    trails
}

/// Three junctions near A, one near B, one near neither
fn five_junctions() -> FeatureCollection {
    let mut junctions = FeatureCollection::new();
    junction(&mut junctions, 100.0, 10.0, 1);
    junction(&mut junctions, 500.0, -20.0, 2);
    junction(&mut junctions, 900.0, 40.0, 3);
    junction(&mut junctions, 300.0, 530.0, 4);
    junction(&mut junctions, 500.0, 250.0, 5);
    junctions
}

/// Street grid over x 0..=1000, y 0..=500 with 100 m blocks
fn street_grid() -> StreetNetwork {
    let mut builder = StreetNetworkBuilder::new().with_merge_tolerance(0.5);
    for row in 0..=5 {
        for col in 0..=10 {
            let (x, y) = (f64::from(col) * 100.0, f64::from(row) * 100.0);
            if col < 10 {
                builder.add_line(line_string![(x: x, y: y), (x: x + 100.0, y: y)], None);
            }
            if row < 5 {
                builder.add_line(line_string![(x: x, y: y), (x: x, y: y + 100.0)], None);
            }
        }
    }
    let modes = TravelModes::new(vec![TravelMode::new("Walking Time", 6.0)]).unwrap();
    builder.build(modes, SolverSettings::default())
}

#[cfg(test)]
mod extraction {
    use super::*;
    use crate::algo::SourcePointExtractor;
    use crate::naming::{CollisionPolicy, CollisionResolution};

    #[test]
    fn junctions_split_by_trail() {
        let extraction = SourcePointExtractor::new(50.0)
            .extract(&two_trails(), &five_junctions(), NAMING_FIELD)
            .unwrap();

        let sets = &extraction.facility_sets;
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].name, "Trail_A");
        assert_eq!(sets[0].len(), 3);
        assert_eq!(sets[1].name, "Trail_B");
        assert_eq!(sets[1].len(), 1);
        assert_eq!(sets[1].points[0].attributes["jid"], AttributeValue::Integer(4));
        assert!(extraction.collisions.is_empty());
    }

    #[test]
    fn every_trail_yields_a_set() {
        let mut trails = two_trails();
        trail(&mut trails, line_string![(x: 5000.0, y: 5000.0), (x: 6000.0, y: 5000.0)], "Far");

        let extraction = SourcePointExtractor::new(50.0)
            .extract(&trails, &five_junctions(), NAMING_FIELD)
            .unwrap();

        assert_eq!(extraction.facility_sets.len(), 3);
        assert_eq!(extraction.empty_sets().count(), 1);
        assert_eq!(extraction.facility_sets[2].trail_fid, Some(2));
    }

    #[test]
    fn invalid_search_distance_rejected() {
        for distance in [-50.0, f64::NAN, f64::INFINITY] {
            let result = SourcePointExtractor::new(distance).extract(
                &two_trails(),
                &five_junctions(),
                NAMING_FIELD,
            );
            assert!(
                matches!(result, Err(crate::Error::InvalidConfig(_))),
                "distance {distance}"
            );
        }

        let result = SourcePointExtractor::new(-50.0).extract_segments(&[], &[]);
        assert!(matches!(result, Err(crate::Error::InvalidConfig(_))));

        let zero = SourcePointExtractor::new(0.0)
            .extract(&two_trails(), &five_junctions(), NAMING_FIELD)
            .unwrap();
        assert_eq!(zero.facility_sets.len(), 2);
    }

    #[test]
    fn search_distance_is_inclusive() {
        let mut junctions = FeatureCollection::new();
        junction(&mut junctions, 200.0, 50.0, 1);
        junction(&mut junctions, 400.0, 50.001, 2);

        let extraction = SourcePointExtractor::new(50.0)
            .extract(&two_trails(), &junctions, NAMING_FIELD)
            .unwrap();
        let selected: Vec<_> = extraction.facility_sets[0]
            .points
            .iter()
            .map(|p| p.fid)
            .collect();
        assert_eq!(selected, vec![0]);
    }

    #[test]
    fn junction_between_trails_joins_both() {
        let mut trails = two_trails();
        trail(&mut trails, line_string![(x: 0.0, y: 60.0), (x: 1000.0, y: 60.0)], "Trail C");
        let mut junctions = FeatureCollection::new();
        junction(&mut junctions, 500.0, 30.0, 1);

        let extraction = SourcePointExtractor::new(50.0)
            .extract(&trails, &junctions, NAMING_FIELD)
            .unwrap();
        let counts: Vec<_> = extraction.facility_sets.iter().map(|s| s.len()).collect();
        assert_eq!(counts, vec![1, 0, 1]);
    }

    #[test]
    fn duplicate_trail_names_are_reported() {
        let mut trails = two_trails();
        trail(&mut trails, line_string![(x: 0.0, y: 900.0), (x: 10.0, y: 900.0)], "Trail-A");

        let extraction = SourcePointExtractor::new(50.0)
            .extract(&trails, &five_junctions(), NAMING_FIELD)
            .unwrap();
        assert_eq!(extraction.facility_sets[2].name, "Trail_A_2");
        assert_eq!(extraction.collisions.len(), 1);
        assert_eq!(
            extraction.collisions[0].resolution,
            CollisionResolution::Renamed("Trail_A_2".into())
        );

        let aborted = SourcePointExtractor::new(50.0)
            .with_collision_policy(CollisionPolicy::Abort)
            .extract(&trails, &five_junctions(), NAMING_FIELD);
        assert!(matches!(aborted, Err(crate::Error::NameCollision { .. })));
    }

    #[test]
    fn missing_naming_field() {
        let err = SourcePointExtractor::new(50.0)
            .extract(&two_trails(), &five_junctions(), "Label")
            .unwrap_err();
        assert!(err.is_configuration());
    }
}

#[cfg(test)]
mod coverage {
    use super::*;
    use crate::algo::{
        BOOKKEEPING_FIELDS, ServiceAreaRunner, SolveOptions, SourcePointExtractor,
        aggregate_coverage, merge_successful,
    };
    use crate::{Cutoffs, SolveFailure};

    fn solved(trails: &FeatureCollection) -> Vec<crate::algo::ServiceAreaResult> {
        let network = street_grid();
        let cutoffs = Cutoffs::new(vec![2.0]).unwrap();
        let runner =
            ServiceAreaRunner::new(&network, "Walking Time", &cutoffs, SolveOptions::default())
                .unwrap();
        let extraction = SourcePointExtractor::new(50.0)
            .extract(trails, &five_junctions(), NAMING_FIELD)
            .unwrap();
        runner.solve_all(&extraction.facility_sets, true)
    }

    fn three_trails() -> FeatureCollection {
        let mut trails = two_trails();
        trail(&mut trails, line_string![(x: 5000.0, y: 5000.0), (x: 6000.0, y: 5000.0)], "Far");
        trails
    }

    #[test]
    fn empty_set_excluded_from_merge() {
        let results = solved(&three_trails());
        assert_eq!(results.len(), 3);
        assert_eq!(results[2].failure(), Some(&SolveFailure::NoFacilities));

        let (merged, merged_sets, failed_sets) = merge_successful("Walking Time", &results);
        assert_eq!(merged_sets, vec!["Trail_A", "Trail_B"]);
        assert_eq!(failed_sets, vec![("Far".to_string(), SolveFailure::NoFacilities)]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn polygons_take_their_trail_attributes() {
        let trails = three_trails();
        let results = solved(&trails);
        let layer = aggregate_coverage("Walking Time", &results, &trails);

        assert_eq!(layer.travel_mode, "Walking Time");
        assert_eq!(layer.features.len(), 2);
        assert_eq!(layer.features.fields(), [NAMING_FIELD]);
        for field in BOOKKEEPING_FIELDS {
            assert!(!layer.features.has_field(field), "{field} left behind");
        }

        let names: Vec<_> = layer
            .features
            .iter()
            .map(|f| f.get(NAMING_FIELD).to_string())
            .collect();
        assert_eq!(names, vec!["Trail A", "Trail B"]);
    }

    #[test]
    fn unknown_travel_mode_is_fatal() {
        let network = street_grid();
        let cutoffs = Cutoffs::new(vec![2.0]).unwrap();
        let runner = ServiceAreaRunner::new(&network, "Driving", &cutoffs, SolveOptions::default());
        assert!(matches!(runner, Err(crate::Error::UnknownTravelMode(_))));
    }

    #[test]
    fn result_rows_name_the_set_and_break() {
        let results = solved(&two_trails());
        let polygons = results[0].polygons().unwrap();
        let feature = polygons.get(0).unwrap();
        assert_eq!(feature.get("Name"), &AttributeValue::from("Trail_A : 0 - 2"));
        assert_eq!(feature.get("ToBreak"), &AttributeValue::Float(2.0));
    }
}

#[cfg(test)]
mod pipeline {
    use super::*;
    use crate::algo::{load_facility_sets, run_service_area_analysis};
    use crate::loading::ServiceAreaConfig;
    use crate::store::{FeatureStore, MemoryStore};
    use crate::{Error, SolveFailure};

    fn config(modes: &[&str]) -> ServiceAreaConfig {
        ServiceAreaConfig::new(
            NAMING_FIELD,
            50.0,
            modes.iter().map(ToString::to_string).collect(),
            vec![2.0],
        )
    }

    #[test]
    fn writes_every_stage() {
        let mut trails = two_trails();
        trail(&mut trails, line_string![(x: 5000.0, y: 5000.0), (x: 6000.0, y: 5000.0)], "Far");
        let points = MemoryStore::new();
        let results = MemoryStore::new();

        let report = run_service_area_analysis(
            &config(&["Walking Time"]),
            &trails,
            &five_junctions(),
            &street_grid(),
            &points,
            &results,
        )
        .unwrap();

        assert_eq!(
            points.list("").unwrap(),
            vec!["Far_source", "Trail_A_source", "Trail_B_source"]
        );
        assert_eq!(
            results.list("Walking_TimeResults").unwrap(),
            vec!["ServiceArea_Trail_A", "ServiceArea_Trail_B"]
        );
        assert!(results.exists("", "Walking_Time_ServiceArea"));

        assert_eq!(report.layers.len(), 1);
        assert_eq!(report.layers[0].features.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].facility_set, "Far");
        assert_eq!(report.failures[0].failure, SolveFailure::NoFacilities);
    }

    #[test]
    fn unknown_mode_fails_before_writing() {
        let points = MemoryStore::new();
        let results = MemoryStore::new();

        let err = run_service_area_analysis(
            &config(&["Walking Time", "Cycling"]),
            &two_trails(),
            &five_junctions(),
            &street_grid(),
            &points,
            &results,
        )
        .unwrap_err();

        assert!(matches!(err, Error::UnknownTravelMode(ref mode) if mode == "Cycling"));
        assert!(points.is_empty());
        assert!(results.is_empty());
    }

    #[test]
    fn invalid_cutoffs_rejected() {
        let mut config = config(&["Walking Time"]);
        config.cutoffs = vec![0.0];
        let store = MemoryStore::new();

        let err = run_service_area_analysis(
            &config,
            &two_trails(),
            &five_junctions(),
            &street_grid(),
            &store,
            &store,
        )
        .unwrap_err();
        assert!(err.is_configuration());
        assert!(store.is_empty());
    }

    #[test]
    fn persisted_sets_reload() {
        let points = MemoryStore::new();
        let results = MemoryStore::new();
        run_service_area_analysis(
            &config(&["Walking Time"]),
            &two_trails(),
            &five_junctions(),
            &street_grid(),
            &points,
            &results,
        )
        .unwrap();

        let sets = load_facility_sets(&points, "").unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].name, "Trail_A");
        assert_eq!(sets[0].len(), 3);
        assert_eq!(sets[1].points[0].attributes["jid"], AttributeValue::Integer(4));
    }
}
