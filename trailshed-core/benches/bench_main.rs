use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use geo::{Geometry, line_string, point};

use trailshed_core::algo::{ServiceAreaRunner, SolveOptions, SourcePointExtractor};
use trailshed_core::network::{SolverSettings, StreetNetwork, StreetNetworkBuilder};
use trailshed_core::{Attributes, Cutoffs, FeatureCollection, TravelMode, TravelModes};

const SPACING: f64 = 100.0;

fn street_grid(n: u32) -> StreetNetwork {
    let mut builder = StreetNetworkBuilder::new().with_merge_tolerance(0.5);
    for row in 0..n {
        for col in 0..n {
            let (x, y) = (f64::from(col) * SPACING, f64::from(row) * SPACING);
            if col + 1 < n {
                builder.add_line(line_string![(x: x, y: y), (x: x + SPACING, y: y)], None);
            }
            if row + 1 < n {
                builder.add_line(line_string![(x: x, y: y), (x: x, y: y + SPACING)], None);
            }
        }
    }
    let modes = TravelModes::new(vec![TravelMode::new("walk", 5.0)]).expect("valid mode");
    builder.build(modes, SolverSettings::default())
}

/// One trail per grid row, named after the row
fn trails(n: u32) -> FeatureCollection {
    let mut trails = FeatureCollection::new();
    let length = f64::from(n - 1) * SPACING;
    for row in 0..n {
        let y = f64::from(row) * SPACING;
        let mut attributes = Attributes::new();
        attributes.insert("name".into(), format!("Row {row}").into());
        trails.push(
            Geometry::LineString(line_string![(x: 0.0, y: y), (x: length, y: y)]),
            attributes,
        );
    }
    trails
}

/// Junctions at every grid node, slightly off the street
fn junctions(n: u32) -> FeatureCollection {
    let mut junctions = FeatureCollection::new();
    for row in 0..n {
        for col in 0..n {
            junctions.push(
                Geometry::Point(point!(
                    x: f64::from(col) * SPACING,
                    y: f64::from(row) * SPACING + 3.0
                )),
                Attributes::new(),
            );
        }
    }
    junctions
}

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_source_points");
    for n in [10u32, 50] {
        let (lines, points) = (trails(n), junctions(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                black_box(
                    SourcePointExtractor::new(10.0)
                        .extract(&lines, &points, "name")
                        .expect("extraction"),
                )
            });
        });
    }
    group.finish();
}

fn bench_service_areas(c: &mut Criterion) {
    let n = 30;
    let network = street_grid(n);
    let extraction = SourcePointExtractor::new(10.0)
        .extract(&trails(n), &junctions(n), "name")
        .expect("extraction");
    let cutoffs = Cutoffs::new(vec![5.0, 10.0]).expect("valid cutoffs");
    let runner = ServiceAreaRunner::new(&network, "walk", &cutoffs, SolveOptions::default())
        .expect("known mode");

    let mut group = c.benchmark_group("solve_service_areas");
    group.sample_size(10);
    for parallel in [false, true] {
        group.bench_with_input(
            BenchmarkId::from_parameter(if parallel { "parallel" } else { "sequential" }),
            &parallel,
            |b, &parallel| {
                b.iter(|| black_box(runner.solve_all(&extraction.facility_sets, parallel)));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_extraction, bench_service_areas);
criterion_main!(benches);
