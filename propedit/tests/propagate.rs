use nalgebra::Vector3;
use propedit::{
    ControlPoint, DistanceMode, ProjectionAxis, PropagateConfig,
    compute_proportional_distances, point::sort_selected_first,
    topology::Topology,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn random_points(rng: &mut StdRng, n: usize, selected: f64) -> Vec<ControlPoint> {
    (0..n)
        .map(|_| {
            let pos = Vector3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            );
            ControlPoint::new(pos, rng.gen_bool(selected))
        })
        .collect()
}

fn brute_force(
    points: &[ControlPoint],
    projection: Option<&ProjectionAxis>,
) -> Vec<Option<f32>> {
    let flat = |v: Vector3<f32>| match projection {
        Some(a) => a.project(&v),
        None => v,
    };
    points
        .iter()
        .map(|p| {
            if p.selected {
                return Some(0.0);
            }
            points
                .iter()
                .filter(|s| s.selected)
                .map(|s| (flat(s.pos) - flat(p.pos)).norm())
                .min_by(|a, b| a.total_cmp(b))
        })
        .collect()
}

fn assert_close(actual: &[ControlPoint], expected: &[Option<f32>]) {
    for (i, (p, e)) in actual.iter().zip(expected).enumerate() {
        match (p.distance, e) {
            (Some(a), Some(b)) => {
                assert!((a - b).abs() < 1e-5, "point {i}: {a} != {b}")
            }
            (a, b) => assert_eq!(a, *b, "point {i}"),
        }
    }
}

#[test]
fn matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(1234);
    for n in [10, 100, 10_000] {
        let mut points = random_points(&mut rng, n, 0.1);
        let expected = brute_force(&points, None);
        compute_proportional_distances(&mut points, None);
        assert_close(&points, &expected);
    }
}

#[test]
fn matches_brute_force_projected() {
    let mut rng = StdRng::seed_from_u64(99);
    let axis = ProjectionAxis::new(Vector3::new(1.0, -2.0, 0.5)).unwrap();
    let mut points = random_points(&mut rng, 1000, 0.05);
    let expected = brute_force(&points, Some(&axis));
    compute_proportional_distances(&mut points, Some(&axis));
    assert_close(&points, &expected);
}

#[test]
fn distances_are_non_negative_and_selection_is_zero() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut points = random_points(&mut rng, 2000, 0.2);
    assert!(points.iter().any(|p| p.selected));
    compute_proportional_distances(&mut points, None);
    for p in &points {
        let d = p.distance.unwrap();
        if p.selected {
            assert_eq!(d, 0.0);
        } else {
            assert!(d >= 0.0);
        }
    }
}

#[test]
fn single_selection_is_exact() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut points = random_points(&mut rng, 500, 0.0);
    let target = Vector3::new(0.5, -1.0, 2.0);
    points.push(ControlPoint::new(target, true));
    compute_proportional_distances(&mut points, None);
    for p in points.iter().filter(|p| !p.selected) {
        assert_eq!(p.distance, Some((p.pos - target).norm()));
    }
}

#[test]
fn idempotent() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut points = random_points(&mut rng, 1000, 0.1);
    compute_proportional_distances(&mut points, None);
    let first: Vec<_> = points.iter().map(|p| p.distance).collect();
    compute_proportional_distances(&mut points, None);
    let second: Vec<_> = points.iter().map(|p| p.distance).collect();
    assert_eq!(first, second);
}

#[test]
fn order_does_not_matter() {
    let mut rng = StdRng::seed_from_u64(10);
    let mut points = random_points(&mut rng, 300, 0.1);
    let mut sorted = points.clone();
    sort_selected_first(&mut sorted);

    compute_proportional_distances(&mut points, None);
    compute_proportional_distances(&mut sorted, None);

    let mut a: Vec<f32> = points.iter().filter_map(|p| p.distance).collect();
    let mut b: Vec<f32> = sorted.iter().filter_map(|p| p.distance).collect();
    a.sort_by(f32::total_cmp);
    b.sort_by(f32::total_cmp);
    assert_eq!(a, b);
}

#[test]
fn connected_is_never_shorter_than_spatial() {
    // A strip of triangles, selected at one corner
    const N: u32 = 20;
    let mut spatial: Vec<ControlPoint> = (0..2 * N)
        .map(|i| {
            let x = (i / 2) as f32;
            let y = (i % 2) as f32 * 0.5;
            ControlPoint::new(Vector3::new(x, y, 0.0), i == 0)
        })
        .collect();
    let mut connected = spatial.clone();
    let faces = (0..N - 1).flat_map(|i| {
        let (a, b, c, d) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
        [vec![a, c, b], vec![b, c, d]]
    });
    let topology = Topology::from_faces(faces);

    PropagateConfig::default()
        .run(&mut spatial, &DistanceMode::default(), None)
        .unwrap();
    PropagateConfig::default()
        .run(&mut connected, &DistanceMode::Connected { topology: &topology }, None)
        .unwrap();

    for (s, c) in spatial.iter().zip(&connected) {
        let s = s.distance.unwrap();
        let c = c.distance.unwrap();
        assert!(c >= s * (1.0 - 1e-4), "connected {c} < spatial {s}");
    }
}
