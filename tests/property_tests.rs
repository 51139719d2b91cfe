use kmeansforge::model::{assign, fit_kmeans, squared_distance, total_cost, update};
use kmeansforge::{KMeansParams, RunState, Seed};
use ndarray::Array2;
use proptest::prelude::*;

fn point_set(max_points: usize, dim: usize) -> impl Strategy<Value = Array2<f64>> {
    prop::collection::vec(prop::collection::vec(-50.0f64..50.0, dim), 1..max_points).prop_map(
        move |rows| {
            let n = rows.len();
            Array2::from_shape_vec((n, dim), rows.into_iter().flatten().collect()).unwrap()
        },
    )
}

proptest! {
    #[test]
    fn prop_assignment_picks_a_closest_centroid(
        points in point_set(30, 3),
        centroids in point_set(6, 3),
    ) {
        let labels = assign(&points, &centroids);
        prop_assert_eq!(labels.len(), points.nrows());

        for (point, &label) in points.outer_iter().zip(labels.iter()) {
            prop_assert!(label < centroids.nrows());
            let chosen = squared_distance(&point, &centroids.row(label));
            for (j, centroid) in centroids.outer_iter().enumerate() {
                let d = squared_distance(&point, &centroid);
                prop_assert!(chosen <= d);
                if j < label {
                    prop_assert!(d > chosen, "tie not broken by lowest index");
                }
            }
        }
    }

    #[test]
    fn prop_update_is_mean_or_previous(
        points in point_set(30, 2),
        previous in point_set(5, 2),
    ) {
        let labels = assign(&points, &previous);
        let next = update(&points, &labels, &previous);

        for k in 0..previous.nrows() {
            let members: Vec<usize> = (0..points.nrows()).filter(|&i| labels[i] == k).collect();
            if members.is_empty() {
                prop_assert_eq!(next.row(k), previous.row(k));
                continue;
            }
            for t in 0..2 {
                let mean = members.iter().map(|&i| points[[i, t]]).sum::<f64>() / members.len() as f64;
                prop_assert!((next[[k, t]] - mean).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn prop_update_never_raises_cost(
        points in point_set(40, 2),
        previous in point_set(5, 2),
    ) {
        let labels = assign(&points, &previous);
        let before = total_cost(&points, &labels, &previous);
        let after = total_cost(&points, &labels, &update(&points, &labels, &previous));
        prop_assert!(after <= before + 1e-9 * (1.0 + before));
    }

    #[test]
    fn prop_runs_terminate_within_budget(
        points in point_set(40, 2),
        k in 1usize..5,
        max_iterations in 1usize..12,
        seed in any::<u64>(),
    ) {
        prop_assume!(k <= points.nrows());
        let params = KMeansParams::new(k, Seed::Fixed(seed)).max_iterations(max_iterations);
        let model = fit_kmeans(&points, &params).unwrap();

        prop_assert!(model.iterations >= 1 && model.iterations <= max_iterations);
        if model.state == RunState::Exhausted {
            prop_assert_eq!(model.iterations, max_iterations);
        } else {
            prop_assert_eq!(model.state, RunState::Converged);
            prop_assert!(model.iterations >= 2);
        }
        prop_assert!(model.labels.iter().all(|&l| l < k));
        prop_assert_eq!(model.cost, total_cost(&points, &model.labels, &model.centroids));

        let again = fit_kmeans(&points, &params).unwrap();
        prop_assert_eq!(again.centroids, model.centroids);
        prop_assert_eq!(again.labels, model.labels);
    }
}
