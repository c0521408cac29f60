use activation_plots::activations::{random_batch, Mlp};
use activation_plots::distribution::PlotOutput;
use activation_plots::{plot_distribution, DistributionOptions, PlotError};
use ndarray::Array2;

fn wave(rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(i, j)| ((i * cols + j) as f64 * 0.7).sin() + j as f64)
}

#[test_log::test]
fn per_column_never_exceeds_available_columns() {
    let data = wave(50, 3);
    let rendered = plot_distribution(&data, &DistributionOptions::per_column(Some(10))).unwrap();

    assert_eq!(rendered.len(), 3);
    let titles: Vec<&str> = rendered.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Distribution of Column 1",
            "Distribution of Column 2",
            "Distribution of Column 3"
        ]
    );
    for r in &rendered {
        assert_eq!(r.histogram.total, 50);
        assert!((r.histogram.area() - 1.0).abs() < 1e-9);
        assert!(matches!(r.output, PlotOutput::Figure(_)));
    }
}

#[test_log::test]
fn per_column_respects_smaller_limit() {
    let data = wave(20, 8);
    let rendered = plot_distribution(&data, &DistributionOptions::per_column(Some(2))).unwrap();
    assert_eq!(rendered.len(), 2);
    assert_eq!(rendered[1].column, Some(1));
}

#[test_log::test]
fn aggregate_flattens_into_thirty_bins() {
    let data = wave(100, 10);
    let rendered = plot_distribution(&data, &DistributionOptions::default()).unwrap();

    assert_eq!(rendered.len(), 1);
    let only = &rendered[0];
    assert_eq!(only.title, "Distribution of the Entire Tensor");
    assert_eq!(only.column, None);
    assert_eq!(only.histogram.total, 1000);
    assert_eq!(only.histogram.bins(), 30);
    assert_eq!(only.histogram.counts.iter().sum::<usize>(), 1000);
    assert!(only.kde.is_some());
}

#[test_log::test]
fn string_input_is_rejected_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("dist");

    for options in [
        DistributionOptions::default().saving_to(&prefix),
        DistributionOptions::per_column(None).saving_to(&prefix),
    ] {
        let result = plot_distribution("0.1, 0.2, 0.3", &options);
        assert!(matches!(result, Err(PlotError::InputType { .. })));
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test_log::test]
fn saved_files_are_named_by_column() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("layer_3_dist");

    let rendered = plot_distribution(
        &wave(40, 2),
        &DistributionOptions::per_column(None).saving_to(&prefix),
    )
    .unwrap();
    assert_eq!(rendered.len(), 2);

    for n in 1..=2 {
        let path = dir.path().join(format!("layer_3_dist_column_{}.png", n));
        let image = image::open(&path).unwrap();
        assert_eq!((image.width(), image.height()), (1000, 600));
    }

    plot_distribution(&wave(40, 2), &DistributionOptions::default().saving_to(&prefix)).unwrap();
    assert!(dir.path().join("layer_3_dist_entire_tensor.png").exists());
}

#[test_log::test]
fn recorded_activations_can_be_plotted() {
    let mlp = Mlp::new(&[6, 12, 4], 11).unwrap();
    let (_, trace) = mlp.forward(&random_batch(64, 6, 5)).unwrap();

    let options = DistributionOptions {
        max_columns: Some(3),
        ..DistributionOptions::per_column(None)
    };
    for (name, tensor) in trace.iter() {
        let rendered = plot_distribution(tensor, &options).unwrap();
        assert_eq!(rendered.len(), 3, "layer {}", name);
        assert!(rendered.iter().all(|r| r.histogram.total == 64));
    }
}

#[test_log::test]
fn nested_json_lists_are_accepted() {
    let value: serde_json::Value =
        serde_json::from_str("[[0.1, 0.5], [0.3, 0.9], [0.2, 0.4]]").unwrap();
    let rendered = plot_distribution(&value, &DistributionOptions::per_column(None)).unwrap();
    assert_eq!(rendered.len(), 2);
    assert!(rendered.iter().all(|r| r.histogram.total == 3));
}

#[test_log::test]
fn clustered_column_with_outlier_plots_with_bounded_bins() {
    let mut column: Vec<f64> = (0..1000).map(|i| i as f64 * 1e-9).collect();
    column[999] = 1e6;
    let data = Array2::from_shape_vec((1000, 1), column).unwrap();

    let rendered = plot_distribution(&data, &DistributionOptions::per_column(None)).unwrap();
    assert_eq!(rendered.len(), 1);
    assert!(rendered[0].histogram.bins() <= activation_plots::histogram::MAX_AUTO_BINS);
    assert_eq!(rendered[0].histogram.total, 1000);
}

#[test_log::test]
fn constant_huge_columns_still_render() {
    let data = Array2::from_elem((10, 2), 1e20);
    let rendered = plot_distribution(&data, &DistributionOptions::per_column(None)).unwrap();
    assert_eq!(rendered.len(), 2);
    for r in &rendered {
        let (lo, hi) = r.histogram.range();
        assert!(lo < hi);
        assert!(r.histogram.density.iter().all(|d| d.is_finite()));
        assert!(r.kde.is_none());
    }
}
