// Integration tests for mixdist
use mixdist::prelude::*;
use mixdist::{ConfigError, JobError, NumericError, RobustSpread};
use std::io::Write;

fn single_column(values: &[f64]) -> Dataset {
    Dataset::new(
        vec!["x".to_string()],
        values.iter().map(|&v| vec![Value::from(v)]).collect(),
    )
    .unwrap()
}

fn off_diagonal_ratio(matrix: &DistanceMatrix) -> f64 {
    let condensed = matrix.condensed();
    let max = condensed.iter().cloned().fold(f64::MIN, f64::max);
    let min = condensed.iter().cloned().fold(f64::MAX, f64::min);
    max / min
}

#[test]
fn test_outlier_dominates_standard_but_not_robust() {
    let dataset = single_column(&[1.0, 2.0, 3.0, 100.0]);

    let standard = MixedDistance::new(&dataset, &[ColumnKind::Continuous], DistanceConfig::default())
        .unwrap()
        .build()
        .unwrap();
    let robust = MixedDistance::new(&dataset, &[ColumnKind::Continuous], DistanceConfig::robust(3.0))
        .unwrap()
        .build()
        .unwrap();

    let standard_ratio = off_diagonal_ratio(&standard);
    let robust_ratio = off_diagonal_ratio(&robust);
    assert!((standard_ratio - 99.0).abs() < 1e-9);
    assert!(standard_ratio >= 10.0 * robust_ratio);
}

#[test]
fn test_inserted_outlier_moves_robust_distances_less() {
    let clean = single_column(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    let dirty = single_column(&[1.0, 2.0, 3.0, 4.0, 5.0, 1000.0]);

    let change = |config: DistanceConfig| {
        let before = MixedDistance::new(&clean, &[ColumnKind::Continuous], config.clone())
            .unwrap()
            .distance(0, 4)
            .unwrap();
        let after = MixedDistance::new(&dirty, &[ColumnKind::Continuous], config)
            .unwrap()
            .distance(0, 4)
            .unwrap();
        (before - after).abs()
    };

    let standard_change = change(DistanceConfig::default());
    let robust_change = change(DistanceConfig::robust(3.0));
    assert!(robust_change < 0.5 * standard_change);
}

#[test]
fn test_asymmetric_binary_distances() {
    let dataset = Dataset::new(
        vec!["x".to_string(), "symptom".to_string()],
        vec![
            vec![0.0.into(), "no".into()],
            vec![10.0.into(), "no".into()],
            vec![5.0.into(), "yes".into()],
        ],
    )
    .unwrap();
    let kinds = [ColumnKind::Continuous, ColumnKind::Binary];

    let symmetric = MixedDistance::new(&dataset, &kinds, DistanceConfig::gower())
        .unwrap()
        .build()
        .unwrap();
    let asymmetric = MixedDistance::new(
        &dataset,
        &kinds,
        DistanceConfig::gower().with_asymmetric("symptom", "no"),
    )
    .unwrap()
    .build()
    .unwrap();

    // joint absence drops the symptom column: only x counts
    assert!((symmetric.get(0, 1) - 0.5).abs() < 1e-12);
    assert!((asymmetric.get(0, 1) - 1.0).abs() < 1e-12);

    // x: 0.5, symptom: 1
    assert!((symmetric.get(0, 2) - 0.75).abs() < 1e-12);
    assert!((asymmetric.get(0, 2) - 0.75).abs() < 1e-12);
    assert!((asymmetric.get(1, 2) - 0.75).abs() < 1e-12);
}

#[test]
fn test_identical_rows_have_zero_distance() {
    let dataset = Dataset::new(
        vec!["x".to_string(), "color".to_string(), "grade".to_string(), "flag".to_string()],
        vec![
            vec![1.5.into(), "red".into(), "low".into(), true.into()],
            vec![7.0.into(), "blue".into(), "high".into(), false.into()],
            vec![1.5.into(), "red".into(), "low".into(), true.into()],
        ],
    )
    .unwrap();
    let kinds = [
        ColumnKind::Continuous,
        ColumnKind::Nominal,
        ColumnKind::ordinal(["low", "high"]),
        ColumnKind::Binary,
    ];

    for combination in [Combination::WeightedMean, Combination::WeightedEuclidean] {
        let config = DistanceConfig::robust(3.0).with_combination(combination);
        let matrix = MixedDistance::new(&dataset, &kinds, config).unwrap().build().unwrap();
        assert_eq!(matrix.get(0, 2), 0.0);
        assert!(matrix.get(0, 1) > 0.0);
        assert_eq!(matrix.get(1, 0), matrix.get(0, 1));
    }
}

#[test]
fn test_non_finite_value_aborts_build() {
    let dataset = single_column(&[1.0, f64::NAN, 3.0]);
    let engine = MixedDistance::new(&dataset, &[ColumnKind::Continuous], DistanceConfig::default()).unwrap();

    match engine.build() {
        Err(Error::Numeric(NumericError::NonFinite { column, row, value })) => {
            assert_eq!(column, "x");
            assert_eq!(row, 1);
            assert!(value.is_nan());
        }
        other => panic!("expected a numeric error, got {:?}", other),
    }
}

#[test]
fn test_pair_without_usable_columns_fails() {
    let dataset = Dataset::new(
        vec!["x".to_string(), "color".to_string()],
        vec![
            vec![1.0.into(), "red".into()],
            vec![Value::Missing, "red".into()],
        ],
    )
    .unwrap();
    let config = DistanceConfig::gower().with_weights(vec![1.0, 0.0]);
    let engine = MixedDistance::new(&dataset, &[ColumnKind::Continuous, ColumnKind::Nominal], config).unwrap();

    assert!(matches!(
        engine.build(),
        Err(Error::Config(ConfigError::ZeroPairWeight { row_a: 0, row_b: 1 }))
    ));
}

#[test]
fn test_cancelled_build() {
    let dataset = single_column(&[1.0, 2.0, 3.0, 4.0]);
    let engine = MixedDistance::new(&dataset, &[ColumnKind::Continuous], DistanceConfig::default()).unwrap();

    let token = CancelToken::new();
    token.cancel();
    let result = engine.builder().block_rows(2).cancel_token(token).build();
    assert!(matches!(
        result,
        Err(Error::Cancelled { completed_rows: 0, total_rows: 4 })
    ));
}

#[test]
fn test_explain_pair() {
    let dataset = Dataset::new(
        vec!["x".to_string(), "color".to_string()],
        vec![
            vec![0.0.into(), "red".into()],
            vec![10.0.into(), "red".into()],
        ],
    )
    .unwrap();
    let engine = MixedDistance::new(
        &dataset,
        &[ColumnKind::Continuous, ColumnKind::Nominal],
        DistanceConfig::gower(),
    )
    .unwrap();

    let explained = engine.explain(0, 1).unwrap();
    assert_eq!(explained.top_contributor().unwrap().column, "x");
    assert!((explained.distance - 0.5).abs() < 1e-12);
}

#[test]
fn test_job_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "columns": [
                {{"name": "income", "kind": "continuous"}},
                {{"name": "owner", "kind": "binary"}}
            ],
            "rows": [[1.0, "yes"], [2.0, "no"], [3.0, "yes"], [100.0, "no"]],
            "config": {{
                "scale": "robust",
                "outlier_policy": {{"policy": "winsorize", "limit": 3.0}},
                "block_rows": 2,
                "threads": 2
            }}
        }}"#
    )
    .unwrap();

    let job = Job::from_path(file.path()).unwrap();
    assert_eq!(job.config.block_rows, Some(2));

    let output = job.run().unwrap();
    assert_eq!(output.matrix.n(), 4);
    assert_eq!(output.stats.pairs, 6);
    for i in 0..4 {
        assert_eq!(output.matrix.get(i, i), 0.0);
    }
}

#[test]
fn test_missing_job_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Job::from_path(dir.path().join("absent.json"));
    assert!(matches!(result, Err(JobError::Io { .. })));
}

#[test]
fn test_jointly_absent_rows_are_identical() {
    let dataset = Dataset::new(
        vec!["fever".to_string(), "cough".to_string()],
        vec![
            vec!["no".into(), "no".into()],
            vec!["no".into(), "no".into()],
            vec!["yes".into(), "no".into()],
        ],
    )
    .unwrap();
    let config = DistanceConfig::gower()
        .with_asymmetric("fever", "no")
        .with_asymmetric("cough", "no");

    let matrix = MixedDistance::new(&dataset, &[ColumnKind::Binary, ColumnKind::Binary], config)
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(matrix.get(0, 1), 0.0);
    // cough is jointly absent, fever alone decides
    assert!((matrix.get(0, 2) - 1.0).abs() < 1e-12);
    assert!((matrix.get(1, 2) - 1.0).abs() < 1e-12);
}

#[test]
fn test_numeric_binary_with_unobserved_negative_level() {
    let dataset = Dataset::new(
        vec!["x".to_string(), "flag".to_string()],
        vec![vec![0.0.into(), 1.0.into()], vec![10.0.into(), 1.0.into()]],
    )
    .unwrap();
    let engine = MixedDistance::new(
        &dataset,
        &[ColumnKind::Continuous, ColumnKind::Binary],
        DistanceConfig::gower().with_asymmetric("flag", "0"),
    )
    .unwrap();

    // x: 1, flag: both positive so a plain match
    let explained = engine.explain(0, 1).unwrap();
    assert!((explained.distance - 0.5).abs() < 1e-12);
    assert_eq!(explained.columns[1].dissimilarity, Some(0.0));
    assert_eq!(engine.build().unwrap().get(0, 1), explained.distance);
}

#[test]
fn test_euclidean_sentinel_is_kind_independent() {
    let dataset = Dataset::new(
        vec!["x".to_string(), "color".to_string()],
        vec![
            vec![0.0.into(), "red".into()],
            vec![Value::Missing, "red".into()],
            vec![0.0.into(), Value::Missing],
            vec![10.0.into(), "blue".into()],
        ],
    )
    .unwrap();
    let config = DistanceConfig::gower()
        .with_combination(Combination::WeightedEuclidean)
        .with_missing(MissingPolicy::Sentinel { value: 0.5 });

    let matrix = MixedDistance::new(&dataset, &[ColumnKind::Continuous, ColumnKind::Nominal], config)
        .unwrap()
        .build()
        .unwrap();

    // one column matches, the other takes the sentinel: sqrt(0.5 * 0.25)
    let expected = 0.125_f64.sqrt();
    assert!((matrix.get(0, 1) - expected).abs() < 1e-12);
    assert!((matrix.get(0, 2) - expected).abs() < 1e-12);
}

#[test]
fn test_iqr_spread_through_build_matrix() {
    let dataset = single_column(&[1.0, 2.0, 3.0, 4.0, 100.0]);
    let config = DistanceConfig::new()
        .with_scale(Scale::Robust)
        .with_robust_spread(RobustSpread::Iqr);
    let descriptors = validate_schema(&dataset, &[ColumnKind::Continuous]).unwrap();
    let table = preprocess(&dataset, &descriptors, &config).unwrap();

    // median 3, IQR 4 - 2
    let column = table.column(0).as_continuous().unwrap();
    assert_eq!((column.location, column.spread), (3.0, 2.0));

    let matrix = build_matrix(&dataset, &descriptors, &table, &config).unwrap();
    assert!((matrix.get(0, 1) - 0.5).abs() < 1e-12);
    assert!((matrix.get(3, 4) - 48.0).abs() < 1e-12);
}

#[test]
fn test_trimmed_estimates_through_build_matrix() {
    let dataset = single_column(&[1.0, 2.0, 3.0, 4.0, 100.0]);
    let config = DistanceConfig::new().with_outlier_policy(OutlierPolicy::Trim { fraction: 0.2 });
    let descriptors = validate_schema(&dataset, &[ColumnKind::Continuous]).unwrap();
    let table = preprocess(&dataset, &descriptors, &config).unwrap();

    // estimated on [2, 3, 4]: mean 3, sd 1; the tails are still scaled
    let matrix = build_matrix(&dataset, &descriptors, &table, &config).unwrap();
    assert!((matrix.get(0, 1) - 1.0).abs() < 1e-12);
    assert!((matrix.get(0, 4) - 99.0).abs() < 1e-12);
}

fn family_dataset() -> Dataset {
    Dataset::new(
        vec!["x".to_string(), "color".to_string()],
        vec![
            vec![0.0.into(), "red".into()],
            vec![10.0.into(), "blue".into()],
            vec![5.0.into(), "red".into()],
        ],
    )
    .unwrap()
}

#[test]
fn test_minkowski_family() {
    let config = DistanceConfig::gower().with_family(ContinuousFamily::Minkowski { p: 3.0 });
    let matrix = MixedDistance::new(
        &family_dataset(),
        &[ColumnKind::Continuous, ColumnKind::Nominal],
        config,
    )
    .unwrap()
    .build()
    .unwrap();

    // (0.5 * 0.5^3)^(1/3)
    assert!((matrix.get(0, 2) - 0.0625_f64.powf(1.0 / 3.0)).abs() < 1e-12);
    assert!((matrix.get(0, 1) - 1.0).abs() < 1e-12);
}

#[test]
fn test_canberra_family() {
    let config = DistanceConfig::gower().with_family(ContinuousFamily::Canberra);
    let matrix = MixedDistance::new(
        &family_dataset(),
        &[ColumnKind::Continuous, ColumnKind::Nominal],
        config,
    )
    .unwrap()
    .build()
    .unwrap();

    // scaled x is 0, 1, 0.5
    assert!((matrix.get(1, 2) - 2.0 / 3.0).abs() < 1e-12);
    assert!((matrix.get(0, 2) - 0.5).abs() < 1e-12);
}

#[test]
fn test_job_rejects_unknown_config_key() {
    let result = Job::from_json_str(
        r#"{
            "columns": [{"name": "x", "kind": "continuous"}],
            "rows": [[1.0], [2.0]],
            "config": {"scael": "robust"}
        }"#,
    );
    assert!(matches!(result, Err(JobError::Parse(_))));
}
