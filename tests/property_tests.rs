use mixdist::prelude::*;
use proptest::prelude::*;

const KINDS: [ColumnKind; 3] = [ColumnKind::Continuous, ColumnKind::Nominal, ColumnKind::Binary];

fn dataset(rows: &[(Option<f64>, u8, bool)]) -> Dataset {
    Dataset::new(
        vec!["x".to_string(), "color".to_string(), "flag".to_string()],
        rows.iter()
            .map(|&(x, color, flag)| vec![Value::from(x), Value::from(color as i64), Value::from(flag)])
            .collect(),
    )
    .unwrap()
}

fn rows_strategy() -> impl Strategy<Value = Vec<(Option<f64>, u8, bool)>> {
    prop::collection::vec(
        (prop::option::of(-100.0f64..100.0), 0u8..4, any::<bool>()),
        2..12,
    )
}

fn config_strategy() -> impl Strategy<Value = DistanceConfig> {
    (
        prop_oneof![Just(Scale::Standard), Just(Scale::Robust), Just(Scale::Range)],
        prop_oneof![Just(Combination::WeightedMean), Just(Combination::WeightedEuclidean)],
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(scale, combination, winsorize, canberra)| {
            let mut config = DistanceConfig::new().with_scale(scale).with_combination(combination);
            if canberra {
                config = config.with_family(ContinuousFamily::Canberra);
            }
            if winsorize && scale != Scale::Range {
                config.with_outlier_policy(OutlierPolicy::Winsorize { limit: 2.0 })
            } else {
                config
            }
        })
}

proptest! {
    #[test]
    fn prop_matrix_symmetric_zero_diagonal(rows in rows_strategy(), config in config_strategy()) {
        let ds = dataset(&rows);
        let matrix = MixedDistance::new(&ds, &KINDS, config).unwrap().build().unwrap();

        prop_assert_eq!(matrix.n(), rows.len());
        for i in 0..matrix.n() {
            prop_assert_eq!(matrix.get(i, i), 0.0);
            for j in 0..matrix.n() {
                prop_assert_eq!(matrix.get(i, j), matrix.get(j, i));
                prop_assert!(matrix.get(i, j) >= 0.0);
            }
        }
    }

    #[test]
    fn prop_blocks_and_threads_do_not_change_result(
        rows in rows_strategy(),
        config in config_strategy(),
        block_rows in 1usize..5,
    ) {
        let ds = dataset(&rows);
        let engine = MixedDistance::new(&ds, &KINDS, config).unwrap();

        let whole = engine.build().unwrap();
        let blocked = engine.builder().block_rows(block_rows).build().unwrap();
        let parallel = engine
            .builder()
            .block_rows(block_rows)
            .parallelism(Parallelism::Parallel(3))
            .build()
            .unwrap();

        prop_assert_eq!(&whole, &blocked);
        prop_assert_eq!(&whole, &parallel);
    }

    #[test]
    fn prop_raising_weight_never_lowers_contribution(
        rows in rows_strategy(),
        extra in 0.0f64..5.0,
    ) {
        let ds = dataset(&rows);
        let base = DistanceConfig::gower().with_weights(vec![1.0, 1.0, 1.0]);
        let raised = DistanceConfig::gower().with_weights(vec![1.0 + extra, 1.0, 1.0]);

        let before = MixedDistance::new(&ds, &KINDS, base).unwrap().explain(0, 1).unwrap();
        let after = MixedDistance::new(&ds, &KINDS, raised).unwrap().explain(0, 1).unwrap();

        if before.columns[0].dissimilarity.map_or(false, |d| d > 0.0) {
            prop_assert!(after.columns[0].contribution >= before.columns[0].contribution - 1e-12);
        }
    }
}
