use packer::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn get_crate_root() -> Result<PathBuf, std::env::VarError> {
    Ok(PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?))
}

fn read_from_path(p: &str) -> Result<Vec<Size>, Box<dyn std::error::Error>> {
    let mut list_path = get_crate_root()?;
    list_path.push(p);
    let parser = SizeListParser::new(list_path);
    let sizes = parser.read_sizes()?;
    assert!(sizes.len() > 0);

    Ok(sizes)
}

fn unit_items(sizes: &[Size]) -> ItemSet {
    packer::items::init(sizes.to_vec()).unwrap()
}

fn sorted_sizes(bins: &[Bin]) -> Vec<Size> {
    bins.iter()
        .flat_map(|b| b.sizes())
        .sorted_by(|a, b| a.total_cmp(b))
        .collect()
}

fn sorted_ids(bins: &[Bin]) -> Vec<u32> {
    bins.iter()
        .flat_map(|b| b.items().iter().map(|it| it.id))
        .sorted()
        .collect()
}

#[test]
fn four_halves_make_two_bins() {
    let sizes = read_from_path("tests/data/halves.txt").unwrap();
    let res = Dual::new(0.1).unwrap().pack(&unit_items(&sizes)).unwrap();
    assert_eq!(res.len(), 2);
    for b in &res {
        assert_eq!(b.fill(), 1.0);
    }
}

#[test]
fn big_and_small_pair_up() {
    let res = Dual::new(0.05)
        .unwrap()
        .pack(&unit_items(&[0.9, 0.1, 0.9, 0.1]))
        .unwrap();
    assert_eq!(res.len(), 2);
    for b in &res {
        let s: Vec<Size> = b.sizes().into_iter().sorted_by(|a, b| a.total_cmp(b)).collect();
        assert_eq!(s, vec![0.1, 0.9]);
    }
}

#[test]
fn ten_thirds() {
    let eps = 0.1;
    let items = unit_items(&[0.3; 10]);
    let res = Dual::new(eps).unwrap().pack(&items).unwrap();
    assert!((3..=4).contains(&res.len()), "{} bins", res.len());
    assert_eq!(sorted_ids(&res), (0..10).collect::<Vec<u32>>());
    assert!(res.iter().all(|b| b.fill() <= 1.0 + eps));
}

#[test]
fn empty_in_empty_out() {
    assert!(Dual::new(0.3).unwrap().pack(&[]).unwrap().is_empty());
    let mut ff = FifthFit::new(StdRng::seed_from_u64(1));
    assert!(ff.pack(&[]).unwrap().is_empty());
    let s = eps_makespan(vec![], 4, 0.1).unwrap();
    assert!(s.bins.is_empty());
    assert_eq!(s.makespan, 0.0);
}

#[test]
fn run_makespan() {
    let sizes = read_from_path("tests/data/jobs.txt").unwrap();
    let total_start = Instant::now();
    let s = eps_makespan(sizes.clone(), 5, 0.1).unwrap();
    println!(
        "Total packing time: {} μs",
        total_start.elapsed().as_micros()
    );
    assert!(s.makespan >= 200.0);
    assert!(s.makespan <= 220.0, "makespan {}", s.makespan);
    assert!(s.machines_used() <= 5);
    assert_eq!(sorted_sizes(&s.bins), sizes.into_iter().sorted_by(|a, b| a.total_cmp(b)).collect::<Vec<_>>());
    assert!(s.max_load() <= s.makespan * 1.1);
}

// The stopping rule is relative, so the same instance at wildly
// different magnitudes takes the same path.
#[test]
fn makespan_ignores_magnitude() {
    let sizes = read_from_path("tests/data/jobs.txt").unwrap();
    let base = eps_makespan(sizes.clone(), 5, 0.1).unwrap();
    for scale in [1e-12, 1e12] {
        let scaled: Vec<Size> = sizes.iter().map(|s| s * scale).collect();
        let s = eps_makespan(scaled, 5, 0.1).unwrap();
        let unscaled = s.makespan / scale;
        assert!((unscaled - 200.0).abs() <= 20.0, "scale {scale}: {unscaled}");
        assert_eq!(s.probes, base.probes, "scale {scale}");
        assert!(s.machines_used() <= 5);
    }
}

#[test]
fn overflowing_total_is_reported() {
    let err = eps_makespan(vec![Size::MAX, Size::MAX], 1, 0.1).unwrap_err();
    assert!(
        matches!(err, PackError::NumericPrecision { stage: Stage::OuterSearch, .. }),
        "unexpected {err:?}"
    );
}

#[test]
fn every_strategy_checks_eps() {
    for strategy in [Strategy::Dual, Strategy::FifthFit] {
        for eps in [5.0, 0.0, Size::NAN] {
            match strategy.build(eps, Rounding::default(), Budget::default(), 0) {
                Err(PackError::InvalidParameter { .. }) => {},
                Err(other) => panic!("{strategy:?} eps {eps}: unexpected {other:?}"),
                Ok(_) => panic!("{strategy:?} accepted eps {eps}"),
            }
        }
    }
}

// Every bin within 1 + ε, every item exactly once, over many
// small random instances.
#[test]
fn rounding_keeps_its_promises() {
    let mut rng = StdRng::seed_from_u64(0xB1A5);
    for eps in [0.05, 0.1, 0.2, 0.25, 0.3] {
        for _ in 0..40 {
            let n = rng.gen_range(1..=12);
            let sizes: Vec<Size> = (0..n).map(|_| rng.gen_range(0.01..=1.0)).collect();
            let items = unit_items(&sizes);
            for rounding in [Rounding::LowerEdge, Rounding::UpperEdge] {
                let mut dual = Dual::new(eps).unwrap().with_rounding(rounding);
                let res = dual.pack(&items).unwrap();
                assert_eq!(sorted_ids(&res), (0..n as u32).collect::<Vec<_>>());
                let cap = match rounding {
                    Rounding::LowerEdge => 1.0 + eps,
                    Rounding::UpperEdge => 1.0,
                };
                for b in &res {
                    assert!(b.fill() <= cap + FIT_SLACK, "{:?} with eps {eps}", b.sizes());
                }
                // Never worse than one bin per item.
                assert!(res.len() <= n);
            }
        }
    }
}

#[test]
fn pack_within_agrees_with_full_pack() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..30 {
        let n = rng.gen_range(1..=10);
        let sizes: Vec<Size> = (0..n).map(|_| rng.gen_range(0.05..=1.0)).collect();
        let items = unit_items(&sizes);
        let mut dual = Dual::new(0.25).unwrap();
        let full = dual.pack(&items).unwrap().len();
        for m in 1..=n {
            let probed = dual.pack_within(&items, m).unwrap();
            assert_eq!(probed.is_some(), full <= m, "m = {m}, full = {full}");
            if let Some(p) = probed {
                assert_eq!(p.len(), full);
            }
        }
    }
}

#[test]
fn heuristic_is_reproducible() {
    let sizes = read_from_path("tests/data/mixed.txt").unwrap();
    let d = sizes.iter().cloned().fold(0.0, Size::max);
    let items = packer::items::scale(&unit_items(&sizes), d);
    let run = |seed| {
        let mut ff = FifthFit::new(StdRng::seed_from_u64(seed));
        ff.pack(&items)
            .unwrap()
            .iter()
            .map(|b| b.items().iter().map(|it| it.id).collect::<Vec<_>>())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(3), run(3));
    assert_eq!(run(3).into_iter().flatten().sorted().collect::<Vec<_>>(), (0..sizes.len() as u32).collect::<Vec<_>>());
}

#[test]
fn strategies_share_the_contract() {
    let sizes = read_from_path("tests/data/mixed.txt").unwrap();
    for strategy in [Strategy::Dual, Strategy::FifthFit] {
        let mut p = strategy
            .build(0.25, Rounding::default(), Budget::default(), 9)
            .unwrap();
        let s = search(sizes.clone(), 4, &mut p, &SearchConfig::default()).unwrap();
        assert!(s.machines_used() <= 4);
        assert_eq!(sorted_ids(&s.bins), (0..sizes.len() as u32).collect::<Vec<_>>());
        let lower = packer::items::lower_bound(&unit_items(&sizes), 4);
        assert!(s.makespan >= lower);
    }
}

#[test]
fn budget_surfaces() {
    let sizes: Vec<Size> = (0..10).map(|i| 0.25 + 0.04 * i as Size).collect();
    let mut dual = Dual::new(0.2).unwrap().with_budget(Budget::new(2));
    match dual.pack(&unit_items(&sizes)) {
        Err(PackError::BudgetExceeded { stage, .. }) => assert_eq!(stage, Stage::CoverSearch),
        other => panic!("unexpected {other:?}"),
    }
    // The outer search doesn't swallow it either.
    let err = search(sizes, 3, &mut dual, &SearchConfig::default()).unwrap_err();
    assert!(matches!(err, PackError::BudgetExceeded { .. }));
}

#[test]
fn cancellation_surfaces() {
    let sizes = read_from_path("tests/data/jobs.txt").unwrap();
    let token = CancelToken::new();
    let cfg = SearchConfig::default().with_cancel(token.clone());
    token.cancel();
    let err = search(sizes, 5, &mut Dual::new(0.1).unwrap(), &cfg).unwrap_err();
    assert_eq!(err, PackError::Cancelled { stage: Stage::OuterSearch });
}

#[test]
fn sweep_matches_sequential() {
    let sizes = read_from_path("tests/data/mixed.txt").unwrap();
    let queries = [(2, 0.2), (3, 0.25), (4, 0.3), (0, 0.3), (3, 1.5)];
    let cfg = SearchConfig::default();
    let swept = sweep(&sizes, &queries, &Budget::default(), &cfg);
    assert_eq!(swept.len(), queries.len());
    for (&(m, eps), got) in queries.iter().zip(swept) {
        let want = Dual::new(eps).and_then(|mut d| search(sizes.clone(), m, &mut d, &cfg));
        match (got, want) {
            (Ok(a), Ok(b))      => {
                assert_eq!(a.makespan, b.makespan);
                assert_eq!(a.probes, b.probes);
                assert_eq!(
                    a.bins.iter().map(|b| b.sizes()).collect::<Vec<_>>(),
                    b.bins.iter().map(|b| b.sizes()).collect::<Vec<_>>()
                );
            },
            (Err(a), Err(b))    => assert_eq!(a, b),
            (a, b)              => panic!("diverged: {a:?} vs {b:?}"),
        }
    }
}

#[test]
fn invalid_parameters() {
    for eps in [0.0, 1.0, -0.5, Size::NAN] {
        match Dual::new(eps) {
            Err(PackError::InvalidParameter { stage, .. }) => assert_eq!(stage, Stage::Histogram),
            other => panic!("eps {eps}: unexpected {other:?}"),
        }
    }
    let err = Dual::new(0.2).unwrap().pack(&[Item::new(0, 1.5)]).unwrap_err();
    assert!(matches!(err, PackError::InvalidParameter { .. }));
    assert!(eps_makespan(vec![1.0], 0, 0.2).is_err());
    assert!(eps_makespan(vec![Size::INFINITY], 2, 0.2).is_err());
}
