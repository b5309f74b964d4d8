use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ect_math::Array;
use ect_tuning::{
    BiasModel, FluxKey, FluxTable, SensitivityModel, SolverSettings, Tuner, TuningOptions,
    TuningProblem, Weights,
};
use indexmap::IndexMap;

const SEASONS: [&str; 5] = ["ALL", "DJF", "MAM", "JJA", "SON"];
const REGIONS: [&str; 4] = ["Global", "North Midlat", "Tropical", "South Midlat"];
const VARIABLES: [&str; 6] = ["net_toa", "rsnt", "rlnt", "swcf", "lwcf", "tas"];

fn problem(n_params: usize) -> TuningProblem {
    let names: Vec<String> = (0..n_params).map(|i| format!("P{i}")).collect();
    let mut bias = FluxTable::new();
    let mut sensitivity = SensitivityModel::new();
    let mut k = 0.0;
    for v in VARIABLES {
        for s in SEASONS {
            for r in REGIONS {
                k += 1.0;
                bias.insert(v, s, r, (k * 0.37).sin());
                for (i, name) in names.iter().enumerate() {
                    let c = ((k + i as f64) * 1.3).cos() * 50.0;
                    sensitivity.insert(name.as_str(), FluxKey::new(v, s, r), c);
                }
            }
        }
    }
    let current: IndexMap<String, f64> = names.iter().map(|n| (n.clone(), 1.0e-3)).collect();
    let weights = Weights::new(
        VARIABLES.iter().map(|v| (v.to_string(), 1.0)).collect(),
        SEASONS.iter().map(|s| (s.to_string(), 1.0)).collect(),
        REGIONS.iter().map(|r| (r.to_string(), 1.0)).collect(),
    );
    TuningProblem::build(
        &current,
        &current,
        &sensitivity,
        &BiasModel::from_table(bias),
        &weights,
        &TuningOptions::new(0.01, 0.1, 2000),
    )
    .expect("benchmark problem")
}

fn bench_objective(c: &mut Criterion) {
    let p = problem(8);
    let x = Array::from_element(8, 5.0e-5);
    c.bench_function("objective_value_8_params_120_terms", |b| {
        b.iter(|| p.objective().value(black_box(&x)))
    });
}

fn bench_tuner(c: &mut Criterion) {
    let p = problem(8);
    let tuner = Tuner::new(SolverSettings::new(2000));
    c.bench_function("tuner_8_params", |b| b.iter(|| tuner.optimize(black_box(&p))));
}

criterion_group!(benches, bench_objective, bench_tuner);
criterion_main!(benches);
