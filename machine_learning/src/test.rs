#![cfg(test)]

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    arch::{
        Model, ParamGen, Sequential,
        activations::ActFn,
        layers::Layer,
        loss::{CrossEntropy, Mse},
    },
    dataset::Dataset,
    optimization::{Adam, GradientDescent},
    training::{History, ModelTrainer, TrainReport},
};

struct NoCheckpoints;

impl crate::training::CheckpointSink for NoCheckpoints {
    fn save(&mut self, _: usize, _: &crate::arch::Parameters) -> crate::Result<()> {
        Ok(())
    }
}

fn first_and_last_loss(report: &TrainReport) -> (f32, f32) {
    let first = report.epochs.first().unwrap().mean_loss;
    let last = report.last().unwrap().mean_loss;
    (first, last)
}

#[test]
fn test_ml_and2_gate_convergence() {
    let and2 = vec![
        0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        1.0, 0.0, 0.0, //
        1.0, 1.0, 1.0, //
    ];

    let dataset = Dataset::from_flat(and2, 2, 1).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let mut model = Sequential::new([
        Layer::dense((2, 3), Some(ActFn::sigmoid(1.))),
        Layer::dense((3, 1), Some(ActFn::sigmoid(1.))),
    ])
    .unwrap();
    model.init(&ParamGen::XavierUniform, &mut rng).unwrap();

    let optimizer = GradientDescent::new(2.);
    let mut trainer = ModelTrainer::new(model, optimizer, Mse, rng, 2000, 4).unwrap();

    let report = trainer
        .run(&dataset, &mut History::new(), &mut NoCheckpoints)
        .unwrap();

    let (first, last) = first_and_last_loss(&report);
    assert!(last < first, "loss went from {first} to {last}");
    assert!(last < 0.05, "final loss {last}");

    let eval = trainer.evaluate(&dataset).unwrap();
    assert_eq!(eval.accuracy, 1.0);
}

#[test]
fn test_ml_xor_gate_convergence_with_cross_entropy() {
    let x = ndarray::array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
    let dataset = Dataset::from_class_indices(x, &[0, 1, 1, 0], 2).unwrap();

    let mut rng = StdRng::seed_from_u64(3);
    let mut model = Sequential::new([
        Layer::dense((2, 8), Some(ActFn::tanh())),
        Layer::dense((8, 2), None),
    ])
    .unwrap();
    model.init(&ParamGen::XavierUniform, &mut rng).unwrap();

    let optimizer = Adam::new(model.params().len(), 0.05, 0.9, 0.999, 1e-8);
    let mut trainer = ModelTrainer::new(model, optimizer, CrossEntropy, rng, 500, 2).unwrap();

    let report = trainer
        .run(&dataset, &mut History::new(), &mut NoCheckpoints)
        .unwrap();

    let (first, last) = first_and_last_loss(&report);
    assert!(last < first, "loss went from {first} to {last}");

    let eval = trainer.evaluate(&dataset).unwrap();
    assert_eq!(eval.samples, 4);
    assert_eq!(eval.accuracy, 1.0);
}
