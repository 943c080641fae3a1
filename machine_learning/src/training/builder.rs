use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{ModelTrainer, Trainer};
use crate::{
    MlErr, Result,
    arch::{
        Model, Sequential,
        activations::ActFn,
        layers::Layer,
        loss::{CrossEntropy, LossFn, Mse},
    },
    optimization::{Adam, GradientDescent, GradientDescentWithMomentum, Optimizer, RmsProp},
    specs::{ActFnSpec, LayerSpec, LossFnSpec, ModelSpec, OptimizerSpec, TrainerSpec},
};

/// Builds `Trainer`s given a specification.
#[derive(Default)]
pub struct TrainerBuilder;

impl TrainerBuilder {
    /// Creates a new `TrainerBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new `Trainer` following a spec.
    ///
    /// # Arguments
    /// * `spec` - The specification for the trainer.
    ///
    /// # Returns
    /// The trainer or an error if the spec is invalid.
    pub fn build(&self, spec: &TrainerSpec) -> Result<Box<dyn Trainer>> {
        if spec.batch_size == 0 {
            return Err(MlErr::InvalidBatchSize);
        }

        let mut rng = self.generate_rng(spec.seed);
        self.resolve_model(spec, &mut rng)
    }

    fn resolve_model(&self, spec: &TrainerSpec, rng: &mut StdRng) -> Result<Box<dyn Trainer>> {
        match &spec.model {
            ModelSpec::Sequential {
                layers: layer_specs,
                init,
            } => {
                if layer_specs.is_empty() {
                    return Err(MlErr::InvalidSpec(
                        "a sequential model needs at least one layer".to_string(),
                    ));
                }

                let layers = layer_specs
                    .iter()
                    .map(|ls| self.resolve_layer(*ls, rng))
                    .collect::<Result<Vec<_>>>()?;

                let mut model = Sequential::new(layers)?;
                model.init(init, rng)?;
                self.resolve_optimizer(spec, model, rng)
            }
        }
    }

    fn resolve_layer(&self, spec: LayerSpec, rng: &mut StdRng) -> Result<Layer> {
        match spec {
            LayerSpec::Dense { dim, act_fn } => {
                if dim.0 == 0 || dim.1 == 0 {
                    return Err(MlErr::InvalidSpec(format!(
                        "dense layers need at least one input and one output, got {dim:?}"
                    )));
                }

                let factory = |act_fn| Layer::dense(dim, act_fn);
                Ok(self.resolve_act_fn(act_fn, factory))
            }
            LayerSpec::Dropout { rate } => Layer::dropout(rate, rng.random()),
        }
    }

    fn resolve_act_fn<F>(&self, spec: Option<ActFnSpec>, layer_factory: F) -> Layer
    where
        F: FnOnce(Option<ActFn>) -> Layer,
    {
        let Some(act_fn) = spec else {
            return layer_factory(None);
        };

        let act_fn = match act_fn {
            ActFnSpec::Sigmoid { amp } => ActFn::sigmoid(amp),
            ActFnSpec::Relu => ActFn::relu(),
            ActFnSpec::Tanh => ActFn::tanh(),
        };

        layer_factory(Some(act_fn))
    }

    fn resolve_optimizer<M>(
        &self,
        spec: &TrainerSpec,
        model: M,
        rng: &mut StdRng,
    ) -> Result<Box<dyn Trainer>>
    where
        M: Model + 'static,
    {
        let len = model.params().len();

        match spec.optimizer {
            OptimizerSpec::GradientDescent { learning_rate } => {
                let optimizer = GradientDescent::new(learning_rate);
                self.resolve_loss(spec, model, optimizer, rng)
            }
            OptimizerSpec::GradientDescentWithMomentum {
                learning_rate,
                momentum,
            } => {
                let optimizer = GradientDescentWithMomentum::new(len, learning_rate, momentum);
                self.resolve_loss(spec, model, optimizer, rng)
            }
            OptimizerSpec::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => {
                let optimizer = Adam::new(len, learning_rate, beta1, beta2, epsilon);
                self.resolve_loss(spec, model, optimizer, rng)
            }
            OptimizerSpec::RmsProp {
                learning_rate,
                beta,
                epsilon,
            } => {
                let optimizer = RmsProp::new(len, learning_rate, beta, epsilon);
                self.resolve_loss(spec, model, optimizer, rng)
            }
        }
    }

    fn resolve_loss<M, O>(
        &self,
        spec: &TrainerSpec,
        model: M,
        optimizer: O,
        rng: &mut StdRng,
    ) -> Result<Box<dyn Trainer>>
    where
        M: Model + 'static,
        O: Optimizer + 'static,
    {
        match spec.loss {
            LossFnSpec::Mse => self.terminate_build(spec, model, optimizer, Mse::new(), rng),
            LossFnSpec::CrossEntropy => {
                self.terminate_build(spec, model, optimizer, CrossEntropy::new(), rng)
            }
        }
    }

    fn terminate_build<M, O, L>(
        &self,
        spec: &TrainerSpec,
        model: M,
        optimizer: O,
        loss: L,
        rng: &mut StdRng,
    ) -> Result<Box<dyn Trainer>>
    where
        M: Model + 'static,
        O: Optimizer + 'static,
        L: LossFn + 'static,
    {
        let shuffle_rng = StdRng::seed_from_u64(rng.random());
        let trainer = ModelTrainer::new(
            model,
            optimizer,
            loss,
            shuffle_rng,
            spec.epochs,
            spec.batch_size,
        )?;

        Ok(Box::new(trainer))
    }

    fn generate_rng(&self, seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
