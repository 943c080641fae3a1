use serde::{Deserialize, Serialize};

use crate::arch::ParamGen;

/// The specification for the `ActFn` enum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFnSpec {
    Sigmoid {
        #[serde(default = "default_amp")]
        amp: f32,
    },
    Relu,
    Tanh,
}

/// The specification for the `Layer` enum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSpec {
    Dense {
        dim: (usize, usize),
        #[serde(default)]
        act_fn: Option<ActFnSpec>,
    },
    Dropout {
        rate: f32,
    },
}

/// The specification for the `Model` trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSpec {
    Sequential {
        layers: Vec<LayerSpec>,
        #[serde(default)]
        init: ParamGen,
    },
}

/// The specification for the `Optimizer` trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerSpec {
    Adam {
        #[serde(default = "default_adaptive_lr")]
        learning_rate: f32,
        #[serde(default = "default_beta1")]
        beta1: f32,
        #[serde(default = "default_beta2")]
        beta2: f32,
        #[serde(default = "default_adam_epsilon")]
        epsilon: f32,
    },
    GradientDescent {
        learning_rate: f32,
    },
    GradientDescentWithMomentum {
        learning_rate: f32,
        momentum: f32,
    },
    RmsProp {
        #[serde(default = "default_adaptive_lr")]
        learning_rate: f32,
        #[serde(default = "default_beta1")]
        beta: f32,
        #[serde(default = "default_rms_prop_epsilon")]
        epsilon: f32,
    },
}

/// The specification for the `LossFn` trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossFnSpec {
    Mse,
    CrossEntropy,
}

/// The specification for the `Trainer` trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerSpec {
    pub model: ModelSpec,
    pub optimizer: OptimizerSpec,
    pub loss: LossFnSpec,
    pub epochs: usize,
    pub batch_size: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_amp() -> f32 {
    1.0
}

fn default_adaptive_lr() -> f32 {
    0.001
}

fn default_beta1() -> f32 {
    0.9
}

fn default_beta2() -> f32 {
    0.999
}

fn default_adam_epsilon() -> f32 {
    1e-8
}

fn default_rms_prop_epsilon() -> f32 {
    1e-7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trainer_spec_from_json() {
        let json = r#"{
            "model": {
                "sequential": {
                    "layers": [
                        { "dense": { "dim": [784, 128], "act_fn": "relu" } },
                        { "dropout": { "rate": 0.2 } },
                        { "dense": { "dim": [128, 10] } }
                    ]
                }
            },
            "optimizer": { "rms_prop": {} },
            "loss": "cross_entropy",
            "epochs": 3,
            "batch_size": 64
        }"#;

        let spec: TrainerSpec = serde_json::from_str(json).unwrap();

        let ModelSpec::Sequential { layers, init } = &spec.model;
        assert_eq!(layers.len(), 3);
        assert_eq!(*init, ParamGen::XavierUniform);
        assert_eq!(
            layers[0],
            LayerSpec::Dense {
                dim: (784, 128),
                act_fn: Some(ActFnSpec::Relu)
            }
        );
        assert_eq!(
            spec.optimizer,
            OptimizerSpec::RmsProp {
                learning_rate: 0.001,
                beta: 0.9,
                epsilon: 1e-7
            }
        );
        assert_eq!(spec.loss, LossFnSpec::CrossEntropy);
        assert_eq!(spec.seed, None);
    }

    #[test]
    fn sigmoid_amp_defaults_to_one() {
        let act_fn: ActFnSpec = serde_json::from_str(r#"{ "sigmoid": {} }"#).unwrap();
        assert_eq!(act_fn, ActFnSpec::Sigmoid { amp: 1.0 });
    }
}
