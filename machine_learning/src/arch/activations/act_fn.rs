use super::{Relu, Sigmoid, Tanh};

/// An element-wise activation function applied after a layer's affine transform.
#[derive(Debug, Clone)]
pub enum ActFn {
    Sigmoid(Sigmoid),
    Relu(Relu),
    Tanh(Tanh),
}

impl ActFn {
    pub fn sigmoid(amp: f32) -> Self {
        Self::Sigmoid(Sigmoid::new(amp))
    }

    pub fn relu() -> Self {
        Self::Relu(Relu)
    }

    pub fn tanh() -> Self {
        Self::Tanh(Tanh)
    }

    pub fn f(&self, x: f32) -> f32 {
        match self {
            Self::Sigmoid(a) => a.f(x),
            Self::Relu(a) => a.f(x),
            Self::Tanh(a) => a.f(x),
        }
    }

    pub fn df(&self, x: f32) -> f32 {
        match self {
            Self::Sigmoid(a) => a.df(x),
            Self::Relu(a) => a.df(x),
            Self::Tanh(a) => a.df(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_df(act_fn: &ActFn, x: f32) -> f32 {
        let h = 1e-3;
        (act_fn.f(x + h) - act_fn.f(x - h)) / (2.0 * h)
    }

    #[test]
    fn derivatives_match_finite_differences() {
        let fns = [ActFn::sigmoid(1.0), ActFn::sigmoid(2.5), ActFn::tanh(), ActFn::relu()];

        for act_fn in &fns {
            for x in [-2.0, -0.7, 0.3, 1.9] {
                let diff = (act_fn.df(x) - numeric_df(act_fn, x)).abs();
                assert!(diff < 1e-2, "{act_fn:?} at {x}: diff {diff}");
            }
        }
    }
}
