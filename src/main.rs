use std::env;

use anyhow::{Context, Result};
use log::info;
use machine_learning::training::{
    LogReporter, SafetensorsSink, TrainerBuilder, load_checkpoint,
};
use minibatch_trainer::config::Config;

fn main() -> Result<()> {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .context("usage: minibatch-trainer <config.json>")?;
    let config = Config::load(&path)?;

    let dataset = config
        .dataset
        .load()
        .context("failed to load the training dataset")?;

    info!(
        samples = dataset.len(),
        x_size = dataset.x_size(),
        y_size = dataset.y_size();
        "training dataset loaded"
    );

    let mut trainer = TrainerBuilder::new()
        .build(&config.trainer)
        .context("invalid trainer spec")?;

    if let Some(checkpoint) = &config.init_checkpoint {
        let epoch = load_checkpoint(checkpoint, trainer.params_mut())
            .with_context(|| format!("failed to load '{}'", checkpoint.display()))?;
        info!("parameters restored from {} (epoch {epoch:?})", checkpoint.display());
    }

    let mut reporter = LogReporter::with_interval(config.log_interval);
    let mut sink =
        SafetensorsSink::new(&config.checkpoint_dir).with_prefix(&config.checkpoint_prefix);

    let report = trainer
        .run(&dataset, &mut reporter, &mut sink)
        .context("training aborted")?;

    if let Some(last) = report.last() {
        info!(
            epoch = last.epoch,
            mean_loss = last.mean_loss,
            mean_accuracy = last.mean_accuracy;
            "last epoch"
        );
    }

    if let Some(eval) = &config.eval_dataset {
        let eval = eval.load().context("failed to load the evaluation dataset")?;
        let metrics = trainer.evaluate(&eval).context("evaluation failed")?;

        info!(
            samples = metrics.samples,
            loss = metrics.loss,
            accuracy = metrics.accuracy;
            "evaluation"
        );
    }

    Ok(())
}
