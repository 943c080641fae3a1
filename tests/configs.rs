use std::{fs, path::PathBuf};

use machine_learning::training::{History, SafetensorsSink, TrainerBuilder};
use minibatch_trainer::{config::Config, data::DatasetConfig};

fn config_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("configs").join(name)
}

#[test]
fn bundled_configs_load_and_build() {
    for name in ["xor.json", "mnist.json"] {
        let config = Config::load(config_path(name)).unwrap();
        assert!(TrainerBuilder::new().build(&config.trainer).is_ok(), "{name}");
    }
}

#[test]
fn mnist_config_points_at_idx_files() {
    let config = Config::load(config_path("mnist.json")).unwrap();

    assert!(matches!(config.dataset, DatasetConfig::Idx { classes: 10, .. }));
    assert!(matches!(config.eval_dataset, Some(DatasetConfig::Idx { .. })));
    assert_eq!(config.trainer.batch_size, 64);
    assert_eq!(config.checkpoint_dir, PathBuf::from("model_saves/mnist"));
}

#[test]
fn xor_config_trains_and_checkpoints() {
    let mut config = Config::load(config_path("xor.json")).unwrap();
    config.trainer.epochs = 50;
    assert_eq!(config.log_interval, 100);

    let dataset = config.dataset.load().unwrap();
    assert_eq!((dataset.len(), dataset.x_size(), dataset.y_size()), (4, 2, 2));

    let dir = std::env::temp_dir().join(format!("minibatch-trainer-xor-{}", std::process::id()));
    let mut sink = SafetensorsSink::new(&dir).with_prefix(&config.checkpoint_prefix);
    let mut history = History::new();

    let mut trainer = TrainerBuilder::new().build(&config.trainer).unwrap();
    let report = trainer.run(&dataset, &mut history, &mut sink).unwrap();

    assert_eq!(report.steps(), 50 * 2);
    assert_eq!(history.records().len(), 100);
    assert!(sink.path(49).exists());

    let first = report.epochs[0].mean_loss;
    let last = report.last().unwrap().mean_loss;
    assert!(last < first, "loss went from {first} to {last}");

    fs::remove_dir_all(&dir).unwrap();
}
