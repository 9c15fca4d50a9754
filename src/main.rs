use log::info;

use nodal_nn::{AccumulatingConsumer, NetworkSpec, OnlineTeacher, TeacherConfig, VecDataSource};

// Teaches XOR through the online teacher and prints the final outputs.
// Window means are logged at `info`; run with RUST_LOG=info to see them.
fn main() -> nodal_nn::Result<()> {
    env_logger::init();

    let inputs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let targets = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];

    let spec = NetworkSpec { seed: 7, ..NetworkSpec::new(2, vec![3], 1) };
    let network = spec.build()?;
    println!("nodal-nn: {} weights, learning rate {}", network.weights_count(), network.learning_rate());

    let config = TeacherConfig::new().with_iterations(40_000);
    let mut teacher = OnlineTeacher::with_config(network, config)?;
    teacher.set_data_source(VecDataSource::from_pairs(inputs.clone(), targets)?.cycle_forever());
    teacher.add_result_consumer(AccumulatingConsumer::new(4_000, |window| {
        info!(
            "iterations {}..{}: mean error {:.6}, mean effect {:.6}",
            window.first_iteration, window.last_iteration, window.mean_error, window.mean_effect
        );
    })?);

    let reason = teacher.start_learning()?;
    println!("stopped after {} iterations ({reason:?})", teacher.current_iteration());

    let network = teacher.network_mut();
    for input in &inputs {
        network.conclude(input)?;
        println!("Input: {:?} -> Output: {:.4}", input, network.result()?[0]);
    }
    Ok(())
}
