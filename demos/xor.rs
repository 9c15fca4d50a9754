use std::sync::mpsc;
use std::thread;

use nodal_nn::network::export::to_dot;
use nodal_nn::{sigmoid_perceptron, AccumulatingConsumer, OnlineTeacher, TeacherConfig, VecDataSource};

fn main() -> nodal_nn::Result<()> {
    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];

    let network = sigmoid_perceptron(0.5, 1.0, 2, 1, &[2], 3)?;
    let config = TeacherConfig::new().with_iterations(40_000);
    let mut teacher = OnlineTeacher::with_config(network, config)?;
    teacher.set_data_source(
        VecDataSource::from_pairs(inputs.clone(), expected_outputs)?.cycle_forever(),
    );

    // Window records are printed by a separate thread, as a chart would draw them.
    let (tx, rx) = mpsc::channel();
    teacher.add_result_consumer(AccumulatingConsumer::with_channel(4_000, tx)?);
    let printer = thread::spawn(move || {
        for window in rx {
            println!(
                "Iterations {:>5}..{:>5}: error = {:.6}",
                window.first_iteration, window.last_iteration, window.mean_error
            );
        }
    });

    teacher.start_learning()?;
    let mut network = teacher.into_network();
    // Dropping the teacher closed the channel.
    let _ = printer.join();

    for input in &inputs {
        network.conclude(input)?;
        println!("Input: {:?} -> Output: {:.4}", input, network.result()?[0]);
    }
    println!("\n{}", to_dot(&network)?);
    Ok(())
}
