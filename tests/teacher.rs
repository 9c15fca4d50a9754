use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use nodal_nn::train::{active_class, BucketedResult, Example};
use nodal_nn::{
    sigmoid_perceptron, AccumulatedResult, AccumulatingConsumer, BucketedAccumulator, NnError,
    OnlineTeacher, StopReason, TeacherConfig, VecDataSource,
};

fn xor() -> VecDataSource {
    VecDataSource::from_pairs(
        vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]],
        vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]],
    )
    .unwrap()
}

fn teacher(config: TeacherConfig) -> OnlineTeacher {
    let net = sigmoid_perceptron(0.5, 1.0, 2, 1, &[3], 2).unwrap();
    OnlineTeacher::with_config(net, config).unwrap()
}

#[test]
fn exact_windows_emit_without_partial_flush() {
    let (tx, rx) = mpsc::channel();
    let mut t = teacher(TeacherConfig::new());
    t.set_data_source(xor().with_passes(2));
    t.add_result_consumer(AccumulatingConsumer::with_channel(4, tx).unwrap());
    assert_eq!(t.start_learning().unwrap(), StopReason::SourceExhausted);
    drop(t);

    let windows: Vec<AccumulatedResult> = rx.iter().collect();
    assert_eq!(windows.len(), 2);
    assert_eq!((windows[0].first_iteration, windows[0].last_iteration), (0, 3));
    assert_eq!((windows[1].first_iteration, windows[1].last_iteration), (4, 7));
    assert!(windows.iter().all(|w| w.samples == 4));
}

#[test]
fn trailing_partial_window_is_flushed() {
    let (tx, rx) = mpsc::channel();
    let mut t = teacher(TeacherConfig::new().with_repeats(2));
    t.set_data_source(xor());
    t.add_result_consumer(AccumulatingConsumer::with_channel(3, tx).unwrap());
    t.start_learning().unwrap();
    drop(t);

    let windows: Vec<AccumulatedResult> = rx.iter().collect();
    // 8 steps: windows of 3, 3 and a flushed 2.
    assert_eq!(windows.iter().map(|w| w.samples).collect::<Vec<_>>(), vec![3, 3, 2]);
    let last = &windows[2];
    assert_eq!((last.first_iteration, last.first_repeat), (3, 0));
    assert_eq!((last.last_iteration, last.last_repeat), (3, 1));
}

#[test]
fn windows_report_step_means() {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let mut t = teacher(TeacherConfig::new());
    t.set_data_source(xor());
    let seen = Arc::clone(&errors);
    t.add_result_consumer(SampleErrors(seen));
    let (tx, rx) = mpsc::channel();
    t.add_result_consumer(AccumulatingConsumer::with_channel(4, tx).unwrap());
    t.start_learning().unwrap();
    drop(t);

    let window = rx.recv().unwrap();
    let errors = errors.lock().unwrap();
    let mean = errors.iter().sum::<f64>() / errors.len() as f64;
    assert!((window.mean_error - mean).abs() < 1e-12);
}

struct SampleErrors(Arc<Mutex<Vec<f64>>>);

impl nodal_nn::ResultConsumer for SampleErrors {
    fn consume(&mut self, sample: &nodal_nn::train::Sample<'_>) -> nodal_nn::Result<()> {
        self.0.lock().unwrap().push(sample.error);
        Ok(())
    }

    fn on_learning_stopped(&mut self) -> nodal_nn::Result<()> {
        Ok(())
    }
}

#[test]
fn bucketed_windows_split_by_target_class() {
    let source = VecDataSource::new(vec![
        Example::labeled(vec![1.0, 0.0], vec![1.0, 0.0]),
        Example::labeled(vec![0.0, 1.0], vec![0.0, 1.0]),
        Example::labeled(vec![0.9, 0.1], vec![1.0, 0.0]),
    ]);
    let records = Arc::new(Mutex::new(Vec::<BucketedResult>::new()));
    let sink = Arc::clone(&records);
    let net = sigmoid_perceptron(0.5, 1.0, 2, 2, &[], 6).unwrap();
    let mut t = OnlineTeacher::new(net);
    t.set_data_source(source);
    t.add_result_consumer(
        BucketedAccumulator::new(10, 2, active_class, move |r| sink.lock().unwrap().push(r))
            .unwrap(),
    );
    t.start_learning().unwrap();

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].samples, 3);
    assert_eq!(records[0].buckets[0].samples, 2);
    assert_eq!(records[0].buckets[1].samples, 1);
}

#[test]
fn classifier_outside_range_aborts_run() {
    let net = sigmoid_perceptron(0.5, 1.0, 2, 1, &[], 6).unwrap();
    let mut t = OnlineTeacher::new(net);
    t.set_data_source(xor());
    t.add_result_consumer(BucketedAccumulator::new(2, 1, |_: &[f64], _: &[f64]| 3, |_| {}).unwrap());
    assert!(matches!(
        t.start_learning(),
        Err(NnError::BucketOutOfRange { bucket: 3, buckets: 1 })
    ));
}

#[test]
fn stop_flag_ends_continuous_run_from_another_thread() {
    let config = TeacherConfig::new().with_delay(Duration::from_millis(1));
    let mut t = teacher(config);
    t.set_data_source(xor().cycle_forever());
    let (tx, rx) = mpsc::channel();
    t.add_result_consumer(AccumulatingConsumer::with_channel(1, tx).unwrap());
    let handle = t.stop_handle();

    let worker = thread::spawn(move || {
        let reason = t.start_learning();
        (reason, t.current_iteration())
    });
    for _ in 0..5 {
        rx.recv().unwrap();
    }
    handle.store(true, Ordering::Relaxed);

    let (reason, iterations) = worker.join().unwrap();
    assert_eq!(reason.unwrap(), StopReason::Stopped);
    assert!(iterations >= 5);
}

#[test]
fn stop_raised_before_start_is_honoured_once() {
    let mut t = teacher(TeacherConfig::new().with_iterations(3));
    t.set_data_source(xor());
    t.stop();
    assert_eq!(t.start_learning().unwrap(), StopReason::Stopped);
    assert_eq!(t.current_iteration(), 0);
    assert_eq!(t.start_learning().unwrap(), StopReason::IterationLimit);
    assert_eq!(t.current_iteration(), 3);
}

#[test]
fn stop_during_long_delay_cuts_it_short() {
    let (tx, rx) = mpsc::channel();
    let mut t = teacher(TeacherConfig::new().with_delay(Duration::from_secs(30)));
    t.set_data_source(xor().cycle_forever());
    t.add_result_consumer(AccumulatingConsumer::with_channel(1, tx).unwrap());
    let handle = t.stop_handle();

    let worker = thread::spawn(move || t.start_learning());
    // First window arrives right after the first step, before its delay.
    let first = rx.recv().unwrap();
    assert_eq!(first.first_iteration, 0);
    thread::sleep(Duration::from_millis(50));
    handle.store(true, Ordering::Relaxed);

    assert_eq!(worker.join().unwrap().unwrap(), StopReason::Stopped);
    assert!(rx.try_recv().is_err(), "no step may follow the stop");
}

#[test]
fn learning_lowers_windowed_error_on_xor() {
    let (tx, rx) = mpsc::channel();
    let mut t = teacher(TeacherConfig::new().with_iterations(8_000));
    t.set_data_source(xor().cycle_forever());
    t.add_result_consumer(AccumulatingConsumer::with_channel(400, tx).unwrap());
    t.start_learning().unwrap();
    drop(t);

    let windows: Vec<AccumulatedResult> = rx.iter().collect();
    assert_eq!(windows.len(), 20);
    assert!(windows[19].mean_error < windows[0].mean_error);
}
