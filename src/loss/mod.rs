pub mod least_squares;
pub mod mae;
pub mod loss_type;

pub use least_squares::LeastSquaresLoss;
pub use mae::MaeLoss;
pub use loss_type::LossType;
