pub mod scalar_kalman;
pub mod sensor_bank;
pub mod vector_kalman;

pub use scalar_kalman::ScalarKalmanFilter;
pub use sensor_bank::SensorFilterBank;
pub use vector_kalman::VectorKalmanFilter;
