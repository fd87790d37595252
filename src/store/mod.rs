pub mod prediction;
pub mod user;

pub use prediction::{PredictionRepository, WeatherLogRepository};
pub use user::UserRepository;
