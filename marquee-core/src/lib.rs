pub mod error;
pub mod expiry;
pub mod repository;
pub mod reservation;
pub mod seat;

pub use error::ReservationError;
pub use expiry::ExpiryPolicy;
pub use repository::SeatStore;
pub use reservation::ReservationManager;
pub use seat::{Seat, SeatStatus, SeatView};

pub type CoreResult<T> = Result<T, ReservationError>;
