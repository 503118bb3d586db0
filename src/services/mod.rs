pub mod parallel;
pub mod registro_service;

pub use parallel::run_all;
pub use registro_service::RegistroService;
