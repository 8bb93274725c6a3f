use fbo_particles::{AppError, FboConfig};

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    fbo_particles::run(FboConfig::new())
}
