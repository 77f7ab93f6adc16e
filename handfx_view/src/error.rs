use handfx::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("cannot open window: {0}")]
    Window(#[from] minifb::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("landmark source stopped")]
    SourceGone,
}
