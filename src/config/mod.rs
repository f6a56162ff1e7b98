//! # Configuration Module
//!
//! Settings are assembled from several sources, later ones winning:
//! built-in defaults, `config/default.toml`, `config/{RUN_ENV}.toml`,
//! `APP__`-prefixed environment variables, and a few plain variables
//! like `DATABASE_URL`. A `.env` file is honored via dotenvy.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use skillswap_server::config::Settings;
//!
//! let settings = Settings::load()?;
//! tracing::info!("binding {}:{}", settings.server.host, settings.server.port);
//! ```

mod settings;

pub use settings::*;
