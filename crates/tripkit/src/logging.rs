use tracing_subscriber::{fmt, EnvFilter};

use crate::config::PlannerConfig;

/// Installs a global `fmt` subscriber filtered by `config.log_level`.
///
/// Returns false if a global subscriber was already installed (e.g. by the
/// host application or a previous call), in which case nothing changes.
pub fn init_tracing(config: &PlannerConfig) -> bool {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = if config.log_json {
        fmt().with_env_filter(filter).json().with_target(false).try_init()
    } else {
        fmt().with_env_filter(filter).with_target(false).compact().try_init()
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_refused() {
        let config = PlannerConfig {
            log_level: "not a [valid filter".to_string(),
            ..Default::default()
        };
        init_tracing(&config);
        assert!(!init_tracing(&PlannerConfig::default()));
    }
}
