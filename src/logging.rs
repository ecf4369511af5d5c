//! `log` events emitted while checking and rewriting condition trees.
//!
//! Every event goes to [`LOG_TARGET`] as `event=<name> [component=<name>] k=v ...`
//! so a subscriber can filter query condition work with one target directive.

pub(crate) const LOG_TARGET: &str = "tiledb_query_ast";

/// Names the pass an event came from.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LogScope {
    component: &'static str,
}

impl LogScope {
    pub(crate) const fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub(crate) fn component(&self) -> &'static str {
        self.component
    }
}

macro_rules! qc_log {
    ($level:expr, scope: $scope:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {
        if log::log_enabled!(target: crate::logging::LOG_TARGET, $level) {
            log::log!(
                target: crate::logging::LOG_TARGET,
                $level,
                "event={} component={} {}",
                $event,
                $scope.component(),
                format_args!($fmt $(, $args)*)
            );
        }
    };
    ($level:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {
        if log::log_enabled!(target: crate::logging::LOG_TARGET, $level) {
            log::log!(
                target: crate::logging::LOG_TARGET,
                $level,
                "event={} {}",
                $event,
                format_args!($fmt $(, $args)*)
            );
        }
    };
}

pub(crate) use qc_log;

#[cfg(test)]
mod tests {
    use super::LogScope;

    #[test]
    fn scope_reports_component() {
        const REWRITE: LogScope = LogScope::new("enumeration_rewriter");
        assert_eq!(REWRITE.component(), "enumeration_rewriter");
    }

    #[test]
    fn disabled_levels_skip_formatting() {
        // No logger is installed in unit tests, so the guard must short-circuit.
        qc_log!(
            log::Level::Trace,
            scope: LogScope::new("test"),
            "noop",
            "value={}",
            1
        );
        qc_log!(log::Level::Debug, "noop", "value={}", 2);
    }
}
