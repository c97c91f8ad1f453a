use router_lab_abstract::PacingConfig;
use std::time::Duration;

/// Points at which the simulator imitates device latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Latency {
    PingStep,
    TracerouteStep,
    Connect,
    Query,
    Ping,
    Traceroute,
    Diagnostics,
    Execute,
}

#[derive(Debug, Clone, Default)]
pub struct Pacing {
    config: PacingConfig,
}

impl Pacing {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    pub fn immediate() -> Self {
        Self::new(PacingConfig::immediate())
    }

    pub fn delay(&self, point: Latency) -> Duration {
        let ms = match point {
            Latency::PingStep => self.config.ping_step_ms,
            Latency::TracerouteStep => self.config.traceroute_step_ms,
            Latency::Connect => self.config.connect_ms,
            Latency::Query => self.config.query_ms,
            Latency::Ping => self.config.ping_ms,
            Latency::Traceroute => self.config.traceroute_ms,
            Latency::Diagnostics => self.config.diagnostics_ms,
            Latency::Execute => self.config.execute_ms,
        };
        Duration::from_millis(ms)
    }

    pub async fn wait(&self, point: Latency) {
        pause(self.delay(point)).await;
    }
}

/// Sleeps on the tokio timer; zero returns immediately without yielding to the timer.
pub async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_step_delays() {
        let pacing = Pacing::default();
        assert_eq!(pacing.delay(Latency::PingStep), Duration::from_millis(300));
        assert_eq!(
            pacing.delay(Latency::TracerouteStep),
            Duration::from_millis(500)
        );
        assert_eq!(pacing.delay(Latency::Diagnostics), Duration::from_secs(3));
    }

    #[test]
    fn test_immediate_is_all_zero() {
        let pacing = Pacing::immediate();
        for point in [
            Latency::PingStep,
            Latency::TracerouteStep,
            Latency::Connect,
            Latency::Query,
            Latency::Ping,
            Latency::Traceroute,
            Latency::Diagnostics,
            Latency::Execute,
        ] {
            assert!(pacing.delay(point).is_zero());
        }
    }
}
