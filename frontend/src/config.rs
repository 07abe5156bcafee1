use std::env;

use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use report_data::{CadencePolicy, MachinePolicies};

const DEFAULT_ANNUAL_MACHINES: &[&str] = &["Cheyenne"];
const DEFAULT_CYCLE_START_MONTH: u32 = 10;

/// Cadence configuration: which machines renew annually, and in which
/// month their cycle starts. Everything else renews monthly.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub annual_machines: Vec<String>,
    pub cycle_start_month: u32,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "default".into());

        let builder = Config::builder()
            .set_default(
                "annual_machines",
                DEFAULT_ANNUAL_MACHINES.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            )?
            .set_default("cycle_start_month", i64::from(DEFAULT_CYCLE_START_MONTH))?
            .add_source(File::with_name("config/usage_visual").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("usage"))
            .build()?;

        let settings: Settings = builder.try_deserialize()?;
        if !(1..=12).contains(&settings.cycle_start_month) {
            return Err(ConfigError::Message(format!(
                "cycle_start_month must be 1-12, got {}",
                settings.cycle_start_month
            )));
        }
        Ok(settings)
    }

    /// Build the engine's policy table. Done once, before any parsing; the
    /// table never changes during a batch.
    pub fn machine_policies(&self) -> MachinePolicies {
        let mut policies = MachinePolicies::with_defaults();
        for machine in &self.annual_machines {
            policies.set(
                machine.clone(),
                CadencePolicy::Annual {
                    start_month: self.cycle_start_month,
                },
            );
        }
        policies
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;
    use report_data::MachineId;

    #[test]
    fn Settings__machine_policies__listed_machines_become_annual() {
        let settings = Settings {
            annual_machines: vec!["Cheyenne".into(), "Derecho".into()],
            cycle_start_month: 10,
        };
        let policies = settings.machine_policies();
        assert_eq!(
            policies.policy_for(&MachineId("Derecho".into())),
            CadencePolicy::Annual { start_month: 10 }
        );
        assert_eq!(
            policies.policy_for(&MachineId("Gaea".into())),
            CadencePolicy::Monthly
        );
    }
}
